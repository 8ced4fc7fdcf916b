//! reqwest-backed [`RenderService`].

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;
use tracing::{debug, instrument};

use super::types::HealthResponse;
use super::{RenderRequest, RenderResponse, RenderService, ServiceEndpoint};
use crate::config::ServiceConfig;
use crate::constants::service;
use crate::error::RenderError;

#[derive(Debug, Clone)]
pub struct HttpRenderClient {
    client: Client,
    auth_key: Option<String>,
    health_timeout: Duration,
    request_timeout: Duration,
    download_timeout: Duration,
}

impl HttpRenderClient {
    pub fn new(config: &ServiceConfig) -> Result<Self, RenderError> {
        let client = Client::builder()
            .connect_timeout(config.health_request_timeout())
            .build()?;
        Ok(Self {
            client,
            auth_key: config.auth_key.clone(),
            health_timeout: config.health_request_timeout(),
            request_timeout: config.request_timeout(),
            download_timeout: config.download_timeout(),
        })
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.auth_key {
            Some(key) => builder.header(service::AUTH_HEADER, key),
            None => builder,
        }
    }
}

async fn ensure_success(response: Response) -> Result<Response, RenderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(RenderError::Http {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl RenderService for HttpRenderClient {
    async fn health(&self, endpoint: &ServiceEndpoint) -> Result<bool, RenderError> {
        let response = self
            .client
            .get(endpoint.url(service::HEALTH_PATH))
            .timeout(self.health_timeout)
            .send()
            .await?;
        if !response.status().is_success() {
            debug!(status = %response.status(), "🩺 HEALTH: Non-success status");
            return Ok(false);
        }
        let body: HealthResponse = response.json().await?;
        Ok(body.status == service::HEALTHY_STATUS)
    }

    #[instrument(skip(self, request), fields(output = %request.output_filename))]
    async fn render(
        &self,
        endpoint: &ServiceEndpoint,
        request: &RenderRequest,
    ) -> Result<RenderResponse, RenderError> {
        let builder = self
            .client
            .post(endpoint.url(service::RENDER_PATH))
            .timeout(self.request_timeout)
            .json(request);
        let response = self.authorized(builder).send().await?;
        let response = ensure_success(response).await?;
        response
            .json::<RenderResponse>()
            .await
            .map_err(|e| RenderError::Decode(e.to_string()))
    }

    async fn download(&self, locator: &str) -> Result<Vec<u8>, RenderError> {
        let builder = self.client.get(locator).timeout(self.download_timeout);
        let response = self.authorized(builder).send().await?;
        let response = ensure_success(response).await?;
        Ok(response.bytes().await?.to_vec())
    }
}
