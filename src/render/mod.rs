//! # Render Service Interface
//!
//! The HTTP API every worker exposes once its container is up: a health probe, a one-shot
//! render call and artifact download. [`HttpRenderClient`] speaks it over reqwest.

pub mod http_client;
pub mod types;

use async_trait::async_trait;
use std::fmt::Debug;

use crate::error::RenderError;

pub use http_client::HttpRenderClient;
pub use types::{RenderRequest, RenderResponse, ServiceEndpoint};

#[async_trait]
pub trait RenderService: Send + Sync + Debug {
    /// `true` once the service reports itself healthy
    async fn health(&self, endpoint: &ServiceEndpoint) -> Result<bool, RenderError>;

    async fn render(
        &self,
        endpoint: &ServiceEndpoint,
        request: &RenderRequest,
    ) -> Result<RenderResponse, RenderError>;

    /// Fetch artifact bytes from a download locator
    async fn download(&self, locator: &str) -> Result<Vec<u8>, RenderError>;
}
