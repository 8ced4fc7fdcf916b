//! Mock render service
//!
//! Answers health probes, renders and downloads in memory. Jobs are identified by the
//! `{job}_{HHMMSS}.mp4` output filename of each request.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use cloudburst_core::error::RenderError;
use cloudburst_core::models::Scenario;
use cloudburst_core::render::{RenderRequest, RenderResponse, RenderService, ServiceEndpoint};

/// A render call as the service saw it
#[derive(Debug, Clone)]
pub struct RenderCall {
    pub job_name: String,
    pub base_url: String,
    pub language: String,
    pub has_effects: bool,
    pub has_subtitle: bool,
    pub has_watermark: bool,
}

#[derive(Debug, Default, Clone)]
pub struct MockRenderState {
    pub health_checks: usize,
    pub renders: Vec<RenderCall>,
    pub downloads: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct MockRenderService {
    state: Arc<Mutex<MockRenderState>>,
    unhealthy_checks: usize,
    never_healthy: bool,
    hang_health: bool,
    failing_jobs: HashSet<String>,
    panicking_job: Option<String>,
    reported_scenario: Option<Scenario>,
    download_failures: Arc<Mutex<usize>>,
    render_delay: Option<Duration>,
    artifact: Vec<u8>,
}

impl Default for MockRenderService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRenderService {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockRenderState::default())),
            unhealthy_checks: 0,
            never_healthy: false,
            hang_health: false,
            failing_jobs: HashSet::new(),
            panicking_job: None,
            reported_scenario: None,
            download_failures: Arc::new(Mutex::new(0)),
            render_delay: None,
            artifact: b"fake-mp4-bytes".to_vec(),
        }
    }

    /// Report unhealthy for this many probes first
    pub fn healthy_after(mut self, checks: usize) -> Self {
        self.unhealthy_checks = checks;
        self
    }

    pub fn never_healthy(mut self) -> Self {
        self.never_healthy = true;
        self
    }

    /// Health probes never answer
    pub fn hanging_health(mut self) -> Self {
        self.hang_health = true;
        self
    }

    /// Render calls for these jobs return HTTP 500
    pub fn failing_jobs(mut self, jobs: &[&str]) -> Self {
        self.failing_jobs = jobs.iter().map(|j| j.to_string()).collect();
        self
    }

    /// Panic while rendering this job
    pub fn panicking_on_job(mut self, job: &str) -> Self {
        self.panicking_job = Some(job.to_string());
        self
    }

    /// Report this scenario regardless of the request
    pub fn reporting_scenario(mut self, scenario: Scenario) -> Self {
        self.reported_scenario = Some(scenario);
        self
    }

    /// Fail the first `n` download calls
    pub fn failing_downloads(self, n: usize) -> Self {
        *self.download_failures.lock().unwrap() = n;
        self
    }

    pub fn with_render_delay(mut self, delay: Duration) -> Self {
        self.render_delay = Some(delay);
        self
    }

    pub fn artifact_bytes(&self) -> &[u8] {
        &self.artifact
    }

    pub fn state(&self) -> MockRenderState {
        self.state.lock().unwrap().clone()
    }

    pub fn rendered_jobs(&self) -> Vec<String> {
        self.state()
            .renders
            .into_iter()
            .map(|call| call.job_name)
            .collect()
    }
}

fn job_name_from(output_filename: &str) -> String {
    output_filename
        .rsplit_once('_')
        .map(|(job, _)| job.to_string())
        .unwrap_or_else(|| output_filename.to_string())
}

#[async_trait]
impl RenderService for MockRenderService {
    async fn health(&self, _endpoint: &ServiceEndpoint) -> Result<bool, RenderError> {
        if self.hang_health {
            std::future::pending::<()>().await;
        }
        let checks = {
            let mut state = self.state.lock().unwrap();
            state.health_checks += 1;
            state.health_checks
        };
        Ok(!self.never_healthy && checks > self.unhealthy_checks)
    }

    async fn render(
        &self,
        endpoint: &ServiceEndpoint,
        request: &RenderRequest,
    ) -> Result<RenderResponse, RenderError> {
        if let Some(delay) = self.render_delay {
            tokio::time::sleep(delay).await;
        }
        let job_name = job_name_from(&request.output_filename);
        if self.panicking_job.as_deref() == Some(job_name.as_str()) {
            panic!("simulated render crash on {job_name}");
        }
        self.state.lock().unwrap().renders.push(RenderCall {
            job_name: job_name.clone(),
            base_url: endpoint.base_url().to_string(),
            language: request.language.clone(),
            has_effects: request.has_effects(),
            has_subtitle: request.has_subtitle(),
            has_watermark: request.watermark.is_some(),
        });

        if self.failing_jobs.contains(&job_name) {
            return Err(RenderError::Http {
                status: 500,
                body: "render pipeline crashed".to_string(),
            });
        }
        Ok(RenderResponse {
            file_id: format!("{job_name}-file"),
            size: self.artifact.len() as u64,
            scenario: self
                .reported_scenario
                .unwrap_or_else(|| request.expected_scenario()),
        })
    }

    async fn download(&self, locator: &str) -> Result<Vec<u8>, RenderError> {
        {
            let mut remaining = self.download_failures.lock().unwrap();
            if *remaining > 0 {
                *remaining -= 1;
                return Err(RenderError::Transport("connection reset".to_string()));
            }
        }
        self.state
            .lock()
            .unwrap()
            .downloads
            .push(locator.to_string());
        Ok(self.artifact.clone())
    }
}
