//! # Single-Worker Batch Executor
//!
//! Runs a worker's jobs strictly in order against its render service. A job failure is
//! recorded and the loop moves on; nothing here is retried. Each successful artifact is
//! downloaded right away so that a later worker failure cannot lose it.

use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::config::CloudburstConfig;
use crate::constants::service;
use crate::error::RenderError;
use crate::logging::log_job_operation;
use crate::models::{Job, JobResult, RenderOptions, RenderedArtifact, WorkerBatchResult};
use crate::orchestration::timing::TimingLog;
use crate::render::{RenderRequest, RenderService, ServiceEndpoint};

pub struct BatchExecutor<'a> {
    render: &'a dyn RenderService,
    config: &'a CloudburstConfig,
    instance_id: &'a str,
}

impl<'a> BatchExecutor<'a> {
    pub fn new(
        render: &'a dyn RenderService,
        config: &'a CloudburstConfig,
        instance_id: &'a str,
    ) -> Self {
        Self {
            render,
            config,
            instance_id,
        }
    }

    /// Process `jobs` in order, appending one [`JobResult`] per job to `result`
    pub async fn execute(
        &self,
        endpoint: &ServiceEndpoint,
        jobs: &[Job],
        options: &RenderOptions,
        download_dir: &Path,
        result: &mut WorkerBatchResult,
        log: &mut TimingLog,
    ) {
        if let Err(e) = tokio::fs::create_dir_all(download_dir).await {
            warn!(dir = %download_dir.display(), error = %e, "📥 DOWNLOAD: Could not create download directory");
        }
        result.download_dir = Some(download_dir.to_path_buf());

        let cooldown = self.config.batch.job_cooldown();
        for (index, job) in jobs.iter().enumerate() {
            log.record(format!(
                "Job {}/{}: {} started",
                index + 1,
                jobs.len(),
                job.name()
            ));
            let mut job_result = self.process_job(endpoint, job, options, log).await;

            if let Some(artifact) = job_result.artifact_mut() {
                match self.download(artifact, job.name(), download_dir).await {
                    Ok(path) => {
                        log.record(format!("Job {}: downloaded to {}", job.name(), path.display()));
                        result.downloaded_files.push(path);
                    }
                    Err(e) => {
                        warn!(job = job.name(), error = %e, "📥 DOWNLOAD: Immediate download failed, will retry before termination");
                        log.record(format!("Job {}: download failed - {}", job.name(), e));
                    }
                }
            }

            result.record(job_result);

            if index + 1 < jobs.len() && !cooldown.is_zero() {
                sleep(cooldown).await;
            }
        }

        info!(
            instance_id = self.instance_id,
            succeeded = result.succeeded_jobs,
            failed = result.failed_jobs,
            "🎬 BATCH: Job processing finished"
        );
    }

    async fn process_job(
        &self,
        endpoint: &ServiceEndpoint,
        job: &Job,
        options: &RenderOptions,
        log: &mut TimingLog,
    ) -> JobResult {
        let started = Instant::now();

        let request = match RenderRequest::for_job(job, options).await {
            Ok(request) => request,
            Err(e) => {
                log.record(format!("Job {}: input encoding failed - {}", job.name(), e));
                self.log_outcome(job, "failed", &e.to_string());
                return JobResult::failed(job.name(), started.elapsed().as_secs_f64(), e.to_string());
            }
        };
        let expected = request.expected_scenario();
        log.record(format!("Job {}: expected scenario {}", job.name(), expected));

        if self.config.batch.write_debug_requests {
            self.write_debug_request(job, &request).await;
        }

        let request_timeout = self.config.service.request_timeout();
        let response = match timeout(request_timeout, self.render.render(endpoint, &request)).await
        {
            Ok(response) => response,
            Err(_) => Err(RenderError::Timeout(request_timeout.as_secs())),
        };
        let elapsed = started.elapsed().as_secs_f64();

        match response {
            Ok(response) => {
                let artifact = RenderedArtifact {
                    download_locator: endpoint.download_locator(&response.file_id),
                    artifact_id: response.file_id,
                    size_bytes: response.size,
                    has_effects: request.has_effects(),
                    has_subtitles: request.has_subtitle(),
                    scenario: response.scenario,
                    expected_scenario: expected,
                    local_path: None,
                };
                if artifact.scenario_mismatch() {
                    warn!(
                        job = job.name(),
                        expected = %expected,
                        detected = %artifact.scenario,
                        "⚠️ RENDER: Scenario mismatch"
                    );
                }
                log.record(format!(
                    "Job {}: completed {} ({:.2}MB) in {:.1}s, detected {}",
                    job.name(),
                    artifact.artifact_id,
                    artifact.size_bytes as f64 / 1024.0 / 1024.0,
                    elapsed,
                    artifact.scenario
                ));
                self.log_outcome(job, "succeeded", &artifact.artifact_id);
                JobResult::succeeded(job.name(), elapsed, artifact)
            }
            Err(e) => {
                log.record(format!("Job {}: render failed - {}", job.name(), e));
                self.log_outcome(job, "failed", &e.to_string());
                JobResult::failed(job.name(), elapsed, e.to_string())
            }
        }
    }

    fn log_outcome(&self, job: &Job, status: &str, details: &str) {
        log_job_operation(
            "render",
            Some(self.instance_id),
            job.name(),
            status,
            Some(details),
        );
    }

    /// Save one artifact to `{dir}/{job}.mp4` and record the path on it
    pub async fn download(
        &self,
        artifact: &mut RenderedArtifact,
        job_name: &str,
        dir: &Path,
    ) -> Result<PathBuf, RenderError> {
        let download_timeout = self.config.service.download_timeout();
        let bytes = timeout(download_timeout, self.render.download(&artifact.download_locator))
            .await
            .map_err(|_| RenderError::Timeout(download_timeout.as_secs()))??;

        let path = dir.join(format!("{job_name}.{}", service::ARTIFACT_EXTENSION));
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| RenderError::Io {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        debug!(path = %path.display(), bytes = bytes.len(), "📥 DOWNLOAD: Artifact saved");
        artifact.local_path = Some(path.clone());
        Ok(path)
    }

    /// Retry every successful artifact that has no local copy yet. Returns how many were
    /// saved.
    pub async fn download_pending(
        &self,
        result: &mut WorkerBatchResult,
        dir: &Path,
        log: &mut TimingLog,
    ) -> usize {
        if result.pending_downloads().next().is_none() {
            return 0;
        }
        if let Err(e) = tokio::fs::create_dir_all(dir).await {
            warn!(dir = %dir.display(), error = %e, "📥 DOWNLOAD: Could not create download directory");
        }
        result.download_dir = Some(dir.to_path_buf());

        let mut saved = Vec::new();
        for job_result in result.job_results.iter_mut() {
            let job_name = job_result.job_name.clone();
            let Some(artifact) = job_result.artifact_mut() else {
                continue;
            };
            if artifact.local_path.is_some() {
                continue;
            }
            match self.download(artifact, &job_name, dir).await {
                Ok(path) => {
                    log.record(format!("Job {job_name}: downloaded on retry"));
                    saved.push(path);
                }
                Err(e) => {
                    warn!(job = %job_name, error = %e, "📥 DOWNLOAD: Retry failed, artifact left on worker");
                    log.record(format!("Job {job_name}: download retry failed - {e}"));
                }
            }
        }
        let count = saved.len();
        result.downloaded_files.extend(saved);
        count
    }

    async fn write_debug_request(&self, job: &Job, request: &RenderRequest) {
        let dir = self.config.batch.results_dir.join("debug_logs");
        let path = dir.join(format!("debug_request_{}.json", job.name()));
        let written: std::io::Result<()> = async {
            tokio::fs::create_dir_all(&dir).await?;
            let body = serde_json::to_vec_pretty(&request.redacted())?;
            tokio::fs::write(&path, body).await
        }
        .await;
        match written {
            Ok(()) => debug!(path = %path.display(), "🎬 RENDER: Debug request saved"),
            Err(e) => warn!(path = %path.display(), error = %e, "🎬 RENDER: Could not save debug request"),
        }
    }
}
