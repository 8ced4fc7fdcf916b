//! # Result Records
//!
//! Per-job, per-worker and aggregate outcome records. A [`JobResult`] is created once per
//! job and never edited except to attach the local path of a downloaded artifact; a
//! [`WorkerBatchResult`] is filled in incrementally while its worker runs and finalized when
//! the worker's batch loop ends.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::models::{ResolvedProfile, Scenario};
use crate::orchestration::distribution::DistributionPlan;
use crate::pricing::CostBreakdown;

/// A rendered artifact as reported by the render service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedArtifact {
    pub artifact_id: String,
    pub download_locator: String,
    pub size_bytes: u64,
    pub has_effects: bool,
    pub has_subtitles: bool,
    /// Scenario the service says it applied
    pub scenario: Scenario,
    /// Scenario implied by the request
    pub expected_scenario: Scenario,
    /// Where the artifact was saved, once downloaded
    pub local_path: Option<PathBuf>,
}

impl RenderedArtifact {
    pub fn scenario_mismatch(&self) -> bool {
        self.scenario != self.expected_scenario
    }
}

/// Outcome of dispatching one job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobOutcome {
    Succeeded(RenderedArtifact),
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobResult {
    pub job_name: String,
    /// Wall-clock time spent on the render call (until failure, for failed jobs)
    pub processing_time_secs: f64,
    pub outcome: JobOutcome,
}

impl JobResult {
    pub fn succeeded(
        job_name: impl Into<String>,
        processing_time_secs: f64,
        artifact: RenderedArtifact,
    ) -> Self {
        Self {
            job_name: job_name.into(),
            processing_time_secs,
            outcome: JobOutcome::Succeeded(artifact),
        }
    }

    pub fn failed(
        job_name: impl Into<String>,
        processing_time_secs: f64,
        error: impl Into<String>,
    ) -> Self {
        Self {
            job_name: job_name.into(),
            processing_time_secs,
            outcome: JobOutcome::Failed {
                error: error.into(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, JobOutcome::Succeeded(_))
    }

    pub fn artifact(&self) -> Option<&RenderedArtifact> {
        match &self.outcome {
            JobOutcome::Succeeded(artifact) => Some(artifact),
            JobOutcome::Failed { .. } => None,
        }
    }

    pub fn artifact_mut(&mut self) -> Option<&mut RenderedArtifact> {
        match &mut self.outcome {
            JobOutcome::Succeeded(artifact) => Some(artifact),
            JobOutcome::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            JobOutcome::Failed { error } => Some(error),
            JobOutcome::Succeeded(_) => None,
        }
    }
}

/// How a worker's termination request ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TerminationOutcome {
    Terminated,
    AlreadyTerminated,
    /// Deliberately left running for later retrieval
    KeptAlive,
    /// Best-effort termination failed; the instance may still be billing
    Failed { error: String },
}

/// Aggregation record for one worker's full run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerBatchResult {
    /// `true` when at least one job succeeded
    pub success: bool,
    /// Setup failure that ended the run before or instead of job processing
    pub error: Option<String>,
    pub total_jobs: usize,
    pub succeeded_jobs: usize,
    pub failed_jobs: usize,
    /// Wall time of the whole worker run
    pub total_time_secs: f64,
    /// Sum of successful render durations
    pub total_processing_time_secs: f64,
    pub avg_processing_time_secs: f64,
    pub total_bytes: u64,
    pub instance_id: Option<String>,
    pub address: Option<String>,
    pub profile: Option<ResolvedProfile>,
    pub job_results: Vec<JobResult>,
    pub timing_log: Vec<String>,
    /// Cost at the end of job processing
    pub cost: Option<CostBreakdown>,
    /// Cost including post-processing downloads, once known
    pub final_cost: Option<CostBreakdown>,
    pub downloaded_files: Vec<PathBuf>,
    pub download_dir: Option<PathBuf>,
    pub kept_alive: bool,
    pub termination: Option<TerminationOutcome>,
}

impl WorkerBatchResult {
    pub fn new(total_jobs: usize) -> Self {
        Self {
            success: false,
            error: None,
            total_jobs,
            succeeded_jobs: 0,
            failed_jobs: 0,
            total_time_secs: 0.0,
            total_processing_time_secs: 0.0,
            avg_processing_time_secs: 0.0,
            total_bytes: 0,
            instance_id: None,
            address: None,
            profile: None,
            job_results: Vec::with_capacity(total_jobs),
            timing_log: Vec::new(),
            cost: None,
            final_cost: None,
            downloaded_files: Vec::new(),
            download_dir: None,
            kept_alive: false,
            termination: None,
        }
    }

    /// Append a job result and update the running counters
    pub fn record(&mut self, result: JobResult) {
        if let Some(artifact) = result.artifact() {
            self.succeeded_jobs += 1;
            self.total_processing_time_secs += result.processing_time_secs;
            self.total_bytes += artifact.size_bytes;
        }
        self.job_results.push(result);
        self.failed_jobs = self.total_jobs.saturating_sub(self.succeeded_jobs);
        self.success = self.succeeded_jobs > 0;
        self.avg_processing_time_secs = if self.succeeded_jobs > 0 {
            self.total_processing_time_secs / self.succeeded_jobs as f64
        } else {
            0.0
        };
    }

    /// Record failure entries for every job that has no result yet
    pub fn fail_remaining<'a>(
        &mut self,
        job_names: impl IntoIterator<Item = &'a str>,
        reason: &str,
    ) {
        let missing: Vec<String> = job_names
            .into_iter()
            .filter(|name| !self.job_results.iter().any(|r| r.job_name == *name))
            .map(str::to_string)
            .collect();
        for name in missing {
            self.record(JobResult::failed(name, 0.0, reason));
        }
    }

    /// Best-known cost: final if downloads were accounted for, else the processing estimate
    pub fn best_cost_usd(&self) -> f64 {
        self.final_cost
            .as_ref()
            .or(self.cost.as_ref())
            .map(|c| c.total_cost_usd)
            .unwrap_or(0.0)
    }

    /// Successful results whose artifact has not been saved locally yet
    pub fn pending_downloads(&self) -> impl Iterator<Item = &JobResult> {
        self.job_results.iter().filter(|r| {
            r.artifact()
                .map(|artifact| artifact.local_path.is_none())
                .unwrap_or(false)
        })
    }
}

/// A downloaded artifact tagged with the partition it came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadedArtifact {
    pub batch_id: usize,
    pub path: PathBuf,
    pub directory: Option<PathBuf>,
}

/// One partition's outcome inside a parallel run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionReport {
    pub batch_id: usize,
    pub start_index: usize,
    pub end_index: usize,
    pub result: WorkerBatchResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Efficiency {
    pub speedup_factor: f64,
    pub cost_per_job_usd: f64,
    pub success_rate: f64,
}

/// Merged outcome of a parallel run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    pub success: bool,
    pub total_jobs: usize,
    pub succeeded_jobs: usize,
    pub failed_jobs: usize,
    pub total_cost_usd: f64,
    /// Sum of per-worker wall time
    pub sequential_time_secs: f64,
    /// Wall time of the whole parallel run
    pub parallel_time_secs: f64,
    pub time_saved_secs: f64,
    pub workers_used: usize,
    pub preferred_per_worker: usize,
    /// Every job result, sorted by job name
    pub job_results: Vec<JobResult>,
    pub downloaded_files: Vec<DownloadedArtifact>,
    /// Per-partition detail, sorted by batch id
    pub partitions: Vec<PartitionReport>,
    pub efficiency: Efficiency,
    pub plan: DistributionPlan,
}
