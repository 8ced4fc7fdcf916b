//! # Parallel Orchestrator
//!
//! Splits a job list across several workers, runs every partition's full lifecycle
//! concurrently and merges the outcomes.
//!
//! Partitions are independent. A partition that fails inside its own lifecycle (setup
//! failure, failed jobs) is just data in the aggregate, and so is a partition *task* that
//! dies outside that handling (panic): its jobs are all recorded as failed, the instances it
//! registered are swept, and the siblings keep running. Only a failure of the orchestration
//! itself (the `execute` future dropped before aggregation) sweeps every instance recorded
//! in the shared [`ActiveInstanceRegistry`], from the `EmergencyCleanup` drop guard.

use futures::future::join_all;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::{Id, JoinError, JoinSet};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::CloudburstConfig;
use crate::error::OrchestrationError;
use crate::models::{
    AggregateResult, Job, PartitionReport, RenderOptions, TerminationOutcome, WorkerBatchResult,
};
use crate::orchestration::aggregate::{aggregate, SuccessPolicy};
use crate::orchestration::distribution::{partition_jobs, plan_distribution};
use crate::orchestration::lifecycle::{BatchOptions, WorkerLifecycle};
use crate::orchestration::registry::{ActiveInstance, ActiveInstanceRegistry};
use crate::provider::{ComputeProvider, ProviderErrorClass};

#[derive(Debug, Clone)]
pub struct ParallelOptions {
    pub preferred_per_worker: usize,
    pub max_workers: usize,
    pub min_per_worker: usize,
    pub priority: u8,
    pub render: RenderOptions,
    /// Parent directory of the per-partition `batch_{id}_{unix}` folders
    pub saving_location: PathBuf,
    pub success_policy: SuccessPolicy,
}

impl ParallelOptions {
    /// Distribution defaults and results directory taken from configuration
    pub fn from_config(config: &CloudburstConfig, render: RenderOptions) -> Self {
        Self {
            preferred_per_worker: config.distribution.preferred_per_worker,
            max_workers: config.distribution.max_workers,
            min_per_worker: config.distribution.min_per_worker,
            priority: config.provisioning.profile_priority,
            render,
            saving_location: config.batch.results_dir.clone(),
            success_policy: SuccessPolicy::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ParallelOrchestrator {
    lifecycle: WorkerLifecycle,
}

impl ParallelOrchestrator {
    pub fn new(lifecycle: WorkerLifecycle) -> Self {
        Self { lifecycle }
    }

    pub async fn execute(
        &self,
        jobs: &[Job],
        options: &ParallelOptions,
    ) -> Result<AggregateResult, OrchestrationError> {
        let plan = plan_distribution(
            jobs.len(),
            options.preferred_per_worker,
            options.max_workers,
            options.min_per_worker,
        )?;
        let run_id = Uuid::new_v4();
        info!(
            %run_id,
            total_jobs = jobs.len(),
            workers = plan.worker_count,
            strategy = %plan.strategy,
            average_per_worker = plan.average_per_worker(),
            "🚀 PARALLEL: {}",
            plan.label
        );
        for warning in &plan.warnings {
            warn!("🚀 PARALLEL: {warning}");
        }

        let provider = Arc::clone(self.lifecycle.provider());
        let registry = Arc::new(ActiveInstanceRegistry::new());
        let semaphore = Arc::new(Semaphore::new(plan.worker_count.max(1)));
        let run_stamp = chrono::Utc::now().timestamp();
        let started = Instant::now();
        let mut cleanup = EmergencyCleanup::arm(Arc::clone(&provider), Arc::clone(&registry));

        let mut tasks = JoinSet::new();
        let mut spawned: HashMap<Id, PartitionMeta> = HashMap::new();
        for partition in partition_jobs(jobs, &plan) {
            let lifecycle = self
                .lifecycle
                .for_partition(partition.batch_id, Arc::clone(&registry));
            let semaphore = Arc::clone(&semaphore);
            let batch_options = BatchOptions::new(options.render.clone(), true)
                .with_priority(options.priority)
                .with_output_dir(
                    options
                        .saving_location
                        .join(format!("batch_{}_{}", partition.batch_id, run_stamp)),
                );
            let meta = PartitionMeta {
                batch_id: partition.batch_id,
                start_index: partition.start_index,
                end_index: partition.end_index,
                job_names: partition.jobs.iter().map(|job| job.name().to_string()).collect(),
            };
            let handle = tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                let run = lifecycle.run_batch(&partition.jobs, &batch_options).await;
                PartitionReport {
                    batch_id: partition.batch_id,
                    start_index: partition.start_index,
                    end_index: partition.end_index,
                    result: run.result,
                }
            });
            spawned.insert(handle.id(), meta);
        }

        let mut reports = Vec::with_capacity(plan.worker_count);
        while let Some(joined) = tasks.join_next_with_id().await {
            let report = match joined {
                Ok((_, report)) => report,
                Err(join_error) => match spawned.get(&join_error.id()) {
                    Some(meta) => {
                        error!(
                            %run_id,
                            batch_id = meta.batch_id,
                            error = %join_error,
                            "🚨 EMERGENCY: Partition task failed, sweeping its instances"
                        );
                        failed_partition(provider.as_ref(), &registry, meta, &join_error).await
                    }
                    None => {
                        error!(%run_id, error = %join_error, "🚨 EMERGENCY: Unknown partition task failed");
                        continue;
                    }
                },
            };
            info!(
                batch_id = report.batch_id,
                succeeded = report.result.succeeded_jobs,
                total = report.result.total_jobs,
                "🚀 PARALLEL: Partition finished"
            );
            reports.push(report);
        }
        cleanup.disarm();

        let result = aggregate(
            reports,
            plan,
            started.elapsed(),
            options.preferred_per_worker,
            options.success_policy,
        );
        info!(
            %run_id,
            succeeded = result.succeeded_jobs,
            total = result.total_jobs,
            cost_usd = result.total_cost_usd,
            speedup = result.efficiency.speedup_factor,
            "🚀 PARALLEL: Run complete"
        );
        Ok(result)
    }
}

/// Bookkeeping for a spawned partition, used to report it if its task dies
struct PartitionMeta {
    batch_id: usize,
    start_index: usize,
    end_index: usize,
    job_names: Vec<String>,
}

/// Report for a partition whose task died: every job failed, its instances swept
async fn failed_partition(
    provider: &dyn ComputeProvider,
    registry: &ActiveInstanceRegistry,
    meta: &PartitionMeta,
    join_error: &JoinError,
) -> PartitionReport {
    let mut result = WorkerBatchResult::new(meta.job_names.len());
    let reason = format!("Partition task failed: {join_error}");
    result.fail_remaining(meta.job_names.iter().map(String::as_str), &reason);
    result.error = Some(reason);

    let entries = registry.for_batch(meta.batch_id);
    if let Some(entry) = entries.first() {
        result.instance_id = Some(entry.instance_id.clone());
    }
    if !entries.is_empty() {
        let swept = sweep_entries(provider, &entries).await;
        result.termination = Some(if swept == entries.len() {
            TerminationOutcome::Terminated
        } else {
            TerminationOutcome::Failed {
                error: "manual termination required".to_string(),
            }
        });
    }

    PartitionReport {
        batch_id: meta.batch_id,
        start_index: meta.start_index,
        end_index: meta.end_index,
        result,
    }
}

/// Terminate every registered instance concurrently: normal call first, then the
/// provider's lowest-level call. Returns how many instances are confirmed gone.
pub async fn sweep_instances(
    provider: &dyn ComputeProvider,
    registry: &ActiveInstanceRegistry,
) -> usize {
    sweep_entries(provider, &registry.snapshot()).await
}

async fn sweep_entries(provider: &dyn ComputeProvider, entries: &[ActiveInstance]) -> usize {
    let swept = join_all(entries.iter().map(|entry| sweep_one(provider, entry)))
        .await
        .into_iter()
        .filter(|gone| *gone)
        .count();
    info!(swept, registered = entries.len(), "🚨 EMERGENCY: Sweep finished");
    swept
}

async fn sweep_one(provider: &dyn ComputeProvider, entry: &ActiveInstance) -> bool {
    let id = entry.instance_id.as_str();
    match provider.terminate(id).await {
        Ok(()) => return true,
        Err(e) if e.class() == ProviderErrorClass::NotFound => return true,
        Err(e) => {
            warn!(instance_id = id, error = %e, "🚨 EMERGENCY: Terminate failed, forcing");
        }
    }
    match provider.force_terminate(id).await {
        Ok(()) => true,
        Err(e) if e.class() == ProviderErrorClass::NotFound => true,
        Err(e) => {
            error!(
                instance_id = id,
                batch_id = entry.batch_id,
                error = %e,
                "🚨 CRITICAL: Could not terminate instance, manual termination required"
            );
            false
        }
    }
}

/// Sweeps the registry from a spawned task if dropped while armed
struct EmergencyCleanup {
    provider: Arc<dyn ComputeProvider>,
    registry: Arc<ActiveInstanceRegistry>,
    armed: bool,
}

impl EmergencyCleanup {
    fn arm(provider: Arc<dyn ComputeProvider>, registry: Arc<ActiveInstanceRegistry>) -> Self {
        Self {
            provider,
            registry,
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for EmergencyCleanup {
    fn drop(&mut self) {
        if !self.armed || self.registry.is_empty() {
            return;
        }
        warn!(
            registered = self.registry.len(),
            "🚨 EMERGENCY: Orchestration dropped before completion, sweeping instances"
        );
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let provider = Arc::clone(&self.provider);
                let registry = Arc::clone(&self.registry);
                handle.spawn(async move {
                    sweep_instances(provider.as_ref(), &registry).await;
                });
            }
            Err(_) => {
                for entry in self.registry.snapshot() {
                    error!(
                        instance_id = %entry.instance_id,
                        "🚨 CRITICAL: No runtime available, manual termination required"
                    );
                }
            }
        }
    }
}
