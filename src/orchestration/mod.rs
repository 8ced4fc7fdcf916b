//! # Orchestration
//!
//! Worker lifecycle, sequential per-worker execution, distribution planning and the parallel
//! orchestrator that ties them together.
//!
//! ## Entry points
//!
//! - [`run_single_worker_batch`]: one worker, all jobs, optionally kept alive afterwards
//! - [`plan_distribution`]: how a job list would be split
//! - [`run_parallel_batches`]: split, run every partition concurrently, aggregate

pub mod aggregate;
pub mod batch_executor;
pub mod distribution;
pub mod lifecycle;
pub mod parallel;
pub mod registry;
pub mod timing;

use std::path::Path;

use crate::error::OrchestrationError;
use crate::models::{AggregateResult, EffectFlags, Job, Language, RenderOptions};

pub use aggregate::{aggregate, SuccessPolicy};
pub use batch_executor::BatchExecutor;
pub use distribution::{partition_jobs, plan_distribution, DistributionPlan, Partition, Strategy};
pub use lifecycle::{BatchOptions, Worker, WorkerLifecycle, WorkerRun, WorkerState};
pub use parallel::{sweep_instances, ParallelOptions, ParallelOrchestrator};
pub use registry::{ActiveInstance, ActiveInstanceRegistry};
pub use timing::TimingLog;

/// Run every job on a single worker. With `auto_terminate = false` the worker is returned in
/// [`WorkerRun::kept_alive`] instead of being terminated.
pub async fn run_single_worker_batch(
    lifecycle: &WorkerLifecycle,
    jobs: &[Job],
    language: Language,
    effects: EffectFlags,
    auto_terminate: bool,
) -> WorkerRun {
    let options = BatchOptions::new(RenderOptions::new(language, effects), auto_terminate)
        .with_priority(lifecycle.config().provisioning.profile_priority);
    lifecycle.run_batch(jobs, &options).await
}

/// Split `jobs` across workers and run all partitions concurrently
#[allow(clippy::too_many_arguments)]
pub async fn run_parallel_batches(
    lifecycle: &WorkerLifecycle,
    jobs: &[Job],
    preferred_per_worker: usize,
    max_workers: usize,
    min_per_worker: usize,
    language: Language,
    effects: EffectFlags,
    saving_location: &Path,
) -> Result<AggregateResult, OrchestrationError> {
    let mut options =
        ParallelOptions::from_config(lifecycle.config(), RenderOptions::new(language, effects));
    options.preferred_per_worker = preferred_per_worker;
    options.max_workers = max_workers;
    options.min_per_worker = min_per_worker;
    options.saving_location = saving_location.to_path_buf();
    ParallelOrchestrator::new(lifecycle.clone())
        .execute(jobs, &options)
        .await
}
