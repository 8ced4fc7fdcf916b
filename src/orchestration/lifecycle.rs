//! # Worker Lifecycle Manager
//!
//! Takes one worker from nothing to terminated: provision an instance (with profile
//! fallback), wait for its network address, wait for the render service, run the batch,
//! then terminate or hand the worker back to the caller.
//!
//! Billing starts the moment creation is requested. From then on every exit path either
//! terminates the instance, hands it back as kept-alive, or (on unwind) leaves a
//! [`TerminationGuard`] to spawn a best-effort termination.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};

use crate::config::CloudburstConfig;
use crate::error::{LifecycleError, ProvisionError};
use crate::logging::log_worker_operation;
use crate::models::{
    Job, ProfileCatalog, RenderOptions, ResolvedProfile, TerminationOutcome, WorkerBatchResult,
};
use crate::orchestration::batch_executor::BatchExecutor;
use crate::orchestration::registry::ActiveInstanceRegistry;
use crate::orchestration::timing::TimingLog;
use crate::pricing::{calculate_cost, CostBreakdown, RateResolver};
use crate::provider::{ComputeProvider, InstanceState, LaunchSpec, ProviderErrorClass};
use crate::render::{RenderService, ServiceEndpoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    Provisioned,
    NetworkReady,
    ServiceReady,
    Processing,
    KeptAlive,
    Terminated,
    TerminationFailed,
}

/// A rented instance and what we know about it
#[derive(Debug, Clone)]
pub struct Worker {
    pub instance_id: String,
    pub profile: ResolvedProfile,
    /// Resolved once at provisioning; every cost figure of this worker uses it
    pub hourly_rate_usd: f64,
    pub created_at: DateTime<Utc>,
    pub address: Option<String>,
    pub state: WorkerState,
    billing_started: Instant,
}

impl Worker {
    /// Cost accrued since the creation request
    pub fn cost_so_far(&self) -> CostBreakdown {
        calculate_cost(self.billing_started.elapsed(), self.hourly_rate_usd)
    }

    pub fn endpoint(&self, port: u16) -> Option<ServiceEndpoint> {
        self.address
            .as_deref()
            .map(|address| ServiceEndpoint::for_address(address, port))
    }
}

/// Per-run options for [`WorkerLifecycle::run_batch`]
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    pub render: RenderOptions,
    /// Terminate after processing; otherwise the worker is handed back alive
    pub auto_terminate: bool,
    /// 1-based hardware profile priority
    pub priority: u8,
    /// Artifact directory; defaults to a timestamped folder under the results dir
    pub output_dir: Option<PathBuf>,
}

impl BatchOptions {
    pub fn new(render: RenderOptions, auto_terminate: bool) -> Self {
        Self {
            render,
            auto_terminate,
            priority: 1,
            output_dir: None,
        }
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }
}

/// Outcome of a worker run. `kept_alive` holds the worker when it was deliberately left
/// running; retrieve its artifacts with [`WorkerLifecycle::download_and_terminate`].
#[derive(Debug)]
pub struct WorkerRun {
    pub result: WorkerBatchResult,
    pub kept_alive: Option<Worker>,
}

/// Spawns a best-effort termination if dropped while armed
struct TerminationGuard {
    provider: Arc<dyn ComputeProvider>,
    instance_id: Option<String>,
}

impl TerminationGuard {
    fn arm(provider: Arc<dyn ComputeProvider>, instance_id: &str) -> Self {
        Self {
            provider,
            instance_id: Some(instance_id.to_string()),
        }
    }

    fn disarm(&mut self) {
        self.instance_id = None;
    }
}

impl Drop for TerminationGuard {
    fn drop(&mut self) {
        let Some(instance_id) = self.instance_id.take() else {
            return;
        };
        warn!(instance_id = %instance_id, "🛑 TERMINATE: Worker run unwound, terminating instance");
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let provider = Arc::clone(&self.provider);
                handle.spawn(async move {
                    if let Err(e) = provider.terminate(&instance_id).await {
                        if e.class() != ProviderErrorClass::NotFound {
                            error!(
                                instance_id = %instance_id,
                                error = %e,
                                "🚨 TERMINATION_FAILURE: Instance may still be running and billing"
                            );
                        }
                    }
                });
            }
            Err(_) => error!(
                instance_id = %instance_id,
                "🚨 TERMINATION_FAILURE: No runtime available, instance may still be running"
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WorkerLifecycle {
    provider: Arc<dyn ComputeProvider>,
    render: Arc<dyn RenderService>,
    rates: RateResolver,
    catalog: ProfileCatalog,
    config: Arc<CloudburstConfig>,
    launch: LaunchSpec,
    registry: Option<Arc<ActiveInstanceRegistry>>,
    batch_id: Option<usize>,
}

impl WorkerLifecycle {
    pub fn new(
        provider: Arc<dyn ComputeProvider>,
        render: Arc<dyn RenderService>,
        config: Arc<CloudburstConfig>,
    ) -> Self {
        Self {
            provider,
            render,
            rates: RateResolver::offline(config.pricing.default_hourly_rate_usd),
            catalog: ProfileCatalog::default(),
            launch: LaunchSpec::from_config(&config),
            config,
            registry: None,
            batch_id: None,
        }
    }

    pub fn with_rate_resolver(mut self, rates: RateResolver) -> Self {
        self.rates = rates;
        self
    }

    pub fn with_catalog(mut self, catalog: ProfileCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Copy of this lifecycle that registers its instance as partition `batch_id`
    pub fn for_partition(&self, batch_id: usize, registry: Arc<ActiveInstanceRegistry>) -> Self {
        let mut lifecycle = self.clone();
        lifecycle.batch_id = Some(batch_id);
        lifecycle.registry = Some(registry);
        lifecycle.launch = self.launch.with_tag("BatchId", batch_id.to_string());
        lifecycle
    }

    pub fn provider(&self) -> &Arc<dyn ComputeProvider> {
        &self.provider
    }

    pub fn config(&self) -> &CloudburstConfig {
        &self.config
    }

    async fn is_available(&self, instance_class: &str) -> bool {
        match self.provider.describe_availability(instance_class).await {
            Ok(availability) => availability.available,
            Err(e) => {
                warn!(instance_class, error = %e, "🚀 PROVISION: Availability check failed, treating as unavailable");
                false
            }
        }
    }

    /// Create one instance, substituting fallback profiles for unavailable or
    /// capacity-limited classes
    pub async fn provision(
        &self,
        priority: u8,
        log: &mut TimingLog,
    ) -> Result<Worker, ProvisionError> {
        let requested = self.catalog.select(priority).clone();
        let region = &self.config.provisioning.region;
        let mut resolved = ResolvedProfile::requested(requested.clone());
        info!(
            priority,
            instance_class = %requested.instance_class,
            profile = %requested.name,
            "🚀 PROVISION: Selected hardware profile"
        );

        if !self.is_available(&requested.instance_class).await {
            log.record(format!(
                "{} not available in {}, checking fallbacks",
                requested.instance_class, region
            ));
            let mut checked = vec![requested.instance_class.clone()];
            let mut substitute = None;
            for fallback in self.catalog.fallbacks() {
                checked.push(fallback.instance_class.clone());
                if self.is_available(&fallback.instance_class).await {
                    substitute = Some(fallback.clone());
                    break;
                }
            }
            let Some(fallback) = substitute else {
                error!(?checked, "🚀 PROVISION: No available instance profile");
                return Err(ProvisionError::NoAvailableProfile { checked });
            };
            warn!(
                from = %requested.instance_class,
                to = %fallback.instance_class,
                "🔄 PROVISION: Substituting unavailable profile"
            );
            resolved = resolved.substitute(
                &fallback,
                format!("{} not available in {}", requested.instance_class, region),
            );
        }

        let max_attempts = self.config.provisioning.max_create_attempts;
        let mut attempted: Vec<String> = Vec::new();
        for attempt in 1..=max_attempts {
            let instance_class = resolved.instance_class().to_string();
            attempted.push(instance_class.clone());
            log.record(format!(
                "Creating {instance_class} instance (attempt {attempt}/{max_attempts})"
            ));

            let created_at = Utc::now();
            let billing_started = Instant::now();
            match self.provider.create(&resolved.profile, &self.launch).await {
                Ok(instance_id) => {
                    let hourly_rate_usd = self.rates.resolve(&instance_class).await;
                    log.record(format!(
                        "Instance {instance_id} created ({instance_class}, ${hourly_rate_usd:.4}/hour)"
                    ));
                    log_worker_operation(
                        "provision",
                        self.batch_id,
                        Some(&instance_id),
                        "created",
                        Some(&instance_class),
                    );
                    return Ok(Worker {
                        instance_id,
                        profile: resolved,
                        hourly_rate_usd,
                        created_at,
                        address: None,
                        state: WorkerState::Provisioned,
                        billing_started,
                    });
                }
                Err(e) if e.class() == ProviderErrorClass::Capacity => {
                    warn!(instance_class = %instance_class, error = %e, "🚀 PROVISION: Capacity error");
                    let Some(fallback) = self.catalog.next_untried_fallback(&attempted) else {
                        return Err(ProvisionError::FallbacksExhausted { attempted });
                    };
                    log.record(format!(
                        "{instance_class} capacity error, retrying with {}",
                        fallback.instance_class
                    ));
                    resolved =
                        resolved.substitute(fallback, format!("{instance_class}: {}", e.message));
                }
                Err(e) => {
                    error!(instance_class = %instance_class, error = %e, "🚀 PROVISION: Instance creation rejected");
                    return Err(ProvisionError::Rejected {
                        instance_class,
                        message: e.to_string(),
                    });
                }
            }
        }

        Err(ProvisionError::AttemptsExhausted {
            attempts: max_attempts,
            attempted,
        })
    }

    /// Poll until the instance is running with a public address
    pub async fn await_network(
        &self,
        worker: &mut Worker,
        log: &mut TimingLog,
    ) -> Result<String, LifecycleError> {
        let interval = self.config.provisioning.network_poll_interval();
        let max_polls = self.config.provisioning.network_max_polls;

        for poll in 1..=max_polls {
            match self.provider.describe_instance(&worker.instance_id).await {
                Ok(status) if status.state.is_gone() => {
                    return Err(LifecycleError::InstanceLost {
                        instance_id: worker.instance_id.clone(),
                        state: status.state.to_string(),
                    });
                }
                Ok(status) if status.state == InstanceState::Running => {
                    if let Some(address) = status.public_address {
                        log.record(format!("Instance running at {address}"));
                        worker.address = Some(address.clone());
                        worker.state = WorkerState::NetworkReady;
                        return Ok(address);
                    }
                    debug!(instance_id = %worker.instance_id, poll, "🌐 NETWORK: Running without address yet");
                }
                Ok(status) => {
                    debug!(instance_id = %worker.instance_id, poll, state = %status.state, "🌐 NETWORK: Waiting");
                }
                Err(e) => {
                    debug!(instance_id = %worker.instance_id, poll, error = %e, "🌐 NETWORK: Describe failed");
                }
            }
            if poll < max_polls {
                sleep(interval).await;
            }
        }

        Err(LifecycleError::NetworkTimeout {
            instance_id: worker.instance_id.clone(),
            polls: max_polls,
        })
    }

    /// Poll the health endpoint until it reports healthy or the poll budget runs out
    pub async fn await_service(&self, worker: &mut Worker, log: &mut TimingLog) -> bool {
        let Some(endpoint) = worker.endpoint(self.config.service.port) else {
            return false;
        };
        let interval = self.config.service.health_poll_interval();
        let probe_timeout = self.config.service.health_request_timeout();
        let budget = self.config.service.health_poll_budget();

        for poll in 1..=budget {
            match timeout(probe_timeout, self.render.health(&endpoint)).await {
                Ok(Ok(true)) => {
                    log.record(format!("Render service healthy after {poll} checks"));
                    worker.state = WorkerState::ServiceReady;
                    return true;
                }
                Ok(Ok(false)) => debug!(poll, "🩺 HEALTH: Service not healthy yet"),
                Ok(Err(e)) => debug!(poll, error = %e, "🩺 HEALTH: Probe failed"),
                Err(_) => debug!(poll, "🩺 HEALTH: Probe timed out"),
            }
            if poll < budget {
                sleep(interval).await;
            }
        }
        log.record(format!("Render service not healthy after {budget} checks"));
        false
    }

    /// Terminate the worker. Never fails: the outcome is returned and logged.
    pub async fn terminate(&self, worker: &mut Worker) -> TerminationOutcome {
        if worker.state == WorkerState::Terminated {
            return TerminationOutcome::AlreadyTerminated;
        }
        let outcome = match self.provider.terminate(&worker.instance_id).await {
            Ok(()) => TerminationOutcome::Terminated,
            Err(e) if e.class() == ProviderErrorClass::NotFound => {
                TerminationOutcome::AlreadyTerminated
            }
            Err(e) => {
                error!(
                    instance_id = %worker.instance_id,
                    batch_id = self.batch_id,
                    error = %e,
                    "🚨 TERMINATION_FAILURE: Instance may still be running and billing"
                );
                worker.state = WorkerState::TerminationFailed;
                log_worker_operation(
                    "terminate",
                    self.batch_id,
                    Some(&worker.instance_id),
                    "failed",
                    Some(&e.to_string()),
                );
                return TerminationOutcome::Failed {
                    error: e.to_string(),
                };
            }
        };
        worker.state = WorkerState::Terminated;
        log_worker_operation(
            "terminate",
            self.batch_id,
            Some(&worker.instance_id),
            "terminated",
            None,
        );
        outcome
    }

    async fn prepare(&self, worker: &mut Worker, log: &mut TimingLog) -> Result<(), LifecycleError> {
        self.await_network(worker, log).await?;
        if !self.await_service(worker, log).await {
            return Err(LifecycleError::ServiceNotReady {
                instance_id: worker.instance_id.clone(),
                polls: self.config.service.health_poll_budget(),
            });
        }
        Ok(())
    }

    fn default_output_dir(&self) -> PathBuf {
        self.config
            .batch
            .results_dir
            .join(format!("worker_{}", Utc::now().timestamp()))
    }

    /// Run `jobs` on one freshly provisioned worker
    pub async fn run_batch(&self, jobs: &[Job], options: &BatchOptions) -> WorkerRun {
        let started = Instant::now();
        let label = self
            .batch_id
            .map(|id| format!("batch-{id}"))
            .unwrap_or_else(|| "worker".to_string());
        let mut log = TimingLog::new(label);
        let mut result = WorkerBatchResult::new(jobs.len());
        let job_names = || jobs.iter().map(Job::name);

        log_worker_operation(
            "run_batch",
            self.batch_id,
            None,
            "started",
            Some(&format!("{} jobs", jobs.len())),
        );

        let mut worker = match self.provision(options.priority, &mut log).await {
            Ok(worker) => worker,
            Err(e) => {
                let e = LifecycleError::from(e);
                result.error = Some(e.to_string());
                result.fail_remaining(job_names(), &format!("Worker setup failed: {e}"));
                return self.finish(result, log, started, None);
            }
        };
        if let Some(registry) = &self.registry {
            registry.register(self.batch_id.unwrap_or(0), &worker.instance_id);
        }
        result.instance_id = Some(worker.instance_id.clone());
        result.profile = Some(worker.profile.clone());
        let mut guard = TerminationGuard::arm(Arc::clone(&self.provider), &worker.instance_id);

        if let Err(e) = self.prepare(&mut worker, &mut log).await {
            warn!(instance_id = %worker.instance_id, error = %e, "🛑 TERMINATE: Worker setup failed");
            result.address = worker.address.clone();
            result.error = Some(e.to_string());
            result.fail_remaining(job_names(), &format!("Worker setup failed: {e}"));
            result.cost = Some(worker.cost_so_far());
            result.final_cost = result.cost.clone();
            result.termination = Some(self.terminate(&mut worker).await);
            guard.disarm();
            return self.finish(result, log, started, None);
        }
        result.address = worker.address.clone();

        let download_dir = options
            .output_dir
            .clone()
            .unwrap_or_else(|| self.default_output_dir());
        let Some(endpoint) = worker.endpoint(self.config.service.port) else {
            // prepare() only succeeds once an address is known
            result.termination = Some(self.terminate(&mut worker).await);
            guard.disarm();
            return self.finish(result, log, started, None);
        };

        worker.state = WorkerState::Processing;
        let executor = BatchExecutor::new(self.render.as_ref(), &self.config, &worker.instance_id);
        executor
            .execute(
                &endpoint,
                jobs,
                &options.render,
                &download_dir,
                &mut result,
                &mut log,
            )
            .await;
        result.cost = Some(worker.cost_so_far());

        if options.auto_terminate {
            let retried = executor
                .download_pending(&mut result, &download_dir, &mut log)
                .await;
            if retried > 0 {
                log.record(format!("{retried} artifacts downloaded on retry"));
            }
            let final_cost = worker.cost_so_far();
            log.record(format!("Final cost {}", final_cost.describe()));
            result.final_cost = Some(final_cost);
            result.termination = Some(self.terminate(&mut worker).await);
            guard.disarm();
            self.finish(result, log, started, None)
        } else {
            worker.state = WorkerState::KeptAlive;
            guard.disarm();
            result.kept_alive = true;
            result.termination = Some(TerminationOutcome::KeptAlive);
            info!(
                instance_id = %worker.instance_id,
                "💡 WORKER: Kept alive for later retrieval"
            );
            self.finish(result, log, started, Some(worker))
        }
    }

    fn finish(
        &self,
        mut result: WorkerBatchResult,
        log: TimingLog,
        started: Instant,
        kept_alive: Option<Worker>,
    ) -> WorkerRun {
        result.total_time_secs = started.elapsed().as_secs_f64();
        result.timing_log = log.into_entries();
        log_worker_operation(
            "run_batch",
            self.batch_id,
            result.instance_id.as_deref(),
            if result.success { "succeeded" } else { "failed" },
            Some(&format!(
                "{}/{} jobs, ${:.6}",
                result.succeeded_jobs,
                result.total_jobs,
                result.best_cost_usd()
            )),
        );
        WorkerRun { result, kept_alive }
    }

    /// Retrieve a kept-alive worker's artifacts, record the final cost and terminate it
    pub async fn download_and_terminate(
        &self,
        mut worker: Worker,
        result: &mut WorkerBatchResult,
        output_dir: &Path,
    ) -> TerminationOutcome {
        let mut log = TimingLog::new(format!("retrieve-{}", worker.instance_id));
        let executor = BatchExecutor::new(self.render.as_ref(), &self.config, &worker.instance_id);
        let saved = executor
            .download_pending(result, output_dir, &mut log)
            .await;
        info!(instance_id = %worker.instance_id, saved, "📥 DOWNLOAD: Retrieved kept-alive artifacts");

        result.final_cost = Some(worker.cost_so_far());
        let outcome = self.terminate(&mut worker).await;
        result.kept_alive = false;
        result.termination = Some(outcome.clone());
        result.timing_log.extend(log.into_entries());
        outcome
    }
}
