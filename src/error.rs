//! Error types for the Cloudburst system.
//!
//! Failures local to one job or one download never show up here: they are absorbed into
//! [`JobResult`](crate::models::JobResult) records. The types below cover the failures that
//! end a worker's setup phase, invalidate a distribution request, or take down the
//! orchestration layer itself.

use crate::config::ConfigurationError;
use thiserror::Error;

/// Umbrella error for the public surface of the crate
#[derive(Debug, Error)]
pub enum CloudburstError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
    #[error("Lifecycle error: {0}")]
    Lifecycle(#[from] LifecycleError),
    #[error("Orchestration error: {0}")]
    Orchestration(#[from] OrchestrationError),
    #[error("Render service error: {0}")]
    Render(#[from] RenderError),
    #[error("Invalid job: {0}")]
    InvalidJob(String),
    #[error("Scene discovery error: {0}")]
    SceneDiscovery(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CloudburstError>;

/// Provisioning failures. Capacity-class failures are recovered by profile substitution
/// inside the lifecycle; everything that escapes is fatal for the worker.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProvisionError {
    /// Neither the requested profile nor any fallback is offered in the region
    #[error("No available instance profile found. Checked: {checked:?}")]
    NoAvailableProfile { checked: Vec<String> },

    /// Capacity/quota errors consumed every fallback profile
    #[error("All instance profiles failed with capacity errors. Tried: {attempted:?}")]
    FallbacksExhausted { attempted: Vec<String> },

    /// Non-recoverable creation failure, not retried
    #[error("Instance creation for {instance_class} rejected: {message}")]
    Rejected {
        instance_class: String,
        message: String,
    },

    /// The retry bound was reached without a successful creation
    #[error("Failed to create instance after {attempts} attempts. Tried: {attempted:?}")]
    AttemptsExhausted {
        attempts: u32,
        attempted: Vec<String>,
    },
}

/// Failures of a single worker's setup phase
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Provision(#[from] ProvisionError),

    /// The instance never reported running with a network address
    #[error("Instance {instance_id} not network-ready after {polls} polls")]
    NetworkTimeout { instance_id: String, polls: u32 },

    /// The instance went away while we were waiting for it
    #[error("Instance {instance_id} entered state '{state}' while waiting for it to run")]
    InstanceLost { instance_id: String, state: String },

    /// The instance exists but the render service never became healthy
    #[error("Render service on {instance_id} not healthy after {polls} health checks")]
    ServiceNotReady { instance_id: String, polls: u32 },
}

/// Render service call failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Timed out after {0}s")]
    Timeout(u64),
    #[error("Invalid response body: {0}")]
    Decode(String),
    #[error("Failed to read input '{path}': {reason}")]
    InputRead { path: String, reason: String },
    #[error("Failed to write '{path}': {reason}")]
    Io { path: String, reason: String },
}

impl From<reqwest::Error> for RenderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RenderError::Transport(format!("request timed out: {err}"))
        } else if err.is_decode() {
            RenderError::Decode(err.to_string())
        } else {
            RenderError::Transport(err.to_string())
        }
    }
}

/// Failures of the orchestration layer, not attributable to a single worker's own handling
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OrchestrationError {
    #[error("Invalid distribution request: {0}")]
    InvalidDistribution(String),
}
