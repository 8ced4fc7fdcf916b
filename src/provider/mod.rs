//! # Compute Provisioning Interface
//!
//! The narrow surface the lifecycle manager needs from a cloud compute API. Implementations
//! wrap a concrete provider SDK; tests use in-memory fakes.

pub mod classifier;
pub mod launch;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::models::HardwareProfile;

pub use classifier::{classify_provider_error, ProviderErrorClass};
pub use launch::LaunchSpec;

/// Raw provider failure. `code` carries the provider's error code when it exposes one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ProviderError {
    pub code: Option<String>,
    pub message: String,
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
        }
    }

    pub fn class(&self) -> ProviderErrorClass {
        classify_provider_error(self)
    }
}

/// Regional availability of an instance class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    pub instance_class: String,
    pub available: bool,
    pub zones: Vec<String>,
}

/// Provider-reported instance state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InstanceState {
    Pending,
    Running,
    ShuttingDown,
    Terminated,
    Stopping,
    Stopped,
}

impl InstanceState {
    /// States from which the instance will never become running on its own
    pub fn is_gone(&self) -> bool {
        matches!(self, InstanceState::ShuttingDown | InstanceState::Terminated)
    }
}

impl fmt::Display for InstanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            InstanceState::Pending => "pending",
            InstanceState::Running => "running",
            InstanceState::ShuttingDown => "shutting-down",
            InstanceState::Terminated => "terminated",
            InstanceState::Stopping => "stopping",
            InstanceState::Stopped => "stopped",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceStatus {
    pub state: InstanceState,
    pub public_address: Option<String>,
}

/// Compute provisioning service
#[async_trait]
pub trait ComputeProvider: Send + Sync + fmt::Debug {
    /// Whether `instance_class` is offered in the target region
    async fn describe_availability(&self, instance_class: &str)
        -> Result<Availability, ProviderError>;

    /// Launch one instance and return its identifier
    async fn create(
        &self,
        profile: &HardwareProfile,
        launch: &LaunchSpec,
    ) -> Result<String, ProviderError>;

    async fn describe_instance(&self, instance_id: &str) -> Result<InstanceStatus, ProviderError>;

    /// Request termination. Implementations should treat an already-terminated instance
    /// as success or report a not-found class error.
    async fn terminate(&self, instance_id: &str) -> Result<(), ProviderError>;

    /// Lowest-level termination call, used by the emergency sweep when `terminate` fails.
    async fn force_terminate(&self, instance_id: &str) -> Result<(), ProviderError> {
        self.terminate(instance_id).await
    }
}
