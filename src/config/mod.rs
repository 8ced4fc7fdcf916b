//! # Cloudburst Configuration System
//!
//! Typed configuration for provisioning, the render service contract, batch execution,
//! distribution defaults and pricing. Values come from compiled-in defaults, an optional
//! `config/cloudburst.*` file, and `CLOUDBURST__SECTION__KEY` environment overrides.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use cloudburst_core::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let poll_interval = manager.config().service.health_poll_interval();
//! let max_workers = manager.config().distribution.max_workers;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{service, HEALTH_POLLS_PER_MINUTE, MAX_PROVISION_ATTEMPTS};

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CloudburstConfig {
    /// Instance provisioning and network readiness
    pub provisioning: ProvisioningConfig,

    /// Render service health, request and download bounds
    pub service: ServiceConfig,

    /// Per-worker batch execution behaviour
    pub batch: BatchConfig,

    /// Default distribution parameters for parallel runs
    pub distribution: DistributionConfig,

    /// Pricing fallbacks
    pub pricing: PricingConfig,
}

impl CloudburstConfig {
    /// Validate cross-field constraints after loading
    pub fn validate(&self) -> ConfigResult<()> {
        if self.provisioning.max_create_attempts == 0 {
            return Err(ConfigurationError::invalid_value(
                "provisioning.max_create_attempts",
                self.provisioning.max_create_attempts,
                "at least one creation attempt is required",
            ));
        }
        if self.provisioning.network_max_polls == 0 {
            return Err(ConfigurationError::invalid_value(
                "provisioning.network_max_polls",
                self.provisioning.network_max_polls,
                "network readiness needs a non-zero poll budget",
            ));
        }
        if self.service.api_timeout_minutes == 0 {
            return Err(ConfigurationError::invalid_value(
                "service.api_timeout_minutes",
                self.service.api_timeout_minutes,
                "service readiness needs a non-zero timeout",
            ));
        }
        if self.service.request_timeout_seconds == 0 || self.service.download_timeout_seconds == 0
        {
            return Err(ConfigurationError::invalid_value(
                "service.request_timeout_seconds",
                self.service.request_timeout_seconds,
                "request and download timeouts must be bounded and non-zero",
            ));
        }
        if self.distribution.preferred_per_worker == 0 {
            return Err(ConfigurationError::invalid_value(
                "distribution.preferred_per_worker",
                0,
                "must be at least 1",
            ));
        }
        if self.distribution.max_workers == 0 {
            return Err(ConfigurationError::invalid_value(
                "distribution.max_workers",
                0,
                "must be at least 1",
            ));
        }
        if !(self.pricing.default_hourly_rate_usd.is_finite()
            && self.pricing.default_hourly_rate_usd >= 0.0)
        {
            return Err(ConfigurationError::invalid_value(
                "pricing.default_hourly_rate_usd",
                self.pricing.default_hourly_rate_usd,
                "must be a finite, non-negative rate",
            ));
        }
        Ok(())
    }
}

/// Instance provisioning configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProvisioningConfig {
    /// Target deployment region
    pub region: String,
    /// Requested hardware profile priority (1-based, out of range maps to 1)
    pub profile_priority: u8,
    /// Creation attempts before giving up
    pub max_create_attempts: u32,
    /// Delay between instance state polls
    pub network_poll_interval_ms: u64,
    /// Instance state polls before a network timeout
    pub network_max_polls: u32,
    /// Container image deployed onto each worker
    pub container_image: String,
    /// Container memory limit passed to `docker run`
    pub container_memory_limit: String,
}

impl ProvisioningConfig {
    pub fn network_poll_interval(&self) -> Duration {
        Duration::from_millis(self.network_poll_interval_ms)
    }
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            region: "us-east-1".to_string(),
            profile_priority: 1,
            max_create_attempts: MAX_PROVISION_ATTEMPTS,
            network_poll_interval_ms: 5_000,
            network_max_polls: 24,
            container_image: "betashow/video-generation-api:latest".to_string(),
            container_memory_limit: "8g".to_string(),
        }
    }
}

/// Render service configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Port the render container listens on
    pub port: u16,
    /// Overall service readiness budget in minutes
    pub api_timeout_minutes: u32,
    /// Delay between health checks
    pub health_poll_interval_ms: u64,
    /// Bound on a single health probe
    pub health_request_timeout_seconds: u64,
    /// Bound on a single render request
    pub request_timeout_seconds: u64,
    /// Bound on a single artifact download
    pub download_timeout_seconds: u64,
    /// Optional shared secret sent with render requests
    pub auth_key: Option<String>,
}

impl ServiceConfig {
    /// Health checks allowed before the service is declared not ready
    pub fn health_poll_budget(&self) -> u32 {
        self.api_timeout_minutes.saturating_mul(HEALTH_POLLS_PER_MINUTE)
    }

    pub fn health_poll_interval(&self) -> Duration {
        Duration::from_millis(self.health_poll_interval_ms)
    }

    pub fn health_request_timeout(&self) -> Duration {
        Duration::from_secs(self.health_request_timeout_seconds)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_seconds)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            port: service::DEFAULT_PORT,
            api_timeout_minutes: 15,
            health_poll_interval_ms: 5_000,
            health_request_timeout_seconds: 10,
            request_timeout_seconds: 300,
            download_timeout_seconds: 120,
            auth_key: None,
        }
    }
}

/// Batch execution configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Pause between consecutive jobs on one worker
    pub job_cooldown_ms: u64,
    /// Base directory for downloaded artifacts when the caller gives none
    pub results_dir: PathBuf,
    /// Write a redacted copy of each render request under `results_dir/debug_logs`
    pub write_debug_requests: bool,
}

impl BatchConfig {
    pub fn job_cooldown(&self) -> Duration {
        Duration::from_millis(self.job_cooldown_ms)
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            job_cooldown_ms: 2_000,
            results_dir: PathBuf::from("cloudburst_results"),
            write_debug_requests: false,
        }
    }
}

/// Default distribution parameters
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DistributionConfig {
    pub preferred_per_worker: usize,
    pub max_workers: usize,
    pub min_per_worker: usize,
}

impl Default for DistributionConfig {
    fn default() -> Self {
        Self {
            preferred_per_worker: 10,
            max_workers: 10,
            min_per_worker: 5,
        }
    }
}

/// Pricing fallback configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PricingConfig {
    /// Rate used when an instance class is unknown to every price source
    pub default_hourly_rate_usd: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            default_hourly_rate_usd: crate::constants::DEFAULT_HOURLY_RATE_USD,
        }
    }
}
