#![allow(clippy::doc_markdown)] // Allow technical terms like reqwest, JoinSet in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Cloudburst Core
//!
//! Ephemeral render-worker provisioning and parallel batch orchestration.
//!
//! ## Overview
//!
//! A batch of media-generation jobs (image + audio + optional captions → video) is run on
//! short-lived cloud instances that are created on demand, bootstrapped with a containerized
//! render service, driven over HTTP, and terminated when their work is done. Instances bill
//! from the moment creation is requested, so every worker path ends in termination unless
//! the caller explicitly keeps a worker alive.
//!
//! ## Module Organization
//!
//! - [`provider`] - Compute provisioning interface and error classification
//! - [`render`] - Render service interface and its HTTP client
//! - [`pricing`] - Hourly rate resolution and the rental cost model
//! - [`orchestration`] - Worker lifecycle, batch execution, distribution planning and the
//!   parallel orchestrator
//! - [`models`] - Jobs, hardware profiles and result records
//! - [`scenes`] - Job discovery from a scene folder
//! - [`config`] - Layered configuration
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use cloudburst_core::config::ConfigManager;
//! use cloudburst_core::models::{EffectFlags, Language};
//! use cloudburst_core::orchestration::{run_parallel_batches, WorkerLifecycle};
//! use cloudburst_core::provider::ComputeProvider;
//! use cloudburst_core::render::HttpRenderClient;
//!
//! # async fn example(provider: Arc<dyn ComputeProvider>) -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let config = Arc::new(manager.config().clone());
//! let render = Arc::new(HttpRenderClient::new(&config.service)?);
//! let lifecycle = WorkerLifecycle::new(provider, render, config);
//!
//! let jobs = cloudburst_core::scenes::scan_scene_folder("./project")?;
//! let result = run_parallel_batches(
//!     &lifecycle,
//!     &jobs,
//!     10,
//!     10,
//!     5,
//!     Language::English,
//!     EffectFlags::default(),
//!     Path::new("./results"),
//! )
//! .await?;
//! println!("{}/{} jobs, ${:.4}", result.succeeded_jobs, result.total_jobs, result.total_cost_usd);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod models;
pub mod orchestration;
pub mod pricing;
pub mod provider;
pub mod render;
pub mod scenes;

pub use config::{CloudburstConfig, ConfigManager, ConfigurationError};
pub use error::{
    CloudburstError, LifecycleError, OrchestrationError, ProvisionError, RenderError, Result,
};
pub use models::{
    AggregateResult, EffectFlags, Job, JobResult, Language, RenderOptions, WorkerBatchResult,
};
pub use orchestration::{
    plan_distribution, run_parallel_batches, run_single_worker_batch, DistributionPlan,
    ParallelOrchestrator, WorkerLifecycle, WorkerRun,
};
pub use pricing::{calculate_cost, CostBreakdown};
pub use provider::ComputeProvider;
pub use render::{HttpRenderClient, RenderService};
