//! # Domain Models
//!
//! Jobs, hardware profiles, scenarios and the result records produced at job, worker and
//! aggregate level.

pub mod job;
pub mod profile;
pub mod results;
pub mod scenario;

pub use job::{EffectFlags, Job, Language, RenderOptions};
pub use profile::{HardwareProfile, ProfileCatalog, ProfileCategory, ResolvedProfile};
pub use results::{
    AggregateResult, DownloadedArtifact, Efficiency, JobOutcome, JobResult, PartitionReport,
    RenderedArtifact, TerminationOutcome, WorkerBatchResult,
};
pub use scenario::Scenario;
