//! Source synchronization
//!
//! This module drives ingestion: interval gating, parser dispatch, merging,
//! the job audit trail, and the periodic batch trigger.

mod job;
mod orchestrator;
mod scheduler;

pub use job::{JobStatus, SyncJob, MAX_ERROR_MESSAGE_CHARS};
pub use orchestrator::{BatchReport, SourceOutcome, SourceReport, SyncOrchestrator, SyncResult};
pub use scheduler::{run_periodic, run_periodic_until};
