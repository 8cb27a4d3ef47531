// crates/server/src/jobs/mod.rs
//! Background download jobs.
//!
//! Provides:
//! - `JobRegistry` - in-memory table of job records, safe for concurrent use
//! - `JobRunner` - spawns one task per download and drives the extractor
//! - `JobRecord` / `JobUpdate` - the record and its partial updates

pub mod registry;
pub mod runner;
pub mod types;

pub use registry::{JobRegistry, RegistryError};
pub use runner::JobRunner;
pub use types::{JobId, JobRecord, JobStatus, JobUpdate};
