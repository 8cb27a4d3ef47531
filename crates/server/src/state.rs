// crates/server/src/state.rs
//! Application state for the Axum server.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use mediadrop_core::Extractor;

use crate::delivery::Delivery;
use crate::jobs::{JobRegistry, JobRunner};

/// Shared application state accessible from all route handlers.
pub struct AppState {
    /// Server start time for uptime tracking.
    pub start_time: Instant,
    /// Every job submitted since startup.
    pub registry: Arc<JobRegistry>,
    /// Spawns one background download per submission.
    pub runner: JobRunner,
    /// Single-use file hand-out for finished jobs.
    pub delivery: Delivery,
    /// Used directly for info and search lookups.
    pub extractor: Arc<dyn Extractor>,
}

impl AppState {
    /// Create a new application state wrapped in an Arc for sharing.
    pub fn new(extractor: Arc<dyn Extractor>, download_dir: impl Into<PathBuf>) -> Arc<Self> {
        let download_dir = download_dir.into();
        let registry = Arc::new(JobRegistry::new());
        Arc::new(Self {
            start_time: Instant::now(),
            runner: JobRunner::new(Arc::clone(&registry), Arc::clone(&extractor), download_dir.clone()),
            delivery: Delivery::new(Arc::clone(&registry), download_dir),
            registry,
            extractor,
        })
    }

    /// Get the server uptime in seconds.
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
