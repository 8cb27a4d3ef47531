// crates/server/src/jobs/types.rs
//! Types for the download job system.

use mediadrop_core::Quality;
use serde::{Deserialize, Serialize};

/// Unique identifier for a job (a UUID v4 string).
pub type JobId = String;

/// Placeholder for speed/ETA before the extractor reports anything.
const NOT_STARTED: &str = "0";

/// Status of a download job.
///
/// Jobs only move forward: `Pending → Downloading → Processing → Finished`,
/// or jump to `Error` from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Downloading,
    Processing,
    Finished,
    Error,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Downloading => "downloading",
            JobStatus::Processing => "processing",
            JobStatus::Finished => "finished",
            JobStatus::Error => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Finished | JobStatus::Error)
    }

    fn rank(&self) -> u8 {
        match self {
            JobStatus::Pending => 0,
            JobStatus::Downloading => 1,
            JobStatus::Processing => 2,
            JobStatus::Finished => 3,
            JobStatus::Error => 3,
        }
    }

    /// Whether a job in this status may move to `next`.
    ///
    /// Staying in the same non-terminal status is allowed. Forward skips are
    /// allowed too (a cached download can go straight from `Pending` to
    /// `Processing`).
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match next {
            JobStatus::Error => true,
            _ => next.rank() >= self.rank(),
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of one download job, as returned by `GET /api/tasks`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: JobId,
    pub status: JobStatus,
    /// Percentage, 0–100. Never decreases.
    pub progress: f64,
    pub speed: String,
    pub eta: String,
    pub quality: Quality,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl JobRecord {
    pub fn new(id: impl Into<JobId>, quality: Quality) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: id.into(),
            status: JobStatus::Pending,
            progress: 0.0,
            speed: NOT_STARTED.to_string(),
            eta: NOT_STARTED.to_string(),
            quality,
            error: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Merge `update` into the record.
    ///
    /// The whole update is dropped when the record is terminal or the status
    /// change would move backwards. `error` is only kept when the resulting
    /// status is `Error`. Returns `true` if anything changed.
    pub fn apply(&mut self, update: JobUpdate) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        if let Some(next) = update.status {
            if next != self.status && !self.status.can_transition_to(next) {
                return false;
            }
        }

        let before = self.clone();
        if let Some(next) = update.status {
            self.status = next;
        }
        if let Some(progress) = update.progress {
            let progress = progress.clamp(0.0, 100.0);
            if progress > self.progress {
                self.progress = progress;
            }
        }
        if let Some(speed) = update.speed {
            self.speed = speed;
        }
        if let Some(eta) = update.eta {
            self.eta = eta;
        }
        if self.status == JobStatus::Error {
            self.error = Some(update.error.unwrap_or_else(|| "unknown error".to_string()));
        }

        let changed = *self != before;
        if changed {
            self.updated_at = chrono::Utc::now().to_rfc3339();
        }
        changed
    }
}

/// Partial update merged into a `JobRecord`. `None` fields are left alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobUpdate {
    pub status: Option<JobStatus>,
    pub progress: Option<f64>,
    pub speed: Option<String>,
    pub eta: Option<String>,
    pub error: Option<String>,
}

impl JobUpdate {
    pub fn downloading(percent: Option<f64>, speed: impl Into<String>, eta: impl Into<String>) -> Self {
        Self {
            status: Some(JobStatus::Downloading),
            progress: percent,
            speed: Some(speed.into()),
            eta: Some(eta.into()),
            error: None,
        }
    }

    /// Raw retrieval is done; post-processing runs next.
    pub fn processing() -> Self {
        Self {
            status: Some(JobStatus::Processing),
            progress: Some(100.0),
            ..Self::default()
        }
    }

    pub fn finished() -> Self {
        Self {
            status: Some(JobStatus::Finished),
            ..Self::default()
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: Some(JobStatus::Error),
            error: Some(error.into()),
            ..Self::default()
        }
    }
}
