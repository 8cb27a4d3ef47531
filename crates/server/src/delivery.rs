// crates/server/src/delivery.rs
//! One-shot delivery of finished artifacts.
//!
//! A finished job's file is streamed once and then removed from disk. A
//! completed transfer removes it before the body ends. A body dropped early
//! (the client went away) removes it from the guard's `Drop`.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use axum::body::Bytes;
use mediadrop_core::Quality;
use thiserror::Error;
use tokio_stream::{Stream, StreamExt};
use tokio_util::io::ReaderStream;

use crate::artifacts;
use crate::jobs::{JobId, JobRegistry, JobStatus};

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Task {0} is not finished or does not exist")]
    NotReady(JobId),

    #[error("Artifact for task {0} is missing")]
    ArtifactMissing(JobId),

    #[error("IO error opening {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

type ClaimSet = Arc<Mutex<HashSet<JobId>>>;

/// Hands out finished artifacts, each at most once.
pub struct Delivery {
    registry: Arc<JobRegistry>,
    download_dir: PathBuf,
    in_flight: ClaimSet,
}

impl Delivery {
    pub fn new(registry: Arc<JobRegistry>, download_dir: impl Into<PathBuf>) -> Self {
        Self {
            registry,
            download_dir: download_dir.into(),
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    fn finished_quality(&self, task_id: &str) -> Result<Quality, DeliveryError> {
        self.registry
            .get(task_id)
            .filter(|r| r.status == JobStatus::Finished)
            .map(|r| r.quality)
            .ok_or_else(|| DeliveryError::NotReady(task_id.to_string()))
    }

    /// Describe the artifact of a finished job without claiming or removing it.
    ///
    /// Fails the same way `open` would.
    pub async fn inspect(&self, task_id: &str) -> Result<ArtifactInfo, DeliveryError> {
        let quality = self.finished_quality(task_id)?;
        if lock_claims(&self.in_flight).contains(task_id) {
            return Err(DeliveryError::ArtifactMissing(task_id.to_string()));
        }

        let path = artifacts::artifact_path(&self.download_dir, task_id, quality);
        let len = match tokio::fs::metadata(&path).await {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(DeliveryError::ArtifactMissing(task_id.to_string()));
            }
            Err(source) => return Err(DeliveryError::Io { path, source }),
        };
        Ok(ArtifactInfo {
            task_id: task_id.to_string(),
            quality,
            len,
        })
    }

    /// Open the artifact of a finished job for streaming.
    ///
    /// Fails with `NotReady` for unknown or unfinished jobs, and with
    /// `ArtifactMissing` when the file is gone (already delivered) or another
    /// delivery of the same job is in progress. Neither failure changes any
    /// state.
    pub async fn open(&self, task_id: &str) -> Result<Artifact, DeliveryError> {
        let quality = self.finished_quality(task_id)?;

        let claim = Claim::acquire(&self.in_flight, task_id)
            .ok_or_else(|| DeliveryError::ArtifactMissing(task_id.to_string()))?;

        let path = artifacts::artifact_path(&self.download_dir, task_id, quality);
        let file = match tokio::fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(task_id = %task_id, path = %path.display(), "Finished task has no artifact on disk");
                return Err(DeliveryError::ArtifactMissing(task_id.to_string()));
            }
            Err(source) => return Err(DeliveryError::Io { path, source }),
        };
        let len = file
            .metadata()
            .await
            .map_err(|source| DeliveryError::Io {
                path: path.clone(),
                source,
            })?
            .len();

        Ok(Artifact {
            info: ArtifactInfo {
                task_id: task_id.to_string(),
                quality,
                len,
            },
            file,
            cleanup: RemoveOnDrop {
                path,
                task_id: task_id.to_string(),
                claim: Some(claim),
                removed: false,
            },
        })
    }
}

/// What a client is told about an artifact before any bytes move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactInfo {
    pub task_id: JobId,
    pub quality: Quality,
    /// Size in bytes.
    pub len: u64,
}

impl ArtifactInfo {
    pub fn download_name(&self) -> String {
        artifacts::download_name(&self.task_id, self.quality)
    }

    pub fn content_type(&self) -> &'static str {
        self.quality.content_type()
    }
}

/// An opened artifact, ready to be streamed.
pub struct Artifact {
    info: ArtifactInfo,
    file: tokio::fs::File,
    cleanup: RemoveOnDrop,
}

impl Artifact {
    pub fn info(&self) -> &ArtifactInfo {
        &self.info
    }

    /// Stream the file contents. The file is deleted once the stream is
    /// exhausted or dropped.
    pub fn into_stream(self) -> impl Stream<Item = std::io::Result<Bytes>> + Send + 'static {
        let Artifact { file, cleanup, .. } = self;
        let mut chunks = ReaderStream::new(file);
        async_stream::stream! {
            let mut cleanup = cleanup;
            while let Some(chunk) = chunks.next().await {
                yield chunk;
            }
            drop(chunks);
            cleanup.remove_now().await;
        }
    }
}

/// Deletes the artifact, then releases the delivery claim.
struct RemoveOnDrop {
    path: PathBuf,
    task_id: JobId,
    claim: Option<Claim>,
    removed: bool,
}

impl RemoveOnDrop {
    async fn remove_now(&mut self) {
        let result = tokio::fs::remove_file(&self.path).await;
        log_removal(&self.task_id, &self.path, result);
        self.removed = true;
    }
}

impl Drop for RemoveOnDrop {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        let path = std::mem::take(&mut self.path);
        let task_id = std::mem::take(&mut self.task_id);
        let claim = self.claim.take();
        let remove = move || {
            log_removal(&task_id, &path, std::fs::remove_file(&path));
            drop(claim);
        };
        // Without a runtime (plain drop in sync code) remove inline.
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(remove);
            }
            Err(_) => remove(),
        }
    }
}

fn log_removal(task_id: &str, path: &Path, result: std::io::Result<()>) {
    match result {
        Ok(()) => tracing::info!(task_id = %task_id, "Artifact delivered and removed"),
        Err(e) => tracing::warn!(
            task_id = %task_id,
            path = %path.display(),
            error = %e,
            "Failed to remove delivered artifact"
        ),
    }
}

fn lock_claims(set: &ClaimSet) -> MutexGuard<'_, HashSet<JobId>> {
    match set.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::error!("Mutex poisoned on delivery claims");
            poisoned.into_inner()
        }
    }
}

/// Marks a job as being delivered; released on drop.
struct Claim {
    set: ClaimSet,
    task_id: JobId,
}

impl Claim {
    fn acquire(set: &ClaimSet, task_id: &str) -> Option<Self> {
        if !lock_claims(set).insert(task_id.to_string()) {
            tracing::warn!(task_id = %task_id, "Concurrent delivery rejected");
            return None;
        }
        Some(Self {
            set: Arc::clone(set),
            task_id: task_id.to_string(),
        })
    }
}

impl Drop for Claim {
    fn drop(&mut self) {
        lock_claims(&self.set).remove(&self.task_id);
    }
}
