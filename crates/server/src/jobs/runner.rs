// crates/server/src/jobs/runner.rs
//! Job runner that spawns one background task per download.

use std::any::Any;
use std::path::PathBuf;
use std::sync::Arc;

use mediadrop_core::{ExtractionError, ExtractionRequest, Extractor, ProgressEvent, Quality};
use tokio::sync::mpsc;

use super::registry::{JobRegistry, RegistryError};
use super::types::{JobRecord, JobUpdate};
use crate::artifacts;

/// Capacity of the per-job progress channel.
const PROGRESS_CHANNEL_CAPACITY: usize = 64;

/// Spawns and tracks download jobs.
///
/// `submit` returns as soon as the job is registered; the download itself runs
/// on a tokio task that is the only writer of that job's record. Failures and
/// panics inside the task end up in the record's `error` state.
pub struct JobRunner {
    registry: Arc<JobRegistry>,
    extractor: Arc<dyn Extractor>,
    download_dir: PathBuf,
}

impl JobRunner {
    pub fn new(registry: Arc<JobRegistry>, extractor: Arc<dyn Extractor>, download_dir: impl Into<PathBuf>) -> Self {
        Self {
            registry,
            extractor,
            download_dir: download_dir.into(),
        }
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    /// Register a new job and start downloading `url` in the background.
    pub fn submit(&self, url: impl Into<String>, quality: Quality) -> Result<JobRecord, RegistryError> {
        let id = uuid::Uuid::new_v4().to_string();
        let record = self.registry.create(id.clone(), quality)?;

        let template = artifacts::output_template(&self.download_dir, &id);
        let request = ExtractionRequest::for_quality(url, quality, template);
        tracing::info!(
            task_id = %id,
            quality = %quality,
            url = %request.target_url,
            extractor = self.extractor.name(),
            "Download submitted"
        );

        let registry = Arc::clone(&self.registry);
        let extractor = Arc::clone(&self.extractor);
        tokio::spawn(supervise(id, registry, extractor, request));

        Ok(record)
    }
}

/// Run one job and record how it ended.
///
/// The extraction runs on its own task so a panic there surfaces as a
/// `JoinError` here instead of tearing down anything else.
async fn supervise(
    id: String,
    registry: Arc<JobRegistry>,
    extractor: Arc<dyn Extractor>,
    request: ExtractionRequest,
) {
    let task = tokio::spawn(run_extraction(id.clone(), Arc::clone(&registry), extractor, request));

    let update = match task.await {
        Ok(Ok(())) => {
            tracing::info!(task_id = %id, "Download finished");
            JobUpdate::finished()
        }
        Ok(Err(e)) => {
            tracing::warn!(task_id = %id, error = %e, "Download failed");
            JobUpdate::failed(e.to_string())
        }
        Err(join_err) => {
            let reason = if join_err.is_panic() {
                format!("extraction task panicked: {}", panic_message(join_err.into_panic()))
            } else {
                "extraction task was cancelled".to_string()
            };
            tracing::error!(task_id = %id, reason = %reason, "Download task aborted");
            JobUpdate::failed(reason)
        }
    };
    registry.update(&id, update);
}

/// Drive the extractor while applying its progress events in order.
async fn run_extraction(
    id: String,
    registry: Arc<JobRegistry>,
    extractor: Arc<dyn Extractor>,
    request: ExtractionRequest,
) -> Result<(), ExtractionError> {
    let (progress_tx, mut progress_rx) = mpsc::channel(PROGRESS_CHANNEL_CAPACITY);
    let download = extractor.download(request, progress_tx);
    tokio::pin!(download);

    let result = loop {
        tokio::select! {
            biased;
            Some(event) = progress_rx.recv() => apply_progress(&registry, &id, event),
            result = &mut download => break result,
        }
    };
    // Events sent just before the extractor returned.
    while let Ok(event) = progress_rx.try_recv() {
        apply_progress(&registry, &id, event);
    }
    result
}

fn apply_progress(registry: &JobRegistry, id: &str, event: ProgressEvent) {
    let update = match event {
        ProgressEvent::Downloading {
            percent,
            speed,
            eta,
        } => JobUpdate::downloading(percent, speed, eta),
        ProgressEvent::Finished => JobUpdate::processing(),
    };
    registry.update(id, update);
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
