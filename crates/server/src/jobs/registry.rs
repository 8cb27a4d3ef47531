// crates/server/src/jobs/registry.rs
//! In-memory table of download jobs.

use std::collections::BTreeMap;
use std::sync::RwLock;

use mediadrop_core::Quality;
use thiserror::Error;
use tokio::sync::broadcast;

use super::types::{JobId, JobRecord, JobUpdate};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Duplicate job identifier: {0}")]
    DuplicateIdentifier(JobId),

    #[error("Job registry lock poisoned")]
    Poisoned,
}

/// Table of every job submitted during the process lifetime.
///
/// One `RwLock` guards the whole table; updates are small and contention is
/// low. Each job is written only by the task that owns it. Every accepted
/// change is broadcast to subscribers (for SSE).
pub struct JobRegistry {
    jobs: RwLock<BTreeMap<JobId, JobRecord>>,
    updates_tx: broadcast::Sender<JobRecord>,
}

impl JobRegistry {
    pub fn new() -> Self {
        let (updates_tx, _) = broadcast::channel(256);
        Self {
            jobs: RwLock::new(BTreeMap::new()),
            updates_tx,
        }
    }

    /// Insert a new `pending` record.
    pub fn create(&self, id: impl Into<JobId>, quality: Quality) -> Result<JobRecord, RegistryError> {
        let id = id.into();
        let record = {
            let mut jobs = self.jobs.write().map_err(|e| {
                tracing::error!("RwLock poisoned writing jobs map: {e}");
                RegistryError::Poisoned
            })?;
            if jobs.contains_key(&id) {
                return Err(RegistryError::DuplicateIdentifier(id));
            }
            let record = JobRecord::new(id.clone(), quality);
            jobs.insert(id, record.clone());
            record
        };
        let _ = self.updates_tx.send(record.clone());
        Ok(record)
    }

    /// Merge `update` into the record for `id`.
    ///
    /// Returns `true` if the record changed. Unknown ids and updates that
    /// would move a job backwards are ignored.
    pub fn update(&self, id: &str, update: JobUpdate) -> bool {
        let snapshot = {
            let mut jobs = match self.jobs.write() {
                Ok(jobs) => jobs,
                Err(e) => {
                    tracing::error!("RwLock poisoned writing jobs map: {e}");
                    return false;
                }
            };
            let Some(record) = jobs.get_mut(id) else {
                tracing::debug!(task_id = %id, "update for unknown job ignored");
                return false;
            };
            let from = record.status;
            if !record.apply(update) {
                tracing::debug!(task_id = %id, status = %from, "update dropped (no change or backwards)");
                return false;
            }
            record.clone()
        };
        // Ignore send errors (no subscribers is fine).
        let _ = self.updates_tx.send(snapshot);
        true
    }

    /// Current snapshot of one job.
    pub fn get(&self, id: &str) -> Option<JobRecord> {
        match self.jobs.read() {
            Ok(jobs) => jobs.get(id).cloned(),
            Err(e) => {
                tracing::error!("RwLock poisoned reading jobs map: {e}");
                None
            }
        }
    }

    /// Snapshot of every job, keyed by id.
    pub fn list_all(&self) -> BTreeMap<JobId, JobRecord> {
        match self.jobs.read() {
            Ok(jobs) => jobs.clone(),
            Err(e) => {
                tracing::error!("RwLock poisoned reading jobs map: {e}");
                BTreeMap::new()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.jobs.read().map(|jobs| jobs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Subscribe to every accepted change (creation included).
    pub fn subscribe(&self) -> broadcast::Receiver<JobRecord> {
        self.updates_tx.subscribe()
    }
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::JobStatus;
    use std::sync::Arc;

    #[test]
    fn test_create_and_get() {
        let registry = JobRegistry::new();
        let record = registry.create("a", Quality::Mp3).unwrap();
        assert_eq!(record.status, JobStatus::Pending);
        assert_eq!(registry.get("a"), Some(record));
        assert_eq!(registry.get("missing"), None);
    }

    #[test]
    fn test_duplicate_identifier_rejected() {
        let registry = JobRegistry::new();
        registry.create("a", Quality::Mp3).unwrap();
        let err = registry.create("a", Quality::P720).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateIdentifier(ref id) if id == "a"));
        // Original record untouched.
        assert_eq!(registry.get("a").unwrap().quality, Quality::Mp3);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_update_unknown_is_noop() {
        let registry = JobRegistry::new();
        assert!(!registry.update("ghost", JobUpdate::finished()));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_update_merges_fields() {
        let registry = JobRegistry::new();
        registry.create("a", Quality::BestMp4).unwrap();
        assert!(registry.update("a", JobUpdate::downloading(Some(40.0), "3MiB/s", "00:05")));
        let record = registry.get("a").unwrap();
        assert_eq!(record.status, JobStatus::Downloading);
        assert_eq!(record.progress, 40.0);
        assert_eq!(record.quality, Quality::BestMp4);
    }

    #[test]
    fn test_list_all_is_stable_without_activity() {
        let registry = JobRegistry::new();
        registry.create("b", Quality::Mp3).unwrap();
        registry.create("a", Quality::P720).unwrap();
        registry.update("a", JobUpdate::processing());

        let first = serde_json::to_string(&registry.list_all()).unwrap();
        let second = serde_json::to_string(&registry.list_all()).unwrap();
        assert_eq!(first, second);
        assert_eq!(registry.list_all().keys().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_concurrent_writers_do_not_cross_contaminate() {
        let registry = Arc::new(JobRegistry::new());
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    let id = format!("job-{i}");
                    registry.create(id.clone(), Quality::P720).unwrap();
                    for step in 1..=50 {
                        registry.update(
                            &id,
                            JobUpdate::downloading(Some(step as f64), format!("{i}KiB/s"), format!("eta-{i}")),
                        );
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let all = registry.list_all();
        assert_eq!(all.len(), 16);
        for i in 0..16 {
            let record = &all[&format!("job-{i}")];
            assert_eq!(record.progress, 50.0);
            assert_eq!(record.speed, format!("{i}KiB/s"));
            assert_eq!(record.eta, format!("eta-{i}"));
        }
    }

    #[tokio::test]
    async fn test_subscribe_receives_changes() {
        let registry = JobRegistry::new();
        let mut rx = registry.subscribe();

        registry.create("a", Quality::Mp3).unwrap();
        registry.update("a", JobUpdate::processing());
        // Rejected update: not broadcast.
        registry.update("a", JobUpdate::downloading(Some(1.0), "x", "y"));
        registry.update("a", JobUpdate::finished());

        let statuses: Vec<JobStatus> = vec![
            rx.recv().await.unwrap().status,
            rx.recv().await.unwrap().status,
            rx.recv().await.unwrap().status,
        ];
        assert_eq!(
            statuses,
            vec![JobStatus::Pending, JobStatus::Processing, JobStatus::Finished]
        );
        assert!(rx.try_recv().is_err());
    }
}
