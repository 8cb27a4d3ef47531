// crates/server/src/artifacts.rs
//! Naming and housekeeping of files in the download directory.
//!
//! Each job owns the files whose name starts with `<job id>.`; the finished
//! artifact is `<job id>.<ext>` with the extension implied by the quality.

use std::path::{Path, PathBuf};

use mediadrop_core::extract::types::EXT_PLACEHOLDER;
use mediadrop_core::Quality;

/// Output template handed to the extractor for job `id`.
pub fn output_template(download_dir: &Path, id: &str) -> String {
    download_dir
        .join(format!("{id}.{EXT_PLACEHOLDER}"))
        .to_string_lossy()
        .into_owned()
}

/// Where the finished artifact for job `id` lives.
pub fn artifact_path(download_dir: &Path, id: &str, quality: Quality) -> PathBuf {
    download_dir.join(format!("{id}.{}", quality.extension()))
}

/// File name offered to the client in `Content-Disposition`.
pub fn download_name(id: &str, quality: Quality) -> String {
    format!("download_{id}.{}", quality.extension())
}

/// Whether `file_name` belongs to some job (starts with a UUID followed by `.`).
fn is_job_file(file_name: &str) -> bool {
    file_name
        .split_once('.')
        .is_some_and(|(stem, _)| uuid::Uuid::parse_str(stem).is_ok())
}

/// Delete job files left over from a previous run.
///
/// Jobs do not survive a restart, so anything named after a job id is an
/// orphan. Other files and subdirectories are left alone. Returns how many
/// files were removed.
pub async fn sweep_orphans(download_dir: &Path) -> std::io::Result<usize> {
    let mut removed = 0;
    let mut entries = tokio::fs::read_dir(download_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if !is_job_file(name) {
            continue;
        }
        match tokio::fs::remove_file(entry.path()).await {
            Ok(()) => removed += 1,
            Err(e) => tracing::warn!(file = %name, error = %e, "Failed to remove orphaned artifact"),
        }
    }
    Ok(removed)
}
