// crates/core/src/extract/provider.rs
//! Extractor trait defining the contract with the media-extraction tool.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::types::{ExtractionRequest, MediaInfo, ProgressEvent, SearchHit};
use crate::error::ExtractionError;

/// A media-extraction backend.
///
/// Implementations include:
/// - `YtDlpExtractor` - spawns the `yt-dlp` binary
/// - scripted fakes in tests
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Download `request.target_url` and run its post-processing.
    ///
    /// Progress is reported on `progress` in the order it happens. The call
    /// returns exactly once, after post-processing has finished or failed.
    /// A closed `progress` channel is not an error.
    async fn download(
        &self,
        request: ExtractionRequest,
        progress: mpsc::Sender<ProgressEvent>,
    ) -> Result<(), ExtractionError>;

    /// Fetch metadata for a URL without downloading it.
    async fn probe(&self, url: &str) -> Result<MediaInfo, ExtractionError>;

    /// Search the tool's default site, returning at most `limit` hits.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, ExtractionError>;

    /// Backend name for logging.
    fn name(&self) -> &str;
}
