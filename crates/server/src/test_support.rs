// crates/server/src/test_support.rs
//! In-process `Extractor` used by unit tests.

use async_trait::async_trait;
use mediadrop_core::{ExtractionError, ExtractionRequest, Extractor, MediaInfo, ProgressEvent, SearchHit};
use tokio::sync::mpsc;

/// Writes `payload` to the requested output path and reports success.
/// Lookups return `info` / `hits`, or fail when `fail_lookups` is set.
pub struct StubExtractor {
    pub payload: Vec<u8>,
    pub info: MediaInfo,
    pub hits: Vec<SearchHit>,
    pub fail_lookups: bool,
}

impl Default for StubExtractor {
    fn default() -> Self {
        Self {
            payload: b"media".to_vec(),
            info: MediaInfo::default(),
            hits: Vec::new(),
            fail_lookups: false,
        }
    }
}

#[async_trait]
impl Extractor for StubExtractor {
    async fn download(
        &self,
        request: ExtractionRequest,
        progress: mpsc::Sender<ProgressEvent>,
    ) -> Result<(), ExtractionError> {
        let _ = progress.send(ProgressEvent::Finished).await;
        tokio::fs::write(request.final_output_path(), &self.payload).await?;
        Ok(())
    }

    async fn probe(&self, _url: &str) -> Result<MediaInfo, ExtractionError> {
        if self.fail_lookups {
            return Err(ExtractionError::tool_failed(Some(1), "ERROR: Unsupported URL"));
        }
        Ok(self.info.clone())
    }

    async fn search(&self, _query: &str, limit: usize) -> Result<Vec<SearchHit>, ExtractionError> {
        if self.fail_lookups {
            return Err(ExtractionError::tool_failed(Some(1), "ERROR: search unavailable"));
        }
        Ok(self.hits.iter().take(limit).cloned().collect())
    }

    fn name(&self) -> &str {
        "stub"
    }
}
