// crates/core/src/extract/mod.rs
//! Extraction module.
//!
//! Provides the `Extractor` trait the job runner drives and the `yt-dlp`
//! implementation that spawns the tool and translates its progress output.

pub mod progress;
pub mod provider;
pub mod types;
pub mod ytdlp;

pub use provider::Extractor;
pub use types::{ExtractionRequest, MediaInfo, PostProcessing, ProgressEvent, SearchHit};
pub use ytdlp::YtDlpExtractor;
