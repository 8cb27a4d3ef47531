// crates/core/src/lib.rs
//! Extraction side of mediadrop.
//!
//! Holds the quality presets, the `Extractor` contract the job runner drives,
//! and the `yt-dlp` adapter that implements it.

pub mod error;
pub mod extract;
pub mod quality;

pub use error::*;
pub use extract::{
    ExtractionRequest, Extractor, MediaInfo, PostProcessing, ProgressEvent, SearchHit,
    YtDlpExtractor,
};
pub use quality::{Quality, UnknownQuality};
