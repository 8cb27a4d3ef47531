// crates/core/src/extract/types.rs
//! Request/event types exchanged with the extraction tool.

use serde::{Deserialize, Serialize};

use crate::quality::Quality;

/// Placeholder the tool replaces with the final file extension.
pub const EXT_PLACEHOLDER: &str = "%(ext)s";

/// What to do with the raw streams once they are on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostProcessing {
    /// Merge separate video and audio streams into one container.
    Merge { container: String },
    /// Drop the video and transcode the audio track.
    ExtractAudio { codec: String, quality_kbps: u32 },
}

impl PostProcessing {
    /// Extension of the file left on disk after this step.
    pub fn output_extension(&self) -> &str {
        match self {
            PostProcessing::Merge { container } => container,
            PostProcessing::ExtractAudio { codec, .. } => codec,
        }
    }
}

/// Declarative options for one extraction run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRequest {
    pub target_url: String,
    /// Output path with an `%(ext)s` placeholder, e.g. `downloads/<id>.%(ext)s`.
    pub output_template: String,
    pub format_selector: String,
    pub postprocessing: PostProcessing,
}

impl ExtractionRequest {
    pub fn for_quality(
        target_url: impl Into<String>,
        quality: Quality,
        output_template: impl Into<String>,
    ) -> Self {
        Self {
            target_url: target_url.into(),
            output_template: output_template.into(),
            format_selector: quality.format_selector().to_string(),
            postprocessing: quality.postprocessing(),
        }
    }

    /// Path of the final artifact once post-processing is done.
    pub fn final_output_path(&self) -> String {
        self.output_template
            .replace(EXT_PLACEHOLDER, self.postprocessing.output_extension())
    }
}

/// Incremental status reported while an extraction runs.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// Bytes are arriving. `percent` is `None` when the total size is unknown.
    Downloading {
        percent: Option<f64>,
        speed: String,
        eta: String,
    },
    /// One raw stream is fully retrieved; post-processing may follow.
    Finished,
}

/// Metadata returned by a probe.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    /// Duration in seconds.
    #[serde(default)]
    pub duration: Option<f64>,
}

/// One search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub title: String,
    pub thumbnail: String,
    pub url: String,
}

impl SearchHit {
    /// Build a hit for a YouTube video id.
    pub fn youtube(id: impl Into<String>, title: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            thumbnail: format!("https://i.ytimg.com/vi/{id}/hqdefault.jpg"),
            url: format!("https://www.youtube.com/watch?v={id}"),
            title: title.into(),
            id,
        }
    }
}
