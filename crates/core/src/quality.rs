// crates/core/src/quality.rs
//! Quality presets offered to clients and their extraction options.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::extract::PostProcessing;

/// Requested output quality for a download.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quality {
    /// Audio only, transcoded to MP3.
    #[serde(rename = "mp3")]
    Mp3,
    /// Best available video and audio, merged into MP4.
    #[default]
    #[serde(rename = "best_mp4")]
    BestMp4,
    #[serde(rename = "1080p")]
    P1080,
    #[serde(rename = "720p")]
    P720,
}

/// A quality string that is not one of the supported presets.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown quality '{0}' (expected one of: mp3, best_mp4, 1080p, 720p)")]
pub struct UnknownQuality(pub String);

impl Quality {
    pub const ALL: [Quality; 4] = [Quality::Mp3, Quality::BestMp4, Quality::P1080, Quality::P720];

    pub fn as_str(&self) -> &'static str {
        match self {
            Quality::Mp3 => "mp3",
            Quality::BestMp4 => "best_mp4",
            Quality::P1080 => "1080p",
            Quality::P720 => "720p",
        }
    }

    /// Human-readable label shown in format pickers.
    pub fn label(&self) -> &'static str {
        match self {
            Quality::Mp3 => "Audio Only (MP3)",
            Quality::BestMp4 => "Best Quality (MP4)",
            Quality::P1080 => "1080p (MP4)",
            Quality::P720 => "720p (MP4)",
        }
    }

    pub fn is_audio(&self) -> bool {
        matches!(self, Quality::Mp3)
    }

    /// File extension of the finished artifact.
    pub fn extension(&self) -> &'static str {
        if self.is_audio() {
            "mp3"
        } else {
            "mp4"
        }
    }

    pub fn content_type(&self) -> &'static str {
        if self.is_audio() {
            "audio/mpeg"
        } else {
            "video/mp4"
        }
    }

    /// `yt-dlp` format selector for this preset.
    pub fn format_selector(&self) -> &'static str {
        match self {
            Quality::Mp3 => "bestaudio[ext=m4a]/bestaudio",
            Quality::BestMp4 => "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best",
            Quality::P1080 => "bestvideo[ext=mp4][height<=1080]+bestaudio[ext=m4a]/best",
            Quality::P720 => "bestvideo[ext=mp4][height<=720]+bestaudio[ext=m4a]/best",
        }
    }

    pub fn postprocessing(&self) -> PostProcessing {
        if self.is_audio() {
            PostProcessing::ExtractAudio {
                codec: "mp3".to_string(),
                quality_kbps: 192,
            }
        } else {
            PostProcessing::Merge {
                container: "mp4".to_string(),
            }
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Quality {
    type Err = UnknownQuality;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Quality::ALL
            .into_iter()
            .find(|q| q.as_str() == s.trim())
            .ok_or_else(|| UnknownQuality(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_all_presets() {
        assert_eq!("mp3".parse::<Quality>().unwrap(), Quality::Mp3);
        assert_eq!("best_mp4".parse::<Quality>().unwrap(), Quality::BestMp4);
        assert_eq!("1080p".parse::<Quality>().unwrap(), Quality::P1080);
        assert_eq!("720p".parse::<Quality>().unwrap(), Quality::P720);
    }

    #[test]
    fn test_parse_unknown_quality() {
        let err = "480p".parse::<Quality>().unwrap_err();
        assert_eq!(err, UnknownQuality("480p".to_string()));
        assert!(err.to_string().contains("480p"));
    }

    #[test]
    fn test_default_is_best_mp4() {
        assert_eq!(Quality::default(), Quality::BestMp4);
    }

    #[test]
    fn test_extension_follows_audio_flag() {
        assert_eq!(Quality::Mp3.extension(), "mp3");
        for q in [Quality::BestMp4, Quality::P1080, Quality::P720] {
            assert_eq!(q.extension(), "mp4", "{q} should produce mp4");
            assert_eq!(q.content_type(), "video/mp4");
        }
        assert_eq!(Quality::Mp3.content_type(), "audio/mpeg");
    }

    #[test]
    fn test_height_caps_in_format_selector() {
        assert!(Quality::P1080.format_selector().contains("height<=1080"));
        assert!(Quality::P720.format_selector().contains("height<=720"));
        assert!(!Quality::BestMp4.format_selector().contains("height"));
    }

    #[test]
    fn test_postprocessing() {
        assert_eq!(
            Quality::Mp3.postprocessing(),
            PostProcessing::ExtractAudio {
                codec: "mp3".to_string(),
                quality_kbps: 192
            }
        );
        assert_eq!(
            Quality::P720.postprocessing(),
            PostProcessing::Merge {
                container: "mp4".to_string()
            }
        );
    }

    #[test]
    fn test_serde_uses_wire_names() {
        let json = serde_json::to_string(&Quality::P1080).unwrap();
        assert_eq!(json, "\"1080p\"");
        let q: Quality = serde_json::from_str("\"best_mp4\"").unwrap();
        assert_eq!(q, Quality::BestMp4);
    }
}
