// crates/core/src/error.rs
use thiserror::Error;

/// Errors raised while driving the extraction tool.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Failed to spawn {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error reading extractor output: {0}")]
    Io(#[from] std::io::Error),

    #[error("Extractor exited with {}: {message}", exit_label(.code))]
    ToolFailed { code: Option<i32>, message: String },

    #[error("Failed to parse extractor output: {0}")]
    Parse(String),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "signal".to_string(),
    }
}

impl ExtractionError {
    pub fn tool_failed(code: Option<i32>, message: impl Into<String>) -> Self {
        Self::ToolFailed {
            code,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_failed_display_with_code() {
        let err = ExtractionError::tool_failed(Some(1), "ERROR: Unsupported URL");
        assert_eq!(
            err.to_string(),
            "Extractor exited with status 1: ERROR: Unsupported URL"
        );
    }

    #[test]
    fn test_tool_failed_display_killed_by_signal() {
        let err = ExtractionError::tool_failed(None, "terminated");
        assert_eq!(err.to_string(), "Extractor exited with signal: terminated");
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let err: ExtractionError = io.into();
        assert!(matches!(err, ExtractionError::Io(_)));
    }
}
