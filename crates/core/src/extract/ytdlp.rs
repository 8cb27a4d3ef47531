// crates/core/src/extract/ytdlp.rs
//! `yt-dlp` extractor - spawns the binary and parses its output.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;

use super::progress::{parse_progress_line, PROGRESS_TEMPLATE};
use super::provider::Extractor;
use super::types::{ExtractionRequest, MediaInfo, PostProcessing, ProgressEvent, SearchHit};
use crate::error::ExtractionError;

/// Extractor backed by the `yt-dlp` command-line tool.
pub struct YtDlpExtractor {
    binary: PathBuf,
    ffmpeg_location: Option<PathBuf>,
}

impl YtDlpExtractor {
    /// Create an extractor that runs `binary` (a path or a name on `PATH`).
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            ffmpeg_location: None,
        }
    }

    /// Directory (or binary) passed as `--ffmpeg-location`.
    pub fn with_ffmpeg_location(mut self, location: impl Into<PathBuf>) -> Self {
        self.ffmpeg_location = Some(location.into());
        self
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Command-line arguments for a download run.
    pub fn download_args(&self, request: &ExtractionRequest) -> Vec<String> {
        let mut args: Vec<String> = [
            "--newline",
            "--no-playlist",
            "--no-colors",
            "--no-warnings",
            "--no-check-certificates",
            "--progress-template",
            PROGRESS_TEMPLATE,
            "-f",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        args.push(request.format_selector.clone());

        match &request.postprocessing {
            PostProcessing::Merge { container } => {
                args.push("--merge-output-format".to_string());
                args.push(container.clone());
            }
            PostProcessing::ExtractAudio {
                codec,
                quality_kbps,
            } => {
                args.push("-x".to_string());
                args.push("--audio-format".to_string());
                args.push(codec.clone());
                args.push("--audio-quality".to_string());
                args.push(format!("{quality_kbps}K"));
            }
        }

        if let Some(location) = &self.ffmpeg_location {
            args.push("--ffmpeg-location".to_string());
            args.push(location.to_string_lossy().into_owned());
        }

        args.push("-o".to_string());
        args.push(request.output_template.clone());
        // Terminate option parsing so a URL can never be read as a flag.
        args.push("--".to_string());
        args.push(request.target_url.clone());
        args
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.stdin(Stdio::null()).kill_on_drop(true);
        cmd
    }

    fn spawn_error(&self, source: std::io::Error) -> ExtractionError {
        tracing::error!(binary = %self.binary.display(), error = %source, "yt-dlp: failed to spawn");
        ExtractionError::Spawn {
            binary: self.binary.display().to_string(),
            source,
        }
    }

    /// Run the tool to completion and return its stdout.
    async fn run_json(&self, args: &[String]) -> Result<Vec<u8>, ExtractionError> {
        let t0 = std::time::Instant::now();
        let output = self
            .command()
            .args(args)
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;
        let elapsed_ms = t0.elapsed().as_millis() as u64;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = last_meaningful_line(&stderr).unwrap_or("no error output");
            tracing::warn!(elapsed_ms, exit_code = ?output.status.code(), stderr = %message, "yt-dlp: non-zero exit");
            return Err(ExtractionError::tool_failed(output.status.code(), message));
        }

        tracing::debug!(elapsed_ms, stdout_len = output.stdout.len(), "yt-dlp: metadata received");
        Ok(output.stdout)
    }
}

#[async_trait]
impl Extractor for YtDlpExtractor {
    async fn download(
        &self,
        request: ExtractionRequest,
        progress: mpsc::Sender<ProgressEvent>,
    ) -> Result<(), ExtractionError> {
        let args = self.download_args(&request);
        tracing::info!(
            binary = %self.binary.display(),
            url = %request.target_url,
            format = %request.format_selector,
            "yt-dlp: spawning download"
        );

        let mut child = self
            .command()
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let stdout = child.stdout.take().ok_or_else(|| {
            ExtractionError::Io(std::io::Error::other("failed to capture stdout"))
        })?;
        let stderr = child.stderr.take().ok_or_else(|| {
            ExtractionError::Io(std::io::Error::other("failed to capture stderr"))
        })?;

        // Drain stderr concurrently so the child never blocks on a full pipe.
        let stderr_task = tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            let mut last: Option<String> = None;
            while let Ok(Some(line)) = lines.next_line().await {
                tracing::debug!(line = %line, "yt-dlp stderr");
                if let Some(meaningful) = last_meaningful_line(&line) {
                    last = Some(meaningful.to_string());
                }
            }
            last
        });

        let mut lines = BufReader::new(stdout).lines();
        let mut listening = true;
        while let Some(line) = lines.next_line().await? {
            match parse_progress_line(&line) {
                Some(event) if listening => {
                    if progress.send(event).await.is_err() {
                        listening = false;
                    }
                }
                Some(_) => {}
                None => tracing::trace!(line = %line, "yt-dlp stdout"),
            }
        }

        let status = child.wait().await?;
        let stderr_tail = stderr_task.await.ok().flatten();

        if status.success() {
            Ok(())
        } else {
            let message = stderr_tail.unwrap_or_else(|| "no error output".to_string());
            Err(ExtractionError::tool_failed(status.code(), message))
        }
    }

    async fn probe(&self, url: &str) -> Result<MediaInfo, ExtractionError> {
        let args: Vec<String> = ["-J", "--no-playlist", "--no-warnings", "--", url]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let stdout = self.run_json(&args).await?;
        parse_media_info(&stdout)
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, ExtractionError> {
        let args: Vec<String> = vec![
            "-J".to_string(),
            "--flat-playlist".to_string(),
            "--no-warnings".to_string(),
            "--".to_string(),
            format!("ytsearch{limit}:{query}"),
        ];
        let stdout = self.run_json(&args).await?;
        parse_search_results(&stdout, limit)
    }

    fn name(&self) -> &str {
        "yt-dlp"
    }
}

/// Parse the JSON document printed by `yt-dlp -J <url>`.
pub fn parse_media_info(stdout: &[u8]) -> Result<MediaInfo, ExtractionError> {
    serde_json::from_slice(stdout).map_err(|e| ExtractionError::Parse(e.to_string()))
}

#[derive(Deserialize)]
struct FlatPlaylist {
    #[serde(default)]
    entries: Vec<FlatEntry>,
}

#[derive(Deserialize)]
struct FlatEntry {
    id: Option<String>,
    title: Option<String>,
}

/// Parse the flat playlist printed by `yt-dlp -J --flat-playlist ytsearchN:…`.
///
/// Entries without an id are skipped.
pub fn parse_search_results(stdout: &[u8], limit: usize) -> Result<Vec<SearchHit>, ExtractionError> {
    let playlist: FlatPlaylist =
        serde_json::from_slice(stdout).map_err(|e| ExtractionError::Parse(e.to_string()))?;
    Ok(playlist
        .entries
        .into_iter()
        .filter_map(|entry| {
            let id = entry.id?;
            Some(SearchHit::youtube(id, entry.title.unwrap_or_default()))
        })
        .take(limit)
        .collect())
}

fn last_meaningful_line(text: &str) -> Option<&str> {
    text.lines().map(str::trim).filter(|l| !l.is_empty()).last()
}
