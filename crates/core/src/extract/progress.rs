// crates/core/src/extract/progress.rs
//! Parsing of `yt-dlp` progress lines.
//!
//! The tool is started with `--progress-template` set to [`PROGRESS_TEMPLATE`],
//! so every progress report arrives on stdout as one line:
//!
//! ```text
//! mediadrop|downloading| 42.3%|  1.20MiB/s|00:12
//! ```

use super::types::ProgressEvent;

/// Marker at the start of every progress line.
pub const PROGRESS_PREFIX: &str = "mediadrop|";

/// Value passed to `--progress-template`.
pub const PROGRESS_TEMPLATE: &str = "download:mediadrop|%(progress.status)s|%(progress._percent_str)s|%(progress._speed_str)s|%(progress._eta_str)s";

/// Shown when the tool cannot estimate speed or ETA.
pub const UNKNOWN: &str = "N/A";

/// Parse one stdout line into a progress event.
///
/// Returns `None` for anything that is not a progress line, and for progress
/// statuses other than `downloading` / `finished` (e.g. `error`, which the
/// exit status reports anyway).
pub fn parse_progress_line(line: &str) -> Option<ProgressEvent> {
    let rest = line.trim().strip_prefix(PROGRESS_PREFIX)?;
    let mut fields = rest.split('|').map(str::trim);

    let status = fields.next()?;
    let percent = fields.next().and_then(parse_percent);
    let speed = normalize(fields.next());
    let eta = normalize(fields.next());

    match status {
        "downloading" => Some(ProgressEvent::Downloading {
            percent,
            speed,
            eta,
        }),
        "finished" => Some(ProgressEvent::Finished),
        _ => None,
    }
}

fn parse_percent(raw: &str) -> Option<f64> {
    let value: f64 = raw.trim_end_matches('%').trim().parse().ok()?;
    value.is_finite().then(|| value.clamp(0.0, 100.0))
}

fn normalize(field: Option<&str>) -> String {
    match field {
        Some(value) if !value.is_empty() && value != "NA" => value.to_string(),
        _ => UNKNOWN.to_string(),
    }
}
