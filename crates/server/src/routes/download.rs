// crates/server/src/routes/download.rs
//! POST /download - submit a new download job.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use mediadrop_core::Quality;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Body of `POST /api/download`. Both fields are optional at the wire level so
/// that a missing URL is reported as a 400 with a readable message.
#[derive(Debug, Deserialize)]
pub struct DownloadRequest {
    pub url: Option<String>,
    pub quality: Option<String>,
}

#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(Deserialize))]
pub struct DownloadResponse {
    pub task_id: String,
}

/// Trim `raw` and require an absolute http(s) URL.
pub fn validate_url(raw: Option<&str>) -> Result<String, ApiError> {
    let url = raw.map(str::trim).unwrap_or_default();
    if url.is_empty() {
        return Err(ApiError::BadRequest("No URL provided".to_string()));
    }
    let parsed = url::Url::parse(url).map_err(|e| ApiError::BadRequest(format!("Invalid URL: {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ApiError::BadRequest(format!(
            "Unsupported URL scheme '{}'",
            parsed.scheme()
        )));
    }
    Ok(url.to_string())
}

/// Missing or blank quality means `best_mp4`.
fn parse_quality(raw: Option<&str>) -> Result<Quality, ApiError> {
    match raw.map(str::trim).filter(|q| !q.is_empty()) {
        None => Ok(Quality::default()),
        Some(q) => q.parse::<Quality>().map_err(|e| ApiError::BadRequest(e.to_string())),
    }
}

/// POST /api/download - Register a job and start it in the background.
///
/// Returns as soon as the job exists; progress is read from `/api/tasks`.
async fn submit_download(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<DownloadRequest>, JsonRejection>,
) -> ApiResult<Json<DownloadResponse>> {
    let Json(req) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let url = validate_url(req.url.as_deref())?;
    let quality = parse_quality(req.quality.as_deref())?;

    let record = state.runner.submit(url, quality)?;
    Ok(Json(DownloadResponse { task_id: record.id }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/download", post(submit_download))
}
