// crates/server/src/routes/files.rs
//! GET /get_file/{task_id} - one-shot artifact delivery.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, HeaderName};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;

use crate::delivery::ArtifactInfo;
use crate::error::ApiResult;
use crate::state::AppState;

fn attachment_headers(info: &ArtifactInfo) -> [(HeaderName, String); 3] {
    [
        (header::CONTENT_TYPE, info.content_type().to_string()),
        (header::CONTENT_LENGTH, info.len.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", info.download_name()),
        ),
    ]
}

/// GET /api/get_file/{task_id} - Stream a finished artifact as an attachment.
///
/// The file is removed from disk once the body has been sent (or the client
/// goes away), so a second request for the same task gets 404.
async fn get_file(State(state): State<Arc<AppState>>, Path(task_id): Path<String>) -> ApiResult<Response> {
    let artifact = state.delivery.open(&task_id).await?;
    tracing::info!(task_id = %task_id, bytes = artifact.info().len, "Delivering artifact");

    let headers = attachment_headers(artifact.info());
    Ok((headers, Body::from_stream(artifact.into_stream())).into_response())
}

/// HEAD /api/get_file/{task_id} - Same checks and headers as GET, no body.
/// Does not count as a delivery.
async fn head_file(State(state): State<Arc<AppState>>, Path(task_id): Path<String>) -> ApiResult<Response> {
    let info = state.delivery.inspect(&task_id).await?;
    tracing::debug!(task_id = %task_id, bytes = info.len, "Artifact inspected");
    Ok((attachment_headers(&info), Body::empty()).into_response())
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/get_file/{task_id}", get(get_file).head(head_file))
}
