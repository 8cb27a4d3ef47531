// crates/server/src/routes/tasks.rs
//! API routes for job status.
//!
//! - GET /tasks - Snapshot of every job, keyed by id
//! - GET /tasks/stream - SSE stream of job changes

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::get;
use axum::{Json, Router};
use tokio::sync::broadcast::error::RecvError;

use crate::jobs::{JobId, JobRecord};
use crate::state::AppState;

/// GET /api/tasks - Every job submitted since startup.
async fn list_tasks(State(state): State<Arc<AppState>>) -> Json<BTreeMap<JobId, JobRecord>> {
    Json(state.registry.list_all())
}

/// GET /api/tasks/stream - One event per accepted job change.
async fn stream_tasks(
    State(state): State<Arc<AppState>>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let rx = state.registry.subscribe();

    let stream = async_stream::stream! {
        let mut rx = rx;
        loop {
            match rx.recv().await {
                Ok(record) => {
                    let json = serde_json::to_string(&record).unwrap_or_default();
                    yield Ok(Event::default().event(record.status.as_str()).data(json));
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Task stream subscriber lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tasks", get(list_tasks))
        .route("/tasks/stream", get(stream_tasks))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::JobUpdate;
    use crate::test_support::StubExtractor;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use mediadrop_core::Quality;
    use tower::ServiceExt;

    fn app(state: Arc<AppState>) -> Router {
        router().with_state(state)
    }

    async fn get_tasks(state: &Arc<AppState>) -> (StatusCode, serde_json::Value) {
        let response = app(Arc::clone(state))
            .oneshot(Request::builder().uri("/tasks").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_list_tasks_empty() {
        let state = AppState::new(Arc::new(StubExtractor::default()), std::env::temp_dir());
        let (status, json) = get_tasks(&state).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, serde_json::json!({}));
    }

    #[tokio::test]
    async fn test_list_tasks_keyed_by_id() {
        let state = AppState::new(Arc::new(StubExtractor::default()), std::env::temp_dir());
        state.registry.create("a", Quality::Mp3).unwrap();
        state.registry.create("b", Quality::P720).unwrap();
        state
            .registry
            .update("b", JobUpdate::downloading(Some(42.0), "2.0MiB/s", "00:12"));

        let (_, json) = get_tasks(&state).await;
        assert_eq!(json["a"]["status"], "pending");
        assert_eq!(json["a"]["quality"], "mp3");
        assert_eq!(json["b"]["status"], "downloading");
        assert_eq!(json["b"]["progress"], 42.0);
        assert_eq!(json["b"]["speed"], "2.0MiB/s");
    }

    #[tokio::test]
    async fn test_list_tasks_is_idempotent() {
        let state = AppState::new(Arc::new(StubExtractor::default()), std::env::temp_dir());
        state.registry.create("a", Quality::BestMp4).unwrap();
        state.registry.update("a", JobUpdate::failed("ERROR: Unsupported URL"));

        let (_, first) = get_tasks(&state).await;
        let (_, second) = get_tasks(&state).await;
        assert_eq!(first, second);
        assert_eq!(first["a"]["error"], "ERROR: Unsupported URL");
    }
}
