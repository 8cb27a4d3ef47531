//! API route handlers for the mediadrop server.

pub mod download;
pub mod files;
pub mod health;
pub mod lookup;
pub mod tasks;

use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

/// Create the combined API router with all routes under /api prefix.
///
/// Routes:
/// - GET  /api/health - Health check
/// - POST /api/download - Submit a download job
/// - GET  /api/tasks - Snapshot of every job
/// - GET  /api/tasks/stream - SSE stream of job changes
/// - GET  /api/get_file/{task_id} - One-shot delivery of a finished artifact
/// - POST /api/info - Probe a URL for title, thumbnail and duration
/// - POST /api/search - Keyword search
pub fn api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", health::router())
        .nest("/api", download::router())
        .nest("/api", tasks::router())
        .nest("/api", files::router())
        .nest("/api", lookup::router())
        .with_state(state)
}
