// crates/server/src/lib.rs
//! Mediadrop server library.
//!
//! Axum HTTP service that accepts media URLs, downloads them in the background
//! through an `Extractor`, reports per-job progress and hands each finished
//! file out exactly once.

pub mod artifacts;
pub mod config;
pub mod delivery;
pub mod error;
pub mod jobs;
pub mod routes;
pub mod state;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::ServerConfig;
pub use error::*;
pub use routes::api_routes;
pub use state::AppState;

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

/// Create the Axum application with all routes and middleware (API only).
pub fn create_app(state: Arc<AppState>) -> Router {
    create_app_with_static(state, None)
}

/// Create the app, serving the web UI from `static_dir` when given.
///
/// Unknown non-API paths fall back to `index.html` so client-side routing
/// works. CORS allows any origin, method and header.
pub fn create_app_with_static(state: Arc<AppState>, static_dir: Option<PathBuf>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut app = Router::new().merge(api_routes(state));
    if let Some(dir) = static_dir {
        let index = dir.join("index.html");
        app = app.fallback_service(ServeDir::new(dir).fallback(ServeFile::new(index)));
    }

    app.layer(cors).layer(TraceLayer::new_for_http())
}

// ============================================================================
// Integration Tests
// ============================================================================
