// crates/server/src/main.rs
//! Mediadrop server binary.
//!
//! Prepares the download directory, then serves the API (and the web UI when
//! a static directory is available) until the process is stopped.

use std::sync::Arc;

use anyhow::{Context, Result};
use mediadrop_core::YtDlpExtractor;
use mediadrop_server::{artifacts, create_app_with_static, AppState, ServerConfig};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "warn,mediadrop=info,mediadrop_server=info,mediadrop_core=info";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()))
        .init();

    let config = ServerConfig::from_env()?;

    // Step 1: Download directory, cleared of leftovers from a previous run
    tokio::fs::create_dir_all(&config.download_dir)
        .await
        .with_context(|| format!("creating download directory {}", config.download_dir.display()))?;
    match artifacts::sweep_orphans(&config.download_dir).await {
        Ok(0) => tracing::debug!("No orphaned artifacts"),
        Ok(removed) => tracing::info!(removed, "Removed orphaned artifacts"),
        Err(e) => tracing::warn!(error = %e, "Orphan sweep failed (non-fatal)"),
    }

    // Step 2: Extractor and shared state
    let mut extractor = YtDlpExtractor::new(&config.ytdlp_binary);
    if let Some(ffmpeg) = &config.ffmpeg_location {
        extractor = extractor.with_ffmpeg_location(ffmpeg);
    }
    let state = AppState::new(Arc::new(extractor), config.download_dir.clone());

    if let Some(dir) = &config.static_dir {
        tracing::info!(dir = %dir.display(), "Serving web UI");
    }
    let app = create_app_with_static(state, config.static_dir.clone());

    // Step 3: Bind and serve
    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("binding {}", config.addr))?;
    tracing::info!(
        addr = %config.addr,
        download_dir = %config.download_dir.display(),
        ytdlp = %config.ytdlp_binary.display(),
        "mediadrop v{} listening",
        env!("CARGO_PKG_VERSION")
    );
    axum::serve(listener, app).await?;

    Ok(())
}
