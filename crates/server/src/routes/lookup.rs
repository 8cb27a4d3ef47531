// crates/server/src/routes/lookup.rs
//! Synchronous lookups that call the extractor directly.
//!
//! - POST /info - Title, thumbnail and duration for a URL, plus the offered qualities
//! - POST /search - Keyword search

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use mediadrop_core::{Quality, SearchHit};
use serde::{Deserialize, Serialize};

use super::download::validate_url;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Results returned by one search.
const SEARCH_LIMIT: usize = 10;

#[derive(Debug, Deserialize)]
pub struct InfoRequest {
    pub url: Option<String>,
}

/// A quality preset as offered to the client.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(test, derive(Deserialize, PartialEq))]
pub struct FormatOption {
    pub id: String,
    pub label: String,
}

impl From<Quality> for FormatOption {
    fn from(quality: Quality) -> Self {
        Self {
            id: quality.as_str().to_string(),
            label: quality.label().to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(Deserialize))]
pub struct InfoResponse {
    pub title: Option<String>,
    pub thumbnail: Option<String>,
    pub duration: Option<f64>,
    pub formats: Vec<FormatOption>,
    pub original_url: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: Option<String>,
}

#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(Deserialize))]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub results: Vec<SearchHit>,
    /// Always null; search is single-page.
    pub next_page_token: Option<String>,
}

/// POST /api/info - Probe a URL without downloading it.
async fn info(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<InfoRequest>, JsonRejection>,
) -> ApiResult<Json<InfoResponse>> {
    let Json(req) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let url = validate_url(req.url.as_deref())?;

    let media = state.extractor.probe(&url).await?;
    Ok(Json(InfoResponse {
        title: media.title,
        thumbnail: media.thumbnail,
        duration: media.duration,
        formats: Quality::ALL.into_iter().map(FormatOption::from).collect(),
        original_url: url,
    }))
}

/// POST /api/search - First page of results for a keyword query.
async fn search(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> ApiResult<Json<SearchResponse>> {
    let Json(req) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let query = req.query.as_deref().map(str::trim).unwrap_or_default();
    if query.is_empty() {
        return Err(ApiError::BadRequest("No query provided".to_string()));
    }

    let results = state.extractor.search(query, SEARCH_LIMIT).await?;
    tracing::debug!(query = %query, hits = results.len(), "Search complete");
    Ok(Json(SearchResponse {
        results,
        next_page_token: None,
    }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/info", post(info))
        .route("/search", post(search))
}
