//! Shared fixtures for end-to-end tests.
//!
//! `FakeExtractor` behaves like the real tool from the server's point of
//! view: it reports progress, then leaves the final artifact at the path the
//! request asks for. URLs containing `/fail` end in a tool failure.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use mediadrop_core::{ExtractionError, ExtractionRequest, Extractor, MediaInfo, ProgressEvent, SearchHit};
use mediadrop_server::{create_app, AppState};
use tokio::sync::mpsc;
use tower::ServiceExt;

pub struct FakeExtractor {
    /// Pause between progress events.
    pub step: Duration,
}

impl FakeExtractor {
    pub fn new() -> Self {
        Self {
            step: Duration::from_millis(2),
        }
    }

    /// Bytes written for `url`, so tests can tell artifacts apart.
    pub fn payload_for(url: &str) -> Vec<u8> {
        format!("payload:{url}").into_bytes()
    }

    /// Speed reported for `url`, distinct per URL.
    pub fn speed_for(url: &str) -> String {
        format!("speed:{url}")
    }

    pub fn eta_for(url: &str) -> String {
        format!("eta:{url}")
    }
}

#[async_trait]
impl Extractor for FakeExtractor {
    async fn download(
        &self,
        request: ExtractionRequest,
        progress: mpsc::Sender<ProgressEvent>,
    ) -> Result<(), ExtractionError> {
        for percent in [10.0, 45.0, 90.0] {
            let _ = progress
                .send(ProgressEvent::Downloading {
                    percent: Some(percent),
                    speed: Self::speed_for(&request.target_url),
                    eta: Self::eta_for(&request.target_url),
                })
                .await;
            tokio::time::sleep(self.step).await;
            if request.target_url.contains("/fail") && percent > 40.0 {
                return Err(ExtractionError::tool_failed(Some(1), "ERROR: Unable to download webpage"));
            }
        }
        let _ = progress.send(ProgressEvent::Finished).await;
        tokio::time::sleep(self.step).await;

        tokio::fs::write(request.final_output_path(), Self::payload_for(&request.target_url)).await?;
        Ok(())
    }

    async fn probe(&self, url: &str) -> Result<MediaInfo, ExtractionError> {
        Ok(MediaInfo {
            title: Some(format!("Title of {url}")),
            thumbnail: None,
            duration: Some(12.0),
        })
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, ExtractionError> {
        Ok((0..limit.min(3))
            .map(|i| SearchHit::youtube(format!("id{i}"), format!("{query} #{i}")))
            .collect())
    }

    fn name(&self) -> &str {
        "fake"
    }
}

/// A running app over a temporary download directory.
pub struct TestServer {
    pub dir: tempfile::TempDir,
    pub state: Arc<AppState>,
    pub app: Router,
}

impl TestServer {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::new(Arc::new(FakeExtractor::new()), dir.path());
        let app = create_app(Arc::clone(&state));
        Self { dir, state, app }
    }

    pub async fn request(&self, request: Request<Body>) -> Response<Body> {
        self.app.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.request(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post_json(&self, uri: &str, body: &str) -> Response<Body> {
        self.request(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    /// Submit a download and return its task id.
    pub async fn submit(&self, url: &str, quality: Option<&str>) -> String {
        submit_on(self.app.clone(), url, quality).await
    }

    pub async fn tasks(&self) -> serde_json::Value {
        let response = self.get("/api/tasks").await;
        assert_eq!(response.status(), StatusCode::OK);
        body_json(response).await
    }

    /// Poll `/api/tasks` until the job is finished or failed.
    pub async fn wait_terminal(&self, id: &str) -> serde_json::Value {
        for _ in 0..500 {
            let tasks = self.tasks().await;
            let status = tasks[id]["status"].as_str().unwrap_or_default().to_string();
            if status == "finished" || status == "error" {
                return tasks[id].clone();
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("task {id} never reached a terminal state");
    }
}

/// `POST /api/download` against `app`; asserts success and returns the task id.
pub async fn submit_on(app: Router, url: &str, quality: Option<&str>) -> String {
    let body = match quality {
        Some(q) => serde_json::json!({ "url": url, "quality": q }),
        None => serde_json::json!({ "url": url }),
    };
    let request = Request::builder()
        .method("POST")
        .uri("/api/download")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["task_id"].as_str().unwrap().to_string()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
