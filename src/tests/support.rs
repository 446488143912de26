//! Helpers shared by the test modules.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use http_body_util::BodyExt;

use crate::config::{AppConfig, ReconstructionConfig};
use crate::reconstruction::{ReconstructionClient, Sleeper};
use crate::state::AppState;
use crate::store::{ScanId, ScanIdGenerator, ScanStore};

pub const BOUNDARY: &str = "----snap3dBoundary7MA4YWxk";
pub const API_KEY: &str = "test-key";
pub const TASK_PATH: &str = "/v2/openapi/task";

/// Sleeper that returns immediately and counts its calls.
#[derive(Default)]
pub struct NoDelay {
    pub calls: AtomicUsize,
}

#[async_trait]
impl Sleeper for NoDelay {
    async fn sleep(&self, _duration: Duration) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

/// Yields `scan-test-1`, `scan-test-2`, ...
#[derive(Default)]
pub struct SequentialIds {
    next: AtomicUsize,
}

impl ScanIdGenerator for SequentialIds {
    fn next_id(&self) -> ScanId {
        let n = self.next.fetch_add(1, Ordering::SeqCst) + 1;
        ScanId::parse(&format!("scan-test-{}", n)).unwrap()
    }
}

pub fn sequential_store(root: &std::path::Path) -> ScanStore {
    ScanStore::with_id_generator(root, Arc::new(SequentialIds::default()))
}

/// A multipart body with one part per `(name, filename, content)`.
pub fn multipart_body(boundary: &str, parts: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, filename, content) in parts {
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        let disposition = match filename {
            Some(f) => format!("Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n", name, f),
            None => format!("Content-Disposition: form-data; name=\"{}\"\r\n", name),
        };
        body.extend_from_slice(disposition.as_bytes());
        if filename.is_some() {
            body.extend_from_slice(b"Content-Type: image/jpeg\r\n");
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());
    body
}

/// Fake JPEG payload: SOI marker, some bytes that are not valid UTF-8, EOI.
pub fn fake_jpeg(seed: u8) -> Vec<u8> {
    let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE0, seed, 0x00, 0xC3, 0x28, b'\r', b'\n', b'-', b'-'];
    bytes.extend((0..64u8).map(|i| i.wrapping_mul(seed).wrapping_add(7)));
    bytes.extend_from_slice(&[0xFF, 0xD9]);
    bytes
}

/// Default config rooted in `dir`, reconstruction disabled.
pub fn test_config(dir: &std::path::Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.storage.scans_dir = dir.join("scans").display().to_string();
    config.server.static_dir = dir.join("public").display().to_string();
    config.server.public_url = None;
    config.reconstruction.api_key = None;
    config.reconstruction.public_base_url = None;
    config
}

/// Reconstruction settings pointing at a mock server.
pub fn reconstruction_config(task_url: String) -> ReconstructionConfig {
    ReconstructionConfig {
        api_key: Some(API_KEY.to_string()),
        task_url,
        poll_interval_ms: 1,
        max_poll_attempts: 3,
        request_timeout_secs: 5,
        ..ReconstructionConfig::default()
    }
}

pub fn test_client(config: &ReconstructionConfig, sleeper: Arc<NoDelay>) -> ReconstructionClient {
    ReconstructionClient::from_config(config)
        .unwrap()
        .expect("api key configured")
        .with_sleeper(sleeper)
}

pub fn test_state(config: AppConfig, reconstruction: Option<ReconstructionClient>) -> AppState {
    let store = sequential_store(std::path::Path::new(&config.storage.scans_dir));
    AppState::with_parts(config, store, reconstruction)
}

pub fn create_model_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/create-model")
        .header("host", "localhost:3000")
        .header("content-type", format!("multipart/form-data; boundary={}", BOUNDARY))
        .body(Body::from(body))
        .unwrap()
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
