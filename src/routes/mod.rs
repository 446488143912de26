//! HTTP route handlers.
//!
//! - `health`: liveness, version and metrics
//! - `models`: scan creation and model retrieval
//! - `scans`: raw artifact retrieval

pub mod health;
pub mod models;
pub mod scans;

use axum::extract::DefaultBodyLimit;
use axum::http::{header::CONTENT_TYPE, Method};
use axum::middleware::from_fn;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::middleware::response_headers_middleware;
use crate::state::AppState;

/// The complete application router, shared by the binary and the tests.
pub fn build_router(state: AppState) -> Router {
    let static_ui_service =
        ServeDir::new(&state.config.server.static_dir).append_index_html_on_directories(true);
    let max_body_bytes = state.config.server.max_body_bytes;
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]);

    Router::new()
        .route("/healthz", get(health::healthz))
        .route("/version", get(health::version))
        .route("/metrics", get(health::metrics))
        .route("/metrics/prometheus", get(health::metrics_prometheus))
        .route("/api/create-model", post(models::create_model))
        .route("/api/model/{scan_id}", get(models::get_model))
        .route("/scans/{scan_id}/{*artifact}", get(scans::get_artifact))
        .fallback_service(static_ui_service)
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(from_fn(response_headers_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
