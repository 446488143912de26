use crate::state::AppState;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};

// Health check endpoint - lightweight
pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

// Metrics endpoint: returns JSON snapshot
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.metrics.get_snapshot())
}

// Prometheus-compatible text exposition format
pub async fn metrics_prometheus(State(state): State<AppState>) -> impl IntoResponse {
    let m = state.metrics.get_snapshot();
    let counters: [(&str, &str, u64); 7] = [
        ("scans_created", "Scans created", m.scans_created as u64),
        ("images_received", "Capture images stored", m.images_received),
        ("bytes_received", "Capture bytes stored", m.bytes_received),
        ("reconstructions_attempted", "Reconstruction cascades started", m.reconstructions_attempted as u64),
        ("reconstructions_succeeded", "Reconstructions stored", m.reconstructions_succeeded as u64),
        ("reconstructions_failed", "Reconstruction cascades that fell back to the quad", m.reconstructions_failed as u64),
        ("fallback_models_served", "Embedded quad documents served", m.fallback_models_served as u64),
    ];

    let mut body = String::new();
    for (name, help, value) in counters {
        body.push_str(&format!(
            "# HELP snap3d_{name} {help}\n# TYPE snap3d_{name} counter\nsnap3d_{name} {value}\n"
        ));
    }
    body.push_str(&format!(
        "# HELP snap3d_uptime_seconds Uptime seconds\n# TYPE snap3d_uptime_seconds gauge\nsnap3d_uptime_seconds {}\n",
        m.uptime_seconds
    ));
    ([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body)
}

// Version/Build info endpoint (JSON)
pub async fn version(State(state): State<AppState>) -> impl IntoResponse {
    let body = serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "package": {
            "description": env!("CARGO_PKG_DESCRIPTION"),
            "authors": env!("CARGO_PKG_AUTHORS"),
            "license": env!("CARGO_PKG_LICENSE"),
        },
        "build": {
            "profile": if cfg!(debug_assertions) { "debug" } else { "release" },
            "os": std::env::consts::OS,
            "arch": std::env::consts::ARCH,
        },
        "reconstruction": {
            "enabled": state.config.reconstruction.enabled(),
            "multiview": state.config.reconstruction.public_base_url().is_some(),
        }
    });
    (StatusCode::OK, Json(body))
}
