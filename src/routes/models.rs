use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{
        header::{CONTENT_TYPE, HOST},
        HeaderMap,
    },
    response::{IntoResponse, Response},
    Json,
};

use crate::{
    config::ServerConfig,
    error::{AppError, AppResult},
    multipart::{self, Part},
    state::AppState,
    store::{ScanId, MODEL_ARTIFACT},
    types::CreateModelResponse,
};

/// Form field carrying the captures.
pub const IMAGES_FIELD: &str = "images";

/// `POST /api/create-model`: raw multipart body in, scan id and model link out.
pub async fn create_model(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<CreateModelResponse>> {
    let content_type = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()).unwrap_or_default();
    let boundary = multipart::boundary_from_content_type(content_type)
        .ok_or_else(|| AppError::MalformedMultipart("Missing multipart boundary".to_string()))?;

    let images: Vec<Part> = multipart::decode(&body, &boundary)
        .into_iter()
        .filter(|p| p.name == IMAGES_FIELD && !p.content.is_empty())
        .collect();
    if images.is_empty() {
        return Err(AppError::NoImagesProvided);
    }
    tracing::debug!(parts = images.len(), body_bytes = body.len(), "create-model request decoded");

    let scan_id = state.pipeline.create(images).await?;
    let origin = public_origin(&state.config.server, &headers);
    Ok(Json(CreateModelResponse {
        model_url: format!("{}/scans/{}/{}", origin, scan_id, MODEL_ARTIFACT),
        scan_id: scan_id.to_string(),
    }))
}

/// `GET /api/model/{scan_id}`: the best model available for the scan.
pub async fn get_model(State(state): State<AppState>, Path(raw_id): Path<String>) -> AppResult<Response> {
    let id = ScanId::sanitize(&raw_id).ok_or_else(|| AppError::BadRequest("Missing scan id".to_string()))?;
    let model = state.pipeline.resolve_model(&id).await?;
    Ok(([(CONTENT_TYPE, model.content_type)], model.bytes).into_response())
}

fn public_origin(server: &ServerConfig, headers: &HeaderMap) -> String {
    if let Some(url) = server.public_url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
        return url.trim_end_matches('/').to_string();
    }
    let host = headers
        .get(HOST)
        .and_then(|h| h.to_str().ok())
        .filter(|h| !h.is_empty() && !h.contains(|c: char| c == '/' || c == '\\' || c.is_whitespace()));
    match host {
        Some(host) => format!("http://{}", host),
        None => format!("http://{}:{}", server.host, server.port),
    }
}
