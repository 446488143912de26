use axum::{
    extract::{Path, State},
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Response},
};

use crate::{
    error::{AppError, AppResult},
    state::AppState,
    store::ScanId,
};

/// `GET /scans/{scan_id}/{*artifact}`: raw artifact bytes.
///
/// Every failure to resolve, including traversal attempts, is a plain 404.
pub async fn get_artifact(
    State(state): State<AppState>,
    Path((raw_id, artifact)): Path<(String, String)>,
) -> AppResult<Response> {
    let id = ScanId::parse(&raw_id).ok_or_else(|| AppError::NotFound("Not found".to_string()))?;
    let bytes = state.store.read_artifact(&id, &artifact).await.map_err(|e| {
        tracing::debug!(scan_id = %id, %artifact, error = %e, "artifact lookup failed");
        AppError::from(e)
    })?;
    Ok(([(CONTENT_TYPE, content_type_for(&artifact))], bytes).into_response())
}

pub fn content_type_for(artifact: &str) -> &'static str {
    let ext = artifact.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase()).unwrap_or_default();
    match ext.as_str() {
        "gltf" => "model/gltf+json",
        "glb" => "model/gltf-binary",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "json" => "application/json",
        _ => "application/octet-stream",
    }
}
