use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::error::Error;
use std::fmt;

use crate::store::StoreError;

/// The primary error type for the HTTP surface.
///
/// Only failures a client can act on end up here. Reconstruction errors are
/// deliberately absent: the pipeline swallows them and serves the fallback quad.
#[derive(Debug)]
pub enum AppError {
    /// For internal server errors that are not expected to be handled by the client.
    Internal(anyhow::Error),
    /// The request carried no usable multipart boundary.
    MalformedMultipart(String),
    /// The multipart body decoded, but held no non-empty `images` part.
    NoImagesProvided,
    /// For client errors due to invalid requests.
    BadRequest(String),
    /// The scan has no captures at all.
    ScanNotFound(String),
    /// For when a requested resource is not found.
    NotFound(String),
    /// For errors related to I/O operations.
    IoError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Internal(e) => write!(f, "Internal error: {}", e),
            AppError::MalformedMultipart(msg) => write!(f, "Malformed multipart: {}", msg),
            AppError::NoImagesProvided => write!(f, "No images provided"),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::ScanNotFound(id) => write!(f, "Scan not found: {}", id),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AppError::Internal(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MalformedMultipart(_) | AppError::NoImagesProvided | AppError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::ScanNotFound(_) | AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) | AppError::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error_code, error_message, details) = match self {
            AppError::Internal(e) => {
                let error_id = uuid::Uuid::new_v4();
                tracing::error!(%error_id, "Internal error: {:?}", e);
                (
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                    Some(json!({ "error_id": error_id.to_string() })),
                )
            }
            AppError::MalformedMultipart(msg) => ("MALFORMED_MULTIPART", msg, None),
            AppError::NoImagesProvided => ("NO_IMAGES_PROVIDED", "No images provided".to_string(), None),
            AppError::BadRequest(msg) => ("BAD_REQUEST", msg, None),
            AppError::ScanNotFound(id) => {
                ("SCAN_NOT_FOUND", "Scan not found".to_string(), Some(json!({ "scan_id": id })))
            }
            AppError::NotFound(msg) => ("NOT_FOUND", msg, None),
            AppError::IoError(msg) => {
                tracing::error!("I/O error: {}", msg);
                ("IO_ERROR", "An I/O error occurred".to_string(), None)
            }
        };

        let mut body = json!({
            "error": error_message,
            "code": error_code,
            "status": status.as_u16(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });

        if let Some(details) = details {
            body["details"] = details;
        }

        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(format!("{}: {}", err.kind(), err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(err.into())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            // Traversal attempts look exactly like a missing file to the client.
            StoreError::NotFound { .. } | StoreError::PathTraversal { .. } => {
                AppError::NotFound("Not found".to_string())
            }
            StoreError::Io(e) => e.into(),
        }
    }
}

/// A type alias for `Result<T, AppError>`, used throughout the application.
pub type AppResult<T> = Result<T, AppError>;
