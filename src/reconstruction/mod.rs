//! Client for the optional remote image-to-3D job service.
//!
//! A job is created with one request, then polled until it reaches a
//! terminal state or the attempt budget runs out. Nothing here is ever
//! surfaced to HTTP clients; callers log and fall back to the quad.

pub mod client;
pub mod payload;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use client::{DownloadedModel, ReconstructionClient};

/// Service code for "parameter invalid".
pub const INVALID_PARAMETER_CODE: i64 = 1004;

#[derive(Debug, Error)]
pub enum ReconstructionError {
    /// The service rejected the request shape; the next shape may work.
    #[error("reconstruction request rejected as invalid: {0}")]
    InvalidParameter(String),
    #[error("reconstruction failed: {0}")]
    Failed(String),
    #[error("reconstruction job {task_id} did not finish after {attempts} polls")]
    TimedOut { task_id: String, attempts: u32 },
    #[error("reconstruction service unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("model download failed: {0}")]
    Download(String),
}

impl ReconstructionError {
    pub fn is_invalid_parameter(&self) -> bool {
        matches!(self, ReconstructionError::InvalidParameter(_))
    }

    /// Classifies a service-reported failure message.
    pub(crate) fn from_service(code: Option<i64>, message: String) -> Self {
        if code == Some(INVALID_PARAMETER_CODE) || message.to_ascii_lowercase().contains("invalid") {
            ReconstructionError::InvalidParameter(message)
        } else {
            ReconstructionError::Failed(message)
        }
    }
}

/// What to reconstruct from when a single image is enough.
#[derive(Debug, Clone)]
pub enum ImageInput {
    /// Reachable by the remote service.
    Url(String),
    /// Sent inline as a data URI.
    Bytes(Vec<u8>),
}

/// State of a remote job as read from one poll response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    /// Not terminal yet; `status` is whatever the service reported.
    Pending { status: String },
    Succeeded { model_url: String },
    Failed { message: String },
}

/// Delay between polls. Swapped for a no-op in tests.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
