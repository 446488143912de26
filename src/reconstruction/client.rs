use std::sync::Arc;

use reqwest::{Client, StatusCode};
use serde_json::Value;

use super::payload::view_urls;
use super::{ImageInput, JobState, ReconstructionError, Sleeper, TokioSleeper};
use crate::config::ReconstructionConfig;
use crate::scene::image_data_uri;
use crate::store::{ScanId, RECONSTRUCTED_GLB, RECONSTRUCTED_GLTF};

const TERMINAL_FAILURES: [&str; 4] = ["failed", "cancelled", "banned", "expired"];

/// A downloaded reconstruction, named for the scan directory.
#[derive(Debug, Clone)]
pub struct DownloadedModel {
    pub artifact: &'static str,
    pub bytes: Vec<u8>,
}

#[derive(Clone)]
pub struct ReconstructionClient {
    http: Client,
    config: Arc<ReconstructionConfig>,
    api_key: String,
    sleeper: Arc<dyn Sleeper>,
}

impl ReconstructionClient {
    /// `Ok(None)` when no API key is configured: reconstruction is off.
    pub fn from_config(config: &ReconstructionConfig) -> Result<Option<Self>, ReconstructionError> {
        let Some(api_key) = config.api_key() else {
            return Ok(None);
        };
        let http = Client::builder().timeout(config.request_timeout()).build()?;
        Ok(Some(Self {
            http,
            api_key: api_key.to_string(),
            config: Arc::new(config.clone()),
            sleeper: Arc::new(TokioSleeper),
        }))
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn config(&self) -> &ReconstructionConfig {
        &self.config
    }

    /// Runs single-image jobs, moving to the next request shape only when
    /// the service calls the current one invalid.
    pub async fn reconstruct_from_single_image(&self, input: &ImageInput) -> Result<String, ReconstructionError> {
        let image = match input {
            ImageInput::Url(url) => url.clone(),
            ImageInput::Bytes(bytes) => image_data_uri(bytes),
        };

        let mut last_err = None;
        for shape in &self.config.single_image_shapes {
            match self.run_job(&shape.build(&image)).await {
                Ok(model_url) => return Ok(model_url),
                Err(e) if e.is_invalid_parameter() => {
                    tracing::warn!(?shape, error = %e, "single-image request shape rejected, trying next");
                    last_err = Some(e);
                }
                Err(e) => return Err(e),
            }
        }
        Err(last_err.unwrap_or_else(|| ReconstructionError::Failed("no single-image request shapes configured".into())))
    }

    /// Multi-view job over the scan's first captures, fetched by the service
    /// from `public_base_url`.
    pub async fn reconstruct_from_multiple_images(
        &self,
        scan_id: &ScanId,
        public_base_url: &str,
        count: usize,
    ) -> Result<String, ReconstructionError> {
        if count < 2 {
            return Err(ReconstructionError::Failed(format!("multiview needs at least two images, got {}", count)));
        }
        let views = view_urls(public_base_url, scan_id.as_str(), count.min(self.config.max_views));

        let mut last_err = None;
        for shape in &self.config.multiview_shapes {
            match self.run_job(&shape.build(&views)).await {
                Ok(model_url) => return Ok(model_url),
                Err(e) if e.is_invalid_parameter() => {
                    tracing::warn!(?shape, error = %e, "multiview request shape rejected, trying next");
                    last_err = Some(e);
                }
                Err(e) => return Err(e),
            }
        }
        Err(last_err.unwrap_or_else(|| ReconstructionError::Failed("no multiview request shapes configured".into())))
    }

    /// Creates one job and polls it to completion.
    pub async fn run_job(&self, body: &Value) -> Result<String, ReconstructionError> {
        let task_id = self.create_task(body).await?;
        tracing::info!(%task_id, "reconstruction job created");
        self.poll_task(&task_id).await
    }

    async fn create_task(&self, body: &Value) -> Result<String, ReconstructionError> {
        let response = self
            .http
            .post(&self.config.task_url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;
        let status = response.status();
        let raw = response.text().await?;
        let parsed: Option<Value> = serde_json::from_str(&raw).ok();

        let task_id = parsed
            .as_ref()
            .and_then(|v| v.pointer("/data/task_id").or_else(|| v.get("task_id")))
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty());

        match task_id {
            Some(id) if status == StatusCode::OK => Ok(id.to_string()),
            _ => {
                tracing::warn!(%status, body = %raw, "reconstruction task creation refused");
                let code = parsed.as_ref().and_then(|v| v.get("code")).and_then(Value::as_i64);
                let message = parsed
                    .as_ref()
                    .and_then(service_message)
                    .unwrap_or_else(|| format!("task creation failed with HTTP {}", status));
                Err(ReconstructionError::from_service(code, message))
            }
        }
    }

    async fn poll_task(&self, task_id: &str) -> Result<String, ReconstructionError> {
        let attempts = self.config.max_poll_attempts;
        for attempt in 1..=attempts {
            self.sleeper.sleep(self.config.poll_interval()).await;

            let state = match self.fetch_state(task_id).await {
                Ok(Some(state)) => state,
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!(%task_id, attempt, error = %e, "poll request failed");
                    continue;
                }
            };

            match state {
                JobState::Succeeded { model_url } => {
                    tracing::info!(%task_id, attempt, %model_url, "reconstruction job succeeded");
                    return Ok(model_url);
                }
                JobState::Failed { message } => {
                    tracing::warn!(%task_id, attempt, %message, "reconstruction job failed");
                    return Err(ReconstructionError::from_service(None, message));
                }
                JobState::Pending { status } => {
                    tracing::debug!(%task_id, attempt, %status, "reconstruction job pending");
                }
            }
        }
        Err(ReconstructionError::TimedOut { task_id: task_id.to_string(), attempts })
    }

    /// `Ok(None)` when the response carried no readable status.
    async fn fetch_state(&self, task_id: &str) -> Result<Option<JobState>, reqwest::Error> {
        let url = format!("{}/{}", self.config.task_url.trim_end_matches('/'), task_id);
        let response = self.http.get(url).bearer_auth(&self.api_key).send().await?;
        if response.status() != StatusCode::OK {
            return Ok(None);
        }
        let Ok(parsed) = serde_json::from_str::<Value>(&response.text().await?) else {
            return Ok(None);
        };
        Ok(Some(job_state(&parsed)))
    }

    pub async fn download_model(&self, model_url: &str) -> Result<DownloadedModel, ReconstructionError> {
        let response = self.http.get(model_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ReconstructionError::Download(format!("HTTP {} from {}", status, model_url)));
        }
        let bytes = response.bytes().await?.to_vec();
        let artifact = if model_url.to_ascii_lowercase().contains(".glb") {
            RECONSTRUCTED_GLB
        } else {
            RECONSTRUCTED_GLTF
        };
        Ok(DownloadedModel { artifact, bytes })
    }
}

/// Reads a poll response; the job object sits under `data` or at the top.
pub(crate) fn job_state(response: &Value) -> JobState {
    let job = response.get("data").filter(|d| d.is_object()).unwrap_or(response);
    let status = job.get("status").and_then(Value::as_str).unwrap_or_default();

    if status == "success" {
        if let Some(model_url) = job.get("output").and_then(output_model_url) {
            return JobState::Succeeded { model_url };
        }
    } else if TERMINAL_FAILURES.contains(&status) {
        let message = service_message(job).unwrap_or_else(|| format!("generation {}", status));
        return JobState::Failed { message };
    }
    JobState::Pending { status: status.to_string() }
}

fn output_model_url(output: &Value) -> Option<String> {
    ["model", "pbr_model", "model_mesh"]
        .iter()
        .filter_map(|key| output.get(*key))
        .find_map(|v| v.as_str().or_else(|| v.get("url").and_then(Value::as_str)))
        .filter(|url| !url.is_empty())
        .map(str::to_string)
}

fn service_message(body: &Value) -> Option<String> {
    ["message", "msg", "error"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}
