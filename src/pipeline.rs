//! Scan creation and model retrieval.
//!
//! Creation always leaves a working `model.gltf` behind before it talks to
//! the reconstruction service, so a crash or a slow job never breaks the
//! shareable link. Reconstruction errors stop here: they are logged and
//! counted, never returned.

use crate::error::{AppError, AppResult};
use crate::metrics::Metrics;
use crate::multipart::Part;
use crate::reconstruction::{ImageInput, ReconstructionClient, ReconstructionError};
use crate::scene::{self, ImageSource};
use crate::store::{capture_artifact, ScanId, ScanStore, MODEL_ARTIFACT, RECONSTRUCTED_GLB, RECONSTRUCTED_GLTF};

pub const GLTF_JSON: &str = "model/gltf+json";
pub const GLTF_BINARY: &str = "model/gltf-binary";

/// A model ready to be sent, with its content type.
#[derive(Debug, Clone)]
pub struct ModelArtifact {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
}

#[derive(Clone)]
pub struct ModelPipeline {
    store: ScanStore,
    reconstruction: Option<ReconstructionClient>,
    metrics: Metrics,
}

impl ModelPipeline {
    pub fn new(store: ScanStore, reconstruction: Option<ReconstructionClient>, metrics: Metrics) -> Self {
        Self { store, reconstruction, metrics }
    }

    /// Persists the captures, writes the fallback quad and, when configured,
    /// runs (or schedules) a real reconstruction.
    pub async fn create(&self, images: Vec<Part>) -> AppResult<ScanId> {
        if images.is_empty() {
            return Err(AppError::NoImagesProvided);
        }

        let id = self.store.create_scan().await?;
        let total_bytes: usize = images.iter().map(|p| p.content.len()).sum();
        for (i, image) in images.iter().enumerate() {
            self.store.write_artifact(&id, &capture_artifact(i + 1), &image.content).await?;
        }
        self.metrics.inc_scans_created();
        self.metrics.add_images(images.len() as u64, total_bytes as u64);
        tracing::info!(scan_id = %id, images = images.len(), bytes = total_bytes, "scan stored");

        let fallback = scene::build(ImageSource::Reference(&capture_artifact(1)));
        self.store.write_artifact(&id, MODEL_ARTIFACT, &fallback.to_json_bytes()?).await?;

        if let Some(client) = self.reconstruction.clone() {
            let count = images.len();
            let first = images.into_iter().next().map(|p| p.content).unwrap_or_default();
            let pipeline = self.clone();
            if client.config().await_result {
                pipeline.reconstruct(&client, &id, count, first).await;
            } else {
                let id = id.clone();
                tokio::spawn(async move { pipeline.reconstruct(&client, &id, count, first).await });
            }
        }

        Ok(id)
    }

    /// Runs the fallback cascade and stores the result. Never fails.
    async fn reconstruct(&self, client: &ReconstructionClient, id: &ScanId, count: usize, first: Vec<u8>) {
        self.metrics.inc_reconstructions_attempted();
        let outcome = match self.run_cascade(client, id, count, first).await {
            Ok(model_url) => self.persist_model(client, id, &model_url).await,
            Err(e) => Err(e),
        };
        match outcome {
            Ok(artifact) => {
                self.metrics.inc_reconstructions_succeeded();
                tracing::info!(scan_id = %id, artifact, "reconstruction stored");
            }
            Err(e) => {
                self.metrics.inc_reconstructions_failed();
                tracing::warn!(scan_id = %id, error = %e, "reconstruction unavailable, serving the photo card");
            }
        }
    }

    /// multiview (configured shapes) -> single by URL -> single by bytes.
    async fn run_cascade(
        &self,
        client: &ReconstructionClient,
        id: &ScanId,
        count: usize,
        first: Vec<u8>,
    ) -> Result<String, ReconstructionError> {
        if count < 2 {
            return client.reconstruct_from_single_image(&ImageInput::Bytes(first)).await;
        }
        let Some(base) = client.config().public_base_url().map(str::to_string) else {
            tracing::warn!(scan_id = %id, "multiview needs a public base URL, using the first image only");
            return client.reconstruct_from_single_image(&ImageInput::Bytes(first)).await;
        };

        match client.reconstruct_from_multiple_images(id, &base, count).await {
            Ok(model_url) => return Ok(model_url),
            Err(e) => tracing::warn!(scan_id = %id, error = %e, "multiview failed, using the first image only"),
        }
        let first_url = crate::reconstruction::payload::capture_url(&base, id.as_str(), 1);
        match client.reconstruct_from_single_image(&ImageInput::Url(first_url)).await {
            Ok(model_url) => Ok(model_url),
            Err(e) => {
                tracing::warn!(scan_id = %id, error = %e, "single image by URL failed, sending bytes inline");
                client.reconstruct_from_single_image(&ImageInput::Bytes(first)).await
            }
        }
    }

    async fn persist_model(
        &self,
        client: &ReconstructionClient,
        id: &ScanId,
        model_url: &str,
    ) -> Result<&'static str, ReconstructionError> {
        let model = client.download_model(model_url).await?;
        self.store
            .write_artifact(id, model.artifact, &model.bytes)
            .await
            .map_err(|e| ReconstructionError::Download(e.to_string()))?;
        Ok(model.artifact)
    }

    /// Best available model: binary reconstruction, JSON reconstruction,
    /// then a self-contained quad built from the first capture.
    pub async fn resolve_model(&self, id: &ScanId) -> AppResult<ModelArtifact> {
        for (artifact, content_type) in [(RECONSTRUCTED_GLB, GLTF_BINARY), (RECONSTRUCTED_GLTF, GLTF_JSON)] {
            if self.store.exists(id, artifact).await {
                let bytes = self.store.read_artifact(id, artifact).await?;
                return Ok(ModelArtifact { bytes, content_type });
            }
        }

        let first = capture_artifact(1);
        if !self.store.exists(id, &first).await {
            return Err(AppError::ScanNotFound(id.to_string()));
        }
        let image = self.store.read_artifact(id, &first).await?;
        let document = scene::build(ImageSource::Embedded(&image));
        self.metrics.inc_fallback_models_served();
        Ok(ModelArtifact { bytes: document.to_json_bytes()?, content_type: GLTF_JSON })
    }
}
