use std::sync::Arc;

use crate::config::AppConfig;
use crate::metrics::Metrics;
use crate::pipeline::ModelPipeline;
use crate::reconstruction::ReconstructionClient;
use crate::store::ScanStore;

/// The shared application state.
///
/// Cheap to clone; every field is reference counted. Requests share no
/// mutable state apart from the filesystem below the scan root.
#[derive(Clone)]
pub struct AppState {
    /// The application configuration, loaded once at startup.
    pub config: Arc<AppConfig>,
    /// Scan storage rooted at `storage.scans_dir`.
    pub store: ScanStore,
    /// Creation and retrieval of models.
    pub pipeline: ModelPipeline,
    /// The application metrics.
    pub metrics: Metrics,
}

impl AppState {
    /// Wires the store and, if an API key is configured, the reconstruction client.
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        let store = ScanStore::new(&config.storage.scans_dir);
        let reconstruction = ReconstructionClient::from_config(&config.reconstruction)?;
        Ok(Self::with_parts(config, store, reconstruction))
    }

    /// Assembles state from prebuilt parts.
    pub fn with_parts(config: AppConfig, store: ScanStore, reconstruction: Option<ReconstructionClient>) -> Self {
        let metrics = Metrics::new();
        let pipeline = ModelPipeline::new(store.clone(), reconstruction, metrics.clone());
        Self { config: Arc::new(config), store, pipeline, metrics }
    }
}
