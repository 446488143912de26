use std::time::Duration;

use serde::Deserialize;

use crate::reconstruction::payload::{MultiviewShape, SingleImageShape};

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_body_bytes: usize,
    pub static_dir: String,
    /// Origin used for links handed back to clients. Falls back to the Host header.
    #[serde(default)]
    pub public_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub scans_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReconstructionConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub public_base_url: Option<String>,
    pub task_url: String,
    pub poll_interval_ms: u64,
    pub max_poll_attempts: u32,
    pub request_timeout_secs: u64,
    pub max_views: usize,
    pub await_result: bool,
    pub single_image_shapes: Vec<SingleImageShape>,
    pub multiview_shapes: Vec<MultiviewShape>,
}

impl ReconstructionConfig {
    /// The API key, if one is configured and non-blank.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }

    /// Public origin under which the remote service can fetch captures.
    pub fn public_base_url(&self) -> Option<&str> {
        self.public_base_url
            .as_deref()
            .map(|u| u.trim().trim_end_matches('/'))
            .filter(|u| !u.is_empty())
    }

    pub fn enabled(&self) -> bool {
        self.api_key().is_some()
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for ReconstructionConfig {
    fn default() -> Self {
        // Mirror defaults from config/default.toml
        Self {
            api_key: None,
            public_base_url: None,
            task_url: "https://api.tripo3d.ai/v2/openapi/task".to_string(),
            poll_interval_ms: 5000,
            max_poll_attempts: 60,
            request_timeout_secs: 60,
            max_views: 4,
            await_result: true,
            single_image_shapes: SingleImageShape::default_order(),
            multiview_shapes: MultiviewShape::default_order(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub reconstruction: ReconstructionConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        // Fallback: parse the embedded default TOML
        let defaults: &str = include_str!("../config/default.toml");
        match ::config::Config::builder()
            .add_source(::config::File::from_str(defaults, ::config::FileFormat::Toml))
            .build()
        {
            Ok(cfg) => match cfg.try_deserialize() {
                Ok(app_cfg) => app_cfg,
                Err(e) => {
                    eprintln!("FATAL: Failed to deserialize default config: {}", e);
                    panic!("Failed to deserialize default config: {}", e);
                }
            },
            Err(e) => {
                eprintln!("FATAL: Failed to parse default config: {}", e);
                panic!("Failed to parse default config: {}", e);
            }
        }
    }
}

pub fn load() -> anyhow::Result<AppConfig> {
    // Load .env first (optional)
    let _ = dotenvy::dotenv();
    let custom_path = std::env::var("SNAP3D_CONFIG").ok();
    load_from(custom_path.as_deref())
}

/// Builds the layered configuration with an optional extra TOML file.
pub fn load_from(custom_path: Option<&str>) -> anyhow::Result<AppConfig> {
    let defaults: &str = include_str!("../config/default.toml");
    let mut builder = ::config::Config::builder()
        .add_source(::config::File::from_str(defaults, ::config::FileFormat::Toml))
        // Optional local file: snap3d.toml (in CWD)
        .add_source(::config::File::with_name("snap3d").required(false));

    if let Some(path) = custom_path {
        builder = builder
            .add_source(::config::File::new(path, ::config::FileFormat::Toml).required(false));
    }
    // Environment variables last to have highest precedence
    builder = builder.add_source(::config::Environment::with_prefix("SNAP3D").separator("__"));

    let cfg = builder.build()?;
    let mut app_cfg: AppConfig = cfg.try_deserialize()?;
    apply_legacy_env(&mut app_cfg);
    validate(&app_cfg)?;
    Ok(app_cfg)
}

/// Plain variables understood by earlier deployments; only fill unset values.
fn apply_legacy_env(cfg: &mut AppConfig) {
    if let Some(port) = std::env::var("PORT").ok().and_then(|p| p.trim().parse::<u16>().ok()) {
        if std::env::var("SNAP3D__SERVER__PORT").is_err() {
            cfg.server.port = port;
        }
    }
    if cfg.reconstruction.api_key().is_none() {
        cfg.reconstruction.api_key = std::env::var("RECONSTRUCTION_API_KEY")
            .or_else(|_| std::env::var("TRIPO_API_KEY"))
            .ok();
    }
    if cfg.reconstruction.public_base_url().is_none() {
        cfg.reconstruction.public_base_url = std::env::var("PUBLIC_BASE_URL").ok();
    }
}

pub fn validate(cfg: &AppConfig) -> anyhow::Result<()> {
    // Server
    if cfg.server.port == 0 {
        return Err(anyhow::anyhow!("invalid server.port: {}", cfg.server.port));
    }
    #[cfg(unix)]
    if cfg.server.port < 1024 {
        tracing::warn!("Using privileged port {} - may require elevated permissions", cfg.server.port);
    }
    if cfg.server.max_body_bytes == 0 {
        return Err(anyhow::anyhow!("server.max_body_bytes must be > 0"));
    }
    if let Some(url) = cfg.server.public_url.as_deref().filter(|u| !u.trim().is_empty()) {
        reqwest::Url::parse(url.trim())
            .map_err(|e| anyhow::anyhow!("invalid server.public_url {}: {}", url, e))?;
    }

    // Storage
    if cfg.storage.scans_dir.trim().is_empty() {
        return Err(anyhow::anyhow!("storage.scans_dir must not be empty"));
    }

    // Reconstruction
    let r = &cfg.reconstruction;
    if r.poll_interval_ms == 0 {
        return Err(anyhow::anyhow!("reconstruction.poll_interval_ms must be > 0"));
    }
    if r.max_poll_attempts == 0 {
        return Err(anyhow::anyhow!("reconstruction.max_poll_attempts must be > 0"));
    }
    if r.request_timeout_secs == 0 {
        return Err(anyhow::anyhow!("reconstruction.request_timeout_secs must be > 0"));
    }
    if r.max_views == 0 || r.max_views > 4 {
        return Err(anyhow::anyhow!("reconstruction.max_views must be in 1..=4"));
    }
    if r.single_image_shapes.is_empty() {
        return Err(anyhow::anyhow!("reconstruction.single_image_shapes must not be empty"));
    }
    if r.multiview_shapes.is_empty() {
        return Err(anyhow::anyhow!("reconstruction.multiview_shapes must not be empty"));
    }
    reqwest::Url::parse(&r.task_url)
        .map_err(|e| anyhow::anyhow!("invalid reconstruction.task_url {}: {}", r.task_url, e))?;
    if let Some(base) = r.public_base_url() {
        reqwest::Url::parse(base)
            .map_err(|e| anyhow::anyhow!("invalid reconstruction.public_base_url {}: {}", base, e))?;
    }

    Ok(())
}
