//! Filesystem storage for scans.
//!
//! Every scan owns one directory below the store root, named by its
//! [`ScanId`]. Artifact names are resolved through [`ScanStore::resolve_path`],
//! which refuses anything that could land outside that directory.

use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

pub const MODEL_ARTIFACT: &str = "model.gltf";
pub const RECONSTRUCTED_GLB: &str = "reconstructed.glb";
pub const RECONSTRUCTED_GLTF: &str = "reconstructed.gltf";

const MAX_ID_LEN: usize = 128;
const CREATE_ATTEMPTS: usize = 8;

/// Name of the n-th capture (1-based).
pub fn capture_artifact(index: usize) -> String {
    format!("capture-{}.jpg", index)
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("artifact {artifact} not found in scan {scan_id}")]
    NotFound { scan_id: String, artifact: String },
    #[error("artifact path escapes the scan directory: {artifact}")]
    PathTraversal { artifact: String },
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A filesystem-safe scan identifier: ASCII alphanumerics and `-` only.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScanId(String);

impl ScanId {
    /// Accepts `raw` only if it is already a valid identifier.
    pub fn parse(raw: &str) -> Option<Self> {
        let valid = !raw.is_empty()
            && raw.len() <= MAX_ID_LEN
            && raw.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
        valid.then(|| Self(raw.to_string()))
    }

    /// Drops every character outside the identifier alphabet.
    pub fn sanitize(raw: &str) -> Option<Self> {
        let cleaned: String = raw
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
            .take(MAX_ID_LEN)
            .collect();
        Self::parse(&cleaned)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Source of fresh scan identifiers.
pub trait ScanIdGenerator: Send + Sync {
    fn next_id(&self) -> ScanId;
}

/// `scan-{unix millis}-{6 hex chars}`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TimestampIdGenerator;

impl ScanIdGenerator for TimestampIdGenerator {
    fn next_id(&self) -> ScanId {
        let millis = chrono::Utc::now().timestamp_millis();
        let random = uuid::Uuid::new_v4().simple().to_string();
        ScanId(format!("scan-{}-{}", millis, &random[..6]))
    }
}

#[derive(Clone)]
pub struct ScanStore {
    root: Arc<PathBuf>,
    ids: Arc<dyn ScanIdGenerator>,
}

impl ScanStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_id_generator(root, Arc::new(TimestampIdGenerator))
    }

    pub fn with_id_generator(root: impl Into<PathBuf>, ids: Arc<dyn ScanIdGenerator>) -> Self {
        Self { root: Arc::new(root.into()), ids }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Allocates an identifier whose directory does not exist yet.
    ///
    /// The directory itself is created on the first write.
    pub async fn create_scan(&self) -> Result<ScanId, StoreError> {
        let mut id = self.ids.next_id();
        for _ in 1..CREATE_ATTEMPTS {
            if !tokio::fs::try_exists(self.scan_dir(&id)).await? {
                return Ok(id);
            }
            tracing::debug!(scan_id = %id, "scan id already taken, drawing another");
            id = self.ids.next_id();
        }
        if tokio::fs::try_exists(self.scan_dir(&id)).await? {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                format!("could not allocate a free scan id after {} attempts", CREATE_ATTEMPTS),
            )));
        }
        Ok(id)
    }

    /// Maps an artifact name to its path inside the scan directory.
    ///
    /// Only plain relative components are allowed; `..`, roots, prefixes,
    /// backslashes and NUL bytes are rejected before touching the disk.
    pub fn resolve_path(&self, id: &ScanId, artifact: &str) -> Result<PathBuf, StoreError> {
        let reject = || StoreError::PathTraversal { artifact: artifact.to_string() };
        if artifact.is_empty() || artifact.contains('\0') || artifact.contains('\\') {
            return Err(reject());
        }
        let relative = Path::new(artifact);
        if !relative.components().all(|c| matches!(c, Component::Normal(_))) {
            return Err(reject());
        }

        let scan_dir = self.scan_dir(id);
        let path = scan_dir.join(relative);
        if !path.starts_with(&scan_dir) {
            return Err(reject());
        }
        Ok(path)
    }

    /// Writes to a hidden sibling first and renames it into place, so readers
    /// see either no artifact or the complete one.
    pub async fn write_artifact(&self, id: &ScanId, artifact: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let path = self.resolve_path(id, artifact)?;
        let (Some(parent), Some(file_name)) = (path.parent(), path.file_name()) else {
            return Err(StoreError::PathTraversal { artifact: artifact.to_string() });
        };
        tokio::fs::create_dir_all(parent).await?;

        let staging = parent.join(format!(".{}.tmp", file_name.to_string_lossy()));
        if let Err(e) = tokio::fs::write(&staging, bytes).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(e.into());
        }
        if let Err(e) = tokio::fs::rename(&staging, &path).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(e.into());
        }
        tracing::debug!(scan_id = %id, artifact, bytes = bytes.len(), "artifact written");
        Ok(())
    }

    pub async fn read_artifact(&self, id: &ScanId, artifact: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.resolve_path(id, artifact)?;
        let not_found = || StoreError::NotFound { scan_id: id.to_string(), artifact: artifact.to_string() };

        // Symlinks inside a scan directory must not lead out of it.
        let resolved = match tokio::fs::canonicalize(&path).await {
            Ok(p) => p,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(not_found()),
            Err(e) => return Err(e.into()),
        };
        let scan_dir = tokio::fs::canonicalize(self.scan_dir(id)).await?;
        if !resolved.starts_with(&scan_dir) {
            tracing::warn!(scan_id = %id, artifact, "artifact resolves outside its scan directory");
            return Err(StoreError::PathTraversal { artifact: artifact.to_string() });
        }
        if !tokio::fs::metadata(&resolved).await?.is_file() {
            return Err(not_found());
        }

        Ok(tokio::fs::read(&resolved).await?)
    }

    /// `true` when the artifact is a regular file. Invalid names are simply absent.
    pub async fn exists(&self, id: &ScanId, artifact: &str) -> bool {
        match self.resolve_path(id, artifact) {
            Ok(path) => tokio::fs::metadata(path).await.map(|m| m.is_file()).unwrap_or(false),
            Err(_) => false,
        }
    }

    /// Number of `capture-N.jpg` files stored for the scan.
    pub async fn capture_count(&self, id: &ScanId) -> Result<usize, StoreError> {
        let mut entries = match tokio::fs::read_dir(self.scan_dir(id)).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };
        let mut count = 0;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            let is_capture = name
                .strip_prefix("capture-")
                .and_then(|rest| rest.strip_suffix(".jpg"))
                .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()));
            if is_capture {
                count += 1;
            }
        }
        Ok(count)
    }

    fn scan_dir(&self, id: &ScanId) -> PathBuf {
        self.root.join(id.as_str())
    }
}
