use serde::Serialize;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Process-wide counters for monitoring
#[derive(Clone)]
pub struct Metrics {
    pub scans_created: Arc<AtomicUsize>,
    pub images_received: Arc<AtomicU64>,
    pub bytes_received: Arc<AtomicU64>,
    pub reconstructions_attempted: Arc<AtomicUsize>,
    pub reconstructions_succeeded: Arc<AtomicUsize>,
    pub reconstructions_failed: Arc<AtomicUsize>,
    pub fallback_models_served: Arc<AtomicUsize>,
    pub start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            scans_created: Arc::new(AtomicUsize::new(0)),
            images_received: Arc::new(AtomicU64::new(0)),
            bytes_received: Arc::new(AtomicU64::new(0)),
            reconstructions_attempted: Arc::new(AtomicUsize::new(0)),
            reconstructions_succeeded: Arc::new(AtomicUsize::new(0)),
            reconstructions_failed: Arc::new(AtomicUsize::new(0)),
            fallback_models_served: Arc::new(AtomicUsize::new(0)),
            start_time: Instant::now(),
        }
    }

    pub fn inc_scans_created(&self) {
        self.scans_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_images(&self, count: u64, bytes: u64) {
        self.images_received.fetch_add(count, Ordering::Relaxed);
        self.bytes_received.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn inc_reconstructions_attempted(&self) {
        self.reconstructions_attempted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_reconstructions_succeeded(&self) {
        self.reconstructions_succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_reconstructions_failed(&self) {
        self.reconstructions_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_fallback_models_served(&self) {
        self.fallback_models_served.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            scans_created: self.scans_created.load(Ordering::Relaxed),
            images_received: self.images_received.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            reconstructions_attempted: self.reconstructions_attempted.load(Ordering::Relaxed),
            reconstructions_succeeded: self.reconstructions_succeeded.load(Ordering::Relaxed),
            reconstructions_failed: self.reconstructions_failed.load(Ordering::Relaxed),
            fallback_models_served: self.fallback_models_served.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
pub struct MetricsSnapshot {
    pub scans_created: usize,
    pub images_received: u64,
    pub bytes_received: u64,
    pub reconstructions_attempted: usize,
    pub reconstructions_succeeded: usize,
    pub reconstructions_failed: usize,
    pub fallback_models_served: usize,
    pub uptime_seconds: u64,
}
