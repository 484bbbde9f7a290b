//! Atomic grid counters.

use std::sync::atomic::{AtomicU64, Ordering};

use super::GridSnapshot;

/// Counters describing grid activity since creation.
///
/// All updates use relaxed ordering; counters are independent and only read
/// for reporting.
#[derive(Debug, Default)]
pub struct GridMetrics {
    viewport_changes: AtomicU64,
    cache_clears: AtomicU64,
    fetches_issued: AtomicU64,
    tiles_loaded: AtomicU64,
    tiles_failed: AtomicU64,
    tiles_evicted: AtomicU64,
    loads_cancelled: AtomicU64,
    stale_completions: AtomicU64,
}

impl GridMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn viewport_changed(&self) {
        self.viewport_changes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn cache_cleared(&self) {
        self.cache_clears.fetch_add(1, Ordering::Relaxed);
    }

    pub fn fetch_issued(&self) {
        self.fetches_issued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn tile_loaded(&self) {
        self.tiles_loaded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn tile_failed(&self) {
        self.tiles_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn tile_evicted(&self) {
        self.tiles_evicted.fetch_add(1, Ordering::Relaxed);
    }

    /// An in-flight fetch was abandoned by eviction.
    pub fn load_cancelled(&self) {
        self.loads_cancelled.fetch_add(1, Ordering::Relaxed);
    }

    /// A fetch result arrived for an entry that no longer exists.
    pub fn stale_completion(&self) {
        self.stale_completions.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a point-in-time copy of every counter.
    pub fn snapshot(&self) -> GridSnapshot {
        GridSnapshot {
            viewport_changes: self.viewport_changes.load(Ordering::Relaxed),
            cache_clears: self.cache_clears.load(Ordering::Relaxed),
            fetches_issued: self.fetches_issued.load(Ordering::Relaxed),
            tiles_loaded: self.tiles_loaded.load(Ordering::Relaxed),
            tiles_failed: self.tiles_failed.load(Ordering::Relaxed),
            tiles_evicted: self.tiles_evicted.load(Ordering::Relaxed),
            loads_cancelled: self.loads_cancelled.load(Ordering::Relaxed),
            stale_completions: self.stale_completions.load(Ordering::Relaxed),
        }
    }
}
