//! Point-in-time copy of grid counters.

use std::fmt;

use serde::Serialize;

/// Counter values captured by [`GridMetrics::snapshot`](super::GridMetrics::snapshot).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GridSnapshot {
    pub viewport_changes: u64,
    pub cache_clears: u64,
    pub fetches_issued: u64,
    pub tiles_loaded: u64,
    pub tiles_failed: u64,
    pub tiles_evicted: u64,
    pub loads_cancelled: u64,
    pub stale_completions: u64,
}

impl GridSnapshot {
    /// Fetches that have neither completed nor been cancelled.
    pub fn fetches_outstanding(&self) -> u64 {
        self.fetches_issued
            .saturating_sub(self.tiles_loaded)
            .saturating_sub(self.tiles_failed)
            .saturating_sub(self.loads_cancelled)
    }
}

impl fmt::Display for GridSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "viewports {}, clears {}, fetches {} (loaded {}, failed {}, cancelled {}), evicted {}, stale {}",
            self.viewport_changes,
            self.cache_clears,
            self.fetches_issued,
            self.tiles_loaded,
            self.tiles_failed,
            self.loads_cancelled,
            self.tiles_evicted,
            self.stale_completions
        )
    }
}
