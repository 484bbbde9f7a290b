//! Tile entry bookkeeping types.

use std::fmt;

use tokio::task::JoinHandle;

use crate::coord::{TileCoord, TileKey};
use crate::provider::FetchError;

/// Load state of a cached tile, as seen from outside the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileState {
    /// Fetch in flight.
    Loading,
    /// Fetch succeeded; the handle has been attached.
    Loaded,
    /// Fetch failed; not retried while the entry lives.
    Failed,
}

impl fmt::Display for TileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TileState::Loading => "loading",
            TileState::Loaded => "loaded",
            TileState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Result of one fetch, addressed to the cache by key.
///
/// The ticket identifies which entry lifetime issued the fetch, so a result
/// from before an eviction can never complete an entry created after it.
#[derive(Debug)]
pub struct LoadCompletion<H> {
    pub(crate) key: TileKey,
    pub(crate) ticket: u64,
    pub(crate) result: Result<H, FetchError>,
}

impl<H> LoadCompletion<H> {
    /// Key of the tile this result belongs to.
    pub fn key(&self) -> TileKey {
        self.key
    }

    /// Whether the fetch succeeded.
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Counts from one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Fetches issued for newly visible tiles.
    pub requested: usize,
    /// Entries already present and left untouched.
    pub retained: usize,
    /// Entries destroyed, including those removed by a zoom-change clear.
    pub evicted: usize,
}

impl ReconcileOutcome {
    /// True when the pass changed nothing.
    pub fn is_noop(&self) -> bool {
        self.requested == 0 && self.evicted == 0
    }
}

pub(crate) enum EntryState<H> {
    Loading(JoinHandle<()>),
    Loaded(H),
    Failed(FetchError),
}

impl<H> EntryState<H> {
    pub(crate) fn public(&self) -> TileState {
        match self {
            EntryState::Loading(_) => TileState::Loading,
            EntryState::Loaded(_) => TileState::Loaded,
            EntryState::Failed(_) => TileState::Failed,
        }
    }
}

pub(crate) struct TileEntry<H> {
    pub(crate) coord: TileCoord,
    pub(crate) ticket: u64,
    pub(crate) state: EntryState<H>,
}
