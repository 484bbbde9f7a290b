//! Tile loader abstraction.
//!
//! The grid never performs I/O. Whoever embeds it supplies a [`TileLoader`]
//! that turns a [`ShardTarget`] into a render-target handle, which the grid
//! stores and hands back without looking inside.

pub use futures::future::BoxFuture;
use thiserror::Error;

use super::ShardTarget;

/// Why a tile fetch did not produce a handle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The loader could not produce the tile.
    #[error("{0}")]
    Failed(String),

    /// The loader gave up because the fetch was cancelled.
    #[error("fetch cancelled")]
    Cancelled,
}

impl FetchError {
    /// Creates a failure with the given reason.
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed(reason.into())
    }
}

/// Fetches tiles for the grid.
///
/// `fetch` returns an owned future. The grid spawns it on the Tokio runtime
/// and drops it when the tile is evicted mid-flight, so loaders that hold
/// cancellable resources inside the future get cancellation for free.
/// Loaders should not retry on their own account unless that is the policy
/// they want; the grid never retries a failed tile by itself.
pub trait TileLoader: Send + Sync + 'static {
    /// Render-target handle produced by a successful fetch.
    type Handle: Clone + Send + 'static;

    /// Starts fetching one tile.
    fn fetch(&self, target: &ShardTarget) -> BoxFuture<'static, Result<Self::Handle, FetchError>>;
}
