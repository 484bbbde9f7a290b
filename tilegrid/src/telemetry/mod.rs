//! Grid telemetry for observability.
//!
//! Lock-free atomic counters updated by the tile cache and the grid
//! controller, read through point-in-time snapshots.
//!
//! # Architecture
//!
//! ```text
//! TileCache / TileGrid ─────► GridMetrics ─────► GridSnapshot ─────► Views
//!                           (atomic counters)   (point-in-time copy)  (CLI, logs)
//! ```
//!
//! # Example
//!
//! ```
//! use tilegrid::telemetry::GridMetrics;
//!
//! let metrics = GridMetrics::new();
//! metrics.fetch_issued();
//! metrics.tile_loaded();
//!
//! let snapshot = metrics.snapshot();
//! assert_eq!(snapshot.fetches_issued, 1);
//! assert_eq!(snapshot.tiles_loaded, 1);
//! ```

mod metrics;
mod snapshot;

pub use metrics::GridMetrics;
pub use snapshot::GridSnapshot;
