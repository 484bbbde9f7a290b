//! Tile cache
//!
//! Owns every tile entry for a grid and enforces two rules:
//!
//! - **At most one load per key.** A visible key without an entry gets one
//!   `Loading` entry and one fetch; later reconciliations leave it alone.
//! - **Results are applied by key and ticket.** A fetch result is looked up
//!   by its key when it arrives. If the entry is gone, or was recreated by a
//!   newer fetch, the result is discarded, so an evicted tile is never
//!   resurrected or attached.
//!
//! ```text
//!   reconcile(visible) ──► Loading ──► complete(Ok) ──► Loaded  ──► TileAttached
//!                            │     └─► complete(Err) ─► Failed  ──► TileFailed
//!                            │
//!   evict / clear ───────────┴─► abort fetch      Loaded|Failed ──► TileDetached
//! ```

mod entry;
mod tile_cache;

pub use entry::{LoadCompletion, ReconcileOutcome, TileState};
pub use tile_cache::TileCache;
