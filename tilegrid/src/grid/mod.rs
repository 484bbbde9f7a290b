//! Tile grid controller
//!
//! Turns viewport changes into cache reconciliations:
//!
//! ```text
//! ViewportBounds ──► visible_tile_keys ──► TileCache::reconcile ──► RenderSink
//!        │                                       ▲
//!        └── zoom changed? ──► TileCache::clear ─┘
//! ```
//!
//! [`TileGrid::run`] wraps the same cycle in an event loop fed by a channel
//! of viewports, applying fetch results between viewport changes.

mod controller;
mod visible;

pub use controller::TileGrid;
pub use visible::visible_tile_keys;
