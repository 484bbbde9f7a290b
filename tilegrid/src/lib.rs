//! Tilegrid - Slippy-map tile grid management
//!
//! Decides which map tiles a viewport needs, resolves each one to a sharded
//! URL, fetches them through a caller-supplied loader and keeps a cache of
//! loaded tiles consistent with what is on screen. Drawing is left to the
//! embedding layer, which receives [`RenderCommand`]s.
//!
//! # Modules
//!
//! - [`coord`]: pixel-to-tile math and antimeridian wrapping
//! - [`provider`]: URL templates, shard selection and the [`TileLoader`] trait
//! - [`cache`]: the tile cache and its load lifecycle
//! - [`grid`]: the controller reacting to viewport changes
//! - [`config`]: grid configuration and its INI file form
//! - [`render`]: draw commands and sinks
//! - [`telemetry`]: grid counters
//!
//! # Example
//!
//! ```ignore
//! use tilegrid::{GridConfig, PixelPoint, TileGrid};
//!
//! let config = GridConfig::new("https://{s}.tile.example.org/{z}/{x}/{y}.png", true);
//! let mut grid = TileGrid::new(config, my_loader, Vec::new())?;
//!
//! let viewport = grid.viewport(PixelPoint::new(0, 0), PixelPoint::new(1023, 767), 3)?;
//! grid.on_viewport_change(&viewport);
//! grid.settle().await;
//! ```

pub mod cache;
pub mod config;
pub mod coord;
pub mod grid;
pub mod provider;
pub mod render;
pub mod telemetry;

pub use cache::{ReconcileOutcome, TileCache, TileState};
pub use config::{ConfigError, GridConfig};
pub use coord::{CoordError, PixelPoint, TileCoord, TileKey, ViewportBounds};
pub use grid::TileGrid;
pub use provider::{FetchError, ShardResolver, ShardTarget, TileLoader, UrlTemplate};
pub use render::{DiscardSink, RenderCommand, RenderSink};
pub use telemetry::{GridMetrics, GridSnapshot};
