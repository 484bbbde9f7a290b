//! Tile grid controller.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::cache::{ReconcileOutcome, TileCache, TileState};
use crate::config::{ConfigError, GridConfig};
use crate::coord::{CoordError, PixelPoint, TileKey, ViewportBounds};
use crate::provider::{ShardResolver, TileLoader};
use crate::render::RenderSink;
use crate::telemetry::{GridMetrics, GridSnapshot};

use super::visible_tile_keys;

/// Drives the tile cache from viewport changes.
///
/// The only state kept outside the cache is the zoom of the previous
/// viewport, used to clear the cache whenever the zoom changes. The grid is
/// the single owner of its cache: viewport changes and fetch results are
/// applied one at a time through `&mut self`.
///
/// # Example
///
/// ```ignore
/// use tilegrid::{GridConfig, TileGrid};
///
/// let config = GridConfig::new("https://{s}.tile.example.org/{z}/{x}/{y}.png", true);
/// let mut grid = TileGrid::new(config, loader, Vec::new())?;
///
/// let viewport = grid.viewport(PixelPoint::new(0, 0), PixelPoint::new(511, 511), 2)?;
/// grid.on_viewport_change(&viewport);
///
/// // Apply fetch results as they arrive.
/// while grid.wait_for_completion().await { /* draw grid.sink() */ }
/// ```
pub struct TileGrid<L: TileLoader, S: RenderSink<L::Handle>> {
    config: GridConfig,
    cache: TileCache<L>,
    sink: S,
    last_zoom: Option<u8>,
    metrics: Arc<GridMetrics>,
}

impl<L, S> TileGrid<L, S>
where
    L: TileLoader,
    S: RenderSink<L::Handle>,
{
    /// Creates a grid, validating the configuration.
    ///
    /// # Errors
    ///
    /// Any [`ConfigError`] from [`GridConfig::validate`]; nothing is fetched
    /// from a grid that failed to construct.
    pub fn new(config: GridConfig, loader: L, sink: S) -> Result<Self, ConfigError> {
        let resolver = ShardResolver::from_config(&config)?;
        let metrics = Arc::new(GridMetrics::new());
        let cache = TileCache::new(
            loader,
            resolver,
            config.unload_invisible_tiles,
            Arc::clone(&metrics),
        );

        debug!(
            template = %config.url_template,
            tile_size = config.tile_size,
            min_zoom = config.min_zoom,
            max_zoom = config.max_zoom,
            shards = config.subdomains.len(),
            unload_invisible = config.unload_invisible_tiles,
            "Created tile grid"
        );

        Ok(Self {
            config,
            cache,
            sink,
            last_zoom: None,
            metrics,
        })
    }

    /// Builds viewport bounds using this grid's tile size.
    pub fn viewport(
        &self,
        min: PixelPoint,
        max: PixelPoint,
        zoom: u8,
    ) -> Result<ViewportBounds, CoordError> {
        ViewportBounds::new(min, max, zoom, self.config.tile_size)
    }

    /// Runs one full viewport-change cycle.
    ///
    /// 1. On a zoom change, clear the cache first.
    /// 2. Enumerate the visible, wrapped, on-world keys.
    /// 3. Reconcile the cache against them.
    ///
    /// Zoom levels outside the configured range show no tiles.
    pub fn on_viewport_change(&mut self, viewport: &ViewportBounds) -> ReconcileOutcome {
        let zoom = viewport.zoom();
        self.metrics.viewport_changed();

        let mut outcome = ReconcileOutcome::default();
        if self.last_zoom.is_some_and(|last| last != zoom) {
            debug!(from = ?self.last_zoom, to = zoom, "Zoom changed, clearing tiles");
            outcome.evicted += self.cache.clear(&mut self.sink);
        }
        self.last_zoom = Some(zoom);

        let visible = if self.config.serves_zoom(zoom) {
            visible_tile_keys(viewport)
        } else {
            trace!(
                zoom,
                min_zoom = self.config.min_zoom,
                max_zoom = self.config.max_zoom,
                "Zoom outside served range"
            );
            HashSet::new()
        };

        let pass = self.cache.reconcile(zoom, &visible, &mut self.sink);
        outcome.requested += pass.requested;
        outcome.retained += pass.retained;
        outcome.evicted += pass.evicted;

        debug!(
            zoom,
            visible = visible.len(),
            requested = outcome.requested,
            evicted = outcome.evicted,
            "Viewport changed"
        );
        outcome
    }

    /// Destroys every tile and forgets the last zoom.
    pub fn clear(&mut self) -> usize {
        self.last_zoom = None;
        self.cache.clear(&mut self.sink)
    }

    /// Applies every fetch result already waiting. Returns how many changed
    /// a tile.
    pub fn pump(&mut self) -> usize {
        self.cache.drain_completions(&mut self.sink)
    }

    /// Waits for the next fetch result and applies it.
    ///
    /// Returns whether the result changed a tile (`false` for a stale one).
    pub async fn wait_for_completion(&mut self) -> bool {
        match self.cache.next_completion().await {
            Some(completion) => self.cache.complete(completion, &mut self.sink),
            None => false,
        }
    }

    /// Waits until no tile is loading.
    pub async fn settle(&mut self) {
        while self.cache.count_in(TileState::Loading) > 0 {
            self.wait_for_completion().await;
        }
    }

    /// Event loop: applies viewports and fetch results in arrival order.
    ///
    /// Returns when the viewport channel closes or `shutdown` fires, with a
    /// snapshot of the grid counters at that point. Fetches still in flight
    /// keep their entries; call [`settle`](Self::settle) to wait for them.
    pub async fn run(
        &mut self,
        mut viewports: mpsc::Receiver<ViewportBounds>,
        shutdown: CancellationToken,
    ) -> GridSnapshot {
        info!("Tile grid running");
        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    info!("Tile grid shutting down");
                    break;
                }

                viewport = viewports.recv() => match viewport {
                    Some(viewport) => {
                        self.on_viewport_change(&viewport);
                    }
                    None => {
                        debug!("Viewport source closed");
                        break;
                    }
                },

                Some(completion) = self.cache.next_completion() => {
                    self.cache.complete(completion, &mut self.sink);
                }
            }
        }
        let snapshot = self.metrics.snapshot();
        info!(%snapshot, "Tile grid stopped");
        snapshot
    }

    /// State of the tile for `key`, if the grid holds it.
    pub fn tile_state(&self, key: &TileKey) -> Option<TileState> {
        self.cache.state(key)
    }

    /// Read-only view of the cache.
    pub fn cache(&self) -> &TileCache<L> {
        &self.cache
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Consumes the grid, returning its sink. In-flight fetches are aborted.
    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Zoom of the most recent viewport.
    pub fn last_zoom(&self) -> Option<u8> {
        self.last_zoom
    }

    /// Shared handle to the grid counters.
    pub fn metrics(&self) -> Arc<GridMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn snapshot(&self) -> GridSnapshot {
        self.metrics.snapshot()
    }
}
