//! The tile cache: sole owner of tile entries.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use crate::coord::{canonical_tile, TileKey};
use crate::provider::{ShardResolver, TileLoader};
use crate::render::{RenderCommand, RenderSink};
use crate::telemetry::GridMetrics;

use super::entry::{EntryState, LoadCompletion, ReconcileOutcome, TileEntry, TileState};

/// Loaded/loading tiles for one grid, keyed by wrapped `(x, y)`.
///
/// Every mutation goes through `&mut self`, so the owner serializes
/// reconciliations and completions without any lock. Fetches themselves run
/// concurrently as Tokio tasks and report back through an internal mailbox
/// drained with [`next_completion`](Self::next_completion) /
/// [`try_next_completion`](Self::try_next_completion) and applied with
/// [`complete`](Self::complete).
///
/// Methods that issue fetches spawn onto the current Tokio runtime and must
/// be called from within one.
pub struct TileCache<L: TileLoader> {
    loader: L,
    resolver: ShardResolver,
    unload_invisible: bool,
    zoom: Option<u8>,
    entries: HashMap<TileKey, TileEntry<L::Handle>>,
    next_ticket: u64,
    completion_tx: mpsc::UnboundedSender<LoadCompletion<L::Handle>>,
    completion_rx: mpsc::UnboundedReceiver<LoadCompletion<L::Handle>>,
    metrics: Arc<GridMetrics>,
}

impl<L: TileLoader> TileCache<L> {
    /// Creates an empty cache.
    ///
    /// With `unload_invisible` off, entries outlive the viewport and are
    /// only destroyed by [`clear`](Self::clear).
    pub fn new(
        loader: L,
        resolver: ShardResolver,
        unload_invisible: bool,
        metrics: Arc<GridMetrics>,
    ) -> Self {
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        Self {
            loader,
            resolver,
            unload_invisible,
            zoom: None,
            entries: HashMap::new(),
            next_ticket: 0,
            completion_tx,
            completion_rx,
            metrics,
        }
    }

    /// Brings the entry set in line with the visible keys at `zoom`.
    ///
    /// 1. Every visible key without an entry gets a `Loading` entry and
    ///    exactly one fetch.
    /// 2. With eviction on, every entry whose key is not visible is
    ///    destroyed: in-flight fetches are aborted, attached or failed tiles
    ///    are detached.
    /// 3. Visible keys that already have an entry are left alone, so calling
    ///    this twice with the same set is a no-op.
    ///
    /// Keys are canonicalized first: x is wrapped and off-world rows are
    /// dropped. If `zoom` differs from the zoom of the stored entries the
    /// cache is cleared before anything else, since keys from different zoom
    /// levels are not comparable.
    pub fn reconcile<S>(
        &mut self,
        zoom: u8,
        visible: &HashSet<TileKey>,
        sink: &mut S,
    ) -> ReconcileOutcome
    where
        S: RenderSink<L::Handle>,
    {
        let mut outcome = ReconcileOutcome::default();

        if self.zoom.is_some_and(|z| z != zoom) {
            debug!(
                from = ?self.zoom,
                to = zoom,
                "Reconcile at new zoom, clearing stale entries"
            );
            outcome.evicted += self.clear(sink);
        }
        self.zoom = Some(zoom);

        let visible: HashSet<TileKey> = visible
            .iter()
            .filter_map(|key| canonical_tile(key.at_zoom(zoom)))
            .map(|coord| coord.key())
            .collect();

        // Row-major, north to south, west to east.
        let mut ordered: Vec<TileKey> = visible.iter().copied().collect();
        ordered.sort_unstable_by_key(|key| (key.y, key.x));
        for key in ordered {
            if self.entries.contains_key(&key) {
                outcome.retained += 1;
            } else {
                self.start_load(key, zoom);
                outcome.requested += 1;
            }
        }

        if self.unload_invisible {
            let invisible: Vec<TileKey> = self
                .entries
                .keys()
                .filter(|key| !visible.contains(key))
                .copied()
                .collect();
            for key in invisible {
                if let Some(entry) = self.entries.remove(&key) {
                    self.destroy(entry, sink);
                    outcome.evicted += 1;
                }
            }
        }

        trace!(
            zoom,
            requested = outcome.requested,
            retained = outcome.retained,
            evicted = outcome.evicted,
            "Reconciled tile cache"
        );
        outcome
    }

    /// Destroys every entry. Returns how many were removed.
    pub fn clear<S>(&mut self, sink: &mut S) -> usize
    where
        S: RenderSink<L::Handle>,
    {
        let count = self.entries.len();
        for entry in std::mem::take(&mut self.entries).into_values() {
            self.destroy(entry, sink);
        }
        self.zoom = None;
        self.metrics.cache_cleared();
        debug!(removed = count, "Cleared tile cache");
        count
    }

    /// Applies one fetch result.
    ///
    /// Returns `false` and changes nothing when the result is stale: the
    /// entry was evicted, or was recreated by a later fetch, or has already
    /// settled. A stale success never attaches a tile.
    pub fn complete<S>(&mut self, completion: LoadCompletion<L::Handle>, sink: &mut S) -> bool
    where
        S: RenderSink<L::Handle>,
    {
        let LoadCompletion {
            key,
            ticket,
            result,
        } = completion;

        let entry = match self.entries.get_mut(&key) {
            Some(entry)
                if entry.ticket == ticket && matches!(entry.state, EntryState::Loading(_)) =>
            {
                entry
            }
            _ => {
                trace!(x = key.x, y = key.y, ticket, "Discarding stale tile completion");
                self.metrics.stale_completion();
                return false;
            }
        };

        let coord = entry.coord;
        match result {
            Ok(handle) => {
                entry.state = EntryState::Loaded(handle.clone());
                self.metrics.tile_loaded();
                trace!(x = coord.x, y = coord.y, zoom = coord.zoom, "Tile loaded");
                sink.emit(RenderCommand::TileAttached { coord, handle });
            }
            Err(error) => {
                warn!(
                    x = coord.x,
                    y = coord.y,
                    zoom = coord.zoom,
                    error = %error,
                    "Tile fetch failed"
                );
                let reason = error.to_string();
                entry.state = EntryState::Failed(error);
                self.metrics.tile_failed();
                sink.emit(RenderCommand::TileFailed { coord, reason });
            }
        }
        true
    }

    /// Waits for the next fetch result.
    ///
    /// Cancel-safe: dropping the future loses nothing. Returns `None` only if
    /// the mailbox is closed, which cannot happen while the cache is alive.
    pub async fn next_completion(&mut self) -> Option<LoadCompletion<L::Handle>> {
        self.completion_rx.recv().await
    }

    /// Takes a fetch result if one is already waiting.
    pub fn try_next_completion(&mut self) -> Option<LoadCompletion<L::Handle>> {
        self.completion_rx.try_recv().ok()
    }

    /// Applies every result already waiting. Returns how many were applied
    /// (stale results are discarded and not counted).
    pub fn drain_completions<S>(&mut self, sink: &mut S) -> usize
    where
        S: RenderSink<L::Handle>,
    {
        let mut applied = 0;
        while let Some(completion) = self.try_next_completion() {
            if self.complete(completion, sink) {
                applied += 1;
            }
        }
        applied
    }

    /// State of the entry for `key`, if any.
    pub fn state(&self, key: &TileKey) -> Option<TileState> {
        self.entries.get(key).map(|entry| entry.state.public())
    }

    pub fn contains(&self, key: &TileKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Keys of every entry, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &TileKey> + '_ {
        self.entries.keys()
    }

    /// Number of entries currently in `state`.
    pub fn count_in(&self, state: TileState) -> usize {
        self.entries
            .values()
            .filter(|entry| entry.state.public() == state)
            .count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Zoom level of the current entries, if any reconcile has run since the
    /// last clear.
    pub fn zoom(&self) -> Option<u8> {
        self.zoom
    }

    pub fn unloads_invisible(&self) -> bool {
        self.unload_invisible
    }

    fn start_load(&mut self, key: TileKey, zoom: u8) {
        let coord = key.at_zoom(zoom);
        let target = self.resolver.resolve(&coord);
        let ticket = self.next_ticket;
        self.next_ticket += 1;

        trace!(
            x = coord.x,
            y = coord.y,
            zoom,
            shard = target.subdomain_index,
            url = %target.url,
            "Fetching tile"
        );

        let fetch = self.loader.fetch(&target);
        let tx = self.completion_tx.clone();
        let task = tokio::spawn(async move {
            let result = fetch.await;
            // The receiver lives as long as the cache.
            let _ = tx.send(LoadCompletion {
                key,
                ticket,
                result,
            });
        });

        self.metrics.fetch_issued();
        self.entries.insert(
            key,
            TileEntry {
                coord,
                ticket,
                state: EntryState::Loading(task),
            },
        );
    }

    fn destroy<S>(&self, entry: TileEntry<L::Handle>, sink: &mut S)
    where
        S: RenderSink<L::Handle>,
    {
        match entry.state {
            EntryState::Loading(task) => {
                task.abort();
                self.metrics.load_cancelled();
                trace!(x = entry.coord.x, y = entry.coord.y, "Cancelled in-flight tile");
            }
            EntryState::Loaded(_) | EntryState::Failed(_) => {
                sink.emit(RenderCommand::TileDetached { coord: entry.coord });
            }
        }
        self.metrics.tile_evicted();
    }
}

impl<L: TileLoader> Drop for TileCache<L> {
    fn drop(&mut self) {
        for entry in self.entries.values() {
            if let EntryState::Loading(task) = &entry.state {
                task.abort();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::TileCoord;
    use crate::provider::{FetchError, MockLoader, UrlTemplate};

    const TEMPLATE: &str = "https://{s}.tile.test/{z}/{x}/{y}.png";

    fn cache(unload_invisible: bool) -> (TileCache<MockLoader>, MockLoader, Arc<GridMetrics>) {
        let loader = MockLoader::new();
        let resolver = ShardResolver::new(
            UrlTemplate::parse(TEMPLATE).unwrap(),
            vec!["a".into(), "b".into(), "c".into()],
        )
        .unwrap();
        let metrics = Arc::new(GridMetrics::new());
        let cache = TileCache::new(
            loader.clone(),
            resolver,
            unload_invisible,
            Arc::clone(&metrics),
        );
        (cache, loader, metrics)
    }

    fn keys(pairs: &[(i64, i64)]) -> HashSet<TileKey> {
        pairs.iter().map(|&(x, y)| TileKey::new(x, y)).collect()
    }

    fn url(x: i64, y: i64, zoom: u8) -> String {
        let shard = ["a", "b", "c"][(x + y).rem_euclid(3) as usize];
        format!("https://{}.tile.test/{}/{}/{}.png", shard, zoom, x, y)
    }

    /// Finish a fetch and apply its result once the spawned task reports back.
    async fn finish_and_apply(
        cache: &mut TileCache<MockLoader>,
        loader: &MockLoader,
        url: &str,
        result: Result<u32, FetchError>,
        sink: &mut Vec<RenderCommand<u32>>,
    ) -> bool {
        assert!(loader.finish(url, result), "no pending fetch for {}", url);
        let completion = cache.next_completion().await.unwrap();
        cache.complete(completion, sink)
    }

    #[tokio::test]
    async fn test_reconcile_issues_one_fetch_per_new_key() {
        let (mut cache, loader, _) = cache(true);
        let mut sink = Vec::new();

        let outcome = cache.reconcile(2, &keys(&[(0, 0), (1, 0), (0, 1), (1, 1)]), &mut sink);

        assert_eq!(outcome.requested, 4);
        assert_eq!(outcome.evicted, 0);
        assert_eq!(loader.request_count(), 4);
        assert_eq!(cache.count_in(TileState::Loading), 4);
        assert!(sink.is_empty(), "nothing is drawn before a load completes");
    }

    #[tokio::test]
    async fn test_fetches_issued_row_major() {
        let (mut cache, loader, _) = cache(true);
        cache.reconcile(2, &keys(&[(1, 1), (0, 1), (1, 0), (0, 0)]), &mut Vec::new());

        let urls: Vec<String> = loader.requests().into_iter().map(|t| t.url).collect();
        assert_eq!(
            urls,
            vec![url(0, 0, 2), url(1, 0, 2), url(0, 1, 2), url(1, 1, 2)]
        );
    }

    #[tokio::test]
    async fn test_reconcile_is_idempotent() {
        let (mut cache, loader, _) = cache(true);
        let visible = keys(&[(0, 0), (1, 0)]);
        let mut sink = Vec::new();

        cache.reconcile(3, &visible, &mut sink);
        let second = cache.reconcile(3, &visible, &mut sink);

        assert!(second.is_noop());
        assert_eq!(second.retained, 2);
        assert_eq!(loader.request_count(), 2);
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn test_keys_are_wrapped_and_off_world_dropped() {
        let (mut cache, loader, _) = cache(true);
        // -1 and 3 are the same column at zoom 2; row 4 is off-world.
        let outcome = cache.reconcile(2, &keys(&[(-1, 0), (3, 0), (0, 4), (0, -1)]), &mut Vec::new());

        assert_eq!(outcome.requested, 1);
        assert!(cache.contains(&TileKey::new(3, 0)));
        assert!(!cache.contains(&TileKey::new(-1, 0)));
        assert_eq!(loader.requests()[0].url, url(3, 0, 2));
    }

    #[tokio::test]
    async fn test_successful_load_attaches_tile() {
        let (mut cache, loader, metrics) = cache(true);
        let mut sink = Vec::new();
        cache.reconcile(2, &keys(&[(1, 2)]), &mut sink);

        assert!(finish_and_apply(&mut cache, &loader, &url(1, 2, 2), Ok(42), &mut sink).await);

        assert_eq!(cache.state(&TileKey::new(1, 2)), Some(TileState::Loaded));
        assert_eq!(
            sink,
            vec![RenderCommand::TileAttached {
                coord: TileCoord::new(1, 2, 2),
                handle: 42
            }]
        );
        assert_eq!(metrics.snapshot().tiles_loaded, 1);
    }

    #[tokio::test]
    async fn test_failed_load_is_reported_and_not_retried() {
        let (mut cache, loader, metrics) = cache(true);
        let visible = keys(&[(0, 0), (1, 0)]);
        let mut sink = Vec::new();
        cache.reconcile(1, &visible, &mut sink);

        let failed = finish_and_apply(
            &mut cache,
            &loader,
            &url(0, 0, 1),
            Err(FetchError::failed("HTTP 503")),
            &mut sink,
        )
        .await;
        assert!(failed);

        assert_eq!(cache.state(&TileKey::new(0, 0)), Some(TileState::Failed));
        assert_eq!(cache.state(&TileKey::new(1, 0)), Some(TileState::Loading));
        assert_eq!(
            sink,
            vec![RenderCommand::TileFailed {
                coord: TileCoord::new(0, 0, 1),
                reason: "HTTP 503".to_string()
            }]
        );

        // Still visible: the failed tile keeps its entry and is not fetched again.
        cache.reconcile(1, &visible, &mut sink);
        assert_eq!(loader.requests_for(&url(0, 0, 1)), 1);
        assert_eq!(metrics.snapshot().tiles_failed, 1);
    }

    #[tokio::test]
    async fn test_eviction_detaches_loaded_and_cancels_loading() {
        let (mut cache, loader, metrics) = cache(true);
        let mut sink = Vec::new();
        cache.reconcile(2, &keys(&[(0, 0), (1, 0)]), &mut sink);
        finish_and_apply(&mut cache, &loader, &url(0, 0, 2), Ok(1), &mut sink).await;
        sink.clear();

        let outcome = cache.reconcile(2, &keys(&[(2, 2)]), &mut sink);

        assert_eq!(outcome.evicted, 2);
        assert_eq!(outcome.requested, 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(
            sink,
            vec![RenderCommand::TileDetached {
                coord: TileCoord::new(0, 0, 2)
            }]
        );

        // Let the runtime process the abort of the in-flight fetch.
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
        assert!(!loader.is_pending(&url(1, 0, 2)));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.tiles_evicted, 2);
        assert_eq!(snapshot.loads_cancelled, 1);
    }

    #[tokio::test]
    async fn test_no_eviction_when_disabled() {
        let (mut cache, loader, _) = cache(false);
        let mut sink = Vec::new();
        cache.reconcile(2, &keys(&[(0, 0)]), &mut sink);
        let outcome = cache.reconcile(2, &keys(&[(3, 3)]), &mut sink);

        assert_eq!(outcome.evicted, 0);
        assert_eq!(cache.len(), 2);
        assert!(loader.is_pending(&url(0, 0, 2)));

        // The scrolled-out tile still finishes loading and is attached.
        assert!(finish_and_apply(&mut cache, &loader, &url(0, 0, 2), Ok(5), &mut sink).await);
        assert_eq!(cache.state(&TileKey::new(0, 0)), Some(TileState::Loaded));
        assert_eq!(
            sink,
            vec![RenderCommand::TileAttached {
                coord: TileCoord::new(0, 0, 2),
                handle: 5,
            }]
        );
    }

    #[tokio::test]
    async fn test_empty_visible_set_evicts_everything() {
        let (mut cache, _, _) = cache(true);
        let mut sink = Vec::new();
        cache.reconcile(2, &keys(&[(0, 0), (1, 1)]), &mut sink);

        let outcome = cache.reconcile(2, &HashSet::new(), &mut sink);

        assert_eq!(outcome.evicted, 2);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_completion_after_eviction_is_discarded() {
        let (mut cache, loader, metrics) = cache(true);
        let mut sink = Vec::new();
        cache.reconcile(2, &keys(&[(0, 0)]), &mut sink);

        // The fetch finishes and its result is already in the mailbox...
        assert!(loader.finish(&url(0, 0, 2), Ok(5)));
        let late = cache.next_completion().await.unwrap();

        // ...but the tile scrolls away before the result is applied.
        cache.reconcile(2, &HashSet::new(), &mut sink);
        assert!(!cache.complete(late, &mut sink));

        assert!(cache.is_empty(), "stale result must not resurrect the entry");
        assert!(sink.is_empty(), "stale result must not attach");
        assert_eq!(metrics.snapshot().stale_completions, 1);
    }

    #[tokio::test]
    async fn test_result_from_previous_lifetime_ignored() {
        let (mut cache, loader, _) = cache(true);
        let mut sink = Vec::new();
        let key = keys(&[(1, 1)]);
        cache.reconcile(2, &key, &mut sink);
        assert!(loader.finish(&url(1, 1, 2), Ok(1)));
        let old = cache.next_completion().await.unwrap();

        // Evict and bring the tile back: exactly one new fetch.
        cache.reconcile(2, &HashSet::new(), &mut sink);
        cache.reconcile(2, &key, &mut sink);
        assert_eq!(loader.requests_for(&url(1, 1, 2)), 2);

        assert!(!cache.complete(old, &mut sink));
        assert_eq!(cache.state(&TileKey::new(1, 1)), Some(TileState::Loading));

        assert!(finish_and_apply(&mut cache, &loader, &url(1, 1, 2), Ok(2), &mut sink).await);
        assert_eq!(
            sink,
            vec![RenderCommand::TileAttached {
                coord: TileCoord::new(1, 1, 2),
                handle: 2
            }]
        );
    }

    #[tokio::test]
    async fn test_clear_destroys_all_entries() {
        let (mut cache, loader, metrics) = cache(false);
        let mut sink = Vec::new();
        cache.reconcile(3, &keys(&[(0, 0), (1, 0), (2, 0)]), &mut sink);
        finish_and_apply(&mut cache, &loader, &url(2, 0, 3), Ok(9), &mut sink).await;
        sink.clear();

        assert_eq!(cache.clear(&mut sink), 3);

        assert!(cache.is_empty());
        assert_eq!(cache.zoom(), None);
        assert_eq!(
            sink,
            vec![RenderCommand::TileDetached {
                coord: TileCoord::new(2, 0, 3)
            }]
        );
        assert_eq!(metrics.snapshot().cache_clears, 1);
    }

    #[tokio::test]
    async fn test_zoom_mismatch_clears_before_reconciling() {
        let (mut cache, loader, _) = cache(false);
        let visible = keys(&[(0, 0), (1, 0)]);
        let mut sink = Vec::new();
        cache.reconcile(2, &visible, &mut sink);

        let outcome = cache.reconcile(3, &visible, &mut sink);

        assert_eq!(outcome.evicted, 2);
        assert_eq!(outcome.requested, 2);
        assert_eq!(cache.zoom(), Some(3));
        assert_eq!(loader.request_count(), 4);
    }

    #[tokio::test]
    async fn test_drain_applies_ready_completions() {
        let (mut cache, loader, _) = cache(true);
        let mut sink = Vec::new();
        cache.reconcile(1, &keys(&[(0, 0), (1, 0)]), &mut sink);

        assert_eq!(cache.drain_completions(&mut sink), 0);

        loader.finish(&url(0, 0, 1), Ok(1));
        loader.finish(&url(1, 0, 1), Ok(2));
        // Let both fetch tasks post their results.
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }

        assert_eq!(cache.drain_completions(&mut sink), 2);
        assert_eq!(cache.count_in(TileState::Loaded), 2);
        assert_eq!(sink.len(), 2);
    }
}
