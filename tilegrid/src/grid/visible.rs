//! Visible tile enumeration.

use std::collections::HashSet;

use crate::coord::{tile_limit, visible_tile_range, wrap_coordinate, TileKey, ViewportBounds};

/// Canonical keys of every on-world tile the viewport touches.
///
/// Walks the inclusive range from [`visible_tile_range`], wraps each column
/// and drops rows outside `[0, 2^zoom)`. A viewport wider than the world
/// yields each column once.
pub fn visible_tile_keys(viewport: &ViewportBounds) -> HashSet<TileKey> {
    let (nw, se) = visible_tile_range(viewport);
    let zoom = viewport.zoom();
    let limit = tile_limit(zoom);

    let first_row = nw.y.max(0);
    let last_row = se.y.min(limit - 1);
    if first_row > last_row {
        return HashSet::new();
    }

    // Past one world width every further column repeats a wrapped one.
    let last_col = se.x.min(nw.x.saturating_add(limit - 1));

    let columns = (last_col - nw.x + 1) as usize;
    let rows = (last_row - first_row + 1) as usize;
    let mut keys = HashSet::with_capacity(columns.saturating_mul(rows));
    for y in first_row..=last_row {
        for x in nw.x..=last_col {
            keys.insert(TileKey::new(wrap_coordinate(x, zoom), y));
        }
    }
    keys
}
