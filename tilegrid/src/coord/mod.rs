//! Coordinate math module
//!
//! Maps viewport pixel bounds onto tile index ranges and normalizes tile
//! indices into the canonical world. Everything here is pure.
//!
//! Pixel space at zoom `z` spans `2^z * tile_size` pixels per axis; tile
//! `(x, y)` covers pixels `[x * tile_size, (x + 1) * tile_size)` on x and the
//! same on y. Only the x axis repeats (east–west across the antimeridian);
//! rows above or below the world are simply off-world.

mod types;

pub use types::{CoordError, PixelPoint, TileCoord, TileKey, ViewportBounds, MAX_ZOOM};

/// Number of tiles along one axis at `zoom` (`2^zoom`).
#[inline]
pub fn tile_limit(zoom: u8) -> i64 {
    debug_assert!(zoom <= MAX_ZOOM, "zoom {} exceeds {}", zoom, MAX_ZOOM);
    1_i64 << zoom
}

/// Returns the northwest and southeast tiles covering the viewport.
///
/// Each corner component is `floor(pixel / tile_size)`, computed
/// independently. No wrapping happens here; the result lives in unbounded
/// tile space and may extend past the world on any side.
#[inline]
pub fn visible_tile_range(viewport: &ViewportBounds) -> (TileCoord, TileCoord) {
    let size = i64::from(viewport.tile_size());
    let (min, max) = (viewport.min(), viewport.max());
    let zoom = viewport.zoom();

    let nw = TileCoord::new(min.x.div_euclid(size), min.y.div_euclid(size), zoom);
    let se = TileCoord::new(max.x.div_euclid(size), max.y.div_euclid(size), zoom);
    (nw, se)
}

/// Wraps a tile column into `[0, 2^zoom)`.
///
/// Equivalent to `((raw mod limit) + limit) mod limit`, so columns west of
/// the antimeridian land on their canonical eastern counterpart.
#[inline]
pub fn wrap_coordinate(raw: i64, zoom: u8) -> i64 {
    raw.rem_euclid(tile_limit(zoom))
}

/// True when row `y` exists at `zoom`. Rows never wrap.
#[inline]
pub fn is_on_world(y: i64, zoom: u8) -> bool {
    (0..tile_limit(zoom)).contains(&y)
}

/// Normalizes a raw tile into its canonical form.
///
/// Returns `None` for off-world rows; otherwise the same tile with x wrapped.
#[inline]
pub fn canonical_tile(raw: TileCoord) -> Option<TileCoord> {
    if !is_on_world(raw.y, raw.zoom) {
        return None;
    }
    Some(TileCoord::new(
        wrap_coordinate(raw.x, raw.zoom),
        raw.y,
        raw.zoom,
    ))
}
