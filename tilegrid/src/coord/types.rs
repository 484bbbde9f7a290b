//! Coordinate value types shared by the grid, cache and resolver.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Highest zoom level the grid accepts.
///
/// Keeps `2^zoom` and every tile index comfortably inside `i64`, and pixel
/// coordinates (`index * tile_size`) far away from overflow.
pub const MAX_ZOOM: u8 = 30;

/// Errors raised when building coordinate values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordError {
    /// Tile size must be at least one pixel.
    #[error("tile size must be greater than zero")]
    ZeroTileSize,

    /// The minimum corner lies past the maximum corner on some axis.
    #[error("inverted pixel bounds: min ({min}) is past max ({max})")]
    InvertedBounds { min: PixelPoint, max: PixelPoint },

    /// Zoom level exceeds [`MAX_ZOOM`].
    #[error("zoom level {0} exceeds maximum {MAX_ZOOM}")]
    InvalidZoom(u8),
}

/// A tile address in the quadtree pyramid.
///
/// `x` grows eastward and `y` grows southward. Neither is bounded here:
/// values straight out of [`visible_tile_range`](super::visible_tile_range)
/// may be negative or past the world edge until they are wrapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: i64,
    pub y: i64,
    pub zoom: u8,
}

impl TileCoord {
    pub fn new(x: i64, y: i64, zoom: u8) -> Self {
        Self { x, y, zoom }
    }

    /// The cache key for this tile (zoom dropped).
    pub fn key(&self) -> TileKey {
        TileKey::new(self.x, self.y)
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

/// Identity of a cached tile within one zoom generation.
///
/// Always holds a wrapped x and an on-world y once it reaches the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileKey {
    pub x: i64,
    pub y: i64,
}

impl TileKey {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Attach a zoom level, producing a full coordinate.
    pub fn at_zoom(self, zoom: u8) -> TileCoord {
        TileCoord::new(self.x, self.y, zoom)
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A point in the map's pixel space at some zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: i64,
    pub y: i64,
}

impl PixelPoint {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for PixelPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.x, self.y)
    }
}

/// The rectangle of pixels currently visible, inclusive on both corners.
///
/// Construct through [`ViewportBounds::new`]; deserialization runs the same
/// validation, so every instance has a non-zero tile size and ordered corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawViewport")]
pub struct ViewportBounds {
    min: PixelPoint,
    max: PixelPoint,
    zoom: u8,
    tile_size: u32,
}

impl ViewportBounds {
    /// Creates validated viewport bounds.
    ///
    /// # Errors
    ///
    /// - [`CoordError::ZeroTileSize`] if `tile_size` is zero
    /// - [`CoordError::InvertedBounds`] if `min` is past `max` on either axis
    /// - [`CoordError::InvalidZoom`] if `zoom` exceeds [`MAX_ZOOM`]
    pub fn new(
        min: PixelPoint,
        max: PixelPoint,
        zoom: u8,
        tile_size: u32,
    ) -> Result<Self, CoordError> {
        if tile_size == 0 {
            return Err(CoordError::ZeroTileSize);
        }
        if min.x > max.x || min.y > max.y {
            return Err(CoordError::InvertedBounds { min, max });
        }
        if zoom > MAX_ZOOM {
            return Err(CoordError::InvalidZoom(zoom));
        }
        Ok(Self {
            min,
            max,
            zoom,
            tile_size,
        })
    }

    pub fn min(&self) -> PixelPoint {
        self.min
    }

    pub fn max(&self) -> PixelPoint {
        self.max
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }
}

#[derive(Deserialize)]
struct RawViewport {
    min: PixelPoint,
    max: PixelPoint,
    zoom: u8,
    tile_size: u32,
}

impl TryFrom<RawViewport> for ViewportBounds {
    type Error = CoordError;

    fn try_from(raw: RawViewport) -> Result<Self, Self::Error> {
        ViewportBounds::new(raw.min, raw.max, raw.zoom, raw.tile_size)
    }
}
