//! Grid configuration.
//!
//! [`GridConfig`] is an explicit value handed to the grid at construction, so
//! several grids with different tile sources can coexist in one process.
//! Validation happens up front in [`GridConfig::validate`]; the grid and the
//! shard resolver both call it, so a bad template or an empty shard list is
//! reported before any tile is requested.
//!
//! # INI format
//!
//! ```ini
//! [grid]
//! url_template = https://{s}.tile.example.org/{z}/{x}/{y}.png
//! subdomains = a,b,c
//! tile_size = 256
//! min_zoom = 0
//! max_zoom = 18
//! unload_invisible_tiles = true
//! attribution = Map data © Example contributors
//! ```

mod error;
mod file;

pub use error::ConfigError;
pub use file::{parse_subdomains, GRID_SECTION};

use serde::{Deserialize, Serialize};

use crate::coord::MAX_ZOOM;
use crate::provider::UrlTemplate;

/// Default tile edge length in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 256;

/// Default lowest zoom level served.
pub const DEFAULT_MIN_ZOOM: u8 = 0;

/// Default highest zoom level served.
pub const DEFAULT_MAX_ZOOM: u8 = 18;

/// Default shard labels.
pub const DEFAULT_SUBDOMAINS: [&str; 3] = ["a", "b", "c"];

/// Construction-time settings for a tile grid.
///
/// `url_template` and `unload_invisible_tiles` have no defaults and must be
/// supplied to [`GridConfig::new`]. Whether invisible tiles are unloaded is a
/// deployment decision (memory-constrained targets want it on), not
/// something the grid guesses.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridConfig {
    /// Tile URL with `{s}`, `{z}`, `{x}`, `{y}` placeholders.
    pub url_template: String,

    /// Destroy tiles that leave the viewport.
    pub unload_invisible_tiles: bool,

    /// Tile edge length in pixels.
    pub tile_size: u32,

    /// Lowest zoom level for which tiles are requested.
    pub min_zoom: u8,

    /// Highest zoom level for which tiles are requested.
    pub max_zoom: u8,

    /// Shard labels substituted for `{s}`, in selection order.
    pub subdomains: Vec<String>,

    /// Attribution text for the display layer. Not interpreted here.
    pub attribution: Option<String>,
}

impl GridConfig {
    /// Create a config with default tile size, zoom range and subdomains.
    pub fn new(url_template: impl Into<String>, unload_invisible_tiles: bool) -> Self {
        Self {
            url_template: url_template.into(),
            unload_invisible_tiles,
            tile_size: DEFAULT_TILE_SIZE,
            min_zoom: DEFAULT_MIN_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
            subdomains: DEFAULT_SUBDOMAINS.iter().map(|s| s.to_string()).collect(),
            attribution: None,
        }
    }

    /// Set the tile size in pixels.
    pub fn with_tile_size(mut self, tile_size: u32) -> Self {
        self.tile_size = tile_size;
        self
    }

    /// Set the served zoom range (inclusive).
    pub fn with_zoom_range(mut self, min_zoom: u8, max_zoom: u8) -> Self {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self
    }

    /// Replace the shard labels.
    pub fn with_subdomains<I, S>(mut self, subdomains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subdomains = subdomains.into_iter().map(Into::into).collect();
        self
    }

    /// Set the attribution text.
    pub fn with_attribution(mut self, attribution: impl Into<String>) -> Self {
        self.attribution = Some(attribution.into());
        self
    }

    /// Whether tiles at `zoom` are served by this grid.
    pub fn serves_zoom(&self, zoom: u8) -> bool {
        (self.min_zoom..=self.max_zoom).contains(&zoom)
    }

    /// Check every setting, returning the parsed URL template on success.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found: zero tile size, a zoom limit
    /// past [`MAX_ZOOM`], an inverted zoom range, an empty or blank shard
    /// list, or a malformed URL template.
    pub fn validate(&self) -> Result<UrlTemplate, ConfigError> {
        if self.tile_size == 0 {
            return Err(ConfigError::ZeroTileSize);
        }
        for zoom in [self.min_zoom, self.max_zoom] {
            if zoom > MAX_ZOOM {
                return Err(ConfigError::ZoomTooLarge {
                    zoom,
                    max: MAX_ZOOM,
                });
            }
        }
        if self.min_zoom > self.max_zoom {
            return Err(ConfigError::InvalidZoomRange {
                min: self.min_zoom,
                max: self.max_zoom,
            });
        }
        validate_subdomains(&self.subdomains)?;
        UrlTemplate::parse(&self.url_template)
    }
}

pub(crate) fn validate_subdomains(subdomains: &[String]) -> Result<(), ConfigError> {
    if subdomains.is_empty() {
        return Err(ConfigError::EmptySubdomains);
    }
    if let Some(index) = subdomains.iter().position(|s| s.trim().is_empty()) {
        return Err(ConfigError::BlankSubdomain(index));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const OSM: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";

    #[test]
    fn test_defaults() {
        let config = GridConfig::new(OSM, false);
        assert_eq!(config.tile_size, 256);
        assert_eq!(config.min_zoom, 0);
        assert_eq!(config.max_zoom, 18);
        assert_eq!(config.subdomains, vec!["a", "b", "c"]);
        assert!(!config.unload_invisible_tiles);
        assert!(config.attribution.is_none());
    }

    #[test]
    fn test_builder_methods() {
        let config = GridConfig::new(OSM, true)
            .with_tile_size(512)
            .with_zoom_range(2, 12)
            .with_subdomains(["mt0", "mt1"])
            .with_attribution("© contributors");

        assert_eq!(config.tile_size, 512);
        assert_eq!((config.min_zoom, config.max_zoom), (2, 12));
        assert_eq!(config.subdomains, vec!["mt0", "mt1"]);
        assert_eq!(config.attribution.as_deref(), Some("© contributors"));
        assert!(config.unload_invisible_tiles);
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(GridConfig::new(OSM, false).validate().is_ok());
    }

    #[test]
    fn test_empty_subdomains_rejected() {
        let config = GridConfig::new(OSM, false).with_subdomains(Vec::<String>::new());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::EmptySubdomains)
        ));
    }

    #[test]
    fn test_blank_subdomain_rejected() {
        let config = GridConfig::new(OSM, false).with_subdomains(["a", " "]);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::BlankSubdomain(1))
        ));
    }

    #[test]
    fn test_zero_tile_size_rejected() {
        let config = GridConfig::new(OSM, false).with_tile_size(0);
        assert!(matches!(config.validate(), Err(ConfigError::ZeroTileSize)));
    }

    #[test]
    fn test_inverted_zoom_range_rejected() {
        let config = GridConfig::new(OSM, false).with_zoom_range(10, 4);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidZoomRange { min: 10, max: 4 })
        ));
    }

    #[test]
    fn test_zoom_beyond_supported_rejected() {
        let config = GridConfig::new(OSM, false).with_zoom_range(0, MAX_ZOOM + 1);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZoomTooLarge { .. })
        ));
    }

    #[test]
    fn test_template_missing_placeholder_rejected() {
        let config = GridConfig::new("https://tiles.example.org/{z}/{x}.png", false);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingPlaceholder {
                placeholder: "{y}",
                ..
            })
        ));
    }

    #[test]
    fn test_serves_zoom() {
        let config = GridConfig::new(OSM, false).with_zoom_range(3, 5);
        assert!(!config.serves_zoom(2));
        assert!(config.serves_zoom(3));
        assert!(config.serves_zoom(5));
        assert!(!config.serves_zoom(6));
    }
}
