//! Deterministic shard selection and URL resolution.
//!
//! Adjacent tiles land on different shards: the shard index is
//! `(x + y) mod shard_count`, taken on the wrapped column and the raw row.
//! The same tile always resolves to the same shard regardless of the order
//! in which tiles are requested.

use serde::Serialize;

use crate::config::{validate_subdomains, ConfigError, GridConfig};
use crate::coord::{wrap_coordinate, TileCoord};

use super::UrlTemplate;

/// Where to fetch one tile from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ShardTarget {
    /// Fully substituted tile URL.
    pub url: String,
    /// Index into the configured subdomain list.
    pub subdomain_index: usize,
}

/// Maps tile coordinates to fetch targets.
#[derive(Debug, Clone)]
pub struct ShardResolver {
    template: UrlTemplate,
    subdomains: Vec<String>,
}

impl ShardResolver {
    /// Creates a resolver over a parsed template.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptySubdomains`] or
    /// [`ConfigError::BlankSubdomain`] for an unusable shard list.
    pub fn new(template: UrlTemplate, subdomains: Vec<String>) -> Result<Self, ConfigError> {
        validate_subdomains(&subdomains)?;
        Ok(Self {
            template,
            subdomains,
        })
    }

    /// Creates a resolver from a grid configuration, validating it first.
    pub fn from_config(config: &GridConfig) -> Result<Self, ConfigError> {
        let template = config.validate()?;
        Self::new(template, config.subdomains.clone())
    }

    /// Shard index for a tile. The column is wrapped before use.
    pub fn shard_index(&self, coord: &TileCoord) -> usize {
        let x = wrap_coordinate(coord.x, coord.zoom);
        // len() is non-zero, guaranteed by construction
        let n = self.subdomains.len() as i64;
        (x.rem_euclid(n) + coord.y.rem_euclid(n)).rem_euclid(n) as usize
    }

    /// Resolves a tile to its shard and URL.
    ///
    /// The URL carries the wrapped column, so tiles one world-width apart
    /// resolve identically.
    pub fn resolve(&self, coord: &TileCoord) -> ShardTarget {
        let wrapped = TileCoord::new(wrap_coordinate(coord.x, coord.zoom), coord.y, coord.zoom);
        let subdomain_index = self.shard_index(&wrapped);
        ShardTarget {
            url: self
                .template
                .render(&self.subdomains[subdomain_index], &wrapped),
            subdomain_index,
        }
    }

    /// The configured shard labels.
    pub fn subdomains(&self) -> &[String] {
        &self.subdomains
    }

    /// The parsed URL template.
    pub fn template(&self) -> &UrlTemplate {
        &self.template
    }
}

/// One-shot resolution without building a [`ShardResolver`] first.
///
/// Parses the template and validates the shard list on every call; prefer a
/// long-lived resolver on hot paths.
pub fn resolve_target<S: AsRef<str>>(
    coord: &TileCoord,
    url_template: &str,
    subdomains: &[S],
) -> Result<ShardTarget, ConfigError> {
    let template = UrlTemplate::parse(url_template)?;
    let subdomains = subdomains.iter().map(|s| s.as_ref().to_string()).collect();
    Ok(ShardResolver::new(template, subdomains)?.resolve(coord))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE: &str = "https://{s}.tile.example.org/{z}/{x}/{y}.png";

    fn resolver(subdomains: &[&str]) -> ShardResolver {
        ShardResolver::new(
            UrlTemplate::parse(TEMPLATE).unwrap(),
            subdomains.iter().map(|s| s.to_string()).collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_shard_index_scenario() {
        // (2 + 3) mod 3 = 2 → "c"
        let target = resolver(&["a", "b", "c"]).resolve(&TileCoord::new(2, 3, 3));
        assert_eq!(target.subdomain_index, 2);
        assert_eq!(target.url, "https://c.tile.example.org/3/2/3.png");
    }

    #[test]
    fn test_adjacent_tiles_spread_across_shards() {
        let r = resolver(&["a", "b", "c"]);
        let shards: Vec<usize> = (0..3)
            .map(|x| r.shard_index(&TileCoord::new(x, 0, 4)))
            .collect();
        assert_eq!(shards, vec![0, 1, 2]);
    }

    #[test]
    fn test_unwrapped_column_resolves_like_wrapped() {
        let r = resolver(&["a", "b", "c"]);
        let west = r.resolve(&TileCoord::new(-1, 1, 2));
        let canonical = r.resolve(&TileCoord::new(3, 1, 2));
        assert_eq!(west, canonical);
        assert_eq!(canonical.url, "https://b.tile.example.org/2/3/1.png");
    }

    #[test]
    fn test_extreme_rows_do_not_overflow() {
        let target =
            resolve_target(&TileCoord::new(5, i64::MAX, 3), "/{s}/{z}/{x}/{y}", &["a", "b"]).unwrap();
        // (5 mod 2 + MAX mod 2) mod 2 = 0
        assert_eq!(target.subdomain_index, 0);
        assert_eq!(target.url, format!("/a/3/5/{}", i64::MAX));

        let r = resolver(&["a", "b", "c"]);
        // 7 mod 3 = 1, i64::MIN mod 3 = 1
        assert_eq!(r.shard_index(&TileCoord::new(7, i64::MIN, 3)), 2);
    }

    #[test]
    fn test_single_shard() {
        let r = resolver(&["tiles"]);
        let target = r.resolve(&TileCoord::new(7, 9, 5));
        assert_eq!(target.subdomain_index, 0);
        assert!(target.url.starts_with("https://tiles."));
    }

    #[test]
    fn test_empty_subdomains_is_config_error() {
        let result = ShardResolver::new(UrlTemplate::parse(TEMPLATE).unwrap(), vec![]);
        assert!(matches!(result, Err(ConfigError::EmptySubdomains)));
    }

    #[test]
    fn test_resolve_target_free_function() {
        let target = resolve_target(&TileCoord::new(2, 3, 3), TEMPLATE, &["a", "b", "c"]).unwrap();
        assert_eq!(target.subdomain_index, 2);

        let err = resolve_target(&TileCoord::new(0, 0, 0), TEMPLATE, &[] as &[&str]);
        assert!(matches!(err, Err(ConfigError::EmptySubdomains)));
    }

    #[test]
    fn test_from_config() {
        let config = GridConfig::new(TEMPLATE, false).with_subdomains(["x", "y"]);
        let r = ShardResolver::from_config(&config).unwrap();
        assert_eq!(r.subdomains(), &["x".to_string(), "y".to_string()]);
        assert_eq!(r.template().as_str(), TEMPLATE);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_resolution_is_deterministic(
                x in -100_000i64..100_000,
                y in 0i64..65_536,
                zoom in 16u8..=20,
                shard_count in 1usize..=8
            ) {
                let labels: Vec<String> = (0..shard_count).map(|i| format!("s{}", i)).collect();
                let labels: Vec<&str> = labels.iter().map(String::as_str).collect();
                let r = resolver(&labels);
                let coord = TileCoord::new(x, y, zoom);

                let first = r.resolve(&coord);
                let second = resolver(&labels).resolve(&coord);
                prop_assert_eq!(&first, &second);
                prop_assert!(first.subdomain_index < shard_count);
            }
        }
    }
}
