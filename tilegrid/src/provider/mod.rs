//! Tile sources: URL templates, shard selection and the loader capability.
//!
//! The grid resolves every tile to a [`ShardTarget`] through a
//! [`ShardResolver`] and hands it to a caller-supplied [`TileLoader`].
//!
//! # Example
//!
//! ```
//! use tilegrid::coord::TileCoord;
//! use tilegrid::provider::{ShardResolver, UrlTemplate};
//!
//! let template = UrlTemplate::parse("https://{s}.tile.example.org/{z}/{x}/{y}.png").unwrap();
//! let resolver = ShardResolver::new(template, vec!["a".into(), "b".into(), "c".into()]).unwrap();
//!
//! let target = resolver.resolve(&TileCoord::new(2, 3, 3));
//! assert_eq!(target.url, "https://c.tile.example.org/3/2/3.png");
//! ```

mod loader;
mod shard;
mod template;

pub use loader::{BoxFuture, FetchError, TileLoader};
pub use shard::{resolve_target, ShardResolver, ShardTarget};
pub use template::UrlTemplate;

#[cfg(test)]
pub use loader::tests::MockLoader;
