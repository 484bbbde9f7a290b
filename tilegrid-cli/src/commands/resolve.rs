//! Resolve command - show where a single tile would be fetched from.

use tilegrid::coord::{canonical_tile, MAX_ZOOM};
use tilegrid::{CoordError, GridConfig, ShardResolver, TileCoord};

use crate::error::CliError;

/// Arguments for the resolve command.
pub struct ResolveArgs {
    pub zoom: u8,
    pub x: i64,
    pub y: i64,
}

/// Run the resolve command.
pub fn run(args: ResolveArgs, config: &GridConfig) -> Result<(), CliError> {
    println!("{}", describe(&args, config)?);
    Ok(())
}

fn describe(args: &ResolveArgs, config: &GridConfig) -> Result<String, CliError> {
    if args.zoom > MAX_ZOOM {
        return Err(CoordError::InvalidZoom(args.zoom).into());
    }

    let raw = TileCoord::new(args.x, args.y, args.zoom);
    let Some(tile) = canonical_tile(raw) else {
        return Ok(format!("{}: off-world", raw));
    };

    let resolver = ShardResolver::from_config(config)?;
    let target = resolver.resolve(&tile);
    let shard = &resolver.subdomains()[target.subdomain_index];

    let mut line = format!("{} -> {}  shard={}  {}", raw, tile, shard, target.url);
    if !config.serves_zoom(args.zoom) {
        line.push_str("  (zoom outside served range)");
    }
    Ok(line)
}
