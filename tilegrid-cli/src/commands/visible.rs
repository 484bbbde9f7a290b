//! Visible command - list the tiles a viewport needs.

use tilegrid::grid::visible_tile_keys;
use tilegrid::{GridConfig, PixelPoint, TileKey, ViewportBounds};

use crate::error::CliError;

/// Arguments for the visible command.
pub struct VisibleArgs {
    pub min_x: i64,
    pub min_y: i64,
    pub max_x: i64,
    pub max_y: i64,
    pub zoom: u8,
}

/// Run the visible command.
pub fn run(args: VisibleArgs, config: &GridConfig) -> Result<(), CliError> {
    let keys = sorted_keys(&args, config)?;
    for key in &keys {
        println!("{}", key.at_zoom(args.zoom));
    }
    println!("{} tile(s)", keys.len());
    Ok(())
}

fn sorted_keys(args: &VisibleArgs, config: &GridConfig) -> Result<Vec<TileKey>, CliError> {
    let viewport = ViewportBounds::new(
        PixelPoint::new(args.min_x, args.min_y),
        PixelPoint::new(args.max_x, args.max_y),
        args.zoom,
        config.tile_size,
    )?;
    if !config.serves_zoom(args.zoom) {
        return Ok(Vec::new());
    }

    let mut keys: Vec<_> = visible_tile_keys(&viewport).into_iter().collect();
    keys.sort_by_key(|k| (k.y, k.x));
    Ok(keys)
}
