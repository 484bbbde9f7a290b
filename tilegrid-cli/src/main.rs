//! Tilegrid CLI - Command-line interface
//!
//! Developer front end for the tilegrid library: resolve tiles to URLs, list
//! the tiles a viewport needs, and replay viewport scripts against a
//! simulated loader.

mod commands;
mod error;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::common::{resolve_config, GridArgs};
use commands::config::ConfigCommands;
use error::CliError;

#[derive(Parser)]
#[command(name = "tilegrid")]
#[command(version, about = "Slippy-map tile grid tools", long_about = None)]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    grid: GridArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the wrapped coordinate, shard and URL for one tile
    Resolve {
        /// Zoom level
        #[arg(long)]
        zoom: u8,

        /// Tile column (may be outside the world; it is wrapped)
        #[arg(long, allow_negative_numbers = true)]
        x: i64,

        /// Tile row
        #[arg(long, allow_negative_numbers = true)]
        y: i64,
    },

    /// List the tiles covering a pixel rectangle
    Visible {
        #[arg(long, allow_negative_numbers = true)]
        min_x: i64,

        #[arg(long, allow_negative_numbers = true)]
        min_y: i64,

        #[arg(long, allow_negative_numbers = true)]
        max_x: i64,

        #[arg(long, allow_negative_numbers = true)]
        max_y: i64,

        /// Zoom level
        #[arg(long)]
        zoom: u8,
    },

    /// Replay a JSON viewport script against a simulated loader
    Simulate {
        /// JSON array of viewports ({"min", "max", "zoom", "tile_size"})
        #[arg(long)]
        script: PathBuf,

        /// Simulated fetch latency in milliseconds
        #[arg(long, default_value = "50")]
        latency_ms: u64,

        /// Fail every n-th fetch
        #[arg(long)]
        fail_every: Option<u64>,

        /// Delay between viewport changes in milliseconds
        #[arg(long, default_value = "100")]
        interval_ms: u64,
    },

    /// Inspect or write the configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    let grid = &cli.grid;

    match cli.command {
        Commands::Resolve { zoom, x, y } => commands::resolve::run(
            commands::resolve::ResolveArgs { zoom, x, y },
            &resolve_config(grid)?,
        ),
        Commands::Visible {
            min_x,
            min_y,
            max_x,
            max_y,
            zoom,
        } => commands::visible::run(
            commands::visible::VisibleArgs {
                min_x,
                min_y,
                max_x,
                max_y,
                zoom,
            },
            &resolve_config(grid)?,
        ),
        Commands::Simulate {
            script,
            latency_ms,
            fail_every,
            interval_ms,
        } => commands::simulate::run(
            commands::simulate::SimulateArgs {
                script,
                latency_ms,
                fail_every,
                interval_ms,
            },
            resolve_config(grid)?,
        ),
        // Resolved per subcommand so a broken config file can be replaced.
        Commands::Config { command } => {
            commands::config::run(command.unwrap_or(ConfigCommands::Show), grid)
        }
    }
}
