//! Configuration CLI commands.
//!
//! Provides `config show` and `config path` for inspecting the effective
//! grid configuration, and `config init` for writing a starter file.

use std::path::PathBuf;

use clap::Subcommand;
use tilegrid::GridConfig;

use super::common::{default_config_path, resolve_config, starter_config, GridArgs};
use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration as INI
    Show,

    /// Show the default configuration file path
    Path,

    /// Write the effective configuration to a file
    Init {
        /// Destination (default: the platform config path)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Run a config subcommand.
///
/// Configuration is resolved per subcommand: `path` reads nothing and
/// `init` ignores the platform default file, so both work while that file
/// is broken.
pub fn run(command: ConfigCommands, args: &GridArgs) -> Result<(), CliError> {
    match command {
        ConfigCommands::Show => run_show(&resolve_config(args)?),
        ConfigCommands::Path => run_path(),
        ConfigCommands::Init { output, force } => run_init(&starter_config(args)?, output, force),
    }
}

/// Print the effective configuration.
fn run_show(config: &GridConfig) -> Result<(), CliError> {
    let mut stdout = std::io::stdout();
    config.to_ini().write_to(&mut stdout)?;
    Ok(())
}

/// Show the configuration file path.
fn run_path() -> Result<(), CliError> {
    match default_config_path() {
        Some(path) => println!("{}", path.display()),
        None => println!("(no platform config directory)"),
    }
    Ok(())
}

/// Write a configuration file.
fn run_init(config: &GridConfig, output: Option<PathBuf>, force: bool) -> Result<(), CliError> {
    let path = output
        .or_else(default_config_path)
        .ok_or_else(|| CliError::Usage("no platform config directory; pass --output".into()))?;

    if path.exists() && !force {
        return Err(CliError::Usage(format!(
            "{} already exists; use --force to overwrite",
            path.display()
        )));
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    config.save(&path)?;
    println!("Wrote {}", path.display());
    Ok(())
}
