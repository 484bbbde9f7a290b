//! Configuration resolution shared across CLI commands.

use std::path::PathBuf;

use clap::Args;
use tilegrid::config::parse_subdomains;
use tilegrid::GridConfig;
use tracing::debug;

use crate::error::CliError;

/// Template used when neither a config file nor `--template` supplies one.
pub const FALLBACK_TEMPLATE: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";

/// Config file name inside the platform config directory.
const CONFIG_FILE_NAME: &str = "config.ini";

/// Grid settings that override the config file.
#[derive(Debug, Clone, Default, Args)]
pub struct GridArgs {
    /// Path to a config file (default: <config dir>/tilegrid/config.ini)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Tile URL template, e.g. https://{s}.example.org/{z}/{x}/{y}.png
    #[arg(long, global = true)]
    pub template: Option<String>,

    /// Shard labels, comma-separated or as one word (abc)
    #[arg(long, global = true)]
    pub subdomains: Option<String>,

    /// Tile edge length in pixels
    #[arg(long, global = true)]
    pub tile_size: Option<u32>,

    /// Keep tiles that scroll out of view instead of unloading them
    #[arg(long, global = true, conflicts_with = "unload_invisible")]
    pub keep_invisible: bool,

    /// Unload tiles that scroll out of view, even if the config file says not to
    #[arg(long, global = true)]
    pub unload_invisible: bool,
}

/// Platform default config file path.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("tilegrid").join(CONFIG_FILE_NAME))
}

/// Resolve the effective grid config: CLI flags, then config file, then
/// built-in fallbacks.
///
/// An explicit `--config` must exist; the platform default is only used
/// when present.
pub fn resolve_config(args: &GridArgs) -> Result<GridConfig, CliError> {
    let file_config = match &args.config {
        Some(path) => Some(GridConfig::load(path)?),
        None => match default_config_path().filter(|p| p.exists()) {
            Some(path) => {
                debug!(path = %path.display(), "Using default config file");
                Some(GridConfig::load(&path)?)
            }
            None => None,
        },
    };
    apply_overrides(args, file_config)
}

/// Like [`resolve_config`], but never reads the platform default file, so a
/// broken one can still be replaced. An explicit `--config` is still loaded.
pub fn starter_config(args: &GridArgs) -> Result<GridConfig, CliError> {
    let file_config = match &args.config {
        Some(path) => Some(GridConfig::load(path)?),
        None => None,
    };
    apply_overrides(args, file_config)
}

fn apply_overrides(
    args: &GridArgs,
    file_config: Option<GridConfig>,
) -> Result<GridConfig, CliError> {
    let mut config =
        file_config.unwrap_or_else(|| GridConfig::new(FALLBACK_TEMPLATE, !args.keep_invisible));

    if let Some(template) = &args.template {
        config.url_template = template.clone();
    }
    if let Some(subdomains) = &args.subdomains {
        config.subdomains = parse_subdomains(subdomains);
    }
    if let Some(tile_size) = args.tile_size {
        config.tile_size = tile_size;
    }
    if args.keep_invisible {
        config.unload_invisible_tiles = false;
    }
    if args.unload_invisible {
        config.unload_invisible_tiles = true;
    }

    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn config_file(text: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_flags_override_file_values() {
        let file = config_file(
            "[grid]\nurl_template = https://{s}.a.test/{z}/{x}/{y}.png\nunload_invisible_tiles = true\nsubdomains = a,b\n",
        );
        let args = GridArgs {
            config: Some(file.path().to_path_buf()),
            subdomains: Some("xyz".to_string()),
            tile_size: Some(512),
            keep_invisible: true,
            ..Default::default()
        };

        let config = resolve_config(&args).unwrap();

        assert_eq!(config.url_template, "https://{s}.a.test/{z}/{x}/{y}.png");
        assert_eq!(config.subdomains, vec!["x", "y", "z"]);
        assert_eq!(config.tile_size, 512);
        assert!(!config.unload_invisible_tiles);
    }

    #[test]
    fn test_unload_flag_overrides_file() {
        let file = config_file(
            "[grid]\nurl_template = https://{s}.a.test/{z}/{x}/{y}.png\nunload_invisible_tiles = false\n",
        );
        let args = GridArgs {
            config: Some(file.path().to_path_buf()),
            unload_invisible: true,
            ..Default::default()
        };

        assert!(resolve_config(&args).unwrap().unload_invisible_tiles);
    }

    #[test]
    fn test_starter_config_without_file_uses_fallback() {
        let args = GridArgs {
            tile_size: Some(512),
            ..Default::default()
        };

        let config = starter_config(&args).unwrap();

        assert_eq!(config.url_template, FALLBACK_TEMPLATE);
        assert_eq!(config.tile_size, 512);
        assert!(config.unload_invisible_tiles);
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        let args = GridArgs {
            config: Some(PathBuf::from("/nonexistent/tilegrid.ini")),
            ..Default::default()
        };
        assert!(matches!(resolve_config(&args), Err(CliError::Config(_))));
    }

    #[test]
    fn test_invalid_template_flag_is_rejected() {
        let file = config_file(
            "[grid]\nurl_template = https://{s}.a.test/{z}/{x}/{y}.png\nunload_invisible_tiles = true\n",
        );
        let args = GridArgs {
            config: Some(file.path().to_path_buf()),
            template: Some("https://tiles.test/{z}/{x}.png".to_string()),
            ..Default::default()
        };
        assert!(matches!(resolve_config(&args), Err(CliError::Config(_))));
    }
}
