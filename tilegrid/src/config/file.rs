//! INI file loading and saving for [`GridConfig`].

use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;

use ini::{Ini, Properties};

use super::{ConfigError, GridConfig};

/// Section holding grid settings.
pub const GRID_SECTION: &str = "grid";

impl GridConfig {
    /// Load and validate a configuration from an INI file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ini_str(&text)
    }

    /// Parse and validate a configuration from INI text.
    ///
    /// `url_template` and `unload_invisible_tiles` are required; every other
    /// key falls back to its default.
    pub fn from_ini_str(text: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        let section = ini
            .section(Some(GRID_SECTION))
            .ok_or_else(|| ConfigError::MissingKey(format!("[{}]", GRID_SECTION)))?;

        let url_template = required(section, "url_template")?;
        let unload = parse_bool(
            "unload_invisible_tiles",
            required(section, "unload_invisible_tiles")?,
        )?;

        let mut config = GridConfig::new(url_template, unload);
        if let Some(value) = section.get("tile_size") {
            config.tile_size = parse_number("tile_size", value)?;
        }
        if let Some(value) = section.get("min_zoom") {
            config.min_zoom = parse_number("min_zoom", value)?;
        }
        if let Some(value) = section.get("max_zoom") {
            config.max_zoom = parse_number("max_zoom", value)?;
        }
        if let Some(value) = section.get("subdomains") {
            config.subdomains = parse_subdomains(value);
        }
        if let Some(value) = section.get("attribution") {
            let value = value.trim();
            if !value.is_empty() {
                config.attribution = Some(value.to_string());
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Render this configuration as an INI document.
    pub fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();
        ini.with_section(Some(GRID_SECTION))
            .set("url_template", self.url_template.as_str())
            .set("subdomains", self.subdomains.join(","))
            .set("tile_size", self.tile_size.to_string())
            .set("min_zoom", self.min_zoom.to_string())
            .set("max_zoom", self.max_zoom.to_string())
            .set(
                "unload_invisible_tiles",
                self.unload_invisible_tiles.to_string(),
            );
        if let Some(attribution) = &self.attribution {
            ini.with_section(Some(GRID_SECTION))
                .set("attribution", attribution.as_str());
        }
        ini
    }

    /// Write this configuration to an INI file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        self.to_ini()
            .write_to_file(path)
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
    }
}

fn required<'a>(section: &'a Properties, key: &str) -> Result<&'a str, ConfigError> {
    section
        .get(key)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ConfigError::MissingKey(format!("{}.{}", GRID_SECTION, key)))
}

fn invalid(key: &str, value: &str, reason: impl Display) -> ConfigError {
    ConfigError::InvalidValue {
        key: format!("{}.{}", GRID_SECTION, key),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_number<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    value.trim().parse().map_err(|e| invalid(key, value, e))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(invalid(key, value, "expected true or false")),
    }
}

/// Comma-separated labels, or a bare word split into single characters
/// (`abc` → `a`, `b`, `c`).
pub fn parse_subdomains(value: &str) -> Vec<String> {
    let value = value.trim();
    if value.contains(',') {
        value.split(',').map(|s| s.trim().to_string()).collect()
    } else {
        value.chars().map(|c| c.to_string()).collect()
    }
}
