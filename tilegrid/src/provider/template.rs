//! Tile URL templates.
//!
//! A template is parsed once into literal and placeholder segments, so
//! rendering a URL is a single pass with no string searching. Recognized
//! placeholders:
//!
//! - `{s}`: shard label (optional)
//! - `{z}`: zoom level (required)
//! - `{x}`: wrapped tile column (required)
//! - `{y}`: tile row (required)
//!
//! Every occurrence of a placeholder is substituted.

use std::fmt;
use std::str::FromStr;

use crate::config::ConfigError;
use crate::coord::TileCoord;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Shard,
    Zoom,
    X,
    Y,
}

/// A validated tile URL template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl UrlTemplate {
    /// Parses and validates a template.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::UnterminatedPlaceholder`] for a `{` with no `}`
    /// - [`ConfigError::UnknownPlaceholder`] for `{name}` outside `s`, `z`, `x`, `y`
    /// - [`ConfigError::MissingPlaceholder`] if `{z}`, `{x}` or `{y}` is absent
    pub fn parse(template: &str) -> Result<Self, ConfigError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = template;
        let mut offset = 0;

        while let Some(open) = rest.find('{') {
            literal.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let close = after
                .find('}')
                .ok_or_else(|| ConfigError::UnterminatedPlaceholder {
                    template: template.to_string(),
                    position: offset + open,
                })?;

            let segment = match &after[..close] {
                "s" => Segment::Shard,
                "z" => Segment::Zoom,
                "x" => Segment::X,
                "y" => Segment::Y,
                name => {
                    return Err(ConfigError::UnknownPlaceholder {
                        template: template.to_string(),
                        name: name.to_string(),
                    })
                }
            };
            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            segments.push(segment);

            let consumed = open + 1 + close + 1;
            offset += consumed;
            rest = &rest[consumed..];
        }
        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        for (required, placeholder) in [
            (Segment::Zoom, "{z}"),
            (Segment::X, "{x}"),
            (Segment::Y, "{y}"),
        ] {
            if !segments.contains(&required) {
                return Err(ConfigError::MissingPlaceholder {
                    template: template.to_string(),
                    placeholder,
                });
            }
        }

        Ok(Self {
            source: template.to_string(),
            segments,
        })
    }

    /// Substitutes the shard label and coordinate into the template.
    pub fn render(&self, shard: &str, coord: &TileCoord) -> String {
        let mut url = String::with_capacity(self.source.len() + 16);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => url.push_str(text),
                Segment::Shard => url.push_str(shard),
                Segment::Zoom => url.push_str(&coord.zoom.to_string()),
                Segment::X => url.push_str(&coord.x.to_string()),
                Segment::Y => url.push_str(&coord.y.to_string()),
            }
        }
        url
    }

    /// Whether the template contains `{s}`.
    pub fn uses_shard(&self) -> bool {
        self.segments.contains(&Segment::Shard)
    }

    /// The original template text.
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl FromStr for UrlTemplate {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for UrlTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
