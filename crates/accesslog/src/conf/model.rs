//! Model: ParserConfig and Apache's named formats.

use serde::{Deserialize, Serialize};

use crate::parser::timestamp::parse_offset;
use crate::parser::MAX_LINE_SIZE;

/// Apache's stock `LogFormat` nicknames.
pub const NAMED_FORMATS: &[(&str, &str)] = &[
    ("common", r#"%h %l %u %t "%r" %>s %b"#),
    ("combined", r#"%h %l %u %t "%r" %>s %b "%{Referer}i" "%{User-agent}i""#),
    ("vhost_common", r#"%v %h %l %u %t "%r" %>s %b"#),
    ("referer", "%{Referer}i -> %U"),
    ("agent", "%{User-agent}i"),
];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Directive string, or one of the names in [`NAMED_FORMATS`].
    pub format: String,
    /// Zone applied to timestamps whose format carries no offset.
    pub default_timezone: String,
    /// Abort the run on the first line that fails to extract.
    pub stop_on_invalid_record: bool,
    pub max_line_size: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            format: "common".to_string(),
            default_timezone: "UTC".to_string(),
            stop_on_invalid_record: false,
            max_line_size: MAX_LINE_SIZE,
        }
    }
}

impl ParserConfig {
    /// The directive string to compile, with nicknames expanded.
    pub fn resolved_format(&self) -> &str {
        NAMED_FORMATS
            .iter()
            .find(|(name, _)| *name == self.format)
            .map_or(self.format.as_str(), |(_, format)| format)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.format.trim().is_empty() {
            return Err("format must not be empty".to_string());
        }
        if self.max_line_size == 0 {
            return Err("max_line_size must be > 0".to_string());
        }
        parse_offset(&self.default_timezone)
            .map_err(|e| format!("default_timezone: {}", e))?;
        Ok(())
    }
}
