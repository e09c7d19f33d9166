//! Load: config loading from file and environment variables.

use std::path::Path;
use std::fs::File;
use std::io::Read;

use super::model::ParserConfig;
use crate::parser::MAX_LINE_SIZE;

impl ParserConfig {
    /// Load configuration from file or environment variables
    /// Priority: Environment Variables > Config File > Defaults
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = std::env::var("ACCESSLOG_CONFIG_FILE")
            .unwrap_or_else(|_| "/etc/accesslog/parser.toml".to_string());

        let mut config = if Path::new(&config_path).exists() {
            tracing::info!("Loading configuration from: {}", config_path);
            Self::from_file(&config_path)?
        } else {
            tracing::info!("Config file not found at {}, using environment variables", config_path);
            Self::from_env()
        };

        if let Ok(format) = std::env::var("ACCESSLOG_FORMAT") {
            config.format = format;
        }
        if let Ok(tz) = std::env::var("ACCESSLOG_DEFAULT_TIMEZONE") {
            config.default_timezone = tz;
        }
        if let Some(stop) = std::env::var("ACCESSLOG_STOP_ON_INVALID")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            config.stop_on_invalid_record = stop;
        }
        if let Some(size) = std::env::var("ACCESSLOG_MAX_LINE_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            config.max_line_size = size;
        }

        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: ParserConfig = toml::from_str(contents)?;
        Ok(config)
    }

    /// Load configuration from environment variables with sensible defaults
    pub fn from_env() -> Self {
        Self {
            format: std::env::var("ACCESSLOG_FORMAT")
                .unwrap_or_else(|_| "common".to_string()),
            default_timezone: std::env::var("ACCESSLOG_DEFAULT_TIMEZONE")
                .unwrap_or_else(|_| "UTC".to_string()),
            stop_on_invalid_record: std::env::var("ACCESSLOG_STOP_ON_INVALID")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(false),
            max_line_size: std::env::var("ACCESSLOG_MAX_LINE_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(MAX_LINE_SIZE),
        }
    }
}
