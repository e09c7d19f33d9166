//! Boot: logging init, config load, format compilation.

use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::conf::ParserConfig;
use crate::parser::timestamp::parse_offset;
use crate::parser::{ChronoTimestampParser, CompiledFormat, Compiler};

/// Initialise the tracing / logging subsystem.
///
/// Logs go to stderr; stdout carries the extracted records.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "accesslog=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Compile the configured format with a timestamp parser bound to the
/// configured default timezone.
pub fn compile(config: &ParserConfig) -> Result<CompiledFormat, Box<dyn std::error::Error>> {
    let offset = parse_offset(&config.default_timezone)?;
    let compiler = Compiler::new(Arc::new(ChronoTimestampParser::new(offset)));

    let format = compiler.compile(config.resolved_format()).map_err(|e| {
        error!("Failed to compile log format '{}': {}", config.resolved_format(), e);
        e
    })?;
    Ok(format)
}

/// Load and validate config, then compile the log format.
///
/// Returns `(CompiledFormat, ParserConfig)` on success.
pub fn boot() -> Result<(CompiledFormat, ParserConfig), Box<dyn std::error::Error>> {
    info!("Starting accesslog v{}", env!("CARGO_PKG_VERSION"));

    let config = ParserConfig::load()?;
    config.validate()?;
    info!(
        "Loaded configuration: format={:?}, default_timezone={}, stop_on_invalid_record={}",
        config.format, config.default_timezone, config.stop_on_invalid_record
    );

    let format = compile(&config)?;
    info!("Compiled format into {} fields", format.len());

    Ok((format, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{LineExtractor, RecordSink, Value};
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_compile_applies_default_timezone() {
        let config = ParserConfig {
            format: "%{%Y-%m-%d %H:%M:%S}t".to_string(),
            default_timezone: "+02:00".to_string(),
            ..Default::default()
        };
        let format = compile(&config).unwrap();

        let mut sink = RecordSink::new();
        let extractor = LineExtractor::bind(&format, &mut sink);
        extractor.extract_str("2024-03-01 12:00:00", &mut sink).unwrap();
        assert_eq!(
            sink.take_record().get("request-time"),
            Some(&Value::Timestamp(Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap()))
        );
    }

    #[test]
    fn test_compile_expands_nickname() {
        let format = compile(&ParserConfig::default()).unwrap();
        assert_eq!(format.len(), 7);
        assert_eq!(format.format(), r#"%h %l %u %t "%r" %>s %b"#);
    }

    #[test]
    fn test_compile_reports_unknown_directive() {
        let config = ParserConfig {
            format: "%h %Z".to_string(),
            ..Default::default()
        };
        let err = compile(&config).unwrap_err();
        assert!(err.to_string().contains("%Z"), "unexpected error: {}", err);
    }
}
