//! Run: stream lines through a compiled format and emit JSON records.

use std::io::{BufRead, Write};
use std::time::Instant;
use thiserror::Error;
use tracing::{info, warn};

use crate::conf::ParserConfig;
use crate::parser::{
    CompiledFormat, ExtractError, ExtractionMetrics, LineExtractor, MetricsSnapshot, RecordSink,
};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode record: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Line {line}: {source}")]
    InvalidRecord {
        line: u64,
        #[source]
        source: ExtractError,
    },
}

/// Extract every line of `reader` and write one JSON object per record to `writer`.
///
/// Blank lines are skipped without being counted. A line that fails to
/// extract is logged and skipped, or ends the run when
/// `stop_on_invalid_record` is set.
pub fn run<R: BufRead, W: Write>(
    format: &CompiledFormat,
    config: &ParserConfig,
    mut reader: R,
    mut writer: W,
) -> Result<MetricsSnapshot, RunError> {
    let metrics = ExtractionMetrics::new();
    let mut sink = RecordSink::new();
    let extractor = LineExtractor::bind(format, &mut sink).with_max_line_size(config.max_line_size);

    let mut buf = Vec::new();
    let mut line_no: u64 = 0;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        line_no += 1;

        let line = buf.strip_suffix(b"\n").unwrap_or(&buf[..]);
        if line.is_empty() || line == b"\r" {
            continue;
        }

        let start = Instant::now();
        match extractor.extract(line, &mut sink) {
            Ok(()) => {
                metrics.record_success(start.elapsed().as_nanos() as u64);
                serde_json::to_writer(&mut writer, &sink.take_record())?;
                writer.write_all(b"\n")?;
            }
            Err(e) => {
                metrics.record_error(&e);
                if config.stop_on_invalid_record {
                    return Err(RunError::InvalidRecord { line: line_no, source: e });
                }
                warn!(line = line_no, error = %e, "Skipping invalid record");
            }
        }
    }

    writer.flush()?;
    let summary = metrics.snapshot();
    info!(
        "Processed {} lines: {} extracted, {} skipped",
        summary.lines,
        summary.extracted,
        summary.failed()
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const INPUT: &str = concat!(
        "127.0.0.1 - frank [10/Oct/2000:13:55:36 -0700] \"GET /apache_pb.gif HTTP/1.0\" 200 2326\n",
        "not an access log line\n",
        "\n",
        "10.1.2.3 - - [11/Oct/2000:08:00:00 +0000] \"POST /login HTTP/1.1\" 302 -\r\n",
    );

    fn common() -> CompiledFormat {
        let config = ParserConfig::default();
        CompiledFormat::compile(config.resolved_format()).unwrap()
    }

    #[test]
    fn test_run_skips_invalid_lines() {
        let format = common();
        let mut out = Vec::new();

        let summary = run(&format, &ParserConfig::default(), Cursor::new(INPUT), &mut out).unwrap();
        assert_eq!(summary.lines, 3);
        assert_eq!(summary.extracted, 2);
        assert_eq!(summary.no_match, 1);

        let text = String::from_utf8(out).unwrap();
        let records: Vec<serde_json::Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["remote-host"], "127.0.0.1");
        assert_eq!(records[0]["request-user"], "frank");
        assert_eq!(records[0]["request-time"], "2000-10-10T20:55:36Z");
        assert_eq!(records[0]["response-status"], 200);
        assert_eq!(records[1]["request-line"], "POST /login HTTP/1.1");
        assert!(records[1]["response-bytes"].is_null());
    }

    #[test]
    fn test_run_stops_on_invalid_record() {
        let format = common();
        let config = ParserConfig {
            stop_on_invalid_record: true,
            ..Default::default()
        };
        let mut out = Vec::new();

        let err = run(&format, &config, Cursor::new(INPUT), &mut out).unwrap_err();
        assert!(matches!(err, RunError::InvalidRecord { line: 2, source: ExtractError::NoMatch }));
        // The first record was already written.
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 1);
    }

    #[test]
    fn test_run_counts_oversized_lines() {
        let format = common();
        let config = ParserConfig {
            max_line_size: 16,
            ..Default::default()
        };

        let summary = run(&format, &config, Cursor::new(INPUT), std::io::sink()).unwrap();
        assert_eq!(summary.lines_too_large, 3);
        assert_eq!(summary.extracted, 0);
    }

    #[test]
    fn test_run_empty_input() {
        let summary = run(&common(), &ParserConfig::default(), Cursor::new(""), std::io::sink()).unwrap();
        assert_eq!(summary.lines, 0);
        assert_eq!(summary.success_rate, 1.0);
    }
}
