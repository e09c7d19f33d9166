//! Apache-style custom log format compilation and line extraction
//!
//! # Architecture
//!
//! - `directive.rs`: directive grammar scanner
//! - `registry.rs`: directive key -> field extractor table
//! - `field.rs`: typed field extractors (string, integer, timestamp)
//! - `timestamp.rs`: time formats and the default timestamp parser
//! - `compiler.rs`: format string -> schema + line pattern
//! - `pipeline.rs`: line pattern application and sink writes
//! - `record.rs`: in-memory sink producing JSON-serializable records
//! - `metrics.rs`: extraction counters
//!
//! A compiled format is immutable and can be shared by any number of
//! workers, each with its own sink.

pub mod traits;
pub mod model;
pub mod patterns;
pub mod directive;
pub mod registry;
pub mod timestamp;
pub mod field;
pub mod compiler;
pub mod pipeline;
pub mod record;
pub mod metrics;

// Re-export commonly used types
pub use traits::{Sink, TimestampParser};
pub use model::{CompileError, ExtractError, FieldError, FieldType, Value};
pub use field::FieldExtractor;
pub use compiler::{CompiledFormat, Compiler};
pub use pipeline::LineExtractor;
pub use record::{Record, RecordSink};
pub use timestamp::{ChronoTimestampParser, TimestampFormat};
pub use metrics::{ExtractionMetrics, MetricsSnapshot};

// Constants
pub const MAX_LINE_SIZE: usize = 1_048_576; // 1MB
