use chrono::{DateTime, Utc};

pub use super::model::{CompileError, ExtractError, FieldError, FieldType, Value};
pub use super::timestamp::TimestampFormat;

/// Receives typed field values, one column at a time.
///
/// `declare_column` is called once per schema element before any line is
/// processed; the returned index is what later `write_*` calls address.
pub trait Sink {
    fn declare_column(&mut self, name: &str, field_type: FieldType) -> usize;

    fn write_null(&mut self, column: usize);
    fn write_string(&mut self, column: usize, value: &str);
    fn write_integer(&mut self, column: usize, value: i64);
    fn write_timestamp(&mut self, column: usize, value: DateTime<Utc>);
}

/// Converts the raw text of a time field into an instant.
#[cfg_attr(test, mockall::automock)]
pub trait TimestampParser: Send + Sync {
    /// Returns the reason as an error string when `raw` does not fit `format`.
    fn parse(&self, format: &TimestampFormat, raw: &str) -> Result<DateTime<Utc>, String>;
}
