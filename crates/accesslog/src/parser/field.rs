use std::fmt;
use std::sync::Arc;

use super::model::{FieldError, FieldType, Value};
use super::timestamp::TimestampFormat;
use super::traits::{Sink, TimestampParser};

/// Per-type parse behaviour of a field.
#[derive(Clone)]
pub enum FieldKind {
    String,
    Integer,
    Timestamp {
        format: TimestampFormat,
        parser: Arc<dyn TimestampParser>,
    },
}

impl fmt::Debug for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::String => f.write_str("String"),
            FieldKind::Integer => f.write_str("Integer"),
            FieldKind::Timestamp { format, .. } => {
                f.debug_struct("Timestamp").field("format", format).finish()
            }
        }
    }
}

/// One schema column: the sub-pattern that matches its raw text, and how
/// that text becomes a typed value.
#[derive(Debug, Clone)]
pub struct FieldExtractor {
    name: String,
    sub_pattern: String,
    kind: FieldKind,
}

impl FieldExtractor {
    pub fn string(name: impl Into<String>, sub_pattern: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sub_pattern: sub_pattern.into(),
            kind: FieldKind::String,
        }
    }

    pub fn integer(name: impl Into<String>, sub_pattern: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sub_pattern: sub_pattern.into(),
            kind: FieldKind::Integer,
        }
    }

    pub fn timestamp(
        name: impl Into<String>,
        format: TimestampFormat,
        parser: Arc<dyn TimestampParser>,
    ) -> Self {
        Self {
            name: name.into(),
            sub_pattern: format.sub_pattern(),
            kind: FieldKind::Timestamp { format, parser },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sub_pattern(&self) -> &str {
        &self.sub_pattern
    }

    pub fn output_type(&self) -> FieldType {
        match self.kind {
            FieldKind::String => FieldType::String,
            FieldKind::Integer => FieldType::Integer,
            FieldKind::Timestamp { .. } => FieldType::Timestamp,
        }
    }

    /// Convert matched text into this field's typed value.
    ///
    /// Integer fields read `-` and the empty string as `Value::Null`.
    pub fn parse(&self, raw: &str) -> Result<Value, FieldError> {
        match &self.kind {
            FieldKind::String => Ok(Value::String(raw.to_string())),
            FieldKind::Integer => {
                if raw.is_empty() || raw == "-" {
                    return Ok(Value::Null);
                }
                raw.parse::<i64>()
                    .map(Value::Integer)
                    .map_err(|_| FieldError::MalformedInteger(raw.to_string()))
            }
            FieldKind::Timestamp { format, parser } => parser
                .parse(format, format.strip(raw))
                .map(Value::Timestamp)
                .map_err(|reason| FieldError::MalformedTimestamp {
                    raw: raw.to_string(),
                    reason,
                }),
        }
    }

    pub fn write<S: Sink + ?Sized>(&self, sink: &mut S, column: usize, value: &Value) {
        match value {
            Value::Null => sink.write_null(column),
            Value::String(s) => sink.write_string(column, s),
            Value::Integer(i) => sink.write_integer(column, *i),
            Value::Timestamp(ts) => sink.write_timestamp(column, *ts),
        }
    }
}
