use thiserror::Error;
use serde::Serialize;
use chrono::{DateTime, Utc};


/// Output type of a schema column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String,
    Integer,
    Timestamp,
}

/// A typed value produced by a field extractor.
///
/// Serializes untagged: `Null` as JSON null, timestamps as RFC 3339 strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    String(String),
    Integer(i64),
    Timestamp(DateTime<Utc>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

/// Configuration-time failures. A format that fails to compile exposes no schema.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("Unknown log format key {directive} at offset {offset}")]
    UnknownKey { directive: String, offset: usize },

    #[error("Malformed directive at offset {offset}")]
    MalformedDirective { offset: usize },

    #[error("Invalid timestamp format '{format}': {reason}")]
    InvalidTimestampFormat { format: String, reason: String },

    #[error("Line pattern has {groups} capture groups for {fields} fields")]
    GroupCountMismatch { groups: usize, fields: usize },

    #[error("Invalid line pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// A matched field whose text could not be converted to its output type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("Malformed integer: '{0}'")]
    MalformedInteger(String),

    #[error("Malformed timestamp '{raw}': {reason}")]
    MalformedTimestamp { raw: String, reason: String },
}

/// Row-level failures. Each one is isolated to the line that produced it.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Line too large: {0} bytes (max: {1} bytes)")]
    LineTooLarge(usize, usize),

    #[error("Non-UTF8 content")]
    NonUtf8,

    #[error("Line does not match format")]
    NoMatch,

    #[error("Field {index} ({field}): {source}")]
    Field {
        index: usize,
        field: String,
        #[source]
        source: FieldError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_value_serializes_untagged() {
        let ts = Utc.with_ymd_and_hms(2023, 10, 10, 13, 55, 36).unwrap();
        let values = vec![
            Value::Null,
            Value::String("GET".to_string()),
            Value::Integer(200),
            Value::Timestamp(ts),
        ];
        let json = serde_json::to_string(&values).unwrap();
        assert_eq!(json, r#"[null,"GET",200,"2023-10-10T13:55:36Z"]"#);
    }

    #[test]
    fn test_field_error_message_names_field() {
        let err = ExtractError::Field {
            index: 5,
            field: "response-status".to_string(),
            source: FieldError::MalformedInteger("2x0".to_string()),
        };
        assert_eq!(err.to_string(), "Field 5 (response-status): Malformed integer: '2x0'");
    }
}
