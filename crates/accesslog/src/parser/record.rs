use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use super::model::{FieldType, Value};
use super::traits::Sink;

/// One extracted line: column names and values in schema order.
///
/// Serializes as a JSON object whose keys keep column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.fields.iter().map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for Record {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// In-memory sink holding the row currently being written.
///
/// Unwritten columns read as `Value::Null`; [`RecordSink::take_record`]
/// hands the row out and starts a fresh one.
#[derive(Debug, Clone, Default)]
pub struct RecordSink {
    columns: Vec<(String, FieldType)>,
    row: Vec<Value>,
}

impl RecordSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn columns(&self) -> &[(String, FieldType)] {
        &self.columns
    }

    pub fn take_record(&mut self) -> Record {
        let row = std::mem::replace(&mut self.row, vec![Value::Null; self.columns.len()]);
        Record {
            fields: self
                .columns
                .iter()
                .map(|(name, _)| name.clone())
                .zip(row)
                .collect(),
        }
    }

    fn set(&mut self, column: usize, value: Value) {
        if let Some(slot) = self.row.get_mut(column) {
            *slot = value;
        }
    }
}

impl Sink for RecordSink {
    fn declare_column(&mut self, name: &str, field_type: FieldType) -> usize {
        self.columns.push((name.to_string(), field_type));
        self.row.push(Value::Null);
        self.columns.len() - 1
    }

    fn write_null(&mut self, column: usize) {
        self.set(column, Value::Null);
    }

    fn write_string(&mut self, column: usize, value: &str) {
        self.set(column, Value::String(value.to_string()));
    }

    fn write_integer(&mut self, column: usize, value: i64) {
        self.set(column, Value::Integer(value));
    }

    fn write_timestamp(&mut self, column: usize, value: DateTime<Utc>) {
        self.set(column, Value::Timestamp(value));
    }
}
