use tracing::trace;

use super::compiler::CompiledFormat;
use super::model::{ExtractError, Value};
use super::traits::Sink;
use super::MAX_LINE_SIZE;

/// Applies a compiled format to raw lines and writes the typed fields to a sink.
///
/// Holds only a borrowed format and the sink's column indices, so each worker
/// can bind its own extractor and sink to one shared [`CompiledFormat`].
#[derive(Debug, Clone)]
pub struct LineExtractor<'a> {
    format: &'a CompiledFormat,
    columns: Vec<usize>,
    max_line_size: usize,
}

impl<'a> LineExtractor<'a> {
    /// Declare one sink column per schema element.
    pub fn bind<S: Sink + ?Sized>(format: &'a CompiledFormat, sink: &mut S) -> Self {
        let columns = format
            .column_names()
            .iter()
            .zip(format.schema())
            .map(|(name, field)| sink.declare_column(name, field.output_type()))
            .collect();

        Self {
            format,
            columns,
            max_line_size: MAX_LINE_SIZE,
        }
    }

    pub fn with_max_line_size(mut self, max_line_size: usize) -> Self {
        self.max_line_size = max_line_size;
        self
    }

    pub fn columns(&self) -> &[usize] {
        &self.columns
    }

    /// Extract one raw line. A trailing `\r` is ignored.
    pub fn extract<S: Sink + ?Sized>(&self, raw: &[u8], sink: &mut S) -> Result<(), ExtractError> {
        if raw.len() > self.max_line_size {
            return Err(ExtractError::LineTooLarge(raw.len(), self.max_line_size));
        }

        let text = std::str::from_utf8(raw).map_err(|_| ExtractError::NonUtf8)?;
        self.extract_str(text.strip_suffix('\r').unwrap_or(text), sink)
    }

    /// Extract one line of text.
    ///
    /// Every field is parsed before any is written, so a failing line leaves
    /// the sink untouched.
    pub fn extract_str<S: Sink + ?Sized>(&self, line: &str, sink: &mut S) -> Result<(), ExtractError> {
        let caps = self.format.regex().captures(line).ok_or_else(|| {
            trace!(line = %line, "line does not match format");
            ExtractError::NoMatch
        })?;

        let values = self
            .format
            .schema()
            .iter()
            .enumerate()
            .map(|(index, field)| {
                let raw = caps.get(index + 1).map_or("", |m| m.as_str());
                field.parse(raw).map_err(|source| ExtractError::Field {
                    index,
                    field: field.name().to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<Value>, _>>()?;

        for ((field, column), value) in self.format.schema().iter().zip(&self.columns).zip(&values) {
            field.write(sink, *column, value);
        }
        Ok(())
    }
}
