//! Field directive registry: a fixed table from directive key to the field it produces.

use std::sync::Arc;

use super::directive::DirectiveMatch;
use super::field::FieldExtractor;
use super::model::CompileError;
use super::patterns::*;
use super::timestamp::{ChronoTimestampParser, TimestampFormat};
use super::traits::TimestampParser;

/// Constructor shape of a directive; the string is the field's sub-pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Factory {
    Text(&'static str),
    Integer(&'static str),
    /// Sub-pattern comes from the directive's time format parameter.
    Timestamp,
}

#[derive(Debug, Clone, Copy)]
pub struct DirectiveEntry {
    pub key: char,
    pub field: &'static str,
    pub factory: Factory,
}

impl DirectiveEntry {
    const fn text(key: char, field: &'static str, pattern: &'static str) -> Self {
        Self { key, field, factory: Factory::Text(pattern) }
    }

    const fn integer(key: char, field: &'static str, pattern: &'static str) -> Self {
        Self { key, field, factory: Factory::Integer(pattern) }
    }

    /// Build the extractor for one occurrence of this directive.
    ///
    /// Only time fields interpret the parameter; header and environment
    /// names are accepted and ignored by the matcher.
    pub fn create(
        &self,
        parameter: Option<&str>,
        timestamps: &Arc<dyn TimestampParser>,
    ) -> Result<FieldExtractor, CompileError> {
        match self.factory {
            Factory::Text(pattern) => Ok(FieldExtractor::string(self.field, pattern)),
            Factory::Integer(pattern) => Ok(FieldExtractor::integer(self.field, pattern)),
            Factory::Timestamp => {
                let format = TimestampFormat::from_parameter(parameter)?;
                Ok(FieldExtractor::timestamp(self.field, format, Arc::clone(timestamps)))
            }
        }
    }
}

pub const DIRECTIVES: &[DirectiveEntry] = &[
    DirectiveEntry::text('a', "remote-ip", IP_ADDRESS),
    DirectiveEntry::text('A', "local-ip", IP_ADDRESS),
    DirectiveEntry::integer('b', "response-bytes", INTEGER),
    DirectiveEntry::integer('B', "response-bytes", INTEGER),
    DirectiveEntry::text('C', "request-cookie", ANY),
    DirectiveEntry::integer('D', "request-process-time-us", INTEGER),
    DirectiveEntry::text('e', "env", ANY),
    DirectiveEntry::text('f', "file-name", ANY),
    DirectiveEntry::text('h', "remote-host", ANY),
    DirectiveEntry::text('H', "request-protocol", NON_SPACE),
    DirectiveEntry::text('i', "request-header", ANY),
    DirectiveEntry::text('l', "remote-log-name", NON_SPACE),
    DirectiveEntry::text('m', "request-method", METHOD),
    DirectiveEntry::text('n', "module-note", ANY),
    DirectiveEntry::text('o', "response-header", ANY),
    DirectiveEntry::integer('p', "request-port", INTEGER),
    DirectiveEntry::integer('P', "request-process", INTEGER),
    DirectiveEntry::text('q', "request-query", QUERY),
    DirectiveEntry::text('r', "request-line", ANY),
    DirectiveEntry::integer('s', "response-status", STATUS),
    DirectiveEntry { key: 't', field: "request-time", factory: Factory::Timestamp },
    DirectiveEntry::integer('T', "request-process-time-s", INTEGER),
    DirectiveEntry::text('u', "request-user", ANY),
    DirectiveEntry::text('U', "request-path", PATH),
    DirectiveEntry::text('v', "request-server-name", NON_SPACE),
    DirectiveEntry::text('V', "canonical-server-name", NON_SPACE),
    DirectiveEntry::text('X', "connection-status", CONN_STATUS),
    DirectiveEntry::integer('I', "request-total-bytes", INTEGER),
    DirectiveEntry::integer('O', "response-total-bytes", INTEGER),
    DirectiveEntry::text('%', "%", LITERAL_PERCENT),
];

pub fn lookup(key: char) -> Option<&'static DirectiveEntry> {
    DIRECTIVES.iter().find(|entry| entry.key == key)
}

/// Resolves directive occurrences into field extractors, handing time
/// fields a shared timestamp parser.
#[derive(Clone)]
pub struct DirectiveRegistry {
    timestamps: Arc<dyn TimestampParser>,
}

impl DirectiveRegistry {
    pub fn new(timestamps: Arc<dyn TimestampParser>) -> Self {
        Self { timestamps }
    }

    pub fn resolve(&self, directive: &DirectiveMatch, format: &str) -> Result<FieldExtractor, CompileError> {
        let entry = lookup(directive.key).ok_or_else(|| CompileError::UnknownKey {
            directive: directive.text(format).to_string(),
            offset: directive.span.start,
        })?;
        entry.create(directive.parameter.as_deref(), &self.timestamps)
    }
}

impl Default for DirectiveRegistry {
    fn default() -> Self {
        Self::new(Arc::new(ChronoTimestampParser::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::directive::scan;
    use crate::parser::model::FieldType;
    use std::collections::HashSet;

    #[test]
    fn test_keys_are_unique() {
        let keys: HashSet<char> = DIRECTIVES.iter().map(|e| e.key).collect();
        assert_eq!(keys.len(), DIRECTIVES.len());
    }

    #[test]
    fn test_output_types() {
        let registry = DirectiveRegistry::default();
        let format = "%h %b %t %s %m";
        let scanned = scan(format).unwrap();
        let types: Vec<FieldType> = scanned
            .directives
            .iter()
            .map(|d| registry.resolve(d, format).unwrap().output_type())
            .collect();
        assert_eq!(
            types,
            vec![
                FieldType::String,
                FieldType::Integer,
                FieldType::Timestamp,
                FieldType::Integer,
                FieldType::String,
            ]
        );
    }

    #[test]
    fn test_shared_factory_shape() {
        let b = lookup('b').unwrap();
        let big_b = lookup('B').unwrap();
        assert_eq!(b.factory, big_b.factory);
        assert_eq!(lookup('I').unwrap().field, "request-total-bytes");
    }

    #[test]
    fn test_unknown_key() {
        let format = "%h %Z";
        let scanned = scan(format).unwrap();
        let err = DirectiveRegistry::default()
            .resolve(&scanned.directives[1], format)
            .unwrap_err();
        match err {
            CompileError::UnknownKey { directive, offset } => {
                assert_eq!(directive, "%Z");
                assert_eq!(offset, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_time_parameter_surfaces_at_construction() {
        let format = "%{%Q}t";
        let scanned = scan(format).unwrap();
        assert!(matches!(
            DirectiveRegistry::default().resolve(&scanned.directives[0], format),
            Err(CompileError::InvalidTimestampFormat { .. })
        ));
    }

    #[test]
    fn test_header_parameter_is_accepted() {
        let format = "%{User-Agent}i";
        let scanned = scan(format).unwrap();
        let field = DirectiveRegistry::default().resolve(&scanned.directives[0], format).unwrap();
        assert_eq!(field.name(), "request-header");
        assert_eq!(field.sub_pattern(), ANY);
    }
}
