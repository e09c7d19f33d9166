//! Format compiler.
//!
//! Rewrites a format string into one line pattern by splicing each directive
//! occurrence out for its field's sub-pattern, and escaping literal text in
//! the same pass. Splices are applied left to right on the progressively
//! rewritten string, with a running offset absorbing the length change of
//! every earlier splice.

use std::ops::Range;
use std::sync::Arc;

use regex::Regex;
use tracing::debug;

use super::directive::scan;
use super::field::FieldExtractor;
use super::model::CompileError;
use super::registry::DirectiveRegistry;
use super::traits::TimestampParser;

/// Replace `span` of the original format string with `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Splice {
    pub span: Range<usize>,
    pub text: String,
}

/// Apply non-overlapping splices, sorted by start, to `format`.
pub fn apply_splices(format: &str, splices: &[Splice]) -> String {
    let (pattern, _) = splices.iter().fold(
        (format.to_string(), 0isize),
        |(mut rewritten, offset), splice| {
            let start = (splice.span.start as isize + offset) as usize;
            let end = (splice.span.end as isize + offset) as usize;
            rewritten.replace_range(start..end, &splice.text);
            let drift = splice.text.len() as isize - splice.span.len() as isize;
            (rewritten, offset + drift)
        },
    );
    pattern
}

/// Ordered schema plus the line pattern whose capture group `i` feeds
/// schema element `i - 1`.
#[derive(Debug, Clone)]
pub struct CompiledFormat {
    format: String,
    schema: Vec<FieldExtractor>,
    pattern: String,
    regex: Regex,
}

impl CompiledFormat {
    /// Compile with the default timestamp parser (UTC for offset-less times).
    pub fn compile(format: &str) -> Result<Self, CompileError> {
        Compiler::default().compile(format)
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn schema(&self) -> &[FieldExtractor] {
        &self.schema
    }

    /// The rewritten format string, unanchored.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The line pattern compiled to match a whole line.
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    pub fn len(&self) -> usize {
        self.schema.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schema.is_empty()
    }

    /// Column names for a sink.
    ///
    /// The first occurrence of a field name is used as is; later duplicates
    /// get `_2`, `_3`, ... in left-to-right order.
    pub fn column_names(&self) -> Vec<String> {
        let mut seen: Vec<(&str, usize)> = Vec::new();
        self.schema
            .iter()
            .map(|field| {
                let name = field.name();
                match seen.iter_mut().find(|(n, _)| *n == name) {
                    Some((_, count)) => {
                        *count += 1;
                        format!("{}_{}", name, count)
                    }
                    None => {
                        seen.push((name, 1));
                        name.to_string()
                    }
                }
            })
            .collect()
    }
}

#[derive(Clone, Default)]
pub struct Compiler {
    registry: DirectiveRegistry,
}

impl Compiler {
    pub fn new(timestamps: Arc<dyn TimestampParser>) -> Self {
        Self {
            registry: DirectiveRegistry::new(timestamps),
        }
    }

    /// Compile `format` into a schema and line pattern.
    ///
    /// Fails on the first unresolvable directive; nothing is returned for a
    /// partially compiled format.
    pub fn compile(&self, format: &str) -> Result<CompiledFormat, CompileError> {
        let scanned = scan(format)?;

        let schema = scanned
            .directives
            .iter()
            .map(|directive| self.registry.resolve(directive, format))
            .collect::<Result<Vec<_>, _>>()?;

        let mut splices: Vec<Splice> = scanned
            .directives
            .iter()
            .zip(&schema)
            .map(|(directive, field)| Splice {
                span: directive.span.clone(),
                text: field.sub_pattern().to_string(),
            })
            .chain(scanned.literals.iter().filter_map(|literal| {
                let text = &format[literal.span.clone()];
                let escaped = regex::escape(text);
                (escaped != text).then(|| Splice {
                    span: literal.span.clone(),
                    text: escaped,
                })
            }))
            .collect();
        splices.sort_by_key(|splice| splice.span.start);

        let pattern = apply_splices(format, &splices);
        let regex = Regex::new(&format!("^(?:{})$", pattern))?;

        if regex.captures_len() != schema.len() + 1 {
            return Err(CompileError::GroupCountMismatch {
                groups: regex.captures_len() - 1,
                fields: schema.len(),
            });
        }

        debug!(fields = schema.len(), pattern = %pattern, "compiled log format");

        Ok(CompiledFormat {
            format: format.to_string(),
            schema,
            pattern,
            regex,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::model::FieldType;
    use crate::parser::registry::{DirectiveRegistry, DIRECTIVES};

    const COMMON: &str = r#"%h %l %u [%t] "%r" %s %b"#;

    #[test]
    fn test_apply_splices_tracks_offset() {
        let splices = vec![
            Splice { span: 0..2, text: "AAAA".to_string() },
            Splice { span: 3..5, text: "B".to_string() },
            Splice { span: 6..8, text: "CCC".to_string() },
        ];
        assert_eq!(apply_splices("%h %l %u", &splices), "AAAA B CCC");
    }

    #[test]
    fn test_schema_matches_capture_groups() {
        let compiled = CompiledFormat::compile(COMMON).unwrap();
        assert_eq!(compiled.len(), 7);
        assert_eq!(compiled.regex().captures_len(), compiled.len() + 1);

        let names: Vec<&str> = compiled.schema().iter().map(|f| f.name()).collect();
        assert_eq!(
            names,
            vec![
                "remote-host",
                "remote-log-name",
                "request-user",
                "request-time",
                "request-line",
                "response-status",
                "response-bytes",
            ]
        );
    }

    #[test]
    fn test_group_order_follows_directive_order() {
        let compiled = CompiledFormat::compile("%s:%b:%p").unwrap();
        let caps = compiled.regex().captures("404:512:8080").unwrap();
        assert_eq!(&caps[1], "404");
        assert_eq!(&caps[2], "512");
        assert_eq!(&caps[3], "8080");
        assert_eq!(compiled.schema()[2].name(), "request-port");
    }

    #[test]
    fn test_literal_pass_through() {
        let format = "GET /health (ok) [1+1] $";
        let compiled = CompiledFormat::compile(format).unwrap();
        assert!(compiled.is_empty());
        assert_eq!(compiled.regex().captures_len(), 1);
        assert!(compiled.regex().is_match(format));
        assert!(!compiled.regex().is_match("GET /health ok [1+1] $"));
    }

    #[test]
    fn test_literal_without_metacharacters_is_unchanged() {
        let compiled = CompiledFormat::compile("plain text").unwrap();
        assert_eq!(compiled.pattern(), "plain text");
    }

    #[test]
    fn test_unknown_key_fails_closed() {
        let err = CompiledFormat::compile("%h %Z").unwrap_err();
        assert!(matches!(err, CompileError::UnknownKey { ref directive, .. } if directive == "%Z"));
        assert!(err.to_string().contains("Unknown log format key"));
    }

    #[test]
    fn test_every_directive_compiles_alone() {
        let registry = DirectiveRegistry::default();
        for entry in DIRECTIVES {
            let format = format!("%{}", entry.key);
            let compiled = Compiler { registry: registry.clone() }.compile(&format).unwrap();
            assert_eq!(compiled.len(), 1, "directive {}", format);
            assert_eq!(compiled.regex().captures_len(), 2, "directive {}", format);
        }
    }

    #[test]
    fn test_directive_round_trip() {
        // (format, accepted raw value, rejected raw value)
        let cases = [
            ("%a", "192.168.0.1", "example.com"),
            ("%A", "::1", "not-an-ip"),
            ("%b", "2326", "12kb"),
            ("%B", "0", "-1"),
            ("%{session}C", "abc123", "a\"b"),
            ("%D", "1500", "1.5"),
            ("%{PATH}e", "/usr/bin", "\"quoted\""),
            ("%f", "/var/www/index.html", "x\"y"),
            ("%h", "client.example.com", "a\"b"),
            ("%H", "HTTP/1.1", "HTTP 1.1"),
            ("%{Referer}i", "https://example.com/", "\""),
            ("%l", "-", "two words"),
            ("%m", "GET", "get"),
            ("%{note}n", "value", "\""),
            ("%{Content-Type}o", "text/html", "\""),
            ("%p", "443", "https"),
            ("%P", "1234", "pid"),
            ("%q", "?id=7", "id=7"),
            ("%r", "GET / HTTP/1.1", "GET \"/\""),
            ("%s", "200", "2000"),
            ("%t", "[10/Oct/2023:13:55:36 +0000]", "[10/Oct]2023]"),
            ("%t", "10/Oct/2023:13:55:36 +0000", "[10/Oct/2023:13:55:36 +0000"),
            ("%{%Y-%m-%d}t", "2023-10-10", "10/Oct/2023"),
            ("%{sec}t", "1696946136", "1696946136.5"),
            ("%T", "2", "2s"),
            ("%u", "frank", "\"frank\""),
            ("%U", "/index.html", "index.html"),
            ("%v", "www.example.com", "www example"),
            ("%V", "example.com", "a b"),
            ("%X", "+", "ok"),
            ("%I", "512", "x"),
            ("%O", "1024", "x"),
            ("%%", "%", "%%"),
            // Only ASCII digits count as numbers.
            ("%b", "23", "\u{662}\u{663}"),
            ("%s", "200", "\u{662}\u{660}\u{660}"),
            ("%{sec}t", "1696946136", "\u{661}\u{666}\u{669}\u{666}"),
        ];

        for (format, accepted, rejected) in cases {
            let compiled = CompiledFormat::compile(format).unwrap();
            assert_eq!(compiled.len(), 1, "{}", format);
            assert!(compiled.regex().is_match(accepted), "{} should accept {:?}", format, accepted);
            assert!(!compiled.regex().is_match(rejected), "{} should reject {:?}", format, rejected);
        }
    }

    #[test]
    fn test_literal_percent_pattern() {
        // The matching rule for `%%` is a configuration point; this pins the current choice.
        let compiled = CompiledFormat::compile("%s %%").unwrap();
        assert_eq!(compiled.pattern(), r"([0-9]{3}|-) (%)");
        assert_eq!(compiled.schema()[1].output_type(), FieldType::String);
    }

    #[test]
    fn test_duplicate_field_names_are_kept() {
        let compiled = CompiledFormat::compile(r#""%{Referer}i" "%{User-Agent}i" "%{Host}i""#).unwrap();
        assert_eq!(compiled.len(), 3);
        assert!(compiled.schema().iter().all(|f| f.name() == "request-header"));
        assert_eq!(
            compiled.column_names(),
            vec!["request-header", "request-header_2", "request-header_3"]
        );
    }

    #[test]
    fn test_time_format_error_aborts_compilation() {
        assert!(matches!(
            CompiledFormat::compile("%h %{%Q}t"),
            Err(CompileError::InvalidTimestampFormat { .. })
        ));
        assert!(matches!(
            CompiledFormat::compile("%h %{%H:%M:%S}t"),
            Err(CompileError::InvalidTimestampFormat { .. })
        ));
    }
}
