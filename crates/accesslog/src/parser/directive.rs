//! Directive grammar.
//!
//! ```text
//! %[!][NNN[,NNN]*][<|>][{parameter}]K
//!  |   |           |     |           |- key: one letter, or `%`
//!  |   |           |     |------------- optional parameter
//!  |   |           |------------------- original/final request position
//!  |   |------------------------------- status code filter
//!  |----------------------------------- inverts the status code filter
//! ```
//!
//! Status filters, the inverse marker and position markers are parsed and
//! carried on [`DirectiveMatch`] but nothing acts on them yet.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use super::model::CompileError;

static DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"%(?:(?P<inverse>!)?(?P<statuses>[0-9]{3}(?:,[0-9]{3})*))?(?P<position>[<>])?(?:\{(?P<parameter>[^}]+)\})?(?P<key>[A-Za-z%])",
    )
    .expect("directive grammar is a valid regex")
});

/// Which request a directive refers to when the request was internally redirected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Original,
    Final,
}

/// One directive occurrence in a format string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveMatch {
    pub key: char,
    pub parameter: Option<String>,
    pub inverse: bool,
    pub statuses: Vec<u16>,
    pub position: Option<Position>,
    /// Byte range in the original format string.
    pub span: Range<usize>,
}

impl DirectiveMatch {
    /// The directive as written, e.g. `%{Referer}i`.
    pub fn text<'a>(&self, format: &'a str) -> &'a str {
        &format[self.span.clone()]
    }
}

/// A run of literal text between directives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Literal {
    pub span: Range<usize>,
}

/// A format string split into directives and the literal text around them.
#[derive(Debug, Clone, Default)]
pub struct Scanned {
    pub directives: Vec<DirectiveMatch>,
    pub literals: Vec<Literal>,
}

/// Split `format` into directives and literals, left to right.
///
/// A `%` inside literal text that does not start a valid directive is
/// reported as [`CompileError::MalformedDirective`].
pub fn scan(format: &str) -> Result<Scanned, CompileError> {
    let mut scanned = Scanned::default();
    let mut cursor = 0;

    for caps in DIRECTIVE.captures_iter(format) {
        let (Some(whole), Some(key)) = (caps.get(0), caps.name("key").and_then(|m| m.as_str().chars().next())) else {
            continue;
        };
        push_literal(format, cursor..whole.start(), &mut scanned.literals)?;
        cursor = whole.end();

        let statuses = caps
            .name("statuses")
            .map(|m| m.as_str().split(',').filter_map(|s| s.parse().ok()).collect::<Vec<u16>>())
            .unwrap_or_default();
        let position = caps.name("position").map(|m| match m.as_str() {
            "<" => Position::Original,
            _ => Position::Final,
        });

        scanned.directives.push(DirectiveMatch {
            key,
            parameter: caps.name("parameter").map(|m| m.as_str().to_string()),
            inverse: caps.name("inverse").is_some(),
            statuses,
            position,
            span: whole.range(),
        });
    }

    push_literal(format, cursor..format.len(), &mut scanned.literals)?;
    Ok(scanned)
}

fn push_literal(format: &str, span: Range<usize>, literals: &mut Vec<Literal>) -> Result<(), CompileError> {
    if span.is_empty() {
        return Ok(());
    }
    if let Some(i) = format[span.clone()].find('%') {
        return Err(CompileError::MalformedDirective { offset: span.start + i });
    }
    literals.push(Literal { span });
    Ok(())
}
