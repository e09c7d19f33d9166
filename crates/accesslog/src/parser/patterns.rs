//! Sub-patterns used to match one field's raw text inside a log line.
//!
//! Every constant holds exactly one capturing group; inner grouping must be
//! non-capturing so that capture group `i` keeps mapping to schema column `i - 1`.

/// Any run of characters except a double quote, as short as the rest of
/// the line allows so that following space-separated fields keep their text.
pub const ANY: &str = r#"([^"]*?)"#;

/// A single whitespace-free token (`-` included).
pub const NON_SPACE: &str = r"(\S*)";

/// IPv4 dotted quad or an IPv6 literal.
pub const IP_ADDRESS: &str = r"((?:[0-9]{1,3}\.){3}[0-9]{1,3}|[0-9A-Fa-f]*:[0-9A-Fa-f:.]+)";

/// Decimal digits, or the `-` placeholder Apache writes for a missing number.
pub const INTEGER: &str = r"(-|[0-9]+)";

/// Three-digit HTTP status, or `-`.
pub const STATUS: &str = r"([0-9]{3}|-)";

/// Request method token.
pub const METHOD: &str = r"([A-Z]+|-)";

/// Query string including its leading `?`; empty when the request had none.
pub const QUERY: &str = r#"((?:\?[^\s"]*)?)"#;

/// URL path without query string.
pub const PATH: &str = r#"(/[^\s"?]*|-)"#;

/// Connection status at response completion: aborted, keep-alive, or closed.
pub const CONN_STATUS: &str = r"([X+\-])";

/// Matching rule for the `%%` directive.
///
/// Apache writes a bare `%` for it. Kept as a separate constant because the
/// escape this directive is supposed to match is not settled.
pub const LITERAL_PERCENT: &str = r"(%)";

/// Apache's default `%t` rendering, either inside a balanced `[...]` pair or
/// bare. The brackets are part of the capture; the time field drops them.
pub const BRACKETED_TIME: &str = r"(\[[^\[\]]+\]|[^\[\]]+)";

/// Unsigned epoch value for `%{sec}t` and friends.
pub const EPOCH: &str = r"([0-9]+)";
