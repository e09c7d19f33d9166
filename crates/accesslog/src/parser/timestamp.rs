//! Time field formats and the default chrono-backed timestamp parser.
//!
//! `%t` takes an optional parameter. Without one the field holds Apache's
//! common log time. With one it is either a strftime format, optionally
//! prefixed by `begin:`/`end:`, or one of the epoch keywords `sec`, `msec`,
//! `usec`.

use chrono::format::{Fixed, Item, Numeric, StrftimeItems};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};

use super::model::CompileError;
use super::patterns;
use super::traits::TimestampParser;

/// Apache's default `%t` layout, e.g. `10/Oct/2000:13:55:36 -0700`.
pub const COMMON_LOG_TIME: &str = "%d/%b/%Y:%H:%M:%S %z";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpochUnit {
    Seconds,
    Millis,
    Micros,
}

/// How the raw text of a time field is laid out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimestampFormat {
    /// The unparameterized `%t`; brackets around the value are optional.
    CommonLog,
    Strftime { format: String, has_offset: bool },
    Epoch(EpochUnit),
}

impl TimestampFormat {
    /// Interpret the `{...}` parameter of a `%t` directive.
    pub fn from_parameter(parameter: Option<&str>) -> Result<Self, CompileError> {
        let Some(parameter) = parameter else {
            return Ok(TimestampFormat::CommonLog);
        };

        let format = parameter
            .strip_prefix("begin:")
            .or_else(|| parameter.strip_prefix("end:"))
            .unwrap_or(parameter);

        match format {
            "sec" => Ok(TimestampFormat::Epoch(EpochUnit::Seconds)),
            "msec" => Ok(TimestampFormat::Epoch(EpochUnit::Millis)),
            "usec" => Ok(TimestampFormat::Epoch(EpochUnit::Micros)),
            "msec_frac" | "usec_frac" => Err(CompileError::InvalidTimestampFormat {
                format: parameter.to_string(),
                reason: "fractional second components are not timestamps".to_string(),
            }),
            "" => Err(CompileError::InvalidTimestampFormat {
                format: parameter.to_string(),
                reason: "empty format".to_string(),
            }),
            _ => {
                let invalid = |reason: &str| CompileError::InvalidTimestampFormat {
                    format: parameter.to_string(),
                    reason: reason.to_string(),
                };

                let mut fields = DateFields::default();
                for item in StrftimeItems::new(format) {
                    if matches!(item, Item::Error) {
                        return Err(invalid("unsupported strftime specifier"));
                    }
                    fields.add(&item);
                }

                if !fields.has_date() {
                    return Err(invalid("format does not identify a calendar date"));
                }
                if fields.offset && !fields.has_time() {
                    return Err(invalid("UTC offset given without a time of day"));
                }
                Ok(TimestampFormat::Strftime {
                    format: format.to_string(),
                    has_offset: fields.offset,
                })
            }
        }
    }

    /// The part of a matched value that holds the time itself. Common log
    /// captures may carry their surrounding brackets.
    pub fn strip<'a>(&self, raw: &'a str) -> &'a str {
        match self {
            TimestampFormat::CommonLog => raw
                .strip_prefix('[')
                .and_then(|inner| inner.strip_suffix(']'))
                .unwrap_or(raw),
            _ => raw,
        }
    }

    /// Sub-pattern matching text in this format, with a single capture group.
    pub fn sub_pattern(&self) -> String {
        match self {
            TimestampFormat::CommonLog => patterns::BRACKETED_TIME.to_string(),
            TimestampFormat::Epoch(_) => patterns::EPOCH.to_string(),
            TimestampFormat::Strftime { format, .. } => {
                let mut pattern = String::from("(");
                for item in StrftimeItems::new(format) {
                    pattern.push_str(&item_pattern(&item));
                }
                pattern.push(')');
                pattern
            }
        }
    }
}

/// Which parts of an instant a strftime format supplies.
#[derive(Debug, Default)]
struct DateFields {
    year: bool,
    month: bool,
    day: bool,
    ordinal: bool,
    hour: bool,
    minute: bool,
    epoch: bool,
    complete: bool,
    offset: bool,
}

impl DateFields {
    fn add(&mut self, item: &Item<'_>) {
        match item {
            Item::Numeric(numeric, _) => match numeric {
                Numeric::Year | Numeric::YearMod100 => self.year = true,
                Numeric::Month => self.month = true,
                Numeric::Day => self.day = true,
                Numeric::Ordinal => self.ordinal = true,
                Numeric::Hour | Numeric::Hour12 => self.hour = true,
                Numeric::Minute => self.minute = true,
                Numeric::Timestamp => self.epoch = true,
                _ => {}
            },
            Item::Fixed(fixed) => match fixed {
                Fixed::ShortMonthName | Fixed::LongMonthName => self.month = true,
                Fixed::RFC2822 | Fixed::RFC3339 => {
                    self.complete = true;
                    self.offset = true;
                }
                f if is_offset(f) => self.offset = true,
                _ => {}
            },
            _ => {}
        }
    }

    /// Year with month and day, year with day of year, or an epoch.
    fn has_date(&self) -> bool {
        self.complete || self.epoch || (self.year && (self.ordinal || (self.month && self.day)))
    }

    fn has_time(&self) -> bool {
        self.complete || self.epoch || (self.hour && self.minute)
    }
}

fn is_offset(fixed: &Fixed) -> bool {
    matches!(
        fixed,
        Fixed::TimezoneOffset
            | Fixed::TimezoneOffsetColon
            | Fixed::TimezoneOffsetDoubleColon
            | Fixed::TimezoneOffsetTripleColon
            | Fixed::TimezoneOffsetColonZ
            | Fixed::TimezoneOffsetZ
            | Fixed::RFC2822
            | Fixed::RFC3339
    )
}

fn item_pattern(item: &Item<'_>) -> String {
    match item {
        Item::Literal(s) | Item::Space(s) => regex::escape(s),
        Item::OwnedLiteral(s) | Item::OwnedSpace(s) => regex::escape(s),
        Item::Numeric(_, _) => r"\s*[+-]?[0-9]+".to_string(),
        Item::Fixed(fixed) => match fixed {
            Fixed::ShortMonthName
            | Fixed::LongMonthName
            | Fixed::ShortWeekdayName
            | Fixed::LongWeekdayName => "[A-Za-z]+".to_string(),
            Fixed::LowerAmPm | Fixed::UpperAmPm => "[AaPp][Mm]".to_string(),
            Fixed::Nanosecond
            | Fixed::Nanosecond3
            | Fixed::Nanosecond6
            | Fixed::Nanosecond9 => r"(?:\.[0-9]+)?".to_string(),
            Fixed::TimezoneName => r"\S+".to_string(),
            f if is_offset(f) && !matches!(f, Fixed::RFC2822 | Fixed::RFC3339) => {
                r"(?:Z|[+-][0-9]{2}(?::?[0-9]{2}(?::?[0-9]{2})?)?)".to_string()
            }
            _ => ".+?".to_string(),
        },
        _ => ".+?".to_string(),
    }
}

/// Parse a UTC offset such as `UTC`, `Z`, `+09:00`, or `-0530`.
pub fn parse_offset(s: &str) -> Result<FixedOffset, String> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("utc") || s == "Z" {
        return FixedOffset::east_opt(0).ok_or_else(|| "zero offset".to_string());
    }

    let (sign, rest) = match s.as_bytes().first() {
        Some(b'+') => (1, &s[1..]),
        Some(b'-') => (-1, &s[1..]),
        _ => return Err(format!("timezone '{}' must be UTC or a +HH:MM offset", s)),
    };

    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(format!("timezone '{}' must be UTC or a +HH:MM offset", s));
    }

    let hours: i32 = digits[..2].parse().map_err(|_| format!("bad hours in '{}'", s))?;
    let minutes: i32 = digits[2..].parse().map_err(|_| format!("bad minutes in '{}'", s))?;
    if minutes >= 60 {
        return Err(format!("bad minutes in '{}'", s));
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
        .ok_or_else(|| format!("offset '{}' out of range", s))
}

/// Default timestamp parser.
///
/// Formats without a UTC offset are read as local time in `default_offset`.
#[derive(Debug, Clone)]
pub struct ChronoTimestampParser {
    default_offset: FixedOffset,
}

impl ChronoTimestampParser {
    pub fn new(default_offset: FixedOffset) -> Self {
        Self { default_offset }
    }

    fn parse_local(&self, format: &str, raw: &str) -> Result<DateTime<Utc>, String> {
        let naive = match NaiveDateTime::parse_from_str(raw, format) {
            Ok(naive) => naive,
            Err(_) => NaiveDate::parse_from_str(raw, format)
                .map_err(|e| e.to_string())?
                .and_hms_opt(0, 0, 0)
                .ok_or("invalid midnight")?,
        };
        self.default_offset
            .from_local_datetime(&naive)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(|| "ambiguous local time".to_string())
    }
}

impl Default for ChronoTimestampParser {
    fn default() -> Self {
        Self::new(Utc.fix())
    }
}

impl TimestampParser for ChronoTimestampParser {
    fn parse(&self, format: &TimestampFormat, raw: &str) -> Result<DateTime<Utc>, String> {
        match format {
            TimestampFormat::CommonLog => DateTime::parse_from_str(raw, COMMON_LOG_TIME)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| e.to_string()),
            TimestampFormat::Strftime { format, has_offset: true } => {
                DateTime::parse_from_str(raw, format)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|e| e.to_string())
            }
            TimestampFormat::Strftime { format, has_offset: false } => self.parse_local(format, raw),
            TimestampFormat::Epoch(unit) => {
                let value: i64 = raw.parse().map_err(|_| "not an epoch value".to_string())?;
                let micros = match unit {
                    EpochUnit::Seconds => value.checked_mul(1_000_000),
                    EpochUnit::Millis => value.checked_mul(1_000),
                    EpochUnit::Micros => Some(value),
                }
                .ok_or("epoch value out of range")?;
                DateTime::from_timestamp(
                    micros.div_euclid(1_000_000),
                    (micros.rem_euclid(1_000_000) * 1_000) as u32,
                )
                .ok_or_else(|| "epoch value out of range".to_string())
            }
        }
    }
}
