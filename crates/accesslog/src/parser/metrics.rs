use std::sync::atomic::{AtomicU64, Ordering};
use serde::Serialize;

use super::model::ExtractError;

/// Forces the wrapped counters onto their own cache line so workers
/// updating different groups do not contend on one line.
#[repr(align(64))]
#[derive(Debug, Default)]
pub struct CacheAligned<T>(pub T);

/// Successful extractions (hottest path, updated per line)
#[derive(Debug, Default)]
pub struct TotalMetrics {
    pub lines: AtomicU64,
    pub extracted: AtomicU64,
    pub time_nanos: AtomicU64,
}

/// Row-level failures by kind
#[derive(Debug, Default)]
pub struct ErrorMetrics {
    pub no_match: AtomicU64,
    pub field: AtomicU64,
    pub too_large: AtomicU64,
    pub non_utf8: AtomicU64,
}

/// Counters for a line-extraction run.
///
/// Shared by reference across workers; all updates are `Relaxed`, so a
/// snapshot taken mid-run may be slightly torn between groups.
#[derive(Debug, Default)]
pub struct ExtractionMetrics {
    pub totals: CacheAligned<TotalMetrics>,
    pub errors: CacheAligned<ErrorMetrics>,
}

impl ExtractionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_success(&self, time_nanos: u64) {
        self.totals.0.lines.fetch_add(1, Ordering::Relaxed);
        self.totals.0.extracted.fetch_add(1, Ordering::Relaxed);
        self.totals.0.time_nanos.fetch_add(time_nanos, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_error(&self, error: &ExtractError) {
        self.totals.0.lines.fetch_add(1, Ordering::Relaxed);
        let counter = match error {
            ExtractError::NoMatch => &self.errors.0.no_match,
            ExtractError::Field { .. } => &self.errors.0.field,
            ExtractError::LineTooLarge(..) => &self.errors.0.too_large,
            ExtractError::NonUtf8 => &self.errors.0.non_utf8,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let lines = self.totals.0.lines.load(Ordering::Relaxed);
        let extracted = self.totals.0.extracted.load(Ordering::Relaxed);
        let time_nanos = self.totals.0.time_nanos.load(Ordering::Relaxed);

        MetricsSnapshot {
            lines,
            extracted,
            avg_extract_time_us: if extracted > 0 {
                (time_nanos as f64 / extracted as f64) / 1000.0
            } else {
                0.0
            },
            no_match: self.errors.0.no_match.load(Ordering::Relaxed),
            field_errors: self.errors.0.field.load(Ordering::Relaxed),
            lines_too_large: self.errors.0.too_large.load(Ordering::Relaxed),
            non_utf8_content: self.errors.0.non_utf8.load(Ordering::Relaxed),
            success_rate: if lines > 0 {
                extracted as f64 / lines as f64
            } else {
                1.0
            },
        }
    }
}

/// A read-only, serializable view of [`ExtractionMetrics`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub lines: u64,
    pub extracted: u64,
    pub avg_extract_time_us: f64,

    pub no_match: u64,
    pub field_errors: u64,
    pub lines_too_large: u64,
    pub non_utf8_content: u64,
    pub success_rate: f64,
}

impl MetricsSnapshot {
    pub fn failed(&self) -> u64 {
        self.no_match + self.field_errors + self.lines_too_large + self.non_utf8_content
    }
}
