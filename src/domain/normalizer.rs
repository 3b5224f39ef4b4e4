//! Candle normalization.
//!
//! Converts raw fetch records into the canonical time-ascending series shared
//! by the indicator engine and the chart panes. Each date string is parsed,
//! shifted by the configured display offset and truncated to whole seconds.
//!
//! The source is trusted to deliver candles in ascending order. Nothing is
//! sorted or de-duplicated here; out-of-order rows are reported as warnings
//! and downstream windowed calculations are undefined for them.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, Utc};
use std::fmt;

use crate::domain::candle::{Candle, RawCandle};

/// UTC+05:30, the display timezone candles are charted in by default.
pub const DEFAULT_UTC_OFFSET_SECONDS: i32 = 19_800;

const OFFSET_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
];

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Fixed shift applied to every parsed timestamp before it becomes a chart key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayOffset(FixedOffset);

impl DisplayOffset {
    /// `None` when the offset is outside ±24h.
    pub fn from_seconds(seconds: i32) -> Option<Self> {
        FixedOffset::east_opt(seconds).map(Self)
    }

    pub fn seconds(&self) -> i32 {
        self.0.local_minus_utc()
    }
}

impl Default for DisplayOffset {
    fn default() -> Self {
        Self(FixedOffset::east_opt(DEFAULT_UTC_OFFSET_SECONDS).unwrap_or_else(|| Utc.fix()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    UnparsableDate,
    NegativeVolume,
    NonFinitePrice,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::UnparsableDate => write!(f, "unparsable date"),
            RejectReason::NegativeVolume => write!(f, "negative volume"),
            RejectReason::NonFinitePrice => write!(f, "non-finite price"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RejectedRow {
    pub index: usize,
    pub date: String,
    pub reason: RejectReason,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalized {
    pub candles: Vec<Candle>,
    pub rejected: Vec<RejectedRow>,
}

/// Parse an ISO-8601-ish date string to UTC epoch seconds.
///
/// Strings without an offset are taken as UTC.
pub fn parse_timestamp(input: &str) -> Option<i64> {
    let s = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp());
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.timestamp());
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc().timestamp());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().timestamp())
}

pub fn normalize(raw: &[RawCandle], offset: DisplayOffset) -> Normalized {
    let shift = i64::from(offset.seconds());
    let mut out = Normalized {
        candles: Vec::with_capacity(raw.len()),
        rejected: Vec::new(),
    };

    for (index, record) in raw.iter().enumerate() {
        let volume = record.volume.unwrap_or(0.0);
        let reason = match parse_timestamp(&record.date) {
            None => Some(RejectReason::UnparsableDate),
            Some(_) if volume < 0.0 => Some(RejectReason::NegativeVolume),
            Some(_)
                if ![record.open, record.high, record.low, record.close, volume]
                    .iter()
                    .all(|v| v.is_finite()) =>
            {
                Some(RejectReason::NonFinitePrice)
            }
            Some(utc) => {
                out.candles.push(Candle {
                    time: utc + shift,
                    open: record.open,
                    high: record.high,
                    low: record.low,
                    close: record.close,
                    volume,
                });
                None
            }
        };

        if let Some(reason) = reason {
            out.rejected.push(RejectedRow {
                index,
                date: record.date.clone(),
                reason,
            });
        }
    }

    if !out.rejected.is_empty() {
        tracing::warn!(
            rejected = out.rejected.len(),
            total = raw.len(),
            "dropped malformed candle rows"
        );
    }
    let disorder = ordering_violations(&out.candles);
    if !disorder.is_empty() {
        tracing::warn!(
            violations = disorder.len(),
            first = disorder[0],
            "candles are not strictly ascending; indicator output is undefined"
        );
    }
    let inconsistent = out.candles.iter().filter(|c| !c.is_consistent()).count();
    if inconsistent > 0 {
        tracing::warn!(inconsistent, "candles with high/low outside open/close");
    }

    out
}

/// Indices whose time is not strictly after the previous candle's.
pub fn ordering_violations(candles: &[Candle]) -> Vec<usize> {
    candles
        .windows(2)
        .enumerate()
        .filter(|(_, pair)| pair[1].time <= pair[0].time)
        .map(|(i, _)| i + 1)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(date: &str, close: f64) -> RawCandle {
        RawCandle {
            date: date.to_string(),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: Some(100.0),
        }
    }

    #[test]
    fn default_offset_is_plus_five_thirty() {
        assert_eq!(DisplayOffset::default().seconds(), 19_800);
    }

    #[test]
    fn offset_out_of_range_rejected() {
        assert!(DisplayOffset::from_seconds(90_000).is_none());
        assert_eq!(DisplayOffset::from_seconds(-3_600).unwrap().seconds(), -3_600);
    }

    #[test]
    fn parses_rfc3339_and_naive_forms() {
        // 2024-01-15T09:15:00Z
        let expected = 1_705_310_100;
        assert_eq!(parse_timestamp("2024-01-15T09:15:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-15T14:45:00+05:30"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-15 14:45:00+05:30"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-15 09:15:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-15T09:15:00.750"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-15T09:15"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-15"), Some(1_705_276_800));
    }

    #[test]
    fn unparsable_date_is_none() {
        assert_eq!(parse_timestamp("not a date"), None);
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("2024-13-40"), None);
    }

    #[test]
    fn normalize_shifts_by_offset() {
        let offset = DisplayOffset::from_seconds(3_600).unwrap();
        let out = normalize(&[raw("2024-01-15T09:15:00Z", 10.0)], offset);
        assert_eq!(out.candles.len(), 1);
        assert_eq!(out.candles[0].time, 1_705_310_100 + 3_600);
    }

    #[test]
    fn normalize_defaults_missing_volume_to_zero() {
        let mut record = raw("2024-01-15T09:15:00Z", 10.0);
        record.volume = None;
        let out = normalize(&[record], DisplayOffset::default());
        assert_eq!(out.candles[0].volume, 0.0);
        assert_eq!(out.candles[0].value(), 0.0);
    }

    #[test]
    fn normalize_rejects_bad_rows_and_keeps_rest() {
        let mut negative = raw("2024-01-15T11:15:00Z", 12.0);
        negative.volume = Some(-5.0);
        let mut infinite = raw("2024-01-15T12:15:00Z", 13.0);
        infinite.high = f64::INFINITY;
        let rows = vec![
            raw("2024-01-15T09:15:00Z", 10.0),
            raw("garbage", 11.0),
            negative,
            infinite,
            raw("2024-01-15T13:15:00Z", 14.0),
        ];

        let out = normalize(&rows, DisplayOffset::default());

        assert_eq!(out.candles.len(), 2);
        assert_eq!(out.rejected.len(), 3);
        assert_eq!(out.rejected[0].index, 1);
        assert_eq!(out.rejected[0].reason, RejectReason::UnparsableDate);
        assert_eq!(out.rejected[1].reason, RejectReason::NegativeVolume);
        assert_eq!(out.rejected[2].reason, RejectReason::NonFinitePrice);
    }

    #[test]
    fn normalize_does_not_reorder() {
        let rows = vec![
            raw("2024-01-15T10:15:00Z", 10.0),
            raw("2024-01-15T09:15:00Z", 11.0),
        ];
        let out = normalize(&rows, DisplayOffset::default());
        assert_eq!(out.candles[0].close, 10.0);
        assert_eq!(out.candles[1].close, 11.0);
        assert_eq!(ordering_violations(&out.candles), vec![1]);
    }

    #[test]
    fn ordering_violations_flags_duplicates() {
        let rows = vec![
            raw("2024-01-15T09:15:00Z", 10.0),
            raw("2024-01-15T09:15:00Z", 11.0),
            raw("2024-01-15T10:15:00Z", 12.0),
        ];
        let out = normalize(&rows, DisplayOffset::default());
        assert_eq!(ordering_violations(&out.candles), vec![1]);
    }

    #[test]
    fn normalize_empty_input() {
        let out = normalize(&[], DisplayOffset::default());
        assert!(out.candles.is_empty());
        assert!(out.rejected.is_empty());
    }
}
