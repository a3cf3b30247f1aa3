//! Raw-row normalization for history responses.
//!
//! Converts upstream [`RawBar`]s into wire [`Bar`]s with:
//! - datetime parsing (`YYYY-MM-DD HH:MM:SS` or `YYYY-MM-DD`, UTC) to
//!   epoch milliseconds
//! - numeric parsing with non-finite values rejected
//! - inclusive `[from, to]` window filtering
//! - ascending sort by timestamp
//! - duplicate-timestamp removal (first occurrence wins)
//!
//! Dropped rows are **counted**, never silently discarded: the upstream is
//! not trusted to return clean data, and unrecorded loss in a financial
//! series is a correctness hazard. The caller surfaces [`DropStats`] as a
//! data-quality warning alongside the result.

use chrono::{NaiveDate, NaiveDateTime};

use crate::{Bar, RawBar};

// ---------------------------------------------------------------------------
// Drop accounting
// ---------------------------------------------------------------------------

/// Counts of rows excluded during normalization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DropStats {
    /// Rows with an unparseable datetime or a missing / unparseable /
    /// non-finite numeric field.
    pub malformed: usize,
    /// Rows sharing a timestamp with an earlier row (upstream-contract
    /// violation; the first occurrence is kept).
    pub duplicate_ts: usize,
}

impl DropStats {
    pub fn is_clean(&self) -> bool {
        self.malformed == 0 && self.duplicate_ts == 0
    }

    pub fn total_dropped(&self) -> usize {
        self.malformed + self.duplicate_ts
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Normalize raw upstream rows into a clean, window-bounded, ascending
/// bar sequence.
///
/// `from_ms` / `to_ms` bound the result inclusively on timestamp; pass
/// `from_ms = 0` for an unbounded lower edge. Deterministic: the same input
/// always yields the same bars and the same drop counts.
pub fn normalize_bars(raw: &[RawBar], from_ms: i64, to_ms: i64) -> (Vec<Bar>, DropStats) {
    let mut stats = DropStats::default();

    let mut bars: Vec<Bar> = raw
        .iter()
        .filter_map(|row| match parse_row(row) {
            Some(bar) => Some(bar),
            None => {
                stats.malformed += 1;
                None
            }
        })
        .filter(|bar| bar.timestamp >= from_ms && bar.timestamp <= to_ms)
        .collect();

    // Stable sort keeps upstream order among equal timestamps, so the first
    // occurrence survives dedup below.
    bars.sort_by_key(|b| b.timestamp);

    let mut last_ts: Option<i64> = None;
    bars.retain(|bar| {
        if last_ts == Some(bar.timestamp) {
            stats.duplicate_ts += 1;
            false
        } else {
            last_ts = Some(bar.timestamp);
            true
        }
    });

    (bars, stats)
}

/// Parse one raw row; `None` means malformed.
fn parse_row(row: &RawBar) -> Option<Bar> {
    let timestamp = parse_datetime_ms(&row.datetime)?;

    let open = parse_finite(&row.open)?;
    let high = parse_finite(&row.high)?;
    let low = parse_finite(&row.low)?;
    let close = parse_finite(&row.close)?;
    let volume = parse_finite(&row.volume)?;

    Some(Bar {
        timestamp,
        open,
        high,
        low,
        close,
        volume,
    })
}

/// Upstream datetimes carry no zone marker; they are taken as UTC.
fn parse_datetime_ms(s: &str) -> Option<i64> {
    let s = s.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc().timestamp_millis());
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis());
    }
    None
}

fn parse_finite(s: &str) -> Option<f64> {
    let v: f64 = s.trim().parse().ok()?;
    v.is_finite().then_some(v)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(datetime: &str, close: &str) -> RawBar {
        RawBar {
            datetime: datetime.to_string(),
            open: "100.0".to_string(),
            high: "105.0".to_string(),
            low: "99.0".to_string(),
            close: close.to_string(),
            volume: "1000".to_string(),
        }
    }

    const NO_BOUND: i64 = i64::MAX;

    #[test]
    fn empty_input_is_clean_and_empty() {
        let (bars, stats) = normalize_bars(&[], 0, NO_BOUND);
        assert!(bars.is_empty());
        assert!(stats.is_clean());
    }

    #[test]
    fn intraday_datetime_parses_to_epoch_ms() {
        let rows = [raw("2024-01-02 10:00:00", "101.0")];
        let (bars, stats) = normalize_bars(&rows, 0, NO_BOUND);
        assert!(stats.is_clean());
        assert_eq!(bars.len(), 1);
        // 2024-01-02T10:00:00Z
        assert_eq!(bars[0].timestamp, 1_704_189_600_000);
        assert_eq!(bars[0].close, 101.0);
    }

    #[test]
    fn daily_date_parses_to_midnight_utc() {
        let rows = [raw("2024-01-02", "101.0")];
        let (bars, _) = normalize_bars(&rows, 0, NO_BOUND);
        assert_eq!(bars[0].timestamp, 1_704_153_600_000);
    }

    #[test]
    fn unsorted_input_comes_back_ascending() {
        let rows = [
            raw("2024-01-03", "3.0"),
            raw("2024-01-01", "1.0"),
            raw("2024-01-02", "2.0"),
        ];
        let (bars, stats) = normalize_bars(&rows, 0, NO_BOUND);
        assert!(stats.is_clean());
        let ts: Vec<i64> = bars.iter().map(|b| b.timestamp).collect();
        let mut sorted = ts.clone();
        sorted.sort_unstable();
        assert_eq!(ts, sorted);
        assert_eq!(bars[0].close, 1.0);
    }

    #[test]
    fn window_filter_is_inclusive_on_both_edges() {
        let rows = [
            raw("2024-01-01", "1.0"),
            raw("2024-01-02", "2.0"),
            raw("2024-01-03", "3.0"),
        ];
        let day1 = 1_704_067_200_000; // 2024-01-01T00:00:00Z
        let day2 = 1_704_153_600_000;
        let (bars, _) = normalize_bars(&rows, day1, day2);
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].timestamp, day1);
        assert_eq!(bars[1].timestamp, day2);
    }

    #[test]
    fn from_zero_means_unbounded_lower_edge() {
        let rows = [raw("1970-01-01 00:00:00", "1.0"), raw("2024-01-01", "2.0")];
        let (bars, _) = normalize_bars(&rows, 0, NO_BOUND);
        assert_eq!(bars.len(), 2);
    }

    #[test]
    fn malformed_datetime_is_dropped_and_counted() {
        let rows = [raw("not-a-date", "1.0"), raw("2024-01-02", "2.0")];
        let (bars, stats) = normalize_bars(&rows, 0, NO_BOUND);
        assert_eq!(bars.len(), 1);
        assert_eq!(stats.malformed, 1);
    }

    #[test]
    fn unparseable_price_is_dropped_and_counted() {
        let rows = [raw("2024-01-02", ""), raw("2024-01-03", "abc")];
        let (bars, stats) = normalize_bars(&rows, 0, NO_BOUND);
        assert!(bars.is_empty());
        assert_eq!(stats.malformed, 2);
    }

    #[test]
    fn non_finite_price_is_dropped_and_counted() {
        let rows = [raw("2024-01-02", "NaN"), raw("2024-01-03", "inf")];
        let (bars, stats) = normalize_bars(&rows, 0, NO_BOUND);
        assert!(bars.is_empty());
        assert_eq!(stats.malformed, 2);
    }

    #[test]
    fn duplicate_timestamps_keep_first_and_count_rest() {
        let rows = [
            raw("2024-01-02", "1.0"),
            raw("2024-01-02", "2.0"),
            raw("2024-01-02", "3.0"),
        ];
        let (bars, stats) = normalize_bars(&rows, 0, NO_BOUND);
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].close, 1.0, "first occurrence wins");
        assert_eq!(stats.duplicate_ts, 2);
    }

    #[test]
    fn no_duplicate_timestamps_in_output() {
        let rows = [
            raw("2024-01-02", "1.0"),
            raw("2024-01-03", "2.0"),
            raw("2024-01-02", "9.0"),
        ];
        let (bars, _) = normalize_bars(&rows, 0, NO_BOUND);
        let ts: Vec<i64> = bars.iter().map(|b| b.timestamp).collect();
        let mut deduped = ts.clone();
        deduped.dedup();
        assert_eq!(ts, deduped);
    }

    #[test]
    fn stats_totals_add_up() {
        let rows = [
            raw("bad", "1.0"),
            raw("2024-01-02", "1.0"),
            raw("2024-01-02", "2.0"),
        ];
        let (bars, stats) = normalize_bars(&rows, 0, NO_BOUND);
        assert_eq!(bars.len(), 1);
        assert_eq!(stats.malformed, 1);
        assert_eq!(stats.duplicate_ts, 1);
        assert_eq!(stats.total_dropped(), 2);
        assert!(!stats.is_clean());
    }

    #[test]
    fn deterministic_across_calls() {
        let rows = [
            raw("2024-01-03", "3.0"),
            raw("bad", "0.0"),
            raw("2024-01-01", "1.0"),
            raw("2024-01-01", "1.5"),
        ];
        let (bars_a, stats_a) = normalize_bars(&rows, 0, NO_BOUND);
        let (bars_b, stats_b) = normalize_bars(&rows, 0, NO_BOUND);
        assert_eq!(bars_a, bars_b);
        assert_eq!(stats_a, stats_b);
    }
}
