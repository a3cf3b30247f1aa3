//! TTL policy per cache namespace.
//!
//! These reflect the staleness tolerance of each underlying series and are
//! design contract, not per-request negotiable: the instrument catalog moves
//! on listing events (hours), daily bars settle once per session, intraday
//! bars go stale in minutes.

use std::time::Duration;

use kld_md::Period;

/// Instrument catalog entries.
pub const CATALOG_TTL: Duration = Duration::from_secs(60 * 60);

/// Completed daily bars.
pub const DAILY_BARS_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Sub-daily bars.
pub const INTRADAY_BARS_TTL: Duration = Duration::from_secs(5 * 60);

/// TTL for a history entry, selected by period class.
pub fn history_ttl(period: Period) -> Duration {
    match period {
        Period::D1 => DAILY_BARS_TTL,
        Period::M5 | Period::M15 | Period::H1 => INTRADAY_BARS_TTL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn daily_bars_get_day_ttl() {
        assert_eq!(history_ttl(Period::D1), DAILY_BARS_TTL);
    }

    #[test]
    fn all_intraday_periods_get_minute_ttl() {
        for p in [Period::M5, Period::M15, Period::H1] {
            assert_eq!(history_ttl(p), INTRADAY_BARS_TTL);
        }
    }

    #[test]
    fn catalog_ttl_is_longer_than_intraday() {
        assert!(CATALOG_TTL > INTRADAY_BARS_TTL);
    }
}
