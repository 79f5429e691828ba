//! Daily settlement cutoff rules.
//!
//! Contracts mature at a fixed UTC hour. Two external jobs key off that
//! cutoff: a price feeder that may only publish within a narrow window around
//! it, and a settlement trigger that may fire once it has passed. Neither runs
//! here; these helpers only let a caller evaluate the same rules for a given
//! instant.

use chrono::{DateTime, Duration, Utc};

/// Widest accepted feed window half-width: one day, in seconds.
pub const MAX_FEED_WINDOW_SECS: i64 = 86_400;

/// Daily cutoff configuration.
///
/// # Examples
///
/// ```
/// use cashopt_core::schedule::SettlementSchedule;
/// use chrono::{TimeZone, Utc};
///
/// let schedule = SettlementSchedule::default();
/// let now = Utc.with_ymd_and_hms(2023, 2, 3, 8, 0, 20).unwrap();
///
/// assert!(schedule.is_feed_window_open(now));
/// assert!(schedule.is_settlement_due(now));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SettlementSchedule {
    /// Hour of day (UTC) at which contracts mature.
    pub cutoff_hour_utc: u32,
    /// Half-width of the price feed window around the cutoff, in seconds.
    pub feed_window_secs: i64,
}

impl Default for SettlementSchedule {
    fn default() -> Self {
        Self {
            cutoff_hour_utc: 8,
            feed_window_secs: 30,
        }
    }
}

impl SettlementSchedule {
    /// The cutoff on the same UTC calendar day as `now`.
    ///
    /// Returns `None` when `cutoff_hour_utc` is not a valid hour.
    pub fn daily_cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        now.date_naive()
            .and_hms_opt(self.cutoff_hour_utc, 0, 0)
            .map(|naive| naive.and_utc())
    }

    /// Whether a price snapshot taken at `now` is close enough to the cutoff.
    ///
    /// A window too wide for `Duration` is treated as closed.
    pub fn is_feed_window_open(&self, now: DateTime<Utc>) -> bool {
        let Some(window) = Duration::try_seconds(self.feed_window_secs) else {
            return false;
        };
        self.daily_cutoff(now)
            .is_some_and(|cutoff| (now - cutoff).abs() <= window)
    }

    /// Whether today's cutoff has been reached.
    pub fn is_settlement_due(&self, now: DateTime<Utc>) -> bool {
        self.daily_cutoff(now).is_some_and(|cutoff| now >= cutoff)
    }

    /// The maturity timestamp (ms) that a settlement run at `now` targets.
    pub fn settlement_target_ms(&self, now: DateTime<Utc>) -> Option<i64> {
        self.daily_cutoff(now).map(|cutoff| cutoff.timestamp_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 2, 10, h, m, s).unwrap()
    }

    #[test]
    fn test_daily_cutoff() {
        let schedule = SettlementSchedule::default();
        assert_eq!(schedule.daily_cutoff(at(23, 59, 59)).unwrap(), at(8, 0, 0));
        assert_eq!(schedule.daily_cutoff(at(0, 0, 0)).unwrap(), at(8, 0, 0));
    }

    #[test]
    fn test_feed_window() {
        let schedule = SettlementSchedule::default();
        assert!(schedule.is_feed_window_open(at(7, 59, 30)));
        assert!(schedule.is_feed_window_open(at(8, 0, 30)));
        assert!(!schedule.is_feed_window_open(at(8, 0, 31)));
        assert!(!schedule.is_feed_window_open(at(7, 59, 29)));
    }

    #[test]
    fn test_settlement_due() {
        let schedule = SettlementSchedule::default();
        assert!(!schedule.is_settlement_due(at(7, 59, 59)));
        assert!(schedule.is_settlement_due(at(8, 0, 0)));
        assert!(schedule.is_settlement_due(at(20, 0, 0)));
    }

    #[test]
    fn test_settlement_target() {
        let schedule = SettlementSchedule::default();
        assert_eq!(
            schedule.settlement_target_ms(at(9, 0, 0)),
            Some(at(8, 0, 0).timestamp_millis())
        );
    }

    #[test]
    fn test_unrepresentable_window_is_closed() {
        for feed_window_secs in [i64::MAX, i64::MIN] {
            let schedule = SettlementSchedule {
                cutoff_hour_utc: 8,
                feed_window_secs,
            };
            assert!(!schedule.is_feed_window_open(at(8, 0, 0)));
        }
    }

    #[test]
    fn test_invalid_hour() {
        let schedule = SettlementSchedule {
            cutoff_hour_utc: 24,
            feed_window_secs: 30,
        };
        assert!(schedule.daily_cutoff(at(8, 0, 0)).is_none());
        assert!(!schedule.is_settlement_due(at(8, 0, 0)));
        assert!(!schedule.is_feed_window_open(at(8, 0, 0)));
    }
}
