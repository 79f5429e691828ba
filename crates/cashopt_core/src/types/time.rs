//! Millisecond timestamps and year fractions.
//!
//! The ledger carries maturities as UTC milliseconds since the Unix epoch.
//! Time to expiry is measured in years on a plain Act/365 wall-clock basis:
//! `(maturity - now) / 1000 / 86400 / 365`.

use chrono::{DateTime, TimeZone, Utc};

/// Milliseconds in one day.
pub const MS_PER_DAY: i64 = 86_400_000;

/// Days per year used for year fractions (Act/365).
pub const DAYS_PER_YEAR: f64 = 365.0;

/// Time from `now_ms` to `maturity_ms`, in years.
///
/// Negative once the maturity has passed; the pricer treats any value
/// `<= 0` as expired.
///
/// # Examples
///
/// ```
/// use cashopt_core::types::time::{time_to_expiry, MS_PER_DAY};
///
/// let t = time_to_expiry(0, 365 * MS_PER_DAY);
/// assert!((t - 1.0).abs() < 1e-12);
/// assert!(time_to_expiry(MS_PER_DAY, 0) < 0.0);
/// ```
#[inline]
pub fn time_to_expiry(now_ms: i64, maturity_ms: i64) -> f64 {
    let remaining_ms = maturity_ms.saturating_sub(now_ms) as f64;
    remaining_ms / MS_PER_DAY as f64 / DAYS_PER_YEAR
}

/// [`time_to_expiry`] with `now` as a `chrono` timestamp.
pub fn time_to_expiry_at(now: DateTime<Utc>, maturity_ms: i64) -> f64 {
    time_to_expiry(now.timestamp_millis(), maturity_ms)
}

/// Returns true once `now_ms` has reached `maturity_ms`.
#[inline]
pub fn is_matured(now_ms: i64, maturity_ms: i64) -> bool {
    now_ms >= maturity_ms
}

/// Converts a millisecond timestamp to a UTC datetime.
///
/// Returns `None` for timestamps outside chrono's representable range.
pub fn timestamp_to_datetime(ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single()
}

/// Formats a millisecond timestamp as `3 Feb 2023 08:00 UTC+0`.
///
/// # Examples
///
/// ```
/// use cashopt_core::types::time::format_timestamp;
///
/// assert_eq!(format_timestamp(1_675_411_200_000).unwrap(), "3 Feb 2023 08:00 UTC+0");
/// ```
pub fn format_timestamp(ms: i64) -> Option<String> {
    timestamp_to_datetime(ms).map(|dt| dt.format("%-d %b %Y %H:%M UTC+0").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::TimeZone;

    #[test]
    fn test_thirty_days() {
        assert_relative_eq!(time_to_expiry(0, 30 * MS_PER_DAY), 30.0 / 365.0, epsilon = 1e-15);
    }

    #[test]
    fn test_expired_is_negative() {
        assert!(time_to_expiry(10 * MS_PER_DAY, 9 * MS_PER_DAY) < 0.0);
        assert_eq!(time_to_expiry(5, 5), 0.0);
    }

    #[test]
    fn test_extreme_inputs_do_not_overflow() {
        let t = time_to_expiry(i64::MIN, i64::MAX);
        assert!(t.is_finite() && t > 0.0);
    }

    #[test]
    fn test_time_to_expiry_at() {
        let now = Utc.with_ymd_and_hms(2023, 2, 3, 8, 0, 0).unwrap();
        let maturity = Utc.with_ymd_and_hms(2023, 2, 10, 8, 0, 0).unwrap();
        let t = time_to_expiry_at(now, maturity.timestamp_millis());
        assert_relative_eq!(t, 7.0 / 365.0, epsilon = 1e-15);
    }

    #[test]
    fn test_is_matured() {
        assert!(!is_matured(99, 100));
        assert!(is_matured(100, 100));
        assert!(is_matured(101, 100));
    }

    #[test]
    fn test_format_timestamp() {
        let ms = Utc
            .with_ymd_and_hms(2023, 2, 24, 8, 5, 0)
            .unwrap()
            .timestamp_millis();
        assert_eq!(format_timestamp(ms).unwrap(), "24 Feb 2023 08:05 UTC+0");
        assert!(format_timestamp(i64::MAX).is_none());
    }
}
