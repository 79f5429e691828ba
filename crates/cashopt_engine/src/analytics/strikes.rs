//! Default strike grid around the spot price.

use crate::contract::strike_to_cents;

/// Number of half-unit steps either side of the centre strike.
const LADDER_HALF_WIDTH: i32 = 3;

/// Strike spacing.
const LADDER_STEP: f64 = 0.5;

/// Strikes offered for issuance: `floor(spot) + 0.5·i` for `i` in `-3..=3`.
///
/// Non-positive strikes are left out, so a spot below 2 yields a shorter
/// ladder. A non-finite spot yields none.
///
/// # Examples
/// ```
/// use cashopt_engine::analytics::strike_ladder;
///
/// assert_eq!(
///     strike_ladder(18.7),
///     vec![16.5, 17.0, 17.5, 18.0, 18.5, 19.0, 19.5]
/// );
/// ```
pub fn strike_ladder(spot: f64) -> Vec<f64> {
    if !spot.is_finite() {
        return Vec::new();
    }
    let centre = spot.floor();
    (-LADDER_HALF_WIDTH..=LADDER_HALF_WIDTH)
        .map(|i| centre + LADDER_STEP * f64::from(i))
        .filter(|strike| *strike > 0.0)
        .collect()
}

/// [`strike_ladder`] as strike bucket keys (hundredths).
pub fn strike_ladder_keys(spot: f64) -> Vec<i64> {
    strike_ladder(spot)
        .into_iter()
        .map(|strike| i64::try_from(strike_to_cents(strike)).unwrap_or(i64::MAX))
        .collect()
}
