//! Moneyness and payout at settlement.
//!
//! Each contract is fully collateralised at issuance: a call pledges one
//! unit of the underlying per contract, a put pledges `K` units of the stable
//! asset. At settlement the Long side receives the intrinsic value out of that
//! collateral and the Short side receives whatever is left, so the two
//! payouts of a pair always add up to the pledged amount.
//!
//! | Side       | Asset      | Quantity                    |
//! |------------|------------|-----------------------------|
//! | Long Call  | underlying | `n · max(S - K, 0) / S`     |
//! | Short Call | underlying | `n - long`                  |
//! | Long Put   | stable     | `n · max(K - S, 0)`         |
//! | Short Put  | stable     | `n · K - long`              |

use std::fmt;

use cashopt_core::types::CollateralAsset;

use crate::contract::{Direction, OptionKind};
use crate::records::{LifecycleError, LifecycleState, OptionRecord};

/// Where the settlement price sits relative to the strike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Moneyness {
    /// The Long side is owed a payout.
    #[cfg_attr(feature = "serde", serde(rename = "ITM"))]
    InTheMoney,
    /// Settlement price equals the strike.
    #[cfg_attr(feature = "serde", serde(rename = "ATM"))]
    AtTheMoney,
    /// The Long side is owed nothing.
    #[cfg_attr(feature = "serde", serde(rename = "OTM"))]
    OutOfTheMoney,
}

impl fmt::Display for Moneyness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Moneyness::InTheMoney => "ITM",
            Moneyness::AtTheMoney => "ATM",
            Moneyness::OutOfTheMoney => "OTM",
        };
        f.write_str(label)
    }
}

/// Classifies a settlement price against the strike.
///
/// Equality is exact: a settlement price one cent away from the strike is
/// already in or out of the money.
///
/// # Examples
/// ```
/// use cashopt_engine::contract::OptionKind;
/// use cashopt_engine::settlement::{moneyness, Moneyness};
///
/// assert_eq!(moneyness(OptionKind::Call, 18.0, 20.0), Moneyness::InTheMoney);
/// assert_eq!(moneyness(OptionKind::Put, 18.0, 20.0), Moneyness::OutOfTheMoney);
/// assert_eq!(moneyness(OptionKind::Call, 18.0, 18.0), Moneyness::AtTheMoney);
/// ```
pub fn moneyness(kind: OptionKind, strike: f64, settlement_price: f64) -> Moneyness {
    if settlement_price == strike {
        return Moneyness::AtTheMoney;
    }
    let above = settlement_price > strike;
    match (kind, above) {
        (OptionKind::Call, true) | (OptionKind::Put, false) => Moneyness::InTheMoney,
        (OptionKind::Call, false) | (OptionKind::Put, true) => Moneyness::OutOfTheMoney,
    }
}

/// How a record leaves the ledger at maturity.
///
/// Both paths are terminal and numerically identical; they differ only in
/// how the outcome is presented to the holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum SettlementPath {
    /// A non-zero payout is transferred.
    Settlement,
    /// Nothing is owed; the token is disposed of.
    Disposal,
}

/// Amount owed to one side at settlement.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Payout {
    /// Asset the payout is transferred in.
    pub asset: CollateralAsset,
    /// Quantity of `asset` owed.
    pub quantity: f64,
    /// The same payout valued in the stable asset at the settlement price.
    pub value: f64,
    /// Settlement or disposal.
    pub path: SettlementPath,
}

impl Payout {
    fn new(asset: CollateralAsset, quantity: f64, value: f64) -> Self {
        let path = if quantity == 0.0 {
            SettlementPath::Disposal
        } else {
            SettlementPath::Settlement
        };
        Self {
            asset,
            quantity,
            value,
            path,
        }
    }

    /// Quantity in ledger base units, rounded down.
    pub fn base_units(&self) -> u64 {
        self.asset.to_base_units(self.quantity)
    }
}

/// Collateral pledged for `amount` contracts, in the kind's collateral asset.
#[inline]
pub fn pledged_collateral(kind: OptionKind, strike: f64, amount: u64) -> f64 {
    match kind {
        OptionKind::Call => amount as f64,
        OptionKind::Put => amount as f64 * strike,
    }
}

fn long_quantity(kind: OptionKind, strike: f64, settlement_price: f64, size: f64) -> f64 {
    let intrinsic = size * kind.intrinsic(settlement_price, strike);
    match kind {
        OptionKind::Call if intrinsic > 0.0 => intrinsic / settlement_price,
        OptionKind::Call => 0.0,
        OptionKind::Put => intrinsic,
    }
}

/// Payout owed to one side of `amount` contracts.
///
/// Total over its domain: any settlement price, including zero, yields a
/// payout.
///
/// Units: one contract of a call pledges one unit of the underlying, and the
/// Long side is paid `max(S - K, 0) / S` of it per contract. One contract of a
/// put pledges `K` of the stable asset, and the Long side is paid
/// `max(K - S, 0)` of it per contract. The Short side gets the rest of the
/// pledge in the same asset.
///
/// # Examples
/// ```
/// use cashopt_engine::contract::{Direction, OptionKind};
/// use cashopt_engine::settlement::{payout, SettlementPath};
///
/// // Call struck at 18 settles at 20: Long receives 2 of value per contract,
/// // paid as 0.1 of the underlying.
/// let long = payout(OptionKind::Call, Direction::Long, 18.0, 20.0, 1);
/// assert!((long.value - 2.0).abs() < 1e-12);
/// assert!((long.quantity - 0.1).abs() < 1e-12);
///
/// let short = payout(OptionKind::Call, Direction::Short, 18.0, 20.0, 1);
/// assert!((short.quantity - 0.9).abs() < 1e-12);
///
/// let otm = payout(OptionKind::Put, Direction::Long, 18.0, 20.0, 1);
/// assert_eq!(otm.path, SettlementPath::Disposal);
/// ```
pub fn payout(
    kind: OptionKind,
    direction: Direction,
    strike: f64,
    settlement_price: f64,
    amount: u64,
) -> Payout {
    let size = amount as f64;
    let long = long_quantity(kind, strike, settlement_price, size);
    let quantity = match direction {
        Direction::Long => long,
        Direction::Short => pledged_collateral(kind, strike, amount) - long,
    };

    let (asset, value) = match kind {
        OptionKind::Call => (CollateralAsset::Underlying, quantity * settlement_price),
        OptionKind::Put => (CollateralAsset::Stable, quantity),
    };

    // An out-of-the-money call leaves the Long side with nothing, valued at 0
    // even if the settlement price is not finite.
    let value = if quantity == 0.0 { 0.0 } else { value };
    Payout::new(asset, quantity, value)
}

/// Both payouts of a contract pair and the collateral they split.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PairPayout {
    /// Payout to the Long side.
    pub long: Payout,
    /// Payout to the Short side.
    pub short: Payout,
    /// Collateral pledged for the pair.
    pub collateral: f64,
}

/// Payouts for both sides of `amount` contracts.
pub fn pair_payouts(kind: OptionKind, strike: f64, settlement_price: f64, amount: u64) -> PairPayout {
    PairPayout {
        long: payout(kind, Direction::Long, strike, settlement_price, amount),
        short: payout(kind, Direction::Short, strike, settlement_price, amount),
        collateral: pledged_collateral(kind, strike, amount),
    }
}

/// Settles a matured record against the settlement price.
///
/// Records the snapshot if the record has none yet. A record that already
/// carries a snapshot must be settled at that same price. The remaining
/// amount is consumed and the payout for it returned.
///
/// # Errors
///
/// - [`LifecycleError::InvalidState`] unless the record is `Matured`
/// - [`LifecycleError::SnapshotAlreadySet`] if a different snapshot exists
/// - any error from recording the snapshot
///
/// # Examples
/// ```
/// use cashopt_engine::contract::{Direction, OptionKind};
/// use cashopt_engine::records::{LifecycleState, OptionRecord};
/// use cashopt_engine::settlement::settle;
///
/// let maturity = 1_675_411_200_000;
/// let mut record = OptionRecord::new(OptionKind::Put, Direction::Long, 18.0, maturity, 3).unwrap();
///
/// let payout = settle(&mut record, 17.0, maturity).unwrap();
/// assert_eq!(payout.quantity, 3.0);
/// assert_eq!(record.state(maturity), LifecycleState::Settled);
/// ```
pub fn settle(
    record: &mut OptionRecord,
    settlement_price: f64,
    now_ms: i64,
) -> Result<Payout, LifecycleError> {
    if record.state(now_ms) != LifecycleState::Matured {
        return Err(record.reject("settle", now_ms));
    }

    match record.settlement_price() {
        Some(existing) if existing != settlement_price => {
            tracing::warn!(existing, offered = settlement_price, "settlement price mismatch");
            return Err(LifecycleError::SnapshotAlreadySet { existing });
        }
        Some(_) => {}
        None => record.record_settlement_price(settlement_price, now_ms)?,
    }

    let amount = record.remaining();
    let owed = payout(
        record.kind(),
        record.direction(),
        record.strike(),
        settlement_price,
        amount,
    );
    record.consume(amount)?;

    tracing::debug!(
        key = ?record.position_key(),
        amount,
        quantity = owed.quantity,
        path = ?owed.path,
        "record settled"
    );
    Ok(owed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const K: f64 = 18.0;
    const MATURITY: i64 = 1_675_411_200_000;

    #[test]
    fn test_moneyness_table() {
        use Moneyness::*;
        let cases = [
            (OptionKind::Call, 20.0, InTheMoney),
            (OptionKind::Call, 18.0, AtTheMoney),
            (OptionKind::Call, 16.0, OutOfTheMoney),
            (OptionKind::Put, 20.0, OutOfTheMoney),
            (OptionKind::Put, 18.0, AtTheMoney),
            (OptionKind::Put, 16.0, InTheMoney),
        ];
        for (kind, price, expected) in cases {
            assert_eq!(moneyness(kind, K, price), expected, "{kind} at {price}");
        }
        assert_eq!(Moneyness::InTheMoney.to_string(), "ITM");
    }

    #[test]
    fn test_call_payouts() {
        let pair = pair_payouts(OptionKind::Call, K, 24.0, 6);
        assert_eq!(pair.long.asset, CollateralAsset::Underlying);
        assert_relative_eq!(pair.long.quantity, 6.0 * 6.0 / 24.0, epsilon = 1e-12);
        assert_relative_eq!(pair.long.value, 36.0, epsilon = 1e-12);
        assert_relative_eq!(pair.short.quantity, 4.5, epsilon = 1e-12);
        assert_relative_eq!(pair.short.value, 4.5 * 24.0, epsilon = 1e-12);
        assert_eq!(pair.collateral, 6.0);
    }

    #[test]
    fn test_put_payouts() {
        let pair = pair_payouts(OptionKind::Put, K, 15.0, 2);
        assert_eq!(pair.short.asset, CollateralAsset::Stable);
        assert_relative_eq!(pair.long.quantity, 6.0, epsilon = 1e-12);
        assert_relative_eq!(pair.short.quantity, 30.0, epsilon = 1e-12);
        assert_relative_eq!(pair.long.quantity + pair.short.quantity, pair.collateral, epsilon = 1e-12);
    }

    #[test]
    fn test_out_of_the_money_is_disposal() {
        let long = payout(OptionKind::Call, Direction::Long, K, 16.0, 5);
        assert_eq!(long.quantity, 0.0);
        assert_eq!(long.value, 0.0);
        assert_eq!(long.path, SettlementPath::Disposal);

        let short = payout(OptionKind::Call, Direction::Short, K, 16.0, 5);
        assert_eq!(short.quantity, 5.0);
        assert_eq!(short.path, SettlementPath::Settlement);

        let atm = payout(OptionKind::Put, Direction::Long, K, K, 5);
        assert_eq!(atm.path, SettlementPath::Disposal);
    }

    #[test]
    fn test_zero_settlement_price() {
        let long_put = payout(OptionKind::Put, Direction::Long, K, 0.0, 1);
        assert_eq!(long_put.quantity, K);
        let short_put = payout(OptionKind::Put, Direction::Short, K, 0.0, 1);
        assert_eq!(short_put.path, SettlementPath::Disposal);

        let long_call = payout(OptionKind::Call, Direction::Long, K, 0.0, 1);
        assert_eq!(long_call.path, SettlementPath::Disposal);
    }

    #[test]
    fn test_base_units() {
        let long = payout(OptionKind::Put, Direction::Long, K, 17.5, 3);
        assert_eq!(long.base_units(), 1_500_000);
    }

    #[test]
    fn test_settle_consumes_remaining() {
        let mut record = OptionRecord::new(OptionKind::Call, Direction::Short, K, MATURITY, 4).unwrap();
        record.consume(1).unwrap();

        let owed = settle(&mut record, 20.0, MATURITY + 5).unwrap();
        assert_relative_eq!(owed.quantity, 3.0 - 3.0 * 2.0 / 20.0, epsilon = 1e-12);
        assert_eq!(record.remaining(), 0);
        assert_eq!(record.settlement_price(), Some(20.0));
        assert_eq!(record.state(MATURITY + 5), LifecycleState::Settled);
    }

    #[test]
    fn test_settle_before_maturity() {
        let mut record = OptionRecord::new(OptionKind::Call, Direction::Long, K, MATURITY, 4).unwrap();
        assert!(matches!(
            settle(&mut record, 20.0, MATURITY - 1),
            Err(LifecycleError::InvalidState {
                state: LifecycleState::Active,
                ..
            })
        ));
        assert_eq!(record.remaining(), 4);
    }

    #[test]
    fn test_settle_uses_existing_snapshot() {
        let mut record = OptionRecord::new(OptionKind::Put, Direction::Long, K, MATURITY, 1).unwrap();
        record.record_settlement_price(17.0, MATURITY).unwrap();

        assert_eq!(
            settle(&mut record, 16.0, MATURITY),
            Err(LifecycleError::SnapshotAlreadySet { existing: 17.0 })
        );
        let owed = settle(&mut record, 17.0, MATURITY).unwrap();
        assert_eq!(owed.quantity, 1.0);

        assert!(settle(&mut record, 17.0, MATURITY).is_err());
    }
}
