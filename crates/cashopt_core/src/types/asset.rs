//! Collateral assets.
//!
//! Call contracts are collateralised in the underlying asset, put contracts in
//! the stable asset. On the ledger both are integers in base units; the
//! engine works in whole-unit quantities and converts at the boundary.

use std::fmt;

/// Asset in which collateral and payouts are denominated.
///
/// # Examples
///
/// ```
/// use cashopt_core::types::CollateralAsset;
///
/// assert_eq!(CollateralAsset::Underlying.decimals(), 8);
/// assert_eq!(CollateralAsset::Stable.to_base_units(1.5), 1_500_000);
/// assert_eq!(CollateralAsset::Stable.from_base_units(2_500_000), 2.5);
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum CollateralAsset {
    /// The optioned asset itself (8 decimals).
    Underlying,
    /// The dollar-pegged settlement asset (6 decimals).
    Stable,
}

impl CollateralAsset {
    /// Number of decimal places of one base unit.
    pub fn decimals(&self) -> u32 {
        match self {
            CollateralAsset::Underlying => 8,
            CollateralAsset::Stable => 6,
        }
    }

    /// Base units per whole unit.
    pub fn scale(&self) -> u64 {
        10u64.pow(self.decimals())
    }

    /// Converts a whole-unit quantity to base units, rounding down.
    ///
    /// Negative or NaN quantities map to 0.
    pub fn to_base_units(&self, quantity: f64) -> u64 {
        let scaled = (quantity * self.scale() as f64).floor();
        if scaled.is_nan() || scaled <= 0.0 {
            0
        } else {
            scaled as u64
        }
    }

    /// Converts base units to a whole-unit quantity.
    pub fn from_base_units(&self, base_units: u64) -> f64 {
        base_units as f64 / self.scale() as f64
    }
}

impl fmt::Display for CollateralAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollateralAsset::Underlying => write!(f, "underlying"),
            CollateralAsset::Stable => write!(f, "stable"),
        }
    }
}
