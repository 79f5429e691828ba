//! Contract identity: option kind, side, structured keys and token names.
//!
//! Two records refer to the same contract when their [`ContractKey`]s are
//! equal. Strikes are keyed in hundredths, which is how the ledger stores
//! them, so float noise in a decoded strike never splits a contract in two.
//!
//! [`TokenName`] reproduces the ledger's human-readable token identifier
//! (`APT_1675411200000_1800_CALL_LONG`). It is for display and parsing only;
//! matching always goes through [`ContractKey::opposing`].

use std::fmt;
use std::str::FromStr;

use cashopt_core::types::time::timestamp_to_datetime;
use cashopt_core::types::CollateralAsset;
use thiserror::Error;

/// Option kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum OptionKind {
    /// Pays when the settlement price ends above the strike.
    Call,
    /// Pays when the settlement price ends below the strike.
    Put,
}

impl OptionKind {
    /// Asset the contract's collateral is pledged in.
    ///
    /// # Examples
    /// ```
    /// use cashopt_engine::contract::OptionKind;
    /// use cashopt_core::types::CollateralAsset;
    ///
    /// assert_eq!(OptionKind::Call.collateral_asset(), CollateralAsset::Underlying);
    /// assert_eq!(OptionKind::Put.collateral_asset(), CollateralAsset::Stable);
    /// ```
    pub fn collateral_asset(&self) -> CollateralAsset {
        match self {
            OptionKind::Call => CollateralAsset::Underlying,
            OptionKind::Put => CollateralAsset::Stable,
        }
    }

    /// Intrinsic value `max(S - K, 0)` for calls, `max(K - S, 0)` for puts.
    #[inline]
    pub fn intrinsic(&self, spot: f64, strike: f64) -> f64 {
        match self {
            OptionKind::Call => (spot - strike).max(0.0),
            OptionKind::Put => (strike - spot).max(0.0),
        }
    }

    fn label(&self) -> &'static str {
        match self {
            OptionKind::Call => "CALL",
            OptionKind::Put => "PUT",
        }
    }
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for OptionKind {
    type Err = ContractParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "call" => Ok(OptionKind::Call),
            "put" => Ok(OptionKind::Put),
            _ => Err(ContractParseError::UnknownKind(s.to_string())),
        }
    }
}

/// Side of a contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Direction {
    /// Holder of the option right.
    Long,
    /// Writer bearing the offsetting obligation.
    Short,
}

impl Direction {
    /// The other side.
    #[inline]
    pub fn opposite(&self) -> Self {
        match self {
            Direction::Long => Direction::Short,
            Direction::Short => Direction::Long,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Direction::Long => "LONG",
            Direction::Short => "SHORT",
        }
    }

    fn title(&self) -> &'static str {
        match self {
            Direction::Long => "Long",
            Direction::Short => "Short",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Direction {
    type Err = ContractParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "long" => Ok(Direction::Long),
            "short" => Ok(Direction::Short),
            _ => Err(ContractParseError::UnknownDirection(s.to_string())),
        }
    }
}

/// Errors from parsing contract identifiers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ContractParseError {
    /// Unrecognised option kind.
    #[error("Unknown option kind: {0}")]
    UnknownKind(String),

    /// Unrecognised direction.
    #[error("Unknown direction: {0}")]
    UnknownDirection(String),

    /// Token name does not have the expected five fields.
    #[error("Malformed token name: {0}")]
    MalformedName(String),
}

/// Converts a strike to hundredths, rounding to the nearest cent.
///
/// # Examples
/// ```
/// use cashopt_engine::contract::strike_to_cents;
///
/// assert_eq!(strike_to_cents(18.5), 1850);
/// assert_eq!(strike_to_cents(17.999999), 1800);
/// ```
#[inline]
pub fn strike_to_cents(strike: f64) -> u64 {
    let cents = (strike * 100.0).round();
    if cents.is_nan() || cents <= 0.0 {
        0
    } else {
        cents as u64
    }
}

/// Converts hundredths back to a strike.
#[inline]
pub fn cents_to_strike(cents: u64) -> f64 {
    cents as f64 / 100.0
}

/// Identity of a contract: everything but the side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContractKey {
    /// Option kind.
    pub kind: OptionKind,
    /// Strike in hundredths.
    pub strike_cents: u64,
    /// Maturity, UTC milliseconds.
    pub maturity_ms: i64,
}

impl ContractKey {
    /// Builds a key from a decimal strike.
    pub fn new(kind: OptionKind, strike: f64, maturity_ms: i64) -> Self {
        Self {
            kind,
            strike_cents: strike_to_cents(strike),
            maturity_ms,
        }
    }

    /// Strike as a decimal price.
    pub fn strike(&self) -> f64 {
        cents_to_strike(self.strike_cents)
    }

    /// Key of the opposite side of this contract.
    pub fn opposing(&self, direction: Direction) -> PositionKey {
        PositionKey {
            contract: *self,
            direction: direction.opposite(),
        }
    }
}

/// A contract key together with a side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PositionKey {
    /// Contract identity.
    pub contract: ContractKey,
    /// Side.
    pub direction: Direction,
}

/// Ledger token name, e.g. `APT_1675411200000_1800_CALL_LONG`.
///
/// # Examples
/// ```
/// use cashopt_engine::contract::{Direction, OptionKind, TokenName};
///
/// let name: TokenName = "APT_1675411200000_1800_CALL_LONG".parse().unwrap();
/// assert_eq!(name.position.direction, Direction::Long);
/// assert_eq!(name.position.contract.kind, OptionKind::Call);
/// assert_eq!(name.title().unwrap(), "APT-3Feb23-18-CALL-Long");
/// assert_eq!(name.to_string(), "APT_1675411200000_1800_CALL_LONG");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TokenName {
    /// Underlying ticker.
    pub underlying: String,
    /// Contract and side.
    pub position: PositionKey,
}

impl TokenName {
    /// Creates a token name.
    pub fn new(underlying: impl Into<String>, position: PositionKey) -> Self {
        Self {
            underlying: underlying.into(),
            position,
        }
    }

    /// Short display title such as `APT-3Feb23-18.5-PUT-Short`.
    ///
    /// Returns `None` if the maturity is not a representable timestamp.
    pub fn title(&self) -> Option<String> {
        let contract = &self.position.contract;
        let maturity = timestamp_to_datetime(contract.maturity_ms)?;
        Some(format!(
            "{}-{}-{}-{}-{}",
            self.underlying,
            maturity.format("%-d%b%y"),
            contract.strike(),
            contract.kind,
            self.position.direction.title()
        ))
    }
}

impl fmt::Display for TokenName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let contract = &self.position.contract;
        write!(
            f,
            "{}_{}_{}_{}_{}",
            self.underlying,
            contract.maturity_ms,
            contract.strike_cents,
            contract.kind,
            self.position.direction
        )
    }
}

impl FromStr for TokenName {
    type Err = ContractParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ContractParseError::MalformedName(s.to_string());

        let parts: Vec<&str> = s.split('_').collect();
        let [underlying, maturity, strike, kind, direction] = parts.as_slice() else {
            return Err(malformed());
        };
        if underlying.is_empty() {
            return Err(malformed());
        }

        let maturity_ms = maturity.parse::<i64>().map_err(|_| malformed())?;
        let strike_cents = strike.parse::<u64>().map_err(|_| malformed())?;

        Ok(Self {
            underlying: underlying.to_string(),
            position: PositionKey {
                contract: ContractKey {
                    kind: kind.parse()?,
                    strike_cents,
                    maturity_ms,
                },
                direction: direction.parse()?,
            },
        })
    }
}
