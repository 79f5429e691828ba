//! Option records and their lifecycle.
//!
//! A record is one side of one contract as held by one owner. The ledger is
//! the source of truth; the engine receives records per call, mutates them in
//! memory to reflect closure or settlement, and hands the computed amounts
//! back to the caller to execute.
//!
//! ```text
//! Created --activate--> Active --(t <= 0)--> Matured --settle--> Settled
//!                         |
//!                         +--close (remaining -> 0)--> Closed
//! ```

use cashopt_core::types::time::{is_matured, time_to_expiry};
use thiserror::Error;

use crate::contract::{ContractKey, Direction, OptionKind, PositionKey};

/// Lifecycle errors.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LifecycleError {
    /// Strike must be a positive finite price.
    #[error("Invalid strike: K = {strike}")]
    InvalidStrike {
        /// The rejected strike
        strike: f64,
    },

    /// Records must carry a positive amount.
    #[error("Record amount must be positive")]
    ZeroAmount,

    /// Remaining amount exceeds the issued amount.
    #[error("Remaining amount {remaining} exceeds issued amount {amount}")]
    RemainingExceedsAmount {
        /// Issued amount
        amount: u64,
        /// Claimed remaining amount
        remaining: u64,
    },

    /// The settlement price snapshot may be set only once.
    #[error("Settlement price already recorded as {existing}")]
    SnapshotAlreadySet {
        /// The snapshot already on the record
        existing: f64,
    },

    /// The settlement price snapshot was offered before maturity.
    #[error("Settlement price offered {remaining_ms} ms before maturity")]
    SnapshotBeforeMaturity {
        /// Milliseconds until maturity
        remaining_ms: i64,
    },

    /// Settlement price is not a finite number.
    #[error("Invalid settlement price: {price}")]
    InvalidSettlementPrice {
        /// The rejected price
        price: f64,
    },

    /// Attempt to consume more than the record holds.
    #[error("Cannot consume {requested} from a record with {remaining} remaining")]
    Overconsumption {
        /// Requested quantity
        requested: u64,
        /// Quantity still on the record
        remaining: u64,
    },

    /// Operation not allowed in the record's current state.
    #[error("Operation '{operation}' not allowed in state {state:?}")]
    InvalidState {
        /// The attempted operation
        operation: &'static str,
        /// State the record was in
        state: LifecycleState,
    },
}

/// Lifecycle state of a record at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum LifecycleState {
    /// Issued but not yet acknowledged by the ledger.
    Created,
    /// Live, before maturity.
    Active,
    /// At or after maturity with quantity still outstanding.
    Matured,
    /// Fully paid out against a settlement price.
    Settled,
    /// Fully consumed by early closure.
    Closed,
}

impl LifecycleState {
    /// Whether no further operations apply.
    pub fn is_terminal(&self) -> bool {
        matches!(self, LifecycleState::Settled | LifecycleState::Closed)
    }
}

/// One side of a contract.
///
/// # Examples
/// ```
/// use cashopt_engine::contract::{Direction, OptionKind};
/// use cashopt_engine::records::{LifecycleState, OptionRecord};
///
/// let maturity = 1_675_411_200_000;
/// let mut record = OptionRecord::new(OptionKind::Call, Direction::Long, 18.0, maturity, 5).unwrap();
///
/// assert_eq!(record.state(maturity - 1), LifecycleState::Active);
/// record.consume(2).unwrap();
/// assert_eq!(record.remaining(), 3);
///
/// record.record_settlement_price(20.0, maturity).unwrap();
/// assert!(record.record_settlement_price(21.0, maturity).is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RecordFields"))]
pub struct OptionRecord {
    kind: OptionKind,
    direction: Direction,
    strike: f64,
    maturity_ms: i64,
    amount: u64,
    remaining: u64,
    settlement_price: Option<f64>,
    #[cfg_attr(feature = "serde", serde(skip))]
    pending: bool,
}

/// Unvalidated record fields as they arrive from a caller.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
pub struct RecordFields {
    /// Option kind
    pub kind: OptionKind,
    /// Side
    pub direction: Direction,
    /// Strike price
    pub strike: f64,
    /// Maturity, UTC milliseconds
    pub maturity_ms: i64,
    /// Issued amount
    pub amount: u64,
    /// Amount not yet closed or settled; defaults to `amount`
    #[cfg_attr(feature = "serde", serde(default))]
    pub remaining: Option<u64>,
    /// Settlement price snapshot, if already recorded
    #[cfg_attr(feature = "serde", serde(default))]
    pub settlement_price: Option<f64>,
}

impl TryFrom<RecordFields> for OptionRecord {
    type Error = LifecycleError;

    fn try_from(fields: RecordFields) -> Result<Self, Self::Error> {
        let mut record = OptionRecord::new(
            fields.kind,
            fields.direction,
            fields.strike,
            fields.maturity_ms,
            fields.amount,
        )?;

        if let Some(remaining) = fields.remaining {
            if remaining > fields.amount {
                return Err(LifecycleError::RemainingExceedsAmount {
                    amount: fields.amount,
                    remaining,
                });
            }
            record.remaining = remaining;
        }

        if let Some(price) = fields.settlement_price {
            if !price.is_finite() {
                return Err(LifecycleError::InvalidSettlementPrice { price });
            }
            record.settlement_price = Some(price);
        }

        Ok(record)
    }
}

impl OptionRecord {
    /// Builds a live record as supplied by the ledger.
    ///
    /// # Errors
    /// - [`LifecycleError::InvalidStrike`] unless the strike is positive and finite
    /// - [`LifecycleError::ZeroAmount`] if `amount == 0`
    pub fn new(
        kind: OptionKind,
        direction: Direction,
        strike: f64,
        maturity_ms: i64,
        amount: u64,
    ) -> Result<Self, LifecycleError> {
        if !(strike.is_finite() && strike > 0.0) {
            return Err(LifecycleError::InvalidStrike { strike });
        }
        if amount == 0 {
            return Err(LifecycleError::ZeroAmount);
        }

        Ok(Self {
            kind,
            direction,
            strike,
            maturity_ms,
            amount,
            remaining: amount,
            settlement_price: None,
            pending: false,
        })
    }

    /// Builds the Long and Short records of a freshly issued contract.
    ///
    /// Both start in [`LifecycleState::Created`] until [`activate`](Self::activate)
    /// is called with a time before maturity.
    pub fn issue(
        kind: OptionKind,
        strike: f64,
        maturity_ms: i64,
        amount: u64,
    ) -> Result<(Self, Self), LifecycleError> {
        let mut long = Self::new(kind, Direction::Long, strike, maturity_ms, amount)?;
        long.pending = true;
        let mut short = long.clone();
        short.direction = Direction::Short;
        Ok((long, short))
    }

    /// Marks an issued record live.
    ///
    /// # Errors
    /// [`LifecycleError::InvalidState`] if the record is not in `Created`, or
    /// if the contract has already matured at `now_ms`.
    pub fn activate(&mut self, now_ms: i64) -> Result<(), LifecycleError> {
        if !self.pending || is_matured(now_ms, self.maturity_ms) {
            return Err(self.reject("activate", now_ms));
        }
        self.pending = false;
        Ok(())
    }

    /// Option kind.
    pub fn kind(&self) -> OptionKind {
        self.kind
    }

    /// Side.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Strike price.
    pub fn strike(&self) -> f64 {
        self.strike
    }

    /// Maturity, UTC milliseconds.
    pub fn maturity_ms(&self) -> i64 {
        self.maturity_ms
    }

    /// Amount issued.
    pub fn amount(&self) -> u64 {
        self.amount
    }

    /// Amount not yet closed or settled.
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Settlement price snapshot, once recorded.
    pub fn settlement_price(&self) -> Option<f64> {
        self.settlement_price
    }

    /// Contract identity.
    pub fn key(&self) -> ContractKey {
        ContractKey::new(self.kind, self.strike, self.maturity_ms)
    }

    /// Contract identity with side.
    pub fn position_key(&self) -> PositionKey {
        PositionKey {
            contract: self.key(),
            direction: self.direction,
        }
    }

    /// Key an opposing record must have.
    pub fn opposing_key(&self) -> PositionKey {
        self.key().opposing(self.direction)
    }

    /// Years to maturity at `now_ms`; `<= 0` once matured.
    pub fn time_to_expiry(&self, now_ms: i64) -> f64 {
        time_to_expiry(now_ms, self.maturity_ms)
    }

    /// State at `now_ms`.
    pub fn state(&self, now_ms: i64) -> LifecycleState {
        if self.pending {
            LifecycleState::Created
        } else if self.remaining == 0 {
            if self.settlement_price.is_some() {
                LifecycleState::Settled
            } else {
                LifecycleState::Closed
            }
        } else if is_matured(now_ms, self.maturity_ms) {
            LifecycleState::Matured
        } else {
            LifecycleState::Active
        }
    }

    /// Records the settlement price snapshot.
    ///
    /// The snapshot is set once, at or after maturity, and never changes.
    /// Zero or stale prices are accepted as given.
    pub fn record_settlement_price(
        &mut self,
        price: f64,
        now_ms: i64,
    ) -> Result<(), LifecycleError> {
        if let Some(existing) = self.settlement_price {
            tracing::warn!(existing, offered = price, "settlement price already recorded");
            return Err(LifecycleError::SnapshotAlreadySet { existing });
        }
        if !is_matured(now_ms, self.maturity_ms) {
            let remaining_ms = self.maturity_ms.saturating_sub(now_ms);
            tracing::warn!(remaining_ms, "settlement price offered before maturity");
            return Err(LifecycleError::SnapshotBeforeMaturity { remaining_ms });
        }
        if !price.is_finite() {
            return Err(LifecycleError::InvalidSettlementPrice { price });
        }
        self.settlement_price = Some(price);
        Ok(())
    }

    /// Removes `quantity` from the remaining amount.
    ///
    /// Returns the amount left afterwards. Consuming 0 is a no-op.
    pub fn consume(&mut self, quantity: u64) -> Result<u64, LifecycleError> {
        if quantity > self.remaining {
            tracing::warn!(
                requested = quantity,
                remaining = self.remaining,
                "rejected over-consumption"
            );
            return Err(LifecycleError::Overconsumption {
                requested: quantity,
                remaining: self.remaining,
            });
        }
        self.remaining -= quantity;
        Ok(self.remaining)
    }

    pub(crate) fn reject(&self, operation: &'static str, now_ms: i64) -> LifecycleError {
        let state = self.state(now_ms);
        tracing::debug!(operation, ?state, key = ?self.position_key(), "lifecycle rejection");
        LifecycleError::InvalidState { operation, state }
    }
}
