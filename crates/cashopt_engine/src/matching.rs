//! Early closure of opposing positions.
//!
//! A holder of both sides of the same contract can cancel them against each
//! other before maturity and recover the collateral. Opposing records are
//! found by structured key: same kind, strike and maturity, other direction.

use cashopt_core::types::time::is_matured;
use cashopt_core::types::CollateralAsset;
use thiserror::Error;

use crate::records::{LifecycleError, LifecycleState, OptionRecord};
use crate::settlement::pledged_collateral;

/// Matching errors.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MatchError {
    /// The two records are not opposite sides of one contract.
    #[error("Records are not an opposing pair: {reason}")]
    NotOpposing {
        /// Which field differs
        reason: &'static str,
    },

    /// Early closure is only possible before maturity.
    #[error("Contract matured at {maturity_ms}; early closure no longer possible")]
    Matured {
        /// Maturity, UTC milliseconds
        maturity_ms: i64,
    },

    /// A record rejected the consumption.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

fn check_opposing(a: &OptionRecord, b: &OptionRecord) -> Result<(), MatchError> {
    let reason = if a.kind() != b.kind() {
        "option kind"
    } else if a.key().strike_cents != b.key().strike_cents {
        "strike"
    } else if a.maturity_ms() != b.maturity_ms() {
        "maturity"
    } else if a.direction() == b.direction() {
        "direction"
    } else {
        return Ok(());
    };
    Err(MatchError::NotOpposing { reason })
}

/// Quantity that can be closed between two opposing records.
///
/// `min(a.remaining, b.remaining)`; 0 means nothing to close.
///
/// # Errors
/// [`MatchError::NotOpposing`] unless the records share kind, strike and
/// maturity and face opposite directions.
///
/// # Examples
/// ```
/// use cashopt_engine::contract::OptionKind;
/// use cashopt_engine::matching::eligible_close;
/// use cashopt_engine::records::OptionRecord;
///
/// let (mut long, short) = OptionRecord::issue(OptionKind::Call, 18.0, 1_675_411_200_000, 3).unwrap();
/// assert_eq!(eligible_close(&long, &short).unwrap(), 3);
///
/// long.consume(3).unwrap();
/// assert_eq!(eligible_close(&long, &short).unwrap(), 0);
/// ```
pub fn eligible_close(a: &OptionRecord, b: &OptionRecord) -> Result<u64, MatchError> {
    check_opposing(a, b)?;
    Ok(a.remaining().min(b.remaining()))
}

/// First candidate that opposes `position` and still has quantity left.
pub fn find_opposing<'a>(
    position: &OptionRecord,
    candidates: &'a [OptionRecord],
) -> Option<&'a OptionRecord> {
    find_opposing_index(position, candidates).map(|index| &candidates[index])
}

/// Index of the first candidate [`find_opposing`] would return.
pub fn find_opposing_index(position: &OptionRecord, candidates: &[OptionRecord]) -> Option<usize> {
    let wanted = position.opposing_key();
    candidates
        .iter()
        .position(|candidate| candidate.remaining() > 0 && candidate.position_key() == wanted)
}

/// Outcome of an early closure.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Closure {
    /// Contracts cancelled on each side.
    pub quantity: u64,
    /// Asset of the released collateral.
    pub asset: CollateralAsset,
    /// Collateral returned to the holder.
    pub released: f64,
}

/// Cancels the eligible quantity from both records.
///
/// Closing nothing is not an error: with nothing remaining on either side
/// the result has `quantity == 0` and neither record changes.
///
/// # Errors
/// - [`MatchError::NotOpposing`] if the records do not pair up
/// - [`MatchError::Matured`] at or after maturity
pub fn close_pair(
    a: &mut OptionRecord,
    b: &mut OptionRecord,
    now_ms: i64,
) -> Result<Closure, MatchError> {
    let quantity = eligible_close(a, b)?;
    if is_matured(now_ms, a.maturity_ms()) {
        tracing::debug!(key = ?a.key(), now_ms, "early closure after maturity rejected");
        return Err(MatchError::Matured {
            maturity_ms: a.maturity_ms(),
        });
    }

    for record in [&*a, &*b] {
        if record.state(now_ms) == LifecycleState::Created {
            return Err(record.reject("close", now_ms).into());
        }
    }

    a.consume(quantity)?;
    b.consume(quantity)?;

    let closure = Closure {
        quantity,
        asset: a.kind().collateral_asset(),
        released: pledged_collateral(a.kind(), a.strike(), quantity),
    };
    if quantity == 0 {
        tracing::debug!(key = ?a.key(), "nothing to close");
    }
    Ok(closure)
}
