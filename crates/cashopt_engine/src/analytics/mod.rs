//! Market analytics over batches of records.
//!
//! This module provides:
//! - Volume aggregation by maturity or strike, sequential and parallel
//! - The default strike ladder used as strike bucket keys

pub mod strikes;
pub mod volume;

pub use strikes::{strike_ladder, strike_ladder_keys};
pub use volume::{aggregate, aggregate_by, aggregate_par, totals, BucketBy, VolumeBucket, VolumeTotals};
