//! Call and put volume per bucket.
//!
//! Charts are drawn with a fixed set of columns, so the aggregator returns a
//! bucket for every requested key, zero-filled when no record falls into it.
//! Records whose key was not requested are left out of the buckets.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::AddAssign;

use rayon::prelude::*;

use crate::contract::OptionKind;
use crate::records::OptionRecord;

/// Accumulated volume for one key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VolumeBucket {
    /// Call volume.
    pub call: u64,
    /// Put volume.
    pub put: u64,
}

impl VolumeBucket {
    /// Adds `amount` to the side matching `kind`.
    pub fn add(&mut self, kind: OptionKind, amount: u64) {
        match kind {
            OptionKind::Call => self.call = self.call.saturating_add(amount),
            OptionKind::Put => self.put = self.put.saturating_add(amount),
        }
    }

    /// Call plus put volume.
    pub fn total(&self) -> u64 {
        self.call.saturating_add(self.put)
    }
}

impl AddAssign for VolumeBucket {
    fn add_assign(&mut self, other: Self) {
        self.call = self.call.saturating_add(other.call);
        self.put = self.put.saturating_add(other.put);
    }
}

/// Total call and put volume across all records.
pub type VolumeTotals = VolumeBucket;

/// Field records are bucketed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum BucketBy {
    /// Maturity timestamp, UTC milliseconds.
    Maturity,
    /// Strike in hundredths.
    Strike,
}

impl BucketBy {
    /// Bucket key of a record.
    pub fn key(&self, record: &OptionRecord) -> i64 {
        match self {
            BucketBy::Maturity => record.maturity_ms(),
            BucketBy::Strike => {
                let cents = record.key().strike_cents;
                i64::try_from(cents).unwrap_or(i64::MAX)
            }
        }
    }
}

fn zero_filled<K: Ord + Clone>(keys: &[K]) -> BTreeMap<K, VolumeBucket> {
    keys.iter()
        .cloned()
        .map(|key| (key, VolumeBucket::default()))
        .collect()
}

/// Sums issued volume per requested key.
///
/// Every key in `keys` is present in the result; duplicate keys collapse.
///
/// # Examples
/// ```
/// use cashopt_engine::analytics::aggregate;
/// use cashopt_engine::contract::{Direction, OptionKind};
/// use cashopt_engine::records::OptionRecord;
///
/// let at = |kind, maturity| OptionRecord::new(kind, Direction::Long, 18.0, maturity, 1).unwrap();
/// let records = vec![at(OptionKind::Call, 100), at(OptionKind::Call, 100), at(OptionKind::Put, 100)];
///
/// let buckets = aggregate(&records, &[100, 200, 300], |r| r.maturity_ms());
/// assert_eq!((buckets[&100].call, buckets[&100].put), (2, 1));
/// assert_eq!(buckets[&200].total(), 0);
/// assert_eq!(buckets[&300].total(), 0);
/// ```
pub fn aggregate<K, F>(records: &[OptionRecord], keys: &[K], key_of: F) -> BTreeMap<K, VolumeBucket>
where
    K: Ord + Clone,
    F: Fn(&OptionRecord) -> K,
{
    let mut buckets = zero_filled(keys);
    let mut dropped = 0usize;

    for record in records {
        match buckets.get_mut(&key_of(record)) {
            Some(bucket) => bucket.add(record.kind(), record.amount()),
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        tracing::debug!(dropped, requested = keys.len(), "records outside requested buckets");
    }
    buckets
}

/// [`aggregate`] keyed by maturity or strike.
pub fn aggregate_by(records: &[OptionRecord], keys: &[i64], by: BucketBy) -> BTreeMap<i64, VolumeBucket> {
    aggregate(records, keys, |record| by.key(record))
}

/// Parallel [`aggregate`] for large record batches.
///
/// Produces the same mapping as the sequential version.
pub fn aggregate_par<K, F>(records: &[OptionRecord], keys: &[K], key_of: F) -> BTreeMap<K, VolumeBucket>
where
    K: Ord + Clone + Send + Sync,
    F: Fn(&OptionRecord) -> K + Sync,
{
    let requested: BTreeSet<K> = keys.iter().cloned().collect();

    let partial = records
        .par_iter()
        .fold(BTreeMap::new, |mut acc: BTreeMap<K, VolumeBucket>, record| {
            let key = key_of(record);
            if requested.contains(&key) {
                acc.entry(key).or_default().add(record.kind(), record.amount());
            }
            acc
        })
        .reduce(BTreeMap::new, |mut a, b| {
            for (key, bucket) in b {
                *a.entry(key).or_default() += bucket;
            }
            a
        });

    let mut buckets = zero_filled(keys);
    for (key, bucket) in partial {
        *buckets.entry(key).or_default() += bucket;
    }
    buckets
}

/// Total call and put volume over all records.
pub fn totals(records: &[OptionRecord]) -> VolumeTotals {
    records.iter().fold(VolumeTotals::default(), |mut acc, record| {
        acc.add(record.kind(), record.amount());
        acc
    })
}
