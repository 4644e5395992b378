//! Speed buckets
//!
//! Rates below 1024 bytes/ms are bucketed on a log2 scale, faster rates in
//! linear 512 bytes/ms bands with a single overflow bucket on top.

use std::collections::BTreeMap;
use tracing::{error, trace};

/// Index of the unbounded "very fast" bucket
pub const OVERFLOW_INDEX: i32 = -1;

/// Rates below this use the log scale
const LOG_SCALE_LIMIT: f64 = 1024.0;
/// Width of one linear band in bytes/ms
const LINEAR_BAND: f64 = 512.0;
const LINEAR_OFFSET: i32 = 4;
/// Linear indices at or above this collapse into the overflow bucket
const LINEAR_INDEX_LIMIT: i32 = 16;

/// Standard (index, threshold) rows
const STANDARD_ROWS: [(i32, u32); 12] = [
    (1, 32),
    (2, 64),
    (3, 128),
    (4, 256),
    (5, 512),
    (6, 1024),
    (7, 1536),
    (8, 2048),
    (9, 2560),
    (10, 3072),
    (11, 3584),
    (OVERFLOW_INDEX, 4096),
];

/// Bucket index for a rate in bytes/ms, or `None` when the rate carries no
/// signal (zero, negative, NaN).
pub fn bucket_index(rate: f64) -> Option<i32> {
    if rate.is_nan() || rate <= 0.0 {
        return None;
    }

    if rate < LOG_SCALE_LIMIT {
        let index = (rate.log2().floor() as i32) - 3;
        Some(index.max(1))
    } else {
        let index = ((rate / LINEAR_BAND).floor() as i32).saturating_add(LINEAR_OFFSET);
        if index >= LINEAR_INDEX_LIMIT {
            Some(OVERFLOW_INDEX)
        } else {
            Some(index)
        }
    }
}

/// Immutable mapping from bucket index to its speed threshold
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketTable {
    rows: BTreeMap<i32, u32>,
}

impl BucketTable {
    /// The fixed table used for reporting
    pub fn standard() -> Self {
        Self {
            rows: STANDARD_ROWS.into_iter().collect(),
        }
    }

    /// Threshold for a bucket index.
    ///
    /// Indices past the last bounded row are faster than every bounded
    /// threshold and resolve to the overflow bucket.
    pub fn threshold(&self, index: i32) -> Option<u32> {
        if let Some(threshold) = self.rows.get(&index) {
            return Some(*threshold);
        }
        match self.rows.keys().next_back() {
            Some(&last) if index > last => self.overflow_threshold(),
            _ => None,
        }
    }

    pub fn overflow_threshold(&self) -> Option<u32> {
        self.rows.get(&OVERFLOW_INDEX).copied()
    }

    /// Rows ordered by threshold
    pub fn rows(&self) -> Vec<(i32, u32)> {
        let mut rows: Vec<_> = self.rows.iter().map(|(i, t)| (*i, *t)).collect();
        rows.sort_by_key(|(_, threshold)| *threshold);
        rows
    }
}

impl Default for BucketTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Histogram of samples per bucket threshold
#[derive(Debug, Clone, Default)]
pub struct BucketAggregator {
    table: BucketTable,
    histogram: BTreeMap<u32, u64>,
}

impl BucketAggregator {
    pub fn new(table: BucketTable) -> Self {
        Self {
            table,
            histogram: BTreeMap::new(),
        }
    }

    /// Count `rate` in its bucket. Returns the threshold that was
    /// incremented, or `None` for a discarded sample.
    pub fn classify(&mut self, rate: f64) -> Option<u32> {
        let index = bucket_index(rate)?;
        let Some(threshold) = self.table.threshold(index) else {
            if cfg!(debug_assertions) {
                panic!("bucket index {} has no threshold", index);
            }
            error!(index, rate, "Bucket index has no threshold, sample dropped");
            return None;
        };

        *self.histogram.entry(threshold).or_insert(0) += 1;
        trace!(rate, index, threshold, "Classified sample");
        Some(threshold)
    }

    /// Current histogram without clearing it
    pub fn snapshot(&self) -> BTreeMap<u32, u64> {
        self.histogram.clone()
    }

    /// Return the histogram and start an empty one
    pub fn take(&mut self) -> BTreeMap<u32, u64> {
        std::mem::take(&mut self.histogram)
    }

    pub fn is_empty(&self) -> bool {
        self.histogram.is_empty()
    }
}
