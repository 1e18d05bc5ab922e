//! src/sampler/bucketing.rs
//!
//! Assigns examples to length buckets defined by a sorted boundary list.
//!
//! Bucket `i` admits every example whose length `l` satisfies
//! `boundaries[i] < l <= boundaries[i + 1]`. Examples with
//! `l <= boundaries[0]` or `l > boundaries[last]` are excluded from every bucket.
//!
//! ```text
//! boundaries = [0, 10, 20, 40]
//!
//!   bucket 0: (0, 10]    bucket 1: (10, 20]    bucket 2: (20, 40]
//!
//! lengths = [5, 12, 7, 30, 9, 14]
//!   bucket 0: [0, 2, 4]  bucket 1: [1, 5]      bucket 2: [3]
//! ```

use anyhow::{ensure, Result};
use tracing::{debug, info};

/// A strictly increasing list of length thresholds with at least two entries.
///
/// The caller's list is taken by value and never mutated afterwards; bucket
/// construction refines a private copy (see [`Buckets::build`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Boundaries(Vec<usize>);

impl Boundaries {
    pub fn new(boundaries: Vec<usize>) -> Result<Self> {
        ensure!(
            boundaries.len() >= 2,
            "At least 2 boundaries are required to form a bucket, but got {:?}",
            boundaries
        );
        ensure!(
            boundaries.windows(2).all(|pair| pair[0] < pair[1]),
            "Boundaries must be strictly increasing, but got {:?}",
            boundaries
        );
        Ok(Self(boundaries))
    }

    /// Derives boundaries that split `lengths` into `num_buckets` ranges holding
    /// roughly the same number of examples.
    ///
    /// The first boundary sits one below the shortest length so the shortest
    /// examples are admitted; the last boundary is the longest length. Quantiles
    /// that coincide are collapsed, so heavily repeated lengths can yield fewer
    /// than `num_buckets` ranges.
    ///
    /// Examples of length 0 can never be admitted, since bucket ranges are open
    /// on the left.
    pub fn from_quantiles(lengths: &[usize], num_buckets: usize) -> Result<Self> {
        ensure!(
            num_buckets > 0,
            "num_buckets must be >= 1, but got num_buckets={}",
            num_buckets
        );
        ensure!(
            !lengths.is_empty(),
            "Cannot derive quantile boundaries from an empty length index"
        );

        let mut sorted = lengths.to_vec();
        sorted.sort_unstable();
        let n = sorted.len();

        let mut boundaries = Vec::with_capacity(num_buckets + 1);
        boundaries.push(sorted[0].saturating_sub(1));
        for k in 1..num_buckets {
            // Upper (inclusive) edge of the k-th equal-count chunk.
            let position = (k * n / num_buckets).saturating_sub(1);
            boundaries.push(sorted[position]);
        }
        boundaries.push(sorted[n - 1]);
        boundaries.dedup();

        Self::new(boundaries)
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    /// Number of `(b_i, b_{i+1}]` ranges described by this list.
    pub fn num_ranges(&self) -> usize {
        self.0.len() - 1
    }

    /// Returns the bucket that admits `length`, or `None` when it falls
    /// outside every range.
    pub fn assign(&self, length: usize) -> Option<usize> {
        bisect(length, &self.0)
    }
}

/// Finds the unique `i` with `boundaries[i] < length <= boundaries[i + 1]`.
///
/// Returns `None` for lengths outside `(boundaries[0], boundaries[last]]` and for
/// boundary lists with fewer than two entries. `boundaries` must be strictly
/// increasing.
pub fn bisect(length: usize, boundaries: &[usize]) -> Option<usize> {
    if boundaries.len() < 2 {
        return None;
    }

    // Invariant: a matching range index, if any, lies in `lo..hi`.
    let (mut lo, mut hi) = (0, boundaries.len() - 1);
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if length <= boundaries[mid] {
            hi = mid;
        } else if length > boundaries[mid + 1] {
            lo = mid + 1;
        } else {
            return Some(mid);
        }
    }
    None
}

/// Example indices grouped by length range, with empty ranges removed.
///
/// `boundaries()` and `as_slice()` stay index-aligned: bucket `i` holds the
/// examples admitted by `(boundaries()[i], boundaries()[i + 1]]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Buckets {
    boundaries: Vec<usize>,
    buckets: Vec<Vec<usize>>,
}

impl Buckets {
    /// Assigns every example index to its bucket, then drops empty buckets
    /// together with their upper boundary.
    ///
    /// Dropping an empty bucket widens its successor's range downwards. Since
    /// the dropped range held no examples, every retained index still maps to
    /// the same bucket under the refined boundaries.
    ///
    /// If every bucket is empty the refined boundary list collapses to a single
    /// entry and there are zero buckets.
    pub fn build(lengths: &[usize], boundaries: &Boundaries) -> Self {
        let mut refined = boundaries.as_slice().to_vec();
        let mut buckets = vec![Vec::new(); boundaries.num_ranges()];

        for (index, &length) in lengths.iter().enumerate() {
            if let Some(bucket) = bisect(length, &refined) {
                buckets[bucket].push(index);
            }
        }

        let mut dropped = 0usize;
        for i in (0..buckets.len()).rev() {
            if buckets[i].is_empty() {
                buckets.remove(i);
                refined.remove(i + 1);
                dropped += 1;
            }
        }

        if buckets.is_empty() {
            info!(
                boundaries = ?boundaries.as_slice(),
                num_examples = lengths.len(),
                "No example length falls inside the boundaries; sampler will yield no batches"
            );
        } else if dropped > 0 {
            info!(
                dropped,
                boundaries = ?refined,
                "Dropped empty length buckets"
            );
        }

        let buckets = Self {
            boundaries: refined,
            buckets,
        };
        debug!(sizes = ?buckets.sizes(), "Built length buckets");
        buckets
    }

    /// The refined boundary list after empty buckets were removed.
    pub fn boundaries(&self) -> &[usize] {
        &self.boundaries
    }

    pub fn as_slice(&self) -> &[Vec<usize>] {
        &self.buckets
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn sizes(&self) -> Vec<usize> {
        self.buckets.iter().map(Vec::len).collect()
    }

    /// Number of examples retained across all buckets.
    pub fn num_examples(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }
}
