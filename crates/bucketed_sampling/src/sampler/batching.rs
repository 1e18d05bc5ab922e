//! Turns padded buckets into the batch list owned by one replica.
//!
//! # Per-bucket pipeline
//! ```text
//! bucket            [a, b, c]            (padded size 4, batch_size 1, 2 replicas)
//!   1. permute      [c, a, b]            (EpochShuffler, or identity)
//!   2. extend       [c, a, b, c]         (cyclic repetition up to the padded size)
//!   3. shard        rank 0: [c, b]       (every `num_replicas`-th element from `rank`)
//!                   rank 1: [a, c]
//!   4. chunk        rank 0: [[c], [b]]   (exact chunks of `batch_size`)
//! ```
//! 5. Batches from all buckets are concatenated, then the batch order itself is
//!    shuffled with the same generator.
//!
//! All randomness for an epoch comes from one generator drawn in a fixed order:
//! one permutation per bucket (in bucket order), then one permutation of the batch
//! list. Every replica performs the same draws, so the extended sequences agree
//! and the stride slices partition them.

use anyhow::{ensure, Result};

use super::shuffle::EpochShuffler;

/// An ordered group of exactly `batch_size` example indices from one bucket.
pub type Batch = Vec<usize>;

/// The slice of each epoch owned by one cooperating process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplicaShard {
    pub rank: usize,
    pub num_replicas: usize,
}

impl ReplicaShard {
    pub fn new(rank: usize, num_replicas: usize) -> Result<Self> {
        ensure!(num_replicas > 0, "Number of replicas must be > 0");
        ensure!(
            rank < num_replicas,
            "Invalid rank {rank}, rank should be in the interval [0, {}]",
            num_replicas - 1
        );
        Ok(Self { rank, num_replicas })
    }

    /// A single process owning the whole epoch.
    pub const fn single() -> Self {
        Self {
            rank: 0,
            num_replicas: 1,
        }
    }
}

impl Default for ReplicaShard {
    fn default() -> Self {
        Self::single()
    }
}

/// Builds the batch list of one replica for one epoch.
///
/// # Arguments:
/// - `buckets`: Example indices per bucket. No bucket may be empty unless its
///              padded size is also zero.
/// - `samples_per_bucket`: Padded size per bucket, a multiple of
///                         `batch_size * shard.num_replicas` (see `plan_padding`).
/// - `batch_size`: Indices per batch. Must be >= 1.
/// - `shard`: Which stride of the extended sequence this replica keeps.
/// - `shuffler`: Epoch generator. `None` keeps bucket order and batch order fixed.
///
/// # Panics
/// If the rank-local sequence of a bucket does not split into whole batches.
/// That means `samples_per_bucket` was not planned for this `batch_size` and
/// replica count, and continuing would emit a short batch.
pub fn build_batches(
    buckets: &[Vec<usize>],
    samples_per_bucket: &[usize],
    batch_size: usize,
    shard: ReplicaShard,
    mut shuffler: Option<EpochShuffler>,
) -> Vec<Batch> {
    assert!(batch_size > 0, "batch_size must be > 0");
    assert_eq!(
        buckets.len(),
        samples_per_bucket.len(),
        "Every bucket needs a padded size"
    );

    let orders: Vec<Vec<usize>> = buckets
        .iter()
        .map(|bucket| match shuffler.as_mut() {
            Some(shuffler) => shuffler.permutation(bucket.len()),
            None => (0..bucket.len()).collect(),
        })
        .collect();

    let mut batches = Vec::new();
    for ((bucket, order), &padded_size) in buckets.iter().zip(&orders).zip(samples_per_bucket) {
        assert!(
            padded_size >= bucket.len() && (padded_size == 0 || !bucket.is_empty()),
            "Padded size {} is inconsistent with bucket of size {}",
            padded_size,
            bucket.len()
        );

        let local: Vec<usize> = order
            .iter()
            .cycle()
            .take(padded_size)
            .skip(shard.rank)
            .step_by(shard.num_replicas)
            .map(|&position| bucket[position])
            .collect();

        let chunks = local.chunks_exact(batch_size);
        assert!(
            chunks.remainder().is_empty(),
            "Rank {} holds {} indices from a bucket, not a multiple of batch_size={}",
            shard.rank,
            local.len(),
            batch_size
        );
        batches.extend(chunks.map(<[usize]>::to_vec));
    }

    if let Some(shuffler) = shuffler.as_mut() {
        shuffler.shuffle(&mut batches);
    }
    batches
}

/// Builds batches without length stratification.
///
/// Draws successive permutations of the whole dataset (`0..dataset_size`) until
/// `total_size` indices are collected, then chunks them into `batch_size`
/// groups. `total_size` comes from the bucket bookkeeping so the batch count
/// matches what the bucketed modes report.
pub fn build_unbucketed_batches(
    dataset_size: usize,
    total_size: usize,
    batch_size: usize,
    mut shuffler: Option<EpochShuffler>,
) -> Vec<Batch> {
    assert!(batch_size > 0, "batch_size must be > 0");
    if dataset_size == 0 {
        return Vec::new();
    }

    let mut indices = Vec::with_capacity(total_size);
    while indices.len() < total_size {
        let order = match shuffler.as_mut() {
            Some(shuffler) => shuffler.permutation(dataset_size),
            None => (0..dataset_size).collect(),
        };
        let needed = total_size - indices.len();
        indices.extend(order.into_iter().take(needed));
    }

    let chunks = indices.chunks_exact(batch_size);
    assert!(
        chunks.remainder().is_empty(),
        "total_size={} is not a multiple of batch_size={}",
        total_size,
        batch_size
    );
    chunks.map(<[usize]>::to_vec).collect()
}
