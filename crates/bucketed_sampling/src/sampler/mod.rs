//! src/sampler/mod.rs
//!
//! Length-bucketed batch sampling.
//!
//! Feeds variable-duration examples into synchronous multi-process training with
//! reproducible, load-balanced batches. The sampler only sees one length per
//! example and only produces batches of example indices; fetching and collating
//! the examples is left to the data-loading machinery.
//!
//! # Data flow
//!
//! ```text
//!        lengths (one per example)       boundaries
//!                  │                          │
//!                  └────────────┬─────────────┘
//!                               ↓
//!                        ┌─────────────┐
//!                        │  bucketing  │  bisect each length, drop empty buckets
//!                        └──────┬──────┘
//!                               ↓ buckets (once per sampler)
//!                        ┌─────────────┐
//!                        │   padding   │  round up to batch_size × num_replicas
//!                        └──────┬──────┘
//!                               ↓ samples per bucket (once per sampler)
//!                        ┌─────────────┐
//!         epoch ───────→ │   shuffle   │  EpochShuffler seeded by the epoch
//!                        └──────┬──────┘
//!                               ↓
//!                        ┌─────────────┐
//!                        │  batching   │  extend, shard by rank, chunk, shuffle
//!                        └──────┬──────┘
//!                               ↓
//!                         Vec<Batch> for this replica (once per epoch)
//! ```
//!
//! # Module Structure
//!
//! ```text
//! src/sampler/
//! ├── mod.rs          # Sampler trait + re-exports
//! ├── bucketing.rs    # Boundaries, bisect, Buckets
//! ├── padding.rs      # plan_padding
//! ├── shuffle.rs      # EpochShuffler
//! ├── batching.rs     # build_batches, build_unbucketed_batches, ReplicaShard
//! └── bucket.rs       # BucketSampler, ShardingMode
//! ```
//!
//! # Concurrency
//! Sampling is a pure, synchronous computation. Replicas agree on their batch
//! assignment only through identical inputs (lengths, boundaries, epoch, seed);
//! there is no locking and no message passing. The batches a replica receives
//! can be fanned out to loader threads without further coordination.

mod batching;
mod bucket;
mod bucketing;
mod padding;
mod shuffle;

pub use batching::{build_batches, build_unbucketed_batches, Batch, ReplicaShard};
pub use bucket::{BucketSampler, ShardingMode};
pub use bucketing::{bisect, Boundaries, Buckets};
pub use padding::{padding_for, plan_padding};
pub use shuffle::{permutation, EpochShuffler};

/// A `Sampler` defines the order in which items are drawn for one epoch.
///
/// # Method
/// - `iter(epoch)`: returns the sequence for that epoch. The same `epoch`
///   always yields the same sequence.
///
/// Implementations must be `Send + Sync` so a sampler can be shared across
/// loader threads.
pub trait Sampler: Send + Sync {
    type Item: Send + Sync;

    fn iter(&self, epoch: usize) -> Box<dyn Iterator<Item = Self::Item> + Send + '_>;
}
