use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

use super::batching::{build_batches, build_unbucketed_batches, Batch, ReplicaShard};
use super::bucketing::{Boundaries, Buckets};
use super::padding::plan_padding;
use super::shuffle::EpochShuffler;
use super::Sampler;
use crate::config::SamplerConfig;
use crate::lengths::SequenceLengths;

/// How a [`BucketSampler`] turns buckets into batches. Fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ShardingMode {
    /// One process sees every batch.
    Local,
    /// Each of `num_replicas` processes keeps a disjoint stride of every bucket.
    Distributed { rank: usize, num_replicas: usize },
    /// Ignores length buckets and batches random permutations of the whole
    /// dataset. Bucket bookkeeping is still used to report the batch count.
    Unbucketed,
}

impl ShardingMode {
    pub fn shard(&self) -> ReplicaShard {
        match *self {
            ShardingMode::Distributed { rank, num_replicas } => ReplicaShard { rank, num_replicas },
            ShardingMode::Local | ShardingMode::Unbucketed => ReplicaShard::single(),
        }
    }
}

/// ============================================================================
/// Length-bucketed batch sampler for synchronous data-parallel training.
///
/// Groups examples of similar length into buckets, pads every bucket to whole
/// batches on every replica by repeating examples, and hands each replica a
/// disjoint share of every bucket. Batches never mix buckets.
///
/// # Arguments (via [`SamplerConfig`]):
/// - `batch_size`: Indices per batch
/// - `boundaries`: Strictly increasing length thresholds. See `bucketing`.
/// - `num_replicas`, `rank`: Distributed layout. `num_replicas = 1` is local.
/// - `shuffle`: Epoch-varying order. When `false`, every epoch is identical.
/// - `unbucketed`: Bypass length stratification.
/// - `seed`: Base seed shared by all replicas (epoch is added to it).
///
/// # Epoch contract
/// All randomness for an epoch is derived from the epoch counter. The training
/// loop must call [`set_epoch`](Self::set_epoch) before every epoch; iterating
/// again without advancing the counter replays the previous epoch's batches.
///
/// # Cross-replica agreement
/// Every replica constructed over the same lengths and configuration (except
/// `rank`) computes identical buckets and identical permutations, so their
/// batches partition the padded epoch with no coordination messages.
///
/// # Example
/// ```ignore
/// let config = SamplerConfig::builder()
///     .batch_size(16)
///     .boundaries(vec![32, 300, 400, 500, 600, 700, 800, 900, 1000])
///     .distributed(rank, world_size)
///     .build();
/// let sampler = BucketSampler::new(&lengths, &config)?;
///
/// for epoch in 0..num_epochs {
///     sampler.set_epoch(epoch);
///     for batch in &sampler {
///         // `batch` is a Vec<usize> of length 16, all from one bucket
///     }
/// }
/// ```
#[derive(Debug)]
pub struct BucketSampler {
    buckets: Buckets,
    samples_per_bucket: Vec<usize>,
    total_size: usize,
    dataset_size: usize,
    batch_size: usize,
    mode: ShardingMode,
    shuffle: bool,
    seed: u64,
    epoch: AtomicUsize,
}

impl BucketSampler {
    /// Builds buckets and the padding plan for `dataset`.
    ///
    /// Fails if the configuration is invalid (see [`SamplerConfig::validate`]).
    /// Lengths are read once; the sampler does not keep a reference to `dataset`.
    pub fn new<D>(dataset: &D, config: &SamplerConfig) -> Result<Self>
    where
        D: SequenceLengths + ?Sized,
    {
        config.validate()?;
        let boundaries = Boundaries::new(config.boundaries.clone())?;
        let mode = config.mode();

        let lengths = dataset.lengths();
        let buckets = Buckets::build(lengths, &boundaries);
        let samples_per_bucket =
            plan_padding(&buckets.sizes(), config.batch_size, mode.shard().num_replicas)?;
        let total_size: usize = samples_per_bucket.iter().sum();

        debug!(
            ?mode,
            num_buckets = buckets.len(),
            retained = buckets.num_examples(),
            dataset_size = lengths.len(),
            total_size,
            ?samples_per_bucket,
            "Constructed bucket sampler"
        );

        Ok(Self {
            buckets,
            samples_per_bucket,
            total_size,
            dataset_size: lengths.len(),
            batch_size: config.batch_size,
            mode,
            shuffle: config.shuffle,
            seed: config.seed,
            epoch: AtomicUsize::new(0),
        })
    }

    /// Single-process sampler with shuffling enabled.
    pub fn local<D>(dataset: &D, batch_size: usize, boundaries: Vec<usize>) -> Result<Self>
    where
        D: SequenceLengths + ?Sized,
    {
        let config = SamplerConfig::builder()
            .batch_size(batch_size)
            .boundaries(boundaries)
            .build();
        Self::new(dataset, &config)
    }

    /// Sampler for one of `num_replicas` cooperating processes.
    pub fn distributed<D>(
        dataset: &D,
        batch_size: usize,
        boundaries: Vec<usize>,
        rank: usize,
        num_replicas: usize,
        shuffle: bool,
    ) -> Result<Self>
    where
        D: SequenceLengths + ?Sized,
    {
        let config = SamplerConfig::builder()
            .batch_size(batch_size)
            .boundaries(boundaries)
            .distributed(rank, num_replicas)
            .shuffle(shuffle)
            .build();
        Self::new(dataset, &config)
    }

    /// Sampler that ignores buckets when drawing batches.
    pub fn unbucketed<D>(dataset: &D, batch_size: usize, boundaries: Vec<usize>) -> Result<Self>
    where
        D: SequenceLengths + ?Sized,
    {
        let config = SamplerConfig::builder()
            .batch_size(batch_size)
            .boundaries(boundaries)
            .unbucketed(true)
            .build();
        Self::new(dataset, &config)
    }

    /// Sets the epoch used by the next iteration.
    pub fn set_epoch(&self, epoch: usize) {
        self.epoch.store(epoch, Ordering::Relaxed);
    }

    pub fn epoch(&self) -> usize {
        self.epoch.load(Ordering::Relaxed)
    }

    /// Number of batches this process receives per epoch.
    pub fn len(&self) -> usize {
        match self.mode {
            ShardingMode::Distributed { num_replicas, .. } => {
                self.total_size / num_replicas / self.batch_size
            }
            ShardingMode::Local | ShardingMode::Unbucketed => self.total_size / self.batch_size,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Materialises the batches for the current epoch.
    pub fn batches(&self) -> Vec<Batch> {
        self.build_epoch(self.epoch())
    }

    pub fn buckets(&self) -> &[Vec<usize>] {
        self.buckets.as_slice()
    }

    /// Boundaries after empty buckets were removed.
    pub fn boundaries(&self) -> &[usize] {
        self.buckets.boundaries()
    }

    pub fn samples_per_bucket(&self) -> &[usize] {
        &self.samples_per_bucket
    }

    /// Sum of padded bucket sizes across all replicas.
    pub fn total_size(&self) -> usize {
        self.total_size
    }

    pub fn mode(&self) -> ShardingMode {
        self.mode
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn build_epoch(&self, epoch: usize) -> Vec<Batch> {
        let shuffler = self
            .shuffle
            .then(|| EpochShuffler::with_seed(self.seed, epoch));

        let batches = match self.mode {
            ShardingMode::Unbucketed => build_unbucketed_batches(
                self.dataset_size,
                self.total_size,
                self.batch_size,
                shuffler,
            ),
            ShardingMode::Local | ShardingMode::Distributed { .. } => build_batches(
                self.buckets.as_slice(),
                &self.samples_per_bucket,
                self.batch_size,
                self.mode.shard(),
                shuffler,
            ),
        };

        debug!(
            epoch,
            rank = self.mode.shard().rank,
            num_batches = batches.len(),
            "Built epoch batches"
        );
        batches
    }
}

impl Sampler for BucketSampler {
    type Item = Batch;

    /// Builds the batches for `epoch` without touching the epoch counter.
    fn iter(&self, epoch: usize) -> Box<dyn Iterator<Item = Batch> + Send + '_> {
        Box::new(self.build_epoch(epoch).into_iter())
    }
}

impl<'a> IntoIterator for &'a BucketSampler {
    type Item = Batch;
    type IntoIter = std::vec::IntoIter<Batch>;

    fn into_iter(self) -> Self::IntoIter {
        self.batches().into_iter()
    }
}
