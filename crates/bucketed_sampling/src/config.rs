//! src/config.rs
//!
//! Configuration for BucketSampler behaviour
//!
//! The `SamplerConfig` struct stores the parameters that control how examples
//! are bucketed, sharded and shuffled. It can be built in code or loaded from
//! JSON; missing JSON fields take their defaults.
//!
//! Example:
//! ```ignore
//! let config = SamplerConfig::builder()
//!     .batch_size(32)
//!     .boundaries(vec![32, 300, 400, 500, 600, 700, 800, 900, 1000])
//!     .distributed(rank, world_size)
//!     .build();
//!
//! let config = SamplerConfig::from_json_str(r#"{"batch_size": 32, "boundaries": [32, 300, 1000]}"#)?;
//! ```
//!
//! # Consistency across replicas:
//! Every replica must use the same `batch_size`, `boundaries`, `num_replicas`,
//! `shuffle` and `seed`. Only `rank` differs.

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::sampler::{Boundaries, ShardingMode};

/// Configuration for BucketSampler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Number of example indices per batch (must be > 0)
    pub batch_size: usize,
    /// Strictly increasing length thresholds, at least 2
    pub boundaries: Vec<usize>,
    /// Number of cooperating processes
    pub num_replicas: usize,
    /// Index of this process in `0..num_replicas`
    pub rank: usize,
    /// Whether batch contents and order vary per epoch
    pub shuffle: bool,
    /// Ignore length buckets when drawing batches (single process only)
    pub unbucketed: bool,
    /// Base seed; the epoch is added to it to seed each epoch's generator
    pub seed: u64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            batch_size: 1,
            boundaries: Vec::new(),
            num_replicas: 1,
            rank: 0,
            shuffle: true,
            unbucketed: false,
            seed: 0,
        }
    }
}

impl SamplerConfig {
    pub fn builder() -> SamplerConfigBuilder {
        SamplerConfigBuilder::default()
    }

    /// Parses and validates a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).context("Failed to parse sampler config JSON")?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read sampler config: {}", path.display()))?;
        Self::from_json_str(&json)
            .with_context(|| format!("Invalid sampler config: {}", path.display()))
    }

    /// Checks every field. Invalid configurations never degrade silently.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.batch_size > 0,
            "batch_size must be > 0, but got batch_size={}",
            self.batch_size
        );
        ensure!(self.num_replicas > 0, "Number of replicas must be > 0");
        ensure!(
            self.rank < self.num_replicas,
            "Invalid rank {}, rank should be in the interval [0, {}]",
            self.rank,
            self.num_replicas - 1
        );
        ensure!(
            !self.unbucketed || self.num_replicas == 1,
            "Unbucketed sampling is single-process only, but got num_replicas={}",
            self.num_replicas
        );
        Boundaries::new(self.boundaries.clone())?;
        Ok(())
    }

    /// The sharding mode implied by this configuration.
    pub fn mode(&self) -> ShardingMode {
        if self.unbucketed {
            ShardingMode::Unbucketed
        } else if self.num_replicas > 1 {
            ShardingMode::Distributed {
                rank: self.rank,
                num_replicas: self.num_replicas,
            }
        } else {
            ShardingMode::Local
        }
    }
}

/// Builder for SamplerConfig with method chaining
#[derive(Default)]
pub struct SamplerConfigBuilder {
    config: SamplerConfig,
}

impl SamplerConfigBuilder {
    /// Set the batch size (must be > 0)
    pub fn batch_size(mut self, size: usize) -> Self {
        self.config.batch_size = size;
        self
    }

    /// Set the bucket boundaries
    pub fn boundaries(mut self, boundaries: Vec<usize>) -> Self {
        self.config.boundaries = boundaries;
        self
    }

    /// Set this process's `rank` out of `num_replicas` cooperating processes.
    pub fn distributed(mut self, rank: usize, num_replicas: usize) -> Self {
        self.config.rank = rank;
        self.config.num_replicas = num_replicas;
        self
    }

    /// Set whether to shuffle every epoch
    pub fn shuffle(mut self, shuffle: bool) -> Self {
        self.config.shuffle = shuffle;
        self
    }

    /// Bypass length bucketing when drawing batches
    pub fn unbucketed(mut self, unbucketed: bool) -> Self {
        self.config.unbucketed = unbucketed;
        self
    }

    /// Set the base seed shared by all replicas.
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    /// Build the final configuration. Validation happens when a sampler is
    /// constructed from it.
    pub fn build(self) -> SamplerConfig {
        self.config
    }
}
