pub mod config;
pub mod lengths;
pub mod sampler;

pub use config::{SamplerConfig, SamplerConfigBuilder};
pub use lengths::{LengthIndex, SequenceLengths};
pub use sampler::{Batch, BucketSampler, Sampler, ShardingMode};
