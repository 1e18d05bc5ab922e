//! Padding plan that rounds every bucket up to whole batches on every replica.
//!
//! "Padding" here means repeating example indices, never padding tensor content.

use anyhow::{anyhow, ensure, Result};

/// Number of repeated indices needed to round `bucket_size` up to a multiple of
/// `total_batch_size`. Zero when it already divides evenly.
#[inline]
pub fn padding_for(bucket_size: usize, total_batch_size: usize) -> usize {
    (total_batch_size - bucket_size % total_batch_size) % total_batch_size
}

/// Computes the padded size of every bucket.
///
/// Each entry is the bucket size rounded up to the next multiple of
/// `batch_size * num_replicas`, so every replica receives the same number of
/// complete batches from every bucket.
///
/// # Example
/// ```ignore
/// // batch_size = 2, num_replicas = 1
/// assert_eq!(plan_padding(&[3, 2, 1], 2, 1)?, vec![4, 2, 2]);
/// ```
pub fn plan_padding(
    bucket_sizes: &[usize],
    batch_size: usize,
    num_replicas: usize,
) -> Result<Vec<usize>> {
    ensure!(
        batch_size > 0,
        "batch_size must be > 0, but got batch_size={}",
        batch_size
    );
    ensure!(
        num_replicas > 0,
        "num_replicas must be > 0, but got num_replicas={}",
        num_replicas
    );
    let total_batch_size = batch_size
        .checked_mul(num_replicas)
        .ok_or_else(|| anyhow!("Total batch size overflow"))?;

    bucket_sizes
        .iter()
        .map(|&size| {
            size.checked_add(padding_for(size, total_batch_size))
                .ok_or_else(|| anyhow!("Padded size overflow for bucket of size {}", size))
        })
        .collect()
}
