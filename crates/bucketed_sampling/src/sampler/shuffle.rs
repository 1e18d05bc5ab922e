use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// A deterministic generator seeded from the epoch.
///
/// Every replica constructs its own `EpochShuffler` from the same `(base_seed,
/// epoch)` pair and draws from it in the same order, so all replicas agree on
/// every permutation without exchanging any messages. The generator is always
/// passed explicitly; nothing here touches a process-wide RNG.
///
/// Seed derivation follows `base_seed + epoch` (wrapping). With `base_seed = 0`
/// the epoch is the only seed.
///
/// # Example
/// ```ignore
/// let mut a = EpochShuffler::new(3);
/// let mut b = EpochShuffler::new(3);
/// assert_eq!(a.permutation(10), b.permutation(10));
/// ```
#[derive(Debug, Clone)]
pub struct EpochShuffler {
    rng: StdRng,
}

impl EpochShuffler {
    pub fn new(epoch: usize) -> Self {
        Self::with_seed(0, epoch)
    }

    pub fn with_seed(base_seed: u64, epoch: usize) -> Self {
        Self {
            rng: StdRng::seed_from_u64(base_seed.wrapping_add(epoch as u64)),
        }
    }

    /// Draws the next permutation of `0..n` from this generator.
    pub fn permutation(&mut self, n: usize) -> Vec<usize> {
        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(&mut self.rng);
        order
    }

    /// Shuffles `items` in place with the next draw from this generator.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.rng);
    }
}

/// The first permutation drawn for `epoch`. A pure function of `(n, epoch)`.
pub fn permutation(n: usize, epoch: usize) -> Vec<usize> {
    EpochShuffler::new(epoch).permutation(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_a_permutation() {
        for n in [0, 1, 2, 17, 500] {
            let mut order = permutation(n, 4);
            assert_eq!(order.len(), n);
            order.sort_unstable();
            assert_eq!(order, (0..n).collect::<Vec<_>>());
        }
    }

    #[test]
    fn same_epoch_same_permutation() {
        assert_eq!(permutation(100, 9), permutation(100, 9));

        // Two independently constructed generators stand in for two processes.
        let mut replica_0 = EpochShuffler::new(9);
        let mut replica_1 = EpochShuffler::new(9);
        for n in [5, 50, 1, 30] {
            assert_eq!(replica_0.permutation(n), replica_1.permutation(n));
        }
    }

    #[test]
    fn different_epochs_differ() {
        assert_ne!(permutation(100, 0), permutation(100, 1));
    }

    #[test]
    fn base_seed_offsets_the_epoch() {
        let mut offset = EpochShuffler::with_seed(10, 5);
        let mut plain = EpochShuffler::new(15);
        assert_eq!(offset.permutation(64), plain.permutation(64));
    }

    #[test]
    fn successive_draws_advance_the_generator() {
        let mut shuffler = EpochShuffler::new(0);
        let first = shuffler.permutation(100);
        let second = shuffler.permutation(100);
        assert_ne!(first, second);
    }
}
