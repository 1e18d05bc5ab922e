use bucketed_sampling::LengthIndex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Boundaries typical for spectrogram frame counts at a 256-sample hop.
pub const FRAME_BOUNDARIES: [usize; 9] = [32, 300, 400, 500, 600, 700, 800, 900, 1000];

/// Creates `n` frame lengths spread over `0..1200`, so some examples fall
/// below and above `FRAME_BOUNDARIES`.
pub fn random_lengths(n: usize, seed: u64) -> LengthIndex {
    let mut rng = StdRng::seed_from_u64(seed);
    LengthIndex::new((0..n).map(|_| rng.random_range(0..1_200)).collect())
}
