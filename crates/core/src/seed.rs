use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use rand::Rng;

use crate::model::Seed;

/// Upper bound (exclusive) for randomly drawn seeds.
pub const RANDOM_SEED_BOUND: u64 = 1_000_000;

/// Where fresh quiz seeds come from.
///
/// Real sessions draw a random seed on every start and retry; tests pin them.
#[derive(Debug, Clone, Default)]
pub enum SeedSource {
    #[default]
    Random,
    Fixed(Seed),
    /// Hands out the given seeds in order, wrapping around at the end.
    Sequence {
        seeds: Arc<[Seed]>,
        cursor: Arc<AtomicUsize>,
    },
}

impl SeedSource {
    #[must_use]
    pub fn fixed(seed: Seed) -> Self {
        Self::Fixed(seed)
    }

    #[must_use]
    pub fn sequence(seeds: impl IntoIterator<Item = Seed>) -> Self {
        Self::Sequence {
            seeds: seeds.into_iter().collect(),
            cursor: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Draw the next seed.
    ///
    /// An empty `Sequence` behaves like `Random`.
    #[must_use]
    pub fn next_seed(&self) -> Seed {
        match self {
            SeedSource::Random => random_seed(),
            SeedSource::Fixed(seed) => *seed,
            SeedSource::Sequence { seeds, cursor } => {
                if seeds.is_empty() {
                    return random_seed();
                }
                let at = cursor.fetch_add(1, Ordering::Relaxed) % seeds.len();
                seeds[at]
            }
        }
    }
}

fn random_seed() -> Seed {
    Seed::new(rand::rng().random_range(0..RANDOM_SEED_BOUND))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_seeds_stay_in_bound() {
        let source = SeedSource::Random;
        for _ in 0..100 {
            assert!(source.next_seed().value() < RANDOM_SEED_BOUND);
        }
    }

    #[test]
    fn fixed_source_repeats() {
        let source = SeedSource::fixed(Seed::new(5));
        assert_eq!(source.next_seed(), Seed::new(5));
        assert_eq!(source.next_seed(), Seed::new(5));
    }

    #[test]
    fn sequence_wraps_and_is_shared_between_clones() {
        let source = SeedSource::sequence([Seed::new(1), Seed::new(2)]);
        let clone = source.clone();
        assert_eq!(source.next_seed(), Seed::new(1));
        assert_eq!(clone.next_seed(), Seed::new(2));
        assert_eq!(source.next_seed(), Seed::new(1));
    }
}
