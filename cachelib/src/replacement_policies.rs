use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use crate::cache::Line;

/// A generic trait for implementing new replacement policies. Can be used to parameterise a Cache.
///
/// The cache keeps the frequency and recency counters of every line up to date itself, a policy
/// only has to decide which line goes
pub trait ReplacementPolicy {
    /// Used by the cache to choose a victim when a new block needs loaded into a full set
    ///
    /// Only called when every line of the set is valid, invalid lines are always filled first
    ///
    /// # Arguments
    ///
    /// * `set`: The lines of the set the new block maps to
    ///
    /// returns: usize, the index of the victim within the set
    fn select_victim(&mut self, set: &[Line]) -> usize;
}

/// Least frequently used replacement policy
///
/// Ties go to the lowest line index
#[derive(Debug, Default)]
pub struct LeastFrequentlyUsed;

impl ReplacementPolicy for LeastFrequentlyUsed {
    fn select_victim(&mut self, set: &[Line]) -> usize {
        // Manual scan, strict comparison keeps the first minimum
        let mut min_value = u64::MAX;
        let mut min_index = 0;
        let mut index = 0;
        while index < set.len() {
            if set[index].frequency < min_value {
                min_value = set[index].frequency;
                min_index = index;
            }
            index += 1;
        }
        min_index
    }
}

/// Least Recently Used replacement policy
///
/// Recency is an age: the cache resets it to 0 for the line it touches and ages every other valid
/// line in the set by one, so the oldest line has the largest value. Ties go to the lowest line
/// index
#[derive(Debug, Default)]
pub struct LeastRecentlyUsed;

impl ReplacementPolicy for LeastRecentlyUsed {
    fn select_victim(&mut self, set: &[Line]) -> usize {
        let mut max_value = 0;
        let mut max_index = 0;
        let mut index = 0;
        while index < set.len() {
            if set[index].recency > max_value {
                max_value = set[index].recency;
                max_index = index;
            }
            index += 1;
        }
        max_index
    }
}

/// Uniformly random replacement
///
/// Seeded runs are reproducible, otherwise the generator is seeded from the operating system
#[derive(Debug)]
pub struct Random {
    rng: StdRng,
}

impl Random {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self { rng }
    }
}

impl ReplacementPolicy for Random {
    fn select_victim(&mut self, set: &[Line]) -> usize {
        self.rng.random_range(0..set.len())
    }
}
