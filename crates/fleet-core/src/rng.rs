//! Deterministic planner RNG.
//!
//! The forward simulator is a pure function of its inputs; the only random
//! choices in the whole planner are tie-breaks inside strategy repair
//! (picking one of several equally capable agents).  Those all flow through
//! one `PlanRng` seeded per simulation, so a match replays identically from
//! its seed.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Planner-level RNG for repair tie-breaking.
pub struct PlanRng(SmallRng);

impl PlanRng {
    pub fn new(seed: u64) -> Self {
        PlanRng(SmallRng::seed_from_u64(seed))
    }

    /// Expose the inner `SmallRng` for use with `rand` distribution types.
    #[inline]
    pub fn inner(&mut self) -> &mut SmallRng {
        &mut self.0
    }

    /// Generate a value uniformly in `range`.
    #[inline]
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: rand::distributions::uniform::SampleUniform,
        R: rand::distributions::uniform::SampleRange<T>,
    {
        self.0.gen_range(range)
    }

    /// Choose a random element from a slice.  Returns `None` if it is empty.
    #[inline]
    pub fn choose<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        use rand::seq::SliceRandom;
        slice.choose(&mut self.0)
    }
}
