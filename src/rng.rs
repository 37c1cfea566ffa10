//! Deterministic random streams.
//!
//! Every stochastic draw in the degradation model comes from a generator
//! handed out by a [`SeedStepper`]. The stepper seeds a fresh `StdRng` from
//! its counter, then advances the counter by a small random step drawn from
//! that same generator. Given the same starting seed the whole sequence of
//! generators is reproducible, and no global state is touched.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::warn;

use crate::config::defaults::{SEED_COUNTER_CEILING, SEED_STEP_MAX};

/// Explicit seed counter that hands out freshly seeded generators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedStepper {
    counter: u64,
}

impl SeedStepper {
    pub fn new(seed: u64) -> Self {
        Self { counter: seed }
    }

    /// Seed of the next generator.
    pub fn counter(&self) -> u64 {
        self.counter
    }

    /// Generator seeded from the current counter; advances the counter.
    ///
    /// The step is drawn from the returned generator before it is handed
    /// out. Once the counter has reached [`SEED_COUNTER_CEILING`] it
    /// restarts at the step value.
    pub fn next_rng(&mut self) -> StdRng {
        let mut rng = StdRng::seed_from_u64(self.counter);
        let step = rng.gen_range(1..SEED_STEP_MAX);
        self.counter = if self.counter < SEED_COUNTER_CEILING {
            self.counter + step
        } else {
            step
        };
        rng
    }

    /// One uniform draw in `[0, 1)` from a freshly stepped generator.
    pub fn uniform(&mut self) -> f64 {
        self.next_rng().gen::<f64>()
    }
}

/// The configured seed, or one drawn from entropy.
///
/// Entropy seeds are logged so a run can be reproduced afterwards.
pub fn resolve_seed(configured: Option<u64>) -> u64 {
    configured.unwrap_or_else(|| {
        let seed = rand::thread_rng().gen_range(0..SEED_COUNTER_CEILING);
        warn!(seed, "No seed configured, drew one from entropy");
        seed
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stepper_is_reproducible() {
        let mut a = SeedStepper::new(42);
        let mut b = SeedStepper::new(42);
        for _ in 0..50 {
            assert!((a.uniform() - b.uniform()).abs() < f64::EPSILON);
        }
        assert_eq!(a.counter(), b.counter());
    }

    #[test]
    fn test_counter_advances_by_bounded_step() {
        let mut stepper = SeedStepper::new(100);
        for _ in 0..100 {
            let before = stepper.counter();
            let _ = stepper.next_rng();
            let step = stepper.counter() - before;
            assert!((1..SEED_STEP_MAX).contains(&step), "Step {step} out of range");
        }
    }

    #[test]
    fn test_counter_wraps_at_ceiling() {
        let mut stepper = SeedStepper::new(SEED_COUNTER_CEILING);
        let _ = stepper.next_rng();
        assert!(stepper.counter() < SEED_STEP_MAX, "Counter must restart at the step value");
    }

    #[test]
    fn test_configured_seed_is_kept() {
        assert_eq!(resolve_seed(Some(7)), 7);
        assert!(resolve_seed(None) < SEED_COUNTER_CEILING);
    }
}
