use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use vitalroute_core::config::DispatchConfig;

/// Source of the random multiplier applied to each duration estimate.
pub trait JitterSource: Send {
    fn next_multiplier(&mut self) -> f64;
}

/// Uniform draw from `[min, max]`, one per call.
#[derive(Debug, Clone)]
pub struct UniformJitter {
    rng: StdRng,
    min: f64,
    max: f64,
}

impl UniformJitter {
    /// # Panics
    /// Panics if `min > max`.
    pub fn new(min: f64, max: f64, seed: Option<u64>) -> Self {
        assert!(min <= max, "jitter: min {} exceeds max {}", min, max);
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng, min, max }
    }

    /// Interval and seed from a validated dispatch config.
    pub fn from_config(config: &DispatchConfig) -> Self {
        Self::new(config.jitter_min, config.jitter_max, config.jitter_seed)
    }
}

impl JitterSource for UniformJitter {
    fn next_multiplier(&mut self) -> f64 {
        self.rng.gen_range(self.min..=self.max)
    }
}

/// Returns the same multiplier every time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedJitter(pub f64);

impl JitterSource for FixedJitter {
    fn next_multiplier(&mut self) -> f64 {
        self.0
    }
}
