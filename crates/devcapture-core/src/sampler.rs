//! Session-level sampling
//!
//! One uniform draw per engine lifetime decides whether the session
//! captures anything at all. The random source is injectable so both
//! branches can be forced deterministically.

/// Source of the once-per-session sampling decision.
#[derive(Debug, Clone)]
pub struct Sampler {
    rng: fastrand::Rng,
}

impl Sampler {
    /// Sampler seeded from system entropy.
    pub fn from_entropy() -> Self {
        Self {
            rng: fastrand::Rng::new(),
        }
    }

    /// Sampler with a fixed seed. Two samplers with the same seed make the
    /// same sequence of decisions.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    /// Draw once from `[0, 1)` and compare against `rate`.
    ///
    /// A rate of `0.0` never samples and `1.0` always does. Rates outside
    /// `[0, 1]` (including NaN) are clamped by the comparison itself.
    pub fn decide(&mut self, rate: f64) -> bool {
        self.rng.f64() < rate
    }
}

impl Default for Sampler {
    fn default() -> Self {
        Self::from_entropy()
    }
}
