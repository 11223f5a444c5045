//! First-order irreversible enzyme deactivation with environmental stress.
//!
//! Activity decays as `A0 * exp(-k * t)` where the base rate `k = 0.002 /hr` is
//! accelerated by supra-optimal temperature and by pH away from 7.4.

use crate::random::RandomSource;

pub const BASE_DECAY_RATE_PER_HR: f64 = 0.002;
pub const OPTIMAL_TEMPERATURE: f64 = 37.0;
pub const OPTIMAL_PH: f64 = 7.4;
const TEMPERATURE_SENSITIVITY: f64 = 0.05;
const PH_SENSITIVITY: f64 = 0.1;
const ACTIVITY_NOISE_STD: f64 = 0.5;
const INITIAL_ACTIVITY_RANGE: (f64, f64) = (92.0, 98.0);

#[derive(Debug, Clone)]
pub struct EnzymeKinetics {
    initial_activity: f64,
    rng: RandomSource,
}

impl EnzymeKinetics {
    /// Draws the fresh-enzyme activity from the model's own random source.
    pub fn new(mut rng: RandomSource) -> Self {
        let initial_activity = rng.range(INITIAL_ACTIVITY_RANGE.0, INITIAL_ACTIVITY_RANGE.1);
        Self { initial_activity, rng }
    }

    pub fn initial_activity(&self) -> f64 {
        self.initial_activity
    }

    /// Draws a new initial activity, as after loading a fresh enzyme charge.
    pub fn reseed(&mut self) {
        self.initial_activity = self
            .rng
            .range(INITIAL_ACTIVITY_RANGE.0, INITIAL_ACTIVITY_RANGE.1);
    }

    pub fn decay_rate(temperature: f64, ph: f64) -> f64 {
        let temp_factor = 1.0 + (temperature - OPTIMAL_TEMPERATURE).max(0.0) * TEMPERATURE_SENSITIVITY;
        let ph_factor = 1.0 + (ph - OPTIMAL_PH).abs() * PH_SENSITIVITY;
        BASE_DECAY_RATE_PER_HR * temp_factor * ph_factor
    }

    /// Noise-free activity after `elapsed_hours` at the given conditions.
    pub fn expected_activity(&self, elapsed_hours: f64, temperature: f64, ph: f64) -> f64 {
        let rate = Self::decay_rate(temperature, ph);
        self.initial_activity * (-rate * elapsed_hours.max(0.0)).exp()
    }

    /// Measured activity: the decay trajectory plus sensor noise, kept in [0, 100].
    pub fn activity(&mut self, elapsed_hours: f64, temperature: f64, ph: f64) -> f64 {
        let expected = self.expected_activity(elapsed_hours, temperature, ph);
        let noise = self.rng.gaussian(0.0, ACTIVITY_NOISE_STD);
        (expected + noise).clamp(0.0, 100.0)
    }
}
