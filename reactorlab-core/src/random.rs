//! Seeded linear congruential generator used for all simulation noise.
//!
//! Recurrence: `seed' = (seed * 9301 + 49297) mod 233280`. A reactor's whole
//! trajectory is reproducible from a single integer.

const MULTIPLIER: u64 = 9301;
const INCREMENT: u64 = 49297;
const MODULUS: u64 = 233_280;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RandomSource {
    state: u64,
}

impl RandomSource {
    pub fn new(seed: u64) -> Self {
        Self { state: seed % MODULUS }
    }

    /// Uniform deviate in `[0, 1)`.
    pub fn next(&mut self) -> f64 {
        self.state = (self.state * MULTIPLIER + INCREMENT) % MODULUS;
        self.state as f64 / MODULUS as f64
    }

    pub fn range(&mut self, min: f64, max: f64) -> f64 {
        min + self.next() * (max - min)
    }

    /// Box-Muller transform over two uniform draws.
    pub fn gaussian(&mut self, mean: f64, std_dev: f64) -> f64 {
        let mut u1 = self.next();
        if u1 <= 0.0 {
            // ln(0) is undefined; use the smallest value the lattice can produce.
            u1 = 1.0 / MODULUS as f64;
        }
        let u2 = self.next();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + z * std_dev
    }

    /// Derives an independent source, e.g. for a component that needs its
    /// own stream of noise.
    pub fn fork(&mut self) -> Self {
        Self::new((self.next() * MODULUS as f64) as u64 ^ 0x5bd1)
    }
}
