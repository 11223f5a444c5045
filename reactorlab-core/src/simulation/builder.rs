use crate::{
    error::ReactorError,
    history::{History, DEFAULT_HISTORY_CAPACITY},
    kinetics::EnzymeKinetics,
    random::RandomSource,
    simulation::{
        engine::{pressure_for_flow, ReactorSimulator, SUBSTRATE_FLOOR},
        profile::SimulationProfile,
        state::ReactorState,
    },
};
use chrono::{DateTime, Duration, Utc};
use reactorlab_schemas::{metrics::MetricsSnapshot, reactor::ReactorConfig};

/// A fluent builder for constructing a `ReactorSimulator`.
///
/// Everything except the seed has a default, so
/// `SimulatorBuilder::new(seed).build()` yields a reference-profile reactor at
/// the default setpoints with an empty history.
pub struct SimulatorBuilder {
    seed: u64,
    config: ReactorConfig,
    profile: SimulationProfile,
    history_capacity: usize,
    running_hours: f64,
    start: DateTime<Utc>,
    tick_duration: Duration,
    backfill: usize,
}

impl SimulatorBuilder {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            config: ReactorConfig::default(),
            profile: SimulationProfile::reference(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            running_hours: 0.0,
            start: DateTime::<Utc>::default(),
            tick_duration: Duration::seconds(1),
            backfill: 0,
        }
    }

    /// Sets the setpoints and limits the reactor starts with.
    pub fn with_config(mut self, config: ReactorConfig) -> Self {
        self.config = config;
        self
    }

    /// Selects the parameter set used for every tick.
    pub fn with_profile(mut self, profile: SimulationProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Sets how many history points are retained before the oldest is evicted.
    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    /// Hours the enzyme charge has already been in service at `start`.
    pub fn with_running_hours(mut self, hours: f64) -> Self {
        self.running_hours = hours;
        self
    }

    /// Sets the timestamp of the current snapshot once backfill has run.
    pub fn with_start_time(mut self, start: DateTime<Utc>) -> Self {
        self.start = start;
        self
    }

    /// Sets the simulated time covered by one tick.
    pub fn with_tick_duration(mut self, tick_duration: Duration) -> Self {
        self.tick_duration = tick_duration;
        self
    }

    /// Simulates `points` ticks leading up to the start time so the reactor
    /// begins with a populated history.
    pub fn with_backfill(mut self, points: usize) -> Self {
        self.backfill = points;
        self
    }

    /// Consumes the builder and returns a seeded `ReactorSimulator`.
    ///
    /// # Errors
    ///
    /// Returns `ReactorError::ConfigError` for non-finite setpoints, a zero
    /// history capacity, a non-positive tick duration, negative running hours,
    /// or a backfill reaching outside the representable calendar.
    pub fn build(self) -> Result<ReactorSimulator, ReactorError> {
        let targets = [
            ("target_temperature", self.config.target_temperature),
            ("target_ph", self.config.target_ph),
            ("target_pressure", self.config.target_pressure),
            ("target_flow_rate", self.config.target_flow_rate),
            ("min_enzyme_activity", self.config.min_enzyme_activity),
            ("max_substrate_concentration", self.config.max_substrate_concentration),
        ];
        if let Some((name, _)) = targets.iter().find(|(_, v)| !v.is_finite()) {
            return Err(ReactorError::ConfigError(format!("{} must be a finite number", name)));
        }
        if self.history_capacity == 0 {
            return Err(ReactorError::ConfigError("history capacity must be at least 1".to_string()));
        }
        if self.tick_duration <= Duration::zero() {
            return Err(ReactorError::ConfigError("tick duration must be positive".to_string()));
        }
        if !(self.running_hours >= 0.0) {
            return Err(ReactorError::ConfigError("running hours must be non-negative".to_string()));
        }

        let tick_ms = self.tick_duration.num_milliseconds();
        let tick_hours = tick_ms as f64 / 3_600_000.0;
        let mut rng = RandomSource::new(self.seed);
        let mut kinetics = EnzymeKinetics::new(rng.fork());

        let first_time = i64::try_from(self.backfill)
            .ok()
            .and_then(|n| tick_ms.checked_mul(n))
            .and_then(|ms| self.start.checked_sub_signed(Duration::milliseconds(ms)))
            .ok_or_else(|| {
                ReactorError::ConfigError(format!(
                    "backfill of {} ticks of {} ms reaches before the representable calendar",
                    self.backfill, tick_ms
                ))
            })?;
        let first_hours = (self.running_hours - tick_hours * self.backfill as f64).max(0.0);
        let initial = initial_metrics(&self.config, &self.profile, &mut rng, &mut kinetics, first_hours, first_time);

        let mut simulator = ReactorSimulator {
            state: ReactorState {
                tick: 0,
                running_hours: first_hours,
                metrics: initial,
            },
            config: self.config,
            profile: self.profile,
            rng,
            kinetics,
            history: History::with_capacity(self.history_capacity),
            tick_hours,
        };

        for i in 1..=self.backfill as i64 {
            let at = first_time + Duration::milliseconds(tick_ms * i);
            simulator.tick(at)?;
        }

        Ok(simulator)
    }
}

fn initial_metrics(
    config: &ReactorConfig,
    profile: &SimulationProfile,
    rng: &mut RandomSource,
    kinetics: &mut EnzymeKinetics,
    running_hours: f64,
    timestamp: DateTime<Utc>,
) -> MetricsSnapshot {
    let temperature = config.target_temperature + rng.gaussian(0.0, 0.3);
    let ph = config.target_ph + rng.gaussian(0.0, 0.02);
    let flow_rate = profile
        .flow_limit
        .apply(config.target_flow_rate + rng.gaussian(0.0, 5.0));
    let enzyme_activity = kinetics.activity(running_hours, temperature, ph);
    let substrate_concentration = (config.max_substrate_concentration * 0.75).max(SUBSTRATE_FLOOR);
    let (yield_min, yield_max) = profile.yield_clamp;
    let product_yield = profile
        .theoretical_yield(enzyme_activity, substrate_concentration)
        .clamp(yield_min, yield_max);
    let (do_min, do_max) = profile.dissolved_oxygen_clamp;
    let dissolved_oxygen = (85.0 + rng.gaussian(0.0, 2.0)).clamp(do_min, do_max);

    MetricsSnapshot {
        temperature,
        ph,
        pressure: pressure_for_flow(flow_rate),
        flow_rate,
        enzyme_activity,
        substrate_concentration,
        product_yield,
        dissolved_oxygen,
        timestamp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn backfill_past_the_calendar_is_a_config_error() {
        let result = SimulatorBuilder::new(3)
            .with_start_time(Utc.with_ymd_and_hms(2024, 3, 1, 6, 0, 0).unwrap())
            .with_tick_duration(Duration::days(1))
            .with_backfill(usize::MAX)
            .build();
        assert!(matches!(result, Err(ReactorError::ConfigError(_))));
    }

    #[test]
    fn rejects_negative_running_hours() {
        let result = SimulatorBuilder::new(3).with_running_hours(-1.0).build();
        assert!(matches!(result, Err(ReactorError::ConfigError(_))));
    }
}
