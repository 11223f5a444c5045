use super::{profile::SimulationProfile, state::ReactorState};
use crate::{error::ReactorError, history::History, kinetics::EnzymeKinetics, random::RandomSource};
use chrono::{DateTime, Utc};
use reactorlab_schemas::{
    metrics::MetricsSnapshot,
    reactor::{ControlParameter, ReactorConfig},
};
use tracing::debug;

const TEMPERATURE_GAIN: f64 = 0.02;
const TEMPERATURE_NOISE: f64 = 0.05;
const PH_GAIN: f64 = 0.01;
const PH_NOISE: f64 = 0.02;
const PRESSURE_GAIN: f64 = 0.05;
const PRESSURE_NOISE: f64 = 0.01;
const YIELD_GAIN: f64 = 0.05;
const YIELD_NOISE: f64 = 0.5;
pub const SUBSTRATE_FLOOR: f64 = 5.0;

/// Pressure follows flow through the reactor bed; it has no setpoint of its own.
pub fn pressure_for_flow(flow_rate: f64) -> f64 {
    1.0 + (flow_rate / 200.0) * 0.4
}

/// Computes the state one tick after `state`.
///
/// Only the random sources are mutated; the caller decides whether to commit
/// the returned state.
pub fn step(
    state: &ReactorState,
    config: &ReactorConfig,
    profile: &SimulationProfile,
    rng: &mut RandomSource,
    kinetics: &mut EnzymeKinetics,
    tick_hours: f64,
    now: DateTime<Utc>,
) -> ReactorState {
    let current = &state.metrics;
    let running_hours = state.running_hours + tick_hours;

    let temperature = current.temperature
        + (config.target_temperature - current.temperature) * TEMPERATURE_GAIN
        + rng.gaussian(0.0, TEMPERATURE_NOISE);

    let ph = current.ph + (config.target_ph - current.ph) * PH_GAIN + rng.gaussian(0.0, PH_NOISE);

    let pressure_target = pressure_for_flow(current.flow_rate);
    let pressure = current.pressure
        + (pressure_target - current.pressure) * PRESSURE_GAIN
        + rng.gaussian(0.0, PRESSURE_NOISE);

    let flow_rate = profile
        .flow_limit
        .apply(current.flow_rate + rng.gaussian(0.0, profile.flow_jitter_std));

    let enzyme_activity = kinetics.activity(running_hours, temperature, ph);

    let consumption_rate = 0.5 * (enzyme_activity / 100.0) * (flow_rate / 150.0);
    let substrate_concentration = (current.substrate_concentration - consumption_rate * 0.001
        + rng.gaussian(0.0, profile.substrate_noise_std))
    .max(SUBSTRATE_FLOOR);

    let theoretical_yield = profile.theoretical_yield(enzyme_activity, substrate_concentration);
    let (yield_min, yield_max) = profile.yield_clamp;
    let product_yield = (current.product_yield
        + (theoretical_yield - current.product_yield) * YIELD_GAIN
        + rng.gaussian(0.0, YIELD_NOISE))
    .clamp(yield_min, yield_max);

    let (do_min, do_max) = profile.dissolved_oxygen_clamp;
    let dissolved_oxygen =
        (current.dissolved_oxygen + rng.gaussian(0.0, profile.dissolved_oxygen_std)).clamp(do_min, do_max);

    ReactorState {
        tick: state.tick + 1,
        running_hours,
        metrics: MetricsSnapshot {
            temperature,
            ph,
            pressure,
            flow_rate,
            enzyme_activity,
            substrate_concentration,
            product_yield,
            dissolved_oxygen,
            timestamp: now,
        },
    }
}

#[derive(Debug, Clone)]
pub struct ReactorSimulator {
    pub(super) state: ReactorState,
    pub(super) config: ReactorConfig,
    pub(super) profile: SimulationProfile,
    pub(super) rng: RandomSource,
    pub(super) kinetics: EnzymeKinetics,
    pub(super) history: History,
    pub(super) tick_hours: f64,
}

impl ReactorSimulator {
    /// Advances one tick ending at `now` and records the result in history.
    ///
    /// A step that yields a non-finite metric is discarded; the previous
    /// state stays current.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Result<&MetricsSnapshot, ReactorError> {
        let next = step(
            &self.state,
            &self.config,
            &self.profile,
            &mut self.rng,
            &mut self.kinetics,
            self.tick_hours,
            now,
        );

        if let Some(field) = next.metrics.first_non_finite() {
            return Err(ReactorError::NonFiniteMetric { field });
        }

        self.history.push(next.tick, next.metrics.clone());
        self.state = next;
        Ok(&self.state.metrics)
    }

    pub fn adjust_parameter(&mut self, parameter: ControlParameter, value: f64) -> Result<(), ReactorError> {
        if !parameter.accepts(value) {
            return Err(ReactorError::InvalidValue {
                parameter: parameter.to_string(),
                value,
            });
        }

        match parameter {
            ControlParameter::Temperature => self.config.target_temperature = value,
            ControlParameter::Ph => self.config.target_ph = value,
            ControlParameter::FlowRate => {
                // Flow has no controller; the pump is set immediately.
                self.state.metrics.flow_rate = self.profile.flow_limit.apply(value);
                self.config.target_flow_rate = value;
            }
        }
        debug!(%parameter, value, "parameter adjusted");
        Ok(())
    }

    /// Starts a fresh enzyme charge: new initial activity, service clock reset.
    pub fn replenish_enzyme(&mut self) {
        self.kinetics.reseed();
        self.state.running_hours = 0.0;
    }

    /// Overrides the current metrics, e.g. to force a process upset.
    pub fn set_metrics(&mut self, metrics: MetricsSnapshot) {
        self.state.metrics = metrics;
    }

    pub fn metrics(&self) -> &MetricsSnapshot {
        &self.state.metrics
    }

    pub fn state(&self) -> &ReactorState {
        &self.state
    }

    pub fn config(&self) -> &ReactorConfig {
        &self.config
    }

    pub fn profile(&self) -> &SimulationProfile {
        &self.profile
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn kinetics(&self) -> &EnzymeKinetics {
        &self.kinetics
    }

    pub fn running_hours(&self) -> f64 {
        self.state.running_hours
    }

    pub fn tick_hours(&self) -> f64 {
        self.tick_hours
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::builder::SimulatorBuilder;
    use chrono::{Duration, TimeZone};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 6, 0, 0).unwrap()
    }

    fn run(sim: &mut ReactorSimulator, ticks: i64) {
        for i in 1..=ticks {
            sim.tick(start() + Duration::seconds(i)).unwrap();
        }
    }

    #[test]
    fn identical_seeds_produce_identical_trajectories() {
        let mut a = SimulatorBuilder::new(12345).build().unwrap();
        let mut b = SimulatorBuilder::new(12345).build().unwrap();
        for i in 1..=500 {
            let now = start() + Duration::seconds(i);
            let ma = a.tick(now).unwrap().clone();
            let mb = b.tick(now).unwrap().clone();
            assert_eq!(ma, mb, "diverged at tick {}", i);
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = SimulatorBuilder::new(1).build().unwrap();
        let mut b = SimulatorBuilder::new(2).build().unwrap();
        run(&mut a, 5);
        run(&mut b, 5);
        assert_ne!(a.metrics(), b.metrics());
    }

    #[test]
    fn metrics_stay_within_bounds_for_both_profiles() {
        for profile in [SimulationProfile::reference(), SimulationProfile::dashboard()] {
            let (do_min, do_max) = profile.dissolved_oxygen_clamp;
            let (y_min, y_max) = profile.yield_clamp;
            let mut sim = SimulatorBuilder::new(99)
                .with_profile(profile.clone())
                .with_tick_duration(Duration::minutes(30))
                .build()
                .unwrap();
            for i in 1..=2_000 {
                let m = sim.tick(start() + Duration::minutes(30 * i)).unwrap();
                assert!((0.0..=100.0).contains(&m.enzyme_activity));
                assert!((y_min..=y_max).contains(&m.product_yield));
                assert!((do_min..=do_max).contains(&m.dissolved_oxygen));
                assert!(m.flow_rate >= 0.0);
                assert!(m.substrate_concentration >= SUBSTRATE_FLOOR);
            }
        }
    }

    #[test]
    fn dashboard_profile_keeps_flow_in_band() {
        let mut sim = SimulatorBuilder::new(5)
            .with_profile(SimulationProfile::dashboard())
            .build()
            .unwrap();
        for i in 1..=1_000 {
            let flow = sim.tick(start() + Duration::seconds(i)).unwrap().flow_rate;
            assert!((100.0..=200.0).contains(&flow));
        }
    }

    #[test]
    fn history_is_capped_and_keeps_newest_ticks() {
        let mut sim = SimulatorBuilder::new(8).build().unwrap();
        let n = 400;
        run(&mut sim, n);
        let history = sim.history();
        assert_eq!(history.len(), 288);
        assert_eq!(history.oldest().map(|p| p.id), Some(n as u64 - 287));
        assert_eq!(history.latest().map(|p| p.id), Some(n as u64));
    }

    #[test]
    fn temperature_drifts_toward_target() {
        let mut sim = SimulatorBuilder::new(21).build().unwrap();
        sim.adjust_parameter(ControlParameter::Temperature, 40.0).unwrap();
        let before = (sim.metrics().temperature - 40.0).abs();
        run(&mut sim, 300);
        let after = (sim.metrics().temperature - 40.0).abs();
        assert!(after < before, "{} -> {}", before, after);
        assert!(after < 1.0);
    }

    #[test]
    fn seeded_reactor_decays_over_one_hundred_hours() {
        let config = ReactorConfig {
            target_temperature: 35.0,
            target_ph: 7.4,
            ..ReactorConfig::default()
        };
        let mut sim = SimulatorBuilder::new(12345)
            .with_config(config)
            .with_tick_duration(Duration::hours(1))
            .build()
            .unwrap();
        let initial = sim.metrics().enzyme_activity;
        assert!((initial - 95.0).abs() <= 3.5, "initial activity {}", initial);

        for hour in 1..=100 {
            sim.tick(start() + Duration::hours(hour)).unwrap();
        }
        assert!((sim.running_hours() - 100.0).abs() < 1e-9);
        assert!(sim.metrics().enzyme_activity < initial);
    }

    #[test]
    fn flow_adjustment_is_immediate_and_setpoints_are_targets() {
        let mut sim = SimulatorBuilder::new(4).build().unwrap();
        sim.adjust_parameter(ControlParameter::FlowRate, 180.0).unwrap();
        assert_eq!(sim.metrics().flow_rate, 180.0);

        let temperature = sim.metrics().temperature;
        sim.adjust_parameter(ControlParameter::Temperature, 30.0).unwrap();
        assert_eq!(sim.config().target_temperature, 30.0);
        assert_eq!(sim.metrics().temperature, temperature);
    }

    #[test]
    fn rejects_out_of_range_values() {
        let mut sim = SimulatorBuilder::new(4).build().unwrap();
        assert!(matches!(
            sim.adjust_parameter(ControlParameter::Ph, 15.0),
            Err(ReactorError::InvalidValue { .. })
        ));
        assert!(sim.adjust_parameter(ControlParameter::FlowRate, f64::NAN).is_err());
        assert_eq!(sim.config().target_ph, 7.4);
    }

    #[test]
    fn non_finite_step_is_not_committed() {
        let mut sim = SimulatorBuilder::new(4).build().unwrap();
        let mut broken = sim.metrics().clone();
        broken.temperature = f64::NAN;
        sim.set_metrics(broken);

        let err = sim.tick(start()).unwrap_err();
        assert!(matches!(err, ReactorError::NonFiniteMetric { field: "temperature" }));
        assert_eq!(sim.state().tick, 0);
        assert!(sim.history().is_empty());
    }

    #[test]
    fn backfill_populates_history_up_to_start() {
        let sim = SimulatorBuilder::new(10)
            .with_start_time(start())
            .with_running_hours(48.0)
            .with_tick_duration(Duration::minutes(5))
            .with_backfill(288)
            .build()
            .unwrap();
        assert_eq!(sim.history().len(), 288);
        assert_eq!(sim.metrics().timestamp, start());
        assert!((sim.running_hours() - 48.0).abs() < 1e-9);
    }

    #[test]
    fn replenishing_resets_service_hours() {
        let mut sim = SimulatorBuilder::new(10).with_running_hours(200.0).build().unwrap();
        sim.replenish_enzyme();
        assert_eq!(sim.running_hours(), 0.0);
    }
}
