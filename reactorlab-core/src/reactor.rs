use crate::{
    alerts::{derive_alerts, AlertDraft, AlertLog, AlertSequence},
    error::ReactorError,
    prediction::{predict, DEACTIVATION_THRESHOLD},
    random::RandomSource,
    simulation::{builder::SimulatorBuilder, engine::ReactorSimulator, profile::SimulationProfile},
};
use chrono::{DateTime, Duration, Utc};
use reactorlab_schemas::{
    alert::AlertKind,
    dashboard::ReactorSnapshot,
    file_formats::{ReactorDefinition, SimulationSettings},
    metrics::MetricsSnapshot,
    prediction::Prediction,
    reactor::{ControlParameter, ReactorConfig, ReactorStatus},
};
use tracing::info;

/// Salt mixed into a reactor's seed for its prediction noise stream.
const PREDICTION_STREAM: u64 = 0x9e37;

/// Longest accepted tick: one simulated day.
const MAX_TICK_SECONDS: f64 = 86_400.0;

/// Status precedence: activity below the deactivation threshold, then open
/// critical alerts, then an optimization run, otherwise running.
pub fn derive_status(metrics: &MetricsSnapshot, alerts: &AlertLog, optimizing: bool) -> ReactorStatus {
    if metrics.enzyme_activity < DEACTIVATION_THRESHOLD {
        ReactorStatus::Maintenance
    } else if alerts.has_unresolved_critical() {
        ReactorStatus::Error
    } else if optimizing {
        ReactorStatus::Optimizing
    } else {
        ReactorStatus::Running
    }
}

pub fn tick_duration(settings: &SimulationSettings) -> Result<Duration, ReactorError> {
    let millis = (settings.tick_seconds * 1000.0).round();
    if !millis.is_finite() || millis < 1.0 || settings.tick_seconds > MAX_TICK_SECONDS {
        return Err(ReactorError::ConfigError(format!(
            "tick_seconds must be between 0.001 and {}, got {}",
            MAX_TICK_SECONDS, settings.tick_seconds
        )));
    }
    Ok(Duration::milliseconds(millis as i64))
}

/// One reactor: its simulator plus everything derived from it for display.
pub struct Reactor {
    id: String,
    name: String,
    location: String,
    status: ReactorStatus,
    uptime_hours: f64,
    batch_count: u32,
    last_maintenance: DateTime<Utc>,
    simulator: ReactorSimulator,
    alerts: AlertLog,
    prediction: Prediction,
    prediction_rng: RandomSource,
}

impl Reactor {
    /// Builds a seeded reactor whose history is backfilled up to `start`.
    pub fn from_definition(
        definition: &ReactorDefinition,
        settings: &SimulationSettings,
        start: DateTime<Utc>,
    ) -> Result<Self, ReactorError> {
        let simulator = build_simulator(definition.seed, definition.config.clone(), definition.uptime_hours, settings, start)?;
        let mut prediction_rng = RandomSource::new(definition.seed ^ PREDICTION_STREAM);
        let prediction = predict(simulator.metrics(), &mut prediction_rng);
        let alerts = AlertLog::with_capacity(settings.alert_capacity);
        let status = derive_status(simulator.metrics(), &alerts, false);
        let service_span = Duration::milliseconds((definition.uptime_hours * 3_600_000.0) as i64);
        let last_maintenance = start.checked_sub_signed(service_span).ok_or_else(|| {
            ReactorError::ConfigError(format!(
                "uptime_hours {} of reactor '{}' reaches before the representable calendar",
                definition.uptime_hours, definition.id
            ))
        })?;

        Ok(Self {
            id: definition.id.clone(),
            name: definition.name.clone(),
            location: definition.location.clone(),
            status,
            uptime_hours: definition.uptime_hours,
            batch_count: definition.batch_count,
            last_maintenance,
            simulator,
            alerts,
            prediction,
            prediction_rng,
        })
    }

    /// Runs one tick per timestamp, then re-derives alerts, prediction and status
    /// from the final snapshot.
    ///
    /// The ticks run on a copy of the simulator that replaces it only once all
    /// of them succeed, so a failed refresh changes nothing.
    pub fn advance(
        &mut self,
        tick_times: &[DateTime<Utc>],
        ids: &mut AlertSequence,
        optimizing: bool,
    ) -> Result<(), ReactorError> {
        let mut next = self.simulator.clone();
        for &now in tick_times {
            next.tick(now)?;
        }
        self.simulator = next;
        self.uptime_hours += self.simulator.tick_hours() * tick_times.len() as f64;

        let metrics = self.simulator.metrics().clone();
        for draft in derive_alerts(&metrics, self.simulator.history()) {
            self.alerts.record(ids, &self.id, draft, metrics.timestamp);
        }
        self.prediction = predict(&metrics, &mut self.prediction_rng);
        self.update_status(optimizing);
        Ok(())
    }

    pub fn update_status(&mut self, optimizing: bool) {
        self.status = derive_status(self.simulator.metrics(), &self.alerts, optimizing);
    }

    pub fn adjust_parameter(
        &mut self,
        name: &str,
        value: f64,
        ids: &mut AlertSequence,
        now: DateTime<Utc>,
    ) -> Result<(), ReactorError> {
        let parameter =
            ControlParameter::from_name(name).ok_or_else(|| ReactorError::UnknownParameter(name.to_string()))?;
        self.simulator.adjust_parameter(parameter, value)?;
        let draft = AlertDraft::new(
            AlertKind::Info,
            format!("{} set to {:.2}{} by operator", parameter, value, parameter.unit()),
        )
        .for_parameter(&parameter.to_string(), value);
        self.alerts.record(ids, &self.id, draft, now);
        info!(reactor_id = self.id.as_str(), %parameter, value, "parameter adjusted");
        Ok(())
    }

    pub fn dismiss_alert(&mut self, alert_id: u64) -> Result<(), ReactorError> {
        if self.alerts.dismiss(alert_id) {
            Ok(())
        } else {
            Err(ReactorError::AlertNotFound {
                reactor_id: self.id.clone(),
                alert_id,
            })
        }
    }

    pub fn record_alert(&mut self, draft: AlertDraft, ids: &mut AlertSequence, now: DateTime<Utc>) -> u64 {
        self.alerts.record(ids, &self.id, draft, now)
    }

    /// Rebuilds the simulated state from `seed`, keeping identity, counters and
    /// the current configuration.
    pub fn rebuild(&mut self, seed: u64, settings: &SimulationSettings, now: DateTime<Utc>) -> Result<(), ReactorError> {
        let simulator = build_simulator(seed, self.simulator.config().clone(), self.simulator.running_hours(), settings, now)?;
        self.simulator = simulator;
        self.prediction_rng = RandomSource::new(seed ^ PREDICTION_STREAM);
        self.prediction = predict(self.simulator.metrics(), &mut self.prediction_rng);
        self.alerts.clear();
        self.update_status(false);
        info!(reactor_id = self.id.as_str(), seed, "reactor state rebuilt");
        Ok(())
    }

    pub fn replenish_enzyme(&mut self, ids: &mut AlertSequence, now: DateTime<Utc>) {
        self.simulator.replenish_enzyme();
        self.batch_count += 1;
        self.last_maintenance = now;
        let draft = AlertDraft::new(
            AlertKind::Info,
            format!(
                "Enzyme replenished; fresh activity {:.1}%",
                self.simulator.kinetics().initial_activity()
            ),
        );
        self.alerts.record(ids, &self.id, draft, now);
        info!(reactor_id = self.id.as_str(), batch = self.batch_count, "enzyme replenished");
    }

    pub fn snapshot(&self) -> ReactorSnapshot {
        ReactorSnapshot {
            id: self.id.clone(),
            name: self.name.clone(),
            location: self.location.clone(),
            status: self.status,
            uptime_hours: self.uptime_hours,
            batch_count: self.batch_count,
            last_maintenance: self.last_maintenance,
            config: self.simulator.config().clone(),
            metrics: self.simulator.metrics().clone(),
            history: self.simulator.history().iter().cloned().collect(),
            alerts: self.alerts.iter().cloned().collect(),
            prediction: self.prediction.clone(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn status(&self) -> ReactorStatus {
        self.status
    }

    pub fn uptime_hours(&self) -> f64 {
        self.uptime_hours
    }

    pub fn batch_count(&self) -> u32 {
        self.batch_count
    }

    pub fn last_maintenance(&self) -> DateTime<Utc> {
        self.last_maintenance
    }

    pub fn metrics(&self) -> &MetricsSnapshot {
        self.simulator.metrics()
    }

    pub fn config(&self) -> &ReactorConfig {
        self.simulator.config()
    }

    pub fn alerts(&self) -> &AlertLog {
        &self.alerts
    }

    pub fn prediction(&self) -> &Prediction {
        &self.prediction
    }

    pub fn simulator(&self) -> &ReactorSimulator {
        &self.simulator
    }

    pub fn simulator_mut(&mut self) -> &mut ReactorSimulator {
        &mut self.simulator
    }
}

fn build_simulator(
    seed: u64,
    config: ReactorConfig,
    running_hours: f64,
    settings: &SimulationSettings,
    start: DateTime<Utc>,
) -> Result<ReactorSimulator, ReactorError> {
    SimulatorBuilder::new(seed)
        .with_config(config)
        .with_profile(SimulationProfile::for_kind(settings.profile))
        .with_history_capacity(settings.history_capacity)
        .with_running_hours(running_hours)
        .with_start_time(start)
        .with_tick_duration(tick_duration(settings)?)
        .with_backfill(settings.backfill_points)
        .build()
}
