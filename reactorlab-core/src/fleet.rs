//! The set of reactors behind one dashboard, and the operations the
//! presentation layer calls.

use crate::{
    alerts::{AlertDraft, AlertSequence},
    clock::SimulationClock,
    error::ReactorError,
    optimization::OptimizationTracker,
    random::RandomSource,
    reactor::{tick_duration, Reactor},
};
use chrono::{DateTime, Duration, Utc};
use reactorlab_schemas::{
    alert::AlertKind,
    command::Command,
    dashboard::{DashboardSnapshot, DashboardStats},
    file_formats::{FleetFile, ReactorDefinition, SimulationSettings},
    optimization::OptimizationResult,
    prediction::ParameterAdjustment,
    reactor::{ControlParameter, ReactorStatus},
};
use std::collections::BTreeMap;
use tracing::{debug, error, info};

/// kg/day per percentage point of yield on a running reactor.
const PRODUCTION_PER_YIELD_POINT: f64 = 0.5;

/// Upper bound for the optimization timers: one week.
const MAX_TIMER_MS: i64 = 7 * 24 * 3_600_000;

pub fn compute_stats<'a>(reactors: impl IntoIterator<Item = &'a Reactor>) -> DashboardStats {
    let mut stats = DashboardStats::default();
    let mut yield_sum = 0.0;
    let mut activity_sum = 0.0;

    for reactor in reactors {
        stats.total_reactors += 1;
        if reactor.status().is_active() {
            stats.active_reactors += 1;
        }
        let metrics = reactor.metrics();
        yield_sum += metrics.product_yield;
        activity_sum += metrics.enzyme_activity;
        stats.total_alerts += reactor.alerts().unresolved().count();
        stats.critical_alerts += reactor
            .alerts()
            .unresolved()
            .filter(|a| a.kind == AlertKind::Critical)
            .count();
        if reactor.status() == ReactorStatus::Running {
            stats.daily_production += metrics.product_yield * PRODUCTION_PER_YIELD_POINT;
        }
    }

    if stats.total_reactors > 0 {
        let total = stats.total_reactors as f64;
        stats.average_yield = yield_sum / total;
        stats.system_health = activity_sum / total;
        stats.uptime = stats.active_reactors as f64 / total * 100.0;
    }
    stats
}

fn timer(name: &str, millis: u64) -> Result<Duration, ReactorError> {
    i64::try_from(millis)
        .ok()
        .filter(|&ms| ms <= MAX_TIMER_MS)
        .map(Duration::milliseconds)
        .ok_or_else(|| ReactorError::ConfigError(format!("{} must be at most {} ms, got {}", name, MAX_TIMER_MS, millis)))
}

pub struct Fleet {
    settings: SimulationSettings,
    clock: SimulationClock,
    reactors: BTreeMap<String, Reactor>,
    optimizations: OptimizationTracker,
    alert_ids: AlertSequence,
    rng: RandomSource,
    stats: DashboardStats,
    refreshes: u64,
}

impl Fleet {
    /// Creates an empty fleet whose clock starts at `start`.
    ///
    /// # Errors
    ///
    /// Returns `ReactorError::ConfigError` when the settings cannot drive a
    /// simulation (no ticks per refresh, empty history, invalid tick length).
    pub fn new(settings: SimulationSettings, start: DateTime<Utc>) -> Result<Self, ReactorError> {
        if settings.ticks_per_refresh == 0 {
            return Err(ReactorError::ConfigError("ticks_per_refresh must be at least 1".to_string()));
        }
        if settings.history_capacity == 0 {
            return Err(ReactorError::ConfigError("history_capacity must be at least 1".to_string()));
        }
        let clock = SimulationClock::new(start, tick_duration(&settings)?);
        let optimizations = OptimizationTracker::new(
            timer("optimization_delay_ms", settings.optimization_delay_ms)?,
            timer("result_display_ms", settings.result_display_ms)?,
        );

        Ok(Self {
            rng: RandomSource::new(settings.seed),
            settings,
            clock,
            reactors: BTreeMap::new(),
            optimizations,
            alert_ids: AlertSequence::default(),
            stats: DashboardStats::default(),
            refreshes: 0,
        })
    }

    pub fn from_file(file: &FleetFile, start: DateTime<Utc>) -> Result<Self, ReactorError> {
        let mut fleet = Self::new(file.simulation.clone(), start)?;
        for definition in &file.reactors {
            fleet.add_reactor(definition)?;
        }
        fleet.stats = compute_stats(fleet.reactors.values());
        Ok(fleet)
    }

    pub fn add_reactor(&mut self, definition: &ReactorDefinition) -> Result<(), ReactorError> {
        if self.reactors.contains_key(&definition.id) {
            return Err(ReactorError::DuplicateReactor(definition.id.clone()));
        }
        let reactor = Reactor::from_definition(definition, &self.settings, self.clock.now())?;
        self.reactors.insert(definition.id.clone(), reactor);
        self.stats = compute_stats(self.reactors.values());
        Ok(())
    }

    /// Advances every reactor by one refresh.
    ///
    /// A reactor whose update fails is logged and left exactly as it was
    /// after the previous refresh; the rest of the fleet still advances.
    pub fn advance_all(&mut self) {
        let tick_times: Vec<DateTime<Utc>> = (0..self.settings.ticks_per_refresh)
            .map(|_| self.clock.advance(1))
            .collect();
        let now = self.clock.now();

        for (reactor_id, reactor) in self.reactors.iter_mut() {
            let optimizing = self.optimizations.is_running(reactor_id);
            if let Err(err) = reactor.advance(&tick_times, &mut self.alert_ids, optimizing) {
                error!(reactor_id = reactor_id.as_str(), %err, "reactor update failed; skipping this refresh");
            }
        }

        let reactors = &self.reactors;
        let completed = self.optimizations.poll(now, &mut self.rng, |reactor_id| {
            reactors
                .get(reactor_id)
                .map(|r| r.prediction().yield_optimization.recommended_changes.clone())
                .unwrap_or_default()
        });
        for result in completed {
            self.on_optimization_completed(result, now);
        }

        self.refreshes += 1;
        self.stats = compute_stats(self.reactors.values());
        debug!(
            refresh = self.refreshes,
            active = self.stats.active_reactors,
            average_yield = self.stats.average_yield,
            "fleet advanced"
        );
    }

    fn on_optimization_completed(&mut self, result: OptimizationResult, now: DateTime<Utc>) {
        let Some(reactor) = self.reactors.get_mut(&result.reactor_id) else {
            self.optimizations.cancel(&result.reactor_id);
            return;
        };
        let draft = AlertDraft::new(
            AlertKind::Success,
            format!(
                "Optimization complete: +{:.1}% yield, +{:.1}% efficiency, -{:.1}% cost",
                result.yield_increase, result.efficiency_gain, result.cost_reduction
            ),
        );
        reactor.record_alert(draft, &mut self.alert_ids, now);
        reactor.update_status(false);

        if reactor.config().auto_optimize {
            let reactor_id = result.reactor_id.clone();
            if let Err(err) = self.apply_optimization(&reactor_id, &result.recommended_changes) {
                error!(reactor_id = reactor_id.as_str(), %err, "automatic optimization apply failed");
            }
        }
    }

    pub fn select_reactor(&self, reactor_id: &str) -> Option<&Reactor> {
        self.reactors.get(reactor_id)
    }

    /// Direct access to a reactor, e.g. to inject a process upset.
    pub fn reactor_mut(&mut self, reactor_id: &str) -> Result<&mut Reactor, ReactorError> {
        self.reactors
            .get_mut(reactor_id)
            .ok_or_else(|| ReactorError::ReactorNotFound(reactor_id.to_string()))
    }

    pub fn adjust_parameter(&mut self, reactor_id: &str, parameter: &str, value: f64) -> Result<(), ReactorError> {
        let now = self.clock.now();
        let reactor = self
            .reactors
            .get_mut(reactor_id)
            .ok_or_else(|| ReactorError::ReactorNotFound(reactor_id.to_string()))?;
        reactor.adjust_parameter(parameter, value, &mut self.alert_ids, now)?;
        self.restate(reactor_id);
        Ok(())
    }

    pub fn start_optimization(&mut self, reactor_id: &str) -> Result<(), ReactorError> {
        let now = self.clock.now();
        let reactor = self
            .reactors
            .get_mut(reactor_id)
            .ok_or_else(|| ReactorError::ReactorNotFound(reactor_id.to_string()))?;
        self.optimizations.start(reactor_id, now)?;
        reactor.update_status(true);
        self.stats = compute_stats(self.reactors.values());
        Ok(())
    }

    /// Replays each change through `adjust_parameter`, then schedules the
    /// reactor's optimization result to be cleared.
    ///
    /// Every change is checked, name and value, before anything is changed.
    pub fn apply_optimization(&mut self, reactor_id: &str, changes: &[ParameterAdjustment]) -> Result<(), ReactorError> {
        if !self.reactors.contains_key(reactor_id) {
            return Err(ReactorError::ReactorNotFound(reactor_id.to_string()));
        }
        for change in changes {
            let parameter = ControlParameter::from_name(&change.parameter)
                .ok_or_else(|| ReactorError::UnknownParameter(change.parameter.clone()))?;
            if !parameter.accepts(change.suggested_value) {
                return Err(ReactorError::InvalidValue {
                    parameter: parameter.to_string(),
                    value: change.suggested_value,
                });
            }
        }
        for change in changes {
            self.adjust_parameter(reactor_id, &change.parameter, change.suggested_value)?;
        }
        self.optimizations.mark_applied(reactor_id, self.clock.now());
        info!(reactor_id, changes = changes.len(), "optimization applied");
        Ok(())
    }

    pub fn dismiss_alert(&mut self, reactor_id: &str, alert_id: u64) -> Result<(), ReactorError> {
        self.reactor_mut(reactor_id)?.dismiss_alert(alert_id)?;
        self.restate(reactor_id);
        Ok(())
    }

    /// Re-derives one reactor's status and the fleet stats after an operator
    /// action changed its alerts or setpoints.
    fn restate(&mut self, reactor_id: &str) {
        let optimizing = self.optimizations.is_running(reactor_id);
        if let Some(reactor) = self.reactors.get_mut(reactor_id) {
            reactor.update_status(optimizing);
        }
        self.stats = compute_stats(self.reactors.values());
    }

    /// Re-simulates the reactor from a fresh seed, keeping its configuration.
    /// Any optimization in flight for it is cancelled.
    pub fn refresh_reactor(&mut self, reactor_id: &str) -> Result<(), ReactorError> {
        let now = self.clock.now();
        let seed = (self.rng.next() * u32::MAX as f64) as u64;
        let reactor = self
            .reactors
            .get_mut(reactor_id)
            .ok_or_else(|| ReactorError::ReactorNotFound(reactor_id.to_string()))?;
        self.optimizations.cancel(reactor_id);
        reactor.rebuild(seed, &self.settings, now)?;
        self.stats = compute_stats(self.reactors.values());
        Ok(())
    }

    pub fn replenish_enzyme(&mut self, reactor_id: &str) -> Result<(), ReactorError> {
        let now = self.clock.now();
        let reactor = self
            .reactors
            .get_mut(reactor_id)
            .ok_or_else(|| ReactorError::ReactorNotFound(reactor_id.to_string()))?;
        reactor.replenish_enzyme(&mut self.alert_ids, now);
        self.restate(reactor_id);
        Ok(())
    }

    pub fn execute(&mut self, command: &Command) -> Result<(), ReactorError> {
        match command {
            Command::AdjustParameter {
                reactor_id,
                parameter,
                value,
            } => self.adjust_parameter(reactor_id, parameter, *value),
            Command::StartOptimization { reactor_id } => self.start_optimization(reactor_id),
            Command::ApplyOptimization { reactor_id, changes } => {
                let changes = match changes {
                    Some(changes) => changes.clone(),
                    None => self
                        .optimizations
                        .result(reactor_id)
                        .map(|r| r.recommended_changes.clone())
                        .ok_or_else(|| ReactorError::NoOptimizationResult(reactor_id.clone()))?,
                };
                self.apply_optimization(reactor_id, &changes)
            }
            Command::DismissAlert { reactor_id, alert_id } => self.dismiss_alert(reactor_id, *alert_id),
            Command::RefreshReactor { reactor_id } => self.refresh_reactor(reactor_id),
            Command::ReplenishEnzyme { reactor_id } => self.replenish_enzyme(reactor_id),
        }
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        DashboardSnapshot {
            generated_at: self.clock.now(),
            stats: self.stats.clone(),
            reactors: self.reactors.values().map(Reactor::snapshot).collect(),
            optimizations: self.optimizations.results().cloned().collect(),
        }
    }

    pub fn reactors(&self) -> impl Iterator<Item = &Reactor> {
        self.reactors.values()
    }

    pub fn stats(&self) -> &DashboardStats {
        &self.stats
    }

    pub fn optimization_result(&self, reactor_id: &str) -> Option<&OptimizationResult> {
        self.optimizations.result(reactor_id)
    }

    pub fn is_optimizing(&self, reactor_id: &str) -> bool {
        self.optimizations.is_running(reactor_id)
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn refreshes(&self) -> u64 {
        self.refreshes
    }

    pub fn settings(&self) -> &SimulationSettings {
        &self.settings
    }

    pub fn len(&self) -> usize {
        self.reactors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reactors.is_empty()
    }
}
