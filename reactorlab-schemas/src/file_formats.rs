use crate::{command::ScheduledCommand, reactor::ReactorConfig};
use serde::{Deserialize, Serialize};

/// Which of the two calibrated tick variants a fleet runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileKind {
    #[default]
    Reference,
    Dashboard,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    pub profile: ProfileKind,
    pub tick_seconds: f64,
    pub ticks_per_refresh: u32,
    pub refresh_interval_ms: u64,
    pub history_capacity: usize,
    pub alert_capacity: usize,
    pub backfill_points: usize,
    pub optimization_delay_ms: u64,
    pub result_display_ms: u64,
    /// Seeds the fleet-level random source (optimization figures, refresh reseeding).
    pub seed: u64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            profile: ProfileKind::Reference,
            tick_seconds: 1.0,
            ticks_per_refresh: 2,
            refresh_interval_ms: 2_000,
            history_capacity: 288,
            alert_capacity: 5,
            backfill_points: 288,
            optimization_delay_ms: 3_500,
            result_display_ms: 5_000,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactorDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub location: String,
    pub seed: u64,
    #[serde(default)]
    pub uptime_hours: f64,
    #[serde(default)]
    pub batch_count: u32,
    #[serde(default)]
    pub config: ReactorConfig,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FleetFile {
    #[serde(default)]
    pub simulation: SimulationSettings,
    pub reactors: Vec<ReactorDefinition>,
    #[serde(default)]
    pub scenario: Vec<ScheduledCommand>,
}
