use crate::{
    alert::Alert,
    metrics::{HistoryPoint, MetricsSnapshot},
    optimization::OptimizationResult,
    prediction::Prediction,
    reactor::{ReactorConfig, ReactorStatus},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fleet-wide figures shown in the dashboard header.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_reactors: usize,
    pub active_reactors: usize,
    /// Mean product yield across all reactors (%).
    pub average_yield: f64,
    /// Mean enzyme activity across all reactors (%).
    pub system_health: f64,
    pub total_alerts: usize,
    pub critical_alerts: usize,
    /// Estimated kg/day from running reactors.
    pub daily_production: f64,
    /// Share of reactors that are active (%).
    pub uptime: f64,
}

/// Serialisable view of one reactor for the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactorSnapshot {
    pub id: String,
    pub name: String,
    pub location: String,
    pub status: ReactorStatus,
    pub uptime_hours: f64,
    pub batch_count: u32,
    pub last_maintenance: DateTime<Utc>,
    pub config: ReactorConfig,
    pub metrics: MetricsSnapshot,
    pub history: Vec<HistoryPoint>,
    pub alerts: Vec<Alert>,
    pub prediction: Prediction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub generated_at: DateTime<Utc>,
    pub stats: DashboardStats,
    pub reactors: Vec<ReactorSnapshot>,
    pub optimizations: Vec<OptimizationResult>,
}
