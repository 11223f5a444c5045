use crate::prediction::ParameterAdjustment;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of a completed optimization run, shown until it is applied and
/// its display window lapses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub reactor_id: String,
    /// Percentage points.
    pub yield_increase: f64,
    pub efficiency_gain: f64,
    pub cost_reduction: f64,
    pub recommended_changes: Vec<ParameterAdjustment>,
    pub completed_at: DateTime<Utc>,
}
