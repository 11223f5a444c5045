use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

/// A suggested change to one control parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterAdjustment {
    pub parameter: String,
    pub current_value: f64,
    pub suggested_value: f64,
    pub impact: String,
    pub priority: Priority,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeactivationForecast {
    pub hours_remaining: f64,
    pub confidence: f64,
    pub suggested_action: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YieldOptimization {
    pub current_yield: f64,
    pub predicted_yield: f64,
    pub confidence_interval: (f64, f64),
    pub recommended_changes: Vec<ParameterAdjustment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyDetection {
    pub score: f64,
    pub flagged_parameters: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub enzyme_deactivation: DeactivationForecast,
    pub yield_optimization: YieldOptimization,
    pub anomaly_detection: AnomalyDetection,
}
