use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatingMode {
    Batch,
    Continuous,
    FedBatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReactorStatus {
    Running,
    Idle,
    Maintenance,
    Error,
    Optimizing,
}

impl ReactorStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ReactorStatus::Running => "running",
            ReactorStatus::Idle => "idle",
            ReactorStatus::Maintenance => "maintenance",
            ReactorStatus::Error => "error",
            ReactorStatus::Optimizing => "optimizing",
        }
    }

    /// Running and optimizing reactors count as active on the dashboard.
    pub fn is_active(self) -> bool {
        matches!(self, ReactorStatus::Running | ReactorStatus::Optimizing)
    }
}

/// Setpoints and operating limits for a single reactor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReactorConfig {
    pub target_temperature: f64,
    pub target_ph: f64,
    pub target_pressure: f64,
    pub target_flow_rate: f64,
    pub min_enzyme_activity: f64,
    pub max_substrate_concentration: f64,
    pub operating_mode: OperatingMode,
    pub auto_optimize: bool,
}

impl Default for ReactorConfig {
    fn default() -> Self {
        Self {
            target_temperature: 37.0,
            target_ph: 7.4,
            target_pressure: 1.3,
            target_flow_rate: 150.0,
            min_enzyme_activity: 70.0,
            max_substrate_concentration: 20.0,
            operating_mode: OperatingMode::Continuous,
            auto_optimize: false,
        }
    }
}

/// The parameters an operator may adjust on a running reactor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlParameter {
    Temperature,
    Ph,
    FlowRate,
}

impl ControlParameter {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "temperature" => Some(Self::Temperature),
            "ph" | "pH" => Some(Self::Ph),
            "flow_rate" | "flowRate" | "flow" => Some(Self::FlowRate),
            _ => None,
        }
    }

    /// Whether `value` is an acceptable setpoint for this parameter.
    pub fn accepts(self, value: f64) -> bool {
        value.is_finite()
            && match self {
                Self::Temperature => (0.0..=100.0).contains(&value),
                Self::Ph => (0.0..=14.0).contains(&value),
                Self::FlowRate => value >= 0.0,
            }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Self::Temperature => "°C",
            Self::Ph => "",
            Self::FlowRate => " mL/min",
        }
    }
}

impl fmt::Display for ControlParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Temperature => "temperature",
            Self::Ph => "pH",
            Self::FlowRate => "flow_rate",
        };
        f.write_str(name)
    }
}
