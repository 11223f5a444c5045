use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Info,
    Warning,
    Critical,
    Success,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: u64,
    pub reactor_id: String,
    pub kind: AlertKind,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub resolved: bool,
    pub parameter: Option<String>,
    pub value: Option<f64>,
}

impl Alert {
    pub fn is_unresolved_critical(&self) -> bool {
        self.kind == AlertKind::Critical && !self.resolved
    }
}
