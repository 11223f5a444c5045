use crate::prediction::ParameterAdjustment;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    AdjustParameter {
        reactor_id: String,
        parameter: String,
        value: f64,
    },
    StartOptimization {
        reactor_id: String,
    },
    /// Applies the changes of the reactor's latest optimization result when
    /// `changes` is omitted.
    ApplyOptimization {
        reactor_id: String,
        #[serde(default)]
        changes: Option<Vec<ParameterAdjustment>>,
    },
    DismissAlert {
        reactor_id: String,
        alert_id: u64,
    },
    RefreshReactor {
        reactor_id: String,
    },
    ReplenishEnzyme {
        reactor_id: String,
    },
}

impl Command {
    pub fn reactor_id(&self) -> &str {
        match self {
            Command::AdjustParameter { reactor_id, .. }
            | Command::StartOptimization { reactor_id }
            | Command::ApplyOptimization { reactor_id, .. }
            | Command::DismissAlert { reactor_id, .. }
            | Command::RefreshReactor { reactor_id }
            | Command::ReplenishEnzyme { reactor_id } => reactor_id,
        }
    }
}

/// A command to issue once the driver has completed `at_refresh` refreshes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledCommand {
    pub at_refresh: u64,
    pub command: Command,
}
