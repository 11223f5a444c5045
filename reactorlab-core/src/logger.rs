use crate::{error::ReactorError, fleet::Fleet};
use csv::Writer;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One CSV row: a reactor's state at the end of a refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub refresh: u64,
    pub reactor_id: String,
    pub timestamp: String,
    pub status: String,
    pub temperature: f64,
    pub ph: f64,
    pub pressure: f64,
    pub flow_rate: f64,
    pub enzyme_activity: f64,
    pub substrate_concentration: f64,
    pub product_yield: f64,
    pub dissolved_oxygen: f64,
    pub hours_remaining: f64,
    pub predicted_yield: f64,
    pub anomaly_score: f64,
    pub unresolved_alerts: usize,
}

pub struct TimeSeriesLogger {
    path: String,
    writer: Writer<fs::File>,
}

impl TimeSeriesLogger {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, ReactorError> {
        let display = path.as_ref().display().to_string();
        let writer = Writer::from_path(path.as_ref()).map_err(|e| ReactorError::CsvError(display.clone(), e))?;
        Ok(Self { path: display, writer })
    }

    pub fn log_fleet(&mut self, fleet: &Fleet) -> Result<(), ReactorError> {
        for reactor in fleet.reactors() {
            let metrics = reactor.metrics();
            let prediction = reactor.prediction();
            let entry = LogEntry {
                refresh: fleet.refreshes(),
                reactor_id: reactor.id().to_string(),
                timestamp: metrics.timestamp.to_rfc3339(),
                status: reactor.status().as_str().to_string(),
                temperature: metrics.temperature,
                ph: metrics.ph,
                pressure: metrics.pressure,
                flow_rate: metrics.flow_rate,
                enzyme_activity: metrics.enzyme_activity,
                substrate_concentration: metrics.substrate_concentration,
                product_yield: metrics.product_yield,
                dissolved_oxygen: metrics.dissolved_oxygen,
                hours_remaining: prediction.enzyme_deactivation.hours_remaining,
                predicted_yield: prediction.yield_optimization.predicted_yield,
                anomaly_score: prediction.anomaly_detection.score,
                unresolved_alerts: reactor.alerts().unresolved().count(),
            };
            self.writer
                .serialize(entry)
                .map_err(|e| ReactorError::CsvError(self.path.clone(), e))?;
        }
        self.writer
            .flush()
            .map_err(|e| ReactorError::FileIO(self.path.clone(), e))?;
        Ok(())
    }
}

/// Writes the fleet's dashboard snapshot as pretty-printed JSON.
pub fn write_snapshot(fleet: &Fleet, path: impl AsRef<Path>) -> Result<(), ReactorError> {
    let json = serde_json::to_string_pretty(&fleet.snapshot())?;
    fs::write(path.as_ref(), json).map_err(|e| ReactorError::FileIO(path.as_ref().display().to_string(), e))
}
