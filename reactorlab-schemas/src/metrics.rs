use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One reading of every monitored reactor variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// °C
    pub temperature: f64,
    pub ph: f64,
    /// bar
    pub pressure: f64,
    /// mL/min
    pub flow_rate: f64,
    /// % of fresh-enzyme activity
    pub enzyme_activity: f64,
    /// g/L
    pub substrate_concentration: f64,
    /// %
    pub product_yield: f64,
    /// % saturation
    pub dissolved_oxygen: f64,
    pub timestamp: DateTime<Utc>,
}

impl MetricsSnapshot {
    /// Field names paired with their values, in declaration order.
    pub fn fields(&self) -> [(&'static str, f64); 8] {
        [
            ("temperature", self.temperature),
            ("ph", self.ph),
            ("pressure", self.pressure),
            ("flow_rate", self.flow_rate),
            ("enzyme_activity", self.enzyme_activity),
            ("substrate_concentration", self.substrate_concentration),
            ("product_yield", self.product_yield),
            ("dissolved_oxygen", self.dissolved_oxygen),
        ]
    }

    /// Returns the name of the first non-finite field, if any.
    pub fn first_non_finite(&self) -> Option<&'static str> {
        self.fields()
            .into_iter()
            .find(|(_, value)| !value.is_finite())
            .map(|(name, _)| name)
    }
}

/// A snapshot retained in a reactor's rolling history.
///
/// `id` is the simulator tick that produced the snapshot, so it is unique per
/// reactor and increases with time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub id: u64,
    #[serde(flatten)]
    pub metrics: MetricsSnapshot,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn snapshot() -> MetricsSnapshot {
        MetricsSnapshot {
            temperature: 35.0,
            ph: 7.4,
            pressure: 1.3,
            flow_rate: 150.0,
            enzyme_activity: 95.0,
            substrate_concentration: 15.0,
            product_yield: 80.0,
            dissolved_oxygen: 85.0,
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn finite_snapshot_has_no_offending_field() {
        assert_eq!(snapshot().first_non_finite(), None);
    }

    #[test]
    fn reports_first_non_finite_field() {
        let mut metrics = snapshot();
        metrics.product_yield = f64::NAN;
        metrics.dissolved_oxygen = f64::INFINITY;
        assert_eq!(metrics.first_non_finite(), Some("product_yield"));
    }

    #[test]
    fn history_point_flattens_metrics() {
        let point = HistoryPoint { id: 7, metrics: snapshot() };
        let json = serde_json::to_value(&point).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["flow_rate"], 150.0);
    }
}
