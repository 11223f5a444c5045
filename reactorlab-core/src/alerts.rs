//! Threshold alerts and the capped per-reactor alert list.

use crate::history::History;
use chrono::{DateTime, Utc};
use reactorlab_schemas::{
    alert::{Alert, AlertKind},
    metrics::MetricsSnapshot,
};
use std::collections::VecDeque;

pub const DEFAULT_ALERT_CAPACITY: usize = 5;

const PH_REFERENCE: f64 = 7.4;
const PH_WARNING_DEVIATION: f64 = 0.3;
const PH_CRITICAL_DEVIATION: f64 = 0.5;
const ACTIVITY_WARNING: f64 = 75.0;
const ACTIVITY_CRITICAL: f64 = 70.0;
const STABILITY_WINDOW: usize = 10;
const STABILITY_VARIANCE_LIMIT: f64 = 0.5;
const YIELD_SUCCESS: f64 = 82.0;

/// An alert before it is given an id and attached to a reactor.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertDraft {
    pub kind: AlertKind,
    pub message: String,
    pub parameter: Option<String>,
    pub value: Option<f64>,
    pub resolved: bool,
}

impl AlertDraft {
    pub fn new(kind: AlertKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            parameter: None,
            value: None,
            resolved: false,
        }
    }

    pub fn for_parameter(mut self, parameter: &str, value: f64) -> Self {
        self.parameter = Some(parameter.to_string());
        self.value = Some(value);
        self
    }

    /// Informational alerts are created already resolved.
    pub fn pre_resolved(mut self) -> Self {
        self.resolved = true;
        self
    }
}

/// Mean squared deviation of the last ten recorded temperatures from the
/// current one. `None` until there is history to compare against.
pub fn temperature_variance(metrics: &MetricsSnapshot, history: &History) -> Option<f64> {
    let recent: Vec<f64> = history
        .recent(STABILITY_WINDOW)
        .map(|p| p.metrics.temperature)
        .collect();
    if recent.is_empty() {
        return None;
    }
    let sum: f64 = recent.iter().map(|t| (t - metrics.temperature).powi(2)).sum();
    Some(sum / recent.len() as f64)
}

/// Evaluates every threshold rule against the current snapshot.
pub fn derive_alerts(metrics: &MetricsSnapshot, history: &History) -> Vec<AlertDraft> {
    let mut drafts = Vec::new();

    let ph_deviation = (metrics.ph - PH_REFERENCE).abs();
    if ph_deviation > PH_WARNING_DEVIATION {
        let kind = if ph_deviation > PH_CRITICAL_DEVIATION {
            AlertKind::Critical
        } else {
            AlertKind::Warning
        };
        drafts.push(
            AlertDraft::new(
                kind,
                format!("pH deviation detected: {:.2} (reference {:.1})", metrics.ph, PH_REFERENCE),
            )
            .for_parameter("pH", metrics.ph),
        );
    }

    if metrics.enzyme_activity < ACTIVITY_WARNING {
        let kind = if metrics.enzyme_activity < ACTIVITY_CRITICAL {
            AlertKind::Critical
        } else {
            AlertKind::Warning
        };
        drafts.push(
            AlertDraft::new(kind, format!("Enzyme activity low: {:.1}%", metrics.enzyme_activity))
                .for_parameter("enzyme_activity", metrics.enzyme_activity),
        );
    }

    if let Some(variance) = temperature_variance(metrics, history) {
        if variance > STABILITY_VARIANCE_LIMIT {
            drafts.push(
                AlertDraft::new(
                    AlertKind::Info,
                    format!("Temperature fluctuation detected (variance {:.2})", variance),
                )
                .for_parameter("temperature", metrics.temperature)
                .pre_resolved(),
            );
        }
    }

    if metrics.product_yield > YIELD_SUCCESS {
        drafts.push(
            AlertDraft::new(
                AlertKind::Success,
                format!("Excellent yield performance: {:.1}%", metrics.product_yield),
            )
            .for_parameter("product_yield", metrics.product_yield)
            .pre_resolved(),
        );
    }

    drafts
}

/// Hands out alert ids that are unique across a fleet.
#[derive(Debug, Clone, Default)]
pub struct AlertSequence {
    next: u64,
}

impl AlertSequence {
    pub fn next_id(&mut self) -> u64 {
        self.next += 1;
        self.next
    }
}

/// The visible alerts of one reactor, newest first.
#[derive(Debug, Clone)]
pub struct AlertLog {
    capacity: usize,
    alerts: VecDeque<Alert>,
}

impl AlertLog {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            alerts: VecDeque::new(),
        }
    }

    pub fn record(
        &mut self,
        ids: &mut AlertSequence,
        reactor_id: &str,
        draft: AlertDraft,
        timestamp: DateTime<Utc>,
    ) -> u64 {
        let id = ids.next_id();
        self.alerts.push_front(Alert {
            id,
            reactor_id: reactor_id.to_string(),
            kind: draft.kind,
            message: draft.message,
            timestamp,
            resolved: draft.resolved,
            parameter: draft.parameter,
            value: draft.value,
        });
        self.alerts.truncate(self.capacity);
        id
    }

    /// Marks an alert resolved. Returns `false` if no alert has that id;
    /// dismissing an already resolved alert is a no-op.
    pub fn dismiss(&mut self, alert_id: u64) -> bool {
        match self.alerts.iter_mut().find(|a| a.id == alert_id) {
            Some(alert) => {
                alert.resolved = true;
                true
            }
            None => false,
        }
    }

    pub fn has_unresolved_critical(&self) -> bool {
        self.alerts.iter().any(Alert::is_unresolved_critical)
    }

    pub fn unresolved(&self) -> impl Iterator<Item = &Alert> {
        self.alerts.iter().filter(|a| !a.resolved)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Alert> {
        self.alerts.iter()
    }

    pub fn get(&self, alert_id: u64) -> Option<&Alert> {
        self.alerts.iter().find(|a| a.id == alert_id)
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    pub fn clear(&mut self) {
        self.alerts.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 2, 12, 0, 0).unwrap()
    }

    fn nominal() -> MetricsSnapshot {
        MetricsSnapshot {
            temperature: 36.0,
            ph: 7.4,
            pressure: 1.3,
            flow_rate: 160.0,
            enzyme_activity: 90.0,
            substrate_concentration: 15.0,
            product_yield: 78.0,
            dissolved_oxygen: 85.0,
            timestamp: at(),
        }
    }

    #[test]
    fn nominal_conditions_raise_nothing() {
        assert!(derive_alerts(&nominal(), &History::with_capacity(10)).is_empty());
    }

    #[test]
    fn ph_severity_depends_on_deviation() {
        let history = History::with_capacity(10);
        let mut metrics = nominal();

        metrics.ph = 8.0;
        let drafts = derive_alerts(&metrics, &history);
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].kind, AlertKind::Critical);
        assert_eq!(drafts[0].parameter.as_deref(), Some("pH"));
        assert!(!drafts[0].resolved);

        metrics.ph = 7.0;
        assert_eq!(derive_alerts(&metrics, &history)[0].kind, AlertKind::Warning);

        metrics.ph = 7.65;
        assert!(derive_alerts(&metrics, &history).is_empty());
    }

    #[test]
    fn low_activity_escalates_below_seventy() {
        let history = History::with_capacity(10);
        let mut metrics = nominal();
        metrics.enzyme_activity = 72.0;
        assert_eq!(derive_alerts(&metrics, &history)[0].kind, AlertKind::Warning);
        metrics.enzyme_activity = 65.0;
        assert_eq!(derive_alerts(&metrics, &history)[0].kind, AlertKind::Critical);
    }

    #[test]
    fn unstable_temperature_raises_resolved_info() {
        let mut history = History::with_capacity(20);
        for (i, t) in [34.0, 38.0, 34.0, 38.0, 34.0].into_iter().enumerate() {
            let mut m = nominal();
            m.temperature = t;
            history.push(i as u64, m);
        }
        let drafts = derive_alerts(&nominal(), &history);
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].kind, AlertKind::Info);
        assert!(drafts[0].resolved);
    }

    #[test]
    fn high_yield_is_celebrated() {
        let mut metrics = nominal();
        metrics.product_yield = 85.0;
        let drafts = derive_alerts(&metrics, &History::with_capacity(10));
        assert_eq!(drafts[0].kind, AlertKind::Success);
        assert!(drafts[0].resolved);
    }

    #[test]
    fn log_keeps_newest_entries_first() {
        let mut ids = AlertSequence::default();
        let mut log = AlertLog::with_capacity(DEFAULT_ALERT_CAPACITY);
        for i in 0..8 {
            log.record(&mut ids, "R-01", AlertDraft::new(AlertKind::Info, format!("alert {}", i)), at());
        }
        assert_eq!(log.len(), 5);
        let messages: Vec<&str> = log.iter().map(|a| a.message.as_str()).collect();
        assert_eq!(messages[0], "alert 7");
        assert_eq!(messages[4], "alert 3");
    }

    #[test]
    fn huge_capacity_allocates_on_demand() {
        let mut ids = AlertSequence::default();
        let mut log = AlertLog::with_capacity(usize::MAX);
        log.record(&mut ids, "R-01", AlertDraft::new(AlertKind::Info, "hello"), at());
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn dismiss_is_one_way_and_idempotent() {
        let mut ids = AlertSequence::default();
        let mut log = AlertLog::with_capacity(5);
        let id = log.record(&mut ids, "R-01", AlertDraft::new(AlertKind::Critical, "boom"), at());
        assert!(log.has_unresolved_critical());

        assert!(log.dismiss(id));
        assert!(log.get(id).unwrap().resolved);
        assert!(log.dismiss(id));
        assert!(log.get(id).unwrap().resolved);
        assert!(!log.has_unresolved_critical());
        assert!(!log.dismiss(id + 100));
    }
}
