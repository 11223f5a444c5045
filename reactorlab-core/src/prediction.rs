//! Closed-form forecasts recomputed from scratch on every refresh.
//!
//! There is no smoothing between refreshes, so a noisy reading moves the
//! forecast by the full amount.

use crate::{kinetics::BASE_DECAY_RATE_PER_HR, random::RandomSource};
use reactorlab_schemas::{
    metrics::MetricsSnapshot,
    prediction::{
        AnomalyDetection, DeactivationForecast, ParameterAdjustment, Prediction, Priority,
        YieldOptimization,
    },
};

pub const DEACTIVATION_THRESHOLD: f64 = 70.0;
const REPLENISH_ADVISORY_BELOW: f64 = 80.0;

pub const OPTIMAL_TEMPERATURE: f64 = 35.8;
pub const OPTIMAL_PH: f64 = 7.35;
pub const OPTIMAL_FLOW_RATE: f64 = 165.0;

const TEMPERATURE_YIELD_WEIGHT: f64 = 2.0;
const PH_YIELD_WEIGHT: f64 = 15.0;
const FLOW_YIELD_WEIGHT: f64 = 0.05;
const MAX_PREDICTED_YIELD: f64 = 95.0;
const YIELD_INTERVAL_HALF_WIDTH: f64 = 2.5;
const ANOMALY_FLAG_SCORE: f64 = 0.3;

/// Hours until activity decays to the deactivation threshold at the base rate.
pub fn hours_until_deactivation(activity: f64) -> f64 {
    if activity <= 0.0 {
        return 0.0;
    }
    ((activity / DEACTIVATION_THRESHOLD).ln() / BASE_DECAY_RATE_PER_HR).max(0.0)
}

pub fn forecast_deactivation(metrics: &MetricsSnapshot, rng: &mut RandomSource) -> DeactivationForecast {
    let activity = metrics.enzyme_activity;
    let suggested_action = (activity < REPLENISH_ADVISORY_BELOW)
        .then(|| "Consider enzyme replenishment within the next batch cycle".to_string());
    DeactivationForecast {
        hours_remaining: hours_until_deactivation(activity),
        confidence: 0.87 + rng.range(0.0, 0.1),
        suggested_action,
    }
}

struct SetpointDeltas {
    temperature: f64,
    ph: f64,
    flow_rate: f64,
}

impl SetpointDeltas {
    fn from_metrics(metrics: &MetricsSnapshot) -> Self {
        Self {
            temperature: (metrics.temperature - OPTIMAL_TEMPERATURE).abs(),
            ph: (metrics.ph - OPTIMAL_PH).abs(),
            flow_rate: (metrics.flow_rate - OPTIMAL_FLOW_RATE).abs(),
        }
    }
}

pub fn optimize_yield(metrics: &MetricsSnapshot) -> YieldOptimization {
    let deltas = SetpointDeltas::from_metrics(metrics);
    let temperature_gain = deltas.temperature * TEMPERATURE_YIELD_WEIGHT;
    let ph_gain = deltas.ph * PH_YIELD_WEIGHT;
    let flow_gain = deltas.flow_rate * FLOW_YIELD_WEIGHT;

    let current_yield = metrics.product_yield;
    let predicted_yield = (current_yield + temperature_gain + ph_gain + flow_gain).min(MAX_PREDICTED_YIELD);

    let mut recommended_changes = Vec::new();
    if deltas.temperature > 0.5 {
        recommended_changes.push(ParameterAdjustment {
            parameter: "temperature".to_string(),
            current_value: metrics.temperature,
            suggested_value: OPTIMAL_TEMPERATURE,
            impact: format!("+{:.1}% yield", temperature_gain),
            priority: if deltas.temperature > 1.0 { Priority::High } else { Priority::Medium },
        });
    }
    if deltas.ph > 0.1 {
        recommended_changes.push(ParameterAdjustment {
            parameter: "pH".to_string(),
            current_value: metrics.ph,
            suggested_value: OPTIMAL_PH,
            impact: format!("+{:.1}% yield", ph_gain),
            priority: if deltas.ph > 0.3 { Priority::High } else { Priority::Medium },
        });
    }
    if deltas.flow_rate > 10.0 {
        recommended_changes.push(ParameterAdjustment {
            parameter: "flow_rate".to_string(),
            current_value: metrics.flow_rate,
            suggested_value: OPTIMAL_FLOW_RATE,
            impact: format!("+{:.1}% yield", flow_gain),
            priority: Priority::Low,
        });
    }

    YieldOptimization {
        current_yield,
        predicted_yield,
        confidence_interval: (
            predicted_yield - YIELD_INTERVAL_HALF_WIDTH,
            predicted_yield + YIELD_INTERVAL_HALF_WIDTH,
        ),
        recommended_changes,
    }
}

pub fn detect_anomalies(metrics: &MetricsSnapshot) -> AnomalyDetection {
    let deltas = SetpointDeltas::from_metrics(metrics);
    let raw = deltas.temperature / 5.0 + deltas.ph / 2.0 + (100.0 - metrics.enzyme_activity) / 100.0;
    let score = raw.clamp(0.0, 1.0);
    let flagged_parameters = if score > ANOMALY_FLAG_SCORE {
        vec!["temperature".to_string(), "pH".to_string()]
    } else {
        Vec::new()
    };
    AnomalyDetection {
        score,
        flagged_parameters,
    }
}

pub fn predict(metrics: &MetricsSnapshot, rng: &mut RandomSource) -> Prediction {
    Prediction {
        enzyme_deactivation: forecast_deactivation(metrics, rng),
        yield_optimization: optimize_yield(metrics),
        anomaly_detection: detect_anomalies(metrics),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinetics::EnzymeKinetics;
    use chrono::{TimeZone, Utc};

    fn metrics() -> MetricsSnapshot {
        MetricsSnapshot {
            temperature: OPTIMAL_TEMPERATURE,
            ph: OPTIMAL_PH,
            pressure: 1.3,
            flow_rate: OPTIMAL_FLOW_RATE,
            enzyme_activity: 95.0,
            substrate_concentration: 15.0,
            product_yield: 80.0,
            dissolved_oxygen: 85.0,
            timestamp: Utc.with_ymd_and_hms(2024, 4, 4, 4, 0, 0).unwrap(),
        }
    }

    #[test]
    fn deactivation_hours_follow_log_ratio() {
        let expected = (95.0_f64 / 70.0).ln() / 0.002;
        assert!((hours_until_deactivation(95.0) - expected).abs() < 1e-9);
        assert_eq!(hours_until_deactivation(70.0), 0.0);
        assert_eq!(hours_until_deactivation(50.0), 0.0);
        assert_eq!(hours_until_deactivation(0.0), 0.0);
        assert_eq!(hours_until_deactivation(-3.0), 0.0);
    }

    #[test]
    fn remaining_hours_shrink_as_activity_decays() {
        let kinetics = EnzymeKinetics::new(RandomSource::new(12345));
        let mut previous = f64::INFINITY;
        for hour in (0..=300).step_by(10) {
            let activity = kinetics.expected_activity(hour as f64, 37.0, 7.4);
            let remaining = hours_until_deactivation(activity);
            assert!(remaining <= previous);
            previous = remaining;
        }
        assert_eq!(previous, 0.0);
    }

    #[test]
    fn confidence_is_bounded_and_advice_only_when_low() {
        let mut rng = RandomSource::new(1);
        let fresh = forecast_deactivation(&metrics(), &mut rng);
        assert!((0.87..0.97).contains(&fresh.confidence));
        assert!(fresh.suggested_action.is_none());

        let mut tired = metrics();
        tired.enzyme_activity = 76.0;
        assert!(forecast_deactivation(&tired, &mut rng).suggested_action.is_some());
    }

    #[test]
    fn on_setpoint_reactor_needs_no_changes() {
        let optimization = optimize_yield(&metrics());
        assert!(optimization.recommended_changes.is_empty());
        assert_eq!(optimization.predicted_yield, 80.0);
        assert_eq!(optimization.confidence_interval, (77.5, 82.5));
    }

    #[test]
    fn recommendations_are_ordered_and_prioritised() {
        let mut m = metrics();
        m.temperature = 37.5;
        m.ph = 7.6;
        m.flow_rate = 140.0;
        let optimization = optimize_yield(&m);
        let names: Vec<&str> = optimization
            .recommended_changes
            .iter()
            .map(|c| c.parameter.as_str())
            .collect();
        assert_eq!(names, vec!["temperature", "pH", "flow_rate"]);
        assert_eq!(optimization.recommended_changes[0].priority, Priority::High);
        assert_eq!(optimization.recommended_changes[1].priority, Priority::Medium);
        assert_eq!(optimization.recommended_changes[2].priority, Priority::Low);
        assert_eq!(optimization.recommended_changes[0].impact, "+3.4% yield");
        let expected = 80.0 + 1.7 * 2.0 + 0.25 * 15.0 + 25.0 * 0.05;
        assert!((optimization.predicted_yield - expected).abs() < 1e-9);
    }

    #[test]
    fn predicted_yield_is_capped() {
        let mut m = metrics();
        m.product_yield = 93.0;
        m.temperature = 30.0;
        assert_eq!(optimize_yield(&m).predicted_yield, 95.0);
    }

    #[test]
    fn anomaly_score_is_clamped_and_flags_above_threshold() {
        let calm = detect_anomalies(&metrics());
        assert!((calm.score - 0.05).abs() < 1e-9);
        assert!(calm.flagged_parameters.is_empty());

        let mut upset = metrics();
        upset.temperature = 45.0;
        upset.enzyme_activity = 40.0;
        let anomaly = detect_anomalies(&upset);
        assert_eq!(anomaly.score, 1.0);
        assert_eq!(anomaly.flagged_parameters, vec!["temperature", "pH"]);
    }
}
