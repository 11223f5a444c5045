//! Per-reactor optimization runs driven by the simulation clock.
//!
//! A run is `Running` for a fixed delay, then `Completed` with a synthesised
//! result. Once the result is applied it stays visible for a display window
//! and is then dropped. Removing a run before it completes cancels it.

use crate::{error::ReactorError, random::RandomSource};
use chrono::{DateTime, Duration, Utc};
use reactorlab_schemas::{optimization::OptimizationResult, prediction::ParameterAdjustment};
use std::collections::BTreeMap;
use tracing::info;

const YIELD_INCREASE_RANGE: (f64, f64) = (8.5, 13.5);
const EFFICIENCY_GAIN_RANGE: (f64, f64) = (12.3, 15.3);
const COST_REDUCTION_RANGE: (f64, f64) = (7.8, 9.8);

#[derive(Debug, Clone, PartialEq)]
pub enum OptimizationState {
    Running {
        started_at: DateTime<Utc>,
        completes_at: DateTime<Utc>,
    },
    Completed {
        result: OptimizationResult,
        clear_at: Option<DateTime<Utc>>,
    },
}

#[derive(Debug, Clone)]
pub struct OptimizationTracker {
    delay: Duration,
    display_window: Duration,
    runs: BTreeMap<String, OptimizationState>,
}

impl OptimizationTracker {
    pub fn new(delay: Duration, display_window: Duration) -> Self {
        Self {
            delay,
            display_window,
            runs: BTreeMap::new(),
        }
    }

    pub fn start(&mut self, reactor_id: &str, now: DateTime<Utc>) -> Result<(), ReactorError> {
        if self.is_running(reactor_id) {
            return Err(ReactorError::OptimizationInProgress(reactor_id.to_string()));
        }
        self.runs.insert(
            reactor_id.to_string(),
            OptimizationState::Running {
                started_at: now,
                completes_at: now.checked_add_signed(self.delay).unwrap_or(DateTime::<Utc>::MAX_UTC),
            },
        );
        info!(reactor_id, "optimization started");
        Ok(())
    }

    pub fn is_running(&self, reactor_id: &str) -> bool {
        matches!(self.runs.get(reactor_id), Some(OptimizationState::Running { .. }))
    }

    pub fn state(&self, reactor_id: &str) -> Option<&OptimizationState> {
        self.runs.get(reactor_id)
    }

    pub fn result(&self, reactor_id: &str) -> Option<&OptimizationResult> {
        match self.runs.get(reactor_id) {
            Some(OptimizationState::Completed { result, .. }) => Some(result),
            _ => None,
        }
    }

    pub fn results(&self) -> impl Iterator<Item = &OptimizationResult> {
        self.runs.values().filter_map(|state| match state {
            OptimizationState::Completed { result, .. } => Some(result),
            OptimizationState::Running { .. } => None,
        })
    }

    /// Drops any run for the reactor. A pending completion never fires.
    pub fn cancel(&mut self, reactor_id: &str) -> bool {
        let cancelled = self.runs.remove(reactor_id).is_some();
        if cancelled {
            info!(reactor_id, "optimization cancelled");
        }
        cancelled
    }

    /// Starts the display window of a completed result. Applying without a
    /// completed run is allowed and schedules nothing.
    pub fn mark_applied(&mut self, reactor_id: &str, now: DateTime<Utc>) {
        if let Some(OptimizationState::Completed { clear_at, .. }) = self.runs.get_mut(reactor_id) {
            *clear_at = Some(now.checked_add_signed(self.display_window).unwrap_or(DateTime::<Utc>::MAX_UTC));
        }
    }

    /// Completes runs whose delay has elapsed and drops results whose display
    /// window has lapsed. Returns the results completed by this call.
    ///
    /// `recommendations` supplies the current recommended changes for a reactor.
    pub fn poll<F>(&mut self, now: DateTime<Utc>, rng: &mut RandomSource, recommendations: F) -> Vec<OptimizationResult>
    where
        F: Fn(&str) -> Vec<ParameterAdjustment>,
    {
        self.runs.retain(|reactor_id, state| match state {
            OptimizationState::Completed { clear_at: Some(clear_at), .. } if *clear_at <= now => {
                info!(reactor_id = reactor_id.as_str(), "optimization result cleared");
                false
            }
            _ => true,
        });

        let mut completed = Vec::new();
        for (reactor_id, state) in self.runs.iter_mut() {
            let due = matches!(state, OptimizationState::Running { completes_at, .. } if *completes_at <= now);
            if !due {
                continue;
            }
            let result = OptimizationResult {
                reactor_id: reactor_id.clone(),
                yield_increase: rng.range(YIELD_INCREASE_RANGE.0, YIELD_INCREASE_RANGE.1),
                efficiency_gain: rng.range(EFFICIENCY_GAIN_RANGE.0, EFFICIENCY_GAIN_RANGE.1),
                cost_reduction: rng.range(COST_REDUCTION_RANGE.0, COST_REDUCTION_RANGE.1),
                recommended_changes: recommendations(reactor_id),
                completed_at: now,
            };
            info!(
                reactor_id = reactor_id.as_str(),
                yield_increase = result.yield_increase,
                "optimization completed"
            );
            *state = OptimizationState::Completed {
                result: result.clone(),
                clear_at: None,
            };
            completed.push(result);
        }
        completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    fn tracker() -> OptimizationTracker {
        OptimizationTracker::new(Duration::milliseconds(3_500), Duration::seconds(5))
    }

    #[test]
    fn completes_after_delay_with_bounded_figures() {
        let mut tracker = tracker();
        let mut rng = RandomSource::new(11);
        tracker.start("R-01", t0()).unwrap();

        assert!(tracker.poll(t0() + Duration::seconds(3), &mut rng, |_| Vec::new()).is_empty());
        assert!(tracker.is_running("R-01"));

        let done = tracker.poll(t0() + Duration::seconds(4), &mut rng, |_| Vec::new());
        assert_eq!(done.len(), 1);
        let result = &done[0];
        assert!((8.5..13.5).contains(&result.yield_increase));
        assert!((12.3..15.3).contains(&result.efficiency_gain));
        assert!((7.8..9.8).contains(&result.cost_reduction));
        assert!(!tracker.is_running("R-01"));
        assert!(tracker.result("R-01").is_some());
    }

    #[test]
    fn runs_are_tracked_per_reactor() {
        let mut tracker = tracker();
        tracker.start("R-01", t0()).unwrap();
        tracker.start("R-02", t0()).unwrap();
        assert!(matches!(
            tracker.start("R-01", t0()),
            Err(ReactorError::OptimizationInProgress(id)) if id == "R-01"
        ));
    }

    #[test]
    fn applied_results_clear_after_display_window() {
        let mut tracker = tracker();
        let mut rng = RandomSource::new(2);
        tracker.start("R-01", t0()).unwrap();
        tracker.poll(t0() + Duration::seconds(4), &mut rng, |_| Vec::new());

        // Unapplied results stay visible.
        tracker.poll(t0() + Duration::seconds(60), &mut rng, |_| Vec::new());
        assert!(tracker.result("R-01").is_some());

        tracker.mark_applied("R-01", t0() + Duration::seconds(60));
        tracker.poll(t0() + Duration::seconds(64), &mut rng, |_| Vec::new());
        assert!(tracker.result("R-01").is_some());
        tracker.poll(t0() + Duration::seconds(65), &mut rng, |_| Vec::new());
        assert!(tracker.state("R-01").is_none());
    }

    #[test]
    fn cancelled_runs_never_complete() {
        let mut tracker = tracker();
        let mut rng = RandomSource::new(2);
        tracker.start("R-01", t0()).unwrap();
        assert!(tracker.cancel("R-01"));
        assert!(tracker.poll(t0() + Duration::seconds(10), &mut rng, |_| Vec::new()).is_empty());
        assert!(tracker.result("R-01").is_none());
    }
}
