use reactorlab_schemas::metrics::{HistoryPoint, MetricsSnapshot};
use serde::Serialize;
use std::collections::VecDeque;

/// 24 h at 5-minute sampling.
pub const DEFAULT_HISTORY_CAPACITY: usize = 288;

/// Rolling window of snapshots, oldest first.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct History {
    #[serde(skip)]
    capacity: usize,
    points: VecDeque<HistoryPoint>,
}

impl History {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            points: VecDeque::new(),
        }
    }

    /// Appends the newest point and evicts the oldest beyond capacity.
    pub fn push(&mut self, id: u64, metrics: MetricsSnapshot) {
        self.points.push_back(HistoryPoint { id, metrics });
        while self.points.len() > self.capacity {
            self.points.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn oldest(&self) -> Option<&HistoryPoint> {
        self.points.front()
    }

    pub fn latest(&self) -> Option<&HistoryPoint> {
        self.points.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryPoint> {
        self.points.iter()
    }

    /// The last `n` points, oldest to newest.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &HistoryPoint> {
        self.points.iter().skip(self.points.len().saturating_sub(n))
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }
}
