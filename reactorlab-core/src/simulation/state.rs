use reactorlab_schemas::metrics::MetricsSnapshot;

/// Everything a tick reads and rewrites, apart from configuration and
/// random sources.
#[derive(Debug, Clone, PartialEq)]
pub struct ReactorState {
    /// Ticks completed since construction, backfill included.
    pub tick: u64,
    /// Hours the current enzyme charge has been in service.
    pub running_hours: f64,
    pub metrics: MetricsSnapshot,
}
