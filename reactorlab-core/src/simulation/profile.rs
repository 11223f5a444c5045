use reactorlab_schemas::file_formats::ProfileKind;

/// How product yield's theoretical target is derived each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YieldModel {
    /// `(activity / 100) * (substrate / 15) * 90`
    SubstrateLimited,
    /// `(activity / 100) * 90`
    ActivityOnly,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FlowLimit {
    Floor(f64),
    Clamp(f64, f64),
}

impl FlowLimit {
    pub fn apply(self, flow_rate: f64) -> f64 {
        match self {
            FlowLimit::Floor(min) => flow_rate.max(min),
            FlowLimit::Clamp(min, max) => flow_rate.clamp(min, max),
        }
    }
}

/// Noise magnitudes and clamp ranges for the per-tick update.
///
/// The two calibrated variants differ only in these constants, so both run
/// through the same tick implementation.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationProfile {
    pub flow_jitter_std: f64,
    pub flow_limit: FlowLimit,
    pub substrate_noise_std: f64,
    pub yield_model: YieldModel,
    pub yield_clamp: (f64, f64),
    pub dissolved_oxygen_std: f64,
    pub dissolved_oxygen_clamp: (f64, f64),
}

impl SimulationProfile {
    pub fn reference() -> Self {
        Self {
            flow_jitter_std: 2.0,
            flow_limit: FlowLimit::Floor(0.0),
            substrate_noise_std: 0.1,
            yield_model: YieldModel::SubstrateLimited,
            yield_clamp: (0.0, 100.0),
            dissolved_oxygen_std: 1.0,
            dissolved_oxygen_clamp: (70.0, 100.0),
        }
    }

    pub fn dashboard() -> Self {
        Self {
            flow_jitter_std: 3.0,
            flow_limit: FlowLimit::Clamp(100.0, 200.0),
            substrate_noise_std: 0.2,
            yield_model: YieldModel::ActivityOnly,
            yield_clamp: (60.0, 95.0),
            dissolved_oxygen_std: 2.0,
            dissolved_oxygen_clamp: (75.0, 100.0),
        }
    }

    pub fn for_kind(kind: ProfileKind) -> Self {
        match kind {
            ProfileKind::Reference => Self::reference(),
            ProfileKind::Dashboard => Self::dashboard(),
        }
    }

    pub fn theoretical_yield(&self, enzyme_activity: f64, substrate_concentration: f64) -> f64 {
        match self.yield_model {
            YieldModel::SubstrateLimited => {
                (enzyme_activity / 100.0) * (substrate_concentration / 15.0) * 90.0
            }
            YieldModel::ActivityOnly => (enzyme_activity / 100.0) * 90.0,
        }
    }
}

impl Default for SimulationProfile {
    fn default() -> Self {
        Self::reference()
    }
}
