pub mod alerts;
pub mod clock;
pub mod error;
pub mod fleet;
pub mod history;
pub mod kinetics;
pub mod logger;
pub mod optimization;
pub mod prediction;
pub mod random;
pub mod reactor;
pub mod simulation;
