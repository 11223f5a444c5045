pub mod alert;
pub mod command;
pub mod dashboard;
pub mod file_formats;
pub mod metrics;
pub mod optimization;
pub mod prediction;
pub mod reactor;
