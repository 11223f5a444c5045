use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReactorError {
    #[error("Reactor '{0}' not found")]
    ReactorNotFound(String),

    #[error("Reactor '{0}' is defined more than once")]
    DuplicateReactor(String),

    #[error("Unknown control parameter '{0}'")]
    UnknownParameter(String),

    #[error("Value {value} is not valid for parameter '{parameter}'")]
    InvalidValue { parameter: String, value: f64 },

    #[error("Alert {alert_id} not found on reactor '{reactor_id}'")]
    AlertNotFound { reactor_id: String, alert_id: u64 },

    #[error("An optimization is already running for reactor '{0}'")]
    OptimizationInProgress(String),

    #[error("No optimization result is available for reactor '{0}'")]
    NoOptimizationResult(String),

    #[error("Simulation produced a non-finite value for '{field}'")]
    NonFiniteMetric { field: &'static str },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error for file '{0}': {1}")]
    FileIO(String, #[source] std::io::Error),

    #[error("Failed to write CSV file '{0}': {1}")]
    CsvError(String, #[source] csv::Error),

    #[error("Failed to serialize JSON: {0}")]
    JsonParsing(#[from] serde_json::Error),
}
