use thiserror::Error;

#[derive(Error, Debug)]
pub enum EvotradeError {
    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    #[error("Insufficient history: {got} bars, minimum {required}")]
    InsufficientHistory { got: usize, required: usize },

    #[error("Simulation error: {0}")]
    Simulation(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EvotradeError>;
