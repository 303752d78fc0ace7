use thiserror::Error;

use crate::domain::BillingPeriod;

/// Result alias used across the forecasting engine.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Errors raised by the forecasting engine and its inputs.
///
/// All of them are recoverable by the caller: supply more history, fix the
/// offending record, or correct the configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ForecastError {
    #[error("Insufficient history: need at least {needed} records, got {got}")]
    InsufficientHistory { needed: usize, got: usize },

    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    #[error("Model must be fitted before prediction")]
    ModelNotFitted,

    #[error("Dimension mismatch: x={x}, y={y}")]
    DimensionMismatch { x: usize, y: usize },

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Invalid billing period: {0}")]
    InvalidPeriod(String),

    #[error("A record for {0} already exists")]
    DuplicatePeriod(BillingPeriod),

    #[error("Invalid tariff: {0}")]
    InvalidTariff(String),

    #[error("Import failed: {0}")]
    Import(String),
}

impl From<validator::ValidationErrors> for ForecastError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ForecastError::InvalidRecord(errors.to_string())
    }
}

impl From<csv::Error> for ForecastError {
    fn from(error: csv::Error) -> Self {
        ForecastError::Import(error.to_string())
    }
}
