//! Error types for the tdee-trend application.

use thiserror::Error;

/// Errors that can occur when loading the weight/calorie log.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("cannot read file: {0}")]
    CannotRead(String),

    #[error("malformed row {row}: expected `date weight calories`, got {value:?}")]
    MalformedRow { row: usize, value: String },

    #[error("invalid date format in row {row}: {value}")]
    InvalidDate { row: usize, value: String },

    #[error("invalid weight value in row {row}: {value}")]
    InvalidWeight { row: usize, value: String },

    #[error("invalid calories value in row {row}: {value}")]
    InvalidCalories { row: usize, value: String },

    #[error("invalid goal weight in row {row}: {value}")]
    InvalidGoalWeight { row: usize, value: String },
}

/// Errors that can occur before an estimator is allowed to run.
#[derive(Debug, Error, PartialEq)]
pub enum EstimateError {
    #[error("insufficient data: need at least {required} days, got {available}")]
    InsufficientData { available: usize, required: usize },

    #[error("observations out of order at index {index}: t={t} follows t={previous}")]
    Unordered { index: usize, t: f64, previous: f64 },

    #[error("non-finite value in observation {index}")]
    NonFinite { index: usize },

    #[error("learning rate must lie strictly between 0 and 1: {0}")]
    InvalidRate(f64),
}
