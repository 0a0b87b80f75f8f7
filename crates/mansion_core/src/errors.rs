//! Error types shared by the estimation pipeline

use thiserror::Error;

/// Errors raised by the feature pipeline, trainer and predictor.
///
/// Resolver misses are not represented here: lookups always fall back to a
/// default value instead of failing.
#[derive(Error, Debug)]
pub enum MansionError {
    /// Unknown model name, missing artifact, invalid settings
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Missing target column, empty or malformed training data
    #[error("data error: {0}")]
    Data(String),

    /// Invalid prediction request
    #[error("input error: {0}")]
    Input(String),

    /// `transform` called on an engineer that was never fitted
    #[error("feature engineer not fitted: call fit_transform first")]
    NotFitted,

    /// Matrix width differs from the fitted layout
    #[error("feature shape mismatch: expected {expected} columns, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, MansionError>;
