//! Error types for Sleep Calc

use thiserror::Error;

/// Errors that can occur during calculation
#[derive(Debug, Error)]
pub enum CalcError {
    #[error("Invalid time format: {0}")]
    InvalidFormat(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid UTC offset: {0}")]
    InvalidOffset(String),

    #[error("Invalid caffeine amount: {0}")]
    InvalidAmount(String),

    #[error("Unknown caffeine source: {0}")]
    InvalidSource(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, CalcError>;
