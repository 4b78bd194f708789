//! Unified error types for Chroma

use thiserror::Error;

/// Unified error type for all Chroma operations
#[derive(Error, Debug)]
pub enum ChromaError {
    // Input errors
    #[error("Invalid outcome value: {0} (expected 0-9)")]
    InvalidOutcomeValue(i64),

    #[error("Non-numeric outcome: {0:?}")]
    NonNumericOutcome(String),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to parse config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ChromaError {
    /// Whether this error comes from a rejected submission rather than a fault
    pub fn is_rejected_input(&self) -> bool {
        matches!(
            self,
            Self::InvalidOutcomeValue(_) | Self::NonNumericOutcome(_)
        )
    }
}

/// Result type alias using ChromaError
pub type Result<T> = std::result::Result<T, ChromaError>;
