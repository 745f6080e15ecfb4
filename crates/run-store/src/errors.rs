//! Error types for the persistence port

use thiserror::Error;

/// Store error enumeration
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying filesystem failure
    #[error("Store IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Record (de)serialization failure
    #[error("Record serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Name cannot be mapped to a storage path
    #[error("Invalid artifact name: {0}")]
    InvalidName(String),
}
