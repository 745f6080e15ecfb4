//! Error types for locator resolution

use thiserror::Error;

/// Locator error enumeration
#[derive(Debug, Error, Clone)]
pub enum LocatorError {
    /// No candidate strategy succeeded. Carries the attempt count rather
    /// than every selector string to keep the message diagnosable but
    /// concise.
    #[error("No element found for '{description}' after trying {attempted} strategies")]
    NotFound {
        description: String,
        attempted: usize,
    },

    /// Description is unusable (empty after trimming)
    #[error("Invalid element description: {0}")]
    InvalidDescription(String),
}
