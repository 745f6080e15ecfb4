//! Error types for wait coordination

use thiserror::Error;

/// Wait error enumeration
#[derive(Debug, Error, Clone)]
pub enum WaitError {
    /// The primary condition never held
    #[error("Wait timed out after {elapsed_ms}ms: {condition}")]
    Timeout { condition: String, elapsed_ms: u64 },

    /// The driver failed in a way polling cannot recover from
    #[error("Driver failure during wait: {0}")]
    Driver(String),
}

impl WaitError {
    pub fn timeout(condition: impl Into<String>, elapsed: std::time::Duration) -> Self {
        Self::Timeout {
            condition: condition.into(),
            elapsed_ms: elapsed.as_millis() as u64,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, WaitError::Timeout { .. })
    }
}
