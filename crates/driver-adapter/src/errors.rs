//! Error types for the browser-control port

use thiserror::Error;

/// Driver error enumeration
#[derive(Debug, Error, Clone)]
pub enum DriverError {
    /// A wait did not complete before its timeout
    #[error("Timed out after {elapsed_ms}ms waiting for {what}")]
    Timeout { what: String, elapsed_ms: u64 },

    /// Transport/protocol failure talking to the browser
    #[error("Driver protocol error: {0}")]
    Protocol(String),

    /// Script evaluation failed in the page
    #[error("Evaluation failed: {0}")]
    Evaluation(String),

    /// Selector could not be parsed by the backend
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),
}

impl DriverError {
    pub fn timeout(what: impl Into<String>, elapsed: std::time::Duration) -> Self {
        Self::Timeout {
            what: what.into(),
            elapsed_ms: elapsed.as_millis() as u64,
        }
    }

    /// Timeouts are expected under polling; protocol failures are not.
    pub fn is_timeout(&self) -> bool {
        matches!(self, DriverError::Timeout { .. })
    }
}
