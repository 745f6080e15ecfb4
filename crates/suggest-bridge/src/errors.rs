//! Error types for the suggestion port

use thiserror::Error;

/// Suggestion error enumeration
///
/// Always non-fatal to the caller: every consumer downgrades these to a
/// logged warning and continues with deterministic behavior only.
#[derive(Debug, Error, Clone)]
pub enum SuggestError {
    /// Provider is switched off by configuration
    #[error("Suggestions disabled")]
    Disabled,

    /// Provider errored or could not be reached
    #[error("Suggestion capability unavailable: {0}")]
    Unavailable(String),

    /// Provider answered with output that could not be parsed
    #[error("Unusable suggestion output: {0}")]
    Malformed(String),
}

impl SuggestError {
    /// Disabled providers are skipped silently; the rest warrant a warning.
    pub fn is_disabled(&self) -> bool {
        matches!(self, SuggestError::Disabled)
    }
}
