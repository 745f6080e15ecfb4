//! Error types for flakiness analysis

use thiserror::Error;

/// Analyzer error enumeration
///
/// Only `record_outcome` can fail: analysis itself never raises and
/// degrades to zero-confidence reports on malformed or missing history.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// History append failed
    #[error("History append failed: {0}")]
    Append(#[from] run_store::StoreError),
}
