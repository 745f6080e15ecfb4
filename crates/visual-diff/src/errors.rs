//! Error types for visual comparison

use thiserror::Error;

/// Visual error enumeration
///
/// Dimension mismatch is deliberately absent: incomparable images are a
/// failed comparison result, not an exception.
#[derive(Debug, Error)]
pub enum VisualError {
    /// PNG decode failed
    #[error("Image decode failed: {0}")]
    Decode(String),

    /// PNG encode failed
    #[error("Image encode failed: {0}")]
    Encode(String),

    /// Baseline/artifact storage failed
    #[error("Artifact store error: {0}")]
    Store(#[from] run_store::StoreError),
}

impl From<image::ImageError> for VisualError {
    fn from(err: image::ImageError) -> Self {
        Self::Decode(err.to_string())
    }
}
