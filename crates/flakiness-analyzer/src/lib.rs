//! Statistical flakiness detection over execution history.
//!
//! Outcomes are appended to a shared, append-only record log; reports are
//! recomputed on demand from the full history and never persisted as the
//! source of truth. Scoring combines pass rate, duration variance, error
//! signature clustering, retry patterns, and environment-segmented pass
//! rates. An optional generative insight is max-merged in: it can raise a
//! computed risk, never lower it.

pub mod analyzer;
pub mod errors;
pub mod signature;
pub mod types;

pub use analyzer::FlakinessAnalyzer;
pub use errors::AnalyzerError;
pub use signature::normalize_signature;
pub use types::{AnalyzerConfig, FlakinessReport};
