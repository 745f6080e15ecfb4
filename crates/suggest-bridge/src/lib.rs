//! Generative-suggestion port for the TestKeel engine.
//!
//! A [`SuggestionProvider`] is an untrusted, best-effort oracle: it can
//! propose candidate selectors for a natural-language element description
//! and offer qualitative explanations for a sample of execution history.
//! The engine must keep working (with reduced detection power) when the
//! provider is disabled, unavailable, or wrong; its output is one more
//! candidate source, never a requirement.

pub mod errors;
pub mod providers;

pub use errors::SuggestError;
pub use providers::{DisabledSuggestions, StaticSuggestions};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use testkeel_core_types::{ExecutionRecord, TestId};

/// Qualitative insight for one test's failure history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureInsight {
    pub test_id: TestId,

    /// Free-form reasons, merged (deduplicated) into statistical reasons.
    pub reasons: Vec<String>,

    /// Flakiness estimate in [0,1]; max-merged with the statistical score,
    /// so it can raise but never lower a computed risk.
    pub score: f64,
}

/// Suggestion capability consumed by the resolver and the analyzer.
#[async_trait]
pub trait SuggestionProvider: Send + Sync {
    /// Candidate selector strings for a semantic element description.
    async fn suggest_selectors(
        &self,
        description: &str,
        dom_snapshot: Option<&str>,
    ) -> Result<Vec<String>, SuggestError>;

    /// Qualitative failure explanations for a history sample.
    async fn explain_failures(
        &self,
        records: &[ExecutionRecord],
    ) -> Result<Vec<FailureInsight>, SuggestError>;

    /// Whether the provider is expected to answer at all. Disabled
    /// providers are skipped without logging a warning.
    fn is_enabled(&self) -> bool {
        true
    }
}
