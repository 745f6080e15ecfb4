//! Bundled providers: the disabled variant and a scripted static provider
//!
//! Production deployments implement [`SuggestionProvider`] over their model
//! gateway; the engine only ever sees the trait.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use testkeel_core_types::ExecutionRecord;
use tracing::debug;

use crate::errors::SuggestError;
use crate::{FailureInsight, SuggestionProvider};

/// The "unavailable/disabled" variant. Every call fails with
/// [`SuggestError::Disabled`]; consumers skip it without warning.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledSuggestions;

#[async_trait]
impl SuggestionProvider for DisabledSuggestions {
    async fn suggest_selectors(
        &self,
        _description: &str,
        _dom_snapshot: Option<&str>,
    ) -> Result<Vec<String>, SuggestError> {
        Err(SuggestError::Disabled)
    }

    async fn explain_failures(
        &self,
        _records: &[ExecutionRecord],
    ) -> Result<Vec<FailureInsight>, SuggestError> {
        Err(SuggestError::Disabled)
    }

    fn is_enabled(&self) -> bool {
        false
    }
}

/// Scripted provider answering from preloaded tables. Used in tests and in
/// deployments that curate selector hints by hand.
#[derive(Default)]
pub struct StaticSuggestions {
    selectors: RwLock<HashMap<String, Vec<String>>>,
    insights: RwLock<Vec<FailureInsight>>,
}

impl StaticSuggestions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Preload selector suggestions for a description (matched after
    /// lowercasing and whitespace collapse).
    pub fn add_selectors(&self, description: &str, selectors: Vec<String>) {
        self.selectors
            .write()
            .insert(normalize(description), selectors);
    }

    /// Preload failure insights returned from `explain_failures`.
    pub fn add_insight(&self, insight: FailureInsight) {
        self.insights.write().push(insight);
    }
}

fn normalize(description: &str) -> String {
    description
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[async_trait]
impl SuggestionProvider for StaticSuggestions {
    async fn suggest_selectors(
        &self,
        description: &str,
        _dom_snapshot: Option<&str>,
    ) -> Result<Vec<String>, SuggestError> {
        let key = normalize(description);
        let found = self.selectors.read().get(&key).cloned().unwrap_or_default();
        debug!(
            description = %description,
            count = found.len(),
            "static selector suggestions"
        );
        Ok(found)
    }

    async fn explain_failures(
        &self,
        records: &[ExecutionRecord],
    ) -> Result<Vec<FailureInsight>, SuggestError> {
        let sample_ids: Vec<_> = records.iter().map(|r| &r.test_id).collect();
        Ok(self
            .insights
            .read()
            .iter()
            .filter(|insight| sample_ids.contains(&&insight.test_id))
            .cloned()
            .collect())
    }
}
