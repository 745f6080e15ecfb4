//! Core types for the locator system

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Where a candidate selector came from. Order encodes trust: structural
/// templates are deterministic, suggestions are not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    /// Derived from role/attribute templates keyed to the description
    Structural,

    /// Supplied explicitly by the caller
    CallerFallback,

    /// Produced by the generative-suggestion capability
    Suggested,
}

impl CandidateSource {
    pub fn name(&self) -> &'static str {
        match self {
            CandidateSource::Structural => "structural",
            CandidateSource::CallerFallback => "caller-fallback",
            CandidateSource::Suggested => "suggested",
        }
    }
}

/// One concrete selector expression considered during resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorCandidate {
    pub selector: String,
    pub source: CandidateSource,
}

impl SelectorCandidate {
    pub fn new(selector: impl Into<String>, source: CandidateSource) -> Self {
        Self {
            selector: selector.into(),
            source,
        }
    }
}

/// Options controlling one resolution.
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Timeout per candidate probe during full resolution.
    pub probe_timeout: Duration,

    /// Timeout for re-validating a cached selector. Shorter than
    /// `probe_timeout`: the validation is a quick existence check, not a
    /// full resolution.
    pub cache_probe_timeout: Duration,

    /// Whether to consult the suggestion capability after deterministic
    /// candidates are exhausted.
    pub use_suggestions: bool,

    /// Extra selector strings probed after structural templates.
    pub extra_fallbacks: Vec<String>,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            probe_timeout: Duration::from_secs(5),
            cache_probe_timeout: Duration::from_secs(1),
            use_suggestions: true,
            extra_fallbacks: Vec::new(),
        }
    }
}

impl ResolveOptions {
    pub fn with_fallbacks(mut self, fallbacks: Vec<String>) -> Self {
        self.extra_fallbacks = fallbacks;
        self
    }

    pub fn without_suggestions(mut self) -> Self {
        self.use_suggestions = false;
        self
    }
}

/// Successful resolution of a description to a working selector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resolution {
    /// The selector that probed successfully.
    pub selector: String,

    /// Source of the winning candidate.
    pub source: CandidateSource,

    /// Whether this came from the validated cache (no strategies were
    /// regenerated).
    pub from_cache: bool,

    /// Number of candidates probed, the cache probe included.
    pub attempts: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_names() {
        assert_eq!(CandidateSource::Structural.name(), "structural");
        assert_eq!(CandidateSource::CallerFallback.name(), "caller-fallback");
        assert_eq!(CandidateSource::Suggested.name(), "suggested");
    }

    #[test]
    fn test_default_options_asymmetric_timeouts() {
        let opts = ResolveOptions::default();
        assert!(opts.cache_probe_timeout < opts.probe_timeout);
        assert!(opts.use_suggestions);
    }
}
