//! Element resolver with ordered fallback probing

use std::sync::Arc;
use std::time::Duration;

use driver_adapter::{BrowserDriver, ElementState};
use suggest_bridge::SuggestionProvider;
use tracing::{debug, info, warn};

use crate::cache::LocatorCache;
use crate::errors::LocatorError;
use crate::strategies::{collapse_whitespace, dedup_candidates, structural_candidates};
use crate::types::{CandidateSource, Resolution, ResolveOptions, SelectorCandidate};

/// Resolves semantic element descriptions to working selectors.
///
/// Owns its cache: independent resolver instances never share entries, so
/// parallel workers with diverging page state cannot poison each other.
pub struct LocatorResolver {
    driver: Arc<dyn BrowserDriver>,
    suggestions: Arc<dyn SuggestionProvider>,
    cache: LocatorCache,
    defaults: ResolveOptions,
}

impl LocatorResolver {
    pub fn new(driver: Arc<dyn BrowserDriver>, suggestions: Arc<dyn SuggestionProvider>) -> Self {
        Self {
            driver,
            suggestions,
            cache: LocatorCache::new(),
            defaults: ResolveOptions::default(),
        }
    }

    /// Replace the default resolve options.
    pub fn with_defaults(mut self, defaults: ResolveOptions) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn cache(&self) -> &LocatorCache {
        &self.cache
    }

    /// Evict the cached selector for one description.
    pub fn invalidate(&self, description: &str) {
        self.cache.invalidate(description);
    }

    /// Evict every cached selector.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Resolve with the resolver's default options.
    pub async fn resolve(&self, description: &str) -> Result<Resolution, LocatorError> {
        let defaults = self.defaults.clone();
        self.resolve_with(description, &defaults).await
    }

    /// Resolve a description to a concrete selector.
    pub async fn resolve_with(
        &self,
        description: &str,
        options: &ResolveOptions,
    ) -> Result<Resolution, LocatorError> {
        let text = collapse_whitespace(description);
        if text.is_empty() {
            return Err(LocatorError::InvalidDescription(
                "empty description".to_string(),
            ));
        }

        let mut attempts = 0;

        // Validated cache entries short-circuit strategy generation
        if let Some(entry) = self.cache.get(&text) {
            attempts += 1;
            if self.probe(&entry.selector, options.cache_probe_timeout).await {
                debug!(description = %text, selector = %entry.selector, "locator cache hit");
                return Ok(Resolution {
                    selector: entry.selector,
                    source: entry.source,
                    from_cache: true,
                    attempts,
                });
            }
            // No partial trust: one failed probe evicts the entry
            self.cache.invalidate(&text);
            debug!(description = %text, selector = %entry.selector, "stale cache entry evicted");
        }

        let candidates = self.build_candidates(&text, options).await;
        for candidate in &candidates {
            attempts += 1;
            debug!(
                selector = %candidate.selector,
                source = candidate.source.name(),
                "probing candidate"
            );
            if self.probe(&candidate.selector, options.probe_timeout).await {
                info!(
                    description = %text,
                    selector = %candidate.selector,
                    source = candidate.source.name(),
                    attempts,
                    "element resolved"
                );
                self.cache
                    .store(&text, candidate.selector.as_str(), candidate.source);
                return Ok(Resolution {
                    selector: candidate.selector.clone(),
                    source: candidate.source,
                    from_cache: false,
                    attempts,
                });
            }
        }

        warn!(description = %text, attempted = attempts, "all locator strategies exhausted");
        Err(LocatorError::NotFound {
            description: text,
            attempted: attempts,
        })
    }

    /// Build the ordered, deduplicated candidate list: structural templates,
    /// then caller fallbacks, then suggestions.
    async fn build_candidates(
        &self,
        description: &str,
        options: &ResolveOptions,
    ) -> Vec<SelectorCandidate> {
        let mut candidates: Vec<SelectorCandidate> = structural_candidates(description)
            .into_iter()
            .map(|s| SelectorCandidate::new(s, CandidateSource::Structural))
            .collect();

        candidates.extend(
            options
                .extra_fallbacks
                .iter()
                .map(|s| SelectorCandidate::new(s.clone(), CandidateSource::CallerFallback)),
        );

        if options.use_suggestions && self.suggestions.is_enabled() {
            match self.suggestions.suggest_selectors(description, None).await {
                Ok(suggested) => {
                    candidates.extend(
                        suggested
                            .into_iter()
                            .filter(|s| !s.trim().is_empty())
                            .map(|s| SelectorCandidate::new(s, CandidateSource::Suggested)),
                    );
                }
                Err(err) if err.is_disabled() => {
                    debug!("suggestion capability disabled");
                }
                Err(err) => {
                    warn!(%err, "suggestion capability failed; continuing without it");
                }
            }
        }

        dedup_candidates(candidates)
    }

    /// Probe one selector: locate and require visibility within `timeout`.
    async fn probe(&self, selector: &str, timeout: Duration) -> bool {
        let handle = match self.driver.locate(selector).await {
            Ok(handle) => handle,
            Err(err) => {
                debug!(selector, %err, "locate failed");
                return false;
            }
        };
        match handle.wait_for(ElementState::Visible, timeout).await {
            Ok(()) => true,
            Err(err) => {
                debug!(selector, %err, "candidate probe failed");
                false
            }
        }
    }
}
