//! Validated locator cache
//!
//! One cache per resolver instance: entries are never shared across
//! independent resolvers, so parallel workers cannot poison each other.
//! An entry is only trusted after a fresh existence probe; eviction on any
//! failure is immediate.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::strategies::collapse_whitespace;
use crate::types::CandidateSource;

/// Cached winner for one description.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub selector: String,
    pub source: CandidateSource,
}

/// Description → last-successful selector mapping.
#[derive(Default)]
pub struct LocatorCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl LocatorCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache key: whitespace-collapsed, lowercased description. No other
    /// normalization; descriptions are opaque labels.
    pub fn key(description: &str) -> String {
        collapse_whitespace(description).to_lowercase()
    }

    pub fn get(&self, description: &str) -> Option<CacheEntry> {
        self.entries.read().get(&Self::key(description)).cloned()
    }

    pub fn store(&self, description: &str, selector: impl Into<String>, source: CandidateSource) {
        self.entries.write().insert(
            Self::key(description),
            CacheEntry {
                selector: selector.into(),
                source,
            },
        );
    }

    pub fn invalidate(&self, description: &str) {
        self.entries.write().remove(&Self::key(description));
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
