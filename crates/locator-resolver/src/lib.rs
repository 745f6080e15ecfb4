//! Self-healing element resolution with ordered fallback strategies.
//!
//! A semantic description ("login button") is resolved to a concrete,
//! working selector by probing candidates strictly in priority order:
//! - structural templates (cheap, deterministic) first,
//! - caller-supplied fallbacks second,
//! - generative suggestions (non-deterministic, lowest trust) last.
//!
//! The winning selector is cached per resolver instance and re-validated
//! with a short probe before every reuse; any failure evicts the entry
//! immediately.

pub mod cache;
pub mod errors;
pub mod resolver;
pub mod strategies;
pub mod types;

pub use cache::LocatorCache;
pub use errors::LocatorError;
pub use resolver::LocatorResolver;
pub use strategies::structural_candidates;
pub use types::{CandidateSource, Resolution, ResolveOptions, SelectorCandidate};
