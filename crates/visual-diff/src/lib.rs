//! Pixel-level visual regression comparison.
//!
//! A captured screenshot is compared against a named baseline with a
//! perceptual color-distance threshold, anti-aliasing tolerance, and
//! masked ignore regions. Missing baselines are created on first
//! comparison (first-run policy, not a failure); baselines change only
//! through an explicit update. Diff visualizations are persisted only for
//! failed comparisons.

pub mod engine;
pub mod errors;
pub mod models;
pub mod pixels;

pub use engine::VisualDiffEngine;
pub use errors::VisualError;
pub use models::{CompareOptions, ComparisonResult, Region};
