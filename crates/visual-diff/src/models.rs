//! Data models for visual comparison

use serde::{Deserialize, Serialize};

/// Axis-aligned pixel rectangle excluded from comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Options for one comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareOptions {
    /// Fraction of differing pixels tolerated before the comparison fails.
    pub threshold: f64,

    /// Per-pixel perceptual sensitivity in [0,1]; distinct from the outer
    /// pass/fail `threshold`.
    pub pixel_threshold: f64,

    /// Rectangles zeroed in both images before comparison; they can never
    /// contribute to the diff.
    pub ignore_regions: Vec<Region>,

    /// Overwrite the stored baseline with the current capture and pass.
    pub update_baseline: bool,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            threshold: 0.2,
            pixel_threshold: 0.1,
            ignore_regions: Vec::new(),
            update_baseline: false,
        }
    }
}

impl CompareOptions {
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_ignore_regions(mut self, regions: Vec<Region>) -> Self {
        self.ignore_regions = regions;
        self
    }

    pub fn updating_baseline(mut self) -> Self {
        self.update_baseline = true;
        self
    }
}

/// Outcome of one comparison. A value object: only the image artifacts it
/// names are persisted, never the result itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub passed: bool,

    /// Differing pixels over total pixels, in [0,1].
    pub diff_ratio: f64,

    /// Threshold the pass/fail verdict used.
    pub threshold: f64,

    /// Whether this comparison created the baseline (first run or
    /// explicit update).
    pub baseline_created: bool,

    /// Store name of the baseline image.
    pub baseline: String,

    /// Store name of the current capture, persisted on failure only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<String>,

    /// Store name of the diff visualization, persisted on failure only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<String>,
}
