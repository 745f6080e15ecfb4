//! Comparison engine and baseline lifecycle

use std::io::Cursor;
use std::sync::Arc;

use image::RgbaImage;
use run_store::ImageStore;
use tracing::{debug, info, warn};

use crate::errors::VisualError;
use crate::models::{CompareOptions, ComparisonResult, Region};
use crate::pixels::{diff_pixels, mask_regions, render_diff};

const BASELINE_PREFIX: &str = "baselines";
const CURRENT_PREFIX: &str = "current";
const DIFF_PREFIX: &str = "diffs";

/// Compares captures against named baselines.
///
/// The baseline store is shared across workers; concurrent first-run
/// creation of the same name is last-writer-wins (documented limitation,
/// acceptable because both writers captured the same page).
pub struct VisualDiffEngine {
    store: Arc<dyn ImageStore>,
    defaults: CompareOptions,
}

impl VisualDiffEngine {
    pub fn new(store: Arc<dyn ImageStore>) -> Self {
        Self {
            store,
            defaults: CompareOptions::default(),
        }
    }

    /// Replace the default compare options.
    pub fn with_defaults(mut self, defaults: CompareOptions) -> Self {
        self.defaults = defaults;
        self
    }

    /// Compare with the engine's default options.
    pub async fn compare(
        &self,
        current_png: &[u8],
        baseline_name: &str,
    ) -> Result<ComparisonResult, VisualError> {
        let defaults = self.defaults.clone();
        self.compare_with(current_png, baseline_name, &defaults).await
    }

    /// Explicitly overwrite the stored baseline.
    pub async fn update_baseline(
        &self,
        baseline_name: &str,
        png: &[u8],
    ) -> Result<(), VisualError> {
        let baseline_ref = artifact_name(BASELINE_PREFIX, baseline_name);
        self.store.put(&baseline_ref, png).await?;
        info!(baseline = %baseline_ref, "baseline updated");
        Ok(())
    }

    /// Compare a PNG capture against the named baseline.
    pub async fn compare_with(
        &self,
        current_png: &[u8],
        baseline_name: &str,
        options: &CompareOptions,
    ) -> Result<ComparisonResult, VisualError> {
        let baseline_ref = artifact_name(BASELINE_PREFIX, baseline_name);

        if options.update_baseline {
            self.update_baseline(baseline_name, current_png).await?;
            return Ok(trivial_pass(baseline_ref, options.threshold));
        }

        let Some(baseline_bytes) = self.store.get(&baseline_ref).await? else {
            // First-run policy: absence of a baseline is baseline creation
            self.store.put(&baseline_ref, current_png).await?;
            info!(baseline = %baseline_ref, "no baseline found; created from current capture");
            return Ok(trivial_pass(baseline_ref, options.threshold));
        };

        let baseline = decode(&baseline_bytes)?;
        let current = decode(current_png)?;

        if baseline.dimensions() != current.dimensions() {
            warn!(
                baseline = %baseline_ref,
                baseline_dims = ?baseline.dimensions(),
                current_dims = ?current.dimensions(),
                "dimension mismatch; comparison fails at maximum diff"
            );
            let current_ref = artifact_name(CURRENT_PREFIX, baseline_name);
            self.store.put(&current_ref, current_png).await?;
            return Ok(ComparisonResult {
                passed: false,
                diff_ratio: 1.0,
                threshold: options.threshold,
                baseline_created: false,
                baseline: baseline_ref,
                current: Some(current_ref),
                diff: None,
            });
        }

        let mut masked_baseline = baseline;
        let mut masked_current = current.clone();
        apply_masks(&mut masked_baseline, &mut masked_current, &options.ignore_regions);

        let diff = diff_pixels(&masked_baseline, &masked_current, options.pixel_threshold);
        let diff_ratio = diff.ratio();
        let passed = diff_ratio <= options.threshold;
        debug!(
            baseline = %baseline_ref,
            diff_ratio,
            threshold = options.threshold,
            passed,
            "comparison complete"
        );

        if passed {
            return Ok(ComparisonResult {
                passed: true,
                diff_ratio,
                threshold: options.threshold,
                baseline_created: false,
                baseline: baseline_ref,
                current: None,
                diff: None,
            });
        }

        // Failure artifacts: the raw capture and the highlighted diff
        let current_ref = artifact_name(CURRENT_PREFIX, baseline_name);
        let diff_ref = artifact_name(DIFF_PREFIX, baseline_name);
        self.store.put(&current_ref, current_png).await?;
        let rendered = render_diff(&current, &diff.changed);
        self.store.put(&diff_ref, &encode(&rendered)?).await?;
        warn!(
            baseline = %baseline_ref,
            diff = %diff_ref,
            diff_ratio,
            "visual comparison failed"
        );

        Ok(ComparisonResult {
            passed: false,
            diff_ratio,
            threshold: options.threshold,
            baseline_created: false,
            baseline: baseline_ref,
            current: Some(current_ref),
            diff: Some(diff_ref),
        })
    }
}

fn artifact_name(prefix: &str, name: &str) -> String {
    format!("{}/{}", prefix, name)
}

fn trivial_pass(baseline_ref: String, threshold: f64) -> ComparisonResult {
    ComparisonResult {
        passed: true,
        diff_ratio: 0.0,
        threshold,
        baseline_created: true,
        baseline: baseline_ref,
        current: None,
        diff: None,
    }
}

fn apply_masks(baseline: &mut RgbaImage, current: &mut RgbaImage, regions: &[Region]) {
    if regions.is_empty() {
        return;
    }
    mask_regions(baseline, regions);
    mask_regions(current, regions);
}

fn decode(bytes: &[u8]) -> Result<RgbaImage, VisualError> {
    Ok(image::load_from_memory(bytes)?.to_rgba8())
}

fn encode(img: &RgbaImage) -> Result<Vec<u8>, VisualError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|err| VisualError::Encode(err.to_string()))?;
    Ok(buf)
}
