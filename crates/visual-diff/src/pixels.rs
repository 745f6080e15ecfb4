//! Perceptual pixel comparison primitives
//!
//! Color distance is computed in YIQ space on alpha-blended values, with
//! the conventional maximum delta of 35215 scaling the caller's [0,1]
//! sensitivity. A differing pixel is discounted as an anti-aliased edge
//! shift only when its color exists in the other image within one pixel in
//! both directions.

use image::{Rgba, RgbaImage};

use crate::models::Region;

/// Largest possible YIQ delta between two opaque colors.
const MAX_YIQ_DELTA: f64 = 35215.0;

pub(crate) fn max_delta_for(pixel_threshold: f64) -> f64 {
    let t = pixel_threshold.clamp(0.0, 1.0);
    MAX_YIQ_DELTA * t * t
}

fn blend(channel: f64, alpha: f64) -> f64 {
    255.0 + (channel - 255.0) * alpha
}

fn rgb2y(r: f64, g: f64, b: f64) -> f64 {
    r * 0.298_895_31 + g * 0.586_622_47 + b * 0.114_482_23
}

fn rgb2i(r: f64, g: f64, b: f64) -> f64 {
    r * 0.595_977_99 - g * 0.274_176_10 - b * 0.321_801_89
}

fn rgb2q(r: f64, g: f64, b: f64) -> f64 {
    r * 0.211_470_17 - g * 0.522_617_11 + b * 0.311_146_94
}

/// Perceptual distance between two RGBA pixels.
pub(crate) fn color_delta(a: &Rgba<u8>, b: &Rgba<u8>) -> f64 {
    let aa = a[3] as f64 / 255.0;
    let ba = b[3] as f64 / 255.0;
    let (ar, ag, ab) = (
        blend(a[0] as f64, aa),
        blend(a[1] as f64, aa),
        blend(a[2] as f64, aa),
    );
    let (br, bg, bb) = (
        blend(b[0] as f64, ba),
        blend(b[1] as f64, ba),
        blend(b[2] as f64, ba),
    );

    let dy = rgb2y(ar, ag, ab) - rgb2y(br, bg, bb);
    let di = rgb2i(ar, ag, ab) - rgb2i(br, bg, bb);
    let dq = rgb2q(ar, ag, ab) - rgb2q(br, bg, bb);

    0.5053 * dy * dy + 0.299 * di * di + 0.1957 * dq * dq
}

/// Zero out every pixel inside the given regions. Applied to both images
/// before comparison, so masked regions can never contribute to the diff.
pub(crate) fn mask_regions(img: &mut RgbaImage, regions: &[Region]) {
    let (width, height) = img.dimensions();
    for region in regions {
        let x_end = region.x.saturating_add(region.width).min(width);
        let y_end = region.y.saturating_add(region.height).min(height);
        for y in region.y.min(height)..y_end {
            for x in region.x.min(width)..x_end {
                img.put_pixel(x, y, Rgba([0, 0, 0, 0]));
            }
        }
    }
}

/// Pixel-difference tally between two equally-sized images.
pub(crate) struct PixelDiff {
    pub differing: u64,
    pub total: u64,
    pub changed: Vec<(u32, u32)>,
}

impl PixelDiff {
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.differing as f64 / self.total as f64
    }
}

/// Count perceptually differing pixels, tolerating anti-aliased edges.
pub(crate) fn diff_pixels(
    baseline: &RgbaImage,
    current: &RgbaImage,
    pixel_threshold: f64,
) -> PixelDiff {
    let (width, height) = baseline.dimensions();
    let max_delta = max_delta_for(pixel_threshold);

    let mut differing = 0u64;
    let mut changed = Vec::new();
    for y in 0..height {
        for x in 0..width {
            let base = baseline.get_pixel(x, y);
            let cur = current.get_pixel(x, y);
            if color_delta(base, cur) <= max_delta {
                continue;
            }
            if is_antialiased_shift(baseline, current, x, y, max_delta) {
                continue;
            }
            differing += 1;
            changed.push((x, y));
        }
    }

    PixelDiff {
        differing,
        total: width as u64 * height as u64,
        changed,
    }
}

/// A differing pixel is an anti-aliased edge shift when the current color
/// appears among the baseline's neighbors AND the baseline color appears
/// among the current's neighbors. Real content changes fail at least one
/// direction.
fn is_antialiased_shift(
    baseline: &RgbaImage,
    current: &RgbaImage,
    x: u32,
    y: u32,
    max_delta: f64,
) -> bool {
    let base = baseline.get_pixel(x, y);
    let cur = current.get_pixel(x, y);
    neighbor_matches(baseline, x, y, cur, max_delta)
        && neighbor_matches(current, x, y, base, max_delta)
}

fn neighbor_matches(
    img: &RgbaImage,
    x: u32,
    y: u32,
    target: &Rgba<u8>,
    max_delta: f64,
) -> bool {
    let (width, height) = img.dimensions();
    for dy in -1i64..=1 {
        for dx in -1i64..=1 {
            if dx == 0 && dy == 0 {
                continue;
            }
            let nx = x as i64 + dx;
            let ny = y as i64 + dy;
            if nx < 0 || ny < 0 || nx >= width as i64 || ny >= height as i64 {
                continue;
            }
            if color_delta(img.get_pixel(nx as u32, ny as u32), target) <= max_delta {
                return true;
            }
        }
    }
    false
}

/// Render the diff visualization: the current capture with differing
/// pixels highlighted in red.
pub(crate) fn render_diff(current: &RgbaImage, changed: &[(u32, u32)]) -> RgbaImage {
    let mut output = current.clone();
    for &(x, y) in changed {
        output.put_pixel(x, y, Rgba([255, 0, 0, 255]));
    }
    output
}
