//! Data-driven global thresholding (Otsu's method).
//!
//! The threshold maximizes between-class variance over the 256-bin intensity
//! histogram, so it adapts to exposure without a fixed constant. Output
//! polarity is inverted by default: pixels at or below the threshold become
//! foreground (255), on the assumption that objects are darker than the
//! background. The assumption is a documented scene limitation — it is
//! configurable, not auto-detected.

use crate::image::ImageU8;
use serde::Deserialize;

/// Knobs for the thresholding stage.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct BinarizeOptions {
    /// When true (default), foreground = pixels at or below the Otsu level.
    /// Set false for bright objects on a dark background.
    pub invert: bool,
}

impl Default for BinarizeOptions {
    fn default() -> Self {
        Self { invert: true }
    }
}

/// 256-bin intensity histogram.
pub fn histogram(gray: &ImageU8) -> [u32; 256] {
    let mut hist = [0u32; 256];
    for &v in &gray.data {
        hist[v as usize] += 1;
    }
    hist
}

/// Otsu's threshold: the level maximizing between-class variance.
///
/// For a degenerate histogram (single occupied bin) the scan never improves
/// on zero variance and the first level is returned; thresholding then
/// yields an empty or full mask which downstream treats as no foreground.
pub fn otsu_level(hist: &[u32; 256]) -> u8 {
    let total: u64 = hist.iter().map(|&c| c as u64).sum();
    if total == 0 {
        return 0;
    }

    let weighted_sum: u64 = hist
        .iter()
        .enumerate()
        .map(|(v, &c)| v as u64 * c as u64)
        .sum();

    let mut sum_b = 0u64;
    let mut weight_b = 0u64;
    let mut best_level = 0u8;
    let mut best_variance = 0.0f64;

    for (level, &count) in hist.iter().enumerate() {
        weight_b += count as u64;
        if weight_b == 0 {
            continue;
        }
        let weight_f = total - weight_b;
        if weight_f == 0 {
            break;
        }
        sum_b += level as u64 * count as u64;

        let mean_b = sum_b as f64 / weight_b as f64;
        let mean_f = (weighted_sum - sum_b) as f64 / weight_f as f64;
        let diff = mean_b - mean_f;
        let variance = weight_b as f64 * weight_f as f64 * diff * diff;
        if variance > best_variance {
            best_variance = variance;
            best_level = level as u8;
        }
    }
    best_level
}

/// Threshold `gray` at the Otsu level. Returns the binary mask and the
/// chosen level.
///
/// A histogram with a single occupied level has no separable classes
/// (uniform image); the mask comes back empty regardless of polarity so the
/// pipeline lands on the zero-count path.
pub fn binarize(gray: &ImageU8, opts: BinarizeOptions) -> (ImageU8, u8) {
    let hist = histogram(gray);
    let level = otsu_level(&hist);
    let mut mask = ImageU8::new(gray.w, gray.h);
    if hist.iter().filter(|&&c| c > 0).count() <= 1 {
        return (mask, level);
    }
    for (dst, &src) in mask.data.iter_mut().zip(gray.data.iter()) {
        let above = src > level;
        *dst = if above != opts.invert { 255 } else { 0 };
    }
    (mask, level)
}
