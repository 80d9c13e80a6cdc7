//! Saturation-based region-of-interest selection.
//!
//! Isolates the main subject before segmentation: the saturation channel of
//! an HSV view separates a colorful subject from a neutral background, a
//! large closing fuses the thresholded mask into solid blobs, and the
//! largest connected blob wins. Downstream stages then run on the cropped
//! sub-image and translate their boxes back by the ROI origin.
//!
//! The "subject is more saturated than its background" assumption is a
//! stated scene limitation, configurable but not auto-detected.

use crate::image::{ImageRgb8, ImageU8};
use crate::labels::{component_stats, connected_components};
use crate::morphology;
use crate::types::RectPx;
use serde::Deserialize;

/// Knobs for ROI selection.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct RoiOptions {
    /// Minimum saturation (0–255) for a pixel to count as subject.
    pub saturation_thresh: u8,
    /// Structuring element side of the blob-fusing closing (odd).
    pub close_kernel: usize,
    /// Closing iterations.
    pub close_iterations: usize,
}

impl Default for RoiOptions {
    fn default() -> Self {
        Self {
            saturation_thresh: 50,
            close_kernel: 25,
            close_iterations: 2,
        }
    }
}

/// Selected working area: bounding box of the dominant saturated blob plus
/// the saturation mask it was derived from.
#[derive(Clone, Debug)]
pub struct RoiSelection {
    pub rect: RectPx,
    pub saturation_mask: ImageU8,
}

/// HSV saturation channel of an RGB image, scaled to 0–255.
pub fn saturation_channel(color: &ImageRgb8) -> ImageU8 {
    let mut sat = ImageU8::new(color.w, color.h);
    for y in 0..color.h {
        for x in 0..color.w {
            let [r, g, b] = color.get(x, y);
            let max = r.max(g).max(b) as u32;
            let min = r.min(g).min(b) as u32;
            let s = if max == 0 { 0 } else { (max - min) * 255 / max };
            sat.set(x, y, s as u8);
        }
    }
    sat
}

/// Pick the largest high-saturation blob as the working area.
///
/// Returns `None` when no pixel clears the saturation threshold — the
/// pipeline must then short-circuit with a zero count instead of cropping
/// undefined bounds.
pub fn select_roi(color: &ImageRgb8, opts: &RoiOptions) -> Option<RoiSelection> {
    let sat = saturation_channel(color);
    let mut mask = ImageU8::new(sat.w, sat.h);
    for (dst, &s) in mask.data.iter_mut().zip(sat.data.iter()) {
        *dst = if s > opts.saturation_thresh { 255 } else { 0 };
    }

    let fused = morphology::close(&mask, opts.close_kernel, opts.close_iterations);
    let (labels, count) = connected_components(&fused);
    if count == 0 {
        return None;
    }

    let stats = component_stats(&labels, count);
    let main = stats.iter().max_by_key(|s| (s.area, std::cmp::Reverse(s.label)))?;
    log::debug!(
        "roi: {} blob(s), main area={} rect={:?}",
        count,
        main.area,
        main.bbox
    );

    Some(RoiSelection {
        rect: main.bbox,
        saturation_mask: fused,
    })
}
