//! Binary morphology with rectangular structuring elements.
//!
//! The refiner bridges gaps between touching object edges with an iterated
//! closing (dilate×n then erode×n), then removes isolated speckles with an
//! iterated opening (erode×n then dilate×n).
//!
//! Border convention: dilation treats out-of-frame pixels as background,
//! erosion treats them as foreground. Blobs touching the frame keep their
//! extent, and the computed opening remains an exact fixed point under
//! repetition (the composed operator is a structural opening, hence
//! idempotent), which the tests rely on.
//!
//! Erosion and dilation decompose into a horizontal and a vertical 1-D
//! min/max pass since the structuring element is rectangular.

use crate::image::ImageU8;
use serde::Deserialize;

/// Kernel sizes and iteration counts of the refinement stage.
///
/// `close_kernel` bridges gaps between fragments of one object;
/// `open_kernel` is smaller and only has to cover speckle noise. Iteration
/// counts of 2–3 merge fragmented foreground without welding neighboring
/// objects together.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct MorphOptions {
    /// Closing structuring element side (odd), default 7.
    pub close_kernel: usize,
    /// Closing iterations, default 2.
    pub close_iterations: usize,
    /// Opening structuring element side (odd), default 3.
    pub open_kernel: usize,
    /// Opening iterations, default 2.
    pub open_iterations: usize,
}

impl Default for MorphOptions {
    fn default() -> Self {
        Self {
            close_kernel: 7,
            close_iterations: 2,
            open_kernel: 3,
            open_iterations: 2,
        }
    }
}

fn pass_1d(mask: &ImageU8, half: usize, horizontal: bool, take_max: bool) -> ImageU8 {
    let (w, h) = (mask.w, mask.h);
    let mut out = ImageU8::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let (range_max, center) = if horizontal { (w, x) } else { (h, y) };
            let lo = center.saturating_sub(half);
            let hi = (center + half).min(range_max.saturating_sub(1));
            // Out-of-frame samples: background for max, foreground for min.
            let mut acc = if take_max { 0u8 } else { 255u8 };
            for i in lo..=hi {
                let v = if horizontal {
                    mask.get(i, y)
                } else {
                    mask.get(x, i)
                };
                acc = if take_max { acc.max(v) } else { acc.min(v) };
            }
            out.set(x, y, acc);
        }
    }
    out
}

/// Dilate with a `ksize × ksize` rectangular element.
pub fn dilate(mask: &ImageU8, ksize: usize) -> ImageU8 {
    let half = ksize / 2;
    let tmp = pass_1d(mask, half, true, true);
    pass_1d(&tmp, half, false, true)
}

/// Erode with a `ksize × ksize` rectangular element.
pub fn erode(mask: &ImageU8, ksize: usize) -> ImageU8 {
    let half = ksize / 2;
    let tmp = pass_1d(mask, half, true, false);
    pass_1d(&tmp, half, false, false)
}

/// Repeated dilation.
pub fn dilate_n(mask: &ImageU8, ksize: usize, iterations: usize) -> ImageU8 {
    let mut out = mask.clone();
    for _ in 0..iterations {
        out = dilate(&out, ksize);
    }
    out
}

/// Repeated erosion.
pub fn erode_n(mask: &ImageU8, ksize: usize, iterations: usize) -> ImageU8 {
    let mut out = mask.clone();
    for _ in 0..iterations {
        out = erode(&out, ksize);
    }
    out
}

/// Iterated closing: dilate×n then erode×n (fills gaps up to the effective
/// element size).
pub fn close(mask: &ImageU8, ksize: usize, iterations: usize) -> ImageU8 {
    erode_n(&dilate_n(mask, ksize, iterations), ksize, iterations)
}

/// Iterated opening: erode×n then dilate×n (removes blobs smaller than the
/// effective element size).
pub fn open(mask: &ImageU8, ksize: usize, iterations: usize) -> ImageU8 {
    dilate_n(&erode_n(mask, ksize, iterations), ksize, iterations)
}

/// The full refinement stage: closing then opening. The result is also the
/// "processed mask" handed back to the caller.
pub fn refine_mask(mask: &ImageU8, opts: &MorphOptions) -> ImageU8 {
    let closed = close(mask, opts.close_kernel, opts.close_iterations);
    open(&closed, opts.open_kernel, opts.open_iterations)
}
