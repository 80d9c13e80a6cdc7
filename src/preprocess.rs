//! Input normalization ahead of thresholding.
//!
//! Steps, in order:
//! - Validate dimensions (zero-size input is rejected before the resize
//!   ratio is computed).
//! - Bound the working width: inputs wider than `max_width` are scaled down
//!   with bilinear interpolation, preserving aspect ratio. This bounds
//!   downstream cost and keeps the fixed kernel sizes meaningful.
//! - Convert to single-channel intensity (integer Rec.601 luma).
//! - Optionally apply CLAHE to flatten surface texture (embroidery, print)
//!   that would otherwise fragment the threshold mask.
//! - Smooth with a separable Gaussian sized by `blur_kernel`.
//!
//! The stage returns the smoothed grayscale image together with the resized
//! color image at identical dimensions: later stages compute masks on the
//! grayscale plane and draw annotations on the color plane.

use crate::error::DetectError;
use crate::image::{ImageRgb8, ImageU8};
use serde::Deserialize;

/// Knobs for the preprocessing stage.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct PreprocessOptions {
    /// Upper bound on the working-image width. Wider inputs are scaled down,
    /// preserving aspect ratio within one pixel.
    pub max_width: usize,
    /// Odd Gaussian kernel size applied before thresholding.
    pub blur_kernel: usize,
    /// Optional adaptive local contrast enhancement of the grayscale image.
    pub clahe: Option<ClaheOptions>,
}

impl Default for PreprocessOptions {
    fn default() -> Self {
        Self {
            max_width: 900,
            blur_kernel: 5,
            clahe: None,
        }
    }
}

/// Contrast-limited adaptive histogram equalization parameters.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct ClaheOptions {
    /// Contrast limit as a multiple of the uniform histogram bin height.
    pub clip_limit: f32,
    /// Number of tiles per axis.
    pub tile_grid: usize,
}

impl Default for ClaheOptions {
    fn default() -> Self {
        Self {
            clip_limit: 2.0,
            tile_grid: 8,
        }
    }
}

/// Output of the preprocessing stage. `color` and `gray` share dimensions.
#[derive(Clone, Debug)]
pub struct Preprocessed {
    pub color: ImageRgb8,
    pub gray: ImageU8,
}

/// Run the full preprocessing chain.
pub fn preprocess(input: &ImageRgb8, opts: &PreprocessOptions) -> Result<Preprocessed, DetectError> {
    if input.w == 0 || input.h == 0 {
        return Err(DetectError::InvalidImage {
            width: input.w,
            height: input.h,
        });
    }

    let color = if input.w > opts.max_width {
        let ratio = opts.max_width as f32 / input.w as f32;
        let nh = ((input.h as f32 * ratio).round() as usize).max(1);
        resize_bilinear(input, opts.max_width, nh)
    } else {
        input.clone()
    };

    let mut gray = to_gray(&color);
    if let Some(clahe_opts) = opts.clahe {
        gray = clahe(&gray, clahe_opts);
    }
    let gray = gaussian_blur(&gray, opts.blur_kernel);

    Ok(Preprocessed { color, gray })
}

/// Bilinear resize of an interleaved RGB buffer.
pub fn resize_bilinear(src: &ImageRgb8, nw: usize, nh: usize) -> ImageRgb8 {
    let mut out = ImageRgb8::new(nw, nh);
    let sx = src.w as f32 / nw as f32;
    let sy = src.h as f32 / nh as f32;
    for y in 0..nh {
        let fy = ((y as f32 + 0.5) * sy - 0.5).clamp(0.0, (src.h - 1) as f32);
        let y0 = fy.floor() as usize;
        let y1 = (y0 + 1).min(src.h - 1);
        let wy = fy - y0 as f32;
        for x in 0..nw {
            let fx = ((x as f32 + 0.5) * sx - 0.5).clamp(0.0, (src.w - 1) as f32);
            let x0 = fx.floor() as usize;
            let x1 = (x0 + 1).min(src.w - 1);
            let wx = fx - x0 as f32;

            let p00 = src.get(x0, y0);
            let p10 = src.get(x1, y0);
            let p01 = src.get(x0, y1);
            let p11 = src.get(x1, y1);
            let mut px = [0u8; 3];
            for c in 0..3 {
                let top = p00[c] as f32 * (1.0 - wx) + p10[c] as f32 * wx;
                let bot = p01[c] as f32 * (1.0 - wx) + p11[c] as f32 * wx;
                px[c] = (top * (1.0 - wy) + bot * wy).round().clamp(0.0, 255.0) as u8;
            }
            out.set(x, y, px);
        }
    }
    out
}

/// Integer Rec.601 luma conversion.
pub fn to_gray(color: &ImageRgb8) -> ImageU8 {
    let mut gray = ImageU8::new(color.w, color.h);
    for y in 0..color.h {
        for x in 0..color.w {
            let [r, g, b] = color.get(x, y);
            let luma = (77 * r as u32 + 150 * g as u32 + 29 * b as u32 + 128) >> 8;
            gray.set(x, y, luma as u8);
        }
    }
    gray
}

/// Separable Gaussian smoothing with replicate borders.
///
/// Sigma follows the usual kernel-size heuristic
/// `0.3 * ((k - 1) * 0.5 - 1) + 0.8`, so `blur_kernel` is the single knob.
/// A kernel of 1 is a no-op.
pub fn gaussian_blur(gray: &ImageU8, ksize: usize) -> ImageU8 {
    if ksize <= 1 || gray.w == 0 || gray.h == 0 {
        return gray.clone();
    }
    debug_assert!(ksize % 2 == 1, "blur kernel must be odd");

    let sigma = 0.3 * ((ksize as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    let half = ksize / 2;
    let mut kernel = Vec::with_capacity(ksize);
    let mut sum = 0.0f32;
    for i in 0..ksize {
        let d = i as f32 - half as f32;
        let v = (-d * d / (2.0 * sigma * sigma)).exp();
        kernel.push(v);
        sum += v;
    }
    for v in &mut kernel {
        *v /= sum;
    }

    let (w, h) = (gray.w, gray.h);
    // Horizontal pass into a float scratch buffer, then vertical back to u8.
    let mut tmp = vec![0.0f32; w * h];
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0;
            for (i, &k) in kernel.iter().enumerate() {
                let xi = (x + i).saturating_sub(half).min(w - 1);
                acc += gray.get(xi, y) as f32 * k;
            }
            tmp[y * w + x] = acc;
        }
    }
    let mut out = ImageU8::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0;
            for (i, &k) in kernel.iter().enumerate() {
                let yi = (y + i).saturating_sub(half).min(h - 1);
                acc += tmp[yi * w + x] * k;
            }
            out.set(x, y, acc.round().clamp(0.0, 255.0) as u8);
        }
    }
    out
}

/// Contrast-limited adaptive histogram equalization.
///
/// The image is divided into `tile_grid × tile_grid` tiles. Each tile gets a
/// clipped, redistributed histogram and the corresponding equalization
/// lookup; pixels are remapped by bilinear interpolation between the four
/// surrounding tile lookups to avoid visible tile seams.
pub fn clahe(gray: &ImageU8, opts: ClaheOptions) -> ImageU8 {
    let (w, h) = (gray.w, gray.h);
    let grid = opts.tile_grid.max(1);
    if w == 0 || h == 0 {
        return gray.clone();
    }
    let tile_w = w.div_ceil(grid);
    let tile_h = h.div_ceil(grid);
    let tiles_x = w.div_ceil(tile_w);
    let tiles_y = h.div_ceil(tile_h);

    // Per-tile equalization lookup tables.
    let mut luts = vec![[0u8; 256]; tiles_x * tiles_y];
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let x0 = tx * tile_w;
            let y0 = ty * tile_h;
            let x1 = (x0 + tile_w).min(w);
            let y1 = (y0 + tile_h).min(h);
            let area = (x1 - x0) * (y1 - y0);

            let mut hist = [0u32; 256];
            for y in y0..y1 {
                for x in x0..x1 {
                    hist[gray.get(x, y) as usize] += 1;
                }
            }

            // Clip and redistribute the excess uniformly.
            let clip = ((opts.clip_limit * area as f32 / 256.0) as u32).max(1);
            let mut excess = 0u32;
            for bin in hist.iter_mut() {
                if *bin > clip {
                    excess += *bin - clip;
                    *bin = clip;
                }
            }
            let bonus = excess / 256;
            let mut leftover = excess % 256;
            for bin in hist.iter_mut() {
                *bin += bonus;
                if leftover > 0 {
                    *bin += 1;
                    leftover -= 1;
                }
            }

            let lut = &mut luts[ty * tiles_x + tx];
            let mut cdf = 0u32;
            for (v, &count) in hist.iter().enumerate() {
                cdf += count;
                lut[v] = ((cdf as f32 / area as f32) * 255.0).round() as u8;
            }
        }
    }

    // Remap with bilinear interpolation between tile centers.
    let mut out = ImageU8::new(w, h);
    for y in 0..h {
        let gy = ((y as f32 - tile_h as f32 / 2.0) / tile_h as f32)
            .clamp(0.0, (tiles_y - 1) as f32);
        let ty0 = gy.floor() as usize;
        let ty1 = (ty0 + 1).min(tiles_y - 1);
        let wy = gy - ty0 as f32;
        for x in 0..w {
            let gx = ((x as f32 - tile_w as f32 / 2.0) / tile_w as f32)
                .clamp(0.0, (tiles_x - 1) as f32);
            let tx0 = gx.floor() as usize;
            let tx1 = (tx0 + 1).min(tiles_x - 1);
            let wx = gx - tx0 as f32;

            let v = gray.get(x, y) as usize;
            let top = luts[ty0 * tiles_x + tx0][v] as f32 * (1.0 - wx)
                + luts[ty0 * tiles_x + tx1][v] as f32 * wx;
            let bot = luts[ty1 * tiles_x + tx0][v] as f32 * (1.0 - wx)
                + luts[ty1 * tiles_x + tx1][v] as f32 * wx;
            out.set(x, y, (top * (1.0 - wy) + bot * wy).round() as u8);
        }
    }
    out
}
