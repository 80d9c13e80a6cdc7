//! Image gradient magnitude used as the watershed flooding relief.
//!
//! - Convolves the 3×3 Sobel kernel pair (`X` and `Y`) with border clamping.
//! - Outputs per-pixel `mag = sqrt(gx^2 + gy^2)`.
//! - Quantizes the magnitude to u8 so the flood queue can order pixels on an
//!   integer priority, which keeps the watershed deterministic.
//!
//! Complexity: O(W·H) per pass; memory: one float buffer + 1 byte/pixel.

use crate::image::{ImageF32, ImageU8};

type Kernel3 = [[f32; 3]; 3];

const SOBEL_KERNEL_X: Kernel3 = [[-1.0, 0.0, 1.0], [-2.0, 0.0, 2.0], [-1.0, 0.0, 1.0]];
const SOBEL_KERNEL_Y: Kernel3 = [[-1.0, -2.0, -1.0], [0.0, 0.0, 0.0], [1.0, 2.0, 1.0]];

/// Compute the Sobel gradient magnitude of an 8-bit grayscale image.
pub fn sobel_magnitude(gray: &ImageU8) -> ImageF32 {
    let w = gray.w;
    let h = gray.h;
    let mut mag = ImageF32::new(w, h);
    if w == 0 || h == 0 {
        return mag;
    }

    for y in 0..h {
        let y_idx = [y.saturating_sub(1), y, (y + 1).min(h - 1)];
        let out_mag = mag.row_mut(y);
        for x in 0..w {
            let x_idx = [x.saturating_sub(1), x, (x + 1).min(w - 1)];

            let mut sum_x = 0.0;
            let mut sum_y = 0.0;
            for (ky, &yy) in y_idx.iter().enumerate() {
                let kx_row = &SOBEL_KERNEL_X[ky];
                let ky_row = &SOBEL_KERNEL_Y[ky];
                for (kx, &xx) in x_idx.iter().enumerate() {
                    let v = gray.get(xx, yy) as f32;
                    sum_x += v * kx_row[kx];
                    sum_y += v * ky_row[kx];
                }
            }
            out_mag[x] = (sum_x * sum_x + sum_y * sum_y).sqrt();
        }
    }
    mag
}

/// Rescale a magnitude map to u8 flood priorities (0 = flattest).
pub fn quantize_priority(mag: &ImageF32) -> ImageU8 {
    let mut out = ImageU8::new(mag.w, mag.h);
    let max = mag.max_value();
    if max <= 0.0 {
        return out;
    }
    for (dst, &v) in out.data.iter_mut().zip(mag.data.iter()) {
        *dst = (v / max * 255.0).round().clamp(0.0, 255.0) as u8;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_image_has_zero_magnitude() {
        let mut gray = ImageU8::new(8, 8);
        gray.data.fill(90);
        let mag = sobel_magnitude(&gray);
        assert!(mag.data.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn vertical_step_produces_horizontal_response() {
        let mut gray = ImageU8::new(8, 8);
        for y in 0..8 {
            for x in 4..8 {
                gray.set(x, y, 200);
            }
        }
        let mag = sobel_magnitude(&gray);
        assert!(mag.get(4, 4) > 0.0);
        assert_eq!(mag.get(1, 4), 0.0);
    }

    #[test]
    fn priorities_span_zero_to_255() {
        let mut gray = ImageU8::new(8, 8);
        for y in 0..8 {
            for x in 4..8 {
                gray.set(x, y, 200);
            }
        }
        let pri = quantize_priority(&sobel_magnitude(&gray));
        assert_eq!(*pri.data.iter().max().unwrap(), 255);
        assert_eq!(pri.get(0, 0), 0);
    }
}
