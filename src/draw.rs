//! Annotation primitives for the output visualization.
//!
//! Boxes and ridge overlays draw directly into the RGB output buffer; both
//! clip against the image bounds so ROI-translated rectangles near the
//! frame never index out of range.

use crate::image::ImageRgb8;
use crate::labels::{LabelMap, LABEL_RIDGE};
use crate::types::RectPx;

/// Accepted-region box color.
pub const BOX_COLOR: [u8; 3] = [0, 255, 0];
/// Watershed ridge overlay color.
pub const RIDGE_COLOR: [u8; 3] = [255, 0, 0];

fn fill_clipped(img: &mut ImageRgb8, x0: i32, y0: i32, x1: i32, y1: i32, color: [u8; 3]) {
    let xs = x0.max(0) as usize;
    let ys = y0.max(0) as usize;
    let xe = (x1.min(img.w as i32)).max(0) as usize;
    let ye = (y1.min(img.h as i32)).max(0) as usize;
    for y in ys..ye {
        for x in xs..xe {
            img.set(x, y, color);
        }
    }
}

/// Draw a hollow rectangle of the given edge thickness.
pub fn draw_rect(img: &mut ImageRgb8, rect: RectPx, color: [u8; 3], thickness: u32) {
    let t = thickness as i32;
    let x0 = rect.x;
    let y0 = rect.y;
    let x1 = rect.x + rect.w as i32;
    let y1 = rect.y + rect.h as i32;
    // Top and bottom bands.
    fill_clipped(img, x0, y0, x1, y0 + t, color);
    fill_clipped(img, x0, y1 - t, x1, y1, color);
    // Left and right bands.
    fill_clipped(img, x0, y0, x0 + t, y1, color);
    fill_clipped(img, x1 - t, y0, x1, y1, color);
}

/// Paint every ridge pixel of a label map onto the image, offset by
/// `(dx, dy)` when the map lives in an ROI frame.
pub fn paint_ridges(img: &mut ImageRgb8, map: &LabelMap, dx: i32, dy: i32, color: [u8; 3]) {
    for y in 0..map.h {
        for x in 0..map.w {
            if map.get(x, y) != LABEL_RIDGE {
                continue;
            }
            let px = x as i32 + dx;
            let py = y as i32 + dy;
            if px >= 0 && py >= 0 && (px as usize) < img.w && (py as usize) < img.h {
                img.set(px as usize, py as usize, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_edges_are_painted_and_interior_kept() {
        let mut img = ImageRgb8::new(20, 20);
        let rect = RectPx { x: 4, y: 4, w: 10, h: 8 };
        draw_rect(&mut img, rect, BOX_COLOR, 2);
        assert_eq!(img.get(4, 4), BOX_COLOR);
        assert_eq!(img.get(13, 11), BOX_COLOR);
        assert_eq!(img.get(9, 8), [0, 0, 0]);
    }

    #[test]
    fn rect_partially_outside_is_clipped() {
        let mut img = ImageRgb8::new(10, 10);
        let rect = RectPx { x: -3, y: 7, w: 8, h: 8 };
        draw_rect(&mut img, rect, BOX_COLOR, 2);
        assert_eq!(img.get(0, 8), BOX_COLOR);
        assert_eq!(img.get(9, 9), [0, 0, 0]);
    }

    #[test]
    fn ridges_paint_with_offset() {
        let mut img = ImageRgb8::new(10, 10);
        let mut map = LabelMap::new(4, 4);
        map.set(1, 1, LABEL_RIDGE);
        map.set(3, 3, LABEL_RIDGE);
        paint_ridges(&mut img, &map, 5, 5, RIDGE_COLOR);
        assert_eq!(img.get(6, 6), RIDGE_COLOR);
        assert_eq!(img.get(8, 8), RIDGE_COLOR);
        assert_eq!(img.get(1, 1), [0, 0, 0]);
    }
}
