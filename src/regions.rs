//! Region extraction, filtering and counting.
//!
//! For every object label of the final watershed map, the filter builds a
//! single-region mask, traces its external contours (Moore neighbor
//! tracing, clockwise, with Jacob's stopping criterion), and evaluates the
//! dominant contour against the acceptance policy. Accepted regions each
//! contribute exactly one to the object count and one bounding box to the
//! annotation.
//!
//! The acceptance policy unifies the fixed-threshold and
//! resolution-relative filtering variants behind one tagged configuration:
//! absolute pixel bounds, or bounds relative to the working-image area.
//!
//! Regions are independent, so evaluation fans out over rayon; results are
//! aggregated back in label order to keep the output deterministic.

use crate::image::ImageU8;
use crate::labels::{LabelMap, FIRST_OBJECT_LABEL};
use crate::types::RectPx;
use rayon::prelude::*;
use serde::Deserialize;

/// Region acceptance policy.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AreaBounds {
    /// Fixed pixel-area window.
    Absolute {
        min_area: f64,
        max_area: Option<f64>,
    },
    /// Window relative to the working-image area, adapting to resolution.
    Relative { min_frac: f64, max_frac: f64 },
}

impl Default for AreaBounds {
    fn default() -> Self {
        AreaBounds::Absolute {
            min_area: 1500.0,
            max_area: None,
        }
    }
}

/// Knobs for the filtering stage.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct FilterOptions {
    pub area_bounds: AreaBounds,
    /// Minimum accepted bounding-box width; 0 disables the check.
    pub min_box_width: u32,
    /// Minimum accepted bounding-box height; 0 disables the check.
    pub min_box_height: u32,
}

/// One surviving region.
#[derive(Clone, Debug)]
pub struct Region {
    pub label: i32,
    /// Enclosed area of the dominant external contour (shoelace).
    pub area: f64,
    pub bbox: RectPx,
    /// Ordered boundary points of the dominant contour.
    pub contour: Vec<(i32, i32)>,
}

/// Aggregate outcome of the filter stage.
#[derive(Clone, Debug, Default)]
pub struct FilterOutcome {
    pub accepted: Vec<Region>,
    /// Labels examined (every distinct label ≥ 2).
    pub candidates: usize,
    pub rejected_area: usize,
    pub rejected_box: usize,
    /// Labels whose mask produced no contour points.
    pub degenerate: usize,
}

const DIRS8: [(i32, i32); 8] = [
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
];

#[inline]
fn dir_between(from: (i32, i32), to: (i32, i32)) -> usize {
    let d = (to.0 - from.0, to.1 - from.1);
    DIRS8.iter().position(|&v| v == d).expect("adjacent pixels")
}

/// Trace the external contour of the component containing `(sx, sy)`,
/// which must be its uppermost-leftmost foreground pixel.
fn trace_contour(mask: &ImageU8, sx: usize, sy: usize) -> Vec<(i32, i32)> {
    let fg = |p: (i32, i32)| {
        p.0 >= 0
            && p.1 >= 0
            && (p.0 as usize) < mask.w
            && (p.1 as usize) < mask.h
            && mask.get(p.0 as usize, p.1 as usize) != 0
    };

    let start = (sx as i32, sy as i32);
    let b0 = (start.0 - 1, start.1);
    let mut contour = vec![start];
    let mut cur = start;
    let mut back = b0;
    let mut second: Option<(i32, i32)> = None;

    // Worst-case boundary length; guards against pathological loops.
    let limit = 4 * mask.w * mask.h + 8;
    for _ in 0..limit {
        let start_dir = dir_between(cur, back);
        let mut found = None;
        for i in 1..=8 {
            let dir = (start_dir + i) % 8;
            let p = (cur.0 + DIRS8[dir].0, cur.1 + DIRS8[dir].1);
            if fg(p) {
                found = Some((p, (start_dir + i - 1) % 8));
                break;
            }
        }
        let Some((next, prev)) = found else {
            // Isolated pixel.
            return contour;
        };
        // Stop when the walk is back at the start about to repeat its first
        // move (the tracing state has closed its cycle).
        if cur == start && second == Some(next) {
            break;
        }
        back = (cur.0 + DIRS8[prev].0, cur.1 + DIRS8[prev].1);
        cur = next;
        if second.is_none() {
            second = Some(next);
        }
        contour.push(cur);
    }

    if contour.len() > 1 && contour.first() == contour.last() {
        contour.pop();
    }
    contour
}

/// External contours of all components of a binary mask, each traced from
/// its uppermost-leftmost pixel.
pub fn find_external_contours(mask: &ImageU8) -> Vec<Vec<(i32, i32)>> {
    let (labels, count) = crate::labels::connected_components(mask);
    let mut contours = Vec::with_capacity(count);
    let mut seen = vec![false; count + 1];
    for y in 0..mask.h {
        for x in 0..mask.w {
            let l = labels.get(x, y);
            if l > 0 && !seen[l as usize] {
                seen[l as usize] = true;
                contours.push(trace_contour(mask, x, y));
            }
        }
    }
    contours
}

/// Enclosed polygon area of an ordered contour (shoelace formula).
pub fn contour_area(contour: &[(i32, i32)]) -> f64 {
    if contour.len() < 3 {
        return 0.0;
    }
    let mut sum = 0i64;
    for i in 0..contour.len() {
        let (x0, y0) = contour[i];
        let (x1, y1) = contour[(i + 1) % contour.len()];
        sum += x0 as i64 * y1 as i64 - x1 as i64 * y0 as i64;
    }
    (sum.abs() as f64) / 2.0
}

/// Axis-aligned bounding box of a non-empty contour.
pub fn contour_bbox(contour: &[(i32, i32)]) -> RectPx {
    let mut min_x = i32::MAX;
    let mut min_y = i32::MAX;
    let mut max_x = i32::MIN;
    let mut max_y = i32::MIN;
    for &(x, y) in contour {
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);
    }
    RectPx {
        x: min_x,
        y: min_y,
        w: (max_x - min_x + 1) as u32,
        h: (max_y - min_y + 1) as u32,
    }
}

enum RegionEval {
    Accepted(Region),
    RejectedArea,
    RejectedBox,
    Degenerate,
}

fn evaluate_label(map: &LabelMap, label: i32, opts: &FilterOptions) -> RegionEval {
    let mut mask = ImageU8::new(map.w, map.h);
    let mut pixels = 0usize;
    for (dst, &l) in mask.data.iter_mut().zip(map.data.iter()) {
        if l == label {
            *dst = 255;
            pixels += 1;
        }
    }
    if pixels == 0 {
        return RegionEval::Degenerate;
    }

    let contours = find_external_contours(&mask);
    let main = contours
        .iter()
        .max_by(|a, b| contour_area(a).total_cmp(&contour_area(b)));
    let Some(main) = main else {
        return RegionEval::Degenerate;
    };
    if main.is_empty() {
        return RegionEval::Degenerate;
    }

    let area = contour_area(main);
    let image_area = (map.w * map.h) as f64;
    let (min_area, max_area) = match opts.area_bounds {
        AreaBounds::Absolute { min_area, max_area } => {
            (min_area, max_area.unwrap_or(f64::INFINITY))
        }
        AreaBounds::Relative { min_frac, max_frac } => {
            (min_frac * image_area, max_frac * image_area)
        }
    };
    if area < min_area || area > max_area {
        return RegionEval::RejectedArea;
    }

    let bbox = contour_bbox(main);
    if bbox.w < opts.min_box_width || bbox.h < opts.min_box_height {
        return RegionEval::RejectedBox;
    }

    RegionEval::Accepted(Region {
        label,
        area,
        bbox,
        contour: main.clone(),
    })
}

/// Evaluate every object label of the final marker map against the policy.
pub fn filter_regions(map: &LabelMap, opts: &FilterOptions) -> FilterOutcome {
    let Some(max_label) = map.max_object_label() else {
        return FilterOutcome::default();
    };

    let evals: Vec<RegionEval> = (FIRST_OBJECT_LABEL..=max_label)
        .into_par_iter()
        .map(|label| evaluate_label(map, label, opts))
        .collect();

    let mut outcome = FilterOutcome {
        candidates: evals.len(),
        ..Default::default()
    };
    for eval in evals {
        match eval {
            RegionEval::Accepted(region) => outcome.accepted.push(region),
            RegionEval::RejectedArea => outcome.rejected_area += 1,
            RegionEval::RejectedBox => outcome.rejected_box += 1,
            RegionEval::Degenerate => {
                outcome.degenerate += 1;
                log::warn!("region filter: degenerate label skipped");
            }
        }
    }
    // Label order is already ascending from the indexed fan-out; keep it
    // explicit for the draw pass.
    outcome.accepted.sort_by_key(|r| r.label);
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_mask(w: usize, h: usize, x0: usize, y0: usize, side: usize) -> ImageU8 {
        let mut mask = ImageU8::new(w, h);
        for y in y0..y0 + side {
            for x in x0..x0 + side {
                mask.set(x, y, 255);
            }
        }
        mask
    }

    #[test]
    fn contour_of_square_is_closed_and_ordered() {
        let mask = square_mask(12, 12, 3, 3, 5);
        let contours = find_external_contours(&mask);
        assert_eq!(contours.len(), 1);
        let c = &contours[0];
        // Perimeter of a 5×5 square boundary is 16 pixels.
        assert_eq!(c.len(), 16);
        // Consecutive points are 8-adjacent.
        for win in c.windows(2) {
            let dx = (win[1].0 - win[0].0).abs();
            let dy = (win[1].1 - win[0].1).abs();
            assert!(dx <= 1 && dy <= 1 && (dx, dy) != (0, 0));
        }
        assert_eq!(contour_area(c), 16.0);
        assert_eq!(contour_bbox(c), RectPx { x: 3, y: 3, w: 5, h: 5 });
    }

    #[test]
    fn single_pixel_contour_is_degenerate_area() {
        let mask = square_mask(5, 5, 2, 2, 1);
        let contours = find_external_contours(&mask);
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].len(), 1);
        assert_eq!(contour_area(&contours[0]), 0.0);
    }

    #[test]
    fn border_touching_region_traces_without_panic() {
        let mask = square_mask(8, 8, 0, 0, 4);
        let contours = find_external_contours(&mask);
        assert_eq!(contours.len(), 1);
        assert_eq!(contour_bbox(&contours[0]), RectPx { x: 0, y: 0, w: 4, h: 4 });
    }

    #[test]
    fn absolute_policy_rejects_small_regions() {
        let mut map = LabelMap::new(40, 40);
        // Label 2: 10×10 block; label 3: 2×2 block.
        for y in 2..12 {
            for x in 2..12 {
                map.set(x, y, 2);
            }
        }
        for y in 20..22 {
            for x in 20..22 {
                map.set(x, y, 3);
            }
        }
        let opts = FilterOptions {
            area_bounds: AreaBounds::Absolute {
                min_area: 50.0,
                max_area: None,
            },
            ..Default::default()
        };
        let out = filter_regions(&map, &opts);
        assert_eq!(out.candidates, 2);
        assert_eq!(out.accepted.len(), 1);
        assert_eq!(out.accepted[0].label, 2);
        assert_eq!(out.rejected_area, 1);
    }

    #[test]
    fn relative_policy_scales_with_image_area() {
        let mut map = LabelMap::new(100, 100);
        for y in 10..40 {
            for x in 10..40 {
                map.set(x, y, 2);
            }
        }
        let opts = FilterOptions {
            area_bounds: AreaBounds::Relative {
                min_frac: 0.001,
                max_frac: 0.40,
            },
            ..Default::default()
        };
        let out = filter_regions(&map, &opts);
        assert_eq!(out.accepted.len(), 1);

        let strict = FilterOptions {
            area_bounds: AreaBounds::Relative {
                min_frac: 0.2,
                max_frac: 0.40,
            },
            ..Default::default()
        };
        assert_eq!(filter_regions(&map, &strict).accepted.len(), 0);
    }

    #[test]
    fn box_dimension_filter_rejects_slivers() {
        let mut map = LabelMap::new(60, 60);
        for y in 5..45 {
            for x in 5..9 {
                map.set(x, y, 2);
            }
        }
        let opts = FilterOptions {
            area_bounds: AreaBounds::Absolute {
                min_area: 10.0,
                max_area: None,
            },
            min_box_width: 40,
            min_box_height: 40,
        };
        let out = filter_regions(&map, &opts);
        assert_eq!(out.accepted.len(), 0);
        assert_eq!(out.rejected_box, 1);
    }
}
