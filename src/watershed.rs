//! Marker-controlled watershed flooding.
//!
//! Treats the gradient magnitude as a topographic relief and floods outward
//! from every labeled marker pixel simultaneously, lowest relief first.
//! Flooding resolves the unknown band: each popped pixel inherits the label
//! of its already-labeled 4-neighbors, or becomes a ridge (−1) when two
//! different labels meet there. Ridges are barriers; the flood does not pass
//! through them.
//!
//! Determinism: the queue orders on (priority, insertion sequence), so equal
//! relief resolves in first-queued order and repeated runs produce identical
//! label maps. Unknown pixels walled off from every marker by ridges are
//! swept to ridge at the end, so no pixel keeps the unknown label.

use crate::image::ImageU8;
use crate::labels::{LabelMap, LABEL_RIDGE, LABEL_UNKNOWN};
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Flood the unknown band of `markers` guided by `priority` (u8 relief).
///
/// Returns a fresh map: labels > 0 are basins, −1 ridges; no `LABEL_UNKNOWN`
/// pixels remain. `markers` and `priority` must share dimensions.
pub fn watershed(markers: &LabelMap, priority: &ImageU8) -> LabelMap {
    assert_eq!(markers.w, priority.w);
    assert_eq!(markers.h, priority.h);

    let (w, h) = (markers.w, markers.h);
    let mut out = markers.clone();
    if w == 0 || h == 0 {
        return out;
    }

    let neighbors = |idx: usize| {
        let x = idx % w;
        let y = idx / w;
        let mut nb = [usize::MAX; 4];
        if x > 0 {
            nb[0] = idx - 1;
        }
        if x + 1 < w {
            nb[1] = idx + 1;
        }
        if y > 0 {
            nb[2] = idx - w;
        }
        if y + 1 < h {
            nb[3] = idx + w;
        }
        nb
    };

    let mut heap: BinaryHeap<Reverse<(u8, u64, usize)>> = BinaryHeap::new();
    let mut queued = vec![false; w * h];
    let mut seq = 0u64;

    let push = |heap: &mut BinaryHeap<Reverse<(u8, u64, usize)>>,
                    queued: &mut Vec<bool>,
                    seq: &mut u64,
                    idx: usize| {
        if !queued[idx] {
            queued[idx] = true;
            heap.push(Reverse((priority.data[idx], *seq, idx)));
            *seq += 1;
        }
    };

    // Seed the queue with the unknown border of every labeled basin.
    for idx in 0..w * h {
        if out.data[idx] <= 0 {
            continue;
        }
        for nb in neighbors(idx) {
            if nb != usize::MAX && out.data[nb] == LABEL_UNKNOWN {
                push(&mut heap, &mut queued, &mut seq, nb);
            }
        }
    }

    while let Some(Reverse((_, _, idx))) = heap.pop() {
        if out.data[idx] != LABEL_UNKNOWN {
            continue;
        }

        let mut assign = 0i32;
        let mut conflict = false;
        for nb in neighbors(idx) {
            if nb == usize::MAX {
                continue;
            }
            let l = out.data[nb];
            if l > 0 {
                if assign == 0 {
                    assign = l;
                } else if assign != l {
                    conflict = true;
                }
            }
        }

        if conflict || assign == 0 {
            out.data[idx] = LABEL_RIDGE;
            continue;
        }

        out.data[idx] = assign;
        for nb in neighbors(idx) {
            if nb != usize::MAX && out.data[nb] == LABEL_UNKNOWN {
                push(&mut heap, &mut queued, &mut seq, nb);
            }
        }
    }

    // Pockets fully enclosed by ridges never get flooded; close them out.
    let mut walled = 0usize;
    for px in out.data.iter_mut() {
        if *px == LABEL_UNKNOWN {
            *px = LABEL_RIDGE;
            walled += 1;
        }
    }
    if walled > 0 {
        log::debug!("watershed: {walled} unreachable pixel(s) swept to ridge");
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::LABEL_BACKGROUND;

    /// 1 everywhere, two object seeds, an unknown band between and around.
    fn marker_fixture(w: usize, h: usize) -> LabelMap {
        let mut markers = LabelMap::new(w, h);
        markers.data.fill(LABEL_BACKGROUND);
        for y in 2..h - 2 {
            for x in 1..w - 1 {
                markers.set(x, y, LABEL_UNKNOWN);
            }
        }
        markers.set(2, h / 2, 2);
        markers.set(w - 3, h / 2, 3);
        markers
    }

    #[test]
    fn flood_fills_every_unknown_pixel() {
        let markers = marker_fixture(16, 9);
        let flat = ImageU8::new(16, 9);
        let result = watershed(&markers, &flat);
        assert!(result.data.iter().all(|&l| l != LABEL_UNKNOWN));
    }

    #[test]
    fn two_seeds_split_the_band_with_a_ridge() {
        let markers = marker_fixture(16, 9);
        let flat = ImageU8::new(16, 9);
        let result = watershed(&markers, &flat);
        assert_eq!(result.get(3, 4), 2);
        assert_eq!(result.get(12, 4), 3);
        let ridges = result.data.iter().filter(|&&l| l == LABEL_RIDGE).count();
        assert!(ridges > 0, "expected a ridge where the floods meet");
    }

    #[test]
    fn flooding_is_deterministic() {
        let markers = marker_fixture(20, 11);
        let mut relief = ImageU8::new(20, 11);
        for (i, px) in relief.data.iter_mut().enumerate() {
            *px = ((i * 37) % 200) as u8;
        }
        let a = watershed(&markers, &relief);
        let b = watershed(&markers, &relief);
        assert_eq!(a.data, b.data);
    }

    #[test]
    fn high_relief_walls_divert_the_flood() {
        // A high-priority vertical wall at x=8 delays crossing until the
        // cheap side is exhausted, so label 2 owns everything left of it.
        let mut markers = LabelMap::new(17, 7);
        markers.data.fill(LABEL_UNKNOWN);
        markers.set(0, 3, 2);
        markers.set(16, 3, 3);
        let mut relief = ImageU8::new(17, 7);
        for y in 0..7 {
            relief.set(8, y, 250);
        }
        let result = watershed(&markers, &relief);
        assert_eq!(result.get(4, 3), 2);
        assert_eq!(result.get(12, 3), 3);
    }
}
