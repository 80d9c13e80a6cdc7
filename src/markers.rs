//! Marker construction for the watershed stage.
//!
//! From the cleaned binary mask:
//! - "sure foreground": distance-transform pixels at or above
//!   `seed_fraction` of the distance maximum — interior points far from any
//!   edge, one seed blob per object.
//! - "sure background": the mask dilated outward a few iterations; anything
//!   beyond it is confidently background.
//! - "unknown": the band between the two, left for the watershed to decide.
//!
//! Seed blobs get connected-component labels offset by +1 so background
//! takes label 1 and objects start at 2; unknown pixels are forced to 0.
//! The stage is a pure transform returning a fresh label map.

use crate::distance::distance_transform;
use crate::image::{ImageF32, ImageU8};
use crate::labels::{connected_components, LabelMap, LABEL_UNKNOWN};
use crate::morphology;
use serde::Deserialize;

/// Knobs for marker generation.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct MarkerOptions {
    /// Fraction of the distance maximum a pixel must reach to count as a
    /// confident seed. Valid range [0, 1]; 0.35–0.5 works for stacked
    /// objects of similar size.
    pub seed_fraction: f32,
    /// Dilation structuring element side for the background estimate (odd).
    pub bg_dilate_kernel: usize,
    /// Dilation iterations for the background estimate.
    pub bg_dilate_iterations: usize,
}

impl Default for MarkerOptions {
    fn default() -> Self {
        Self {
            seed_fraction: 0.4,
            bg_dilate_kernel: 5,
            bg_dilate_iterations: 3,
        }
    }
}

/// Intermediate maps of the marker stage, kept for diagnostics dumps.
#[derive(Clone, Debug)]
pub struct MarkerMaps {
    pub distance: ImageF32,
    pub sure_fg: ImageU8,
    pub sure_bg: ImageU8,
    pub unknown: ImageU8,
    pub markers: LabelMap,
    /// Number of distinct seed blobs (labels 2..2+seed_count).
    pub seed_count: usize,
    pub distance_max: f32,
}

/// Build the marker map from a cleaned mask.
///
/// Returns `None` when no confident seed exists — empty mask, zero distance
/// maximum, or a `seed_fraction` no pixel clears. The caller treats that as
/// the no-foreground outcome, never as an error.
pub fn generate_markers(opened: &ImageU8, opts: &MarkerOptions) -> Option<MarkerMaps> {
    let distance = distance_transform(opened);
    let distance_max = distance.max_value();
    if distance_max <= 0.0 {
        log::debug!("markers: zero distance maximum, no foreground");
        return None;
    }

    let seed_level = opts.seed_fraction * distance_max;
    let mut sure_fg = ImageU8::new(opened.w, opened.h);
    for (dst, &d) in sure_fg.data.iter_mut().zip(distance.data.iter()) {
        *dst = if d > seed_level { 255 } else { 0 };
    }

    let (seed_labels, seed_count) = connected_components(&sure_fg);
    if seed_count == 0 {
        log::debug!(
            "markers: no pixel above seed level {:.2} (max {:.2})",
            seed_level,
            distance_max
        );
        return None;
    }

    let sure_bg = morphology::dilate_n(opened, opts.bg_dilate_kernel, opts.bg_dilate_iterations);

    // unknown = sure_bg − sure_fg (saturating subtraction of masks).
    let mut unknown = ImageU8::new(opened.w, opened.h);
    for i in 0..unknown.data.len() {
        unknown.data[i] = sure_bg.data[i].saturating_sub(sure_fg.data[i]);
    }

    // Offset seed labels so background claims 1 and objects start at 2,
    // then clear the unknown band back to 0.
    let mut markers = LabelMap::new(opened.w, opened.h);
    for i in 0..markers.data.len() {
        markers.data[i] = if unknown.data[i] != 0 {
            LABEL_UNKNOWN
        } else {
            seed_labels.data[i] + 1
        };
    }

    log::debug!(
        "markers: {} seed blob(s), distance max {:.2}",
        seed_count,
        distance_max
    );

    Some(MarkerMaps {
        distance,
        sure_fg,
        sure_bg,
        unknown,
        markers,
        seed_count,
        distance_max,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::FIRST_OBJECT_LABEL;

    fn two_square_mask() -> ImageU8 {
        let mut mask = ImageU8::new(60, 30);
        for y in 8..20 {
            for x in 8..20 {
                mask.set(x, y, 255);
            }
            for x in 32..44 {
                mask.set(x, y, 255);
            }
        }
        mask
    }

    #[test]
    fn two_blobs_yield_two_seed_labels() {
        let maps = generate_markers(&two_square_mask(), &MarkerOptions::default()).expect("seeds");
        assert_eq!(maps.seed_count, 2);
        let max_label = maps.markers.max_object_label().unwrap();
        assert_eq!(max_label, FIRST_OBJECT_LABEL + 1);
    }

    #[test]
    fn unknown_band_surrounds_each_blob() {
        let maps = generate_markers(&two_square_mask(), &MarkerOptions::default()).expect("seeds");
        // Just outside a blob edge: inside dilated background, not sure fg.
        assert_eq!(maps.markers.get(4, 14), LABEL_UNKNOWN);
        // Blob centers carry object labels.
        assert!(maps.markers.get(13, 13) >= FIRST_OBJECT_LABEL);
        assert!(maps.markers.get(37, 13) >= FIRST_OBJECT_LABEL);
        // Far corner stays confident background.
        assert_eq!(maps.markers.get(59, 0), 1);
    }

    #[test]
    fn empty_mask_yields_no_markers() {
        let mask = ImageU8::new(30, 30);
        assert!(generate_markers(&mask, &MarkerOptions::default()).is_none());
    }

    #[test]
    fn seed_fraction_of_one_yields_no_markers() {
        let mask = two_square_mask();
        let opts = MarkerOptions {
            seed_fraction: 1.0,
            ..Default::default()
        };
        assert!(generate_markers(&mask, &opts).is_none());
    }
}
