//! Parameter types configuring the detector stages.
//!
//! This module aggregates the per-stage knobs into one [`DetectParams`]
//! value. The three historical pipeline variants (fixed-area filtering,
//! resolution-relative filtering, ROI-scoped watershed) are all expressible
//! through this configuration rather than separate code paths.
//!
//! Defaults suit stacks of hand-sized objects photographed at roughly a
//! thousand pixels across. For tuning, start with `markers.seed_fraction`
//! (under-segmentation: lower it; over-segmentation: raise it) and the
//! filter area bounds.

use crate::binarize::BinarizeOptions;
use crate::error::DetectError;
use crate::markers::MarkerOptions;
use crate::morphology::MorphOptions;
use crate::preprocess::PreprocessOptions;
use crate::regions::{AreaBounds, FilterOptions};
use crate::roi::RoiOptions;
use serde::Deserialize;

/// Detector-wide parameters controlling the staged pipeline.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct DetectParams {
    pub preprocess: PreprocessOptions,
    pub binarize: BinarizeOptions,
    pub morphology: MorphOptions,
    /// Enables the saturation-based ROI stage ahead of thresholding.
    pub use_roi_selection: bool,
    /// ROI stage knobs, consulted only when `use_roi_selection` is set.
    pub roi: RoiOptions,
    pub markers: MarkerOptions,
    pub filter: FilterOptions,
}

impl DetectParams {
    /// Check every field against its documented valid range.
    pub fn validate(&self) -> Result<(), DetectError> {
        let fail = |reason: String| Err(DetectError::InvalidConfig { reason });

        if self.preprocess.max_width == 0 {
            return fail("preprocess.max_width must be positive".into());
        }
        if self.preprocess.blur_kernel == 0 || self.preprocess.blur_kernel % 2 == 0 {
            return fail(format!(
                "preprocess.blur_kernel must be odd, got {}",
                self.preprocess.blur_kernel
            ));
        }
        if let Some(clahe) = &self.preprocess.clahe {
            if clahe.clip_limit <= 0.0 || clahe.tile_grid == 0 {
                return fail("preprocess.clahe needs clip_limit > 0 and tile_grid >= 1".into());
            }
        }

        for (name, k) in [
            ("morphology.close_kernel", self.morphology.close_kernel),
            ("morphology.open_kernel", self.morphology.open_kernel),
            ("markers.bg_dilate_kernel", self.markers.bg_dilate_kernel),
            ("roi.close_kernel", self.roi.close_kernel),
        ] {
            if k == 0 || k % 2 == 0 {
                return fail(format!("{name} must be odd, got {k}"));
            }
        }
        for (name, n) in [
            ("morphology.close_iterations", self.morphology.close_iterations),
            ("morphology.open_iterations", self.morphology.open_iterations),
            ("markers.bg_dilate_iterations", self.markers.bg_dilate_iterations),
            ("roi.close_iterations", self.roi.close_iterations),
        ] {
            if n == 0 {
                return fail(format!("{name} must be positive"));
            }
        }

        let frac = self.markers.seed_fraction;
        if !(0.0..=1.0).contains(&frac) {
            return fail(format!("markers.seed_fraction must be in [0, 1], got {frac}"));
        }

        match self.filter.area_bounds {
            AreaBounds::Absolute { min_area, max_area } => {
                if min_area < 0.0 {
                    return fail("filter.min_area must be non-negative".into());
                }
                if let Some(max) = max_area {
                    if max < min_area {
                        return fail("filter.max_area must be >= min_area".into());
                    }
                }
            }
            AreaBounds::Relative { min_frac, max_frac } => {
                if !(0.0..=1.0).contains(&min_frac)
                    || !(0.0..=1.0).contains(&max_frac)
                    || max_frac < min_frac
                {
                    return fail(format!(
                        "filter fractions must satisfy 0 <= min <= max <= 1, got [{min_frac}, {max_frac}]"
                    ));
                }
            }
        }

        Ok(())
    }
}
