//! Detector pipeline driving segmentation and counting end-to-end.
//!
//! The [`StackDetector`] exposes a simple API: feed a color image and get a
//! count with masks, annotation and detailed diagnostics. Internally it
//! coordinates preprocessing, Otsu thresholding, morphological refinement,
//! the optional ROI stage, marker generation, the watershed flood and the
//! region filter.
//!
//! Typical usage:
//! ```no_run
//! use stack_counter::{DetectParams, StackDetector};
//! use stack_counter::image::ImageRgb8;
//!
//! # fn example(color: ImageRgb8) {
//! let detector = StackDetector::new(DetectParams::default());
//! match detector.process(&color) {
//!     Ok(report) => println!("count={}", report.result.count),
//!     Err(err) => eprintln!("detection failed: {err}"),
//! }
//! # }
//! ```

use super::params::DetectParams;
use crate::binarize;
use crate::diagnostics::{
    BinarizeDiagnostics, FilterDiagnostics, MarkerDiagnostics, MorphologyDiagnostics,
    PipelineTrace, PreprocessDiagnostics, RoiDiagnostics, WatershedDiagnostics,
};
use crate::draw;
use crate::error::DetectError;
use crate::gradient;
use crate::image::{ImageRgb8, ImageU8};
use crate::labels::{FIRST_OBJECT_LABEL, LABEL_RIDGE};
use crate::markers::{self, MarkerOptions};
use crate::morphology;
use crate::preprocess::{self, Preprocessed};
use crate::regions::{self, FilterOptions};
use crate::roi;
use crate::types::{CountResult, RectPx};
use crate::watershed;
use std::time::Instant;

/// Everything one `process` call produces: the count summary, the cleaned
/// binary mask (working-image scale), the annotated output image
/// (full working frame) and the per-stage trace.
#[derive(Clone, Debug)]
pub struct DetectReport {
    pub result: CountResult,
    pub processed_mask: ImageU8,
    pub annotated: ImageRgb8,
    pub trace: PipelineTrace,
}

/// Stack detector orchestrating the segmentation-and-counting pipeline.
///
/// Stateless across calls: every invocation is a pure function of the input
/// image and the configured parameters.
pub struct StackDetector {
    params: DetectParams,
}

impl StackDetector {
    /// Create a detector with the supplied parameters.
    pub fn new(params: DetectParams) -> Self {
        Self { params }
    }

    /// Current parameters.
    pub fn params(&self) -> &DetectParams {
        &self.params
    }

    /// Toggle the saturation-based ROI stage.
    pub fn set_use_roi_selection(&mut self, enabled: bool) {
        self.params.use_roi_selection = enabled;
    }

    /// Update marker generation parameters.
    pub fn set_marker_options(&mut self, opts: MarkerOptions) {
        self.params.markers = opts;
    }

    /// Update region acceptance parameters.
    pub fn set_filter_options(&mut self, opts: FilterOptions) {
        self.params.filter = opts;
    }

    /// Run the full pipeline on one color image.
    pub fn process(&self, input: &ImageRgb8) -> Result<DetectReport, DetectError> {
        self.params.validate()?;
        let total_start = Instant::now();
        let mut trace = PipelineTrace::default();

        // Preprocess: bounded resize, grayscale, optional CLAHE, blur.
        let stage = Instant::now();
        let Preprocessed { color, gray } = preprocess::preprocess(input, &self.params.preprocess)?;
        trace.preprocess = Some(PreprocessDiagnostics {
            input_width: input.w,
            input_height: input.h,
            working_width: color.w,
            working_height: color.h,
            clahe_applied: self.params.preprocess.clahe.is_some(),
            elapsed_ms: ms_since(stage),
        });
        log::debug!(
            "preprocess: {}x{} -> {}x{}",
            input.w,
            input.h,
            color.w,
            color.h
        );

        let mut annotated = color.clone();

        // Optional ROI: scope the rest of the pipeline to the dominant
        // saturated blob. A fully neutral scene short-circuits to zero.
        let (work_gray, roi_rect) = if self.params.use_roi_selection {
            let stage = Instant::now();
            match roi::select_roi(&color, &self.params.roi) {
                Some(sel) => {
                    trace.roi = Some(RoiDiagnostics {
                        rect: sel.rect,
                        elapsed_ms: ms_since(stage),
                    });
                    let r = sel.rect;
                    let sub = gray.crop(r.x as usize, r.y as usize, r.w as usize, r.h as usize);
                    (sub, Some(r))
                }
                None => {
                    log::debug!("roi: no saturated region, returning zero count");
                    trace.short_circuit = Some("roi");
                    let mask = ImageU8::new(color.w, color.h);
                    return Ok(self.finish_zero(0, None, mask, annotated, trace, total_start));
                }
            }
        } else {
            (gray, None)
        };
        let (dx, dy) = roi_rect.map_or((0, 0), |r| (r.x, r.y));

        // Binarize: Otsu threshold, inverted polarity by default.
        let stage = Instant::now();
        let (binary, threshold) = binarize::binarize(&work_gray, self.params.binarize);
        trace.binarize = Some(BinarizeDiagnostics {
            threshold,
            foreground_px: binary.count_nonzero(),
            elapsed_ms: ms_since(stage),
        });
        log::debug!("binarize: otsu level {threshold}");

        // Morphology: close to fuse fragments, open to drop speckles. The
        // opened mask doubles as the caller-facing processed mask.
        let stage = Instant::now();
        let opened = morphology::refine_mask(&binary, &self.params.morphology);
        trace.morphology = Some(MorphologyDiagnostics {
            foreground_px: opened.count_nonzero(),
            elapsed_ms: ms_since(stage),
        });

        // Markers: distance-transform seeds, dilated background, unknown
        // band. No confident seed anywhere is a valid zero-count outcome.
        let stage = Instant::now();
        let maps = match markers::generate_markers(&opened, &self.params.markers) {
            Some(maps) => maps,
            None => {
                trace.short_circuit = Some("markers");
                return Ok(self.finish_zero(threshold, roi_rect, opened, annotated, trace, total_start));
            }
        };
        trace.markers = Some(MarkerDiagnostics {
            seed_count: maps.seed_count,
            distance_max: maps.distance_max,
            unknown_px: maps.unknown.count_nonzero(),
            elapsed_ms: ms_since(stage),
        });

        // Watershed: flood the unknown band over the gradient relief.
        let stage = Instant::now();
        let relief = gradient::quantize_priority(&gradient::sobel_magnitude(&work_gray));
        let segmented = watershed::watershed(&maps.markers, &relief);
        let ridge_px = segmented
            .data
            .iter()
            .filter(|&&l| l == LABEL_RIDGE)
            .count();
        let region_labels = segmented
            .distinct_labels()
            .iter()
            .filter(|&&l| l >= FIRST_OBJECT_LABEL)
            .count();
        trace.watershed = Some(WatershedDiagnostics {
            ridge_px,
            region_labels,
            elapsed_ms: ms_since(stage),
        });
        log::debug!("watershed: {region_labels} region label(s), {ridge_px} ridge px");
        draw::paint_ridges(&mut annotated, &segmented, dx, dy, draw::RIDGE_COLOR);

        // Filter and annotate: every accepted region counts exactly once.
        let stage = Instant::now();
        let outcome = regions::filter_regions(&segmented, &self.params.filter);
        let mut boxes = Vec::with_capacity(outcome.accepted.len());
        for region in &outcome.accepted {
            let rect = region.bbox.translated(dx, dy);
            draw::draw_rect(&mut annotated, rect, draw::BOX_COLOR, 2);
            boxes.push(rect);
        }
        trace.filter = Some(FilterDiagnostics {
            candidates: outcome.candidates,
            accepted: outcome.accepted.len(),
            rejected_area: outcome.rejected_area,
            rejected_box: outcome.rejected_box,
            degenerate: outcome.degenerate,
            elapsed_ms: ms_since(stage),
        });

        let latency_ms = ms_since(total_start);
        trace.total_ms = latency_ms;
        log::debug!("process: count={} in {:.3} ms", boxes.len(), latency_ms);

        Ok(DetectReport {
            result: CountResult {
                count: boxes.len(),
                threshold,
                roi: roi_rect,
                boxes,
                latency_ms,
            },
            processed_mask: opened,
            annotated,
            trace,
        })
    }

    fn finish_zero(
        &self,
        threshold: u8,
        roi_rect: Option<RectPx>,
        processed_mask: ImageU8,
        annotated: ImageRgb8,
        mut trace: PipelineTrace,
        total_start: Instant,
    ) -> DetectReport {
        let latency_ms = ms_since(total_start);
        trace.total_ms = latency_ms;
        DetectReport {
            result: CountResult {
                count: 0,
                threshold,
                roi: roi_rect,
                boxes: Vec::new(),
                latency_ms,
            },
            processed_mask,
            annotated,
            trace,
        }
    }
}

/// Convenience wrapper: one-shot detection with the given parameters.
pub fn detect(input: &ImageRgb8, params: DetectParams) -> Result<DetectReport, DetectError> {
    StackDetector::new(params).process(input)
}

#[inline]
fn ms_since(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
