#![doc = include_str!("../README.md")]

// Public modules (stable-ish surface)
pub mod detector;
pub mod diagnostics;
pub mod error;
pub mod image;
pub mod types;

// “Expert” modules – still public, but considered unstable internals.
// (You can tighten or feature-gate these later.)
pub mod binarize;
pub mod distance;
pub mod draw;
pub mod gradient;
pub mod labels;
pub mod markers;
pub mod morphology;
pub mod preprocess;
pub mod regions;
pub mod roi;
pub mod watershed;

// --- High-level re-exports -------------------------------------------------

// Main entry points: detector + results.
pub use crate::detector::{detect, DetectParams, DetectReport, StackDetector};
pub use crate::error::DetectError;
pub use crate::types::{CountResult, RectPx};

// High-level diagnostics returned by the detector.
pub use crate::diagnostics::PipelineTrace;

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use stack_counter::prelude::*;
///
/// # fn main() {
/// let color = ImageRgb8::new(640, 480);
/// let detector = StackDetector::new(DetectParams::default());
/// match detector.process(&color) {
///     Ok(report) => println!(
///         "count={} latency_ms={:.3}",
///         report.result.count, report.result.latency_ms
///     ),
///     Err(err) => eprintln!("{err}"),
/// }
/// # }
/// ```
pub mod prelude {
    pub use crate::image::{ImageRgb8, ImageU8};
    pub use crate::{CountResult, DetectError, DetectParams, DetectReport, StackDetector};
}

// --- Stage-level API (for tools & advanced users) --------------------------

pub mod stages {
    // Stage entry points, in pipeline order.
    pub use crate::preprocess::{preprocess, Preprocessed};
    pub use crate::binarize::binarize;
    pub use crate::morphology::refine_mask;
    pub use crate::roi::{select_roi, RoiSelection};
    pub use crate::markers::{generate_markers, MarkerMaps};
    pub use crate::watershed::watershed;
    pub use crate::regions::{filter_regions, FilterOutcome};

    // Structured stage options.
    pub use crate::binarize::BinarizeOptions;
    pub use crate::markers::MarkerOptions;
    pub use crate::morphology::MorphOptions;
    pub use crate::preprocess::{ClaheOptions, PreprocessOptions};
    pub use crate::regions::{AreaBounds, FilterOptions, Region};
    pub use crate::roi::RoiOptions;
}
