//! Structured per-stage diagnostics collected during a pipeline run.
//!
//! Every stage records its headline numbers and wall time; the demo tools
//! serialize the trace next to the count so parameter tuning can see where
//! foreground was lost or where a short-circuit ended the run.

use crate::types::RectPx;
use serde::Serialize;

#[derive(Clone, Debug, Serialize)]
pub struct PreprocessDiagnostics {
    pub input_width: usize,
    pub input_height: usize,
    pub working_width: usize,
    pub working_height: usize,
    pub clahe_applied: bool,
    pub elapsed_ms: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct RoiDiagnostics {
    pub rect: RectPx,
    pub elapsed_ms: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct BinarizeDiagnostics {
    pub threshold: u8,
    pub foreground_px: usize,
    pub elapsed_ms: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct MorphologyDiagnostics {
    pub foreground_px: usize,
    pub elapsed_ms: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct MarkerDiagnostics {
    pub seed_count: usize,
    pub distance_max: f32,
    pub unknown_px: usize,
    pub elapsed_ms: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct WatershedDiagnostics {
    pub ridge_px: usize,
    pub region_labels: usize,
    pub elapsed_ms: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct FilterDiagnostics {
    pub candidates: usize,
    pub accepted: usize,
    pub rejected_area: usize,
    pub rejected_box: usize,
    pub degenerate: usize,
    pub elapsed_ms: f64,
}

/// Aggregate trace of one `process` call. Stages after a short-circuit stay
/// `None`; `short_circuit` names the stage that ended the run early.
#[derive(Clone, Debug, Default, Serialize)]
pub struct PipelineTrace {
    pub preprocess: Option<PreprocessDiagnostics>,
    pub roi: Option<RoiDiagnostics>,
    pub binarize: Option<BinarizeDiagnostics>,
    pub morphology: Option<MorphologyDiagnostics>,
    pub markers: Option<MarkerDiagnostics>,
    pub watershed: Option<WatershedDiagnostics>,
    pub filter: Option<FilterDiagnostics>,
    pub short_circuit: Option<&'static str>,
    pub total_ms: f64,
}
