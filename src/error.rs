//! Error surface of the detector.
//!
//! Only hard failures become errors. An image where no foreground survives
//! thresholding or ROI selection is a valid zero-count outcome, and empty
//! region contours after the watershed are skipped and recorded in the
//! pipeline trace — neither path returns `Err`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DetectError {
    /// The input image is empty or has a zero dimension. Raised before any
    /// processing so the resize-ratio computation never divides by zero.
    #[error("invalid input image: {width}x{height}")]
    InvalidImage { width: usize, height: usize },

    /// A parameter is outside its documented valid range.
    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },
}
