//! Stack detector orchestrating the segmentation-and-counting pipeline.
//!
//! Overview
//! - Normalizes the input (bounded resize, grayscale, optional CLAHE,
//!   Gaussian smoothing).
//! - Thresholds with Otsu's method (inverted polarity by default) and
//!   cleans the mask with an iterated closing and opening.
//! - Optionally scopes everything to the dominant high-saturation blob
//!   (ROI stage) and translates results back to full-frame coordinates.
//! - Seeds one marker per object from the distance-transform interior,
//!   bounds confident background by dilation and leaves the band between
//!   them unknown.
//! - Floods the unknown band with a marker-controlled watershed over the
//!   Sobel gradient relief; basin collisions become ridges.
//! - Filters regions by contour area and box dimensions; each survivor
//!   increments the count and contributes one bounding box.
//!
//! Modules
//! - [`params`] – configuration types used by the detector and the demo
//!   tools.
//! - `pipeline` – the main [`StackDetector`] implementation.
//!
//! Key ideas
//! - Data flows strictly forward; every stage returns a fresh buffer, so
//!   stages stay unit-testable in isolation.
//! - "No foreground" is a result (count 0 with a best-effort mask), not an
//!   error; only invalid inputs and invalid configuration fail.
//! - The flood queue orders on (relief, insertion sequence), which makes
//!   repeated runs bit-identical.

pub mod params;
mod pipeline;

pub use params::DetectParams;
pub use pipeline::{detect, DetectReport, StackDetector};
