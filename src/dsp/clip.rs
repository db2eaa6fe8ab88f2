//! Visible-range clipping.
//!
//! The backend computes its signals over a fixed analysis duration. The
//! static displays only show a leading window of that data, which keeps the
//! trace readable and bounds the rendering cost.

use super::signal::SampleView;

/// Return the longest prefix of `samples` with `t < x_max`.
///
/// Assumes non-decreasing `t`. When every sample lies below `x_max` the
/// whole input is returned; when the first sample is already at or past
/// `x_max` the result is empty rather than a fallback to the whole
/// input.
pub fn clip(samples: SampleView<'_>, x_max: f64) -> SampleView<'_> {
    let end = samples
        .times()
        .iter()
        .position(|&t| t >= x_max)
        .unwrap_or(samples.len());
    samples.prefix(end)
}
