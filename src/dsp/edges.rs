//! Digital edge expansion.
//!
//! A line renderer joins consecutive points with straight segments, so a
//! bit stream sampled as `(t, level)` would show slanted transitions. The
//! expander inserts a point just before each transition that holds the old
//! level, which turns every slant into a vertical edge.

use super::signal::{DigitalSample, SampleSequence};

/// Offset before a transition at which the previous level is held.
///
/// Fixed, not scaled to the visible window. Time scales in this tool are
/// fractions of a second, so a microsecond is invisible on screen while
/// still keeping `t` strictly increasing.
pub const EDGE_EPSILON: f64 = 1e-6;

/// Number of level changes in `samples`.
pub fn transition_count(samples: &[DigitalSample]) -> usize {
    samples
        .windows(2)
        .filter(|pair| pair[0].level != pair[1].level)
        .count()
}

/// Expand a piecewise-constant signal into a step-accurate polyline.
///
/// Output length is `samples.len() + transition_count(samples)`. An empty
/// input yields an empty sequence.
pub fn expand(samples: &[DigitalSample]) -> SampleSequence {
    let mut out = SampleSequence::with_capacity(samples.len() + transition_count(samples));

    let mut previous: Option<&DigitalSample> = None;
    for sample in samples {
        if let Some(prev) = previous.filter(|prev| prev.level != sample.level) {
            out.push(sample.t - EDGE_EPSILON, prev.level.as_f64());
        }
        out.push(sample.t, sample.level.as_f64());
        previous = Some(sample);
    }

    out
}
