//! DSP module
//!
//! Pure sampling functions behind the oscilloscope displays: the waveform
//! sampler, the digital edge expander and the visible-range clipper.
//! Everything here is synchronous and free of shared state, so it can be
//! called from a timer tick without coordination.

pub mod clip;
pub mod edges;
pub mod sampler;
pub mod signal;

pub use clip::clip;
pub use edges::{expand, transition_count, EDGE_EPSILON};
pub use sampler::{sample, SamplingPolicy, MAX_TOTAL_POINTS};
pub use signal::{
    DigitalSample, Level, Sample, SampleSequence, SampleView, SignalParameters, TimeWindow,
};
