//! Custom UI widgets for the modulation scope
//!
//! Oscilloscope-style chart drawing for engine surfaces.

pub mod oscilloscope_display;

pub use oscilloscope_display::{oscilloscope_display, OscilloscopeConfig};
