//! Modulation Scope Library
//!
//! Core library for the modulation visualizer: waveform sampling, the
//! scrolling oscilloscope engine, modulation backends and the egui shell.

pub mod app;
pub mod backend;
pub mod config;
pub mod display;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod logging;
pub mod widgets;

pub use config::ScopeConfig;
pub use error::{ScopeError, ScopeResult};
