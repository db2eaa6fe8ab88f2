//! Signal types for the sampling engine.
//!
//! Defines the sinusoid parameters, visible time windows, and the sample
//! sequences that flow from the sampler, clipper and edge expander into a
//! display buffer.

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::error::{ScopeError, ScopeResult};

/// Parameters of a sinusoid `y(t) = amplitude * sin(2*pi*frequency*t + phase)`.
///
/// Immutable per sampling call. A change of any field restarts the
/// scrolling display that uses it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SignalParameters {
    /// Peak amplitude (volts on the display).
    pub amplitude: f64,
    /// Frequency in Hz. Zero is legal and yields a constant line.
    pub frequency: f64,
    /// Phase offset in radians.
    pub phase: f64,
}

impl SignalParameters {
    /// Default carrier: 3 V, 50 Hz, no phase offset.
    pub const CARRIER: Self = Self {
        amplitude: 3.0,
        frequency: 50.0,
        phase: 0.0,
    };

    /// Default modulating signal: 3 V, 30 Hz, no phase offset.
    pub const MODULATING: Self = Self {
        amplitude: 3.0,
        frequency: 30.0,
        phase: 0.0,
    };

    /// Create validated parameters.
    pub fn new(amplitude: f64, frequency: f64, phase: f64) -> ScopeResult<Self> {
        let params = Self {
            amplitude,
            frequency,
            phase,
        };
        params.validate()?;
        Ok(params)
    }

    /// Check that amplitude and frequency are finite and non-negative and
    /// that the phase is finite.
    pub fn validate(&self) -> ScopeResult<()> {
        if !self.amplitude.is_finite() || self.amplitude < 0.0 {
            return Err(ScopeError::InvalidParameters(format!(
                "amplitude must be a non-negative number, got {}",
                self.amplitude
            )));
        }
        if !self.frequency.is_finite() || self.frequency < 0.0 {
            return Err(ScopeError::InvalidParameters(format!(
                "frequency must be a non-negative number, got {}",
                self.frequency
            )));
        }
        if !self.phase.is_finite() {
            return Err(ScopeError::InvalidParameters(format!(
                "phase must be finite, got {}",
                self.phase
            )));
        }
        Ok(())
    }

    /// Evaluate the sinusoid at time `t`.
    #[inline]
    pub fn value_at(&self, t: f64) -> f64 {
        self.amplitude * (TAU * self.frequency * t + self.phase).sin()
    }
}

impl Default for SignalParameters {
    fn default() -> Self {
        Self::CARRIER
    }
}

/// The visible x-axis span `[start, end]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: f64,
    pub end: f64,
}

impl TimeWindow {
    /// Create a window, rejecting `end <= start` and non-finite bounds.
    pub fn new(start: f64, end: f64) -> ScopeResult<Self> {
        if !start.is_finite() || !end.is_finite() || end <= start {
            return Err(ScopeError::InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// A window of `duration` beginning at `offset`.
    pub fn starting_at(offset: f64, duration: f64) -> Self {
        Self {
            start: offset,
            end: offset + duration,
        }
    }

    /// Width of the window. Negative for a malformed window.
    #[inline]
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// A single `(t, y)` point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    pub t: f64,
    pub y: f64,
}

/// Ordered `(t, y)` samples stored as parallel arrays.
///
/// `t` is non-decreasing. Both arrays always have the same length, which
/// is what a chart's `append_range(ts, ys)` expects.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SampleSequence {
    t: Vec<f64>,
    y: Vec<f64>,
}

impl SampleSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            t: Vec::with_capacity(capacity),
            y: Vec::with_capacity(capacity),
        }
    }

    /// Build a sequence from backend arrays, rejecting mismatched lengths.
    pub fn from_arrays(t: Vec<f64>, y: Vec<f64>) -> ScopeResult<Self> {
        if t.len() != y.len() {
            return Err(ScopeError::MismatchedLengths {
                t: t.len(),
                y: y.len(),
            });
        }
        Ok(Self { t, y })
    }

    #[inline]
    pub fn push(&mut self, t: f64, y: f64) {
        self.t.push(t);
        self.y.push(y);
    }

    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    pub fn times(&self) -> &[f64] {
        &self.t
    }

    pub fn values(&self) -> &[f64] {
        &self.y
    }

    pub fn get(&self, index: usize) -> Option<Sample> {
        Some(Sample {
            t: *self.t.get(index)?,
            y: *self.y.get(index)?,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = Sample> + '_ {
        self.view().iter()
    }

    /// Borrow the whole sequence.
    pub fn view(&self) -> SampleView<'_> {
        SampleView {
            t: &self.t,
            y: &self.y,
        }
    }
}

/// A borrowed, equal-length `(t, y)` slice pair.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SampleView<'a> {
    t: &'a [f64],
    y: &'a [f64],
}

impl<'a> SampleView<'a> {
    /// Pair up two slices, rejecting mismatched lengths.
    pub fn new(t: &'a [f64], y: &'a [f64]) -> ScopeResult<Self> {
        if t.len() != y.len() {
            return Err(ScopeError::MismatchedLengths {
                t: t.len(),
                y: y.len(),
            });
        }
        Ok(Self { t, y })
    }

    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    pub fn times(&self) -> &'a [f64] {
        self.t
    }

    pub fn values(&self) -> &'a [f64] {
        self.y
    }

    /// The first `len` samples.
    pub fn prefix(&self, len: usize) -> SampleView<'a> {
        let len = len.min(self.t.len());
        SampleView {
            t: &self.t[..len],
            y: &self.y[..len],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Sample> + 'a {
        self.t
            .iter()
            .zip(self.y.iter())
            .map(|(&t, &y)| Sample { t, y })
    }

    pub fn to_sequence(&self) -> SampleSequence {
        SampleSequence {
            t: self.t.to_vec(),
            y: self.y.to_vec(),
        }
    }
}

/// Logic level of a digital sample.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Level {
    #[default]
    Low,
    High,
}

impl Level {
    /// Amplitude drawn for this level.
    pub fn as_f64(self) -> f64 {
        match self {
            Level::Low => 0.0,
            Level::High => 1.0,
        }
    }

    /// Interpret a backend amplitude (`0.0` / `1.0`) as a level.
    pub fn from_f64(value: f64) -> Self {
        if value >= 0.5 {
            Level::High
        } else {
            Level::Low
        }
    }

    pub fn from_bit(bit: bool) -> Self {
        if bit {
            Level::High
        } else {
            Level::Low
        }
    }
}

/// A `(t, level)` point of a piecewise-constant signal. `t` strictly increases.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DigitalSample {
    pub t: f64,
    pub level: Level,
}

impl DigitalSample {
    pub fn new(t: f64, level: Level) -> Self {
        Self { t, level }
    }

    /// Convert backend arrays into digital samples.
    pub fn from_arrays(t: &[f64], levels: &[f64]) -> ScopeResult<Vec<Self>> {
        let view = SampleView::new(t, levels)?;
        Ok(view
            .iter()
            .map(|s| DigitalSample::new(s.t, Level::from_f64(s.y)))
            .collect())
    }
}
