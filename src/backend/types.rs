//! Wire types of the modulation service.
//!
//! Field names follow the service's JSON exactly (`Vp`, `fp`, `tipo`,
//! `señal`, ...). Responses are converted into sample sequences before they
//! reach a display, which is where mismatched array lengths are caught.

use serde::{Deserialize, Serialize};

use crate::dsp::{DigitalSample, SampleSequence};
use crate::error::{ScopeError, ScopeResult};

/// Analog modulation scheme.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AnalogKind {
    #[default]
    Am,
    Fm,
    Pm,
}

impl AnalogKind {
    pub fn name(&self) -> &'static str {
        match self {
            AnalogKind::Am => "AM",
            AnalogKind::Fm => "FM",
            AnalogKind::Pm => "PM",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            AnalogKind::Am => "Amplitude Modulation (AM)",
            AnalogKind::Fm => "Frequency Modulation (FM)",
            AnalogKind::Pm => "Phase Modulation (PM)",
        }
    }

    pub fn all() -> &'static [AnalogKind] {
        &[AnalogKind::Am, AnalogKind::Fm, AnalogKind::Pm]
    }
}

/// Digital keying scheme.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DigitalKind {
    #[default]
    Ask,
    Fsk,
    Psk,
}

impl DigitalKind {
    pub fn name(&self) -> &'static str {
        match self {
            DigitalKind::Ask => "ASK",
            DigitalKind::Fsk => "FSK",
            DigitalKind::Psk => "PSK",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            DigitalKind::Ask => "Amplitude Shift Keying (ASK)",
            DigitalKind::Fsk => "Frequency Shift Keying (FSK)",
            DigitalKind::Psk => "Phase Shift Keying (PSK)",
        }
    }

    pub fn all() -> &'static [DigitalKind] {
        &[DigitalKind::Ask, DigitalKind::Fsk, DigitalKind::Psk]
    }
}

/// Request for an AM/FM/PM waveform.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalogRequest {
    /// Carrier peak voltage.
    #[serde(rename = "Vp")]
    pub carrier_amplitude: f64,
    /// Carrier frequency in Hz.
    #[serde(rename = "fp")]
    pub carrier_frequency: f64,
    /// Modulating frequency in Hz. Must stay below the carrier frequency.
    #[serde(rename = "fm")]
    pub modulating_frequency: f64,
    /// Modulation index.
    #[serde(rename = "m")]
    pub modulation_index: f64,
    #[serde(rename = "tipo")]
    pub kind: AnalogKind,
}

impl AnalogRequest {
    /// Build a request from the two oscilloscope parameter sets. The
    /// modulation index is the modulating/carrier amplitude ratio.
    pub fn from_signals(
        carrier: &crate::dsp::SignalParameters,
        modulating: &crate::dsp::SignalParameters,
        kind: AnalogKind,
    ) -> Self {
        let modulation_index = if carrier.amplitude > 0.0 {
            modulating.amplitude / carrier.amplitude
        } else {
            0.0
        };
        Self {
            carrier_amplitude: carrier.amplitude,
            carrier_frequency: carrier.frequency,
            modulating_frequency: modulating.frequency,
            modulation_index,
            kind,
        }
    }
}

/// Analog service reply: a time axis and the modulated amplitude.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalogResponse {
    pub t: Vec<f64>,
    #[serde(rename = "señal")]
    pub signal: Vec<f64>,
}

impl AnalogResponse {
    pub fn into_sequence(self) -> ScopeResult<SampleSequence> {
        SampleSequence::from_arrays(self.t, self.signal)
    }
}

/// Request for an ASK/FSK/PSK waveform.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DigitalRequest {
    #[serde(rename = "Vp")]
    pub carrier_amplitude: f64,
    #[serde(rename = "fp")]
    pub carrier_frequency: f64,
    #[serde(rename = "tipo")]
    pub kind: DigitalKind,
    /// Bits as typed by the user; anything but `0`/`1` is ignored.
    pub bit_sequence: String,
    /// FSK frequency for a `0` bit. Defaults to `0.8 * fp`.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub fp_low: Option<f64>,
    /// FSK frequency for a `1` bit. Defaults to `1.2 * fp`.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub fp_high: Option<f64>,
}

impl Default for DigitalRequest {
    fn default() -> Self {
        Self {
            carrier_amplitude: 5.0,
            carrier_frequency: 1000.0,
            kind: DigitalKind::Ask,
            bit_sequence: "10110010".to_string(),
            fp_low: Some(800.0),
            fp_high: Some(1200.0),
        }
    }
}

/// Keep only the `0`/`1` characters of user input.
pub fn filter_bits(input: &str) -> String {
    input.chars().filter(|c| matches!(c, '0' | '1')).collect()
}

/// Digital service reply.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DigitalResponse {
    pub t: Vec<f64>,
    #[serde(rename = "portadora")]
    pub carrier: Vec<f64>,
    #[serde(rename = "moduladora")]
    pub modulating: Vec<f64>,
    #[serde(rename = "modulada")]
    pub modulated: Vec<f64>,
    pub bit_sequence: Vec<u8>,
}

/// A digital reply split into displayable signals.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DigitalSignals {
    pub carrier: SampleSequence,
    pub bits: Vec<DigitalSample>,
    pub modulated: SampleSequence,
    pub bit_sequence: Vec<u8>,
}

impl DigitalResponse {
    pub fn into_signals(self) -> ScopeResult<DigitalSignals> {
        let bits = DigitalSample::from_arrays(&self.t, &self.modulating)?;
        let modulated = SampleSequence::from_arrays(self.t.clone(), self.modulated)?;
        let carrier = SampleSequence::from_arrays(self.t, self.carrier)?;
        Ok(DigitalSignals {
            carrier,
            bits,
            modulated,
            bit_sequence: self.bit_sequence,
        })
    }
}

/// Error payload returned alongside HTTP 400.
#[derive(Clone, Debug, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl From<ErrorBody> for ScopeError {
    fn from(body: ErrorBody) -> Self {
        ScopeError::Backend(body.error)
    }
}
