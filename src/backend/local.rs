//! In-process modulation math.
//!
//! Produces the same payloads as the remote service: 0.2 s of signal,
//! sampled at 5 kHz for analog schemes and 10 kHz for digital ones.

use std::f64::consts::{PI, TAU};

use async_trait::async_trait;

use super::types::{
    filter_bits, AnalogKind, AnalogRequest, AnalogResponse, DigitalKind, DigitalRequest,
    DigitalResponse,
};
use super::ModulationBackend;
use crate::error::{ScopeError, ScopeResult};

/// Length of every generated signal, in seconds.
pub const SIGNAL_DURATION: f64 = 0.2;
pub const ANALOG_SAMPLE_RATE: f64 = 5000.0;
pub const DIGITAL_SAMPLE_RATE: f64 = 10_000.0;
/// Used when the requested bit string has no `0`/`1` characters.
pub const DEFAULT_BITS: [u8; 8] = [1, 0, 1, 1, 0, 0, 1, 0];
/// FM deviation multiplier applied to the modulation index.
const FM_BETA_SCALE: f64 = 5.0;

/// Time axis `0, 1/fs, 2/fs, ...` strictly below `duration`.
fn time_axis(duration: f64, sample_rate: f64) -> Vec<f64> {
    let count = (duration * sample_rate).ceil() as usize;
    (0..count)
        .map(|i| i as f64 / sample_rate)
        .filter(|&t| t < duration)
        .collect()
}

/// Rectangular bit signal: bit `i` covers `[i*d, (i+1)*d)` with
/// `d = duration / bits.len()`.
fn bit_signal(t: &[f64], bits: &[u8], duration: f64) -> Vec<f64> {
    let mut signal = vec![0.0; t.len()];
    if bits.is_empty() {
        return signal;
    }
    let bit_duration = duration / bits.len() as f64;

    for (i, &bit) in bits.iter().enumerate() {
        let start_time = i as f64 * bit_duration;
        let end_time = (i + 1) as f64 * bit_duration;
        let Some(start) = t.iter().position(|&x| x >= start_time) else {
            continue;
        };
        let end = if end_time < duration {
            t.iter().position(|&x| x >= end_time).unwrap_or(t.len())
        } else {
            t.len()
        };
        for value in &mut signal[start..end] {
            *value = f64::from(bit);
        }
    }
    signal
}

fn parse_bits(input: &str) -> Vec<u8> {
    let bits: Vec<u8> = filter_bits(input)
        .bytes()
        .map(|b| if b == b'1' { 1 } else { 0 })
        .collect();
    if bits.is_empty() {
        DEFAULT_BITS.to_vec()
    } else {
        bits
    }
}

/// Evaluates modulation formulas locally.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalBackend;

impl LocalBackend {
    pub fn new() -> Self {
        Self
    }

    pub fn compute_analog(request: &AnalogRequest) -> ScopeResult<AnalogResponse> {
        let vp = request.carrier_amplitude;
        let fp = request.carrier_frequency;
        let fm = request.modulating_frequency;
        let m = request.modulation_index;

        if fm >= fp {
            return Err(ScopeError::InvalidParameters(format!(
                "modulating frequency ({} Hz) must be below the carrier frequency ({} Hz)",
                fm, fp
            )));
        }

        let t = time_axis(SIGNAL_DURATION, ANALOG_SAMPLE_RATE);
        let signal = t
            .iter()
            .map(|&t| match request.kind {
                AnalogKind::Am => {
                    vp * (TAU * fp * t).sin() + (m * vp / 2.0) * (TAU * (fp - fm) * t).cos()
                        - (m * vp / 2.0) * (TAU * (fp + fm) * t).cos()
                }
                AnalogKind::Fm => {
                    let beta = m * FM_BETA_SCALE;
                    vp * (TAU * fp * t + beta * (TAU * fm * t).sin()).sin()
                }
                AnalogKind::Pm => vp * (TAU * fp * t + m * (TAU * fm * t).sin()).sin(),
            })
            .collect();

        Ok(AnalogResponse { t, signal })
    }

    pub fn compute_digital(request: &DigitalRequest) -> ScopeResult<DigitalResponse> {
        let vp = request.carrier_amplitude;
        let fp = request.carrier_frequency;
        if !(vp.is_finite() && fp.is_finite()) {
            return Err(ScopeError::InvalidParameters(format!(
                "carrier must be finite (Vp={}, fp={})",
                vp, fp
            )));
        }
        let fp_low = request.fp_low.unwrap_or(fp * 0.8);
        let fp_high = request.fp_high.unwrap_or(fp * 1.2);
        let bit_sequence = parse_bits(&request.bit_sequence);

        let t = time_axis(SIGNAL_DURATION, DIGITAL_SAMPLE_RATE);
        let modulating = bit_signal(&t, &bit_sequence, SIGNAL_DURATION);
        let carrier: Vec<f64> = t.iter().map(|&t| vp * (TAU * fp * t).sin()).collect();

        let modulated = t
            .iter()
            .zip(&carrier)
            .zip(&modulating)
            .map(|((&t, &c), &bit)| match request.kind {
                DigitalKind::Ask => c * bit,
                DigitalKind::Fsk => {
                    let low = vp * (TAU * fp_low * t).sin();
                    let high = vp * (TAU * fp_high * t).sin();
                    low * (1.0 - bit) + high * bit
                }
                DigitalKind::Psk => vp * (TAU * fp * t + PI * bit).sin(),
            })
            .collect();

        Ok(DigitalResponse {
            t,
            carrier,
            modulating,
            modulated,
            bit_sequence,
        })
    }
}

#[async_trait]
impl ModulationBackend for LocalBackend {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn analog(&self, request: &AnalogRequest) -> ScopeResult<AnalogResponse> {
        Self::compute_analog(request)
    }

    async fn digital(&self, request: &DigitalRequest) -> ScopeResult<DigitalResponse> {
        Self::compute_digital(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analog(kind: AnalogKind) -> AnalogRequest {
        AnalogRequest {
            carrier_amplitude: 5.0,
            carrier_frequency: 300.0,
            modulating_frequency: 20.0,
            modulation_index: 0.6,
            kind,
        }
    }

    #[test]
    fn test_time_axis_lengths() {
        assert_eq!(time_axis(SIGNAL_DURATION, ANALOG_SAMPLE_RATE).len(), 1000);
        assert_eq!(time_axis(SIGNAL_DURATION, DIGITAL_SAMPLE_RATE).len(), 2000);
        let t = time_axis(SIGNAL_DURATION, ANALOG_SAMPLE_RATE);
        assert_eq!(t[0], 0.0);
        assert!(*t.last().unwrap() < SIGNAL_DURATION);
    }

    #[test]
    fn test_am_formula() {
        let response = LocalBackend::compute_analog(&analog(AnalogKind::Am)).unwrap();
        assert_eq!(response.t.len(), response.signal.len());
        // At t = 0: sin terms vanish, cos terms cancel.
        assert!(response.signal[0].abs() < 1e-12);

        let t = response.t[7];
        let expected = 5.0 * (TAU * 300.0 * t).sin() + 1.5 * (TAU * 280.0 * t).cos()
            - 1.5 * (TAU * 320.0 * t).cos();
        assert!((response.signal[7] - expected).abs() < 1e-9);
    }

    #[test]
    fn test_fm_and_pm_stay_within_amplitude() {
        for kind in [AnalogKind::Fm, AnalogKind::Pm] {
            let response = LocalBackend::compute_analog(&analog(kind)).unwrap();
            assert!(response.signal.iter().all(|v| v.abs() <= 5.0 + 1e-9));
        }
    }

    #[test]
    fn test_fm_uses_scaled_index() {
        let response = LocalBackend::compute_analog(&analog(AnalogKind::Fm)).unwrap();
        let t = response.t[3];
        let expected = 5.0 * (TAU * 300.0 * t + 3.0 * (TAU * 20.0 * t).sin()).sin();
        assert!((response.signal[3] - expected).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_modulating_above_carrier() {
        let mut request = analog(AnalogKind::Am);
        request.modulating_frequency = 300.0;
        assert!(matches!(
            LocalBackend::compute_analog(&request),
            Err(ScopeError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_bit_signal_spans() {
        let t = time_axis(SIGNAL_DURATION, DIGITAL_SAMPLE_RATE);
        let signal = bit_signal(&t, &[1, 0], SIGNAL_DURATION);
        assert_eq!(signal[0], 1.0);
        assert_eq!(signal[999], 1.0);
        assert_eq!(signal[1000], 0.0);
        assert_eq!(*signal.last().unwrap(), 0.0);
    }

    #[test]
    fn test_ask_is_carrier_times_bits() {
        let request = DigitalRequest {
            bit_sequence: "10".into(),
            ..Default::default()
        };
        let response = LocalBackend::compute_digital(&request).unwrap();
        assert_eq!(response.bit_sequence, vec![1, 0]);
        for i in [5, 500, 1500] {
            let expected = response.carrier[i] * response.modulating[i];
            assert!((response.modulated[i] - expected).abs() < 1e-12);
        }
        assert!(response.modulated[1500].abs() < 1e-12);
    }

    #[test]
    fn test_psk_inverts_on_zero_bit() {
        let request = DigitalRequest {
            kind: DigitalKind::Psk,
            bit_sequence: "01".into(),
            ..Default::default()
        };
        let response = LocalBackend::compute_digital(&request).unwrap();
        // First half carries bit 0: unshifted carrier.
        assert!((response.modulated[3] - response.carrier[3]).abs() < 1e-9);
        // Second half carries bit 1: inverted carrier.
        assert!((response.modulated[1503] + response.carrier[1503]).abs() < 1e-9);
    }

    #[test]
    fn test_fsk_default_frequencies() {
        let request = DigitalRequest {
            kind: DigitalKind::Fsk,
            bit_sequence: "1".into(),
            fp_low: None,
            fp_high: None,
            ..Default::default()
        };
        let response = LocalBackend::compute_digital(&request).unwrap();
        let t = response.t[11];
        let expected = 5.0 * (TAU * 1200.0 * t).sin();
        assert!((response.modulated[11] - expected).abs() < 1e-9);
    }

    #[test]
    fn test_empty_bits_fall_back_to_default() {
        let request = DigitalRequest {
            bit_sequence: "abc".into(),
            ..Default::default()
        };
        let response = LocalBackend::compute_digital(&request).unwrap();
        assert_eq!(response.bit_sequence, DEFAULT_BITS.to_vec());
    }
}
