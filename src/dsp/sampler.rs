//! Waveform sampler.
//!
//! Turns a time window and a set of sinusoid parameters into a sample
//! sequence dense enough to draw without visible aliasing. The point count
//! grows with the number of cycles in the window so a 5 kHz carrier and a
//! 30 Hz modulating signal both look smooth in the same 0.1 s window.

use serde::{Deserialize, Serialize};

use super::signal::{SampleSequence, SignalParameters, TimeWindow};

/// Upper bound on points per call. Keeps a runaway frequency from
/// allocating an unbounded buffer on the tick path.
pub const MAX_TOTAL_POINTS: usize = 1 << 21;

/// Sample-density policy for the sampler.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingPolicy {
    /// Minimum number of points drawn per signal cycle.
    pub min_points_per_cycle: f64,
    /// Absolute floor on the number of intervals in a window.
    pub min_total_points: usize,
}

impl SamplingPolicy {
    pub const DEFAULT_MIN_POINTS_PER_CYCLE: f64 = 20.0;
    pub const DEFAULT_MIN_TOTAL_POINTS: usize = 1000;

    /// Number of intervals used for `window` at `frequency`.
    ///
    /// `max(min_total_points, ceil(min_points_per_cycle * cycles))`. A
    /// malformed window or non-finite frequency falls back to the floor.
    pub fn point_count(&self, window: TimeWindow, frequency: f64) -> usize {
        let floor = self.min_total_points.max(1);
        let duration = window.duration();
        if !duration.is_finite() || duration <= 0.0 {
            return floor;
        }

        let cycles = (frequency * duration).abs();
        let wanted = (self.min_points_per_cycle * cycles).ceil();
        if !wanted.is_finite() {
            return floor;
        }

        // `as` saturates, so a huge `wanted` lands on the cap below
        (wanted as usize).clamp(floor, MAX_TOTAL_POINTS.max(floor))
    }

    /// Sample `params` over the closed interval `[window.start, window.end]`.
    ///
    /// Returns `point_count + 1` samples. The first sample sits exactly on
    /// `window.start` and the last exactly on `window.end`.
    pub fn sample(&self, window: TimeWindow, params: &SignalParameters) -> SampleSequence {
        let total_points = self.point_count(window, params.frequency);
        let duration = window.duration();
        let time_step = if duration.is_finite() && duration > 0.0 {
            duration / total_points as f64
        } else {
            0.0
        };

        let mut samples = SampleSequence::with_capacity(total_points + 1);
        for i in 0..total_points {
            let t = window.start + i as f64 * time_step;
            samples.push(t, params.value_at(t));
        }

        // Pin the closing sample to the window edge so accumulated rounding
        // never leaves a gap at the right side of the trace.
        let t_end = if time_step > 0.0 { window.end } else { window.start };
        samples.push(t_end, params.value_at(t_end));

        samples
    }
}

impl Default for SamplingPolicy {
    fn default() -> Self {
        Self {
            min_points_per_cycle: Self::DEFAULT_MIN_POINTS_PER_CYCLE,
            min_total_points: Self::DEFAULT_MIN_TOTAL_POINTS,
        }
    }
}

/// Sample with the default policy (20 points per cycle, floor of 1000).
pub fn sample(window: TimeWindow, params: &SignalParameters) -> SampleSequence {
    SamplingPolicy::default().sample(window, params)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(start: f64, end: f64) -> TimeWindow {
        TimeWindow::new(start, end).unwrap()
    }

    #[test]
    fn test_low_frequency_uses_floor() {
        let params = SignalParameters::new(3.0, 50.0, 0.0).unwrap();
        let samples = sample(window(0.0, 0.1), &params);
        // 50 Hz * 0.1 s * 20 = 100 < 1000
        assert_eq!(samples.len(), 1001);
    }

    #[test]
    fn test_high_frequency_scales_density() {
        let params = SignalParameters::new(1.0, 5000.0, 0.0).unwrap();
        let samples = sample(window(0.0, 0.1), &params);
        // 5000 Hz * 0.1 s = 500 cycles, 20 points each
        assert_eq!(samples.len(), 10_001);
    }

    #[test]
    fn test_point_count_lower_bound() {
        let policy = SamplingPolicy::default();
        for &frequency in &[1.0, 10.0, 55.5, 440.0, 1000.0, 7919.0, 20_000.0] {
            for &duration in &[0.001, 0.05, 0.1, 0.2, 1.0] {
                let w = window(0.3, 0.3 + duration);
                let params = SignalParameters::new(1.0, frequency, 0.0).unwrap();
                let count = policy.sample(w, &params).len();
                let bound = (20.0 * frequency * duration).max(1000.0);
                assert!(
                    count as f64 >= bound,
                    "f={} d={} produced {} points, expected >= {}",
                    frequency,
                    duration,
                    count,
                    bound
                );
            }
        }
    }

    #[test]
    fn test_times_strictly_increasing_and_span_window() {
        let params = SignalParameters::new(2.0, 733.0, 0.4).unwrap();
        let w = window(0.137, 0.237);
        let samples = sample(w, &params);
        let times = samples.times();

        assert_eq!(times[0], w.start);
        assert_eq!(*times.last().unwrap(), w.end);
        assert!(times.windows(2).all(|pair| pair[1] > pair[0]));
    }

    #[test]
    fn test_zero_frequency_is_constant() {
        let params = SignalParameters::new(5.0, 0.0, 0.0).unwrap();
        let samples = sample(window(0.0, 0.1), &params);
        assert_eq!(samples.len(), 1001);
        assert!(samples.values().iter().all(|y| y.abs() < 1e-12));

        let shifted = SignalParameters::new(2.0, 0.0, std::f64::consts::FRAC_PI_2).unwrap();
        let samples = sample(window(0.0, 0.1), &shifted);
        assert!(samples.values().iter().all(|y| (y - 2.0).abs() < 1e-12));
    }

    #[test]
    fn test_values_follow_equation() {
        let params = SignalParameters::new(3.0, 50.0, 0.25).unwrap();
        let samples = sample(window(0.0, 0.1), &params);
        for s in samples.iter() {
            let expected = 3.0 * (2.0 * std::f64::consts::PI * 50.0 * s.t + 0.25).sin();
            assert!((s.y - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn test_sampling_is_deterministic() {
        let params = SignalParameters::new(1.7, 1234.5, 1.1).unwrap();
        let w = window(0.042, 0.142);
        let a = sample(w, &params);
        let b = sample(w, &params);
        assert_eq!(a.len(), b.len());
        for (x, y) in a.times().iter().zip(b.times()) {
            assert_eq!(x.to_bits(), y.to_bits());
        }
        for (x, y) in a.values().iter().zip(b.values()) {
            assert_eq!(x.to_bits(), y.to_bits());
        }
    }

    #[test]
    fn test_malformed_window_falls_back_to_floor() {
        let params = SignalParameters::new(1.0, 100.0, 0.0).unwrap();
        let inverted = TimeWindow { start: 0.2, end: 0.1 };
        let samples = sample(inverted, &params);
        assert_eq!(samples.len(), 1001);
        assert!(samples.times().iter().all(|t| t.is_finite()));
    }

    #[test]
    fn test_custom_policy() {
        let policy = SamplingPolicy {
            min_points_per_cycle: 40.0,
            min_total_points: 10,
        };
        let w = window(0.0, 1.0);
        assert_eq!(policy.point_count(w, 2.0), 80);
        assert_eq!(policy.point_count(w, 0.0), 10);
    }

    #[test]
    fn test_point_count_is_capped() {
        let policy = SamplingPolicy::default();
        assert_eq!(policy.point_count(window(0.0, 1.0), 1e300), MAX_TOTAL_POINTS);
        assert_eq!(policy.point_count(window(0.0, 0.1), 2e7), MAX_TOTAL_POINTS);
    }

    #[test]
    fn test_density_holds_up_to_cap() {
        let policy = SamplingPolicy::default();
        // 0.1 s windows, from the slider range up to just below the cap.
        for frequency in [5_000.0, 100_000.0, 1_000_000.0, 1_040_000.0] {
            let count = policy.point_count(window(0.0, 0.1), frequency);
            let required = (20.0 * frequency * 0.1).ceil().max(1000.0) as usize;
            assert!(count >= required, "{} Hz: {} < {}", frequency, count, required);
        }
    }
}
