//! Sampled amplitude-vs-time signals and the test signal generator.
//!
//! Amplitudes are expressed in motor steps, not physical units. A
//! [`Waveform`] is always validated on construction: equal lengths, at least
//! two samples, finite values, and non-decreasing time.
//!
//! # Example
//!
//! ```rust
//! use shake_table::waveform::{generate_sine, SineParams};
//!
//! let wave = generate_sine(3, 2.0, 1.0, 1000).unwrap();
//! assert_eq!(wave.len(), 1000);
//! assert_eq!(wave.time()[0], 0.0);
//!
//! // Same thing through the parameter struct
//! let params = SineParams::new(3, 2.0, 1.0).with_sampling_rate(1000);
//! assert_eq!(params.generate().unwrap(), wave);
//! ```

extern crate alloc;
use alloc::vec::Vec;
use core::f64::consts::PI;

use crate::error::ValidationError;

/// Largest signal the generator will allocate (about 160 MB of samples).
pub const MAX_SAMPLES: usize = 10_000_000;

/// Check a pair of sample sequences without taking ownership.
///
/// Shared by [`Waveform::new`] and [`discretize`](crate::discretize::discretize).
pub fn validate(time: &[f64], amplitude: &[f64]) -> Result<(), ValidationError> {
    if time.len() != amplitude.len() {
        return Err(ValidationError::LengthMismatch {
            time: time.len(),
            amplitude: amplitude.len(),
        });
    }
    if time.len() < 2 {
        return Err(ValidationError::TooFewSamples { len: time.len() });
    }
    for (index, (t, a)) in time.iter().zip(amplitude).enumerate() {
        if !t.is_finite() || !a.is_finite() {
            return Err(ValidationError::NonFinite { index });
        }
    }
    if let Some(index) = time.windows(2).position(|w| w[1] < w[0]) {
        return Err(ValidationError::TimeDecreasing { index: index + 1 });
    }
    Ok(())
}

/// A validated waveform: paired time (seconds) and amplitude (steps) samples.
#[derive(Clone, Debug, PartialEq)]
pub struct Waveform {
    time: Vec<f64>,
    amplitude: Vec<f64>,
}

impl Waveform {
    /// Build a waveform, rejecting malformed input.
    pub fn new(time: Vec<f64>, amplitude: Vec<f64>) -> Result<Self, ValidationError> {
        validate(&time, &amplitude)?;
        Ok(Self { time, amplitude })
    }

    /// Sample times in seconds.
    #[inline]
    pub fn time(&self) -> &[f64] {
        &self.time
    }

    /// Sample amplitudes in steps.
    #[inline]
    pub fn amplitude(&self) -> &[f64] {
        &self.amplitude
    }

    /// Number of samples (always at least 2).
    #[inline]
    pub fn len(&self) -> usize {
        self.time.len()
    }

    /// Always false; kept for the usual `len`/`is_empty` pairing.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Time span covered by the samples, in seconds.
    pub fn duration(&self) -> f64 {
        self.time[self.time.len() - 1] - self.time[0]
    }

    /// Net whole-step level change from the first to the last sample.
    ///
    /// `floor(last) - floor(first)`; playback of a densely sampled waveform
    /// ends within one step of this displacement.
    pub fn net_level_change(&self) -> i64 {
        let first = libm::floor(self.amplitude[0]) as i64;
        let last = libm::floor(self.amplitude[self.amplitude.len() - 1]) as i64;
        last - first
    }

    /// Split back into `(time, amplitude)`.
    pub fn into_parts(self) -> (Vec<f64>, Vec<f64>) {
        (self.time, self.amplitude)
    }
}

/// Parameters of a sine test signal.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SineParams {
    /// Peak amplitude in steps
    pub amplitude_steps: i32,
    /// Frequency in Hz
    pub frequency_hz: f64,
    /// Signal length in seconds
    pub duration_s: f64,
    /// Samples per second
    pub sampling_rate_hz: u32,
}

impl Default for SineParams {
    fn default() -> Self {
        Self {
            amplitude_steps: 250,
            frequency_hz: 5.0,
            duration_s: 3.0,
            sampling_rate_hz: 10_000,
        }
    }
}

impl SineParams {
    /// Create parameters with the default sampling rate.
    pub fn new(amplitude_steps: i32, frequency_hz: f64, duration_s: f64) -> Self {
        Self {
            amplitude_steps,
            frequency_hz,
            duration_s,
            ..Default::default()
        }
    }

    /// Set the sampling rate
    pub fn with_sampling_rate(mut self, hz: u32) -> Self {
        self.sampling_rate_hz = hz;
        self
    }

    /// Number of samples the generator will produce.
    pub fn sample_count(&self) -> usize {
        libm::round(self.duration_s * self.sampling_rate_hz as f64) as usize
    }

    /// Check parameter ranges.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.frequency_hz.is_finite() || self.frequency_hz < 0.0 {
            return Err(ValidationError::InvalidParameter {
                name: "frequency",
                reason: "must be finite and non-negative",
            });
        }
        if !self.duration_s.is_finite() || self.duration_s <= 0.0 {
            return Err(ValidationError::InvalidParameter {
                name: "duration",
                reason: "must be finite and positive",
            });
        }
        if self.sampling_rate_hz == 0 {
            return Err(ValidationError::InvalidParameter {
                name: "sampling_rate",
                reason: "must be positive",
            });
        }
        let len = self.sample_count();
        if len > MAX_SAMPLES {
            return Err(ValidationError::InvalidParameter {
                name: "duration",
                reason: "too many samples at this sampling rate",
            });
        }
        if len < 2 {
            return Err(ValidationError::TooFewSamples { len });
        }
        Ok(())
    }

    /// Generate the sampled signal.
    pub fn generate(&self) -> Result<Waveform, ValidationError> {
        self.validate()?;

        let n = self.sample_count();
        let amplitude = self.amplitude_steps as f64;
        let omega = 2.0 * PI * self.frequency_hz;

        // Evenly spaced over [0, duration), end point excluded
        let time: Vec<f64> = (0..n)
            .map(|i| i as f64 * self.duration_s / n as f64)
            .collect();
        let samples = time
            .iter()
            .map(|&t| amplitude * libm::sin(omega * t))
            .collect();

        Waveform::new(time, samples)
    }
}

/// Sample `amplitude_steps * sin(2π·frequency_hz·t)` at a fixed rate.
///
/// Produces `round(duration_s * sampling_rate_hz)` samples starting at
/// `t = 0` and stopping one sample period short of `duration_s`.
pub fn generate_sine(
    amplitude_steps: i32,
    frequency_hz: f64,
    duration_s: f64,
    sampling_rate_hz: u32,
) -> Result<Waveform, ValidationError> {
    SineParams {
        amplitude_steps,
        frequency_hz,
        duration_s,
        sampling_rate_hz,
    }
    .generate()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn validate_rejects_length_mismatch() {
        let err = validate(&[0.0, 1.0, 2.0], &[0.0, 1.0]).unwrap_err();
        assert_eq!(
            err,
            ValidationError::LengthMismatch {
                time: 3,
                amplitude: 2
            }
        );
    }

    #[test]
    fn validate_rejects_short_input() {
        assert_eq!(
            validate(&[0.0], &[1.0]),
            Err(ValidationError::TooFewSamples { len: 1 })
        );
        assert_eq!(
            validate(&[], &[]),
            Err(ValidationError::TooFewSamples { len: 0 })
        );
    }

    #[test]
    fn validate_rejects_nan_and_backwards_time() {
        assert_eq!(
            validate(&[0.0, 1.0, 2.0], &[0.0, f64::NAN, 1.0]),
            Err(ValidationError::NonFinite { index: 1 })
        );
        assert_eq!(
            validate(&[0.0, 2.0, 1.0], &[0.0, 1.0, 2.0]),
            Err(ValidationError::TimeDecreasing { index: 2 })
        );
    }

    #[test]
    fn validate_allows_repeated_times() {
        assert!(validate(&[0.0, 1.0, 1.0, 2.0], &[0.0, 1.0, 2.0, 3.0]).is_ok());
    }

    #[test]
    fn net_level_change_uses_floor() {
        let w = Waveform::new(vec![0.0, 1.0, 2.0], vec![0.0, 2.5, -0.2]).unwrap();
        assert_eq!(w.net_level_change(), -1);

        let w = Waveform::new(vec![0.0, 1.0], vec![0.4, 3.9]).unwrap();
        assert_eq!(w.net_level_change(), 3);
    }

    #[test]
    fn sine_sample_layout() {
        let w = generate_sine(10, 1.0, 2.0, 100).unwrap();
        assert_eq!(w.len(), 200);
        assert_eq!(w.time()[0], 0.0);
        assert_eq!(w.amplitude()[0], 0.0);
        // End point excluded
        assert!((w.time()[199] - 1.99).abs() < 1e-9);
        // Quarter period of a 1 Hz sine peaks at the amplitude
        assert!((w.amplitude()[25] - 10.0).abs() < 1e-9);
        assert!((w.duration() - 1.99).abs() < 1e-9);
    }

    #[test]
    fn sine_defaults_match_request_defaults() {
        let p = SineParams::default();
        assert_eq!(p.amplitude_steps, 250);
        assert_eq!(p.frequency_hz, 5.0);
        assert_eq!(p.duration_s, 3.0);
        assert_eq!(p.sampling_rate_hz, 10_000);
        assert_eq!(p.sample_count(), 30_000);
    }

    #[test]
    fn sine_rejects_bad_parameters() {
        assert!(matches!(
            generate_sine(5, f64::NAN, 1.0, 100),
            Err(ValidationError::InvalidParameter {
                name: "frequency",
                ..
            })
        ));
        assert!(matches!(
            generate_sine(5, 1.0, 0.0, 100),
            Err(ValidationError::InvalidParameter {
                name: "duration",
                ..
            })
        ));
        assert!(matches!(
            generate_sine(5, 1.0, 1.0, 0),
            Err(ValidationError::InvalidParameter {
                name: "sampling_rate",
                ..
            })
        ));
        assert_eq!(
            generate_sine(5, 1.0, 0.001, 1000),
            Err(ValidationError::TooFewSamples { len: 1 })
        );
    }

    #[test]
    fn sine_rejects_oversized_signals() {
        // One day at 10 kHz would need ~14 GB
        let params = SineParams::new(5, 1.0, 86_400.0);
        assert_eq!(
            params.validate(),
            Err(ValidationError::InvalidParameter {
                name: "duration",
                reason: "too many samples at this sampling rate",
            })
        );
        assert!(SineParams::new(5, 1.0, 1e300).generate().is_err());

        // Exactly at the limit is still accepted
        let params = SineParams::new(5, 1.0, 1000.0).with_sampling_rate(10_000);
        assert_eq!(params.sample_count(), MAX_SAMPLES);
        assert!(params.validate().is_ok());
    }
}
