//! Shared message types for the HTTP boundary.
//!
//! These types are `no_std` compatible and can be deserialized using either
//! `serde_json` (desktop) or `serde-json-core` (embedded).
//!
//! # Example
//!
//! ```
//! use shake_table::messages::{RunSineRequest, RunSineResponse};
//!
//! let req = RunSineRequest { amplitude: 100, ..Default::default() };
//! let params = req.to_sine_params(10_000);
//! assert!(params.validate().is_ok());
//!
//! let resp = RunSineResponse::from(req);
//! assert_eq!(resp.frequency, 5.0);
//! ```
//!
//! On desktop the web layer deserializes with `serde_json`; embedded
//! targets use `parse_sine_request` (feature `serde-json-core`).

extern crate alloc;
use alloc::string::String;

use serde::{Deserialize, Serialize};

use crate::waveform::SineParams;

fn default_amplitude() -> i32 {
    250
}

fn default_frequency() -> f64 {
    5.0
}

fn default_duration() -> f64 {
    3.0
}

// ============================================================================
// Request Types
// ============================================================================

/// Request to run a sine test signal.
///
/// Every field is optional.
///
/// # Fields
///
/// - `amplitude`: Peak amplitude in steps (default 250)
/// - `frequency`: Frequency in Hz (default 5.0)
/// - `duration`: Length in seconds (default 3.0)
///
/// # JSON Examples
///
/// All defaults:
/// ```json
/// {}
/// ```
///
/// Small, slow shake:
/// ```json
/// {"amplitude": 40, "frequency": 0.5, "duration": 10.0}
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunSineRequest {
    /// Peak amplitude in steps
    #[serde(default = "default_amplitude")]
    pub amplitude: i32,
    /// Frequency in Hz
    #[serde(default = "default_frequency")]
    pub frequency: f64,
    /// Signal length in seconds
    #[serde(default = "default_duration")]
    pub duration: f64,
}

impl Default for RunSineRequest {
    fn default() -> Self {
        Self {
            amplitude: default_amplitude(),
            frequency: default_frequency(),
            duration: default_duration(),
        }
    }
}

impl RunSineRequest {
    /// Create a request.
    pub fn new(amplitude: i32, frequency: f64, duration: f64) -> Self {
        Self {
            amplitude,
            frequency,
            duration,
        }
    }

    /// Generator parameters for this request at the given sampling rate.
    pub fn to_sine_params(&self, sampling_rate_hz: u32) -> SineParams {
        SineParams::new(self.amplitude, self.frequency, self.duration)
            .with_sampling_rate(sampling_rate_hz)
    }
}

// ============================================================================
// Response Types
// ============================================================================

/// Outcome tag carried by every response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    /// Request accepted
    Success,
    /// Request rejected
    Error,
}

/// Acknowledgement of a sine request, echoing the accepted parameters.
///
/// ```json
/// {"status": "success", "amplitude": 250, "frequency": 5.0, "duration": 3.0}
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunSineResponse {
    /// Always [`ResponseStatus::Success`]
    pub status: ResponseStatus,
    /// Accepted amplitude in steps
    pub amplitude: i32,
    /// Accepted frequency in Hz
    pub frequency: f64,
    /// Accepted duration in seconds
    pub duration: f64,
}

impl From<RunSineRequest> for RunSineResponse {
    fn from(req: RunSineRequest) -> Self {
        Self {
            status: ResponseStatus::Success,
            amplitude: req.amplitude,
            frequency: req.frequency,
            duration: req.duration,
        }
    }
}

/// Rejection with a human-readable reason.
///
/// ```json
/// {"status": "error", "error": "invalid duration: must be finite and positive"}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Always [`ResponseStatus::Error`]
    pub status: ResponseStatus,
    /// What went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Create an error response.
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Error,
            error: error.into(),
        }
    }
}

// ============================================================================
// Parsing Functions (using serde-json-core for no_std compatibility)
// ============================================================================

/// Parse a sine request from JSON bytes.
///
/// Works in both `std` and `no_std` environments using `serde-json-core`.
///
/// # Example
///
/// ```
/// use shake_table::messages::parse_sine_request;
///
/// let json = br#"{"amplitude": 120, "duration": 1.5}"#;
/// let req = parse_sine_request(json).unwrap();
/// assert_eq!(req.amplitude, 120);
/// assert_eq!(req.frequency, 5.0);
/// assert_eq!(req.duration, 1.5);
/// ```
#[cfg(feature = "serde-json-core")]
pub fn parse_sine_request(json: &[u8]) -> Option<RunSineRequest> {
    serde_json_core::from_slice(json).ok().map(|(req, _)| req)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_defaults() {
        let req = RunSineRequest::default();
        assert_eq!(req.amplitude, 250);
        assert_eq!(req.frequency, 5.0);
        assert_eq!(req.duration, 3.0);
    }

    #[test]
    fn request_to_params() {
        let params = RunSineRequest::new(40, 0.5, 10.0).to_sine_params(2000);
        assert_eq!(params.amplitude_steps, 40);
        assert_eq!(params.frequency_hz, 0.5);
        assert_eq!(params.duration_s, 10.0);
        assert_eq!(params.sampling_rate_hz, 2000);
    }

    #[test]
    fn response_echoes_request() {
        let resp = RunSineResponse::from(RunSineRequest::new(10, 1.0, 2.0));
        assert_eq!(resp.status, ResponseStatus::Success);
        assert_eq!(resp.amplitude, 10);
        assert_eq!(resp.frequency, 1.0);
        assert_eq!(resp.duration, 2.0);
    }

    #[cfg(feature = "web")]
    #[test]
    fn request_serde_missing_fields_default() {
        let req: RunSineRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req, RunSineRequest::default());

        let req: RunSineRequest = serde_json::from_str(r#"{"frequency": 2}"#).unwrap();
        assert_eq!(req.frequency, 2.0);
        assert_eq!(req.amplitude, 250);
    }

    #[cfg(feature = "web")]
    #[test]
    fn response_serialize() {
        let resp = RunSineResponse::from(RunSineRequest::default());
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"status\":\"success\""));
        assert!(json.contains("\"amplitude\":250"));
        assert!(json.contains("\"frequency\":5.0"));
        assert!(json.contains("\"duration\":3.0"));
    }

    #[cfg(feature = "web")]
    #[test]
    fn error_serialize() {
        let json = serde_json::to_string(&ErrorResponse::new("bad")).unwrap();
        assert_eq!(json, r#"{"status":"error","error":"bad"}"#);
    }

    #[cfg(feature = "serde-json-core")]
    #[test]
    fn parse_rejects_wrong_types() {
        assert!(parse_sine_request(br#"{"amplitude": "big"}"#).is_none());
        assert!(parse_sine_request(b"not json").is_none());
    }
}
