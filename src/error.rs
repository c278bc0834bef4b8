//! Error types for waveform validation, calibration, and table operations.
//!
//! Every high-level operation on [`ShakeTable`](crate::ShakeTable) returns
//! [`ShakeTableError`]. The type parameter `E` is the error type of the
//! underlying [`MotorLines`](crate::traits::MotorLines) implementation.

use thiserror::Error;

use crate::table::TableState;
use crate::traits::SensorId;

/// Malformed waveform input or generator parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// `time` and `amplitude` have different lengths.
    #[error("time has {time} samples but amplitude has {amplitude}")]
    LengthMismatch {
        /// Number of time samples
        time: usize,
        /// Number of amplitude samples
        amplitude: usize,
    },
    /// Fewer than two samples; nothing can be interpolated.
    #[error("waveform needs at least 2 samples, got {len}")]
    TooFewSamples {
        /// Number of samples supplied
        len: usize,
    },
    /// A sample is NaN or infinite.
    #[error("non-finite sample at index {index}")]
    NonFinite {
        /// Index of the offending sample
        index: usize,
    },
    /// `time[index] < time[index - 1]`.
    #[error("time decreases at index {index}")]
    TimeDecreasing {
        /// Index of the first sample that goes backwards
        index: usize,
    },
    /// The waveform never crosses an integer step level.
    #[error("waveform is flat: no step levels are crossed")]
    NoSteps,
    /// A generator parameter is out of range.
    #[error("invalid {name}: {reason}")]
    InvalidParameter {
        /// Parameter name
        name: &'static str,
        /// What is wrong with it
        reason: &'static str,
    },
}

/// Calibration could not complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CalibrationError {
    /// The configured travel bound ran out before the sensor read pressed.
    #[error("{} sensor not reached after {steps} steps", .sensor.as_str())]
    SensorNotReached {
        /// Sensor that never triggered
        sensor: SensorId,
        /// Steps taken before giving up
        steps: u32,
    },
}

impl CalibrationError {
    /// Sensor the failure relates to.
    pub fn sensor(&self) -> SensorId {
        match *self {
            CalibrationError::SensorNotReached { sensor, .. } => sensor,
        }
    }
}

/// Fault reported by the motor driver for a single step or stop request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MotorFault<E> {
    /// The estop latch tripped; the enable line has been deasserted.
    #[error("emergency stop")]
    EmergencyStop,
    /// Writing a motor line failed.
    #[error("motor line error: {0:?}")]
    Io(E),
}

/// Error returned by [`ShakeTable`](crate::ShakeTable) operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShakeTableError<E> {
    /// The supplied waveform was rejected before any motion.
    #[error("invalid waveform: {0}")]
    Validation(#[from] ValidationError),
    /// A sensor trip or explicit estop aborted the operation.
    #[error("emergency stop")]
    EmergencyStop,
    /// Homing or travel measurement failed.
    #[error("calibration failed: {0}")]
    Calibration(#[from] CalibrationError),
    /// The operation is not allowed in the current state.
    #[error("{operation} not allowed while {}", .state.as_str())]
    InvalidState {
        /// Operation that was refused
        operation: &'static str,
        /// State at the time of the request
        state: TableState,
    },
    /// Hardware I/O failed.
    #[error("hardware error: {0:?}")]
    Hardware(E),
}

impl<E> From<MotorFault<E>> for ShakeTableError<E> {
    fn from(fault: MotorFault<E>) -> Self {
        match fault {
            MotorFault::EmergencyStop => ShakeTableError::EmergencyStop,
            MotorFault::Io(e) => ShakeTableError::Hardware(e),
        }
    }
}

impl<E> ShakeTableError<E> {
    /// Returns true if this error is an emergency stop.
    #[inline]
    pub fn is_emergency_stop(&self) -> bool {
        matches!(self, ShakeTableError::EmergencyStop)
    }
}
