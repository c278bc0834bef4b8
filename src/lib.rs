//! # shake-table
//!
//! A single-axis stepper shake table controller: a carriage driven by a
//! stepper motor between two proximity sensors, able to home, center, and
//! replay amplitude-vs-time waveforms as discrete motor steps.
//!
//! ## Features
//!
//! - **Waveform discretization**: continuous signals become time-ordered unit
//!   steps with interpolated crossing times
//! - **Calibration and centering**: homing against the near sensor, travel
//!   measured to the far sensor
//! - **Latched emergency stop**: either sensor trips the motor during
//!   playback; recovery is always explicit
//! - **Hardware abstraction**: traits for the stepper lines, sensors, and step
//!   pacing, with mocks and a simulated rig for desktop testing
//!
//! ## Architecture
//!
//! The crate is structured to allow testing on desktop without hardware:
//!
//! - `traits` - Hardware abstractions
//! - `waveform` - Sampled signals and the sine generator
//! - `discretize` - Waveform-to-step conversion
//! - `motor` - One-step-per-call driver with the estop latch
//! - `table` - Controller state machine that ties everything together
//! - `hal` - Concrete implementations (mock/sim for testing, GPIO for hardware)
//!
//! ## Example
//!
//! ```rust
//! use shake_table::{ShakeTable, SineParams, TableState};
//! use shake_table::hal::{MockClock, SimulatedRig};
//!
//! // Sensors 600 steps apart, carriage somewhere in between
//! let rig = SimulatedRig::new(600, 250);
//! let (lines, sensors) = rig.split();
//! let mut table = ShakeTable::new(lines, sensors, MockClock::new());
//!
//! table.calibrate().unwrap();
//! table.center().unwrap();
//! assert_eq!(rig.position(), 300);
//!
//! // 3 step sine at 2 Hz for one second
//! let report = table
//!     .run_sine(&SineParams::new(3, 2.0, 1.0).with_sampling_rate(1000))
//!     .unwrap();
//! assert!(report.steps > 0);
//! assert_eq!(table.state(), TableState::Calibrated { total_steps: 600 });
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

/// Error types for validation, calibration, and table operations.
pub mod error;
/// Hardware abstraction layer with mock implementations for testing.
pub mod hal;
/// Core traits for hardware abstraction.
pub mod traits;

/// Sampled waveforms and the sine test signal generator.
pub mod waveform;

/// Waveform-to-step discretization.
pub mod discretize;

/// Stepper driver with latched emergency stop.
pub mod motor;

/// Controller state machine.
pub mod table;

/// Commissioning helpers for sensor identification and travel measurement.
pub mod diagnostics;

/// Shared configuration system.
pub mod config;

/// Shared message types for the HTTP boundary (serde-based).
#[cfg(feature = "serde")]
pub mod messages;

/// Network services for the HTTP boundary (feature-gated).
#[cfg(feature = "web")]
pub mod services;

// Re-exports for convenience
pub use discretize::{discretize, Discretization, StepEvent, StepPlan};
pub use error::{CalibrationError, MotorFault, ShakeTableError, ValidationError};
pub use motor::{EstopHandle, MotorDriver};
pub use table::{PlaybackReport, ShakeTable, TableState};
pub use traits::{
    Clock, Delay, Direction, MotorLines, SensorCallback, SensorId, SensorInterface,
};
pub use waveform::{generate_sine, SineParams, Waveform};

// Config re-exports
pub use config::{Config, DeviceConfig, PinConfig, TableConfig, WaveformConfig, WebConfig};

// Message re-exports (for the HTTP API)
#[cfg(feature = "serde")]
pub use messages::{ErrorResponse, ResponseStatus, RunSineRequest, RunSineResponse};

#[cfg(feature = "serde-json-core")]
pub use messages::parse_sine_request;
