//! Hardware Abstraction Layer implementations.
//!
//! This module contains concrete implementations of the traits
//! defined in [`crate::traits`] for various platforms.
//!
//! # Available Implementations
//!
//! - `mock`: Test implementations and a simulated rig for desktop development
//! - `std_timer`: Wall-clock pacer (requires `std` feature)
//! - `gpio`: `embedded-hal` 1.0 pin adapters (requires `embedded-hal` feature)

pub mod mock;

#[cfg(feature = "std")]
pub mod std_timer;

#[cfg(feature = "embedded-hal")]
pub mod gpio;

pub use mock::*;

#[cfg(feature = "std")]
pub use std_timer::StdTimer;

#[cfg(feature = "embedded-hal")]
pub use gpio::{GpioMotorLines, GpioSensors, LineError};
