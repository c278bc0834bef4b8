//! Trait definitions for hardware abstraction.
//!
//! These abstractions allow the shake table to:
//! - Run on different hardware (GPIO via `embedded-hal`, a simulated rig)
//! - Pace steps with real or virtual time
//!
//! # Hardware Abstraction
//!
//! - [`MotorLines`]: enable/direction outputs of the stepper driver
//! - [`SensorInterface`]: near/far limit sensors with edge callbacks
//! - [`Clock`] and [`Delay`]: the injectable step pacer

pub mod hardware;

pub use hardware::*;
