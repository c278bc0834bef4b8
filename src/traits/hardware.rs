//! Hardware abstraction traits for the stepper lines, limit sensors, and timing.
//!
//! This module defines the hardware interfaces that let the shake table run
//! against real GPIO, a simulated rig, or plain test doubles.
//!
//! # Key Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`MotorLines`] | Raw enable/direction output lines of the stepper driver |
//! | [`SensorInterface`] | Near/far proximity sensors with edge callbacks |
//! | [`Clock`] | Monotonic microsecond time source |
//! | [`Delay`] | Blocking delay used to pace steps |
//!
//! # Implementation
//!
//! For testing and desktop development, use the mock implementations
//! from [`crate::hal::mock`]. For pins that implement `embedded-hal` 1.0,
//! use the adapters in `hal::gpio` (requires the `embedded-hal` feature).
//!
//! # Example
//!
//! ```rust
//! use shake_table::traits::{MotorLines, Direction};
//! use shake_table::hal::MockMotorLines;
//!
//! let mut lines = MockMotorLines::new();
//! lines.set_direction(Direction::Away).unwrap();
//! lines.set_enable(true).unwrap();
//! lines.set_enable(false).unwrap();
//!
//! assert_eq!(lines.pulses, vec![Direction::Away]);
//! ```

extern crate alloc;
use alloc::sync::Arc;

/// Direction of a single carriage step.
///
/// `Away` moves the carriage away from the motor, toward the far sensor, and
/// corresponds to a `+1` step. `Toward` moves it back toward the motor and
/// the near sensor, a `-1` step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Direction {
    /// Away from the motor (`+1`).
    Away,
    /// Toward the motor (`-1`).
    Toward,
}

impl Direction {
    /// Returns the signed unit displacement of one step in this direction.
    ///
    /// # Examples
    ///
    /// ```
    /// use shake_table::Direction;
    ///
    /// assert_eq!(Direction::Away.sign(), 1);
    /// assert_eq!(Direction::Toward.sign(), -1);
    /// ```
    #[inline]
    pub const fn sign(self) -> i32 {
        match self {
            Direction::Away => 1,
            Direction::Toward => -1,
        }
    }

    /// Returns the direction as a lowercase string.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Direction::Away => "away",
            Direction::Toward => "toward",
        }
    }
}

/// Identifies one of the two limit sensors bounding the carriage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum SensorId {
    /// Sensor nearest the motor; the homing reference.
    Near,
    /// Sensor at the far end of travel.
    Far,
}

impl SensorId {
    /// Both sensors, near first.
    pub const ALL: [SensorId; 2] = [SensorId::Near, SensorId::Far];

    /// Returns the sensor name as a lowercase string.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            SensorId::Near => "near",
            SensorId::Far => "far",
        }
    }

    /// Array slot for per-sensor storage.
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            SensorId::Near => 0,
            SensorId::Far => 1,
        }
    }
}

/// Raw output lines of a step/direction stepper driver.
///
/// This is the hardware I/O layer the motor driver calls into. It knows
/// nothing about steps or estop latching; [`MotorDriver`] builds a step out of
/// a direction write and one enable pulse.
///
/// Polarity (which electrical level means "away") belongs to the
/// implementation and its configuration, not to callers.
///
/// [`MotorDriver`]: crate::motor::MotorDriver
pub trait MotorLines {
    /// Error type for line writes.
    type Error;

    /// Drive the direction line for the given travel direction.
    fn set_direction(&mut self, dir: Direction) -> Result<(), Self::Error>;

    /// Assert (`true`) or deassert (`false`) the enable/pulse line.
    fn set_enable(&mut self, asserted: bool) -> Result<(), Self::Error>;
}

/// Callback invoked when a sensor transitions to pressed.
///
/// Runs in interrupt-like context relative to the blocking operation in
/// progress, so it must only touch thread-safe state.
pub type SensorCallback = Arc<dyn Fn(SensorId) + Send + Sync>;

/// Near/far proximity sensor pair.
///
/// Exposes polled state plus an edge-triggered callback slot per sensor.
/// The controller swaps the callback between "estop" and none depending on
/// the phase of operation, so registration must replace any previous
/// callback rather than add to it.
pub trait SensorInterface {
    /// Returns true while the sensor reads pressed.
    fn is_triggered(&mut self, sensor: SensorId) -> bool;

    /// Install `callback` for presses of `sensor`, replacing any previous one.
    fn on_triggered(&mut self, sensor: SensorId, callback: SensorCallback);

    /// Remove the callback for `sensor`, if any.
    fn clear_triggered(&mut self, sensor: SensorId);

    /// Returns true if a callback is currently installed for `sensor`.
    fn has_callback(&self, sensor: SensorId) -> bool;

    /// Deliver pending edges for implementations without real interrupts.
    ///
    /// The controller calls this before every motor step. Interrupt-driven
    /// implementations keep the default no-op.
    fn poll_edges(&mut self) {}
}

/// Monotonic time source with microsecond resolution.
///
/// Used to measure playback duration and drift. On desktop, this can wrap
/// `std::time::Instant`; in tests, use [`MockClock`](crate::hal::MockClock).
pub trait Clock {
    /// Returns current time in microseconds since an arbitrary epoch.
    ///
    /// Must be monotonically increasing.
    fn now_us(&self) -> u64;
}

/// Blocking delay used to pace motor steps.
pub trait Delay {
    /// Block the calling thread for `us` microseconds.
    fn delay_us(&mut self, us: u64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_signs_and_names() {
        assert_eq!(Direction::Away.sign(), 1);
        assert_eq!(Direction::Toward.sign(), -1);
        assert_eq!(Direction::Away.as_str(), "away");
        assert_eq!(Direction::Toward.as_str(), "toward");
    }

    #[test]
    fn sensor_ids_are_distinct_slots() {
        assert_eq!(SensorId::Near.index(), 0);
        assert_eq!(SensorId::Far.index(), 1);
        assert_eq!(SensorId::ALL, [SensorId::Near, SensorId::Far]);
        assert_eq!(SensorId::Far.as_str(), "far");
    }

    // =========================================================================
    // SensorInterface Default Methods Tests
    // =========================================================================

    struct StaticSensors {
        pressed: [bool; 2],
    }

    impl SensorInterface for StaticSensors {
        fn is_triggered(&mut self, sensor: SensorId) -> bool {
            self.pressed[sensor.index()]
        }

        fn on_triggered(&mut self, _sensor: SensorId, _callback: SensorCallback) {}

        fn clear_triggered(&mut self, _sensor: SensorId) {}

        fn has_callback(&self, _sensor: SensorId) -> bool {
            false
        }
    }

    #[test]
    fn poll_edges_default_is_noop() {
        let mut sensors = StaticSensors {
            pressed: [true, false],
        };
        sensors.poll_edges();
        assert!(sensors.is_triggered(SensorId::Near));
        assert!(!sensors.is_triggered(SensorId::Far));
    }
}
