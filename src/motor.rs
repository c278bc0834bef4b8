//! Stepper motor driver with a latched emergency stop.
//!
//! [`MotorDriver`] turns a direction and one enable pulse on the raw
//! [`MotorLines`] into a single physical step. It imposes no delay between
//! steps; pacing is the caller's job.
//!
//! # Emergency Stop
//!
//! The stop latch lives in an [`EstopHandle`], a cheap cloneable handle that
//! can be tripped from a sensor callback or another thread. A trip only
//! clears the `running` flag and records an unreported fault. The foreground
//! observes it at the next [`MotorDriver::step`], which deasserts enable and
//! returns [`MotorFault::EmergencyStop`] exactly once.
//!
//! ```rust
//! use shake_table::motor::MotorDriver;
//! use shake_table::error::MotorFault;
//! use shake_table::hal::MockMotorLines;
//! use shake_table::Direction;
//!
//! let mut motor = MotorDriver::new(MockMotorLines::new());
//! motor.step(Direction::Away).unwrap();
//!
//! let handle = motor.estop_handle();
//! handle.trip();
//!
//! assert_eq!(motor.step(Direction::Away), Err(MotorFault::EmergencyStop));
//! // Stopped: further steps are silent no-ops
//! assert_eq!(motor.step(Direction::Away), Ok(()));
//! assert_eq!(motor.lines().pulses.len(), 1);
//! ```

extern crate alloc;
use alloc::sync::Arc;
use core::sync::atomic::{AtomicBool, Ordering};

use crate::error::MotorFault;
use crate::traits::{Direction, MotorLines};

#[derive(Debug)]
struct Latch {
    running: AtomicBool,
    tripped: AtomicBool,
}

/// Shared handle to a motor's run/stop latch.
///
/// Safe to call from interrupt-like callback context: it never touches the
/// motor lines.
#[derive(Clone, Debug)]
pub struct EstopHandle {
    latch: Arc<Latch>,
}

impl EstopHandle {
    fn new() -> Self {
        Self {
            latch: Arc::new(Latch {
                running: AtomicBool::new(true),
                tripped: AtomicBool::new(false),
            }),
        }
    }

    /// Stop the motor at the next step boundary.
    ///
    /// Returns true if this call stopped a running motor. Tripping an already
    /// stopped motor does nothing.
    pub fn trip(&self) -> bool {
        let was_running = self.latch.running.swap(false, Ordering::AcqRel);
        if was_running {
            self.latch.tripped.store(true, Ordering::Release);
        }
        was_running
    }

    /// Returns true while the motor accepts steps.
    #[inline]
    pub fn is_running(&self) -> bool {
        self.latch.running.load(Ordering::Acquire)
    }

    /// Returns true if a trip has not yet been reported to the foreground.
    #[inline]
    pub fn is_tripped(&self) -> bool {
        self.latch.tripped.load(Ordering::Acquire)
    }

    fn take_trip(&self) -> bool {
        self.latch.tripped.swap(false, Ordering::AcqRel)
    }

    fn rearm(&self) {
        self.latch.tripped.store(false, Ordering::Release);
        self.latch.running.store(true, Ordering::Release);
    }
}

/// One-step-per-call stepper driver.
///
/// A new driver starts running. After a stop it stays stopped until
/// [`rearm`](Self::rearm) is called explicitly.
#[derive(Debug)]
pub struct MotorDriver<L: MotorLines> {
    lines: L,
    estop: EstopHandle,
    steps_issued: u64,
}

impl<L: MotorLines> MotorDriver<L> {
    /// Wrap the motor lines. The driver starts in the running state.
    pub fn new(lines: L) -> Self {
        Self {
            lines,
            estop: EstopHandle::new(),
            steps_issued: 0,
        }
    }

    /// Issue one step in `dir`.
    ///
    /// - A pending trip is reported as [`MotorFault::EmergencyStop`] after
    ///   deasserting enable.
    /// - When stopped, the call is a no-op.
    /// - Otherwise the direction line is set and enable is pulsed high then
    ///   low once.
    pub fn step(&mut self, dir: Direction) -> Result<(), MotorFault<L::Error>> {
        if self.estop.take_trip() {
            self.lines.set_enable(false).map_err(MotorFault::Io)?;
            return Err(MotorFault::EmergencyStop);
        }
        if !self.estop.is_running() {
            return Ok(());
        }

        self.lines.set_direction(dir).map_err(MotorFault::Io)?;
        self.lines.set_enable(true).map_err(MotorFault::Io)?;
        self.lines.set_enable(false).map_err(MotorFault::Io)?;
        self.steps_issued += 1;
        Ok(())
    }

    /// Stop the motor.
    ///
    /// Enable is always deasserted. The first call on a running motor (or one
    /// with an unreported trip) returns [`MotorFault::EmergencyStop`]; calling
    /// again while stopped returns `Ok(())`.
    pub fn estop(&mut self) -> Result<(), MotorFault<L::Error>> {
        let was_running = self.estop.latch.running.swap(false, Ordering::AcqRel);
        let pending = self.estop.take_trip();
        self.lines.set_enable(false).map_err(MotorFault::Io)?;
        if was_running || pending {
            Err(MotorFault::EmergencyStop)
        } else {
            Ok(())
        }
    }

    /// Return to the running state and forget any unreported trip.
    pub fn rearm(&mut self) {
        self.estop.rearm();
    }

    /// A clone of the stop latch, for callbacks and other threads.
    pub fn estop_handle(&self) -> EstopHandle {
        self.estop.clone()
    }

    /// Returns true while the motor accepts steps.
    #[inline]
    pub fn is_running(&self) -> bool {
        self.estop.is_running()
    }

    /// Total physical steps pulsed since construction.
    #[inline]
    pub fn steps_issued(&self) -> u64 {
        self.steps_issued
    }

    /// Borrow the underlying lines.
    pub fn lines(&self) -> &L {
        &self.lines
    }

    /// Mutably borrow the underlying lines.
    pub fn lines_mut(&mut self) -> &mut L {
        &mut self.lines
    }

    /// Give back the underlying lines.
    pub fn into_lines(self) -> L {
        self.lines
    }
}
