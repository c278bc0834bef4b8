//! Shake table controller: calibration, centering, playback, and estop.
//!
//! [`ShakeTable`] owns the motor driver, the limit sensors, and the step
//! pacer, and is the only thing that moves the carriage. Every operation
//! blocks the calling thread until it completes or is aborted.
//!
//! # State Machine
//!
//! ```text
//! Uninitialized ──calibrate──▶ Calibrating ──▶ Calibrated
//! Calibrated ──center──▶ Centering ──▶ Calibrated
//! Calibrated ──run_trajectory──▶ Running ──▶ Calibrated
//! any ──sensor trip / estop──▶ Estopped
//! Estopped ──calibrate──▶ Calibrating        (deliberate re-arm)
//! Estopped ──rearm──▶ Uninitialized
//! ```
//!
//! # Emergency Stop
//!
//! While the table is calibrated, both limit sensors carry a callback that
//! trips the motor's [`EstopHandle`]. The trip is observed at the next step
//! boundary, which aborts whatever operation is in flight with
//! [`ShakeTableError::EmergencyStop`] and leaves the table `Estopped`. A trip
//! while idle shows up in [`ShakeTable::state`] right away, and every
//! operation except `calibrate` and `rearm` refuses to start.
//! Homing drives into the sensors on purpose, so calibration and centering
//! remove the callbacks while they move and put them back afterwards.
//!
//! # Example
//!
//! ```rust
//! use shake_table::{ShakeTable, TableState};
//! use shake_table::hal::{MockClock, SimulatedRig};
//!
//! // Sensors 40 steps apart, carriage starting 12 steps from the near sensor
//! let rig = SimulatedRig::new(40, 12);
//! let (lines, sensors) = rig.split();
//! let mut table = ShakeTable::new(lines, sensors, MockClock::new());
//!
//! assert_eq!(table.calibrate().unwrap(), 40);
//! assert_eq!(table.state(), TableState::Calibrated { total_steps: 40 });
//! assert_eq!(rig.position(), 20);
//!
//! let report = table.run_trajectory(&[0.0, 0.5, 1.0], &[0.0, 3.5, 0.2]).unwrap();
//! assert_eq!(report.steps, 6);
//! assert_eq!(report.net_displacement, 0);
//! ```

extern crate alloc;
use alloc::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::TableConfig;
use crate::discretize::{discretize, StepPlan};
use crate::error::{CalibrationError, MotorFault, ShakeTableError};
use crate::motor::{EstopHandle, MotorDriver};
use crate::traits::{Clock, Delay, Direction, MotorLines, SensorCallback, SensorId, SensorInterface};
use crate::waveform::{SineParams, Waveform};

/// Logical state of the table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "state", rename_all = "snake_case"))]
pub enum TableState {
    /// Position unknown; calibration required.
    Uninitialized,
    /// Homing and measuring travel.
    Calibrating,
    /// Idle with known travel between the sensors.
    Calibrated {
        /// Steps between the near and far sensor
        total_steps: u32,
    },
    /// Re-homing and moving to mid-travel.
    Centering {
        /// Steps between the near and far sensor
        total_steps: u32,
    },
    /// Playing back a waveform.
    Running {
        /// Steps between the near and far sensor
        total_steps: u32,
    },
    /// Stopped by a sensor trip or explicit estop. Latched.
    Estopped,
}

impl TableState {
    /// Returns the state name as a lowercase string.
    pub const fn as_str(&self) -> &'static str {
        match self {
            TableState::Uninitialized => "uninitialized",
            TableState::Calibrating => "calibrating",
            TableState::Calibrated { .. } => "calibrated",
            TableState::Centering { .. } => "centering",
            TableState::Running { .. } => "running",
            TableState::Estopped => "estopped",
        }
    }

    /// Measured travel, if known in this state.
    pub const fn total_steps(&self) -> Option<u32> {
        match *self {
            TableState::Calibrated { total_steps }
            | TableState::Centering { total_steps }
            | TableState::Running { total_steps } => Some(total_steps),
            _ => None,
        }
    }
}

/// Outcome of a completed playback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlaybackReport {
    /// Steps issued
    pub steps: usize,
    /// Sum of step signs (`Away` positive)
    pub net_displacement: i64,
    /// Sum of the requested inter-step delays
    pub scheduled_us: u64,
    /// Wall time measured by the clock from first delay to last step
    pub elapsed_us: u64,
}

impl PlaybackReport {
    /// How far playback ran behind schedule.
    ///
    /// Positive when step execution latency accumulated on top of the
    /// requested delays.
    pub fn drift_us(&self) -> i64 {
        self.elapsed_us as i64 - self.scheduled_us as i64
    }
}

type TableResult<T, L> = Result<T, ShakeTableError<<L as MotorLines>::Error>>;

/// Single-axis shake table controller.
///
/// # Type Parameters
///
/// - `L`: stepper driver output lines ([`MotorLines`])
/// - `S`: limit sensor pair ([`SensorInterface`])
/// - `T`: step pacer, both [`Clock`] and [`Delay`]
///
/// # Ownership
///
/// The table takes the motor lines and sensors by value, so one physical
/// motor/sensor pair cannot be driven by two controllers. Other threads that
/// need to stop the table get an [`EstopHandle`] from
/// [`estop_handle`](Self::estop_handle).
pub struct ShakeTable<L, S, T>
where
    L: MotorLines,
    S: SensorInterface,
    T: Clock + Delay,
{
    motor: MotorDriver<L>,
    sensors: S,
    timer: T,
    config: TableConfig,
    state: TableState,
}

impl<L, S, T> ShakeTable<L, S, T>
where
    L: MotorLines,
    S: SensorInterface,
    T: Clock + Delay,
{
    /// Create an uninitialized table with the default configuration.
    pub fn new(lines: L, sensors: S, timer: T) -> Self {
        Self {
            motor: MotorDriver::new(lines),
            sensors,
            timer,
            config: TableConfig::default(),
            state: TableState::Uninitialized,
        }
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: TableConfig) -> Self {
        self.config = config;
        self
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Current state.
    ///
    /// `Estopped` as soon as the stop latch trips, even if no operation has
    /// run since.
    #[inline]
    pub fn state(&self) -> TableState {
        if self.motor.is_running() {
            self.state
        } else {
            TableState::Estopped
        }
    }

    /// Measured travel between the sensors, once calibrated.
    #[inline]
    pub fn total_steps(&self) -> Option<u32> {
        self.state().total_steps()
    }

    /// Returns true when idle with known travel.
    #[inline]
    pub fn is_calibrated(&self) -> bool {
        matches!(self.state(), TableState::Calibrated { .. })
    }

    /// Returns true while latched in estop.
    #[inline]
    pub fn is_estopped(&self) -> bool {
        self.state() == TableState::Estopped
    }

    /// Active configuration.
    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// The motor driver.
    pub fn motor(&self) -> &MotorDriver<L> {
        &self.motor
    }

    /// The sensor pair.
    pub fn sensors(&self) -> &S {
        &self.sensors
    }

    /// The step pacer.
    pub fn timer(&self) -> &T {
        &self.timer
    }

    /// A clone of the motor's stop latch.
    ///
    /// Tripping it stops the table at the next step boundary. A running
    /// operation fails with [`ShakeTableError::EmergencyStop`]; an idle table
    /// reports `Estopped` immediately.
    pub fn estop_handle(&self) -> EstopHandle {
        self.motor.estop_handle()
    }

    /// Give back the hardware.
    pub fn into_parts(self) -> (L, S, T) {
        (self.motor.into_lines(), self.sensors, self.timer)
    }

    // ------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------

    /// Home to the near sensor, measure travel to the far sensor, and park
    /// `total_steps / 2` (floor) steps back toward the motor.
    ///
    /// Allowed from any state; this is the deliberate re-arm that leaves
    /// `Estopped`. Returns the measured travel.
    pub fn calibrate(&mut self) -> TableResult<u32, L> {
        self.sync_state();
        info!(from = self.state.as_str(), "calibrating");
        self.motor.rearm();
        self.state = TableState::Calibrating;

        match self.calibrate_sequence() {
            Ok(total_steps) => {
                self.state = TableState::Calibrated { total_steps };
                info!(total_steps, "calibrated");
                Ok(total_steps)
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    fn calibrate_sequence(&mut self) -> TableResult<u32, L> {
        self.disarm_estop();
        let homed = self.drive_until(Direction::Toward, SensorId::Near)?;
        debug!(steps = homed, "homed to near sensor");

        let total_steps = self.drive_until(Direction::Away, SensorId::Far)?;
        debug!(total_steps, "reached far sensor");

        self.move_steps(Direction::Toward, total_steps / 2)?;
        self.arm_estop();
        Ok(total_steps)
    }

    /// Re-home and move to mid-travel (`total_steps / 2` from the near
    /// sensor, floor).
    ///
    /// Delegates to [`calibrate`](Self::calibrate) when travel is not yet
    /// known. Returns the travel in use.
    pub fn center(&mut self) -> TableResult<u32, L> {
        self.sync_state();
        let total_steps = match self.state {
            TableState::Uninitialized | TableState::Calibrated { total_steps: 0 } => {
                debug!("not calibrated, calibrating instead of centering");
                return self.calibrate();
            }
            TableState::Calibrated { total_steps } => total_steps,
            state => {
                return Err(ShakeTableError::InvalidState {
                    operation: "center",
                    state,
                })
            }
        };

        info!(total_steps, "centering");
        self.state = TableState::Centering { total_steps };

        match self.center_sequence(total_steps) {
            Ok(()) => {
                self.state = TableState::Calibrated { total_steps };
                info!(position = total_steps / 2, "centered");
                Ok(total_steps)
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    fn center_sequence(&mut self, total_steps: u32) -> TableResult<(), L> {
        self.disarm_estop();
        self.drive_until(Direction::Toward, SensorId::Near)?;
        self.move_steps(Direction::Away, total_steps / 2)?;
        self.arm_estop();
        Ok(())
    }

    /// Play back a sampled waveform (amplitude in steps).
    ///
    /// Sleeps each step's delay, then issues exactly one step. Step execution
    /// latency is not compensated, so playback drifts late by the per-step
    /// overhead; [`PlaybackReport::drift_us`] measures it.
    ///
    /// Invalid or flat input is rejected before anything moves and leaves the
    /// state unchanged.
    pub fn run_trajectory(&mut self, time: &[f64], amplitude: &[f64]) -> TableResult<PlaybackReport, L> {
        let total_steps = self.require_calibrated("run_trajectory")?;
        let plan = discretize(time, amplitude)?.into_plan()?;
        self.play(&plan, total_steps)
    }

    /// Play back a validated [`Waveform`]. See [`run_trajectory`](Self::run_trajectory).
    pub fn run_waveform(&mut self, waveform: &Waveform) -> TableResult<PlaybackReport, L> {
        let total_steps = self.require_calibrated("run_waveform")?;
        let plan = waveform.discretize().into_plan()?;
        self.play(&plan, total_steps)
    }

    /// Generate a sine test signal and play it back.
    pub fn run_sine(&mut self, params: &SineParams) -> TableResult<PlaybackReport, L> {
        let total_steps = self.require_calibrated("run_sine")?;
        let waveform = params.generate()?;
        let plan = waveform.discretize().into_plan()?;
        self.play(&plan, total_steps)
    }

    /// Stop the motor now and latch `Estopped`.
    ///
    /// Safe to call repeatedly. Only a failure to write the enable line is
    /// reported as an error; the state is `Estopped` either way.
    pub fn estop(&mut self) -> TableResult<(), L> {
        self.sync_state();
        let result = self.motor.estop();
        if self.state != TableState::Estopped {
            warn!(from = self.state.as_str(), "emergency stop requested");
        }
        self.state = TableState::Estopped;

        match result {
            Ok(()) | Err(MotorFault::EmergencyStop) => Ok(()),
            Err(MotorFault::Io(e)) => Err(ShakeTableError::Hardware(e)),
        }
    }

    /// Leave `Estopped` without moving. Position is unknown afterwards, so
    /// the table is `Uninitialized`.
    pub fn rearm(&mut self) -> TableResult<(), L> {
        self.sync_state();
        if self.state != TableState::Estopped {
            return Err(ShakeTableError::InvalidState {
                operation: "rearm",
                state: self.state,
            });
        }
        self.motor.rearm();
        self.state = TableState::Uninitialized;
        info!("re-armed, calibration required");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Latch `Estopped` if the stop latch tripped while nothing was running.
    fn sync_state(&mut self) {
        if self.state != TableState::Estopped && !self.motor.is_running() {
            warn!(from = self.state.as_str(), "stop latch tripped while idle");
            self.state = TableState::Estopped;
        }
    }

    fn require_calibrated(&mut self, operation: &'static str) -> TableResult<u32, L> {
        self.sync_state();
        match self.state {
            TableState::Calibrated { total_steps } => Ok(total_steps),
            state => Err(ShakeTableError::InvalidState { operation, state }),
        }
    }

    fn play(&mut self, plan: &StepPlan, total_steps: u32) -> TableResult<PlaybackReport, L> {
        self.state = TableState::Running { total_steps };
        info!(
            steps = plan.len(),
            span_s = plan.end_time() - plan.start_time(),
            "playback started"
        );

        let started = self.timer.now_us();
        let mut report = PlaybackReport {
            steps: 0,
            net_displacement: 0,
            scheduled_us: 0,
            elapsed_us: 0,
        };

        for event in plan {
            let wait_us = libm::round(event.delay * 1_000_000.0) as u64;
            report.scheduled_us += wait_us;
            self.timer.delay_us(wait_us);

            self.sensors.poll_edges();
            if let Err(fault) = self.motor.step(event.direction) {
                return Err(self.fail(fault.into()));
            }
            report.steps += 1;
            report.net_displacement += event.direction.sign() as i64;
        }

        report.elapsed_us = self.timer.now_us().saturating_sub(started);
        self.state = TableState::Calibrated { total_steps };
        info!(
            steps = report.steps,
            net = report.net_displacement,
            drift_us = report.drift_us(),
            "playback finished"
        );
        Ok(report)
    }

    /// Step in `dir` until `sensor` reads pressed. Returns the steps taken.
    fn drive_until(&mut self, dir: Direction, sensor: SensorId) -> TableResult<u32, L> {
        let mut steps = 0u32;
        while !self.sensors.is_triggered(sensor) {
            if let Some(limit) = self.config.max_travel_steps {
                if steps >= limit {
                    return Err(CalibrationError::SensorNotReached { sensor, steps }.into());
                }
            }
            self.paced_step(dir)?;
            steps += 1;
        }
        Ok(steps)
    }

    fn move_steps(&mut self, dir: Direction, count: u32) -> TableResult<(), L> {
        for _ in 0..count {
            self.paced_step(dir)?;
        }
        Ok(())
    }

    fn paced_step(&mut self, dir: Direction) -> TableResult<(), L> {
        self.sensors.poll_edges();
        self.motor.step(dir)?;
        self.timer.delay_us(u64::from(self.config.min_step_interval_us));
        Ok(())
    }

    fn arm_estop(&mut self) {
        let handle = self.motor.estop_handle();
        let callback: SensorCallback = Arc::new(move |sensor: SensorId| {
            if handle.trip() {
                warn!(sensor = sensor.as_str(), "limit sensor tripped, emergency stop");
            }
        });
        for sensor in SensorId::ALL {
            self.sensors.on_triggered(sensor, callback.clone());
        }
    }

    fn disarm_estop(&mut self) {
        for sensor in SensorId::ALL {
            self.sensors.clear_triggered(sensor);
        }
    }

    /// Map a failed operation onto the state machine.
    fn fail(&mut self, err: ShakeTableError<L::Error>) -> ShakeTableError<L::Error> {
        match &err {
            ShakeTableError::EmergencyStop | ShakeTableError::Hardware(_) => {
                // Best effort: the lines may be what failed
                let _ = self.motor.estop();
                warn!(during = self.state.as_str(), "aborted, table estopped");
                self.state = TableState::Estopped;
            }
            ShakeTableError::Calibration(cause) => {
                warn!(
                    sensor = cause.sensor().as_str(),
                    "calibration failed, position unknown"
                );
                self.arm_estop();
                self.state = TableState::Uninitialized;
            }
            ShakeTableError::Validation(_) | ShakeTableError::InvalidState { .. } => {}
        }
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::hal::{MockClock, MockMotorLines, MockSensors};

    fn table() -> ShakeTable<MockMotorLines, MockSensors, MockClock> {
        ShakeTable::new(MockMotorLines::new(), MockSensors::new(), MockClock::new())
    }

    #[test]
    fn starts_uninitialized() {
        let t = table();
        assert_eq!(t.state(), TableState::Uninitialized);
        assert_eq!(t.total_steps(), None);
        assert!(!t.is_calibrated());
        assert!(t.motor().is_running());
    }

    #[test]
    fn playback_requires_calibration() {
        let mut t = table();
        let err = t.run_trajectory(&[0.0, 1.0], &[0.0, 2.0]).unwrap_err();
        assert_eq!(
            err,
            ShakeTableError::InvalidState {
                operation: "run_trajectory",
                state: TableState::Uninitialized,
            }
        );
        assert!(t.motor().lines().pulses.is_empty());
    }

    #[test]
    fn calibrate_with_sensors_already_pressed_measures_zero() {
        let mut sensors = MockSensors::new();
        sensors.set_pressed(SensorId::Near, true);
        sensors.set_pressed(SensorId::Far, true);
        let mut t = ShakeTable::new(MockMotorLines::new(), sensors, MockClock::new());

        assert_eq!(t.calibrate(), Ok(0));
        assert_eq!(t.state(), TableState::Calibrated { total_steps: 0 });
        assert!(t.sensors().has_callback(SensorId::Near));
        assert!(t.sensors().has_callback(SensorId::Far));
    }

    #[test]
    fn bounded_calibration_fails_without_sensors() {
        let mut t = table().with_config(TableConfig::default().with_max_travel_steps(25));

        let err = t.calibrate().unwrap_err();
        assert_eq!(
            err,
            ShakeTableError::Calibration(CalibrationError::SensorNotReached {
                sensor: SensorId::Near,
                steps: 25,
            })
        );
        assert_eq!(t.state(), TableState::Uninitialized);
        assert_eq!(t.motor().lines().pulses.len(), 25);
        // Paced at the configured interval
        assert_eq!(t.timer().delays.len(), 25);
        assert!(t.timer().delays.iter().all(|&d| d == 100));
    }

    #[test]
    fn explicit_estop_latches_and_repeats_safely() {
        let mut t = table();
        assert_eq!(t.estop(), Ok(()));
        assert!(t.is_estopped());
        assert!(!t.motor().is_running());

        assert_eq!(t.estop(), Ok(()));
        assert!(t.is_estopped());
        assert!(!t.motor().lines().enabled);
    }

    #[test]
    fn estopped_table_refuses_center() {
        let mut t = table();
        t.estop().unwrap();

        assert_eq!(
            t.center(),
            Err(ShakeTableError::InvalidState {
                operation: "center",
                state: TableState::Estopped,
            })
        );
    }

    #[test]
    fn rearm_only_from_estopped() {
        let mut t = table();
        assert!(matches!(
            t.rearm(),
            Err(ShakeTableError::InvalidState { operation: "rearm", .. })
        ));

        t.estop().unwrap();
        t.rearm().unwrap();
        assert_eq!(t.state(), TableState::Uninitialized);
        assert!(t.motor().is_running());
    }

    #[test]
    fn flat_waveform_is_rejected_without_moving() {
        let mut sensors = MockSensors::new();
        sensors.set_pressed(SensorId::Near, true);
        sensors.set_pressed(SensorId::Far, true);
        let mut t = ShakeTable::new(MockMotorLines::new(), sensors, MockClock::new());
        t.calibrate().unwrap();

        let err = t.run_trajectory(&[0.0, 1.0, 2.0], &[0.2, 0.4, 0.3]).unwrap_err();
        assert_eq!(err, ShakeTableError::Validation(ValidationError::NoSteps));
        assert!(t.is_calibrated());
        assert!(t.motor().lines().pulses.is_empty());
    }

    #[test]
    fn line_failure_estops() {
        let mut sensors = MockSensors::new();
        sensors.set_pressed(SensorId::Near, true);
        let lines = MockMotorLines::new().with_failure();
        let mut t = ShakeTable::new(lines, sensors, MockClock::new());

        assert_eq!(t.calibrate(), Err(ShakeTableError::Hardware(())));
        assert!(t.is_estopped());
    }

    #[test]
    fn drift_is_elapsed_minus_scheduled() {
        let report = PlaybackReport {
            steps: 3,
            net_displacement: 1,
            scheduled_us: 1000,
            elapsed_us: 1030,
        };
        assert_eq!(report.drift_us(), 30);
    }
}
