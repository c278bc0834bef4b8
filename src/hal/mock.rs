//! Mock implementations for testing without hardware.
//!
//! This module provides test doubles for the hardware traits, enabling
//! development and testing on desktop without a physical table.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockMotorLines`] | [`MotorLines`] | Records direction writes and enable pulses |
//! | [`MockSensors`] | [`SensorInterface`] | Manually pressed sensors with callbacks |
//! | [`MockClock`] | [`Clock`] + [`Delay`] | Virtual time; delays return immediately |
//! | [`SimulatedRig`] | both | Carriage between two sensors `D` steps apart (requires `std`) |
//!
//! # Example
//!
//! ```rust
//! use shake_table::hal::{MockClock, SimulatedRig};
//! use shake_table::ShakeTable;
//!
//! let rig = SimulatedRig::new(11, 3);
//! let (lines, sensors) = rig.split();
//! let mut table = ShakeTable::new(lines, sensors, MockClock::new());
//!
//! table.calibrate().unwrap();
//! // 11 / 2 = 5 steps back from the far sensor
//! assert_eq!(rig.position(), 6);
//!
//! table.center().unwrap();
//! assert_eq!(rig.position(), 5);
//! ```

extern crate alloc;
use alloc::vec::Vec;
use core::fmt;

use crate::traits::{Clock, Delay, Direction, MotorLines, SensorCallback, SensorId, SensorInterface};

// ============================================================================
// Hardware Mocks
// ============================================================================

/// Mock stepper driver lines.
///
/// Records every pulse (a rising edge on enable) tagged with the direction
/// line at that moment. Use the public fields to inspect state after test
/// operations.
///
/// # Example
///
/// ```rust
/// use shake_table::hal::MockMotorLines;
/// use shake_table::traits::{MotorLines, Direction};
///
/// let mut lines = MockMotorLines::new();
/// lines.set_direction(Direction::Toward).unwrap();
/// lines.set_enable(true).unwrap();
/// lines.set_enable(true).unwrap(); // already high, no new pulse
/// lines.set_enable(false).unwrap();
///
/// assert_eq!(lines.pulses, vec![Direction::Toward]);
/// assert_eq!(lines.position(), -1);
/// assert!(!lines.enabled);
/// ```
#[derive(Debug, Default)]
pub struct MockMotorLines {
    /// Last direction written, if any.
    pub direction: Option<Direction>,
    /// Current level of the enable line.
    pub enabled: bool,
    /// One entry per enable rising edge.
    pub pulses: Vec<Direction>,
    /// Number of writes to the enable line.
    pub enable_writes: usize,
    fail: bool,
}

impl MockMotorLines {
    /// Creates new mock lines, enable low, direction unset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write fail with `Err(())`.
    pub fn with_failure(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Sum of pulse signs.
    pub fn position(&self) -> i64 {
        self.pulses.iter().map(|d| d.sign() as i64).sum()
    }
}

impl MotorLines for MockMotorLines {
    type Error = ();

    fn set_direction(&mut self, dir: Direction) -> Result<(), ()> {
        if self.fail {
            return Err(());
        }
        self.direction = Some(dir);
        Ok(())
    }

    fn set_enable(&mut self, asserted: bool) -> Result<(), ()> {
        if self.fail {
            return Err(());
        }
        self.enable_writes += 1;
        if asserted && !self.enabled {
            if let Some(dir) = self.direction {
                self.pulses.push(dir);
            }
        }
        self.enabled = asserted;
        Ok(())
    }
}

/// Mock limit sensors.
///
/// Sensors change only when the test calls [`set_pressed`](Self::set_pressed),
/// which fires the registered callback on a press, like a GPIO edge
/// interrupt would.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use shake_table::hal::MockSensors;
/// use shake_table::traits::{SensorId, SensorInterface};
///
/// let hits = Arc::new(AtomicUsize::new(0));
/// let counter = hits.clone();
///
/// let mut sensors = MockSensors::new();
/// sensors.on_triggered(SensorId::Far, Arc::new(move |_: SensorId| {
///     counter.fetch_add(1, Ordering::SeqCst);
/// }));
///
/// sensors.set_pressed(SensorId::Far, true);
/// sensors.set_pressed(SensorId::Far, true); // held, no new edge
/// assert!(sensors.is_triggered(SensorId::Far));
/// assert_eq!(hits.load(Ordering::SeqCst), 1);
/// ```
#[derive(Default)]
pub struct MockSensors {
    pressed: [bool; 2],
    callbacks: [Option<SensorCallback>; 2],
    /// Number of `poll_edges` calls.
    pub poll_count: usize,
}

impl MockSensors {
    /// Creates released sensors with no callbacks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a sensor's state, firing its callback on a press.
    pub fn set_pressed(&mut self, sensor: SensorId, pressed: bool) {
        let slot = sensor.index();
        let rising = pressed && !self.pressed[slot];
        self.pressed[slot] = pressed;
        if rising {
            if let Some(callback) = &self.callbacks[slot] {
                callback(sensor);
            }
        }
    }
}

impl fmt::Debug for MockSensors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockSensors")
            .field("pressed", &self.pressed)
            .field("near_callback", &self.callbacks[0].is_some())
            .field("far_callback", &self.callbacks[1].is_some())
            .field("poll_count", &self.poll_count)
            .finish()
    }
}

impl SensorInterface for MockSensors {
    fn is_triggered(&mut self, sensor: SensorId) -> bool {
        self.pressed[sensor.index()]
    }

    fn on_triggered(&mut self, sensor: SensorId, callback: SensorCallback) {
        self.callbacks[sensor.index()] = Some(callback);
    }

    fn clear_triggered(&mut self, sensor: SensorId) {
        self.callbacks[sensor.index()] = None;
    }

    fn has_callback(&self, sensor: SensorId) -> bool {
        self.callbacks[sensor.index()].is_some()
    }

    fn poll_edges(&mut self) {
        self.poll_count += 1;
    }
}

/// Mock clock and delay for testing.
///
/// Virtual microsecond time: [`Delay::delay_us`] returns immediately and
/// advances the clock, optionally by a fixed extra overhead to model step
/// execution latency.
///
/// # Example
///
/// ```rust
/// use shake_table::hal::MockClock;
/// use shake_table::traits::{Clock, Delay};
///
/// let mut clock = MockClock::new().with_overhead_us(3);
/// assert_eq!(clock.now_us(), 0);
///
/// clock.delay_us(100);
/// assert_eq!(clock.now_us(), 103);
///
/// clock.advance(7);
/// assert_eq!(clock.now_us(), 110);
/// assert_eq!(clock.delays, vec![100]);
/// ```
#[derive(Debug, Default, Clone)]
pub struct MockClock {
    current_us: u64,
    overhead_us: u64,
    /// Every requested delay, in order.
    pub delays: Vec<u64>,
}

impl MockClock {
    /// Creates a new mock clock starting at 0us.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `us` of simulated latency to every delay.
    pub fn with_overhead_us(mut self, us: u64) -> Self {
        self.overhead_us = us;
        self
    }

    /// Sets the current time in microseconds.
    pub fn set(&mut self, us: u64) {
        self.current_us = us;
    }

    /// Advances the clock by the given duration.
    pub fn advance(&mut self, us: u64) {
        self.current_us += us;
    }

    /// Sum of requested delays.
    pub fn total_delay_us(&self) -> u64 {
        self.delays.iter().sum()
    }
}

impl Clock for MockClock {
    fn now_us(&self) -> u64 {
        self.current_us
    }
}

impl Delay for MockClock {
    fn delay_us(&mut self, us: u64) {
        self.delays.push(us);
        self.current_us += us + self.overhead_us;
    }
}

// ============================================================================
// Simulated Rig
// ============================================================================

#[cfg(feature = "std")]
pub use rig::{SimMotorLines, SimSensors, SimulatedRig};

#[cfg(feature = "std")]
mod rig {
    use core::convert::Infallible;
    use std::sync::{Arc, Mutex, MutexGuard};

    use crate::traits::{Direction, MotorLines, SensorCallback, SensorId, SensorInterface};

    struct RigState {
        position: i64,
        travel: i64,
        connected: [bool; 2],
        pressed: [bool; 2],
        callbacks: [Option<SensorCallback>; 2],
        direction: Option<Direction>,
        enabled: bool,
        pulses: u64,
    }

    impl RigState {
        fn reads_pressed(&self, sensor: SensorId) -> bool {
            self.connected[sensor.index()]
                && match sensor {
                    SensorId::Near => self.position <= 0,
                    SensorId::Far => self.position >= self.travel,
                }
        }

        /// Refresh sensor levels; returns callbacks owed for new presses.
        fn update_sensors(&mut self) -> Vec<(SensorId, SensorCallback)> {
            let mut fired = Vec::new();
            for sensor in SensorId::ALL {
                let slot = sensor.index();
                let now = self.reads_pressed(sensor);
                if now && !self.pressed[slot] {
                    if let Some(cb) = &self.callbacks[slot] {
                        fired.push((sensor, cb.clone()));
                    }
                }
                self.pressed[slot] = now;
            }
            fired
        }
    }

    fn fire(callbacks: Vec<(SensorId, SensorCallback)>) {
        for (sensor, cb) in callbacks {
            cb(sensor);
        }
    }

    /// A carriage between two sensors, shared by its motor and sensor halves.
    ///
    /// Position is counted in steps from the near sensor. The near sensor
    /// reads pressed at or below 0, the far sensor at or beyond the travel.
    /// Each enable rising edge moves the carriage one step in the current
    /// direction and delivers sensor callbacks immediately, like an edge
    /// interrupt.
    #[derive(Clone)]
    pub struct SimulatedRig {
        state: Arc<Mutex<RigState>>,
    }

    impl SimulatedRig {
        /// Sensors `travel_steps` apart, carriage at `start_position`.
        pub fn new(travel_steps: u32, start_position: i64) -> Self {
            let mut state = RigState {
                position: start_position,
                travel: i64::from(travel_steps),
                connected: [true; 2],
                pressed: [false; 2],
                callbacks: [None, None],
                direction: None,
                enabled: false,
                pulses: 0,
            };
            let _ = state.update_sensors();
            Self {
                state: Arc::new(Mutex::new(state)),
            }
        }

        /// The far sensor never reads pressed.
        pub fn with_far_sensor_disconnected(self) -> Self {
            self.disconnect(SensorId::Far);
            self
        }

        /// The near sensor never reads pressed.
        pub fn with_near_sensor_disconnected(self) -> Self {
            self.disconnect(SensorId::Near);
            self
        }

        fn disconnect(&self, sensor: SensorId) {
            let mut state = self.lock();
            state.connected[sensor.index()] = false;
            let _ = state.update_sensors();
        }

        fn lock(&self) -> MutexGuard<'_, RigState> {
            self.state.lock().unwrap_or_else(|e| e.into_inner())
        }

        /// Carriage position in steps from the near sensor.
        pub fn position(&self) -> i64 {
            self.lock().position
        }

        /// Move the carriage by hand, firing callbacks for new presses.
        pub fn set_position(&self, position: i64) {
            let fired = {
                let mut state = self.lock();
                state.position = position;
                state.update_sensors()
            };
            fire(fired);
        }

        /// Steps pulsed so far.
        pub fn pulses(&self) -> u64 {
            self.lock().pulses
        }

        /// Current level of the enable line.
        pub fn enabled(&self) -> bool {
            self.lock().enabled
        }

        /// Whether `sensor` currently reads pressed.
        pub fn is_pressed(&self, sensor: SensorId) -> bool {
            self.lock().pressed[sensor.index()]
        }

        /// Motor half of the rig.
        pub fn motor_lines(&self) -> SimMotorLines {
            SimMotorLines { rig: self.clone() }
        }

        /// Sensor half of the rig.
        pub fn sensors(&self) -> SimSensors {
            SimSensors { rig: self.clone() }
        }

        /// Both halves, for handing to a controller.
        pub fn split(&self) -> (SimMotorLines, SimSensors) {
            (self.motor_lines(), self.sensors())
        }
    }

    impl core::fmt::Debug for SimulatedRig {
        fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
            let state = self.lock();
            f.debug_struct("SimulatedRig")
                .field("position", &state.position)
                .field("travel", &state.travel)
                .field("pressed", &state.pressed)
                .finish()
        }
    }

    /// Motor lines of a [`SimulatedRig`].
    #[derive(Debug, Clone)]
    pub struct SimMotorLines {
        rig: SimulatedRig,
    }

    impl MotorLines for SimMotorLines {
        type Error = Infallible;

        fn set_direction(&mut self, dir: Direction) -> Result<(), Infallible> {
            self.rig.lock().direction = Some(dir);
            Ok(())
        }

        fn set_enable(&mut self, asserted: bool) -> Result<(), Infallible> {
            let fired = {
                let mut state = self.rig.lock();
                let rising = asserted && !state.enabled;
                state.enabled = asserted;
                match (rising, state.direction) {
                    (true, Some(dir)) => {
                        state.position += i64::from(dir.sign());
                        state.pulses += 1;
                        state.update_sensors()
                    }
                    _ => Vec::new(),
                }
            };
            // Callbacks run without the lock held
            fire(fired);
            Ok(())
        }
    }

    /// Sensor pair of a [`SimulatedRig`].
    #[derive(Debug, Clone)]
    pub struct SimSensors {
        rig: SimulatedRig,
    }

    impl SensorInterface for SimSensors {
        fn is_triggered(&mut self, sensor: SensorId) -> bool {
            self.rig.is_pressed(sensor)
        }

        fn on_triggered(&mut self, sensor: SensorId, callback: SensorCallback) {
            self.rig.lock().callbacks[sensor.index()] = Some(callback);
        }

        fn clear_triggered(&mut self, sensor: SensorId) {
            self.rig.lock().callbacks[sensor.index()] = None;
        }

        fn has_callback(&self, sensor: SensorId) -> bool {
            self.rig.lock().callbacks[sensor.index()].is_some()
        }
    }
}
