//! Adapters from `embedded-hal` 1.0 digital pins to the table's hardware traits.
//!
//! Works with any HAL that implements [`OutputPin`] and [`InputPin`] (Linux
//! GPIO character devices, RP2040, ESP32, ...). Polarity comes from
//! [`PinConfig`]; pin numbering is the caller's business.
//!
//! Sensor edges are detected in software: [`GpioSensors::poll_edges`] compares
//! the current reading with the previous one and fires callbacks for new
//! presses. The controller polls before every step.

extern crate alloc;

use embedded_hal::digital::{InputPin, OutputPin, PinState};
use thiserror::Error;
use tracing::warn;

use crate::config::PinConfig;
use crate::traits::{Direction, MotorLines, SensorCallback, SensorId, SensorInterface};

/// A motor line write failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LineError<EN, DIR> {
    /// Writing the enable/pulse line failed
    #[error("enable line: {0:?}")]
    Enable(EN),
    /// Writing the direction line failed
    #[error("direction line: {0:?}")]
    Direction(DIR),
}

/// Step/direction driver on two output pins.
pub struct GpioMotorLines<EN, DIR> {
    enable: EN,
    direction: DIR,
    away_level_high: bool,
}

impl<EN: OutputPin, DIR: OutputPin> GpioMotorLines<EN, DIR> {
    /// Wrap the pins using the polarity from `pins`.
    pub fn new(enable: EN, direction: DIR, pins: &PinConfig) -> Self {
        Self {
            enable,
            direction,
            away_level_high: pins.away_level_high,
        }
    }

    /// Give back the pins.
    pub fn release(self) -> (EN, DIR) {
        (self.enable, self.direction)
    }
}

impl<EN: OutputPin, DIR: OutputPin> MotorLines for GpioMotorLines<EN, DIR> {
    type Error = LineError<EN::Error, DIR::Error>;

    fn set_direction(&mut self, dir: Direction) -> Result<(), Self::Error> {
        let high = (dir == Direction::Away) == self.away_level_high;
        self.direction
            .set_state(PinState::from(high))
            .map_err(LineError::Direction)
    }

    fn set_enable(&mut self, asserted: bool) -> Result<(), Self::Error> {
        self.enable
            .set_state(PinState::from(asserted))
            .map_err(LineError::Enable)
    }
}

/// Near/far sensors on two input pins.
pub struct GpioSensors<N, F> {
    near: N,
    far: F,
    active_low: bool,
    last: [bool; 2],
    callbacks: [Option<SensorCallback>; 2],
}

impl<N: InputPin, F: InputPin> GpioSensors<N, F> {
    /// Wrap the pins using the polarity from `pins`.
    pub fn new(near: N, far: F, pins: &PinConfig) -> Self {
        Self {
            near,
            far,
            active_low: pins.sensor_active_low,
            last: [false; 2],
            callbacks: [None, None],
        }
    }

    /// Give back the pins.
    pub fn release(self) -> (N, F) {
        (self.near, self.far)
    }

    // A sensor that cannot be read is treated as pressed
    fn read(&mut self, sensor: SensorId) -> bool {
        let level = match sensor {
            SensorId::Near => self.near.is_high().map_err(|_| ()),
            SensorId::Far => self.far.is_high().map_err(|_| ()),
        };
        match level {
            Ok(high) => high != self.active_low,
            Err(()) => {
                warn!(sensor = sensor.as_str(), "sensor read failed, treating as pressed");
                true
            }
        }
    }
}

impl<N: InputPin, F: InputPin> SensorInterface for GpioSensors<N, F> {
    fn is_triggered(&mut self, sensor: SensorId) -> bool {
        self.read(sensor)
    }

    fn on_triggered(&mut self, sensor: SensorId, callback: SensorCallback) {
        // A sensor already held down at registration is not a new edge
        self.last[sensor.index()] = self.read(sensor);
        self.callbacks[sensor.index()] = Some(callback);
    }

    fn clear_triggered(&mut self, sensor: SensorId) {
        self.callbacks[sensor.index()] = None;
    }

    fn has_callback(&self, sensor: SensorId) -> bool {
        self.callbacks[sensor.index()].is_some()
    }

    fn poll_edges(&mut self) {
        for sensor in SensorId::ALL {
            let slot = sensor.index();
            let pressed = self.read(sensor);
            if pressed && !self.last[slot] {
                if let Some(callback) = &self.callbacks[slot] {
                    callback(sensor);
                }
            }
            self.last[slot] = pressed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::sync::Arc;
    use core::cell::Cell;
    use core::convert::Infallible;
    use core::sync::atomic::{AtomicUsize, Ordering};
    use embedded_hal::digital::{ErrorKind, ErrorType};

    #[derive(Default)]
    struct Pin {
        high: bool,
    }

    impl ErrorType for Pin {
        type Error = Infallible;
    }

    impl OutputPin for Pin {
        fn set_low(&mut self) -> Result<(), Infallible> {
            self.high = false;
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            self.high = true;
            Ok(())
        }
    }

    struct Input<'a> {
        high: &'a Cell<bool>,
    }

    impl ErrorType for Input<'_> {
        type Error = Infallible;
    }

    impl InputPin for Input<'_> {
        fn is_high(&mut self) -> Result<bool, Infallible> {
            Ok(self.high.get())
        }

        fn is_low(&mut self) -> Result<bool, Infallible> {
            Ok(!self.high.get())
        }
    }

    struct Broken;

    impl ErrorType for Broken {
        type Error = ErrorKind;
    }

    impl InputPin for Broken {
        fn is_high(&mut self) -> Result<bool, ErrorKind> {
            Err(ErrorKind::Other)
        }

        fn is_low(&mut self) -> Result<bool, ErrorKind> {
            Err(ErrorKind::Other)
        }
    }

    #[test]
    fn default_polarity_drives_away_low() {
        let mut lines = GpioMotorLines::new(Pin::default(), Pin::default(), &PinConfig::default());

        lines.set_direction(Direction::Away).unwrap();
        lines.set_enable(true).unwrap();
        let (enable, direction) = lines.release();
        assert!(enable.high);
        assert!(!direction.high);
    }

    #[test]
    fn inverted_direction_polarity() {
        let pins = PinConfig::default().with_away_level_high(true);
        let mut lines = GpioMotorLines::new(Pin::default(), Pin::default(), &pins);

        lines.set_direction(Direction::Away).unwrap();
        assert!(lines.direction.high);
        lines.set_direction(Direction::Toward).unwrap();
        assert!(!lines.direction.high);
    }

    #[test]
    fn active_low_sensor_reads_pressed_when_low() {
        let near = Cell::new(true);
        let far = Cell::new(false);
        let mut sensors = GpioSensors::new(
            Input { high: &near },
            Input { high: &far },
            &PinConfig::default(),
        );

        assert!(!sensors.is_triggered(SensorId::Near));
        assert!(sensors.is_triggered(SensorId::Far));
    }

    #[test]
    fn poll_edges_fires_on_new_press_only() {
        let near = Cell::new(true);
        let far = Cell::new(true);
        let hits = Arc::new(AtomicUsize::new(0));
        let mut sensors = GpioSensors::new(
            Input { high: &near },
            Input { high: &far },
            &PinConfig::default(),
        );
        let c = hits.clone();
        sensors.on_triggered(SensorId::Near, Arc::new(move |_: SensorId| {
            c.fetch_add(1, Ordering::SeqCst);
        }));

        sensors.poll_edges();
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        near.set(false);
        sensors.poll_edges();
        sensors.poll_edges();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn sensor_held_at_registration_is_not_an_edge() {
        let near = Cell::new(false);
        let far = Cell::new(true);
        let hits = Arc::new(AtomicUsize::new(0));
        let mut sensors = GpioSensors::new(
            Input { high: &near },
            Input { high: &far },
            &PinConfig::default(),
        );

        // Near already pressed (active low) when the callback goes in
        let c = hits.clone();
        sensors.on_triggered(SensorId::Near, Arc::new(move |_: SensorId| {
            c.fetch_add(1, Ordering::SeqCst);
        }));
        sensors.poll_edges();
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        near.set(true);
        sensors.poll_edges();
        near.set(false);
        sensors.poll_edges();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn read_failure_counts_as_pressed() {
        let far = Cell::new(true);
        let mut sensors = GpioSensors::new(Broken, Input { high: &far }, &PinConfig::default());
        assert!(sensors.is_triggered(SensorId::Near));
    }
}
