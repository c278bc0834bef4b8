//! Commissioning helpers for wiring up a new table.
//!
//! Neither helper arms the estop callbacks: they are meant to be run by hand,
//! before the controller takes ownership of the hardware, to check which
//! input is which sensor and how far apart the sensors are.

use tracing::{debug, info};

use crate::error::MotorFault;
use crate::motor::MotorDriver;
use crate::traits::{Clock, Delay, Direction, MotorLines, SensorId, SensorInterface};

/// Result of [`measure_travel`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TravelMeasurement {
    /// Steps taken before stopping
    pub steps: u32,
    /// Sensor that stopped the move, or `None` if the step limit ran out
    pub stopped_by: Option<SensorId>,
}

fn first_pressed<S: SensorInterface>(sensors: &mut S) -> Option<SensorId> {
    SensorId::ALL
        .into_iter()
        .find(|&sensor| sensors.is_triggered(sensor))
}

/// Wait until either sensor reads pressed and report which one.
///
/// Polls every `poll_interval_us`. With `max_polls` set, gives up and returns
/// `None` after that many polls; otherwise waits indefinitely. When both
/// read pressed, the near sensor is reported.
pub fn identify_sensor<S, D>(
    sensors: &mut S,
    delay: &mut D,
    poll_interval_us: u64,
    max_polls: Option<u32>,
) -> Option<SensorId>
where
    S: SensorInterface,
    D: Delay,
{
    let mut polls = 0u32;
    loop {
        if let Some(sensor) = first_pressed(sensors) {
            info!(sensor = sensor.as_str(), polls, "sensor pressed");
            return Some(sensor);
        }
        if max_polls.is_some_and(|max| polls >= max) {
            debug!(polls, "no sensor pressed");
            return None;
        }
        delay.delay_us(poll_interval_us);
        polls += 1;
    }
}

/// Step in `dir` until either sensor reads pressed, counting the steps.
///
/// Paced at `interval_us` per step. With `max_steps` set, stops after that
/// many steps even if no sensor was reached.
pub fn measure_travel<L, S, T>(
    motor: &mut MotorDriver<L>,
    sensors: &mut S,
    timer: &mut T,
    dir: Direction,
    interval_us: u64,
    max_steps: Option<u32>,
) -> Result<TravelMeasurement, MotorFault<L::Error>>
where
    L: MotorLines,
    S: SensorInterface,
    T: Clock + Delay,
{
    let started = timer.now_us();
    let mut steps = 0u32;
    let stopped_by = loop {
        if let Some(sensor) = first_pressed(sensors) {
            break Some(sensor);
        }
        if max_steps.is_some_and(|max| steps >= max) {
            break None;
        }
        timer.delay_us(interval_us);
        motor.step(dir)?;
        steps += 1;
    };

    info!(
        steps,
        dir = dir.as_str(),
        stopped_by = stopped_by.map_or("limit", |s| s.as_str()),
        elapsed_us = timer.now_us().saturating_sub(started),
        "travel measured"
    );
    Ok(TravelMeasurement { steps, stopped_by })
}
