//! Wall-clock step pacer for desktop and Linux targets.

use std::time::{Duration, Instant};

use crate::traits::{Clock, Delay};

/// Clock and delay backed by [`Instant`] and [`std::thread::sleep`].
///
/// Sleep granularity is the OS scheduler's, so short delays overshoot. That
/// overshoot shows up as drift in playback reports.
///
/// # Example
///
/// ```rust
/// use shake_table::hal::StdTimer;
/// use shake_table::traits::{Clock, Delay};
///
/// let mut timer = StdTimer::new();
/// let start = timer.now_us();
/// timer.delay_us(200);
/// assert!(timer.now_us() - start >= 200);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct StdTimer {
    epoch: Instant,
}

impl StdTimer {
    /// Creates a timer whose epoch is now.
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for StdTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for StdTimer {
    #[inline]
    fn now_us(&self) -> u64 {
        self.epoch.elapsed().as_micros() as u64
    }
}

impl Delay for StdTimer {
    fn delay_us(&mut self, us: u64) {
        if us > 0 {
            std::thread::sleep(Duration::from_micros(us));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_is_monotonic() {
        let timer = StdTimer::new();
        let a = timer.now_us();
        let b = timer.now_us();
        assert!(b >= a);
    }

    #[test]
    fn zero_delay_returns_immediately() {
        let mut timer = StdTimer::new();
        timer.delay_us(0);
        timer.delay_us(1_000);
        assert!(timer.now_us() >= 1_000);
    }
}
