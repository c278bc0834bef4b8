//! Waveform-to-step discretization.
//!
//! Converts a continuous amplitude-vs-time signal (amplitude in steps) into
//! the ordered list of unit steps a stepper must take to follow it, with the
//! delay before each step.
//!
//! # Algorithm
//!
//! Every integer level between `floor(min)` and `ceil(max)` is scanned
//! against each adjacent sample pair:
//!
//! - upward crossing: `a[i] < level <= a[i+1]`, a `+1` step
//! - downward crossing: `a[i] > level >= a[i+1]`, a `-1` step
//!
//! The crossing time is linearly interpolated between the two samples.
//! Crossings from all levels are pooled and stably sorted by time, so
//! simultaneous crossings keep their collection order (levels ascending,
//! upward before downward within a level, then sample index). That order is
//! deterministic but carries no further meaning.
//!
//! # Limitations
//!
//! Sampling is assumed dense enough that the amplitude never moves by more
//! than one level between adjacent samples. A pair that spans several levels
//! still yields one crossing per level, but a pair that rises and falls
//! within one sample period is under-counted.
//!
//! # Example
//!
//! ```rust
//! use shake_table::discretize::{discretize, Discretization};
//! use shake_table::Direction;
//!
//! let time = [0.0, 1.0];
//! let amplitude = [0.5, 1.5];
//!
//! match discretize(&time, &amplitude).unwrap() {
//!     Discretization::Steps(plan) => {
//!         assert_eq!(plan.len(), 1);
//!         let step = plan.events()[0];
//!         assert_eq!(step.direction, Direction::Away);
//!         assert!((step.fire_time - 0.5).abs() < 1e-12);
//!     }
//!     Discretization::NoSteps => unreachable!(),
//! }
//! ```

extern crate alloc;
use alloc::vec::Vec;

use crate::error::ValidationError;
use crate::traits::Direction;
use crate::waveform::{validate, Waveform};

/// One unit step of the carriage.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StepEvent {
    /// Step direction (`Away` = +1, `Toward` = -1)
    pub direction: Direction,
    /// Interpolated crossing time in seconds
    pub fire_time: f64,
    /// Seconds since the previous step (or since the waveform start)
    pub delay: f64,
}

/// A non-empty, time-ordered sequence of [`StepEvent`]s.
#[derive(Clone, Debug, PartialEq)]
pub struct StepPlan {
    events: Vec<StepEvent>,
    start_time: f64,
}

impl StepPlan {
    /// The steps in firing order.
    #[inline]
    pub fn events(&self) -> &[StepEvent] {
        &self.events
    }

    /// Number of steps (always at least one).
    #[inline]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Always false: an empty plan is reported as [`Discretization::NoSteps`].
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Time of the first waveform sample; the first delay is measured from it.
    #[inline]
    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    /// Fire time of the last step.
    pub fn end_time(&self) -> f64 {
        self.events[self.events.len() - 1].fire_time
    }

    /// Sum of all step signs.
    pub fn net_displacement(&self) -> i64 {
        self.events
            .iter()
            .map(|e| e.direction.sign() as i64)
            .sum()
    }

    /// Iterate over the steps.
    pub fn iter(&self) -> core::slice::Iter<'_, StepEvent> {
        self.events.iter()
    }

    /// Take the events out of the plan.
    pub fn into_events(self) -> Vec<StepEvent> {
        self.events
    }
}

impl<'a> IntoIterator for &'a StepPlan {
    type Item = &'a StepEvent;
    type IntoIter = core::slice::Iter<'a, StepEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

/// Result of discretizing a valid waveform.
///
/// A flat waveform is reported explicitly rather than as an empty plan, so a
/// caller cannot loop over zero steps and mistake it for a completed move.
#[must_use]
#[derive(Clone, Debug, PartialEq)]
pub enum Discretization {
    /// At least one step must be taken.
    Steps(StepPlan),
    /// The waveform never crosses an integer level.
    NoSteps,
}

impl Discretization {
    /// Convert to a plan, treating a flat waveform as a validation failure.
    pub fn into_plan(self) -> Result<StepPlan, ValidationError> {
        match self {
            Discretization::Steps(plan) => Ok(plan),
            Discretization::NoSteps => Err(ValidationError::NoSteps),
        }
    }

    /// Returns true for [`Discretization::NoSteps`].
    pub fn is_flat(&self) -> bool {
        matches!(self, Discretization::NoSteps)
    }
}

/// Linear interpolation of `y` at `x` between `(x0, y0)` and `(x1, y1)`.
///
/// Exact at the end points, which matters for samples lying on a level.
#[inline]
fn interp(x: f64, x0: f64, x1: f64, y0: f64, y1: f64) -> f64 {
    if x == x1 {
        y1
    } else if x == x0 {
        y0
    } else {
        y0 + (x - x0) * (y1 - y0) / (x1 - x0)
    }
}

/// Discretize paired `time`/`amplitude` samples into unit steps.
///
/// Fails with [`ValidationError`] (and produces nothing) when the inputs are
/// not a valid waveform.
pub fn discretize(time: &[f64], amplitude: &[f64]) -> Result<Discretization, ValidationError> {
    validate(time, amplitude)?;
    Ok(discretize_unchecked(time, amplitude))
}

impl Waveform {
    /// Discretize this waveform. See [`discretize`].
    pub fn discretize(&self) -> Discretization {
        discretize_unchecked(self.time(), self.amplitude())
    }
}

fn discretize_unchecked(time: &[f64], amplitude: &[f64]) -> Discretization {
    let (min, max) = amplitude
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &a| {
            (lo.min(a), hi.max(a))
        });
    let min_level = libm::floor(min) as i64;
    let max_level = libm::ceil(max) as i64;

    let mut crossings: Vec<(f64, Direction)> = Vec::new();

    for level in min_level..=max_level {
        let level = level as f64;

        for (i, w) in amplitude.windows(2).enumerate() {
            let (a0, a1) = (w[0], w[1]);
            if a0 < level && level <= a1 {
                let t = interp(level, a0, a1, time[i], time[i + 1]);
                crossings.push((t, Direction::Away));
            }
        }

        for (i, w) in amplitude.windows(2).enumerate() {
            let (a0, a1) = (w[0], w[1]);
            if a0 > level && level >= a1 {
                let t = interp(level, a1, a0, time[i + 1], time[i]);
                crossings.push((t, Direction::Toward));
            }
        }
    }

    if crossings.is_empty() {
        return Discretization::NoSteps;
    }

    // Stable: equal times keep collection order
    crossings.sort_by(|a, b| a.0.total_cmp(&b.0));

    let start_time = time[0];
    let mut previous = start_time;
    let events = crossings
        .into_iter()
        .map(|(fire_time, direction)| {
            let delay = fire_time - previous;
            previous = fire_time;
            StepEvent {
                direction,
                fire_time,
                delay,
            }
        })
        .collect();

    Discretization::Steps(StepPlan { events, start_time })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn plan(time: &[f64], amplitude: &[f64]) -> StepPlan {
        discretize(time, amplitude).unwrap().into_plan().unwrap()
    }

    #[test]
    fn single_upward_crossing_is_interpolated() {
        let p = plan(&[1.0, 3.0], &[0.2, 1.2]);
        assert_eq!(p.len(), 1);
        let e = p.events()[0];
        assert_eq!(e.direction, Direction::Away);
        // Level 1 sits 80% of the way from 0.2 to 1.2
        assert!((e.fire_time - 2.6).abs() < 1e-12);
        assert!((e.delay - 1.6).abs() < 1e-12);
        assert_eq!(p.start_time(), 1.0);
    }

    #[test]
    fn single_downward_crossing_is_interpolated() {
        let p = plan(&[0.0, 1.0], &[2.5, 1.5]);
        assert_eq!(p.len(), 1);
        let e = p.events()[0];
        assert_eq!(e.direction, Direction::Toward);
        assert!((e.fire_time - 0.5).abs() < 1e-12);
    }

    #[test]
    fn flat_waveform_reports_no_steps() {
        let d = discretize(&[0.0, 1.0, 2.0], &[3.0, 3.0, 3.0]).unwrap();
        assert!(d.is_flat());
        assert_eq!(d.into_plan(), Err(ValidationError::NoSteps));
    }

    #[test]
    fn wobble_inside_one_level_is_flat() {
        let d = discretize(&[0.0, 1.0, 2.0, 3.0], &[0.1, 0.9, 0.2, 0.8]).unwrap();
        assert_eq!(d, Discretization::NoSteps);
    }

    #[test]
    fn sample_landing_on_level_counts_once() {
        // Rises onto 1.0 exactly, then continues
        let p = plan(&[0.0, 1.0, 2.0], &[0.5, 1.0, 1.5]);
        assert_eq!(p.len(), 1);
        assert_eq!(p.events()[0].fire_time, 1.0);
    }

    #[test]
    fn touching_a_level_from_below_counts_only_the_rise() {
        // Downward crossings need to start strictly above the level
        let p = plan(&[0.0, 1.0, 2.0], &[0.5, 1.0, 0.5]);
        let dirs: Vec<_> = p.iter().map(|e| e.direction).collect();
        assert_eq!(dirs, vec![Direction::Away]);
        assert_eq!(p.net_displacement(), 1);
    }

    #[test]
    fn crossing_through_a_level_steps_both_ways() {
        let p = plan(&[0.0, 1.0, 2.0], &[0.5, 1.5, 0.5]);
        let dirs: Vec<_> = p.iter().map(|e| e.direction).collect();
        assert_eq!(dirs, vec![Direction::Away, Direction::Toward]);
        assert_eq!(p.net_displacement(), 0);
    }

    #[test]
    fn delays_sum_to_last_fire_time() {
        let p = plan(&[0.5, 1.0, 2.0, 3.0], &[0.0, 2.2, 4.1, 1.3]);
        let total: f64 = p.iter().map(|e| e.delay).sum();
        assert!((total - (p.end_time() - p.start_time())).abs() < 1e-12);
        assert!(p.iter().all(|e| e.delay >= 0.0));
    }

    #[test]
    fn mismatched_lengths_fail() {
        assert_eq!(
            discretize(&[0.0, 1.0], &[0.0]),
            Err(ValidationError::LengthMismatch {
                time: 2,
                amplitude: 1
            })
        );
    }

    #[test]
    fn multi_level_jump_counts_one_step_per_level() {
        let p = plan(&[0.0, 1.0], &[0.0, 3.0]);
        assert_eq!(p.len(), 3);
        let times: Vec<_> = p.iter().map(|e| e.fire_time).collect();
        assert!((times[0] - 1.0 / 3.0).abs() < 1e-12);
        assert!((times[1] - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(times[2], 1.0);
    }

    #[test]
    fn simultaneous_crossings_keep_collection_order() {
        // Both crossings land on t = 1.0: level 0 downward, level 1 upward.
        // Level 0 is collected first.
        let p = plan(&[0.0, 1.0, 1.0, 2.0], &[0.5, 0.0, 1.0, 1.5]);
        let dirs: Vec<_> = p.iter().map(|e| e.direction).collect();
        assert_eq!(dirs, vec![Direction::Toward, Direction::Away]);
    }
}
