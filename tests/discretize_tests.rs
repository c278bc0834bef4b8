//! Integration tests for waveform generation and discretization.

use shake_table::{
    discretize, generate_sine, Direction, Discretization, SineParams, StepPlan, ValidationError,
    Waveform,
};

fn sine_plan(amplitude: i32, frequency: f64, duration: f64, rate: u32) -> (Waveform, StepPlan) {
    let wave = generate_sine(amplitude, frequency, duration, rate).unwrap();
    let plan = wave.discretize().into_plan().unwrap();
    (wave, plan)
}

fn directions(plan: &StepPlan) -> Vec<Direction> {
    plan.iter().map(|e| e.direction).collect()
}

// ============================================================================
// Sine Playback Plans
// ============================================================================

#[test]
fn one_sine_cycle_steps_up_down_up() {
    // 999 Hz keeps every sample off the integer levels except t = 0
    let (wave, plan) = sine_plan(3, 1.0, 1.0, 999);

    use Direction::{Away as A, Toward as T};
    assert_eq!(directions(&plan), vec![A, A, T, T, T, T, T, A, A]);
    assert_eq!(plan.net_displacement(), -1);
    assert_eq!(wave.net_level_change(), -1);
}

#[test]
fn sine_starts_away_from_the_motor() {
    let (_, plan) = sine_plan(250, 5.0, 3.0, 10_000);
    assert_eq!(plan.events()[0].direction, Direction::Away);
}

#[test]
fn sine_net_displacement_tracks_level_change() {
    // A prime rate keeps peaks and zero crossings off the sample grid
    for (amp, freq, dur) in [(3, 2.0, 1.0), (250, 5.0, 3.0), (40, 0.7, 2.3), (1, 3.0, 0.5)] {
        let (wave, plan) = sine_plan(amp, freq, dur, 9_973);
        let diff = plan.net_displacement() - wave.net_level_change();
        assert!(diff.abs() <= 1, "amp {amp} freq {freq} dur {dur}: off by {diff}");
    }
}

#[test]
fn sine_fire_times_are_ordered() {
    let (wave, plan) = sine_plan(40, 0.7, 2.3, 10_000);

    let times: Vec<f64> = plan.iter().map(|e| e.fire_time).collect();
    assert!(times.windows(2).all(|w| w[0] <= w[1]));
    assert!(plan.iter().all(|e| e.delay >= 0.0));

    let first = wave.time()[0];
    let last = wave.time()[wave.len() - 1];
    assert!(plan.start_time() == first);
    assert!(plan.end_time() <= last);

    let total: f64 = plan.iter().map(|e| e.delay).sum();
    assert!((total - (plan.end_time() - first)).abs() < 1e-9);
}

#[test]
fn larger_sine_needs_more_steps() {
    let (_, small) = sine_plan(3, 2.0, 1.0, 1000);
    let (_, large) = sine_plan(30, 2.0, 1.0, 1000);
    assert!(large.len() > small.len() * 5);
}

#[test]
fn zero_amplitude_sine_is_flat() {
    let wave = SineParams::new(0, 5.0, 1.0)
        .with_sampling_rate(100)
        .generate()
        .unwrap();
    assert!(wave.discretize().is_flat());
    assert_eq!(
        wave.discretize().into_plan(),
        Err(ValidationError::NoSteps)
    );
}

// ============================================================================
// Slice Input
// ============================================================================

#[test]
fn slices_and_waveform_agree() {
    let time = [0.0, 0.1, 0.2, 0.3, 0.4];
    let amplitude = [0.0, 1.7, 2.4, 0.9, -1.2];
    let wave = Waveform::new(time.to_vec(), amplitude.to_vec()).unwrap();

    assert_eq!(discretize(&time, &amplitude).unwrap(), wave.discretize());
}

#[test]
fn descending_ramp_steps_toward() {
    let time = [0.0, 1.0, 2.0];
    let amplitude = [2.5, 1.5, 0.5];

    let plan = match discretize(&time, &amplitude).unwrap() {
        Discretization::Steps(plan) => plan,
        Discretization::NoSteps => panic!("expected steps"),
    };
    assert_eq!(directions(&plan), vec![Direction::Toward, Direction::Toward]);
    assert!((plan.events()[0].fire_time - 0.5).abs() < 1e-12);
    assert!((plan.events()[1].fire_time - 1.5).abs() < 1e-12);
    assert!((plan.events()[1].delay - 1.0).abs() < 1e-12);
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn malformed_input_is_rejected() {
    assert_eq!(
        discretize(&[0.0, 1.0, 2.0], &[0.0, 1.0]),
        Err(ValidationError::LengthMismatch {
            time: 3,
            amplitude: 2
        })
    );
    assert_eq!(
        discretize(&[0.0], &[4.0]),
        Err(ValidationError::TooFewSamples { len: 1 })
    );
    assert_eq!(
        discretize(&[0.0, 1.0], &[0.0, f64::INFINITY]),
        Err(ValidationError::NonFinite { index: 1 })
    );
    assert_eq!(
        discretize(&[0.0, 1.0, 0.5, 2.0], &[0.0, 1.0, 2.0, 3.0]),
        Err(ValidationError::TimeDecreasing { index: 2 })
    );
}

#[test]
fn sine_parameters_are_checked() {
    assert!(matches!(
        generate_sine(10, -1.0, 1.0, 100),
        Err(ValidationError::InvalidParameter { name: "frequency", .. })
    ));
    assert!(matches!(
        generate_sine(10, 1.0, 0.0, 100),
        Err(ValidationError::InvalidParameter { name: "duration", .. })
    ));
    assert!(matches!(
        generate_sine(10, 1.0, 1.0, 0),
        Err(ValidationError::InvalidParameter { name: "sampling_rate", .. })
    ));
    assert_eq!(
        generate_sine(10, 1.0, 0.001, 100),
        Err(ValidationError::TooFewSamples { len: 0 })
    );
}
