//! Shake table against a simulated rig.
//!
//! Runs the full calibrate, center, and sine sequence in real time on the
//! desktop, with a carriage that exists only in memory. Useful to watch the
//! controller's logging and measure playback drift on the host.
//!
//! # Usage
//!
//! ```bash
//! # Defaults: 250 steps, 5 Hz, 3 s
//! cargo run --features sim --bin shake_sim
//!
//! # amplitude frequency duration [travel]
//! RUST_LOG=debug cargo run --features sim --bin shake_sim -- 120 2.0 4.0 800
//!
//! # Name shown in the log
//! SHAKE_TABLE_NAME=bench-2 cargo run --features sim --bin shake_sim
//! ```

use anyhow::{bail, Context};
use tracing::info;
use tracing_subscriber::EnvFilter;

use shake_table::hal::{SimulatedRig, StdTimer};
use shake_table::{Config, DeviceConfig, RunSineRequest, ShakeTable};

/// Default distance between the simulated sensors
const DEFAULT_TRAVEL_STEPS: u32 = 1000;

fn parse_args() -> anyhow::Result<(RunSineRequest, u32)> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() > 4 {
        bail!("usage: shake_sim [amplitude] [frequency] [duration] [travel]");
    }

    let mut req = RunSineRequest::default();
    let mut travel = DEFAULT_TRAVEL_STEPS;
    if let Some(a) = args.first() {
        req.amplitude = a.parse().context("amplitude must be an integer")?;
    }
    if let Some(f) = args.get(1) {
        req.frequency = f.parse().context("frequency must be a number")?;
    }
    if let Some(d) = args.get(2) {
        req.duration = d.parse().context("duration must be a number")?;
    }
    if let Some(t) = args.get(3) {
        travel = t.parse().context("travel must be a positive integer")?;
    }
    Ok((req, travel))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let (req, travel) = parse_args()?;
    let mut config = Config::default();
    if let Ok(name) = std::env::var("SHAKE_TABLE_NAME") {
        config = config.with_device(DeviceConfig::default().with_name(&name));
    }
    info!(
        device = %config.device.name,
        amplitude = req.amplitude,
        frequency = req.frequency,
        duration = req.duration,
        travel,
        "starting simulated shake table"
    );

    // Start off-center so calibration has something to do
    let rig = SimulatedRig::new(travel, i64::from(travel / 3));
    let (lines, sensors) = rig.split();
    let mut table =
        ShakeTable::new(lines, sensors, StdTimer::new()).with_config(config.table.clone());

    let total = table.calibrate().context("calibration failed")?;
    info!(total, position = rig.position(), "rig calibrated");

    table.center().context("centering failed")?;
    info!(position = rig.position(), "rig centered");

    let params = req.to_sine_params(config.waveform.sampling_rate_hz);
    let before = rig.position();
    match table.run_sine(&params) {
        Ok(report) => info!(
            steps = report.steps,
            net = report.net_displacement,
            moved = rig.position() - before,
            drift_us = report.drift_us(),
            "sine finished"
        ),
        Err(e) if e.is_emergency_stop() => {
            info!(position = rig.position(), "sine hit a limit sensor, table estopped");
        }
        Err(e) => return Err(e).context("playback failed"),
    }

    Ok(())
}
