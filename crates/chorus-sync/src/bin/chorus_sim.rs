//! Chorus simulator - plays a simulated multi-part song and reports drift
//!
//! Each part runs on its own slightly skewed clock. The sync group samples
//! the drift and re-seeks parts that wander past the threshold; the
//! correction log is printed as JSON on stdout.
//!
//! ## Usage
//!
//! ```text
//! chorus-sim [CONFIG.yaml] [--seconds N] [--buffered]
//! ```
//!
//! Without a config path the default location is used
//! (`~/.config/chorus-sync/config.yaml`); a missing file means defaults.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Serialize;

use chorus_sync::config::{default_config_path, load_config};
use chorus_sync::host::sim::SimMediaElement;
use chorus_sync::{DriftCorrection, GroupEvent, HostProfile, MediaElement, SyncConfig, SyncGroup};

/// Simulation step
const TICK: Duration = Duration::from_millis(20);

/// (label, duration in seconds, clock skew)
const PARTS: &[(&str, f64, f64)] = &[
    ("mix", 180.0, 0.0),
    ("bass", 180.0, 0.004),
    ("click", 120.0, -0.006),
    ("vocals", 175.0, 0.011),
];

#[derive(Serialize)]
struct Report<'a> {
    simulated_secs: f64,
    threshold_ms: u64,
    samples_taken: usize,
    events: Vec<&'static str>,
    corrections: &'a [DriftCorrection],
}

struct Args {
    config_path: PathBuf,
    seconds: f64,
    buffered: bool,
}

fn parse_args() -> Result<Args> {
    let mut config_path = None;
    let mut seconds = 10.0;
    let mut buffered = false;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--seconds" => {
                let value = args.next().context("--seconds needs a value")?;
                seconds = value
                    .parse()
                    .with_context(|| format!("invalid --seconds value: {}", value))?;
            }
            "--buffered" => buffered = true,
            flag if flag.starts_with("--") => bail!("unknown flag: {}", flag),
            path => config_path = Some(PathBuf::from(path)),
        }
    }

    Ok(Args {
        config_path: config_path.unwrap_or_else(default_config_path),
        seconds,
        buffered,
    })
}

fn main() -> Result<()> {
    // Initialize logger - set RUST_LOG=debug to see every correction
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args = parse_args()?;
    let config: SyncConfig = load_config(&args.config_path);

    let parts: Vec<(SimMediaElement, f64)> = PARTS
        .iter()
        .map(|(label, duration, skew)| (SimMediaElement::new(label, *duration), *skew))
        .collect();

    let mut group = SyncGroup::new(config);
    if args.buffered {
        group.set_host_profile(HostProfile::Buffered);
    }
    let events = group.subscribe();
    group
        .initialize(
            parts
                .iter()
                .map(|(sim, _)| Box::new(sim.clone()) as Box<dyn MediaElement>)
                .collect(),
        )
        .context("failed to build the sync group")?;

    log::info!(
        "chorus-sim: {} parts, simulating {:.1}s",
        parts.len(),
        args.seconds
    );

    group.play();
    let ticks = (args.seconds / TICK.as_secs_f64()).ceil() as u64;
    for _ in 0..ticks {
        for (sim, skew) in &parts {
            sim.advance(TICK.as_secs_f64() * (1.0 + skew));
        }
        group.advance(TICK);
    }
    group.pause();
    group.pump();

    let report = Report {
        simulated_secs: group.now().as_secs_f64(),
        threshold_ms: group.host_profile().threshold_ms(&group.config().drift),
        samples_taken: group.drift_samples().len(),
        events: events.try_iter().map(|e: GroupEvent| e.name()).collect(),
        corrections: group.drift_corrections(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    log::info!(
        "chorus-sim: {} corrections over {} samples",
        report.corrections.len(),
        report.samples_taken
    );
    Ok(())
}
