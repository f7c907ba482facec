//! Drowsiness Monitor - Replay Entry Point
//!
//! Drives the session controller from a recorded landmark stream
//! (NDJSON, one record per camera frame). Capture and detection are
//! external; this binary stands in for them with pre-computed frames.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

use alerting::{AlertSound, MutedAlert, WavAlert};
use anyhow::{Context, Result};
use clap::Parser;
use face_geometry::LandmarkFrame;
use monitor::{MonitorConfig, Phase, ReplayDetector, SessionController};
use serde::Deserialize;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Debug, Parser)]
#[command(name = "monitor-cli", about = "Real-time drowsiness monitor (replay driver)")]
struct Args {
    /// Landmark replay file (NDJSON), "-" for stdin
    #[arg(default_value = "-")]
    input: String,

    /// Calibration window in seconds
    #[arg(long, default_value_t = 15.0)]
    calibration_secs: f64,

    /// Alert sound asset
    #[arg(long, default_value = "assets/alarm.wav")]
    alarm: PathBuf,

    /// Disable the audible alert
    #[arg(long)]
    no_sound: bool,
}

/// One recorded camera frame: capture time plus the detector output
/// (absent when no face was found).
#[derive(Debug, Deserialize)]
struct ReplayRecord {
    t: f64,
    #[serde(default)]
    frame: Option<LandmarkFrame>,
}

fn init_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}

fn open_input(path: &str) -> Result<Box<dyn BufRead>> {
    if path == "-" {
        return Ok(Box::new(BufReader::new(io::stdin())));
    }
    let file = File::open(path).with_context(|| format!("cannot open replay file {path}"))?;
    Ok(Box::new(BufReader::new(file)))
}

fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();

    info!("=== Drowsiness Monitor v{} ===", env!("CARGO_PKG_VERSION"));

    let config = MonitorConfig {
        calibration_secs: args.calibration_secs,
        sound_enabled: !args.no_sound,
        alert_asset: args.alarm.clone(),
        ..MonitorConfig::default()
    };
    let sound: Box<dyn AlertSound> = if args.no_sound {
        Box::new(MutedAlert)
    } else {
        Box::new(WavAlert::new(&config.alert_asset))
    };
    let mut session = SessionController::new(config, ReplayDetector, sound);

    info!("waiting for face...");

    let mut frames = 0u64;
    let mut alarms = 0u64;
    let mut last_phase = Phase::AwaitingFace;
    let mut last_state = None;

    for line in open_input(&args.input)?.lines() {
        let line = line.context("failed to read replay input")?;
        if line.trim().is_empty() {
            continue;
        }
        let record: ReplayRecord =
            serde_json::from_str(&line).context("malformed replay record")?;

        let report = session.process_frame(&record.frame, record.t);
        frames += 1;
        if report.alarm_fired {
            alarms += 1;
        }

        if report.phase != last_phase {
            info!(t = record.t, phase = ?report.phase, "phase change");
            last_phase = report.phase;
        }

        if let Some(progress) = report.calibration_progress {
            if frames % 30 == 0 {
                info!("calibrating... {:.0}%", progress * 100.0);
            }
        }

        if report.state != last_state {
            if let (Some(state), Some(means)) = (report.state, report.means) {
                info!(
                    t = record.t,
                    ear = format_args!("{:.3}", means.ear),
                    mar = format_args!("{:.3}", means.mar),
                    pitch = format_args!("{:.1}", means.pitch),
                    yaw = format_args!("{:.1}", means.yaw),
                    roll = format_args!("{:.1}", means.roll),
                    "status: {state}"
                );
            }
            last_state = report.state;
        }

        if report.head_off_axis {
            if let Some(features) = report.features {
                info!(
                    t = record.t,
                    pitch = format_args!("{:.1}", features.pitch),
                    yaw = format_args!("{:.1}", features.yaw),
                    roll = format_args!("{:.1}", features.roll),
                    "head off axis"
                );
            }
        }
    }

    info!(frames, alarms, "replay finished");
    Ok(())
}
