//! Offline recorder: capture every channel for a fixed duration and write
//! the samples to CSV for external plotting.
//!
//! ```text
//! doa-capture [SECONDS] [PATH]      (defaults: 10, uma8_capture.csv)
//! ```

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use doa_tracker::{
    audio::{new_shared_ring, AudioCapture},
    config::AppConfig,
    output::{write_capture_csv, RECORDING_LABEL},
};

const DEFAULT_SECONDS: f32 = 10.0;
const DEFAULT_OUTPUT: &str = "uma8_capture.csv";

#[derive(Debug, PartialEq)]
struct CaptureArgs {
    seconds: f32,
    output: PathBuf,
}

fn parse_args(args: &[String]) -> Result<CaptureArgs> {
    let seconds = match args.first() {
        Some(raw) => raw
            .parse::<f32>()
            .with_context(|| format!("invalid duration '{raw}'"))?,
        None => DEFAULT_SECONDS,
    };
    if !(seconds.is_finite() && seconds > 0.0) {
        bail!("duration must be a positive number of seconds, got {seconds}");
    }
    let output = args
        .get(1)
        .map_or_else(|| PathBuf::from(DEFAULT_OUTPUT), PathBuf::from);
    Ok(CaptureArgs { seconds, output })
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let argv: Vec<String> = std::env::args().skip(1).collect();
    let args = parse_args(&argv)?;

    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });
    let channels = usize::from(config.audio.channels);
    let period = u32::try_from(config.dsp.hop_size).context("hop size does not fit a device period")?;

    let frames = (f64::from(config.audio.sample_rate) * f64::from(args.seconds)) as usize;
    // One spare period so the last callback cannot wrap onto the first frame.
    let ring = new_shared_ring((frames + config.dsp.hop_size) * channels);

    let capture = AudioCapture::open(&config.audio, period).context("failed to open input device")?;
    let stream = capture.start(ring.clone()).context("failed to start capture")?;
    log::info!(
        "capture: recording {:.1} s from '{}' ({} Hz, {} ch)... make some noise",
        args.seconds,
        capture.device_name(),
        capture.sample_rate(),
        capture.channels()
    );
    std::thread::sleep(Duration::from_secs_f32(args.seconds));
    drop(stream);
    log::info!("capture: finished recording");

    let recorded = ring
        .lock()
        .map_err(|_| anyhow::anyhow!("ring buffer lock poisoned"))?
        .snapshot_frames(frames, channels);
    let rows = write_capture_csv(&args.output, &recorded, RECORDING_LABEL)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    log::info!(
        "capture: saved {rows} samples for each of {channels} channels to {}",
        args.output.display()
    );
    Ok(())
}
