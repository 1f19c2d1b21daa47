//! Application entry point for the live DOA tracker.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run) and
//!    validate it.
//! 3. Build the steering table once.
//! 4. Open the input device and start copying into the shared ring.
//! 5. Create [`tokio`] runtime (multi-thread, 2 workers).
//! 6. Spawn the pipeline orchestrator and render its reports until Enter,
//!    `q` or Ctrl-C.  `s` + Enter saves a CSV snapshot of the latest frame.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, watch};

use doa_tracker::{
    audio::{list_input_devices, new_shared_ring, AudioCapture, SharedRingBuffer},
    config::AppConfig,
    dsp::{SteeringTable, AZIMUTH_COUNT},
    output::{save_snapshot, snapshot_path, ReportRenderer},
    pipeline::{DoaReport, PipelineOrchestrator},
};

/// What a line typed on stdin asks for.
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Snapshot,
    Quit,
    Unknown,
}

fn parse_command(line: &str) -> Command {
    match line.trim() {
        "" => Command::Quit,
        s if s.eq_ignore_ascii_case("q") => Command::Quit,
        s if s.eq_ignore_ascii_case("s") => Command::Snapshot,
        _ => Command::Unknown,
    }
}

// ---------------------------------------------------------------------------
// Session loop
// ---------------------------------------------------------------------------

async fn run_session(
    config: AppConfig,
    ring: SharedRingBuffer,
    steering: Arc<SteeringTable>,
) -> Result<()> {
    let orchestrator = PipelineOrchestrator::new(&config, ring.clone(), steering)?;
    let renderer = ReportRenderer::from_config(&config);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (report_tx, mut report_rx) = mpsc::channel::<DoaReport>(64);
    let pipeline = tokio::spawn(orchestrator.run(shutdown_rx, report_tx));

    let snapshot_dir = config.output.snapshot_dir();
    let channels = usize::from(config.audio.channels);
    let frames = config.dsp.fft_size;
    let mut snapshot_index = 0usize;

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            report = report_rx.recv() => {
                let Some(report) = report else {
                    log::warn!("pipeline: report channel closed");
                    break;
                };
                match renderer.render(&report) {
                    Ok(text) => println!("{text}"),
                    Err(e) => log::warn!("output: failed to render hop {}: {e}", report.hop),
                }
            }

            line = stdin.next_line(), if stdin_open => match line {
                Ok(Some(line)) => match parse_command(&line) {
                    Command::Quit => break,
                    Command::Snapshot => {
                        let path = snapshot_path(&snapshot_dir, snapshot_index);
                        snapshot_index += 1;
                        let ring = ring.clone();
                        let saved = tokio::task::spawn_blocking(move || {
                            save_snapshot(&ring, frames, channels, &path).map(|rows| (rows, path))
                        })
                        .await;
                        match saved {
                            Ok(Ok((rows, path))) => {
                                log::info!("snapshot: saved {rows} frames to {}", path.display())
                            }
                            Ok(Err(e)) => log::warn!("snapshot: {e}"),
                            Err(e) => log::warn!("snapshot: task failed: {e}"),
                        }
                    }
                    Command::Unknown => {
                        log::info!("unknown command {:?} (s = snapshot, Enter/q = quit)", line.trim())
                    }
                },
                Ok(None) => {
                    log::debug!("stdin closed; Ctrl-C to quit");
                    stdin_open = false;
                }
                Err(e) => {
                    log::warn!("stdin read failed: {e}");
                    stdin_open = false;
                }
            },

            _ = &mut ctrl_c => {
                log::info!("interrupt received");
                break;
            }
        }
    }

    // Dropping the receiver unblocks a pipeline waiting on a full channel.
    let _ = shutdown_tx.send(true);
    drop(report_rx);

    match pipeline.await {
        Ok(Ok(stats)) => {
            log::info!(
                "session: {} hops ({} voiced), {} snapshots",
                stats.hops_processed,
                stats.voiced_hops,
                snapshot_index
            );
            Ok(())
        }
        Ok(Err(e)) => Err(e).context("pipeline failed"),
        Err(e) => Err(anyhow!("pipeline task panicked: {e}")),
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("DOA tracker starting up");

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });
    config.validate().context("invalid configuration")?;

    // 3. Steering table
    let geometry = config.geometry()?;
    let steering = Arc::new(SteeringTable::build(
        &geometry,
        config.audio.sample_rate,
        config.dsp.fft_size,
        config.array.speed_of_sound,
    ));
    log::info!(
        "steering table: {} azimuths × {} mics × {} bins",
        AZIMUTH_COUNT,
        steering.mic_count(),
        steering.bin_count()
    );

    // 4. Audio capture
    let ring = new_shared_ring(config.capacity_samples());
    let period = u32::try_from(config.dsp.hop_size).context("hop size does not fit a device period")?;
    let capture = match AudioCapture::open(&config.audio, period) {
        Ok(capture) => capture,
        Err(e) => {
            if let Ok(names) = list_input_devices() {
                log::info!("available input devices: {names:?}");
            }
            return Err(e).context("failed to open input device");
        }
    };
    let _stream = capture.start(ring.clone()).context("failed to start capture")?;

    // 5. Tokio runtime
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    // 6. Run until the user quits; `_stream` stays alive until then.
    rt.block_on(run_session(config, ring, steering))
}
