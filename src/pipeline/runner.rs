//! Pipeline orchestrator: drives the hop-paced audio → DOA loop.
//!
//! [`PipelineOrchestrator`] polls the head of the shared ring buffer and, for
//! every hop of new samples, extracts a frame, gates it, and (if voiced)
//! runs the beam search.  Each processed hop yields exactly one
//! [`DoaReport`], sent over a `tokio::sync::mpsc` channel.
//!
//! # Loop flow
//!
//! ```text
//! poll head ──< 1 hop──▶ sleep(poll_interval) / shutdown
//!     │
//!     └─ ≥ 1 hop ─▶ headroom check (warn if < 1 frame)
//!                   └─▶ extract ─▶ gate ─┬─ silent ─────────────┐
//!                                        └─ fft + focus + search┴─▶ report
//! ```
//!
//! Every ready hop is drained before the loop sleeps again, so the
//! processed position never skips or repeats a hop.  Draining (FFT and
//! beam search) runs on `tokio::task::spawn_blocking` so the async runtime
//! never stalls.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, watch};

use crate::audio::{FrameError, FrameExtractor, HopClass, HopCursor, SharedRingBuffer};
use crate::config::{AppConfig, ConfigError};
use crate::dsp::{DspError, SteeringTable};

use super::analysis::HopAnalyzer;
use super::state::{DoaReport, LoopState, LoopStats};

// ---------------------------------------------------------------------------
// PipelineError
// ---------------------------------------------------------------------------

/// Errors that can surface inside the pipeline.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PipelineError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("frame extraction failed: {0}")]
    Frame(#[from] FrameError),
    #[error("spectral analysis failed: {0}")]
    Dsp(#[from] DspError),
    /// Internal / unexpected error (e.g. tokio join failure).
    #[error("internal error: {0}")]
    Internal(String),
}

// ---------------------------------------------------------------------------
// PipelineOrchestrator
// ---------------------------------------------------------------------------

/// Drives the DOA pipeline for one capture session.
///
/// Create with [`PipelineOrchestrator::new`], then either call
/// [`poll`](Self::poll) directly or hand the orchestrator to
/// [`run`](Self::run) inside a tokio task.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use tokio::sync::{mpsc, watch};
/// use doa_tracker::audio::new_shared_ring;
/// use doa_tracker::config::AppConfig;
/// use doa_tracker::dsp::SteeringTable;
/// use doa_tracker::pipeline::PipelineOrchestrator;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = AppConfig::default();
/// let steering = SteeringTable::build(
///     &config.geometry()?,
///     config.audio.sample_rate,
///     config.dsp.fft_size,
///     config.array.speed_of_sound,
/// );
/// let ring = new_shared_ring(config.capacity_samples());
/// let orchestrator = PipelineOrchestrator::new(&config, ring, Arc::new(steering))?;
///
/// let (_shutdown_tx, shutdown_rx) = watch::channel(false);
/// let (report_tx, mut report_rx) = mpsc::channel(64);
/// tokio::spawn(orchestrator.run(shutdown_rx, report_tx));
/// while let Some(report) = report_rx.recv().await {
///     println!("{:?}", report.result.azimuth);
/// }
/// # Ok(())
/// # }
/// ```
pub struct PipelineOrchestrator {
    ring: SharedRingBuffer,
    cursor: HopCursor,
    extractor: FrameExtractor,
    analyzer: HopAnalyzer,
    poll_interval: Duration,
    state: LoopState,
    stats: LoopStats,
}

impl PipelineOrchestrator {
    /// Create an orchestrator reading from `ring`.
    ///
    /// The configuration is validated here; the ring's actual capacity must
    /// hold at least one frame plus one hop, and `steering` must match the
    /// configured transform size and channel count.
    pub fn new(
        config: &AppConfig,
        ring: SharedRingBuffer,
        steering: Arc<SteeringTable>,
    ) -> Result<Self, PipelineError> {
        config.validate()?;

        let channels = usize::from(config.audio.channels);
        let hop_samples = config.dsp.hop_size * channels;
        let frame_samples = config.dsp.fft_size * channels;
        let capacity = ring.lock().map_err(|_| FrameError::Poisoned)?.capacity();
        let required = frame_samples + hop_samples;
        if capacity < required {
            return Err(ConfigError::RingTooSmall { capacity, required }.into());
        }

        Ok(Self {
            ring,
            cursor: HopCursor::new(capacity, hop_samples, frame_samples),
            extractor: FrameExtractor::new(config.dsp.fft_size, channels),
            analyzer: HopAnalyzer::new(config, steering)?,
            poll_interval: config.poll_interval(),
            state: LoopState::default(),
            stats: LoopStats::default(),
        })
    }

    /// Where the loop currently is within a hop.
    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    // -----------------------------------------------------------------------
    // Single step
    // -----------------------------------------------------------------------

    /// Process at most one hop.
    ///
    /// Returns `Ok(None)` when less than one hop of new samples is
    /// available; the cursor is left untouched in that case.
    pub fn poll(&mut self) -> Result<Option<DoaReport>, PipelineError> {
        let head = self.ring.lock().map_err(|_| FrameError::Poisoned)?.head();
        if !self.cursor.is_ready(head) {
            self.state = LoopState::WaitForHop;
            return Ok(None);
        }

        if self.cursor.is_at_risk(head) {
            self.stats.overrun_warnings += 1;
            log::warn!(
                "pipeline: ring headroom {} < one frame ({} samples); capture may overwrite unread audio",
                self.cursor.headroom(head),
                self.cursor.frame_samples()
            );
        }

        self.state = LoopState::Extract;
        let frame = self.extractor.extract(&self.ring, &mut self.cursor)?;

        self.state = LoopState::Gate;
        let (result, class) = self.analyzer.analyze(frame)?;
        self.state = class_state(class);

        let report = DoaReport {
            hop: self.stats.hops_processed,
            result,
            threshold: self.analyzer.gate().threshold(),
        };
        self.stats.hops_processed += 1;
        match class {
            HopClass::Silent => self.stats.silent_hops += 1,
            HopClass::Voiced => self.stats.voiced_hops += 1,
        }
        self.state = LoopState::Report;

        log::debug!(
            "pipeline: hop {} {} azimuth={:?} power={:.3} rms={:.5}",
            report.hop,
            class_state(class).label(),
            report.result.azimuth,
            report.result.power,
            report.result.energy
        );
        Ok(Some(report))
    }

    /// Process every ready hop, in order.
    fn drain(&mut self) -> Result<Vec<DoaReport>, PipelineError> {
        let mut ready = Vec::new();
        while let Some(report) = self.poll()? {
            ready.push(report);
        }
        Ok(ready)
    }

    // -----------------------------------------------------------------------
    // Main async loop
    // -----------------------------------------------------------------------

    /// Run until `shutdown` turns `true` (or its sender is dropped), or the
    /// report receiver goes away.
    ///
    /// Returns the final counters.
    pub async fn run(
        self,
        mut shutdown: watch::Receiver<bool>,
        reports: mpsc::Sender<DoaReport>,
    ) -> Result<LoopStats, PipelineError> {
        log::info!(
            "pipeline: started (poll every {} ms, hop {} samples)",
            self.poll_interval.as_millis(),
            self.cursor.hop_samples()
        );

        let poll_interval = self.poll_interval;
        let mut orchestrator = self;
        'outer: loop {
            if *shutdown.borrow() {
                break;
            }

            let (returned, ready) = tokio::task::spawn_blocking(move || {
                let mut orchestrator = orchestrator;
                let ready = orchestrator.drain();
                (orchestrator, ready)
            })
            .await
            .map_err(|e| PipelineError::Internal(e.to_string()))?;
            orchestrator = returned;

            for report in ready? {
                if reports.send(report).await.is_err() {
                    log::info!("pipeline: report receiver closed, stopping");
                    break 'outer;
                }
            }

            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        log::debug!("pipeline: shutdown sender dropped");
                        break;
                    }
                }
                _ = tokio::time::sleep(poll_interval) => {}
            }
        }

        let stats = orchestrator.stats;
        log::info!(
            "pipeline: stopped after {} hops ({} voiced, {} silent, {} overrun warnings)",
            stats.hops_processed,
            stats.voiced_hops,
            stats.silent_hops,
            stats.overrun_warnings
        );
        Ok(stats)
    }
}

fn class_state(class: HopClass) -> LoopState {
    match class {
        HopClass::Silent => LoopState::SilentReport,
        HopClass::Voiced => LoopState::TransformAndSearch,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
