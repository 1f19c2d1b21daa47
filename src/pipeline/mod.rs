//! Pipeline orchestrator module for the DOA tracker.
//!
//! This module wires ring buffer → frame extraction → voice gate → beam
//! search and hands one [`DoaReport`] per hop to the presentation side.
//!
//! # Architecture
//!
//! ```text
//! cpal callback ──push_slice──▶ SharedRingBuffer
//!                                      │ (head snapshot under lock)
//!                                      ▼
//! PipelineOrchestrator::run()  ← async tokio task
//!        │
//!        ├─ FrameExtractor   (copy + Hamming window, cursor += hop)
//!        └─ HopAnalyzer      (gate → fft → band focus → 360° search)
//!                │
//!                ▼
//!        mpsc::Sender<DoaReport> ──▶ renderer (dashboard / JSON lines)
//!
//! watch::Sender<bool> ──shutdown──▶ run() returns LoopStats
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tokio::sync::{mpsc, watch};
//! use doa_tracker::audio::new_shared_ring;
//! use doa_tracker::config::AppConfig;
//! use doa_tracker::dsp::SteeringTable;
//! use doa_tracker::pipeline::PipelineOrchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AppConfig::default();
//!     let steering = Arc::new(SteeringTable::build(
//!         &config.geometry()?,
//!         config.audio.sample_rate,
//!         config.dsp.fft_size,
//!         config.array.speed_of_sound,
//!     ));
//!     let ring = new_shared_ring(config.capacity_samples());
//!
//!     // (ring is handed to AudioCapture::start elsewhere)
//!     let orchestrator = PipelineOrchestrator::new(&config, ring, steering)?;
//!     let (shutdown_tx, shutdown_rx) = watch::channel(false);
//!     let (report_tx, _report_rx) = mpsc::channel(64);
//!     let task = tokio::spawn(orchestrator.run(shutdown_rx, report_tx));
//!
//!     shutdown_tx.send(true)?;
//!     let stats = task.await??;
//!     println!("{} hops", stats.hops_processed);
//!     Ok(())
//! }
//! ```

pub mod analysis;
pub mod runner;
pub mod state;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use analysis::HopAnalyzer;
pub use runner::{PipelineError, PipelineOrchestrator};
pub use state::{DoaReport, DoaResult, LoopState, LoopStats};
