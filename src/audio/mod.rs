//! Audio front end: capture → ring buffer → hop-paced frames → voice gate.
//!
//! # Pipeline
//!
//! ```text
//! Microphone array → cpal callback → SharedRingBuffer (interleaved f32)
//!     → HopCursor / FrameExtractor (Hamming window, de-interleave)
//!     → VoiceGate (RMS on the reference channel)
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use doa_tracker::audio::{new_shared_ring, AudioCapture};
//! use doa_tracker::config::AppConfig;
//!
//! let config = AppConfig::default();
//! let ring = new_shared_ring(config.capacity_samples());
//! let capture = AudioCapture::open(&config.audio, config.dsp.hop_size as u32).unwrap();
//! let _handle = capture.start(ring.clone()).unwrap(); // drop handle → stop stream
//! ```

pub mod buffer;
pub mod capture;
pub mod frame;
pub mod vad;

pub use buffer::{new_shared_ring, RingBuffer, SharedRingBuffer};
pub use capture::{list_input_devices, matches_hint, AudioCapture, CaptureError, StreamHandle};
pub use frame::{hamming_window, AudioFrame, FrameError, FrameExtractor, HopCursor};
pub use vad::{HopClass, VoiceGate};
