//! Real-time direction-of-arrival tracking for circular microphone arrays.
//!
//! ```text
//! audio     cpal capture → shared ring buffer → windowed frames, voice gate
//! dsp       FFT, array geometry, steering table, band focus, beam search
//! pipeline  hop-paced orchestrator producing one DoaReport per hop
//! output    dashboard / JSON-lines rendering, CSV snapshots
//! config    TOML settings and platform paths
//! ```

pub mod audio;
pub mod config;
pub mod dsp;
pub mod output;
pub mod pipeline;
