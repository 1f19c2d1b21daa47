//! Signal processing for direction-of-arrival estimation.
//!
//! ```text
//! ArrayGeometry ──build──▶ SteeringTable   (once, read-only)
//!
//! AudioFrame ─▶ SpectralTransform ─▶ BandFocus ─▶ BeamSearch ─▶ BeamEstimate
//!               (per channel)       (voice band)  (360 × mics × bins)
//! ```

pub mod band;
pub mod beam;
pub mod fft;
pub mod geometry;
pub mod steering;

pub use band::{BandFocus, BinRange};
pub use beam::{BeamEstimate, BeamSearch};
pub use fft::{inverse_transform, transform, DspError, SpectralTransform};
pub use geometry::{ArrayGeometry, GeometryError, MicPosition};
pub use steering::{plane_wave_delay, SteeringTable, AZIMUTH_COUNT};
