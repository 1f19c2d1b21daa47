//! Far-field steering table.
//!
//! For every azimuth θ (1° grid), active mic at `(x, y)` and bin
//! `k ∈ 0..=N/2`:
//!
//! ```text
//! proj  = x·cos θ + y·sin θ          extra path length (m)
//! τ     = proj / c                   time delay (s)
//! f_k   = k · fs / N
//! a     = exp(i · 2π · f_k · τ)      steering phasor
//! ```
//!
//! Plane-wave, free-field model: no near-field curvature, no reverberation.
//! The table is built once at startup and only read afterwards; share it as
//! `Arc<SteeringTable>`.
//!
//! Storage is one flat dense `Vec` indexed `[azimuth][slot][bin]` so the
//! beam search walks contiguous memory without any per-lookup allocation.

use std::f64::consts::PI;

use rustfft::num_complex::Complex64;

use super::geometry::{ArrayGeometry, MicPosition};

/// Number of candidate azimuths (1° resolution over a full turn).
pub const AZIMUTH_COUNT: usize = 360;

/// Plane-wave delay in seconds at `position` for a source at
/// `azimuth_deg`, relative to the array origin.
pub fn plane_wave_delay(position: MicPosition, azimuth_deg: usize, speed_of_sound: f64) -> f64 {
    let theta = (azimuth_deg as f64).to_radians();
    let projection = position.x * theta.cos() + position.y * theta.sin();
    projection / speed_of_sound
}

/// Precomputed phasors for every (azimuth, active mic, bin).
#[derive(Debug, Clone)]
pub struct SteeringTable {
    phasors: Vec<Complex64>,
    channels: Vec<usize>,
    bin_count: usize,
}

impl SteeringTable {
    /// Build the table for `geometry`'s active mics.
    ///
    /// Pure and deterministic.  `fft_size` is expected to be validated
    /// already; the table covers bins `0..=fft_size/2`.
    pub fn build(
        geometry: &ArrayGeometry,
        sample_rate: u32,
        fft_size: usize,
        speed_of_sound: f64,
    ) -> Self {
        let bin_count = fft_size / 2 + 1;
        let channels = geometry.active().to_vec();
        let mut phasors = Vec::with_capacity(AZIMUTH_COUNT * channels.len() * bin_count);

        for azimuth in 0..AZIMUTH_COUNT {
            for (_, position) in geometry.active_positions() {
                let tau = plane_wave_delay(position, azimuth, speed_of_sound);
                for k in 0..bin_count {
                    let freq = k as f64 * f64::from(sample_rate) / fft_size as f64;
                    phasors.push(Complex64::from_polar(1.0, 2.0 * PI * freq * tau));
                }
            }
        }

        Self {
            phasors,
            channels,
            bin_count,
        }
    }

    /// Phasors for every bin of one (azimuth, slot) pair.
    ///
    /// `slot` indexes the active mics in order, not raw channel numbers;
    /// see [`SteeringTable::channels`].
    pub fn phasors(&self, azimuth: usize, slot: usize) -> &[Complex64] {
        let start = (azimuth * self.channels.len() + slot) * self.bin_count;
        &self.phasors[start..start + self.bin_count]
    }

    pub fn phasor(&self, azimuth: usize, slot: usize, bin: usize) -> Complex64 {
        self.phasors(azimuth, slot)[bin]
    }

    /// Capture channel for each slot.
    pub fn channels(&self) -> &[usize] {
        &self.channels
    }

    pub fn mic_count(&self) -> usize {
        self.channels.len()
    }

    /// Bins per (azimuth, slot): `fft_size / 2 + 1`.
    pub fn bin_count(&self) -> usize {
        self.bin_count
    }
}
