//! Voice-band focus: boost in-band bins, zero everything else.
//!
//! Frequencies map to bins by truncation, `bin = ⌊f · N / fs⌋`, clamped to
//! the Nyquist bin.  With the defaults (300–3400 Hz, N = 1024, fs = 48 kHz)
//! that is bins 6..=72.
//!
//! Masking is destructive: out-of-band content is gone for the rest of the
//! hop.  Anything else that wants the full spectrum must look first.

use rustfft::num_complex::Complex64;

/// Inclusive bin range `[min_bin, max_bin]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinRange {
    pub min_bin: usize,
    pub max_bin: usize,
}

impl BinRange {
    /// Map a `[min_hz, max_hz]` band onto bins of an `fft_size`-point
    /// transform at `sample_rate`.
    pub fn from_freqs(min_hz: f64, max_hz: f64, fft_size: usize, sample_rate: u32) -> Self {
        let nyquist_bin = fft_size / 2;
        let to_bin = |hz: f64| {
            let bin = (hz.max(0.0) * fft_size as f64 / f64::from(sample_rate)) as usize;
            bin.min(nyquist_bin)
        };
        Self {
            min_bin: to_bin(min_hz),
            max_bin: to_bin(max_hz),
        }
    }

    pub fn contains(&self, bin: usize) -> bool {
        (self.min_bin..=self.max_bin).contains(&bin)
    }

    /// Number of bins in the band.
    pub fn len(&self) -> usize {
        (self.max_bin + 1).saturating_sub(self.min_bin)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Scales in-band bins by a fixed gain and zeroes all others.
#[derive(Debug, Clone, Copy)]
pub struct BandFocus {
    band: BinRange,
    gain: f64,
}

impl BandFocus {
    pub fn new(band: BinRange, gain: f64) -> Self {
        Self { band, gain }
    }

    pub fn band(&self) -> BinRange {
        self.band
    }

    pub fn gain(&self) -> f64 {
        self.gain
    }

    /// Apply to every bin of one spectrum, including the mirrored upper half.
    pub fn apply_channel(&self, spectrum: &mut [Complex64]) {
        for (k, bin) in spectrum.iter_mut().enumerate() {
            if self.band.contains(k) {
                *bin *= self.gain;
            } else {
                *bin = Complex64::default();
            }
        }
    }

    /// Apply to every channel's spectrum.
    pub fn apply(&self, spectra: &mut [Vec<Complex64>]) {
        for spectrum in spectra {
            self.apply_channel(spectrum);
        }
    }
}
