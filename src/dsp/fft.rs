//! In-place complex DFT for power-of-two lengths, backed by `rustfft`.
//!
//! Two entry points:
//!
//! * [`transform`] / [`inverse_transform`]: one-shot, any power-of-two
//!   length.  Plans on every call; fine for tests and tooling.
//! * [`SpectralTransform`]: planned once for a fixed size with a reusable
//!   scratch buffer.  This is what the per-hop pipeline uses.
//!
//! Non-power-of-two lengths are a configuration error and fail with
//! [`DspError::SizeConstraint`]; there is no general-length fallback.
//!
//! The inverse is **unnormalized**: `inverse_transform(transform(x)) == N·x`.
//! Callers divide by `N` themselves when they need the true inverse.

use std::sync::Arc;

use rustfft::num_complex::Complex64;
use rustfft::{Fft, FftPlanner};
use thiserror::Error;

// ---------------------------------------------------------------------------
// DspError
// ---------------------------------------------------------------------------

/// Errors raised by the spectral transform and the beam-search setup.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DspError {
    /// Transform length is not a power of two.
    #[error("transform length {len} is not a power of two")]
    SizeConstraint { len: usize },

    /// Buffer passed to a planned transform has the wrong length.
    #[error("buffer length {got} does not match planned transform size {expected}")]
    LengthMismatch { expected: usize, got: usize },

    /// Steering table was built for a different transform size.
    #[error("steering table has {got} bins per mic, transform needs {expected}")]
    SteeringBins { expected: usize, got: usize },

    /// Steering table reads a channel the capture does not deliver.
    #[error("steering table uses channel {channel}, capture has {channels} channels")]
    SteeringChannel { channel: usize, channels: usize },
}

fn ensure_power_of_two(len: usize) -> Result<(), DspError> {
    if len.is_power_of_two() {
        Ok(())
    } else {
        Err(DspError::SizeConstraint { len })
    }
}

// ---------------------------------------------------------------------------
// One-shot transforms
// ---------------------------------------------------------------------------

/// Forward DFT of `buf` in place (`X[k] = Σ x[n]·e^{−2πikn/N}`).
///
/// An empty buffer is left untouched.
pub fn transform(buf: &mut [Complex64]) -> Result<(), DspError> {
    if buf.is_empty() {
        return Ok(());
    }
    ensure_power_of_two(buf.len())?;
    FftPlanner::<f64>::new()
        .plan_fft_forward(buf.len())
        .process(buf);
    Ok(())
}

/// Conjugate, forward-transform, conjugate.  Result is scaled by `N`.
pub fn inverse_transform(buf: &mut [Complex64]) -> Result<(), DspError> {
    if buf.is_empty() {
        return Ok(());
    }
    ensure_power_of_two(buf.len())?;
    conjugate(buf);
    transform(buf)?;
    conjugate(buf);
    Ok(())
}

fn conjugate(buf: &mut [Complex64]) {
    for c in buf.iter_mut() {
        *c = c.conj();
    }
}

// ---------------------------------------------------------------------------
// SpectralTransform
// ---------------------------------------------------------------------------

/// A forward DFT planned once for a fixed power-of-two size.
///
/// ```rust
/// use doa_tracker::dsp::SpectralTransform;
/// use rustfft::num_complex::Complex64;
///
/// let mut fft = SpectralTransform::new(8).unwrap();
/// let mut buf = vec![Complex64::new(1.0, 0.0); 8];
/// fft.process(&mut buf).unwrap();
/// assert!((buf[0].re - 8.0).abs() < 1e-12);
///
/// assert!(SpectralTransform::new(1000).is_err());
/// ```
pub struct SpectralTransform {
    fft: Arc<dyn Fft<f64>>,
    scratch: Vec<Complex64>,
    len: usize,
}

impl SpectralTransform {
    /// Plan a forward transform of `len` points.
    pub fn new(len: usize) -> Result<Self, DspError> {
        ensure_power_of_two(len)?;
        let fft = FftPlanner::<f64>::new().plan_fft_forward(len);
        let scratch = vec![Complex64::default(); fft.get_inplace_scratch_len()];
        Ok(Self { fft, scratch, len })
    }

    /// Forward DFT of `buf` in place without allocating.
    pub fn process(&mut self, buf: &mut [Complex64]) -> Result<(), DspError> {
        if buf.len() != self.len {
            return Err(DspError::LengthMismatch {
                expected: self.len,
                got: buf.len(),
            });
        }
        self.fft.process_with_scratch(buf, &mut self.scratch);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn ramp(len: usize) -> Vec<Complex64> {
        (0..len)
            .map(|i| Complex64::new((i as f64 * 0.37).sin(), (i as f64 * 0.11).cos()))
            .collect()
    }

    #[test]
    fn impulse_has_flat_spectrum() {
        let mut buf = vec![Complex64::default(); 16];
        buf[0] = Complex64::new(1.0, 0.0);
        transform(&mut buf).unwrap();
        for c in &buf {
            assert_relative_eq!(c.re, 1.0, epsilon = 1e-12);
            assert_relative_eq!(c.im, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn pure_tone_lands_in_its_bin() {
        let n = 64;
        let mut buf: Vec<Complex64> = (0..n)
            .map(|i| Complex64::new((2.0 * PI * 5.0 * i as f64 / n as f64).cos(), 0.0))
            .collect();
        transform(&mut buf).unwrap();
        assert_relative_eq!(buf[5].norm(), n as f64 / 2.0, epsilon = 1e-9);
        assert_relative_eq!(buf[n - 5].norm(), n as f64 / 2.0, epsilon = 1e-9);
        assert!(buf[6].norm() < 1e-9);
    }

    #[test]
    fn inverse_round_trip_is_scaled_by_len() {
        for len in [1usize, 2, 8, 256, 1024] {
            let original = ramp(len);
            let mut buf = original.clone();
            transform(&mut buf).unwrap();
            inverse_transform(&mut buf).unwrap();
            for (got, want) in buf.iter().zip(&original) {
                assert_relative_eq!(got.re, want.re * len as f64, epsilon = 1e-9);
                assert_relative_eq!(got.im, want.im * len as f64, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn non_power_of_two_fails() {
        let mut buf = vec![Complex64::default(); 12];
        assert_eq!(transform(&mut buf), Err(DspError::SizeConstraint { len: 12 }));
        assert_eq!(
            inverse_transform(&mut buf),
            Err(DspError::SizeConstraint { len: 12 })
        );
    }

    #[test]
    fn empty_is_noop() {
        let mut buf: Vec<Complex64> = Vec::new();
        assert!(transform(&mut buf).is_ok());
        assert!(inverse_transform(&mut buf).is_ok());
    }

    #[test]
    fn planned_matches_one_shot() {
        let mut planned = SpectralTransform::new(128).unwrap();
        let mut a = ramp(128);
        let mut b = a.clone();
        planned.process(&mut a).unwrap();
        transform(&mut b).unwrap();
        for (x, y) in a.iter().zip(&b) {
            assert_relative_eq!(x.re, y.re, epsilon = 1e-12);
            assert_relative_eq!(x.im, y.im, epsilon = 1e-12);
        }
    }

    #[test]
    fn planned_rejects_bad_sizes() {
        assert_eq!(
            SpectralTransform::new(0).err(),
            Some(DspError::SizeConstraint { len: 0 })
        );
        let mut fft = SpectralTransform::new(8).unwrap();
        let mut short = vec![Complex64::default(); 4];
        assert_eq!(
            fft.process(&mut short),
            Err(DspError::LengthMismatch {
                expected: 8,
                got: 4
            })
        );
    }
}
