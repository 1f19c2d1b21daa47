//! Energy-based voice gate.
//!
//! [`VoiceGate`] decides per hop whether a frame is worth spectral analysis.
//! It computes the RMS of the reference channel's *windowed* samples (the
//! center microphone on a UMA-8) and compares it against a fixed threshold:
//!
//! * `rms <  threshold` → [`HopClass::Silent`]: the pipeline short-circuits
//!   and reports no azimuth.
//! * `rms >= threshold` → [`HopClass::Voiced`]: transform + beam search run.
//!
//! Silent hops are the expected outcome for ambient noise, not an error.
//!
//! # Example
//!
//! ```rust
//! use doa_tracker::audio::{HopClass, VoiceGate};
//!
//! let gate = VoiceGate::new(0.001);
//! let quiet = vec![0.0005_f64; 1024];
//! let loud = vec![0.2_f64; 1024];
//!
//! assert_eq!(gate.evaluate(&quiet).1, HopClass::Silent);
//! assert_eq!(gate.evaluate(&loud).1, HopClass::Voiced);
//! ```

// ---------------------------------------------------------------------------
// HopClass
// ---------------------------------------------------------------------------

/// Outcome of the voice gate for a single hop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HopClass {
    /// Below the energy threshold; no spectral analysis.
    Silent,
    /// At or above the threshold; continue to transform and beam search.
    Voiced,
}

// ---------------------------------------------------------------------------
// VoiceGate
// ---------------------------------------------------------------------------

/// Wideband RMS gate on one reference channel.
#[derive(Debug, Clone, Copy)]
pub struct VoiceGate {
    /// RMS amplitude threshold; frames below this are silent.
    rms_threshold: f32,
}

impl VoiceGate {
    /// Create a gate with the given RMS threshold.
    ///
    /// The default configuration uses `0.001`, tuned for the UMA-8 array's
    /// raw capture level.
    pub fn new(rms_threshold: f32) -> Self {
        Self { rms_threshold }
    }

    /// RMS threshold currently in use.
    pub fn threshold(&self) -> f32 {
        self.rms_threshold
    }

    /// Root-mean-square of `samples`; `0.0` for an empty slice.
    pub fn rms_energy(samples: &[f64]) -> f32 {
        if samples.is_empty() {
            return 0.0;
        }
        let mean_sq = samples.iter().map(|s| s * s).sum::<f64>() / samples.len() as f64;
        mean_sq.sqrt() as f32
    }

    /// Classify a precomputed RMS value.
    pub fn classify(&self, rms: f32) -> HopClass {
        if rms < self.rms_threshold {
            HopClass::Silent
        } else {
            HopClass::Voiced
        }
    }

    /// Compute the RMS of `reference` and classify it.
    pub fn evaluate(&self, reference: &[f64]) -> (f32, HopClass) {
        let rms = Self::rms_energy(reference);
        (rms, self.classify(rms))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rms_of_constant_is_its_magnitude() {
        let rms = VoiceGate::rms_energy(&[-0.5; 256]);
        assert!((rms - 0.5).abs() < 1e-7);
    }

    #[test]
    fn rms_of_empty_is_zero() {
        assert_eq!(VoiceGate::rms_energy(&[]), 0.0);
    }

    #[test]
    fn threshold_boundary_is_voiced() {
        let gate = VoiceGate::new(0.25);
        assert_eq!(gate.classify(0.25), HopClass::Voiced);
        assert_eq!(gate.classify(0.249_999), HopClass::Silent);
    }

    /// Sweeping amplitude upward flips Silent → Voiced exactly once.
    #[test]
    fn classification_is_monotonic_in_amplitude() {
        let gate = VoiceGate::new(0.01);
        let mut flips = 0;
        let mut previous = HopClass::Silent;

        for step in 0..=200 {
            let amplitude = step as f64 * 1e-4;
            let (rms, class) = gate.evaluate(&vec![amplitude; 512]);
            if class != previous {
                flips += 1;
                assert_eq!(class, HopClass::Voiced);
                assert!(rms >= gate.threshold());
            }
            if rms < gate.threshold() {
                assert_eq!(class, HopClass::Silent);
            }
            previous = class;
        }
        assert_eq!(flips, 1);
    }

    #[test]
    fn threshold_getter() {
        let gate = VoiceGate::new(0.05);
        assert!((gate.threshold() - 0.05).abs() < 1e-7);
    }
}
