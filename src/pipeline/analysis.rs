//! Per-hop analysis: voice gate → transform → band focus → beam search.
//!
//! [`HopAnalyzer`] owns every buffer the chain needs, sized once from the
//! configuration, so analysing a hop allocates nothing.

use std::sync::Arc;

use rustfft::num_complex::Complex64;

use crate::audio::{AudioFrame, HopClass, VoiceGate};
use crate::config::AppConfig;
use crate::dsp::{BandFocus, BeamSearch, DspError, SpectralTransform, SteeringTable};

use super::state::DoaResult;

/// Runs the spectral half of the pipeline on one windowed frame.
pub struct HopAnalyzer {
    gate: VoiceGate,
    reference_channel: usize,
    fft: SpectralTransform,
    focus: BandFocus,
    search: BeamSearch,
    steering: Arc<SteeringTable>,
    spectra: Vec<Vec<Complex64>>,
}

impl HopAnalyzer {
    /// Build from a validated configuration and a prebuilt steering table.
    ///
    /// The table must cover bins `0..=fft_size/2` and only reference
    /// channels the capture delivers.
    pub fn new(config: &AppConfig, steering: Arc<SteeringTable>) -> Result<Self, DspError> {
        let fft_size = config.dsp.fft_size;
        let channels = usize::from(config.audio.channels);
        let bins = fft_size / 2 + 1;
        if steering.bin_count() != bins {
            return Err(DspError::SteeringBins {
                expected: bins,
                got: steering.bin_count(),
            });
        }
        if let Some(&channel) = steering.channels().iter().find(|&&ch| ch >= channels) {
            return Err(DspError::SteeringChannel { channel, channels });
        }

        let fft = SpectralTransform::new(fft_size)?;
        Ok(Self {
            gate: VoiceGate::new(config.dsp.energy_threshold),
            reference_channel: config.dsp.reference_channel,
            fft,
            focus: BandFocus::new(config.band_bins(), config.dsp.voice_gain),
            search: BeamSearch::new(steering.bin_count()),
            steering,
            spectra: vec![vec![Complex64::default(); fft_size]; channels],
        })
    }

    pub fn gate(&self) -> &VoiceGate {
        &self.gate
    }

    /// Analyse one frame.
    ///
    /// Silent frames short-circuit to `DoaResult { azimuth: None, power: 0 }`.
    pub fn analyze(&mut self, frame: &AudioFrame) -> Result<(DoaResult, HopClass), DspError> {
        let (energy, class) = self.gate.evaluate(frame.channel(self.reference_channel));
        if class == HopClass::Silent {
            return Ok((DoaResult::silent(energy), class));
        }

        for (spectrum, samples) in self.spectra.iter_mut().zip(frame.channels()) {
            for (bin, &sample) in spectrum.iter_mut().zip(samples) {
                *bin = Complex64::new(sample, 0.0);
            }
            self.fft.process(spectrum)?;
        }

        self.focus.apply(&mut self.spectra);
        let estimate = self
            .search
            .search(&self.spectra, &self.steering, self.focus.band());

        Ok((
            DoaResult {
                azimuth: Some(estimate.azimuth),
                power: estimate.power,
                energy,
            },
            class,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{new_shared_ring, FrameExtractor, HopCursor};
    use crate::dsp::{plane_wave_delay, ArrayGeometry};
    use std::f64::consts::PI;

    /// Interleaved 8-channel frames of a `freq` tone arriving from
    /// `azimuth` at the UMA-8: each outer mic leads by its plane-wave delay,
    /// the center mic carries the undelayed tone, the spare stays silent.
    fn synthetic_capture(config: &AppConfig, freq: f64, azimuth: usize, frames: usize) -> Vec<f32> {
        let geometry = config.geometry().unwrap();
        let fs = f64::from(config.audio.sample_rate);
        let channels = usize::from(config.audio.channels);
        let mut out = Vec::with_capacity(frames * channels);
        for n in 0..frames {
            let t = n as f64 / fs;
            for ch in 0..channels {
                let sample = if ch == 0 {
                    (2.0 * PI * freq * t).sin() * 0.5
                } else if geometry.active().contains(&ch) {
                    let tau = plane_wave_delay(geometry.position(ch), azimuth, config.array.speed_of_sound);
                    (2.0 * PI * freq * (t + tau)).sin() * 0.5
                } else {
                    0.0
                };
                out.push(sample as f32);
            }
        }
        out
    }

    fn analyzer(config: &AppConfig) -> HopAnalyzer {
        let steering = SteeringTable::build(
            &config.geometry().unwrap(),
            config.audio.sample_rate,
            config.dsp.fft_size,
            config.array.speed_of_sound,
        );
        HopAnalyzer::new(config, Arc::new(steering)).unwrap()
    }

    fn first_frame(config: &AppConfig, interleaved: &[f32]) -> AudioFrame {
        let channels = usize::from(config.audio.channels);
        let fft = config.dsp.fft_size;
        let capacity = config.capacity_samples();
        let ring = new_shared_ring(capacity);
        ring.lock().unwrap().push_slice(interleaved);

        let mut cursor = HopCursor::new(capacity, config.dsp.hop_size * channels, fft * channels);
        // Skip the first hop so the frame holds only captured samples.
        cursor.advance();
        let mut extractor = FrameExtractor::new(fft, channels);
        extractor.extract(&ring, &mut cursor).unwrap().clone()
    }

    #[test]
    fn tone_from_90_degrees_is_located() {
        let config = AppConfig::default();
        let capture = synthetic_capture(&config, 1_000.0, 90, 4 * config.dsp.fft_size);
        let frame = first_frame(&config, &capture);
        let mut analyzer = analyzer(&config);

        let (result, class) = analyzer.analyze(&frame).unwrap();
        assert_eq!(class, HopClass::Voiced);
        let azimuth = result.azimuth.expect("voiced hop has an azimuth");
        assert!((85..=95).contains(&azimuth), "azimuth {azimuth}");

        // Power at the true direction beats the mirror direction.
        let opposite = analyzer
            .search
            .power_at(&analyzer.spectra, &analyzer.steering, analyzer.focus.band(), 270);
        assert!(result.power > opposite, "{} vs {opposite}", result.power);
    }

    #[test]
    fn tone_from_other_directions_is_located() {
        let config = AppConfig::default();
        let mut analyzer = analyzer(&config);
        for azimuth in [0usize, 45, 200, 300] {
            let capture = synthetic_capture(&config, 1_500.0, azimuth, 4 * config.dsp.fft_size);
            let frame = first_frame(&config, &capture);
            let (result, _) = analyzer.analyze(&frame).unwrap();
            let got = i32::from(result.azimuth.unwrap());
            let diff = (got - azimuth as i32).rem_euclid(360);
            assert!(diff.min(360 - diff) <= 5, "expected {azimuth}, got {got}");
        }
    }

    #[test]
    fn silence_short_circuits() {
        let config = AppConfig::default();
        let channels = usize::from(config.audio.channels);
        let quiet = vec![0.0001_f32; 4 * config.dsp.fft_size * channels];
        let frame = first_frame(&config, &quiet);
        let mut analyzer = analyzer(&config);

        let (result, class) = analyzer.analyze(&frame).unwrap();
        assert_eq!(class, HopClass::Silent);
        assert_eq!(result, DoaResult::silent(result.energy));
        assert!(result.energy < analyzer.gate().threshold());
    }

    #[test]
    fn steering_for_another_transform_size_is_rejected() {
        let config = AppConfig::default();
        let steering = SteeringTable::build(
            &config.geometry().unwrap(),
            config.audio.sample_rate,
            512,
            config.array.speed_of_sound,
        );
        let err = HopAnalyzer::new(&config, Arc::new(steering)).err().unwrap();
        assert_eq!(err, DspError::SteeringBins { expected: 513, got: 257 });
    }

    #[test]
    fn buffers_sized_from_config() {
        let config = AppConfig::default();
        let analyzer = analyzer(&config);
        assert_eq!(analyzer.spectra.len(), 8);
        assert!(analyzer.spectra.iter().all(|s| s.len() == 1024));
        assert_eq!(config.geometry().unwrap(), ArrayGeometry::uma8(0.045));
    }
}
