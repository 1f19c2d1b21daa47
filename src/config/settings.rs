//! Application settings structs, defaults, validation and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.
//! Defaults describe a miniDSP UMA-8 at 48 kHz.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::AppPaths;
use crate::dsp::{ArrayGeometry, BinRange, GeometryError};

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// A configuration that cannot drive the pipeline.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("sample rate must be > 0")]
    SampleRate,

    #[error("transform size {0} must be a power of two and at least 2")]
    TransformSize(usize),

    #[error("hop size {hop} must be in 1..={fft_size}")]
    HopSize { hop: usize, fft_size: usize },

    #[error("voice band {min_hz}-{max_hz} Hz is invalid (Nyquist {nyquist_hz} Hz)")]
    Band {
        min_hz: f64,
        max_hz: f64,
        nyquist_hz: f64,
    },

    #[error("speed of sound and array radius must be positive")]
    Physics,

    #[error("reference channel {index} out of range for {channels} channels")]
    ReferenceChannel { index: usize, channels: u16 },

    #[error("ring buffer of {capacity} samples is smaller than the required {required}")]
    RingTooSmall { capacity: usize, required: usize },

    #[error("invalid array geometry: {0}")]
    Geometry(#[from] GeometryError),
}

// ---------------------------------------------------------------------------
// AudioConfig
// ---------------------------------------------------------------------------

/// Capture settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Capture sample rate in Hz.
    pub sample_rate: u32,
    /// Interleaved channel count delivered by the device.
    pub channels: u16,
    /// Ring buffer length in seconds of multi-channel audio.
    pub ring_seconds: f32,
    /// Prefer the first input device whose name contains this string.
    /// `None` means the system default.
    pub device_name_hint: Option<String>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            channels: 8,
            ring_seconds: 2.0,
            device_name_hint: Some("UMA-8".into()),
        }
    }
}

// ---------------------------------------------------------------------------
// ArrayConfig
// ---------------------------------------------------------------------------

/// Physical array description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArrayConfig {
    /// Radius of the outer mic circle in meters (UMA-8: 45 mm).
    pub radius_m: f64,
    /// Speed of sound in m/s.
    pub speed_of_sound: f64,
    /// Channels used for beamforming, evenly spaced from 0° counter-clockwise.
    pub active_mics: Vec<usize>,
}

impl Default for ArrayConfig {
    fn default() -> Self {
        Self {
            radius_m: 0.045,
            speed_of_sound: 343.0,
            active_mics: vec![1, 2, 3, 4, 5, 6],
        }
    }
}

// ---------------------------------------------------------------------------
// DspConfig
// ---------------------------------------------------------------------------

/// Analysis settings for the per-hop pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DspConfig {
    /// Transform size in samples per channel; power of two.
    pub fft_size: usize,
    /// Stride between frames in samples per channel (`fft_size / 2`
    /// gives 50 % overlap).
    pub hop_size: usize,
    /// Voice-gate RMS threshold on the reference channel.
    pub energy_threshold: f32,
    /// Lower edge of the voice band in Hz.
    pub min_freq_hz: f64,
    /// Upper edge of the voice band in Hz.
    pub max_freq_hz: f64,
    /// Gain applied to in-band bins.
    pub voice_gain: f64,
    /// Channel used by the voice gate (UMA-8 center mic).
    pub reference_channel: usize,
    /// Orchestrator polling interval in milliseconds.
    pub poll_interval_ms: u64,
}

impl Default for DspConfig {
    fn default() -> Self {
        Self {
            fft_size: 1024,
            hop_size: 512,
            energy_threshold: 0.001,
            min_freq_hz: 300.0,
            max_freq_hz: 3400.0,
            voice_gain: 3.0,
            reference_channel: 0,
            poll_interval_ms: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// OutputConfig
// ---------------------------------------------------------------------------

/// How each hop's report is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Full-screen text dashboard, redrawn every hop.
    #[default]
    Dashboard,
    /// One JSON object per hop on stdout.
    JsonLines,
}

/// Presentation and snapshot settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
    /// Directory for CSV snapshots.  `None` uses [`AppPaths::captures_dir`].
    pub snapshot_dir: Option<PathBuf>,
}

impl OutputConfig {
    /// Effective snapshot directory.
    pub fn snapshot_dir(&self) -> PathBuf {
        self.snapshot_dir
            .clone()
            .unwrap_or_else(|| AppPaths::new().captures_dir)
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use doa_tracker::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
/// config.validate().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub audio: AudioConfig,
    pub array: ArrayConfig,
    pub dsp: DspConfig,
    pub output: OutputConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let dsp = &self.dsp;

        if self.audio.sample_rate == 0 {
            return Err(ConfigError::SampleRate);
        }
        if dsp.fft_size < 2 || !dsp.fft_size.is_power_of_two() {
            return Err(ConfigError::TransformSize(dsp.fft_size));
        }
        if dsp.hop_size == 0 || dsp.hop_size > dsp.fft_size {
            return Err(ConfigError::HopSize {
                hop: dsp.hop_size,
                fft_size: dsp.fft_size,
            });
        }

        let nyquist_hz = f64::from(self.audio.sample_rate) / 2.0;
        if !(dsp.min_freq_hz >= 0.0 && dsp.min_freq_hz < dsp.max_freq_hz && dsp.max_freq_hz <= nyquist_hz) {
            return Err(ConfigError::Band {
                min_hz: dsp.min_freq_hz,
                max_hz: dsp.max_freq_hz,
                nyquist_hz,
            });
        }

        if !(self.array.speed_of_sound > 0.0 && self.array.radius_m > 0.0) {
            return Err(ConfigError::Physics);
        }
        if dsp.reference_channel >= usize::from(self.audio.channels) {
            return Err(ConfigError::ReferenceChannel {
                index: dsp.reference_channel,
                channels: self.audio.channels,
            });
        }
        self.geometry()?;

        let required = (dsp.fft_size + dsp.hop_size) * usize::from(self.audio.channels);
        let capacity = self.capacity_samples();
        if capacity < required {
            return Err(ConfigError::RingTooSmall { capacity, required });
        }
        Ok(())
    }

    /// Array geometry described by `[array]` for `audio.channels` channels.
    pub fn geometry(&self) -> Result<ArrayGeometry, ConfigError> {
        Ok(ArrayGeometry::circular(
            usize::from(self.audio.channels),
            self.array.radius_m,
            &self.array.active_mics,
        )?)
    }

    /// Ring capacity in interleaved samples; always a multiple of the
    /// channel count.
    pub fn capacity_samples(&self) -> usize {
        let frames = (f64::from(self.audio.sample_rate) * f64::from(self.audio.ring_seconds.max(0.0))) as usize;
        frames * usize::from(self.audio.channels)
    }

    /// Voice band mapped onto transform bins.
    pub fn band_bins(&self) -> BinRange {
        BinRange::from_freqs(
            self.dsp.min_freq_hz,
            self.dsp.max_freq_hz,
            self.dsp.fft_size,
            self.audio.sample_rate,
        )
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.dsp.poll_interval_ms)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
