//! Multi-channel microphone capture via `cpal`.
//!
//! [`AudioCapture`] wraps the cpal host/device/stream lifecycle.  Call
//! [`AudioCapture::start`] to begin copying interleaved `f32` samples into a
//! [`SharedRingBuffer`].  The returned [`StreamHandle`] is a RAII guard:
//! dropping it stops the underlying cpal stream.
//!
//! The data callback runs on the driver's real-time thread.  It does exactly
//! one thing: lock the ring, copy the period in, unlock.  No allocation, no
//! I/O, no logging on the hot path.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use thiserror::Error;

use super::buffer::SharedRingBuffer;
use crate::config::AudioConfig;

// ---------------------------------------------------------------------------
// StreamHandle
// ---------------------------------------------------------------------------

/// RAII guard that keeps the cpal stream alive.
///
/// Dropping this value stops the underlying hardware stream.
pub struct StreamHandle {
    _stream: cpal::Stream,
}

// ---------------------------------------------------------------------------
// CaptureError
// ---------------------------------------------------------------------------

/// Errors that can occur while setting up or running the audio capture.
///
/// All of these are fatal to the pipeline; the core does not retry.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no input device found on the default audio host")]
    NoDevice,

    #[error("failed to enumerate input devices: {0}")]
    Devices(#[from] cpal::DevicesError),

    #[error("failed to query supported input configs: {0}")]
    SupportedConfigs(#[from] cpal::SupportedStreamConfigsError),

    #[error("device supports at most {max} input channels, {requested} requested")]
    UnsupportedChannelCount { requested: u16, max: u16 },

    #[error("failed to build input stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),
}

// ---------------------------------------------------------------------------
// Device selection
// ---------------------------------------------------------------------------

/// Case-insensitive substring match used for device selection.
pub fn matches_hint(device_name: &str, hint: &str) -> bool {
    !hint.is_empty() && device_name.to_lowercase().contains(&hint.to_lowercase())
}

/// Names of all input devices on the default host.
pub fn list_input_devices() -> Result<Vec<String>, CaptureError> {
    let host = cpal::default_host();
    let names = host
        .input_devices()?
        .filter_map(|device| device.name().ok())
        .collect();
    Ok(names)
}

/// Pick the first input device whose name contains `hint`, falling back to
/// the host's default input device.
fn select_device(host: &cpal::Host, hint: Option<&str>) -> Result<cpal::Device, CaptureError> {
    if let Some(hint) = hint {
        for device in host.input_devices()? {
            if let Ok(name) = device.name() {
                if matches_hint(&name, hint) {
                    log::info!("capture: '{name}' matches hint '{hint}', auto-selecting");
                    return Ok(device);
                }
            }
        }
        log::warn!("capture: no input device matches '{hint}', using the default device");
    }
    host.default_input_device().ok_or(CaptureError::NoDevice)
}

// ---------------------------------------------------------------------------
// AudioCapture
// ---------------------------------------------------------------------------

/// Multi-channel capture device wrapper built on top of `cpal`.
///
/// # Example
///
/// ```rust,no_run
/// use doa_tracker::audio::{new_shared_ring, AudioCapture};
/// use doa_tracker::config::AudioConfig;
///
/// let config = AudioConfig::default();
/// let ring = new_shared_ring(48_000 * 8 * 2);
/// let capture = AudioCapture::open(&config, 512).unwrap();
/// let _handle = capture.start(ring).unwrap();
/// // `_handle` keeps the stream alive; drop it to stop capturing.
/// ```
pub struct AudioCapture {
    device: cpal::Device,
    config: cpal::StreamConfig,
    name: String,
}

impl AudioCapture {
    /// Open the configured input device with a fixed period of
    /// `period_frames` frames (one hop).
    ///
    /// # Errors
    ///
    /// [`CaptureError::NoDevice`] when no input device is available and
    /// [`CaptureError::UnsupportedChannelCount`] when the device cannot
    /// deliver the configured channel count.
    pub fn open(audio: &AudioConfig, period_frames: u32) -> Result<Self, CaptureError> {
        let host = cpal::default_host();
        let device = select_device(&host, audio.device_name_hint.as_deref())?;
        let name = device.name().unwrap_or_else(|_| "<unnamed>".into());

        let max = device
            .supported_input_configs()?
            .map(|c| c.channels())
            .max()
            .unwrap_or(0);
        if max < audio.channels {
            return Err(CaptureError::UnsupportedChannelCount {
                requested: audio.channels,
                max,
            });
        }

        let config = cpal::StreamConfig {
            channels: audio.channels,
            sample_rate: cpal::SampleRate(audio.sample_rate),
            buffer_size: cpal::BufferSize::Fixed(period_frames),
        };

        Ok(Self {
            device,
            config,
            name,
        })
    }

    /// Start capturing into `ring`.
    ///
    /// Backends that reject a fixed period are retried once with the
    /// driver's default buffer size; hop pacing does not depend on the
    /// callback period.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::BuildStream`] or [`CaptureError::PlayStream`]
    /// if the platform rejects the stream.
    pub fn start(&self, ring: SharedRingBuffer) -> Result<StreamHandle, CaptureError> {
        let stream = match self.build_stream(&self.config, ring.clone()) {
            Err(cpal::BuildStreamError::StreamConfigNotSupported) => {
                log::warn!("capture: fixed period rejected, falling back to default buffer size");
                let fallback = cpal::StreamConfig {
                    buffer_size: cpal::BufferSize::Default,
                    ..self.config.clone()
                };
                self.build_stream(&fallback, ring)?
            }
            other => other?,
        };

        stream.play()?;
        log::info!(
            "capture: '{}' started ({} Hz, {} ch)",
            self.name,
            self.config.sample_rate.0,
            self.config.channels
        );
        Ok(StreamHandle { _stream: stream })
    }

    fn build_stream(
        &self,
        config: &cpal::StreamConfig,
        ring: SharedRingBuffer,
    ) -> Result<cpal::Stream, cpal::BuildStreamError> {
        self.device.build_input_stream(
            config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                // A poisoned lock means the consumer panicked; drop the period.
                if let Ok(mut buf) = ring.lock() {
                    buf.push_slice(data);
                }
            },
            |err: cpal::StreamError| {
                log::error!("cpal stream error: {err}");
            },
            None,
        )
    }

    /// Human-readable device name.
    pub fn device_name(&self) -> &str {
        &self.name
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    pub fn channels(&self) -> u16 {
        self.config.channels
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
