//! Hop-paced frame extraction from the shared ring buffer.
//!
//! [`HopCursor`] owns the consumer's "processed" position and all of the
//! wrap-aware index arithmetic; [`FrameExtractor`] copies one transform-size
//! frame out of the ring (lock held for the copy only), de-interleaves it and
//! applies a Hamming window.
//!
//! ```text
//!            frame_start                processed        processed + hop
//!  ring: ... |<──── fft_size - hop ────>|<──── hop ────>| ...
//!            |<────────────── fft_size frames ─────────>|
//! ```
//!
//! Each extraction advances the cursor by exactly one hop, so with the
//! default `hop = fft_size / 2` consecutive frames overlap by 50 %.

use std::f64::consts::PI;

use thiserror::Error;

use super::buffer::SharedRingBuffer;

// ---------------------------------------------------------------------------
// FrameError
// ---------------------------------------------------------------------------

/// Errors raised while copying a frame out of the ring buffer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// The capture callback panicked while holding the ring lock.
    #[error("ring buffer lock poisoned")]
    Poisoned,
}

// ---------------------------------------------------------------------------
// Hamming window
// ---------------------------------------------------------------------------

/// Hamming window `w[i] = 0.54 − 0.46·cos(2π·i/(len−1))`.
///
/// A window of length 0 or 1 is all ones.
pub fn hamming_window(len: usize) -> Vec<f64> {
    if len <= 1 {
        return vec![1.0; len];
    }
    let denom = (len - 1) as f64;
    (0..len)
        .map(|i| 0.54 - 0.46 * (2.0 * PI * i as f64 / denom).cos())
        .collect()
}

// ---------------------------------------------------------------------------
// HopCursor
// ---------------------------------------------------------------------------

/// The consumer-side "processed" position in the ring.
///
/// All quantities are in interleaved samples (frames × channels).  The
/// cursor advances monotonically (modulo capacity) by one hop per
/// extraction; availability is derived as
/// `(head − processed + capacity) mod capacity`.
///
/// If the producer laps the cursor (writes a full `capacity` between two
/// polls) availability silently wraps.  Capacity sizing must prevent that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HopCursor {
    processed: usize,
    capacity: usize,
    hop_samples: usize,
    frame_samples: usize,
}

impl HopCursor {
    /// Create a cursor at position 0.
    ///
    /// # Panics
    ///
    /// Panics unless `0 < hop_samples <= frame_samples <= capacity`.
    pub fn new(capacity: usize, hop_samples: usize, frame_samples: usize) -> Self {
        assert!(
            hop_samples > 0 && hop_samples <= frame_samples && frame_samples <= capacity,
            "HopCursor requires 0 < hop <= frame <= capacity"
        );
        Self {
            processed: 0,
            capacity,
            hop_samples,
            frame_samples,
        }
    }

    /// Samples written since the processed position.
    pub fn available(&self, head: usize) -> usize {
        (head + self.capacity - self.processed) % self.capacity
    }

    /// `true` once at least one hop of new samples has accumulated.
    pub fn is_ready(&self, head: usize) -> bool {
        self.available(head) >= self.hop_samples
    }

    /// Space left before the producer wraps onto the processed position.
    pub fn headroom(&self, head: usize) -> usize {
        self.capacity - self.available(head)
    }

    /// `true` when headroom has dropped below one frame, i.e. the producer
    /// may overwrite samples of the frame about to be read.
    pub fn is_at_risk(&self, head: usize) -> bool {
        self.headroom(head) < self.frame_samples
    }

    /// Ring index of the first sample of the frame ending one hop past the
    /// processed position.
    pub fn frame_start(&self) -> usize {
        (self.processed + self.capacity + self.hop_samples - self.frame_samples) % self.capacity
    }

    /// Move the processed position forward by exactly one hop.
    pub fn advance(&mut self) {
        self.processed = (self.processed + self.hop_samples) % self.capacity;
    }

    pub fn processed(&self) -> usize {
        self.processed
    }

    pub fn hop_samples(&self) -> usize {
        self.hop_samples
    }

    pub fn frame_samples(&self) -> usize {
        self.frame_samples
    }
}

// ---------------------------------------------------------------------------
// AudioFrame
// ---------------------------------------------------------------------------

/// One windowed, de-interleaved multi-channel frame.
///
/// Owned by the [`FrameExtractor`] and overwritten on every hop.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFrame {
    channels: Vec<Vec<f64>>,
}

impl AudioFrame {
    /// A zeroed frame of `channel_count` channels × `len` samples.
    pub fn zeroed(channel_count: usize, len: usize) -> Self {
        Self {
            channels: vec![vec![0.0; len]; channel_count],
        }
    }

    /// Windowed samples of `channel`.
    ///
    /// # Panics
    ///
    /// Panics if `channel >= channel_count()`.
    pub fn channel(&self, channel: usize) -> &[f64] {
        &self.channels[channel]
    }

    pub fn channels(&self) -> &[Vec<f64>] {
        &self.channels
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Samples per channel.
    pub fn len(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// De-interleave `interleaved` and multiply every sample by `window`.
    fn fill_windowed(&mut self, interleaved: &[f32], window: &[f64]) {
        let channel_count = self.channels.len();
        for (i, (frame, &w)) in interleaved.chunks_exact(channel_count).zip(window).enumerate() {
            for (channel, &sample) in self.channels.iter_mut().zip(frame) {
                channel[i] = f64::from(sample) * w;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// FrameExtractor
// ---------------------------------------------------------------------------

/// Pulls one transform-size frame out of the ring at each hop boundary.
///
/// All buffers are allocated once in [`FrameExtractor::new`].
pub struct FrameExtractor {
    window: Vec<f64>,
    interleaved: Vec<f32>,
    frame: AudioFrame,
}

impl FrameExtractor {
    /// Create an extractor for `fft_size` samples per channel.
    pub fn new(fft_size: usize, channel_count: usize) -> Self {
        Self {
            window: hamming_window(fft_size),
            interleaved: vec![0.0; fft_size * channel_count],
            frame: AudioFrame::zeroed(channel_count, fft_size),
        }
    }

    /// Copy the frame ending one hop past the cursor, window it, and advance
    /// the cursor by one hop.
    ///
    /// The ring lock is held only while the interleaved samples are copied.
    pub fn extract(
        &mut self,
        ring: &SharedRingBuffer,
        cursor: &mut HopCursor,
    ) -> Result<&AudioFrame, FrameError> {
        {
            let guard = ring.lock().map_err(|_| FrameError::Poisoned)?;
            guard.read_into(cursor.frame_start(), &mut self.interleaved);
        }
        cursor.advance();

        self.frame.fill_windowed(&self.interleaved, &self.window);
        Ok(&self.frame)
    }

    /// The analysis window applied to every channel.
    pub fn window(&self) -> &[f64] {
        &self.window
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
