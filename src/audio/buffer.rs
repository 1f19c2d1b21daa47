//! Fixed-capacity circular (ring) buffer for interleaved multi-channel samples.
//!
//! The capture callback appends at the write cursor ("head"); once the buffer
//! is full new samples **overwrite** the oldest data so the most recent
//! `capacity` samples are always retrievable.  Readers never consume data:
//! they copy an arbitrary logical range and track their own position
//! (see [`crate::audio::HopCursor`]).
//!
//! # Example
//!
//! ```rust
//! use doa_tracker::audio::RingBuffer;
//!
//! let mut buf = RingBuffer::new(4);
//! buf.push_slice(&[1.0, 2.0, 3.0, 4.0, 5.0]); // 5 items → capacity 4 → oldest dropped
//! assert_eq!(buf.head(), 1);
//! assert_eq!(buf.read_range(buf.head(), 4), vec![2.0, 3.0, 4.0, 5.0]);
//! ```

use std::sync::{Arc, Mutex};

// ---------------------------------------------------------------------------
// RingBuffer
// ---------------------------------------------------------------------------

/// A fixed-capacity circular buffer.
///
/// Generic over `T: Copy + Default`; the DOA pipeline uses `RingBuffer<f32>`
/// holding interleaved frames, so its capacity is always a multiple of the
/// channel count (see [`RingBuffer::with_frames`]).
///
/// ## Overflow behaviour
///
/// When [`push_slice`](Self::push_slice) would exceed `capacity`, the oldest
/// samples are silently overwritten.  The buffer never allocates after
/// construction, which keeps it usable from a real-time audio callback.
pub struct RingBuffer<T> {
    buf: Vec<T>,
    capacity: usize,
    /// Index of the *next* write position, always in `[0, capacity)`.
    head: usize,
    /// Number of valid samples currently stored (≤ `capacity`).
    len: usize,
}

impl<T: Copy + Default> RingBuffer<T> {
    /// Create a new ring buffer with the given `capacity` in samples.
    ///
    /// # Panics
    ///
    /// Panics if `capacity == 0`.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "RingBuffer capacity must be > 0");
        Self {
            buf: vec![T::default(); capacity],
            capacity,
            head: 0,
            len: 0,
        }
    }

    /// Create a buffer holding `frames` interleaved frames of `channels`
    /// samples each.
    pub fn with_frames(frames: usize, channels: usize) -> Self {
        Self::new(frames * channels)
    }

    /// Append `data` at the head, wrapping modulo `capacity`.
    ///
    /// At most two `copy_from_slice` calls; no allocation.  If `data` is
    /// longer than the buffer only its tail survives, but the head still
    /// advances by the full length.
    pub fn push_slice(&mut self, data: &[T]) {
        let n = data.len();
        if n == 0 {
            return;
        }

        let (data, start) = if n >= self.capacity {
            (&data[n - self.capacity..], (self.head + n - self.capacity) % self.capacity)
        } else {
            (data, self.head)
        };

        let first = data.len().min(self.capacity - start);
        self.buf[start..start + first].copy_from_slice(&data[..first]);
        let rest = data.len() - first;
        if rest > 0 {
            self.buf[..rest].copy_from_slice(&data[first..]);
        }

        self.head = (self.head + n) % self.capacity;
        self.len = (self.len + n).min(self.capacity);
    }

    /// Current write cursor, always in `[0, capacity)`.
    pub fn head(&self) -> usize {
        self.head
    }

    /// Copy `out.len()` samples starting logically at `start`, wrapping as
    /// needed.
    ///
    /// # Panics
    ///
    /// Panics if `out` is longer than the buffer.
    pub fn read_into(&self, start: usize, out: &mut [T]) {
        assert!(
            out.len() <= self.capacity,
            "read of {} samples exceeds ring capacity {}",
            out.len(),
            self.capacity
        );
        let start = start % self.capacity;
        let first = out.len().min(self.capacity - start);
        out[..first].copy_from_slice(&self.buf[start..start + first]);
        let rest = out.len() - first;
        if rest > 0 {
            out[first..].copy_from_slice(&self.buf[..rest]);
        }
    }

    /// Allocating variant of [`read_into`](Self::read_into).
    pub fn read_range(&self, start: usize, count: usize) -> Vec<T> {
        let mut out = vec![T::default(); count];
        self.read_into(start, &mut out);
        out
    }

    /// De-interleave the most recent `frames` frames of `channels` samples.
    ///
    /// Never returns more frames than have actually been written.  The
    /// result holds one `Vec` per channel in chronological order.
    pub fn snapshot_frames(&self, frames: usize, channels: usize) -> Vec<Vec<T>> {
        if channels == 0 {
            return Vec::new();
        }
        let frames = frames.min(self.len / channels);
        let count = frames * channels;
        let start = (self.head + self.capacity - count) % self.capacity;
        let interleaved = self.read_range(start, count);

        let mut out = vec![Vec::with_capacity(frames); channels];
        for frame in interleaved.chunks_exact(channels) {
            for (channel, &sample) in out.iter_mut().zip(frame) {
                channel.push(sample);
            }
        }
        out
    }

    /// Number of valid samples currently stored.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` when nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Maximum number of samples the buffer can hold.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

// ---------------------------------------------------------------------------
// SharedRingBuffer
// ---------------------------------------------------------------------------

/// Ring buffer shared between the cpal capture callback (producer) and the
/// pipeline orchestrator (consumer).
///
/// The mutex is held only for the duration of a memory copy: the callback
/// pushes one period, the orchestrator snapshots the head or copies one
/// frame.  Never hold it across computation.
pub type SharedRingBuffer = Arc<Mutex<RingBuffer<f32>>>;

/// Construct a [`SharedRingBuffer`] of `capacity` samples.
pub fn new_shared_ring(capacity: usize) -> SharedRingBuffer {
    Arc::new(Mutex::new(RingBuffer::new(capacity)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // ---- Push / head -------------------------------------------------------

    #[test]
    fn push_within_capacity_advances_head() {
        let mut buf = RingBuffer::new(8);
        buf.push_slice(&[1.0_f32, 2.0, 3.0]);
        assert_eq!(buf.head(), 3);
        assert_eq!(buf.len(), 3);
        assert_eq!(buf.read_range(0, 3), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn push_exactly_capacity_wraps_head_to_zero() {
        let mut buf = RingBuffer::new(4);
        buf.push_slice(&[1.0_f32, 2.0, 3.0, 4.0]);
        assert_eq!(buf.len(), buf.capacity());
        assert_eq!(buf.head(), 0);
        assert_eq!(buf.read_range(0, 4), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn empty_push_is_noop() {
        let mut buf: RingBuffer<f32> = RingBuffer::new(4);
        buf.push_slice(&[]);
        assert_eq!(buf.head(), 0);
        assert!(buf.is_empty());
    }

    // ---- Overflow / wrap ---------------------------------------------------

    #[test]
    fn overflow_in_separate_calls_keeps_newest() {
        let mut buf = RingBuffer::new(3);
        buf.push_slice(&[1.0_f32, 2.0, 3.0]);
        buf.push_slice(&[4.0, 5.0]);

        assert_eq!(buf.head(), 2);
        // Oldest surviving sample sits at the head.
        assert_eq!(buf.read_range(buf.head(), 3), vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn single_push_larger_than_capacity_keeps_tail() {
        let mut buf = RingBuffer::new(4);
        buf.push_slice(&[0.5_f32]);
        buf.push_slice(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);

        // head = (1 + 7) % 4
        assert_eq!(buf.head(), 0);
        assert_eq!(buf.read_range(buf.head(), 4), vec![4.0, 5.0, 6.0, 7.0]);
    }

    #[test]
    fn only_most_recent_capacity_samples_are_retrievable() {
        let capacity = 10;
        let mut buf = RingBuffer::new(capacity);
        let mut next = 0.0_f32;
        for size in [3usize, 7, 1, 12, 4, 9, 2] {
            let chunk: Vec<f32> = (0..size)
                .map(|_| {
                    next += 1.0;
                    next
                })
                .collect();
            buf.push_slice(&chunk);
            assert!(buf.head() < capacity);
        }

        let expected: Vec<f32> = ((next as usize - capacity + 1)..=next as usize)
            .map(|v| v as f32)
            .collect();
        assert_eq!(buf.read_range(buf.head(), capacity), expected);
    }

    #[test]
    fn read_range_wraps_around_end() {
        let mut buf = RingBuffer::new(5);
        buf.push_slice(&[1.0_f32, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(buf.read_range(3, 4), vec![4.0, 5.0, 1.0, 2.0]);
    }

    #[test]
    fn read_start_is_taken_modulo_capacity() {
        let mut buf = RingBuffer::new(4);
        buf.push_slice(&[1.0_f32, 2.0, 3.0, 4.0]);
        assert_eq!(buf.read_range(6, 2), vec![3.0, 4.0]);
    }

    #[test]
    #[should_panic(expected = "exceeds ring capacity")]
    fn read_longer_than_capacity_panics() {
        let buf: RingBuffer<f32> = RingBuffer::new(4);
        let _ = buf.read_range(0, 5);
    }

    // ---- Snapshot ----------------------------------------------------------

    #[test]
    fn snapshot_deinterleaves_most_recent_frames() {
        let mut buf = RingBuffer::with_frames(4, 2);
        // frames: (1,10) (2,20) (3,30) (4,40) (5,50)
        buf.push_slice(&[1.0_f32, 10.0, 2.0, 20.0, 3.0, 30.0, 4.0, 40.0, 5.0, 50.0]);

        let channels = buf.snapshot_frames(3, 2);
        assert_eq!(channels.len(), 2);
        assert_eq!(channels[0], vec![3.0, 4.0, 5.0]);
        assert_eq!(channels[1], vec![30.0, 40.0, 50.0]);
    }

    #[test]
    fn snapshot_is_limited_to_written_frames() {
        let mut buf = RingBuffer::with_frames(16, 2);
        buf.push_slice(&[1.0_f32, 2.0, 3.0, 4.0]);

        let channels = buf.snapshot_frames(16, 2);
        assert_eq!(channels[0], vec![1.0, 3.0]);
        assert_eq!(channels[1], vec![2.0, 4.0]);
    }


    // ---- Helpers -----------------------------------------------------------

    #[test]
    fn with_frames_capacity_is_channel_multiple() {
        let buf: RingBuffer<f32> = RingBuffer::with_frames(96_000, 8);
        assert_eq!(buf.capacity(), 768_000);
        assert_eq!(buf.capacity() % 8, 0);
    }

    #[test]
    fn shared_ring_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SharedRingBuffer>();
    }

    #[test]
    #[should_panic(expected = "RingBuffer capacity must be > 0")]
    fn zero_capacity_panics() {
        let _buf: RingBuffer<f32> = RingBuffer::new(0);
    }
}
