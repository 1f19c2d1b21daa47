//! Microphone array geometry.
//!
//! Positions are 2D, in meters, relative to the array origin.  Only the
//! "active" subset takes part in beamforming; the UMA-8's center mic (0)
//! and spare channel (7) are captured but excluded.

use thiserror::Error;

/// Errors raised while constructing an [`ArrayGeometry`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GeometryError {
    #[error("array needs at least one channel")]
    NoChannels,

    #[error("no active microphones configured")]
    NoActiveMics,

    #[error("active mic index {index} out of range for {channels} channels")]
    ActiveOutOfRange { index: usize, channels: usize },

    #[error("active mic index {0} listed twice")]
    DuplicateActive(usize),
}

/// Position of one microphone in meters.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MicPosition {
    pub x: f64,
    pub y: f64,
}

/// Immutable array layout: one position per channel plus the active subset.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayGeometry {
    positions: Vec<MicPosition>,
    active: Vec<usize>,
}

impl ArrayGeometry {
    /// Build a geometry from explicit positions.
    pub fn new(positions: Vec<MicPosition>, active: Vec<usize>) -> Result<Self, GeometryError> {
        if positions.is_empty() {
            return Err(GeometryError::NoChannels);
        }
        if active.is_empty() {
            return Err(GeometryError::NoActiveMics);
        }
        for (i, &index) in active.iter().enumerate() {
            if index >= positions.len() {
                return Err(GeometryError::ActiveOutOfRange {
                    index,
                    channels: positions.len(),
                });
            }
            if active[..i].contains(&index) {
                return Err(GeometryError::DuplicateActive(index));
            }
        }
        Ok(Self { positions, active })
    }

    /// Active mics spread evenly on a circle of `radius`, in list order,
    /// starting at 0° and turning counter-clockwise.  Every other channel
    /// sits at the origin.
    pub fn circular(
        channel_count: usize,
        radius: f64,
        active: &[usize],
    ) -> Result<Self, GeometryError> {
        let mut positions = vec![MicPosition::default(); channel_count];
        let step = if active.is_empty() {
            0.0
        } else {
            360.0 / active.len() as f64
        };
        for (slot, &index) in active.iter().enumerate() {
            if let Some(position) = positions.get_mut(index) {
                let angle = (slot as f64 * step).to_radians();
                *position = MicPosition {
                    x: radius * angle.cos(),
                    y: radius * angle.sin(),
                };
            }
        }
        Self::new(positions, active.to_vec())
    }

    /// miniDSP UMA-8 layout: center mic 0, outer mics 1..=6 at 60° steps,
    /// spare channel 7.
    pub fn uma8(radius: f64) -> Self {
        let active: Vec<usize> = (1..=6).collect();
        let mut positions = vec![MicPosition::default(); 8];
        for &index in &active {
            let angle = ((index - 1) as f64 * 60.0).to_radians();
            positions[index] = MicPosition {
                x: radius * angle.cos(),
                y: radius * angle.sin(),
            };
        }
        Self { positions, active }
    }

    /// Total number of captured channels.
    pub fn channel_count(&self) -> usize {
        self.positions.len()
    }

    /// Channel indices that take part in beamforming, in slot order.
    pub fn active(&self) -> &[usize] {
        &self.active
    }

    /// Position of `channel`.
    ///
    /// # Panics
    ///
    /// Panics if `channel >= channel_count()`.
    pub fn position(&self, channel: usize) -> MicPosition {
        self.positions[channel]
    }

    /// `(channel, position)` for every active mic, in slot order.
    pub fn active_positions(&self) -> impl Iterator<Item = (usize, MicPosition)> + '_ {
        self.active.iter().map(move |&i| (i, self.positions[i]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn uma8_layout() {
        let geo = ArrayGeometry::uma8(0.045);
        assert_eq!(geo.channel_count(), 8);
        assert_eq!(geo.active(), &[1, 2, 3, 4, 5, 6]);
        assert_eq!(geo.position(0), MicPosition::default());
        assert_eq!(geo.position(7), MicPosition::default());

        assert_relative_eq!(geo.position(1).x, 0.045, epsilon = 1e-12);
        assert_relative_eq!(geo.position(1).y, 0.0, epsilon = 1e-12);
        assert_relative_eq!(geo.position(3).x, -0.0225, epsilon = 1e-12);
        assert_relative_eq!(geo.position(4).x, -0.045, epsilon = 1e-12);
        for (_, p) in geo.active_positions() {
            assert_relative_eq!(p.x.hypot(p.y), 0.045, epsilon = 1e-12);
        }
    }

    #[test]
    #[should_panic(expected = "index out of bounds")]
    fn position_out_of_range_panics() {
        let _ = ArrayGeometry::uma8(0.045).position(8);
    }

    #[test]
    fn circular_matches_uma8() {
        let circular = ArrayGeometry::circular(8, 0.045, &[1, 2, 3, 4, 5, 6]).unwrap();
        let uma8 = ArrayGeometry::uma8(0.045);
        for ch in 0..8 {
            assert_relative_eq!(circular.position(ch).x, uma8.position(ch).x, epsilon = 1e-12);
            assert_relative_eq!(circular.position(ch).y, uma8.position(ch).y, epsilon = 1e-12);
        }
    }

    #[test]
    fn rejects_out_of_range_active() {
        assert_eq!(
            ArrayGeometry::circular(4, 0.05, &[1, 4]),
            Err(GeometryError::ActiveOutOfRange {
                index: 4,
                channels: 4
            })
        );
    }

    #[test]
    fn rejects_empty_and_duplicates() {
        assert_eq!(
            ArrayGeometry::circular(4, 0.05, &[]),
            Err(GeometryError::NoActiveMics)
        );
        assert_eq!(
            ArrayGeometry::circular(0, 0.05, &[0]),
            Err(GeometryError::NoChannels)
        );
        assert_eq!(
            ArrayGeometry::circular(4, 0.05, &[1, 1]),
            Err(GeometryError::DuplicateActive(1))
        );
    }
}
