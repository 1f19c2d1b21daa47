//! Multi-channel CSV export.
//!
//! Used both by the live tracker (`s` + Enter dumps the latest frame) and
//! by the `doa-capture` recorder.  The layout is one header row of channel
//! labels followed by one row per sample index.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::audio::SharedRingBuffer;

/// Header label prefix for live snapshots (`Mic0,Mic1,…`).
pub const SNAPSHOT_LABEL: &str = "Mic";
/// Header label prefix for offline recordings (`Channel_0,Channel_1,…`).
pub const RECORDING_LABEL: &str = "Channel_";

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("no samples to write")]
    Empty,
    #[error("channel {channel} has {len} samples, expected {expected}")]
    RaggedChannels {
        channel: usize,
        len: usize,
        expected: usize,
    },
    #[error("ring buffer lock poisoned")]
    Poisoned,
    #[error("failed to write capture: {0}")]
    Io(#[from] std::io::Error),
}

/// `dir/capture_<index>.csv`
pub fn snapshot_path(dir: &Path, index: usize) -> PathBuf {
    dir.join(format!("capture_{index}.csv"))
}

/// Write de-interleaved `channels` to `path` as CSV.
///
/// All channels must hold the same number of samples.  Parent directories
/// are created.  Returns the number of data rows written.
pub fn write_capture_csv(
    path: &Path,
    channels: &[Vec<f32>],
    label_prefix: &str,
) -> Result<usize, SnapshotError> {
    let rows = channels.first().map_or(0, Vec::len);
    if rows == 0 {
        return Err(SnapshotError::Empty);
    }
    if let Some((channel, samples)) = channels
        .iter()
        .enumerate()
        .find(|(_, samples)| samples.len() != rows)
    {
        return Err(SnapshotError::RaggedChannels {
            channel,
            len: samples.len(),
            expected: rows,
        });
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut out = BufWriter::new(File::create(path)?);
    let header: Vec<String> = (0..channels.len())
        .map(|i| format!("{label_prefix}{i}"))
        .collect();
    writeln!(out, "{}", header.join(","))?;

    let mut row = String::new();
    for i in 0..rows {
        row.clear();
        for (j, samples) in channels.iter().enumerate() {
            if j > 0 {
                row.push(',');
            }
            row.push_str(&samples[i].to_string());
        }
        writeln!(out, "{row}")?;
    }
    out.flush()?;
    Ok(rows)
}

/// Copy the most recent `frames` frames out of `ring` and write them to
/// `path` with `Mic` labels.
///
/// The ring lock is released before any file I/O.
pub fn save_snapshot(
    ring: &SharedRingBuffer,
    frames: usize,
    channels: usize,
    path: &Path,
) -> Result<usize, SnapshotError> {
    let snapshot = ring
        .lock()
        .map_err(|_| SnapshotError::Poisoned)?
        .snapshot_frames(frames, channels);
    write_capture_csv(path, &snapshot, SNAPSHOT_LABEL)
}
