//! Text dashboard for the live tracker.
//!
//! One screen per hop: reference-channel energy with a detection tag, the
//! estimated angle, beam power, and a one-line ASCII compass.
//!
//! # Example
//!
//! ```rust
//! use doa_tracker::output::{compass_line, COMPASS_WIDTH};
//!
//! let line = compass_line(Some(180));
//! assert_eq!(line.len(), COMPASS_WIDTH);
//! assert_eq!(line.find('V'), Some(22));
//! assert!(compass_line(None).trim().is_empty());
//! ```

use std::fmt::Write;

use crate::pipeline::DoaReport;

/// Character columns in the compass line.
pub const COMPASS_WIDTH: usize = 45;

const RULE: &str = "------------------------------------------------";
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Compass line with a `V` at column `round(azimuth / 360 · 44)`.
///
/// A silent hop (`None`) renders as all blanks.
pub fn compass_line(azimuth: Option<u16>) -> String {
    let mut line = vec![' '; COMPASS_WIDTH];
    if let Some(azimuth) = azimuth {
        let last = (COMPASS_WIDTH - 1) as f64;
        let column = (f64::from(azimuth) / 360.0 * last).round() as usize;
        line[column.min(COMPASS_WIDTH - 1)] = 'V';
    }
    line.into_iter().collect()
}

/// Renders [`DoaReport`]s as a full-screen text dashboard.
#[derive(Debug, Clone)]
pub struct Dashboard {
    min_freq_hz: f64,
    max_freq_hz: f64,
    clear_screen: bool,
}

impl Dashboard {
    /// `min_freq_hz`/`max_freq_hz` only feed the banner.
    pub fn new(min_freq_hz: f64, max_freq_hz: f64) -> Self {
        Self {
            min_freq_hz,
            max_freq_hz,
            clear_screen: true,
        }
    }

    /// Disable the ANSI clear-screen prefix (useful when output is piped).
    pub fn without_clear(mut self) -> Self {
        self.clear_screen = false;
        self
    }

    pub fn render(&self, report: &DoaReport) -> String {
        let result = &report.result;
        let tag = if result.energy >= report.threshold {
            "[SOUND DETECTED]"
        } else {
            "[SILENT]"
        };
        let angle = result
            .azimuth
            .map_or_else(|| "N/A".to_string(), |a| format!("{a} degrees"));
        let power = if result.is_silent() {
            "N/A".to_string()
        } else {
            format!("{:.6}", result.power)
        };

        let mut out = String::new();
        if self.clear_screen {
            out.push_str(CLEAR_SCREEN);
        }
        // Writing to a String cannot fail.
        let _ = writeln!(out, "===== UMA-8 DOA Real-Time Dashboard =====");
        let _ = writeln!(
            out,
            "Listening for human voice ({}-{} Hz)...",
            self.min_freq_hz, self.max_freq_hz
        );
        let _ = writeln!(out, "{RULE}");
        let _ = writeln!(
            out,
            "RMS Energy: {:.4} (Threshold: {:.4}) {tag}",
            result.energy, report.threshold
        );
        let _ = writeln!(out, "{RULE}");
        let _ = writeln!(out, "Estimated Angle:  {angle}");
        let _ = writeln!(out, "Beamformer Power: {power}");
        let _ = writeln!(out);
        let _ = writeln!(out, " 0{}180{}359", "-".repeat(20), "-".repeat(20));
        let _ = writeln!(out, "[{}]", compass_line(result.azimuth));
        let _ = writeln!(out);
        let _ = write!(
            out,
            "hop {} | s+Enter: snapshot, Enter/q: quit",
            report.hop
        );
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::DoaResult;

    fn report(azimuth: Option<u16>, energy: f32) -> DoaReport {
        DoaReport {
            hop: 3,
            result: DoaResult {
                azimuth,
                power: if azimuth.is_some() { 42.5 } else { 0.0 },
                energy,
            },
            threshold: 0.001,
        }
    }

    #[test]
    fn compass_marker_positions() {
        assert_eq!(compass_line(Some(0)).find('V'), Some(0));
        assert_eq!(compass_line(Some(90)).find('V'), Some(11));
        assert_eq!(compass_line(Some(359)).find('V'), Some(44));
        assert_eq!(compass_line(Some(359)).len(), COMPASS_WIDTH);
    }

    #[test]
    fn compass_has_single_marker() {
        for azimuth in (0..360).step_by(7) {
            let line = compass_line(Some(azimuth));
            assert_eq!(line.matches('V').count(), 1, "azimuth {azimuth}");
        }
    }

    #[test]
    fn voiced_report_shows_angle_and_power() {
        let text = Dashboard::new(300.0, 3400.0)
            .without_clear()
            .render(&report(Some(90), 0.25));
        assert!(text.starts_with("====="));
        assert!(text.contains("(300-3400 Hz)"));
        assert!(text.contains("[SOUND DETECTED]"));
        assert!(text.contains("Estimated Angle:  90 degrees"));
        assert!(text.contains("Beamformer Power: 42.500000"));
        assert!(text.contains("hop 3"));
    }

    #[test]
    fn silent_report_shows_na() {
        let text = Dashboard::new(300.0, 3400.0).render(&report(None, 0.0002));
        assert!(text.starts_with(CLEAR_SCREEN));
        assert!(text.contains("[SILENT]"));
        assert!(text.contains("Estimated Angle:  N/A"));
        assert!(text.contains("Beamformer Power: N/A"));
        assert!(text.contains(&format!("[{}]", " ".repeat(COMPASS_WIDTH))));
    }
}
