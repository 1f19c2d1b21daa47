//! Presentation of per-hop results and CSV export.
//!
//! [`ReportRenderer`] turns each [`DoaReport`] into the text the binary
//! prints: either the full-screen [`Dashboard`] or one JSON object per line.

pub mod dashboard;
pub mod snapshot;

pub use dashboard::{compass_line, Dashboard, COMPASS_WIDTH};
pub use snapshot::{
    save_snapshot, snapshot_path, write_capture_csv, SnapshotError, RECORDING_LABEL,
    SNAPSHOT_LABEL,
};

use crate::config::{AppConfig, OutputFormat};
use crate::pipeline::DoaReport;

/// Formats reports according to `[output] format`.
#[derive(Debug, Clone)]
pub struct ReportRenderer {
    format: OutputFormat,
    dashboard: Dashboard,
}

impl ReportRenderer {
    pub fn new(format: OutputFormat, dashboard: Dashboard) -> Self {
        Self { format, dashboard }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.output.format,
            Dashboard::new(config.dsp.min_freq_hz, config.dsp.max_freq_hz),
        )
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Render one report.  JSON lines carry no trailing newline.
    pub fn render(&self, report: &DoaReport) -> Result<String, serde_json::Error> {
        match self.format {
            OutputFormat::Dashboard => Ok(self.dashboard.render(report)),
            OutputFormat::JsonLines => serde_json::to_string(report),
        }
    }
}
