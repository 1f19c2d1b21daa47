//! Loop state machine and per-hop result types.
//!
//! [`LoopState`] records where the orchestrator is within a hop.
//! [`DoaResult`] / [`DoaReport`] are produced once per processed hop and
//! handed straight to the presentation side; nothing is retained.

use serde::Serialize;

// ---------------------------------------------------------------------------
// LoopState
// ---------------------------------------------------------------------------

/// States of the hop-paced processing loop.
///
/// ```text
/// WaitForHop ──≥ 1 hop available──▶ Extract ──▶ Gate
///     ▲                                          │
///     │                          rms < threshold │ rms ≥ threshold
///     │                                ▼         ▼
///     │                      SilentReport   TransformAndSearch
///     │                                │         │
///     └─────────────── Report ◀────────┴─────────┘
/// ```
///
/// The loop only terminates on the external shutdown signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopState {
    /// Polling the ring head until one hop of new samples has arrived.
    #[default]
    WaitForHop,
    /// Copying and windowing one frame.
    Extract,
    /// Computing reference-channel RMS.
    Gate,
    /// Below threshold; no spectral work this hop.
    SilentReport,
    /// Transform, band focus and beam search.
    TransformAndSearch,
    /// Handing the result to the presentation side.
    Report,
}

impl LoopState {
    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            LoopState::WaitForHop => "wait-for-hop",
            LoopState::Extract => "extract",
            LoopState::Gate => "gate",
            LoopState::SilentReport => "silent",
            LoopState::TransformAndSearch => "search",
            LoopState::Report => "report",
        }
    }
}

// ---------------------------------------------------------------------------
// DoaResult / DoaReport
// ---------------------------------------------------------------------------

/// Outcome of one hop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DoaResult {
    /// Azimuth in degrees `0..360`, or `None` for a silent hop.
    pub azimuth: Option<u16>,
    /// Integrated beam power at `azimuth`; `0.0` when silent.
    pub power: f64,
    /// Reference-channel RMS of the windowed frame.
    pub energy: f32,
}

impl DoaResult {
    /// The result of a hop rejected by the voice gate.
    pub fn silent(energy: f32) -> Self {
        Self {
            azimuth: None,
            power: 0.0,
            energy,
        }
    }

    pub fn is_silent(&self) -> bool {
        self.azimuth.is_none()
    }
}

/// What the presentation collaborator receives per hop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DoaReport {
    /// Zero-based count of processed hops.
    pub hop: u64,
    #[serde(flatten)]
    pub result: DoaResult,
    /// Voice-gate threshold in effect, for display.
    pub threshold: f32,
}

// ---------------------------------------------------------------------------
// LoopStats
// ---------------------------------------------------------------------------

/// Counters kept by the orchestrator and logged at shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoopStats {
    pub hops_processed: u64,
    pub voiced_hops: u64,
    pub silent_hops: u64,
    /// Hops read while headroom was below one frame.
    pub overrun_warnings: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_wait_for_hop() {
        assert_eq!(LoopState::default(), LoopState::WaitForHop);
    }

    #[test]
    fn labels() {
        assert_eq!(LoopState::WaitForHop.label(), "wait-for-hop");
        assert_eq!(LoopState::TransformAndSearch.label(), "search");
        assert_eq!(LoopState::SilentReport.label(), "silent");
    }

    #[test]
    fn silent_result_shape() {
        let result = DoaResult::silent(0.0004);
        assert!(result.is_silent());
        assert_eq!(result.power, 0.0);
        assert!((result.energy - 0.0004).abs() < 1e-9);
    }

    #[test]
    fn report_serialises_flat() {
        let report = DoaReport {
            hop: 7,
            result: DoaResult {
                azimuth: Some(90),
                power: 12.5,
                energy: 0.25,
            },
            threshold: 0.001,
        };
        let json = serde_json::to_value(report).unwrap();
        assert_eq!(json["hop"], 7);
        assert_eq!(json["azimuth"], 90);
        assert_eq!(json["power"], 12.5);
        assert!(json.get("result").is_none());
    }

    #[test]
    fn silent_report_serialises_null_azimuth() {
        let report = DoaReport {
            hop: 0,
            result: DoaResult::silent(0.0),
            threshold: 0.001,
        };
        let json = serde_json::to_value(report).unwrap();
        assert!(json["azimuth"].is_null());
    }
}
