//! Per-frame tracking results.
//!
//! A [`FrameResult`] captures everything the engine decided for one frame:
//! - which detections were ingested and how they were described
//! - which tags aged out
//! - the reference tag state and any edge event
//! - the relative-position report and whether it should be shown

use crate::detection::TagId;
use crate::geometry::DescribedDetection;

use super::reference::RelativePosition;
use super::state::{ReferenceEvent, ReferenceState};

/// Summary of tracking for a single frame.
#[derive(Debug, Clone)]
pub struct FrameResult {
    /// Zero-based index of the frame since the engine started.
    pub frame_index: u64,
    pub detections: Vec<DescribedDetection>,
    /// Tags removed by this frame's aging pass.
    pub evicted: Vec<TagId>,
    pub reference: ReferenceState,
    /// Set only on the frame where the reference changes liveness.
    pub reference_event: Option<ReferenceEvent>,
    pub report: Vec<RelativePosition>,
    /// Whether the display cadence lets this frame's report through.
    pub emit: bool,
    pub timing: TimingStats,
}

impl FrameResult {
    /// Report lines as printed to the terminal.
    pub fn report_lines(&self) -> impl Iterator<Item = String> + '_ {
        self.report.iter().map(|p| p.to_string())
    }

    pub fn position_of(&self, id: TagId) -> Option<&RelativePosition> {
        self.report.iter().find(|p| p.id == id)
    }
}

/// Timing breakdown for a frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimingStats {
    pub total_ms: f64,
    pub acquire_ms: f64,
    pub detect_ms: f64,
    pub track_ms: f64,
}

impl TimingStats {
    pub fn zero() -> Self {
        Self::default()
    }
}
