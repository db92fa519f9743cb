//! Tag tracker: turns per-frame detections into a smoothed relative-position report.
//!
//! One call to [`TagTracker::process_detections`] is one frame:
//! - describe and upsert every detection
//! - run the aging/eviction pass once
//! - update the reference latch (edge-triggered loss signal)
//! - compute positions relative to the reference tag's last known translation
//! - tick the display cadence

use std::time::Instant;

use tracing::{debug, info, warn};

use crate::config::TrackerConfig;
use crate::detection::{RawDetection, TagId};
use crate::geometry::describe_detection;
use crate::tracking::cadence::EmissionCadence;
use crate::tracking::reference::relative_positions;
use crate::tracking::result::{FrameResult, TimingStats};
use crate::tracking::state::{ReferenceEvent, ReferenceLatch, ReferenceState};
use crate::tracking::table::MarkerTable;

pub const REFERENCE_LOST_MESSAGE: &str =
    "Reference tag is out of sight, falling back on last known value.";

/// Tracking engine owning the marker table for the lifetime of the processing loop.
pub struct TagTracker {
    table: MarkerTable,
    latch: ReferenceLatch,
    cadence: EmissionCadence,
    /// Running frame counter.
    frame_count: u64,
}

impl TagTracker {
    pub fn new(config: &TrackerConfig) -> Self {
        Self {
            table: MarkerTable::new(config.reference_tag_id, config.smoothing_frames),
            latch: ReferenceLatch::new(),
            cadence: EmissionCadence::new(config.display_interval),
            frame_count: 0,
        }
    }

    /// Process the full detection set of one frame. An empty slice is a
    /// normal frame in which every tracked tag ages by one.
    pub fn process_detections(&mut self, detections: &[RawDetection]) -> FrameResult {
        let t_start = Instant::now();
        let frame_index = self.frame_count;
        self.frame_count += 1;

        let mut described = Vec::with_capacity(detections.len());
        for detection in detections {
            let d = describe_detection(detection);
            debug!("{}", d.text);
            self.table.upsert(d.id, d.translation, d.text.clone());
            described.push(d);
        }

        let evicted = self.table.age_and_evict();
        for id in &evicted {
            debug!("Tag {} not seen for {} frames, dropped", id, self.table.smoothing_frames() + 1);
        }

        let reference_id = self.table.reference_id();
        let reference_ttl = self.table.get(reference_id).map(|m| m.ttl);
        let reference_event = self.latch.update(reference_ttl);
        match reference_event {
            Some(ReferenceEvent::Lost) => warn!("{}", REFERENCE_LOST_MESSAGE),
            Some(ReferenceEvent::Reacquired) => info!("Reference tag {} back in sight", reference_id),
            None => {}
        }

        let report = relative_positions(&self.table);
        let emit = self.cadence.tick();

        let mut timing = TimingStats::zero();
        timing.track_ms = t_start.elapsed().as_secs_f64() * 1000.0;
        timing.total_ms = timing.track_ms;

        FrameResult {
            frame_index,
            detections: described,
            evicted,
            reference: self.latch.state(),
            reference_event,
            report,
            emit,
            timing,
        }
    }

    pub fn table(&self) -> &MarkerTable {
        &self.table
    }

    pub fn reference_id(&self) -> TagId {
        self.table.reference_id()
    }

    pub fn reference_state(&self) -> ReferenceState {
        self.latch.state()
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}
