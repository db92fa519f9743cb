//! State shared between the processing loop and other threads.
//!
//! `SharedState` carries the stop flag checked between frames. `SharedTracker`
//! puts the tracking engine behind one lock so a frame step is never observed
//! half-done.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::config::TrackerConfig;
use crate::detection::{RawDetection, TagId};
use crate::tracking::{FrameResult, ReferenceState, TagTracker, TrackedMarker};

/// Flags accessible by the processing loop and the acquisition thread.
pub struct SharedState {
    /// Set when the user asked to quit or the owner is shutting down.
    pub stop_requested: AtomicBool,
}

impl SharedState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Request every loop to finish after its current frame.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::SeqCst);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::SeqCst)
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self {
            stop_requested: AtomicBool::new(false),
        }
    }
}

/// Tracking engine behind a mutex. Cloning shares the same engine.
#[derive(Clone)]
pub struct SharedTracker {
    inner: Arc<Mutex<TagTracker>>,
}

impl SharedTracker {
    pub fn new(config: &TrackerConfig) -> Self {
        Self::from_tracker(TagTracker::new(config))
    }

    pub fn from_tracker(tracker: TagTracker) -> Self {
        Self {
            inner: Arc::new(Mutex::new(tracker)),
        }
    }

    /// Run one frame step. The lock is held for the whole step.
    pub fn process_detections(&self, detections: &[RawDetection]) -> FrameResult {
        self.inner.lock().process_detections(detections)
    }

    pub fn reference_state(&self) -> ReferenceState {
        self.inner.lock().reference_state()
    }

    pub fn reference_id(&self) -> TagId {
        self.inner.lock().reference_id()
    }

    pub fn frame_count(&self) -> u64 {
        self.inner.lock().frame_count()
    }

    /// Number of entries currently in the marker table.
    pub fn tracked_count(&self) -> usize {
        self.inner.lock().table().len()
    }

    /// Copy of the marker table, ordered by id.
    pub fn snapshot(&self) -> Vec<TrackedMarker> {
        self.inner.lock().table().iter().cloned().collect()
    }
}
