//! Tag tracking: per-tag liveness, reference-frame transform, report cadence.
//!
//! - `table`: tracked-marker table with the aging/eviction policy
//! - `state`: reference-tag state machine and edge events
//! - `reference`: positions relative to the reference tag
//! - `cadence`: report emission rate limiter
//! - `tracker`: per-frame orchestration of the above

pub mod cadence;
pub mod reference;
pub mod result;
pub mod state;
pub mod table;
pub mod tracker;

pub use reference::RelativePosition;
pub use result::FrameResult;
pub use state::{ReferenceEvent, ReferenceState};
pub use table::{MarkerTable, TrackedMarker};
pub use tracker::{REFERENCE_LOST_MESSAGE, TagTracker};
