//! Tag tracking system orchestration and thread management.
//!
//! This module contains the top-level `TagTrackingSystem` processing loop,
//! the offline replay runner, the optional bounded-wait acquisition thread,
//! and the state shared between them.

pub mod acquisition;
pub mod shared_state;
mod tag_system;

pub use acquisition::BoundedFrameSource;
pub use shared_state::{SharedState, SharedTracker};
pub use tag_system::{ReportPrinter, TagTrackingSystem, run_replay};
