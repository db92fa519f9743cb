//! Frame acquisition errors.
//!
//! Everything else in the crate reports through `anyhow`; acquisition
//! failures get a concrete type so the processing loop and its callers can
//! tell a dead camera apart from other faults (`err.downcast_ref`).

use std::time::Duration;

use thiserror::Error;

/// Fatal frame-source failures. No frames means no tracking, so none of
/// these are retried.
#[derive(Error, Debug)]
pub enum AcquisitionError {
    #[error("Failed to open capture device {device}")]
    OpenFailed { device: i32 },

    #[error("Capture device refused stream {width}x{height}@{fps}")]
    StreamRejected { width: u32, height: u32, fps: u32 },

    #[error("Frame source returned an empty frame")]
    EmptyFrame,

    #[error("No frame within {0:?}")]
    Timeout(Duration),

    #[error("Acquisition thread stopped")]
    Disconnected,

    #[error("Frame source used before start()")]
    NotStarted,
}
