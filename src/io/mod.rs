//! Frame acquisition and recorded detection logs.

pub mod camera;
pub mod replay;

pub use camera::{Frame, FrameSource, OpenCvCamera, StreamConfig, to_grayscale};
pub use replay::DetectionLog;
