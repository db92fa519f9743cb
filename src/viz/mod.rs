//! Presentation: OpenCV window overlay and optional Rerun logging.

pub mod presenter;
pub mod rerun;

pub use presenter::{HighGuiPresenter, NullPresenter, Presenter};
pub use self::rerun::RerunVisualizer;
