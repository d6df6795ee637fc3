//! Sample smoothing.
//!
//! - [`SampleBuffer`] - per-tag accumulation before a new tag is committed
//! - [`PoseWindow`] - sliding mean over the published camera pose

pub mod pose_window;
pub mod sample_buffer;

pub use pose_window::PoseWindow;
pub use sample_buffer::{SampleBuffer, SampleOutcome};
