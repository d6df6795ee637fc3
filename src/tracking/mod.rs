//! Tracking: locates the camera from tags already in the World Model.
//!
//! - Frame / observation types produced by the detector
//! - Localizer (candidate camera poses from known tags)
//! - Cross-tag consistency check
//! - Per-run tracking state and per-frame results

pub mod consistency;
pub mod localizer;
pub mod observation;
pub mod result;
pub mod state;

pub use consistency::{ConsistencyCheck, ConsistencyThresholds};
pub use localizer::{CandidatePolicy, Localization, Localizer};
pub use observation::{Frame, Observation};
pub use result::{TrackingMetrics, TrackingResult};
pub use state::{TrackingState, TrackingStatus};
