//! Tracking results and diagnostics structures.
//!
//! These types describe what happened during processing of a single frame:
//! - tracking status (OK / lost / not initialized)
//! - the raw camera pose and, once the pose window has filled, the smoothed
//!   pose that was published
//! - what happened to each observed tag

use crate::geometry::SE3;
use crate::tracking::TrackingStatus;
use crate::world::TagId;

/// Summary of tracking for a single frame.
#[derive(Debug, Clone)]
pub struct TrackingResult {
    pub status: TrackingStatus,
    /// Camera pose `T_world_cam` computed from this frame.
    pub pose: Option<SE3>,
    /// Smoothed camera pose broadcast this frame.
    pub published_pose: Option<SE3>,
    pub metrics: TrackingMetrics,
}

impl TrackingResult {
    pub fn is_tracking(&self) -> bool {
        self.status == TrackingStatus::Ok
    }
}

/// Per-frame counters useful for debugging map building.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackingMetrics {
    pub n_observations: usize,
    /// Observations whose tag was already mapped.
    pub n_known: usize,
    pub accepted: Vec<TagId>,
    pub rejected: Vec<TagId>,
    /// The consistency check was required but had no assumed camera pose.
    pub consistency_skipped: bool,
    /// Tag that became the world origin during this frame.
    pub anchored: Option<TagId>,
    /// Registration samples routed into the sample buffer.
    pub n_registration_samples: usize,
    /// Tags committed to the World Model during this frame.
    pub committed: Vec<TagId>,
    /// Tags whose samples were dropped for lack of a free slot.
    pub dropped: Vec<TagId>,
}
