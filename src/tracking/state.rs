//! Per-run tracking state.

use crate::geometry::SE3;
use crate::world::TagId;

/// Outcome of the most recent frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingStatus {
    /// No frame has located the camera yet.
    NotInitialized,
    /// The current frame located the camera.
    Ok,
    /// The camera was located before, but not in the current frame.
    Lost,
}

impl Default for TrackingStatus {
    fn default() -> Self {
        Self::NotInitialized
    }
}

/// Camera pose and tracking flag carried between frames.
#[derive(Debug, Clone, Default)]
pub struct TrackingState {
    /// Last accepted `T_world_cam`. Kept across frames that fail to track,
    /// but only [`TrackingState::tracked_pose`] feeds the next frame.
    pub camera_pose: Option<SE3>,
    /// Whether the current frame located the camera.
    pub tracking: bool,
    /// First tag ever seen; set once.
    pub anchor: Option<TagId>,
}

impl TrackingState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear the per-frame flag before a new frame is processed.
    pub fn begin_frame(&mut self) {
        self.tracking = false;
    }

    /// Record an accepted camera pose for the current frame.
    pub fn set_tracked(&mut self, pose: SE3) {
        self.camera_pose = Some(pose);
        self.tracking = true;
    }

    pub fn status(&self) -> TrackingStatus {
        match (self.tracking, self.camera_pose.is_some()) {
            (true, _) => TrackingStatus::Ok,
            (false, true) => TrackingStatus::Lost,
            (false, false) => TrackingStatus::NotInitialized,
        }
    }

    /// Current pose, only if the current frame tracked.
    pub fn tracked_pose(&self) -> Option<&SE3> {
        if self.tracking {
            self.camera_pose.as_ref()
        } else {
            None
        }
    }
}
