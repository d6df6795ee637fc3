//! Broadcast message types.
//!
//! These are sent to the transport collaborator once per frame: the smoothed
//! camera pose (once the pose window has filled) and every World Model entry.

use crate::geometry::SE3;
use crate::world::TagId;

/// One transform published for consumers outside the tracker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Broadcast {
    /// Smoothed `T_world_cam`.
    CameraPose { pose: SE3 },
    /// `T_world_tag` of a mapped tag.
    TagPose { tag: TagId, pose: SE3 },
}
