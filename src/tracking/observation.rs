//! Detector output consumed by the tracker.
//!
//! Unlike the image-level frames of a feature-based pipeline, a tag `Frame`
//! is already geometric: the perception collaborator has turned every
//! detected marker into a camera→tag transform.

use crate::geometry::SE3;
use crate::world::TagId;

/// A single detected tag: `T_cam_tag`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub tag: TagId,
    pub transform: SE3,
}

impl Observation {
    pub fn new(tag: impl Into<TagId>, transform: SE3) -> Self {
        Self {
            tag: tag.into(),
            transform,
        }
    }
}

/// All observations sharing one acquisition instant, in detector order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    pub observations: Vec<Observation>,
    /// Optional external `T_world_cam` estimate, used as the assumed pose for
    /// the consistency check when the tracker has no pose of its own yet.
    pub camera_estimate: Option<SE3>,
}

impl Frame {
    pub fn new(observations: Vec<Observation>) -> Self {
        Self {
            observations,
            camera_estimate: None,
        }
    }

    pub fn with_camera_estimate(mut self, estimate: SE3) -> Self {
        self.camera_estimate = Some(estimate);
        self
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}
