//! On-disk representation of the World Model.
//!
//! ```yaml
//! 7:
//!   translation: [0.0, 0.0, 0.0]
//!   rotation: [0.0, 0.0, 0.0, 1.0]   # x, y, z, w
//! 12:
//!   translation: [1.02, -0.01, 0.0]
//!   rotation: [0.0, 0.0, 0.707, 0.707]
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::TagId;
use crate::error::WorldModelError;
use crate::geometry::SE3;

/// World→tag pose of a single tag as written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagPoseRecord {
    pub translation: [f64; 3],
    /// Quaternion `[x, y, z, w]`.
    pub rotation: [f64; 4],
}

impl From<&SE3> for TagPoseRecord {
    fn from(pose: &SE3) -> Self {
        Self {
            translation: pose.translation_array(),
            rotation: pose.rotation_array(),
        }
    }
}

impl TagPoseRecord {
    /// Validate the record into a transform.
    pub fn to_pose(&self, tag: TagId) -> Result<SE3, WorldModelError> {
        SE3::try_from_parts(self.translation, self.rotation)
            .map_err(|source| WorldModelError::InvalidEntry { tag, source })
    }
}

/// Whole-map document: tag id → world pose.
pub type WorldDocument = BTreeMap<TagId, TagPoseRecord>;
