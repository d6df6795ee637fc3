//! Cross-tag consistency check.
//!
//! A tag already in the World Model is re-surveyed through an assumed camera
//! pose and compared to its stored pose. Disagreement beyond the thresholds in
//! any translation axis or any Euler angle marks the observation as an
//! outlier for the current frame. The World Model is never corrected from
//! here.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::geometry::SE3;
use crate::tracking::Observation;
use crate::world::{TagId, WorldModel};

/// Rejection thresholds. A delta equal to the threshold is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsistencyThresholds {
    /// Per-axis translation limit (map units).
    pub max_translation: f64,
    /// Per-axis Euler angle limit (rad).
    pub max_rotation: f64,
}

impl Default for ConsistencyThresholds {
    fn default() -> Self {
        Self {
            max_translation: 0.10,
            // 15°
            max_rotation: 0.261799,
        }
    }
}

/// Result of checking one observation against the World Model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConsistencyCheck {
    pub tag: TagId,
    /// Translation of `T_world_tag(stored) ∘ T_world_tag(observed)^-1`.
    pub translation_delta: Vector3<f64>,
    /// Rotation of the same difference as (roll, pitch, yaw).
    pub rotation_delta: Vector3<f64>,
    pub accepted: bool,
}

impl ConsistencyThresholds {
    /// Check `observation` assuming the camera sits at `camera_pose` (`T_world_cam`).
    ///
    /// Returns `None` when the tag is not in the World Model.
    pub fn check_tag(
        &self,
        observation: &Observation,
        camera_pose: &SE3,
        world: &WorldModel,
    ) -> Option<ConsistencyCheck> {
        let stored = world.get(observation.tag)?;

        let observed = camera_pose.compose(&observation.transform);
        let difference = stored.compose(&observed.inverse());

        let translation_delta = difference.translation;
        let rotation_delta = difference.euler_angles();

        let accepted = translation_delta.iter().all(|d| d.abs() < self.max_translation)
            && rotation_delta.iter().all(|d| d.abs() < self.max_rotation);

        if accepted {
            debug!(
                "{} consistent: dt=[{:.3}, {:.3}, {:.3}] dr=[{:.3}, {:.3}, {:.3}]",
                observation.tag,
                translation_delta.x,
                translation_delta.y,
                translation_delta.z,
                rotation_delta.x,
                rotation_delta.y,
                rotation_delta.z,
            );
        } else {
            warn!(
                "{} rejected: dt=[{:.3}, {:.3}, {:.3}] dr=[{:.3}, {:.3}, {:.3}]",
                observation.tag,
                translation_delta.x,
                translation_delta.y,
                translation_delta.z,
                rotation_delta.x,
                rotation_delta.y,
                rotation_delta.z,
            );
        }

        Some(ConsistencyCheck {
            tag: observation.tag,
            translation_delta,
            rotation_delta,
            accepted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::UnitQuaternion;

    fn world_with(tag: u32, pose: SE3) -> WorldModel {
        let mut world = WorldModel::new();
        world.put(TagId::new(tag), pose).unwrap();
        world
    }

    #[test]
    fn test_exact_agreement_accepted() {
        let tag_pose = SE3::from_translation(2.0, 0.0, 1.0);
        let world = world_with(4, tag_pose);
        let camera = SE3::from_translation(0.5, 0.0, 0.0);
        let obs = Observation::new(4, camera.inverse().compose(&tag_pose));

        let check = ConsistencyThresholds::default()
            .check_tag(&obs, &camera, &world)
            .unwrap();
        assert!(check.accepted);
        assert!(check.translation_delta.norm() < 1e-9);
    }

    #[test]
    fn test_small_disagreement_accepted() {
        let world = world_with(4, SE3::identity());
        let obs = Observation::new(
            4,
            SE3::new(
                Vector3::new(0.03, -0.03, 0.04),
                UnitQuaternion::from_euler_angles(0.05, -0.08, 0.1),
            ),
        );

        let check = ConsistencyThresholds::default()
            .check_tag(&obs, &SE3::identity(), &world)
            .unwrap();
        assert!(check.accepted);
    }

    #[test]
    fn test_translation_outlier_rejected() {
        let world = world_with(4, SE3::identity());
        let obs = Observation::new(4, SE3::from_translation(0.0, 0.15, 0.0));

        let check = ConsistencyThresholds::default()
            .check_tag(&obs, &SE3::identity(), &world)
            .unwrap();
        assert!(!check.accepted);
        assert!((check.translation_delta.y + 0.15).abs() < 1e-9);
    }

    #[test]
    fn test_rotation_outlier_rejected() {
        let world = world_with(4, SE3::identity());
        let obs = Observation::new(
            4,
            SE3::new(Vector3::zeros(), UnitQuaternion::from_euler_angles(0.0, 0.0, 0.3)),
        );

        let check = ConsistencyThresholds::default()
            .check_tag(&obs, &SE3::identity(), &world)
            .unwrap();
        assert!(!check.accepted);
    }

    #[test]
    fn test_translation_on_threshold_rejected() {
        let world = world_with(4, SE3::identity());
        let thresholds = ConsistencyThresholds::default();

        let on = Observation::new(4, SE3::from_translation(0.10, 0.0, 0.0));
        let check = thresholds.check_tag(&on, &SE3::identity(), &world).unwrap();
        assert_eq!(check.translation_delta.x.abs(), 0.10);
        assert!(!check.accepted);

        let below = Observation::new(4, SE3::from_translation(0.0999, 0.0, 0.0));
        let check = thresholds.check_tag(&below, &SE3::identity(), &world).unwrap();
        assert!(check.accepted);
    }

    #[test]
    fn test_rotation_on_threshold_rejected() {
        let world = world_with(4, SE3::identity());
        let yawed = |yaw: f64| {
            Observation::new(
                4,
                SE3::new(Vector3::zeros(), UnitQuaternion::from_euler_angles(0.0, 0.0, yaw)),
            )
        };

        let below = ConsistencyThresholds::default()
            .check_tag(&yawed(0.2617), &SE3::identity(), &world)
            .unwrap();
        assert!(below.accepted);

        // Pin the limit to the exact delta the check measures.
        let obs = yawed(0.261799);
        let measured = ConsistencyThresholds::default()
            .check_tag(&obs, &SE3::identity(), &world)
            .unwrap();
        assert!((measured.rotation_delta.z.abs() - 0.261799).abs() < 1e-9);
        let on_limit = ConsistencyThresholds {
            max_rotation: measured.rotation_delta.z.abs(),
            ..ConsistencyThresholds::default()
        };
        let check = on_limit.check_tag(&obs, &SE3::identity(), &world).unwrap();
        assert!(!check.accepted);
    }

    #[test]
    fn test_unknown_tag_is_none() {
        let world = world_with(4, SE3::identity());
        let obs = Observation::new(5, SE3::identity());
        assert!(ConsistencyThresholds::default()
            .check_tag(&obs, &SE3::identity(), &world)
            .is_none());
    }
}
