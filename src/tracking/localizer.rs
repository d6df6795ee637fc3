//! Camera localization from tags already in the World Model.
//!
//! Every observed tag with a stored world pose yields a candidate
//! `T_world_cam = T_world_tag ∘ T_cam_tag^-1`. When the frame holds more than
//! one observation, each candidate's tag must first pass the consistency
//! check against the assumed camera pose. A lone observation has nothing to
//! corroborate it and is taken as-is.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::geometry::{SE3, mean_pose};
use crate::tracking::consistency::ConsistencyThresholds;
use crate::tracking::Frame;
use crate::world::{TagId, WorldModel};

/// How to pick the camera pose when several known tags pass the check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidatePolicy {
    /// Use the first accepted tag in detector order.
    #[default]
    FirstAccepted,
    /// Average all accepted candidates.
    Average,
}

/// What the localizer found in one frame.
#[derive(Debug, Clone, Default)]
pub struct Localization {
    /// Camera pose `T_world_cam`, if any candidate was accepted.
    pub pose: Option<SE3>,
    /// Observed tags present in the World Model.
    pub known: usize,
    /// Known tags that passed the check, in detector order. Under
    /// [`CandidatePolicy::FirstAccepted`] only the first one sets the pose.
    pub accepted: Vec<TagId>,
    pub rejected: Vec<TagId>,
    /// The frame needed a consistency check but no assumed pose was available.
    pub check_skipped: bool,
}

/// Stateless camera localizer.
#[derive(Debug, Clone, Default)]
pub struct Localizer {
    pub thresholds: ConsistencyThresholds,
    pub policy: CandidatePolicy,
}

impl Localizer {
    pub fn new(thresholds: ConsistencyThresholds, policy: CandidatePolicy) -> Self {
        Self { thresholds, policy }
    }

    /// Locate the camera in `frame`.
    ///
    /// `assumed_pose` is the camera pose the consistency check re-surveys
    /// tags through, normally the previous frame's tracked pose.
    pub fn localize(
        &self,
        frame: &Frame,
        world: &WorldModel,
        assumed_pose: Option<&SE3>,
    ) -> Localization {
        let needs_check = frame.len() >= 2;
        let mut result = Localization::default();
        let mut candidates = Vec::new();

        for observation in &frame.observations {
            let Some(tag_pose) = world.get(observation.tag) else {
                continue;
            };
            result.known += 1;

            if needs_check {
                match assumed_pose {
                    Some(assumed) => {
                        let passed = self
                            .thresholds
                            .check_tag(observation, assumed, world)
                            .is_some_and(|check| check.accepted);
                        if !passed {
                            result.rejected.push(observation.tag);
                            continue;
                        }
                    }
                    None => result.check_skipped = true,
                }
            }

            let candidate = tag_pose.compose(&observation.transform.inverse());
            debug!(
                "{} accepted, camera at [{:.3}, {:.3}, {:.3}]",
                observation.tag, candidate.translation.x, candidate.translation.y, candidate.translation.z
            );
            result.accepted.push(observation.tag);
            candidates.push(candidate);
        }

        result.pose = match self.policy {
            CandidatePolicy::FirstAccepted => candidates.first().copied(),
            CandidatePolicy::Average if candidates.len() > 1 => mean_pose(&candidates)
                .map(|mean| mean.pose)
                .ok()
                .or_else(|| candidates.first().copied()),
            CandidatePolicy::Average => candidates.first().copied(),
        };

        result
    }
}
