//! Runtime configuration.
//!
//! Every field has a default, so an empty YAML document (or no document at
//! all) yields the stock behaviour:
//!
//! ```yaml
//! registration_samples: 15
//! max_pending_tags: 3
//! pose_window: 20
//! consistency:
//!   max_translation: 0.10
//!   max_rotation: 0.261799
//! candidate_policy: first_accepted   # or: average
//! publish_partial_window: false
//! rotation_spread_tolerance: 0.35
//! broadcast_capacity: 64
//! ```

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

use crate::tracking::{CandidatePolicy, ConsistencyThresholds};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagSlamConfig {
    /// Samples averaged before a new tag is committed to the World Model.
    pub registration_samples: usize,
    /// Tags that may accumulate samples at the same time.
    pub max_pending_tags: usize,
    /// Camera poses averaged for publication.
    pub pose_window: usize,
    pub consistency: ConsistencyThresholds,
    pub candidate_policy: CandidatePolicy,
    /// Publish the mean of a window that has not filled yet.
    pub publish_partial_window: bool,
    /// Rotation spread (rad) above which a quaternion mean is reported as
    /// unreliable.
    pub rotation_spread_tolerance: f64,
    /// Messages buffered between the tracker and its broadcast consumer.
    pub broadcast_capacity: usize,
}

impl Default for TagSlamConfig {
    fn default() -> Self {
        Self {
            registration_samples: 15,
            max_pending_tags: 3,
            pose_window: 20,
            consistency: ConsistencyThresholds::default(),
            candidate_policy: CandidatePolicy::FirstAccepted,
            publish_partial_window: false,
            rotation_spread_tolerance: 0.35,
            broadcast_capacity: 64,
        }
    }
}

impl TagSlamConfig {
    /// Load and validate a YAML config file.
    pub fn load_yaml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
        let config: Self = serde_yaml::from_reader(file)
            .with_context(|| format!("Failed to parse config {:?}", path))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.registration_samples > 0, "registration_samples must be positive");
        ensure!(self.max_pending_tags > 0, "max_pending_tags must be positive");
        ensure!(self.pose_window > 0, "pose_window must be positive");
        ensure!(self.broadcast_capacity > 0, "broadcast_capacity must be positive");
        ensure!(
            self.consistency.max_translation > 0.0,
            "consistency.max_translation must be positive"
        );
        ensure!(
            self.consistency.max_rotation > 0.0,
            "consistency.max_rotation must be positive"
        );
        ensure!(
            self.rotation_spread_tolerance > 0.0,
            "rotation_spread_tolerance must be positive"
        );
        Ok(())
    }
}
