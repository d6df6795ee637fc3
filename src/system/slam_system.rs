//! Tag SLAM system - per-frame orchestration.
//!
//! The `TagSlamSystem` is the top-level struct that users interact with. It
//! owns the World Model, the tracking state, the sample buffer and the pose
//! window, and runs every frame to completion before returning:
//!
//! 1. anchor the world on the first tag ever seen (SETUP, empty map)
//! 2. localize the camera from known tags
//! 3. register unknown tags through the tracked camera (SETUP)
//! 4. publish the smoothed camera pose and every mapped tag

use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::config::TagSlamConfig;
use crate::error::WorldModelError;
use crate::geometry::SE3;
use crate::smoothing::{PoseWindow, SampleBuffer, SampleOutcome};
use crate::tracking::{Frame, Localizer, TrackingMetrics, TrackingResult, TrackingState};
use crate::world::WorldModel;

use super::broadcast::Broadcaster;
use super::messages::Broadcast;
use super::mode::RunMode;

/// Context object for one mapping / localization run.
pub struct TagSlamSystem<B: Broadcaster> {
    mode: RunMode,
    config: TagSlamConfig,

    world: WorldModel,
    state: TrackingState,
    localizer: Localizer,
    samples: SampleBuffer,
    window: PoseWindow,

    broadcaster: B,

    /// Where SETUP runs persist the map on shutdown.
    map_path: Option<PathBuf>,
    shut_down: bool,
    frame_count: u64,
}

impl<B: Broadcaster> TagSlamSystem<B> {
    /// Create a SETUP run with an empty World Model.
    pub fn setup(config: TagSlamConfig, broadcaster: B) -> Self {
        Self::new(RunMode::Setup, config, WorldModel::new(), broadcaster)
    }

    /// Create a NAVIGATION run over a pre-learned map.
    ///
    /// The map is frozen: nothing processed afterwards can change it.
    pub fn navigation(config: TagSlamConfig, world: WorldModel, broadcaster: B) -> Self {
        Self::new(RunMode::Navigation, config, world, broadcaster)
    }

    fn new(mode: RunMode, config: TagSlamConfig, mut world: WorldModel, broadcaster: B) -> Self {
        if !mode.registers_tags() {
            world.set_read_only();
        }
        info!("{} mode, {} tags in map", mode, world.len());

        Self {
            mode,
            localizer: Localizer::new(config.consistency, config.candidate_policy),
            samples: SampleBuffer::new(config.max_pending_tags, config.registration_samples),
            window: PoseWindow::new(config.pose_window, config.publish_partial_window),
            config,
            world,
            state: TrackingState::new(),
            broadcaster,
            map_path: None,
            shut_down: false,
            frame_count: 0,
        }
    }

    /// Set the file the map is written to when a SETUP run shuts down.
    pub fn with_map_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.map_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Process one frame of observations.
    ///
    /// Never fails: anything that goes wrong inside a frame leaves the
    /// camera untracked for that frame and is logged.
    pub fn process_frame(&mut self, frame: &Frame) -> TrackingResult {
        self.frame_count += 1;
        // Only a pose tracked in the previous frame is trusted as reference.
        let previous = self.state.tracked_pose().copied();
        self.state.begin_frame();

        let mut metrics = TrackingMetrics {
            n_observations: frame.len(),
            ..TrackingMetrics::default()
        };

        if self.needs_anchor() {
            if let Some(first) = frame.observations.first() {
                match self.world.insert_anchor(first.tag) {
                    Ok(()) => {
                        self.state.anchor = Some(first.tag);
                        metrics.anchored = Some(first.tag);
                    }
                    Err(e) => error!("Failed to anchor world on {}: {}", first.tag, e),
                }
                // The anchoring frame only fixes the origin; tracking starts
                // with the next frame.
                self.broadcast_world();
                return self.result(None, metrics);
            }
        }

        let assumed = previous.or(frame.camera_estimate);
        let localization = self.localizer.localize(frame, &self.world, assumed.as_ref());
        metrics.n_known = localization.known;
        metrics.accepted = localization.accepted;
        metrics.rejected = localization.rejected;
        metrics.consistency_skipped = localization.check_skipped;
        if localization.check_skipped {
            debug!("No camera estimate available, consistency check skipped");
        }

        if let Some(pose) = localization.pose {
            self.state.set_tracked(pose);
        }

        if let Some(camera_pose) = self.state.tracked_pose().copied() {
            if self.mode.registers_tags() && self.state.anchor.is_some() {
                self.register_unknown_tags(frame, &camera_pose, &mut metrics);
            }
        }

        let published = self.publish_camera_pose();
        self.broadcast_world();

        self.result(published, metrics)
    }

    /// Feed world-pose samples of tags not yet mapped into the sample buffer,
    /// committing any tag whose slot fills up.
    fn register_unknown_tags(
        &mut self,
        frame: &Frame,
        camera_pose: &SE3,
        metrics: &mut TrackingMetrics,
    ) {
        for observation in &frame.observations {
            if self.world.contains(observation.tag) {
                continue;
            }

            let sample = camera_pose.compose(&observation.transform);
            match self.samples.add(observation.tag, sample) {
                Ok(SampleOutcome::Pending { .. }) => {
                    metrics.n_registration_samples += 1;
                }
                Ok(SampleOutcome::Ready { tag, mean }) => {
                    metrics.n_registration_samples += 1;
                    if mean.rotation_spread > self.config.rotation_spread_tolerance {
                        warn!(
                            "{} rotation samples spread {:.3} rad (tolerance {:.3}), mean may be unreliable",
                            tag, mean.rotation_spread, self.config.rotation_spread_tolerance
                        );
                    }
                    match self.world.put(tag, mean.pose) {
                        Ok(_) => {
                            info!(
                                "{} registered at [{:.3}, {:.3}, {:.3}]",
                                tag,
                                mean.pose.translation.x,
                                mean.pose.translation.y,
                                mean.pose.translation.z
                            );
                            metrics.committed.push(tag);
                        }
                        Err(e) => error!("Failed to commit {}: {}", tag, e),
                    }
                }
                Ok(SampleOutcome::Discarded { tag }) => {
                    metrics.n_registration_samples += 1;
                    warn!("{} samples could not be averaged, restarting accumulation", tag);
                }
                Err(exhausted) => {
                    warn!("{}", exhausted);
                    metrics.dropped.push(exhausted.tag);
                }
            }
        }
    }

    fn publish_camera_pose(&mut self) -> Option<SE3> {
        let pose = *self.state.tracked_pose()?;
        let mean = self.window.push(pose)?;
        self.broadcaster.send(Broadcast::CameraPose { pose: mean.pose });
        Some(mean.pose)
    }

    fn broadcast_world(&mut self) {
        for (tag, pose) in self.world.iter() {
            self.broadcaster.send(Broadcast::TagPose { tag, pose: *pose });
        }
    }

    fn needs_anchor(&self) -> bool {
        self.mode.registers_tags() && self.state.anchor.is_none() && self.world.is_empty()
    }

    fn result(&self, published_pose: Option<SE3>, metrics: TrackingMetrics) -> TrackingResult {
        TrackingResult {
            status: self.state.status(),
            pose: self.state.tracked_pose().copied(),
            published_pose,
            metrics,
        }
    }

    pub fn mode(&self) -> RunMode {
        self.mode
    }

    pub fn config(&self) -> &TagSlamConfig {
        &self.config
    }

    pub fn world(&self) -> &WorldModel {
        &self.world
    }

    pub fn tracking_state(&self) -> &TrackingState {
        &self.state
    }

    pub fn sample_buffer(&self) -> &SampleBuffer {
        &self.samples
    }

    pub fn pose_window(&self) -> &PoseWindow {
        &self.window
    }

    pub fn broadcaster(&self) -> &B {
        &self.broadcaster
    }

    pub fn broadcaster_mut(&mut self) -> &mut B {
        &mut self.broadcaster
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Shut the system down, persisting the map in SETUP mode.
    ///
    /// Only the first call does anything; it is also run on drop.
    pub fn shutdown(&mut self) -> Result<(), WorldModelError> {
        if self.shut_down {
            return Ok(());
        }
        self.shut_down = true;

        if !self.mode.persists_map() {
            return Ok(());
        }

        let pending: Vec<_> = self.samples.pending().collect();
        if !pending.is_empty() {
            warn!("Discarding incomplete samples for {:?}", pending);
        }

        match &self.map_path {
            Some(path) => self.world.save_file(path),
            None => {
                warn!("No map path configured, {} tags not persisted", self.world.len());
                Ok(())
            }
        }
    }
}

impl<B: Broadcaster> Drop for TagSlamSystem<B> {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            error!("Failed to persist map on shutdown: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::messages::Broadcast;
    use crate::tracking::{Observation, TrackingStatus};
    use crate::world::TagId;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    fn recorder() -> Vec<Broadcast> {
        Vec::new()
    }

    fn frame(observations: &[(u32, SE3)]) -> Frame {
        Frame::new(
            observations
                .iter()
                .map(|(id, t)| Observation::new(*id, *t))
                .collect(),
        )
    }

    #[test]
    fn test_anchor_frame_does_not_track() {
        let mut system = TagSlamSystem::setup(TagSlamConfig::default(), recorder());
        let result = system.process_frame(&frame(&[(7, SE3::from_translation(0.0, 0.0, 1.0))]));

        assert_eq!(result.status, TrackingStatus::NotInitialized);
        assert_eq!(result.metrics.anchored, Some(TagId::new(7)));
        assert_eq!(system.world().get(TagId::new(7)), Some(&SE3::identity()));
        assert_eq!(system.tracking_state().anchor, Some(TagId::new(7)));
    }

    #[test]
    fn test_empty_frame_does_not_anchor() {
        let mut system = TagSlamSystem::setup(TagSlamConfig::default(), recorder());
        let result = system.process_frame(&Frame::default());

        assert!(!result.is_tracking());
        assert!(system.world().is_empty());
        assert!(system.tracking_state().anchor.is_none());
    }

    #[test]
    fn test_registration_commits_after_fifteen_samples() {
        let mut system = TagSlamSystem::setup(TagSlamConfig::default(), recorder());
        system.process_frame(&frame(&[(1, SE3::identity())]));

        // Camera 1m behind tag 1, tag 2 one metre to the side of tag 1.
        let obs_1 = SE3::from_translation(0.0, 0.0, 1.0);
        let obs_2 = SE3::from_translation(1.0, 0.0, 1.0);

        for i in 0..14 {
            let result = system.process_frame(&frame(&[(1, obs_1), (2, obs_2)]));
            assert!(result.is_tracking());
            assert!(result.metrics.committed.is_empty());
            assert_eq!(system.sample_buffer().count(TagId::new(2)), i + 1);
        }

        let result = system.process_frame(&frame(&[(1, obs_1), (2, obs_2)]));
        assert_eq!(result.metrics.committed, vec![TagId::new(2)]);
        assert!(!system.sample_buffer().is_pending(TagId::new(2)));

        let tag_2 = system.world().get(TagId::new(2)).unwrap();
        assert_relative_eq!(tag_2.translation, Vector3::new(1.0, 0.0, 0.0), epsilon = 1e-9);
    }

    #[test]
    fn test_camera_pose_published_once_window_full() {
        let config = TagSlamConfig {
            pose_window: 3,
            ..TagSlamConfig::default()
        };
        let mut system = TagSlamSystem::setup(config, recorder());
        system.process_frame(&frame(&[(1, SE3::identity())]));

        let obs = SE3::from_translation(0.0, 0.0, 2.0);
        assert!(system.process_frame(&frame(&[(1, obs)])).published_pose.is_none());
        assert!(system.process_frame(&frame(&[(1, obs)])).published_pose.is_none());

        let published = system.process_frame(&frame(&[(1, obs)])).published_pose.unwrap();
        assert_relative_eq!(published.translation, Vector3::new(0.0, 0.0, -2.0), epsilon = 1e-9);

        let camera_msgs = system
            .broadcaster()
            .iter()
            .filter(|m| matches!(m, Broadcast::CameraPose { .. }))
            .count();
        assert_eq!(camera_msgs, 1);
    }

    #[test]
    fn test_world_rebroadcast_every_frame() {
        let mut system = TagSlamSystem::setup(TagSlamConfig::default(), recorder());
        system.process_frame(&frame(&[(1, SE3::identity())]));
        system.process_frame(&Frame::default());

        let tag_msgs = system
            .broadcaster()
            .iter()
            .filter(|m| matches!(m, Broadcast::TagPose { tag, .. } if *tag == TagId::new(1)))
            .count();
        assert_eq!(tag_msgs, 2);
    }

    #[test]
    fn test_shutdown_runs_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.yml");

        let mut system =
            TagSlamSystem::setup(TagSlamConfig::default(), recorder()).with_map_path(&path);
        system.process_frame(&frame(&[(3, SE3::identity())]));
        system.shutdown().unwrap();
        assert!(path.exists());

        std::fs::remove_file(&path).unwrap();
        system.shutdown().unwrap();
        drop(system);
        assert!(!path.exists());
    }

    #[test]
    fn test_drop_persists_setup_map() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.yml");
        {
            let mut system =
                TagSlamSystem::setup(TagSlamConfig::default(), recorder()).with_map_path(&path);
            system.process_frame(&frame(&[(3, SE3::identity())]));
        }

        let loaded = WorldModel::open_read_only(&path).unwrap();
        assert!(loaded.contains(TagId::new(3)));
    }
}
