//! Sliding window over recent camera poses.
//!
//! The published camera pose is the mean of the last `capacity` tracked
//! poses. Nothing is published until the window first fills unless
//! `publish_partial` is set.

use std::collections::VecDeque;

use crate::geometry::{PoseMean, SE3, mean_pose};

/// Fixed-capacity FIFO of camera poses.
#[derive(Debug, Clone)]
pub struct PoseWindow {
    samples: VecDeque<SE3>,
    capacity: usize,
    publish_partial: bool,
}

impl PoseWindow {
    pub fn new(capacity: usize, publish_partial: bool) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity + 1),
            capacity,
            publish_partial,
        }
    }

    /// Add a pose, evicting the oldest once full, and return the mean to
    /// publish, if any.
    pub fn push(&mut self, pose: SE3) -> Option<PoseMean> {
        self.samples.push_back(pose);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }

        if self.is_full() || self.publish_partial {
            mean_pose(&self.samples).ok()
        } else {
            None
        }
    }

    pub fn is_full(&self) -> bool {
        self.samples.len() >= self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest pose still in the window.
    pub fn oldest(&self) -> Option<&SE3> {
        self.samples.front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_first_publication_on_twentieth_sample() {
        let mut window = PoseWindow::new(20, false);
        for i in 0..19 {
            assert!(window.push(SE3::from_translation(i as f64, 0.0, 0.0)).is_none());
        }

        let mean = window.push(SE3::from_translation(19.0, 0.0, 0.0)).unwrap();
        // mean of 0..=19
        assert_relative_eq!(mean.pose.translation.x, 9.5, epsilon = 1e-12);
    }

    #[test]
    fn test_twenty_first_sample_evicts_oldest() {
        let mut window = PoseWindow::new(20, false);
        for i in 0..20 {
            window.push(SE3::from_translation(i as f64, 0.0, 0.0));
        }

        let mean = window.push(SE3::from_translation(20.0, 0.0, 0.0)).unwrap();
        // mean of 1..=20
        assert_relative_eq!(mean.pose.translation.x, 10.5, epsilon = 1e-12);
        assert_eq!(window.len(), 20);
        assert_relative_eq!(window.oldest().unwrap().translation.x, 1.0);
    }

    #[test]
    fn test_partial_publication_when_enabled() {
        let mut window = PoseWindow::new(20, true);
        let mean = window.push(SE3::from_translation(2.0, 0.0, 0.0)).unwrap();
        assert_relative_eq!(mean.pose.translation.x, 2.0);

        let mean = window.push(SE3::from_translation(4.0, 0.0, 0.0)).unwrap();
        assert_relative_eq!(mean.pose.translation.x, 3.0);
    }
}
