//! Accumulation of world-pose samples for tags not yet in the World Model.
//!
//! Each pending tag owns one slot holding its samples. The number of slots is
//! bounded: a sample for a new tag while every slot is busy is dropped and
//! reported as [`SlotExhausted`]. Once a slot reaches the configured sample
//! count it is averaged, freed, and handed back for commit.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::SlotExhausted;
use crate::geometry::{PoseMean, SE3, mean_pose};
use crate::world::TagId;

/// What happened to a sample added to the buffer.
#[derive(Debug, Clone, Copy)]
pub enum SampleOutcome {
    /// Stored; the tag's slot now holds `count` samples.
    Pending { tag: TagId, count: usize },
    /// The slot filled up and was freed; `mean` is ready to commit.
    Ready { tag: TagId, mean: PoseMean },
    /// The slot filled up but its samples could not be averaged; the slot was
    /// freed and accumulation starts over on the next sample.
    Discarded { tag: TagId },
}

/// Bounded set of per-tag sample slots.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    slots: BTreeMap<TagId, Vec<SE3>>,
    max_slots: usize,
    samples_per_tag: usize,
}

impl SampleBuffer {
    pub fn new(max_slots: usize, samples_per_tag: usize) -> Self {
        Self {
            slots: BTreeMap::new(),
            max_slots,
            samples_per_tag,
        }
    }

    /// Route a world-pose sample for `tag` to its slot, opening one if needed.
    pub fn add(&mut self, tag: TagId, pose: SE3) -> Result<SampleOutcome, SlotExhausted> {
        if !self.slots.contains_key(&tag) && self.slots.len() >= self.max_slots {
            return Err(SlotExhausted {
                tag,
                pending: self.slots.keys().copied().collect(),
            });
        }

        let samples = self.slots.entry(tag).or_default();
        samples.push(pose);
        let count = samples.len();
        debug!("{} sample {}/{}", tag, count, self.samples_per_tag);

        if count < self.samples_per_tag {
            return Ok(SampleOutcome::Pending { tag, count });
        }

        let samples = self.slots.remove(&tag).unwrap_or_default();
        Ok(match mean_pose(&samples) {
            Ok(mean) => SampleOutcome::Ready { tag, mean },
            Err(_) => SampleOutcome::Discarded { tag },
        })
    }

    /// Number of samples collected so far for `tag`.
    pub fn count(&self, tag: TagId) -> usize {
        self.slots.get(&tag).map_or(0, Vec::len)
    }

    pub fn is_pending(&self, tag: TagId) -> bool {
        self.slots.contains_key(&tag)
    }

    /// Tags currently owning a slot.
    pub fn pending(&self) -> impl Iterator<Item = TagId> + '_ {
        self.slots.keys().copied()
    }

    pub fn busy_slots(&self) -> usize {
        self.slots.len()
    }

    pub fn max_slots(&self) -> usize {
        self.max_slots
    }

    pub fn samples_per_tag(&self) -> usize {
        self.samples_per_tag
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    #[test]
    fn test_commit_after_threshold_frees_slot() {
        let mut buffer = SampleBuffer::new(3, 15);
        let tag = TagId::new(5);

        for i in 0..14 {
            let outcome = buffer.add(tag, SE3::from_translation(1.0, 0.0, 0.0)).unwrap();
            assert!(matches!(outcome, SampleOutcome::Pending { count, .. } if count == i + 1));
        }
        assert_eq!(buffer.count(tag), 14);

        let outcome = buffer.add(tag, SE3::from_translation(1.0, 0.0, 0.0)).unwrap();
        match outcome {
            SampleOutcome::Ready { tag: ready, mean } => {
                assert_eq!(ready, tag);
                assert_relative_eq!(mean.pose.translation, Vector3::new(1.0, 0.0, 0.0), epsilon = 1e-12);
            }
            other => panic!("expected Ready, got {:?}", other),
        }
        assert!(!buffer.is_pending(tag));
        assert_eq!(buffer.busy_slots(), 0);
    }

    #[test]
    fn test_mean_of_noisy_samples() {
        let mut buffer = SampleBuffer::new(1, 4);
        let tag = TagId::new(1);
        let xs = [0.9, 1.1, 1.0, 1.0];

        let mut last = None;
        for x in xs {
            last = Some(buffer.add(tag, SE3::from_translation(x, 2.0, 0.0)).unwrap());
        }
        match last {
            Some(SampleOutcome::Ready { mean, .. }) => {
                assert_relative_eq!(mean.pose.translation, Vector3::new(1.0, 2.0, 0.0), epsilon = 1e-12);
            }
            other => panic!("expected Ready, got {:?}", other),
        }
    }

    #[test]
    fn test_new_tag_dropped_when_all_slots_busy() {
        let mut buffer = SampleBuffer::new(3, 15);
        for id in 1..=3 {
            buffer.add(TagId::new(id), SE3::identity()).unwrap();
        }

        let err = buffer.add(TagId::new(4), SE3::identity()).unwrap_err();
        assert_eq!(err.tag, TagId::new(4));
        assert_eq!(err.pending.len(), 3);
        assert!(!buffer.is_pending(TagId::new(4)));

        // Tags that already own a slot keep accumulating.
        let outcome = buffer.add(TagId::new(2), SE3::identity()).unwrap();
        assert!(matches!(outcome, SampleOutcome::Pending { count: 2, .. }));
    }

    #[test]
    fn test_slot_reused_after_commit() {
        let mut buffer = SampleBuffer::new(1, 2);
        buffer.add(TagId::new(1), SE3::identity()).unwrap();
        assert!(buffer.add(TagId::new(2), SE3::identity()).is_err());

        let outcome = buffer.add(TagId::new(1), SE3::identity()).unwrap();
        assert!(matches!(outcome, SampleOutcome::Ready { .. }));

        let outcome = buffer.add(TagId::new(2), SE3::identity()).unwrap();
        assert!(matches!(outcome, SampleOutcome::Pending { count: 1, .. }));
    }
}
