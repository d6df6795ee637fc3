//! Best-effort publication of poses.
//!
//! Publication never blocks the tracking loop. Every frame republishes the
//! full state, so a dropped message is repaired on the next frame.

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use tracing::trace;

use super::messages::Broadcast;

/// Sink for published poses.
pub trait Broadcaster {
    fn send(&mut self, message: Broadcast);
}

/// Records every message; handy for tests and offline runs.
impl Broadcaster for Vec<Broadcast> {
    fn send(&mut self, message: Broadcast) {
        self.push(message);
    }
}

/// Publishes into a bounded channel with `try_send`.
pub struct ChannelBroadcaster {
    sender: Sender<Broadcast>,
    dropped: u64,
}

impl ChannelBroadcaster {
    /// Create a broadcaster and the receiving end for the consumer.
    pub fn bounded(capacity: usize) -> (Self, Receiver<Broadcast>) {
        let (sender, receiver) = bounded(capacity);
        (Self { sender, dropped: 0 }, receiver)
    }

    /// Messages lost because the channel was full or disconnected.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl Broadcaster for ChannelBroadcaster {
    fn send(&mut self, message: Broadcast) {
        match self.sender.try_send(message) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                self.dropped += 1;
                trace!("broadcast channel full, message dropped");
            }
            Err(TrySendError::Disconnected(_)) => {
                self.dropped += 1;
                trace!("broadcast consumer gone, message dropped");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::SE3;

    #[test]
    fn test_full_channel_drops_without_blocking() {
        let (mut broadcaster, receiver) = ChannelBroadcaster::bounded(2);
        for _ in 0..5 {
            broadcaster.send(Broadcast::CameraPose { pose: SE3::identity() });
        }

        assert_eq!(broadcaster.dropped(), 3);
        assert_eq!(receiver.try_iter().count(), 2);
    }

    #[test]
    fn test_disconnected_consumer_is_tolerated() {
        let (mut broadcaster, receiver) = ChannelBroadcaster::bounded(2);
        drop(receiver);
        broadcaster.send(Broadcast::CameraPose { pose: SE3::identity() });
        assert_eq!(broadcaster.dropped(), 1);
    }
}
