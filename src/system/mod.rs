//! System orchestration.
//!
//! This module contains the top-level `TagSlamSystem` context object, the
//! run mode it is created in, and the broadcast messages it publishes.

pub mod broadcast;
pub mod messages;
pub mod mode;
mod slam_system;

pub use broadcast::{Broadcaster, ChannelBroadcaster};
pub use messages::Broadcast;
pub use mode::RunMode;
pub use slam_system::TagSlamSystem;
