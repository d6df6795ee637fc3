//! World module - the tag map.
//!
//! - [`TagId`] - identifier decoded from a fiducial
//! - [`WorldModel`] - tag id → world pose map, writable in SETUP and
//!   read-only in NAVIGATION
//! - [`document`] - YAML layout used to persist the map

pub mod document;
pub mod model;
pub mod types;

pub use document::{TagPoseRecord, WorldDocument};
pub use model::WorldModel;
pub use types::TagId;
