//! Geometry utilities: SE3 transforms and pose averaging.

pub mod mean;
pub mod se3;

pub use mean::{PoseMean, mean_pose};
pub use se3::{SE3, UNIT_NORM_TOLERANCE};
