//! Arithmetic averaging of pose samples.
//!
//! Translations are averaged component-wise. Rotations are averaged as raw
//! quaternion components after flipping every sample into the hemisphere of
//! the first one (q and -q are the same rotation), then renormalized.
//!
//! This is only a good approximation of the rotation mean when the samples
//! are tightly clustered. `PoseMean::rotation_spread` reports the largest
//! angle between any sample and the mean so callers can flag wide spreads.

use nalgebra::{Quaternion, UnitQuaternion, Vector3};

use super::SE3;
use crate::error::GeometryError;

/// Norm below which the summed quaternion is considered to have cancelled out.
const MIN_QUATERNION_SUM_NORM: f64 = 1e-9;

/// Result of averaging a set of pose samples.
#[derive(Debug, Clone, Copy)]
pub struct PoseMean {
    pub pose: SE3,
    /// Largest angle (rad) between any sample rotation and the mean rotation.
    pub rotation_spread: f64,
}

/// Average translations and rotations of `samples`.
pub fn mean_pose<'a, I>(samples: I) -> Result<PoseMean, GeometryError>
where
    I: IntoIterator<Item = &'a SE3>,
    I::IntoIter: Clone,
{
    let iter = samples.into_iter();

    let mut count = 0usize;
    let mut translation_sum = Vector3::zeros();
    let mut rotation_sum = Quaternion::new(0.0, 0.0, 0.0, 0.0);
    let mut reference: Option<Quaternion<f64>> = None;

    for sample in iter.clone() {
        let q = *sample.rotation.quaternion();
        let reference = *reference.get_or_insert(q);
        let aligned = if q.dot(&reference) < 0.0 { -q } else { q };

        translation_sum += sample.translation;
        rotation_sum += aligned;
        count += 1;
    }

    if count == 0 || rotation_sum.norm() < MIN_QUATERNION_SUM_NORM {
        return Err(GeometryError::DegenerateMean);
    }

    let rotation = UnitQuaternion::from_quaternion(rotation_sum);
    let translation = translation_sum / count as f64;

    let rotation_spread = iter
        .map(|s| s.rotation.angle_to(&rotation))
        .fold(0.0, f64::max);

    Ok(PoseMean {
        pose: SE3::new(translation, rotation),
        rotation_spread,
    })
}
