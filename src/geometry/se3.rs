//! SE3: rigid transformation (unit-quaternion rotation + translation).
//!
//! Poses follow the `T_target_source` naming used throughout the crate: the
//! world→tag pose of a tag is `T_world_tag`, a detector observation is
//! `T_cam_tag`, and the tracked camera pose is `T_world_cam`.
//!
//! Composition goes through the homogeneous 4x4 matrix product and the
//! resulting rotation is renormalized on every composition and inversion so
//! that long chains (anchor → camera → new tag → camera → ...) do not drift
//! away from the unit sphere.

use nalgebra::{Matrix3, Matrix4, Quaternion, Rotation3, UnitQuaternion, Vector3};

use crate::error::GeometryError;

/// Maximum deviation of `|q|` from 1 accepted when building a transform from
/// raw components.
pub const UNIT_NORM_TOLERANCE: f64 = 1e-3;

/// 6-DOF rigid transformation.
///
/// Transforms points as: p' = R * p + t
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SE3 {
    pub rotation: UnitQuaternion<f64>,
    pub translation: Vector3<f64>,
}

impl SE3 {
    /// Identity transformation.
    pub fn identity() -> Self {
        Self {
            rotation: UnitQuaternion::identity(),
            translation: Vector3::zeros(),
        }
    }

    pub fn new(translation: Vector3<f64>, rotation: UnitQuaternion<f64>) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    /// Pure translation.
    pub fn from_translation(x: f64, y: f64, z: f64) -> Self {
        Self::new(Vector3::new(x, y, z), UnitQuaternion::identity())
    }

    /// Build from raw components, rotation given as `[x, y, z, w]`.
    ///
    /// The quaternion must already be unit-norm within [`UNIT_NORM_TOLERANCE`];
    /// it is renormalized afterwards to remove the residual.
    pub fn try_from_parts(translation: [f64; 3], rotation: [f64; 4]) -> Result<Self, GeometryError> {
        if translation.iter().chain(rotation.iter()).any(|v| !v.is_finite()) {
            return Err(GeometryError::NonFinite);
        }

        let [qx, qy, qz, qw] = rotation;
        let q = Quaternion::new(qw, qx, qy, qz);
        let norm = q.norm();
        if (norm - 1.0).abs() > UNIT_NORM_TOLERANCE {
            return Err(GeometryError::InvalidTransform { norm });
        }

        Ok(Self {
            rotation: UnitQuaternion::from_quaternion(q),
            translation: Vector3::from(translation),
        })
    }

    /// Construct from a homogeneous 4x4 matrix `[R | t; 0 | 1]`.
    pub fn from_matrix(mat: Matrix4<f64>) -> Self {
        let r: Matrix3<f64> = mat.fixed_view::<3, 3>(0, 0).into_owned();
        let translation = Vector3::new(mat[(0, 3)], mat[(1, 3)], mat[(2, 3)]);
        let rot3 = Rotation3::from_matrix_unchecked(r);

        let mut rotation = UnitQuaternion::from_rotation_matrix(&rot3);
        rotation.renormalize();

        Self {
            rotation,
            translation,
        }
    }

    /// Convert to homogeneous 4x4 matrix `[R | t; 0 0 0 1]`.
    pub fn to_matrix(&self) -> Matrix4<f64> {
        let mut mat = Matrix4::identity();
        mat.fixed_view_mut::<3, 3>(0, 0)
            .copy_from(self.rotation.to_rotation_matrix().matrix());
        mat.fixed_view_mut::<3, 1>(0, 3).copy_from(&self.translation);
        mat
    }

    /// Compose two transforms: `self ∘ other`.
    ///
    /// With `self = T_a_b` and `other = T_b_c` the result is `T_a_c`, i.e.
    /// `other` applied in `self`'s frame.
    pub fn compose(&self, other: &SE3) -> Self {
        Self::from_matrix(self.to_matrix() * other.to_matrix())
    }

    /// Rigid inverse: `[R^T | -R^T t]`.
    pub fn inverse(&self) -> Self {
        let mut rotation = self.rotation.inverse();
        rotation.renormalize();
        Self {
            translation: -(rotation * self.translation),
            rotation,
        }
    }

    /// Transform a single point: p' = R * p + t.
    pub fn transform_point(&self, p: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * p + self.translation
    }

    /// Rotation as static-axis (x, y, z) Euler angles `(roll, pitch, yaw)`.
    pub fn euler_angles(&self) -> Vector3<f64> {
        let (roll, pitch, yaw) = self.rotation.euler_angles();
        Vector3::new(roll, pitch, yaw)
    }

    /// Translation as `[x, y, z]`.
    pub fn translation_array(&self) -> [f64; 3] {
        [self.translation.x, self.translation.y, self.translation.z]
    }

    /// Rotation as `[x, y, z, w]`.
    pub fn rotation_array(&self) -> [f64; 4] {
        let q = self.rotation.quaternion();
        [q.i, q.j, q.k, q.w]
    }
}

impl Default for SE3 {
    fn default() -> Self {
        Self::identity()
    }
}
