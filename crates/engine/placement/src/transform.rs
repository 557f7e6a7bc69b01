//! Rigid placement transform (position + orientation)

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Position and orientation in meters, right-handed.
///
/// Produced fresh by every hit test; once stored in a placement snapshot it
/// is only ever replaced, never edited in place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub orientation: Quat,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        orientation: Quat::IDENTITY,
    };

    pub fn new(position: Vec3, orientation: Quat) -> Self {
        Self {
            position,
            orientation: orientation.normalize(),
        }
    }

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            orientation: Quat::IDENTITY,
        }
    }

    /// Split a matrix into position and orientation, discarding scale
    pub fn from_mat4(matrix: &Mat4) -> Self {
        let (_scale, orientation, position) = matrix.to_scale_rotation_translation();
        Self::new(position, orientation)
    }

    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.orientation, self.position)
    }

    /// Map a point from this transform's local space into its parent space
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.position + self.orientation * point
    }

    /// Map a point from parent space into this transform's local space
    pub fn inverse_transform_point(&self, point: Vec3) -> Vec3 {
        self.orientation.inverse() * (point - self.position)
    }

    /// Local +Y axis expressed in parent space
    pub fn up(&self) -> Vec3 {
        self.orientation * Vec3::Y
    }

    /// Local -Z axis expressed in parent space (camera forward)
    pub fn forward(&self) -> Vec3 {
        self.orientation * Vec3::NEG_Z
    }

    pub fn abs_diff_eq(&self, other: &Self, max_abs_diff: f32) -> bool {
        self.position.abs_diff_eq(other.position, max_abs_diff)
            && self.orientation.abs_diff_eq(other.orientation, max_abs_diff)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matrix_round_trip_drops_scale() {
        let orientation = Quat::from_rotation_y(0.7);
        let matrix = Mat4::from_scale_rotation_translation(
            Vec3::splat(3.0),
            orientation,
            Vec3::new(1.0, 2.0, 3.0),
        );

        let transform = Transform::from_mat4(&matrix);
        assert!(transform.position.abs_diff_eq(Vec3::new(1.0, 2.0, 3.0), 1e-5));
        assert!(transform.orientation.abs_diff_eq(orientation, 1e-5));
    }

    #[test]
    fn test_point_mapping_is_inverse() {
        let transform = Transform::new(Vec3::new(0.5, 0.0, -2.0), Quat::from_rotation_x(0.3));
        let point = Vec3::new(0.1, 0.2, 0.3);
        let back = transform.inverse_transform_point(transform.transform_point(point));
        assert!(back.abs_diff_eq(point, 1e-5));
    }

    #[test]
    fn test_axes() {
        let transform = Transform::IDENTITY;
        assert_eq!(transform.up(), Vec3::Y);
        assert_eq!(transform.forward(), Vec3::NEG_Z);
    }
}
