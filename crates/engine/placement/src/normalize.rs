//! Model normalization
//!
//! Imported models arrive in arbitrary units with arbitrary origins. The
//! normalizer derives a fixed pre-transform that moves the bounding-box
//! centroid to the origin and scales the longest edge to one unit, so every
//! model starts out at a usable size before the placement transform is
//! applied.

use crate::mesh::{Aabb, Mesh};
use glam::{Mat4, Vec3};
use tracing::debug;

/// Extents at or below this are treated as zero
pub const MIN_EXTENT: f32 = 1e-6;

/// Centering offset and uniform scale for one loaded mesh
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizationParams {
    /// Translation applied first; moves the centroid to the origin
    pub center_offset: Vec3,
    /// Scale applied after centering, always > 0
    pub uniform_scale: f32,
}

impl NormalizationParams {
    pub const IDENTITY: Self = Self {
        center_offset: Vec3::ZERO,
        uniform_scale: 1.0,
    };

    /// Derive parameters from a bounding box (`None` = no geometry)
    pub fn from_bounds(bounds: Option<Aabb>) -> Self {
        let Some(bounds) = bounds else {
            return Self::IDENTITY;
        };

        if !has_extent(&bounds) {
            return Self::IDENTITY;
        }

        Self {
            center_offset: -bounds.center(),
            uniform_scale: 1.0 / bounds.max_extent(),
        }
    }

    /// `scale * (p + offset)` as a matrix
    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_scale(Vec3::splat(self.uniform_scale))
            * Mat4::from_translation(self.center_offset)
    }

    pub fn apply(&self, point: Vec3) -> Vec3 {
        (point + self.center_offset) * self.uniform_scale
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

impl Default for NormalizationParams {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Compute normalization parameters for a mesh without modifying it.
///
/// A mesh with no geometry, or with zero extent on every axis, gets the
/// identity parameters.
pub fn normalize(mesh: &Mesh) -> NormalizationParams {
    let bounds = mesh.bounding_box();
    let params = NormalizationParams::from_bounds(bounds);

    match bounds {
        Some(bounds) if has_extent(&bounds) => debug!(
            mesh = %mesh.name,
            size = ?bounds.size(),
            center = ?bounds.center(),
            scale = params.uniform_scale,
            "normalized mesh"
        ),
        _ => debug!(mesh = %mesh.name, "degenerate mesh, using identity normalization"),
    }

    params
}

/// Whether the box is large enough to scale against
fn has_extent(bounds: &Aabb) -> bool {
    let longest = bounds.max_extent();
    longest.is_finite() && longest > MIN_EXTENT
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::MeshPrimitive;

    fn box_mesh(min: Vec3, max: Vec3) -> Mesh {
        Mesh::from_positions("box", vec![min, max, (min + max) * 0.5])
    }

    #[test]
    fn test_reference_box() {
        let mesh = box_mesh(Vec3::new(-2.0, 0.0, -1.0), Vec3::new(4.0, 2.0, 3.0));
        let params = normalize(&mesh);

        assert!(params.center_offset.abs_diff_eq(Vec3::new(-1.0, -1.0, -1.0), 1e-6));
        assert!((params.uniform_scale - 1.0 / 6.0).abs() < 1e-6);
    }

    #[test]
    fn test_normalized_bounds_are_unit_and_centered() {
        let cases = [
            (Vec3::new(-2.0, 0.0, -1.0), Vec3::new(4.0, 2.0, 3.0)),
            (Vec3::new(100.0, 200.0, 300.0), Vec3::new(100.5, 201.0, 300.25)),
            (Vec3::new(-0.001, -0.002, 0.0), Vec3::new(0.001, 0.0, 0.003)),
            // Flat on one axis still normalizes
            (Vec3::new(0.0, 5.0, 0.0), Vec3::new(2.0, 5.0, 8.0)),
        ];

        for (min, max) in cases {
            let mesh = box_mesh(min, max);
            let params = normalize(&mesh);

            let scaled = Aabb::from_points(
                mesh.primitives[0].positions.iter().map(|p| params.apply(*p)),
            )
            .unwrap();

            assert!(
                (scaled.max_extent() - 1.0).abs() < 1e-4,
                "longest edge for {min:?}..{max:?} was {}",
                scaled.max_extent()
            );
            assert!(
                scaled.center().abs_diff_eq(Vec3::ZERO, 1e-4),
                "centroid for {min:?}..{max:?} was {:?}",
                scaled.center()
            );
        }
    }

    #[test]
    fn test_matrix_matches_apply() {
        let params = NormalizationParams {
            center_offset: Vec3::new(-1.0, 2.0, 0.5),
            uniform_scale: 0.25,
        };
        let point = Vec3::new(3.0, -1.0, 7.0);
        assert!(params
            .to_mat4()
            .transform_point3(point)
            .abs_diff_eq(params.apply(point), 1e-6));
    }

    #[test]
    fn test_zero_extent_mesh_uses_identity() {
        let mesh = Mesh::from_positions("point", vec![Vec3::new(3.0, 3.0, 3.0); 4]);
        let params = normalize(&mesh);
        assert_eq!(params.uniform_scale, 1.0);
        assert_eq!(params.center_offset, Vec3::ZERO);
    }

    #[test]
    fn test_unit_cube_at_origin_is_not_degenerate() {
        let mesh = box_mesh(Vec3::splat(-0.5), Vec3::splat(0.5));
        let bounds = mesh.bounding_box().unwrap();

        assert!(has_extent(&bounds));
        assert!(normalize(&mesh).is_identity());
    }

    #[test]
    fn test_extent_threshold() {
        let point = Aabb::from_points([Vec3::ONE]).unwrap();
        assert!(!has_extent(&point));

        let sliver = Aabb::from_points([Vec3::ZERO, Vec3::new(MIN_EXTENT * 0.5, 0.0, 0.0)]).unwrap();
        assert!(!has_extent(&sliver));

        let unbounded = Aabb::new(Vec3::ZERO, Vec3::new(f32::INFINITY, 1.0, 1.0));
        assert!(!has_extent(&unbounded));
    }

    #[test]
    fn test_empty_mesh_uses_identity() {
        let mesh = Mesh::new("nothing", vec![MeshPrimitive::new(Vec::new())]);
        assert_eq!(normalize(&mesh), NormalizationParams::IDENTITY);
    }

    #[test]
    fn test_normalize_does_not_touch_source() {
        let mesh = box_mesh(Vec3::splat(-3.0), Vec3::splat(5.0));
        let before = mesh.clone();
        let _ = normalize(&mesh);
        assert_eq!(mesh, before);
    }
}
