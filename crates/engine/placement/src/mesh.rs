//! Loaded model geometry and its axis-aligned bounds
//!
//! A [`Mesh`] is immutable once loaded. It is shared between anchored
//! objects behind an `Arc`; every placement of the same asset composes its
//! own transform at render time instead of copying geometry.

use glam::{Mat4, Vec3};

/// Axis-Aligned Bounding Box
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl Aabb {
    /// Create a new AABB from min and max corners
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Smallest box containing every finite point, or `None` if there are none
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Vec3>,
    {
        let mut points = points.into_iter().filter(|p| p.is_finite());
        let first = points.next()?;
        let mut aabb = Self::new(first, first);
        for point in points {
            aabb.include(point);
        }
        Some(aabb)
    }

    /// Grow the box so it contains `point`
    pub fn include(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// Calculate the center point of the AABB
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Calculate the size (extents) of the AABB
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Longest edge of the box
    pub fn max_extent(&self) -> f32 {
        self.size().max_element()
    }
}

/// One drawable piece of a model with its node transform baked in
#[derive(Debug, Clone, PartialEq)]
pub struct MeshPrimitive {
    /// Vertex positions in the primitive's local space
    pub positions: Vec<Vec3>,
    /// Triangle indices (empty for non-indexed geometry)
    pub indices: Vec<u32>,
    /// Local-to-model matrix accumulated from the scene hierarchy
    pub transform: Mat4,
}

impl MeshPrimitive {
    pub fn new(positions: Vec<Vec3>) -> Self {
        Self {
            positions,
            indices: Vec::new(),
            transform: Mat4::IDENTITY,
        }
    }

    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_indices(mut self, indices: Vec<u32>) -> Self {
        self.indices = indices;
        self
    }

    /// Vertex positions in model space
    pub fn model_positions(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.positions
            .iter()
            .map(move |p| self.transform.transform_point3(*p))
    }
}

/// A loaded model: every primitive of its default scene
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Mesh {
    pub name: String,
    pub primitives: Vec<MeshPrimitive>,
}

impl Mesh {
    pub fn new(name: impl Into<String>, primitives: Vec<MeshPrimitive>) -> Self {
        Self {
            name: name.into(),
            primitives,
        }
    }

    /// Single-primitive mesh, convenient for procedural geometry
    pub fn from_positions(name: impl Into<String>, positions: Vec<Vec3>) -> Self {
        Self::new(name, vec![MeshPrimitive::new(positions)])
    }

    pub fn vertex_count(&self) -> usize {
        self.primitives.iter().map(|p| p.positions.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.vertex_count() == 0
    }

    /// Bounds over all geometry in model space, `None` for an empty mesh
    pub fn bounding_box(&self) -> Option<Aabb> {
        Aabb::from_points(self.primitives.iter().flat_map(|p| p.model_positions()))
    }
}
