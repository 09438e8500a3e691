/// Bounding volumes and the Boundable capability.
///
/// Any spatial entity (actor sub-mesh, light, particle system, static
/// geometry piece) becomes trackable by the octree by exposing an AABB
/// and a centre point. The octree only ever reads these values.

use glam::{Mat4, Vec3};

/// Axis-aligned bounding box in world space.
///
/// Invariant: `min <= max` componentwise (see `is_valid`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AABB {
    /// Minimum corner (x, y, z)
    pub min: Vec3,
    /// Maximum corner (x, y, z)
    pub max: Vec3,
}

impl AABB {
    /// Create an AABB from its corners.
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create a cube-shaped AABB from a centre point and an edge width.
    pub fn cube(centre: Vec3, width: f32) -> Self {
        let half = Vec3::splat(width * 0.5);
        Self {
            min: centre - half,
            max: centre + half,
        }
    }

    /// Centre point of the box.
    pub fn centre(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Extent along each axis.
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// `true` if `min <= max` on every axis.
    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
    }

    /// Test if this AABB fully contains another.
    pub fn contains(&self, other: &AABB) -> bool {
        self.min.x <= other.min.x && self.max.x >= other.max.x
        && self.min.y <= other.min.y && self.max.y >= other.max.y
        && self.min.z <= other.min.z && self.max.z >= other.max.z
    }

    /// Test if this AABB contains a point (boundaries inclusive).
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.min.x <= point.x && point.x <= self.max.x
        && self.min.y <= point.y && point.y <= self.max.y
        && self.min.z <= point.z && point.z <= self.max.z
    }

    /// Test if this AABB overlaps or touches another.
    pub fn intersects(&self, other: &AABB) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x
        && self.min.y <= other.max.y && self.max.y >= other.min.y
        && self.min.z <= other.max.z && self.max.z >= other.min.z
    }

    /// Transform this AABB by a matrix, returning a new AABB.
    ///
    /// Uses the Arvo method: projects each matrix axis onto the extents
    /// for a tight result without transforming all 8 corners.
    pub fn transformed(&self, matrix: &Mat4) -> AABB {
        let translation = matrix.col(3).truncate();
        let mut new_min = translation;
        let mut new_max = translation;

        for i in 0..3 {
            let axis = matrix.col(i).truncate();
            let a = axis * self.min[i];
            let b = axis * self.max[i];
            new_min += a.min(b);
            new_max += a.max(b);
        }

        AABB { min: new_min, max: new_max }
    }
}

/// Capability exposed by every entity the octree can track.
///
/// Bounds are owned by the entity; the octree reads them at grow/relocate
/// time and stores a snapshot in its reverse index.
pub trait Boundable {
    /// Bounding box in world space.
    fn absolute_bounds(&self) -> AABB;

    /// Bounding box in the entity's local space.
    fn local_bounds(&self) -> AABB;

    /// Centre point in world space.
    fn centre(&self) -> Vec3 {
        self.absolute_bounds().centre()
    }
}

#[cfg(test)]
#[path = "bounds_tests.rs"]
mod tests;
