use glam::{Mat4, Vec3};
use super::*;

// ============================================================================
// AABB CONSTRUCTION
// ============================================================================

#[test]
fn test_cube_is_centred() {
    let aabb = AABB::cube(Vec3::new(1.0, 2.0, 3.0), 4.0);

    assert_eq!(aabb.min, Vec3::new(-1.0, 0.0, 1.0));
    assert_eq!(aabb.max, Vec3::new(3.0, 4.0, 5.0));
    assert_eq!(aabb.centre(), Vec3::new(1.0, 2.0, 3.0));
    assert_eq!(aabb.size(), Vec3::splat(4.0));
}

#[test]
fn test_is_valid() {
    assert!(AABB::new(Vec3::splat(-1.0), Vec3::splat(1.0)).is_valid());
    assert!(AABB::new(Vec3::ZERO, Vec3::ZERO).is_valid()); // degenerate but valid
    assert!(!AABB::new(Vec3::splat(1.0), Vec3::splat(-1.0)).is_valid());
    assert!(!AABB::new(Vec3::new(0.0, 2.0, 0.0), Vec3::new(1.0, 1.0, 1.0)).is_valid());
}

// ============================================================================
// CONTAINMENT / INTERSECTION
// ============================================================================

#[test]
fn test_contains() {
    let big = AABB::cube(Vec3::ZERO, 20.0);
    let small = AABB::cube(Vec3::ZERO, 2.0);
    let straddling = AABB::new(Vec3::splat(5.0), Vec3::splat(15.0));

    assert!(big.contains(&small));
    assert!(!small.contains(&big));
    assert!(!big.contains(&straddling));
    // Boundary-touching counts as contained
    assert!(big.contains(&big));
}

#[test]
fn test_contains_point() {
    let aabb = AABB::cube(Vec3::ZERO, 2.0);

    assert!(aabb.contains_point(Vec3::ZERO));
    assert!(aabb.contains_point(Vec3::splat(1.0))); // on the corner
    assert!(!aabb.contains_point(Vec3::splat(1.1)));
}

#[test]
fn test_intersects() {
    let a = AABB::cube(Vec3::ZERO, 4.0);
    let b = AABB::cube(Vec3::splat(2.0), 4.0);
    let c = AABB::cube(Vec3::splat(10.0), 2.0);

    assert!(a.intersects(&b)); // overlapping
    assert!(b.intersects(&a));
    assert!(!a.intersects(&c)); // disjoint
}

// ============================================================================
// TRANSFORM
// ============================================================================

#[test]
fn test_transformed_by_translation() {
    let aabb = AABB::cube(Vec3::ZERO, 2.0);
    let moved = aabb.transformed(&Mat4::from_translation(Vec3::new(5.0, 0.0, 0.0)));

    assert_eq!(moved.centre(), Vec3::new(5.0, 0.0, 0.0));
    assert_eq!(moved.size(), Vec3::splat(2.0));
}

#[test]
fn test_transformed_by_rotation_stays_conservative() {
    let aabb = AABB::cube(Vec3::ZERO, 2.0);
    let rotated = aabb.transformed(&Mat4::from_rotation_z(std::f32::consts::FRAC_PI_4));

    // A rotated cube needs a bigger axis-aligned box
    assert!(rotated.size().x > aabb.size().x);
    assert!(rotated.contains_point(Vec3::new(1.0, 1.0, 1.0).normalize()));
}

// ============================================================================
// BOUNDABLE
// ============================================================================

struct TestEntity {
    bounds: AABB,
}

impl Boundable for TestEntity {
    fn absolute_bounds(&self) -> AABB {
        self.bounds
    }

    fn local_bounds(&self) -> AABB {
        AABB::cube(Vec3::ZERO, self.bounds.size().max_element())
    }
}

#[test]
fn test_boundable_default_centre() {
    let entity = TestEntity {
        bounds: AABB::cube(Vec3::new(3.0, -2.0, 7.0), 2.0),
    };

    assert_eq!(entity.centre(), Vec3::new(3.0, -2.0, 7.0));
}
