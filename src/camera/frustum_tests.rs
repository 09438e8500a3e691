use glam::{Mat4, Vec3};
use crate::scene::AABB;
use super::*;

fn perspective_frustum(eye: Vec3, target: Vec3, fov: f32, far: f32) -> Frustum {
    let projection = Mat4::perspective_rh(fov, 1.0, 0.1, far);
    let view = Mat4::look_at_rh(eye, target, Vec3::Y);
    Frustum::from_view_projection(&(projection * view))
}

// ============================================================================
// Frustum::from_view_projection
// ============================================================================

#[test]
fn test_planes_are_normalized() {
    let frustum = perspective_frustum(
        Vec3::new(0.0, 0.0, 5.0),
        Vec3::ZERO,
        std::f32::consts::FRAC_PI_4,
        100.0,
    );

    for plane in &frustum.planes {
        let normal_len = Vec3::new(plane.x, plane.y, plane.z).length();
        assert!((normal_len - 1.0).abs() < 1e-4, "plane normal should be unit length");
    }
}

#[test]
fn test_orthographic_planes_are_normalized() {
    let projection = Mat4::orthographic_rh(-10.0, 10.0, -10.0, 10.0, 0.1, 100.0);
    let frustum = Frustum::from_view_projection(&projection);

    for plane in &frustum.planes {
        let normal_len = Vec3::new(plane.x, plane.y, plane.z).length();
        assert!((normal_len - 1.0).abs() < 1e-4, "plane normal should be unit length");
    }
}

// ============================================================================
// Frustum::intersects_aabb
// ============================================================================

#[test]
fn test_aabb_in_front_of_camera_intersects() {
    let frustum = perspective_frustum(
        Vec3::new(0.0, 0.0, 5.0),
        Vec3::ZERO,
        std::f32::consts::FRAC_PI_2,
        100.0,
    );

    let aabb = AABB::new(Vec3::splat(-1.0), Vec3::splat(1.0));
    assert!(frustum.intersects_aabb(&aabb));
}

#[test]
fn test_aabb_far_to_the_side_is_rejected() {
    let frustum = perspective_frustum(
        Vec3::new(0.0, 0.0, 5.0),
        Vec3::ZERO,
        std::f32::consts::FRAC_PI_4,
        100.0,
    );

    let aabb = AABB::new(Vec3::splat(100.0), Vec3::splat(101.0));
    assert!(!frustum.intersects_aabb(&aabb));
}

#[test]
fn test_aabb_behind_camera_is_rejected() {
    let frustum = perspective_frustum(
        Vec3::ZERO,
        Vec3::new(0.0, 0.0, -1.0),
        std::f32::consts::FRAC_PI_2,
        100.0,
    );

    let aabb = AABB::new(Vec3::new(-1.0, -1.0, 10.0), Vec3::new(1.0, 1.0, 12.0));
    assert!(!frustum.intersects_aabb(&aabb));
}

#[test]
fn test_aabb_straddling_a_plane_intersects() {
    let frustum = perspective_frustum(
        Vec3::ZERO,
        Vec3::new(0.0, 0.0, -1.0),
        std::f32::consts::FRAC_PI_2,
        50.0,
    );

    // Straddles the far plane at z = -50
    let aabb = AABB::new(Vec3::new(-1.0, -1.0, -60.0), Vec3::new(1.0, 1.0, -40.0));
    assert!(frustum.intersects_aabb(&aabb));
}

// ============================================================================
// Frustum::classify_aabb
// ============================================================================

#[test]
fn test_classify_fully_inside() {
    let frustum = perspective_frustum(
        Vec3::ZERO,
        Vec3::new(0.0, 0.0, -1.0),
        std::f32::consts::FRAC_PI_2,
        100.0,
    );

    let aabb = AABB::new(Vec3::new(-1.0, -1.0, -20.0), Vec3::new(1.0, 1.0, -18.0));
    assert_eq!(frustum.classify_aabb(&aabb), FrustumTest::Inside);
}

#[test]
fn test_classify_fully_outside() {
    let frustum = perspective_frustum(
        Vec3::ZERO,
        Vec3::new(0.0, 0.0, -1.0),
        std::f32::consts::FRAC_PI_2,
        100.0,
    );

    let aabb = AABB::new(Vec3::new(-1.0, -1.0, 10.0), Vec3::new(1.0, 1.0, 12.0));
    assert_eq!(frustum.classify_aabb(&aabb), FrustumTest::Outside);
}

#[test]
fn test_classify_partial_overlap() {
    let frustum = perspective_frustum(
        Vec3::ZERO,
        Vec3::new(0.0, 0.0, -1.0),
        std::f32::consts::FRAC_PI_2,
        50.0,
    );

    // Straddles the far plane
    let aabb = AABB::new(Vec3::new(-1.0, -1.0, -60.0), Vec3::new(1.0, 1.0, -40.0));
    assert_eq!(frustum.classify_aabb(&aabb), FrustumTest::Partial);
}

#[test]
fn test_classify_agrees_with_intersects() {
    let frustum = perspective_frustum(
        Vec3::ZERO,
        Vec3::new(0.0, 0.0, -1.0),
        std::f32::consts::FRAC_PI_4,
        100.0,
    );

    let boxes = [
        AABB::new(Vec3::new(-1.0, -1.0, -20.0), Vec3::new(1.0, 1.0, -18.0)),
        AABB::new(Vec3::new(-1.0, -1.0, 10.0), Vec3::new(1.0, 1.0, 12.0)),
        AABB::new(Vec3::splat(-200.0), Vec3::splat(200.0)),
    ];

    for aabb in &boxes {
        let intersects = frustum.intersects_aabb(aabb);
        let class = frustum.classify_aabb(aabb);
        assert_eq!(intersects, class != FrustumTest::Outside);
    }
}
