//! Gizmo collision detection utilities
//!
//! Ray-casting tests used to pick gizmo handles: rings for rotation,
//! cylinders for translation arrows and spheres for scale handles. All
//! distances are ray parameters measured from the ray origin.

use glam::DVec3;

use crate::geometry::{Plane, Ray};

/// Ray-cylinder intersection test.
///
/// Tests if a ray intersects with a finite cylinder defined by its axis
/// endpoints and radius.
///
/// # Algorithm
///
/// 1. **Infinite cylinder intersection**: Projects the ray and cylinder axis
///    into the plane perpendicular to the cylinder axis, then solves the
///    resulting 2D quadratic equation.
///
/// 2. **Finite bounds check**: Verifies that the intersection point lies
///    between `cylinder_start` and `cylinder_end`.
///
/// # Returns
///
/// * `Some(t)` - The ray parameter at the closest intersection point.
/// * `None` - If the ray does not intersect the cylinder.
pub fn ray_cylinder_intersection(
    ray: &Ray,
    cylinder_start: DVec3,
    cylinder_end: DVec3,
    radius: f64,
) -> Option<f64> {
    let cylinder_length = (cylinder_end - cylinder_start).length();
    if cylinder_length <= f64::EPSILON || radius <= 0.0 {
        return None;
    }
    let cylinder_axis = (cylinder_end - cylinder_start) / cylinder_length;

    // Components of the ray direction and origin offset perpendicular to the axis
    let d = ray.direction - cylinder_axis * ray.direction.dot(cylinder_axis);
    let offset = ray.origin - cylinder_start;
    let o = offset - cylinder_axis * offset.dot(cylinder_axis);

    // Quadratic coefficients: at² + bt + c = 0
    let a = d.dot(d);
    if a < 1e-12 {
        // Ray parallel to the axis
        return None;
    }
    let b = 2.0 * d.dot(o);
    let c = o.dot(o) - radius * radius;

    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return None;
    }

    let t = (-b - discriminant.sqrt()) / (2.0 * a);
    if t < 0.0 {
        return None;
    }

    let projection = (ray.at(t) - cylinder_start).dot(cylinder_axis);
    if projection < 0.0 || projection > cylinder_length {
        return None;
    }

    Some(t)
}

/// Ray-ring intersection test with a relative tolerance.
///
/// Intersects the ray with the ring plane and accepts the hit when the
/// distance from the ring center differs from `ring_radius` by less than
/// `relative_tolerance * ring_radius`. A zero radius never hits.
pub fn ray_ring_intersection(
    ray: &Ray,
    ring_center: DVec3,
    ring_normal: DVec3,
    ring_radius: f64,
    relative_tolerance: f64,
) -> Option<f64> {
    if ring_radius <= f64::EPSILON || !ring_radius.is_finite() {
        return None;
    }
    let plane = Plane::new(ring_center, ring_normal);
    let t = ray.intersect_plane(&plane)?;
    let distance_from_center = (ray.at(t) - ring_center).length();
    let relative_error = (distance_from_center - ring_radius).abs() / ring_radius;
    if relative_error < relative_tolerance {
        Some(t)
    } else {
        None
    }
}

/// Ray-sphere intersection, used for scale handle cubes
pub fn ray_sphere_intersection(ray: &Ray, sphere_center: DVec3, radius: f64) -> Option<f64> {
    let oc = ray.origin - sphere_center;
    let a = ray.direction.dot(ray.direction);
    if a < 1e-12 {
        return None;
    }
    let b = 2.0 * oc.dot(ray.direction);
    let c = oc.dot(oc) - radius * radius;
    let discriminant = b * b - 4.0 * a * c;

    if discriminant < 0.0 {
        return None;
    }

    let t = (-b - discriminant.sqrt()) / (2.0 * a);
    if t > 0.0 { Some(t) } else { None }
}
