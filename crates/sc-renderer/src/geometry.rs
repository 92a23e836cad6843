//! Rays and planes in world space

use glam::{DMat4, DVec3};

/// Half-line from `origin` along a unit `direction`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Start point
    pub origin: DVec3,
    /// Unit direction
    pub direction: DVec3,
}

impl Ray {
    /// Create a ray, normalizing the direction
    pub fn new(origin: DVec3, direction: DVec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Point at parameter `t`
    pub fn at(&self, t: f64) -> DVec3 {
        self.origin + self.direction * t
    }

    /// Transform origin and direction by an affine matrix
    pub fn transform(&self, matrix: &DMat4) -> Ray {
        Ray::new(
            matrix.transform_point3(self.origin),
            matrix.transform_vector3(self.direction),
        )
    }

    /// Distance along the ray to `plane`. Returns `None` when the ray is
    /// parallel to the plane or the plane is behind the origin.
    pub fn intersect_plane(&self, plane: &Plane) -> Option<f64> {
        let denom = self.direction.dot(plane.normal);
        if denom.abs() < 1e-9 {
            return None;
        }
        let t = (plane.origin - self.origin).dot(plane.normal) / denom;
        if t < 0.0 || !t.is_finite() {
            return None;
        }
        Some(t)
    }

    /// Parameter along the line `line_origin + s * line_direction` of the
    /// point closest to this ray. `None` when ray and line are parallel.
    pub fn closest_point_on_line(&self, line_origin: DVec3, line_direction: DVec3) -> Option<f64> {
        let u = line_direction.normalize_or_zero();
        if u == DVec3::ZERO {
            return None;
        }
        let v = self.direction;
        let w = line_origin - self.origin;
        let b = u.dot(v);
        let denom = 1.0 - b * b;
        if denom < 1e-9 {
            return None;
        }
        let d = u.dot(w);
        let e = v.dot(w);
        Some((b * e - d) / denom)
    }
}

/// Infinite plane through `origin` with unit `normal`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Point on the plane
    pub origin: DVec3,
    /// Unit normal
    pub normal: DVec3,
}

impl Plane {
    /// Create a plane, normalizing the normal
    pub fn new(origin: DVec3, normal: DVec3) -> Self {
        Self {
            origin,
            normal: normal.normalize_or_zero(),
        }
    }

    /// Signed distance from `point` to the plane
    pub fn signed_distance(&self, point: DVec3) -> f64 {
        (point - self.origin).dot(self.normal)
    }

    /// Orthogonal projection of `point` onto the plane
    pub fn project(&self, point: DVec3) -> DVec3 {
        point - self.normal * self.signed_distance(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_plane_hit_and_behind() {
        let plane = Plane::new(DVec3::ZERO, DVec3::Z);
        let ray = Ray::new(DVec3::new(1.0, 2.0, 5.0), DVec3::NEG_Z);
        let t = ray.intersect_plane(&plane).unwrap();
        assert_abs_diff_eq!(t, 5.0);
        assert_eq!(ray.at(t), DVec3::new(1.0, 2.0, 0.0));

        let away = Ray::new(DVec3::new(0.0, 0.0, 5.0), DVec3::Z);
        assert!(away.intersect_plane(&plane).is_none());
    }

    #[test]
    fn test_parallel_ray_misses_plane() {
        let plane = Plane::new(DVec3::ZERO, DVec3::Z);
        let ray = Ray::new(DVec3::new(0.0, 0.0, 1.0), DVec3::X);
        assert!(ray.intersect_plane(&plane).is_none());
    }

    #[test]
    fn test_closest_point_on_line() {
        let ray = Ray::new(DVec3::new(3.0, 0.0, 10.0), DVec3::NEG_Z);
        let s = ray.closest_point_on_line(DVec3::ZERO, DVec3::X).unwrap();
        assert_abs_diff_eq!(s, 3.0, epsilon = 1e-12);
        assert!(ray.closest_point_on_line(DVec3::ZERO, DVec3::Z).is_none());
    }
}
