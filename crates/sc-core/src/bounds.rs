//! Axis-aligned bounding boxes in double precision.

use glam::{DMat4, DVec3};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Minimum corner of the bounding box.
    pub min: DVec3,
    /// Maximum corner of the bounding box.
    pub max: DVec3,
}

impl BoundingBox {
    /// Creates a new bounding box from min and max points.
    pub fn new(min: DVec3, max: DVec3) -> Self {
        Self { min, max }
    }

    /// Creates an empty (inverted) bounding box.
    pub fn empty() -> Self {
        Self {
            min: DVec3::splat(f64::INFINITY),
            max: DVec3::splat(f64::NEG_INFINITY),
        }
    }

    /// Creates a bounding box from a center point and half-extents.
    pub fn from_center_half_extents(center: DVec3, half_extents: DVec3) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Returns the center of the bounding box.
    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    /// Returns the half-extents of the bounding box.
    pub fn half_extents(&self) -> DVec3 {
        (self.max - self.min) * 0.5
    }

    /// Returns the radius of the bounding sphere.
    pub fn radius(&self) -> f64 {
        self.half_extents().length()
    }

    /// Returns the union of two bounding boxes.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Expands the bounding box to include a point.
    pub fn expand_to_include(&self, point: DVec3) -> BoundingBox {
        BoundingBox {
            min: self.min.min(point),
            max: self.max.max(point),
        }
    }

    /// Transforms the bounding box by a matrix, returning a new AABB that
    /// contains the transformed box.
    pub fn transform(&self, transform: &DMat4) -> BoundingBox {
        if !self.is_valid() {
            return *self;
        }
        let mut result = BoundingBox::empty();
        for corner in 0..8 {
            let point = DVec3::new(
                if corner & 1 == 0 { self.min.x } else { self.max.x },
                if corner & 2 == 0 { self.min.y } else { self.max.y },
                if corner & 4 == 0 { self.min.z } else { self.max.z },
            );
            result = result.expand_to_include(transform.transform_point3(point));
        }
        result
    }

    /// Returns true if the bounding box is valid (min <= max).
    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
    }

    /// Ray-box slab test. Returns the distance to the entry point, or to the
    /// exit point when the ray starts inside the box.
    pub fn intersect_ray(&self, origin: DVec3, direction: DVec3) -> Option<f64> {
        if !self.is_valid() {
            return None;
        }
        let mut t_min = f64::NEG_INFINITY;
        let mut t_max = f64::INFINITY;
        for axis in 0..3 {
            let (o, d) = (origin[axis], direction[axis]);
            if d.abs() < 1e-12 {
                if o < self.min[axis] || o > self.max[axis] {
                    return None;
                }
                continue;
            }
            let t0 = (self.min[axis] - o) / d;
            let t1 = (self.max[axis] - o) / d;
            t_min = t_min.max(t0.min(t1));
            t_max = t_max.min(t0.max(t1));
        }
        if t_max < t_min || t_max < 0.0 {
            return None;
        }
        Some(if t_min >= 0.0 { t_min } else { t_max })
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_box_union() {
        let a = BoundingBox::new(DVec3::ZERO, DVec3::ONE);
        let b = BoundingBox::new(DVec3::splat(-1.0), DVec3::splat(0.5));
        let u = a.union(&b);
        assert_eq!(u.min, DVec3::splat(-1.0));
        assert_eq!(u.max, DVec3::ONE);
    }

    #[test]
    fn test_transform_translates_box() {
        let b = BoundingBox::new(DVec3::splat(-1.0), DVec3::ONE);
        let moved = b.transform(&DMat4::from_translation(DVec3::new(5.0, 0.0, 0.0)));
        assert_eq!(moved.center(), DVec3::new(5.0, 0.0, 0.0));
        assert!(!BoundingBox::empty().is_valid());
    }

    #[test]
    fn test_ray_hits_and_misses() {
        let b = BoundingBox::new(DVec3::splat(-1.0), DVec3::ONE);
        let hit = b.intersect_ray(DVec3::new(0.0, 0.0, 5.0), DVec3::NEG_Z);
        assert_eq!(hit, Some(4.0));
        assert!(b.intersect_ray(DVec3::new(3.0, 0.0, 5.0), DVec3::NEG_Z).is_none());
        assert!(b.intersect_ray(DVec3::new(0.0, 0.0, 5.0), DVec3::Z).is_none());
        // Starting inside reports the exit distance
        assert_eq!(b.intersect_ray(DVec3::ZERO, DVec3::X), Some(1.0));
    }
}
