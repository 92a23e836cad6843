//! View frustum built from view and projection matrices

use glam::{DMat4, DVec2, DVec3};
use sc_core::Projection;

use crate::geometry::Ray;

/// Camera view volume.
///
/// Projection matrices map view space to clip space with a `[0, 1]` depth
/// range, matching wgpu conventions. NDC x and y are in `[-1, 1]` with +y up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    /// World-to-view matrix
    pub view: DMat4,
    /// View-to-clip matrix
    pub projection: DMat4,
    /// Projection kind the matrices were built for
    pub kind: Projection,
}

impl Frustum {
    /// Create a frustum from matrices
    pub fn new(view: DMat4, projection: DMat4, kind: Projection) -> Self {
        Self {
            view,
            projection,
            kind,
        }
    }

    /// World-space eye position
    pub fn position(&self) -> DVec3 {
        self.view.inverse().w_axis.truncate()
    }

    /// World-space viewing direction
    pub fn forward(&self) -> DVec3 {
        self.view.inverse().transform_vector3(DVec3::NEG_Z).normalize_or_zero()
    }

    /// World ray through a point given in normalized device coordinates.
    ///
    /// Perspective rays start at the near plane and diverge from the eye;
    /// orthographic rays are parallel to the view direction.
    pub fn compute_ray(&self, ndc: DVec2) -> Ray {
        let inverse = (self.projection * self.view).inverse();
        let near = inverse.project_point3(DVec3::new(ndc.x, ndc.y, 0.0));
        let far = inverse.project_point3(DVec3::new(ndc.x, ndc.y, 1.0));
        Ray::new(near, far - near)
    }

    /// Height of the view window at unit distance (perspective) or the
    /// full window height in world units (orthographic)
    pub fn window_height(&self) -> f64 {
        let sy = self.projection.y_axis.y;
        if sy.abs() < f64::EPSILON {
            return 0.0;
        }
        2.0 / sy.abs()
    }

    /// Distance from the eye to `point` along the view direction.
    /// Negative when the point is behind the camera.
    pub fn depth_of(&self, point: DVec3) -> f64 {
        -self.view.transform_point3(point).z
    }

    /// Frustum restricted to a window of `half_size` NDC units around
    /// `center`, used to pick within a small region around the cursor.
    pub fn narrowed(&self, center: DVec2, half_size: DVec2) -> Frustum {
        let half_size = half_size.max(DVec2::splat(1e-9));
        let pick = DMat4::from_scale(DVec3::new(1.0 / half_size.x, 1.0 / half_size.y, 1.0))
            * DMat4::from_translation(DVec3::new(-center.x, -center.y, 0.0));
        Frustum {
            view: self.view,
            projection: pick * self.projection,
            kind: self.kind,
        }
    }

    /// Project a world point to NDC. `None` for points behind a perspective eye.
    pub fn project(&self, point: DVec3) -> Option<DVec2> {
        let clip = self.projection * self.view * point.extend(1.0);
        if clip.w <= 0.0 {
            return None;
        }
        Some(DVec2::new(clip.x / clip.w, clip.y / clip.w))
    }
}
