//! Physical camera model for the viewport
//!
//! A [`Camera`] is described the way stage camera prims are: a
//! camera-to-world transform plus film-back apertures, focal length and a
//! clipping range. Free cameras additionally use `focus_distance` as the
//! distance to their center of interest for orbiting.

use glam::{DMat4, DVec3};
use sc_core::{BoundingBox, CameraParams, Projection, UpAxis};
use serde::{Deserialize, Serialize};

use crate::constants::{MAX_CAMERA_DISTANCE, MIN_CAMERA_DISTANCE, ORTHO_APERTURE_UNIT};
use crate::frustum::Frustum;

/// How a camera window is adapted to a viewport with a different aspect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConformWindowPolicy {
    /// Keep the vertical aperture
    MatchVertically,
    /// Keep the horizontal aperture
    MatchHorizontally,
    /// Grow one aperture so the whole camera window stays visible
    #[default]
    Fit,
    /// Shrink one aperture so the viewport is filled
    Crop,
    /// Keep both apertures; the image is stretched
    DontConform,
}

/// Fixed orthographic views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrthoView {
    /// Looking down the up axis
    Top,
    /// Looking at the front of the scene
    Front,
    /// Looking from the +X side
    Right,
}

impl OrthoView {
    /// All fixed views
    pub const ALL: [OrthoView; 3] = [OrthoView::Top, OrthoView::Front, OrthoView::Right];

    /// Eye direction (from target toward eye) and screen-up vector
    fn basis(&self, up_axis: UpAxis) -> (DVec3, DVec3) {
        match (up_axis, self) {
            (UpAxis::Y, OrthoView::Top) => (DVec3::Y, DVec3::NEG_Z),
            (UpAxis::Y, OrthoView::Front) => (DVec3::Z, DVec3::Y),
            (UpAxis::Y, OrthoView::Right) => (DVec3::X, DVec3::Y),
            (UpAxis::Z, OrthoView::Top) => (DVec3::Z, DVec3::Y),
            (UpAxis::Z, OrthoView::Front) => (DVec3::NEG_Y, DVec3::Z),
            (UpAxis::Z, OrthoView::Right) => (DVec3::X, DVec3::Z),
        }
    }

    /// Display name
    pub fn name(&self) -> &'static str {
        match self {
            OrthoView::Top => "Top",
            OrthoView::Front => "Front",
            OrthoView::Right => "Right",
        }
    }
}

/// Viewport camera
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// Camera-to-world transform; the camera looks down its local -Z
    pub transform: DMat4,
    /// Projection kind
    pub projection: Projection,
    /// Horizontal film aperture
    pub horizontal_aperture: f64,
    /// Vertical film aperture
    pub vertical_aperture: f64,
    /// Focal length, in the same unit as the apertures
    pub focal_length: f64,
    /// Near and far clipping distances
    pub clipping_range: (f64, f64),
    /// Distance to the center of interest
    pub focus_distance: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self::perspective(UpAxis::Y)
    }
}

impl Camera {
    /// Camera from authored prim parameters and its world transform
    pub fn from_params(params: &CameraParams, transform: DMat4) -> Self {
        Self {
            transform,
            projection: params.projection,
            horizontal_aperture: params.horizontal_aperture,
            vertical_aperture: params.vertical_aperture,
            focal_length: params.focal_length,
            clipping_range: params.clipping_range,
            focus_distance: params.focus_distance,
        }
    }

    /// Parameters to author back onto a camera prim
    pub fn params(&self) -> CameraParams {
        CameraParams {
            projection: self.projection,
            focal_length: self.focal_length,
            horizontal_aperture: self.horizontal_aperture,
            vertical_aperture: self.vertical_aperture,
            clipping_range: self.clipping_range,
            focus_distance: self.focus_distance,
        }
    }

    /// Default free perspective camera looking at the origin
    pub fn perspective(up_axis: UpAxis) -> Self {
        let defaults = CameraParams::default();
        let mut camera = Self::from_params(
            &CameraParams {
                clipping_range: (0.1, 100_000.0),
                ..defaults
            },
            DMat4::IDENTITY,
        );
        let yaw = 45f64.to_radians();
        let pitch = 30f64.to_radians();
        let distance = 5.0;
        let up = up_axis.up_vector();
        let a = up.any_orthonormal_vector();
        let b = up.cross(a);
        let offset = (a * yaw.cos() + b * yaw.sin()) * pitch.cos() + up * pitch.sin();
        camera.look_at(offset * distance, DVec3::ZERO, up);
        camera
    }

    /// Free orthographic camera for one of the fixed views
    pub fn orthographic(view: OrthoView, up_axis: UpAxis) -> Self {
        let (eye_direction, screen_up) = view.basis(up_axis);
        let mut camera = Self {
            transform: DMat4::IDENTITY,
            projection: Projection::Orthographic,
            horizontal_aperture: 200.0,
            vertical_aperture: 200.0,
            focal_length: 50.0,
            clipping_range: (0.1, 100_000.0),
            focus_distance: 1000.0,
        };
        camera.look_at(eye_direction * 1000.0, DVec3::ZERO, screen_up);
        camera
    }

    /// World-space eye position
    pub fn position(&self) -> DVec3 {
        self.transform.w_axis.truncate()
    }

    /// Unit viewing direction
    pub fn forward(&self) -> DVec3 {
        (-self.transform.z_axis.truncate()).normalize_or_zero()
    }

    /// Unit screen-up direction
    pub fn up(&self) -> DVec3 {
        self.transform.y_axis.truncate().normalize_or_zero()
    }

    /// Unit screen-right direction
    pub fn right(&self) -> DVec3 {
        self.transform.x_axis.truncate().normalize_or_zero()
    }

    /// Point the camera orbits around
    pub fn center_of_interest(&self) -> DVec3 {
        let distance = if self.focus_distance > MIN_CAMERA_DISTANCE {
            self.focus_distance
        } else {
            5.0
        };
        self.position() + self.forward() * distance
    }

    /// Place the eye at `eye` looking at `target`
    pub fn look_at(&mut self, eye: DVec3, target: DVec3, up: DVec3) {
        let mut up = up;
        let direction = (target - eye).normalize_or_zero();
        if direction.cross(up).length_squared() < 1e-12 {
            up = direction.any_orthonormal_vector();
        }
        self.transform = DMat4::look_at_rh(eye, target, up).inverse();
        self.focus_distance = (target - eye).length();
    }

    /// Vertical field of view in degrees (perspective only)
    pub fn vertical_fov_degrees(&self) -> f64 {
        let focal = self.focal_length.max(1e-6);
        (2.0 * (self.vertical_aperture * 0.5 / focal).atan()).to_degrees()
    }

    /// Aspect ratio of the film back
    pub fn aspect_ratio(&self) -> f64 {
        if self.vertical_aperture <= 0.0 {
            return 1.0;
        }
        self.horizontal_aperture / self.vertical_aperture
    }

    /// Copy of the camera with apertures adapted to `aspect`
    pub fn conformed(&self, aspect: f64, policy: ConformWindowPolicy) -> Self {
        let mut camera = *self;
        if aspect <= 0.0 || !aspect.is_finite() {
            return camera;
        }
        let window_aspect = self.aspect_ratio();
        let match_horizontally = match policy {
            ConformWindowPolicy::MatchVertically => false,
            ConformWindowPolicy::MatchHorizontally => true,
            ConformWindowPolicy::Fit => window_aspect > aspect,
            ConformWindowPolicy::Crop => window_aspect <= aspect,
            ConformWindowPolicy::DontConform => return camera,
        };
        if match_horizontally {
            camera.vertical_aperture = self.horizontal_aperture / aspect;
        } else {
            camera.horizontal_aperture = self.vertical_aperture * aspect;
        }
        camera
    }

    /// World-to-view matrix
    pub fn view_matrix(&self) -> DMat4 {
        self.transform.inverse()
    }

    /// View-to-clip matrix with `[0, 1]` depth
    pub fn projection_matrix(&self) -> DMat4 {
        let (near, far) = self.clipping_range;
        match self.projection {
            Projection::Perspective => DMat4::perspective_rh(
                self.vertical_fov_degrees().to_radians(),
                self.aspect_ratio(),
                near,
                far,
            ),
            Projection::Orthographic => {
                let half_width = self.horizontal_aperture * ORTHO_APERTURE_UNIT * 0.5;
                let half_height = self.vertical_aperture * ORTHO_APERTURE_UNIT * 0.5;
                DMat4::orthographic_rh(-half_width, half_width, -half_height, half_height, near, far)
            }
        }
    }

    /// View frustum of this camera
    pub fn frustum(&self) -> Frustum {
        Frustum::new(self.view_matrix(), self.projection_matrix(), self.projection)
    }

    /// Tumble around the center of interest. Angles in degrees; pitch is
    /// clamped short of the poles.
    pub fn orbit(&mut self, delta_yaw: f64, delta_pitch: f64, up: DVec3) {
        let target = self.center_of_interest();
        let offset = self.position() - target;
        let distance = offset.length();
        if distance < MIN_CAMERA_DISTANCE {
            return;
        }
        let a = up.any_orthonormal_vector();
        let b = up.cross(a);
        let pitch = (offset.dot(up) / distance).clamp(-1.0, 1.0).asin();
        let yaw = offset.dot(b).atan2(offset.dot(a));

        let limit = 89f64.to_radians();
        let yaw = yaw + delta_yaw.to_radians();
        let pitch = (pitch + delta_pitch.to_radians()).clamp(-limit, limit);
        let direction = (a * yaw.cos() + b * yaw.sin()) * pitch.cos() + up * pitch.sin();
        self.look_at(target + direction * distance, target, up);
    }

    /// Slide the camera in its view plane. Deltas are in NDC units, so a
    /// drag across the whole viewport moves the scene by one window.
    pub fn pan(&mut self, ndc_dx: f64, ndc_dy: f64) {
        let half_height = match self.projection {
            Projection::Perspective => {
                self.focus_distance.max(MIN_CAMERA_DISTANCE) * self.vertical_aperture * 0.5
                    / self.focal_length.max(1e-6)
            }
            Projection::Orthographic => self.vertical_aperture * ORTHO_APERTURE_UNIT * 0.5,
        };
        let half_width = half_height * self.aspect_ratio();
        let offset = -(self.right() * ndc_dx * half_width + self.up() * ndc_dy * half_height);
        self.transform = DMat4::from_translation(offset) * self.transform;
    }

    /// Dolly toward the center of interest, or shrink the orthographic
    /// window. Positive amounts zoom in.
    pub fn zoom(&mut self, amount: f64) {
        let factor = (1.0 - amount * 0.1).max(0.01);
        match self.projection {
            Projection::Perspective => {
                let target = self.center_of_interest();
                let distance = (self.focus_distance * factor).clamp(MIN_CAMERA_DISTANCE, MAX_CAMERA_DISTANCE);
                let eye = target - self.forward() * distance;
                self.transform.w_axis = eye.extend(1.0);
                self.focus_distance = distance;
            }
            Projection::Orthographic => {
                self.horizontal_aperture = (self.horizontal_aperture * factor).max(1e-3);
                self.vertical_aperture = (self.vertical_aperture * factor).max(1e-3);
            }
        }
    }

    /// Keep the viewing direction and move so `bounds` fills the view
    pub fn frame_bounds(&mut self, bounds: &BoundingBox) {
        if !bounds.is_valid() {
            return;
        }
        let target = bounds.center();
        let radius = bounds.radius().max(MIN_CAMERA_DISTANCE);
        let forward = self.forward();
        let up = self.up();
        match self.projection {
            Projection::Perspective => {
                let smaller = self.horizontal_aperture.min(self.vertical_aperture);
                let half_fov = (smaller * 0.5 / self.focal_length.max(1e-6)).atan();
                let distance = (radius / half_fov.sin()).clamp(MIN_CAMERA_DISTANCE, MAX_CAMERA_DISTANCE);
                self.look_at(target - forward * distance, target, up);
                let (near, far) = self.clipping_range;
                if far < distance + radius {
                    self.clipping_range = (near, (distance + radius) * 2.0);
                }
            }
            Projection::Orthographic => {
                let aspect = self.aspect_ratio();
                let window = radius * 2.0 / ORTHO_APERTURE_UNIT;
                if aspect >= 1.0 {
                    self.vertical_aperture = window;
                    self.horizontal_aperture = window * aspect;
                } else {
                    self.horizontal_aperture = window;
                    self.vertical_aperture = window / aspect;
                }
                let distance = (radius * 4.0).max(self.focus_distance);
                self.look_at(target - forward * distance, target, up);
            }
        }
    }
}
