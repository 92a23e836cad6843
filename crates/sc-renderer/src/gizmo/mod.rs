//! Manipulator gizmos
//!
//! Manipulators describe what they want drawn each frame as a
//! [`GizmoDrawList`]; the [`GizmoRenderer`] turns that list into draw calls.
//! Hit testing against gizmo handles lives in [`collision`].

pub mod collision;
mod geometry;
mod renderer;

pub use collision::{ray_cylinder_intersection, ray_ring_intersection, ray_sphere_intersection};
pub use geometry::{
    GizmoVertex, NEUTRAL_AXIS_ID, generate_rotation_gizmo, generate_scale_gizmo,
    generate_translation_gizmo,
};
pub use renderer::{
    GizmoCameraUniform, GizmoInstance, GizmoRenderer, GizmoRendererError, OFFSCREEN_COLOR_FORMAT,
    OFFSCREEN_DEPTH_FORMAT, headless_device,
};

use glam::{DMat4, DVec3};

/// Which axis is being manipulated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Axis {
    #[default]
    None,
    X,
    Y,
    Z,
}

impl Axis {
    /// The three real axes
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Column index of the axis, `None` for [`Axis::None`]
    pub fn index(&self) -> Option<usize> {
        match self {
            Axis::None => None,
            Axis::X => Some(0),
            Axis::Y => Some(1),
            Axis::Z => Some(2),
        }
    }

    /// Index passed to the gizmo shader, -1 for none
    pub fn to_shader_index(&self) -> f32 {
        self.index().map_or(-1.0, |i| i as f32)
    }

    /// Unit direction of the axis
    pub fn direction(&self) -> DVec3 {
        match self {
            Axis::None => DVec3::ZERO,
            Axis::X => DVec3::X,
            Axis::Y => DVec3::Y,
            Axis::Z => DVec3::Z,
        }
    }
}

/// Gizmo mesh kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GizmoShape {
    /// Three axis rings
    RotationRings,
    /// Three axis arrows
    TranslationArrows,
    /// Three axis handles with cubes, plus a center cube
    ScaleHandles,
}

impl GizmoShape {
    /// Every shape
    pub const ALL: [GizmoShape; 3] = [
        GizmoShape::RotationRings,
        GizmoShape::TranslationArrows,
        GizmoShape::ScaleHandles,
    ];
}

/// One gizmo to draw this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GizmoDraw {
    /// Mesh to draw
    pub shape: GizmoShape,
    /// Orthonormal manipulator frame in world space
    pub to_world: DMat4,
    /// Uniform size in world units
    pub scale: f64,
    /// Handle drawn with the highlight color
    pub highlight: Axis,
}

/// Gizmos requested by manipulators for the current frame
#[derive(Debug, Clone, Default)]
pub struct GizmoDrawList {
    draws: Vec<GizmoDraw>,
}

impl GizmoDrawList {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a gizmo
    pub fn push(&mut self, draw: GizmoDraw) {
        self.draws.push(draw);
    }

    /// Queued gizmos in submission order
    pub fn iter(&self) -> impl Iterator<Item = &GizmoDraw> {
        self.draws.iter()
    }

    /// Number of queued gizmos
    pub fn len(&self) -> usize {
        self.draws.len()
    }

    /// True when nothing is queued
    pub fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }

    /// Drop every queued gizmo
    pub fn clear(&mut self) {
        self.draws.clear();
    }
}
