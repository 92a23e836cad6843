//! Rotation manipulator
//!
//! Three rings around the pivot, one per axis of the prim's rotated frame.
//! Dragging a ring rotates the prim about that axis by the angle swept by
//! the cursor on the ring plane.

use glam::{DMat3, DMat4, DVec3};
use sc_core::{RotationOrder, XformOp, matrix_to_euler};
use sc_renderer::{Axis, GizmoDraw, GizmoDrawList, GizmoShape, Plane, ray_ring_intersection};

use super::edit_target::{EditSession, EditTarget};
use super::{Manipulator, ManipulatorContext, ManipulatorKind};

/// Sweeps below this many radians leave the rotation untouched
const MIN_ANGLE: f64 = 1e-6;

/// State captured when a ring drag begins
#[derive(Debug, Clone)]
struct RotationDrag {
    axis_index: usize,
    /// Ring plane in world space. Fixed for the whole drag.
    plane: Plane,
    /// Cursor on the ring plane at begin, relative to the plane origin
    rotate_from: DVec3,
    /// Local rotation at begin, as angles and as a matrix
    rotation_on_begin: DVec3,
    matrix_on_begin: DMat3,
    rotation_order: RotationOrder,
    /// Parent frame flips handedness, so a local rotation turns the other
    /// way in world space
    mirrored: bool,
    /// Angles of the previous frame, used to seed the decomposition
    previous: DVec3,
    written: bool,
}

#[derive(Debug, Default)]
pub struct RotationManipulator {
    target: EditTarget,
    selected_axis: Axis,
    drag: Option<RotationDrag>,
    session: EditSession,
}

impl RotationManipulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ring frame: pivot position, axes along the prim rotation
    fn frame(&self, ctx: &ManipulatorContext<'_>) -> Option<DMat4> {
        self.target.manipulator_to_world(ctx.stage, ctx.time, true)
    }

    /// Ring radius in world units at `origin`
    fn ring_radius(ctx: &ManipulatorContext<'_>, origin: DVec3) -> f64 {
        ctx.compute_scale_factor(origin, ctx.config.gizmo.axis_size)
    }

    /// Rotation angles for the current cursor position, `None` when the
    /// cursor cannot be placed on the ring plane
    fn drag_angles(drag: &RotationDrag, ctx: &ManipulatorContext<'_>) -> Option<DVec3> {
        let ray = ctx.mouse_ray();
        let t = ray.intersect_plane(&drag.plane)?;
        let rotate_to = ray.at(t) - drag.plane.origin;
        if rotate_to.length_squared() < 1e-18 || drag.rotate_from.length_squared() < 1e-18 {
            return None;
        }

        let mut angle = drag.rotate_from.angle_between(rotate_to);
        if !angle.is_finite() {
            return None;
        }
        if angle < MIN_ANGLE {
            return Some(drag.rotation_on_begin);
        }
        if (drag.rotate_from.cross(rotate_to).dot(drag.plane.normal) < 0.0) != drag.mirrored {
            angle = -angle;
        }

        let mut local_axis = DVec3::ZERO;
        local_axis[drag.axis_index] = 1.0;
        let parent_axis = drag.matrix_on_begin * local_axis;
        let rotation = DMat3::from_axis_angle(parent_axis, angle) * drag.matrix_on_begin;
        Some(matrix_to_euler(&rotation, drag.rotation_order, Some(drag.previous)))
    }
}

/// Shift each angle by whole turns so it lies within 180° of `reference`
fn wrap_towards(angles: DVec3, reference: DVec3) -> DVec3 {
    let turns = ((angles - reference) / 360.0).round();
    angles - turns * 360.0
}

impl Manipulator for RotationManipulator {
    fn kind(&self) -> ManipulatorKind {
        ManipulatorKind::Rotation
    }

    fn is_mouse_over(&mut self, ctx: &ManipulatorContext<'_>) -> bool {
        self.selected_axis = Axis::None;
        let Some(frame) = self.frame(ctx) else {
            return false;
        };
        let origin = frame.w_axis.truncate();
        let radius = Self::ring_radius(ctx, origin);
        let ray = ctx.mouse_ray();
        for axis in Axis::ALL {
            let Some(index) = axis.index() else { continue };
            let normal = frame.col(index).truncate();
            if ray_ring_intersection(&ray, origin, normal, radius, ctx.config.gizmo.hit_tolerance).is_some() {
                self.selected_axis = axis;
                return true;
            }
        }
        false
    }

    fn on_begin_edition(&mut self, ctx: &mut ManipulatorContext<'_>) {
        self.session.open(ctx.stage, "Rotate");
        self.drag = None;

        let Some(axis_index) = self.selected_axis.index() else {
            return;
        };
        let (Some(frame), Some(transform), Some(parent)) = (
            self.frame(ctx),
            self.target.transform(ctx.stage, ctx.time),
            self.target.parent_to_world(ctx.stage, ctx.time),
        ) else {
            return;
        };
        let origin = frame.w_axis.truncate();
        let plane = Plane::new(origin, frame.col(axis_index).truncate());
        let ray = ctx.mouse_ray();
        let Some(t) = ray.intersect_plane(&plane) else {
            tracing::debug!("Rotation ring plane is edge-on, drag ignored");
            return;
        };

        self.drag = Some(RotationDrag {
            axis_index,
            plane,
            rotate_from: ray.at(t) - origin,
            rotation_on_begin: transform.rotation,
            matrix_on_begin: transform.rotation_matrix(),
            rotation_order: transform.rotation_order,
            mirrored: parent.determinant() < 0.0,
            previous: transform.rotation,
            written: false,
        });
    }

    fn on_update(&mut self, ctx: &mut ManipulatorContext<'_>) -> ManipulatorKind {
        if let Some(drag) = self.drag.as_mut() {
            if self.target.is_valid(ctx.stage) {
                // Degenerate frames hold the last value
                if let Some(angles) = Self::drag_angles(drag, ctx) {
                    if angles != drag.previous {
                        if self.target.write(ctx.stage, XformOp::Rotate, angles, ctx.time) {
                            drag.written = true;
                        }
                        drag.previous = angles;
                    }
                }
            }
        }

        if ctx.is_dragging() {
            ManipulatorKind::Rotation
        } else {
            ManipulatorKind::MouseHover
        }
    }

    fn on_end_edition(&mut self, ctx: &mut ManipulatorContext<'_>) {
        if let Some(drag) = self.drag.take() {
            if drag.written && self.target.is_valid(ctx.stage) {
                let wrapped = wrap_towards(drag.previous, drag.rotation_on_begin);
                if wrapped != drag.previous {
                    self.target.write(ctx.stage, XformOp::Rotate, wrapped, ctx.time);
                }
            }
        }
        self.session.close(ctx.stage);
    }

    fn on_draw_frame(&self, ctx: &ManipulatorContext<'_>, draws: &mut GizmoDrawList) {
        if !ctx.config.gizmo.enabled {
            return;
        }
        let Some(frame) = self.frame(ctx) else {
            return;
        };
        let origin = frame.w_axis.truncate();
        let highlight = match &self.drag {
            Some(drag) => Axis::ALL[drag.axis_index],
            None => self.selected_axis,
        };
        draws.push(GizmoDraw {
            shape: GizmoShape::RotationRings,
            to_world: frame,
            scale: Self::ring_radius(ctx, origin),
            highlight,
        });
    }

    fn on_selection_change(&mut self, ctx: &ManipulatorContext<'_>) {
        let target = EditTarget::from_selection(ctx.stage, ctx.selection);
        if target != self.target {
            // A drag never carries over to another prim
            self.drag = None;
            self.selected_axis = Axis::None;
        }
        self.target = target;
    }

    fn selected_axis(&self) -> Axis {
        self.selected_axis
    }
}
