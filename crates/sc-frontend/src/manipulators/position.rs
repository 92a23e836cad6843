//! Translation manipulator
//!
//! Three arrows aligned with the parent frame. Dragging an arrow moves the
//! prim along that axis by the distance the cursor travels along the line.

use glam::{DMat4, DVec3};
use sc_core::XformOp;
use sc_renderer::{Axis, GizmoDraw, GizmoDrawList, GizmoShape, Ray, ray_cylinder_intersection};

use super::edit_target::{EditSession, EditTarget};
use super::{Manipulator, ManipulatorContext, ManipulatorKind};

/// Infinite line through a handle, used to turn cursor motion into a
/// distance along an axis
#[derive(Debug, Clone, Copy)]
pub(super) struct AxisLine {
    pub origin: DVec3,
    pub direction: DVec3,
}

impl AxisLine {
    pub fn from_frame(frame: &DMat4, axis_index: usize) -> Self {
        Self {
            origin: frame.w_axis.truncate(),
            direction: frame.col(axis_index).truncate().normalize_or_zero(),
        }
    }

    /// Distance along the line of the point closest to `ray`
    pub fn parameter(&self, ray: &Ray) -> Option<f64> {
        ray.closest_point_on_line(self.origin, self.direction)
            .filter(|s| s.is_finite())
    }
}

/// Closest handle shaft hit by `ray`, testing each axis of `frame`
pub(super) fn pick_shaft(ray: &Ray, frame: &DMat4, length: f64, radius: f64) -> Axis {
    let mut best = (f64::INFINITY, Axis::None);
    for axis in Axis::ALL {
        let Some(index) = axis.index() else { continue };
        let line = AxisLine::from_frame(frame, index);
        let end = line.origin + line.direction * length;
        if let Some(t) = ray_cylinder_intersection(ray, line.origin, end, radius) {
            if t < best.0 {
                best = (t, axis);
            }
        }
    }
    best.1
}

#[derive(Debug, Clone)]
struct TranslateDrag {
    line: AxisLine,
    start_parameter: f64,
    translate_on_begin: DVec3,
    world_to_parent: DMat4,
    last: DVec3,
}

#[derive(Debug, Default)]
pub struct PositionManipulator {
    target: EditTarget,
    selected_axis: Axis,
    drag: Option<TranslateDrag>,
    session: EditSession,
}

impl PositionManipulator {
    pub fn new() -> Self {
        Self::default()
    }

    fn frame(&self, ctx: &ManipulatorContext<'_>) -> Option<DMat4> {
        self.target.manipulator_to_world(ctx.stage, ctx.time, false)
    }

    fn arrow_scale(ctx: &ManipulatorContext<'_>, origin: DVec3) -> f64 {
        ctx.compute_scale_factor(origin, ctx.config.gizmo.axis_size)
    }
}

impl Manipulator for PositionManipulator {
    fn kind(&self) -> ManipulatorKind {
        ManipulatorKind::Position
    }

    fn is_mouse_over(&mut self, ctx: &ManipulatorContext<'_>) -> bool {
        self.selected_axis = Axis::None;
        let Some(frame) = self.frame(ctx) else {
            return false;
        };
        let scale = Self::arrow_scale(ctx, frame.w_axis.truncate());
        if scale <= 0.0 {
            return false;
        }
        self.selected_axis = pick_shaft(
            &ctx.mouse_ray(),
            &frame,
            scale,
            scale * ctx.config.gizmo.handle_radius,
        );
        self.selected_axis != Axis::None
    }

    fn on_begin_edition(&mut self, ctx: &mut ManipulatorContext<'_>) {
        self.session.open(ctx.stage, "Translate");
        self.drag = None;

        let Some(index) = self.selected_axis.index() else {
            return;
        };
        let (Some(frame), Some(transform), Some(parent)) = (
            self.frame(ctx),
            self.target.transform(ctx.stage, ctx.time),
            self.target.parent_to_world(ctx.stage, ctx.time),
        ) else {
            return;
        };
        let line = AxisLine::from_frame(&frame, index);
        let Some(start_parameter) = line.parameter(&ctx.mouse_ray()) else {
            tracing::debug!("Translate axis is parallel to the view, drag ignored");
            return;
        };
        self.drag = Some(TranslateDrag {
            line,
            start_parameter,
            translate_on_begin: transform.translation,
            world_to_parent: parent.inverse(),
            last: transform.translation,
        });
    }

    fn on_update(&mut self, ctx: &mut ManipulatorContext<'_>) -> ManipulatorKind {
        if let Some(drag) = self.drag.as_mut() {
            let parameter = drag.line.parameter(&ctx.mouse_ray());
            if let (Some(parameter), true) = (parameter, self.target.is_valid(ctx.stage)) {
                let world_delta = drag.line.direction * (parameter - drag.start_parameter);
                let translate = drag.translate_on_begin + drag.world_to_parent.transform_vector3(world_delta);
                if translate.is_finite() && translate != drag.last {
                    self.target.write(ctx.stage, XformOp::Translate, translate, ctx.time);
                    drag.last = translate;
                }
            }
        }

        if ctx.is_dragging() {
            ManipulatorKind::Position
        } else {
            ManipulatorKind::MouseHover
        }
    }

    fn on_end_edition(&mut self, ctx: &mut ManipulatorContext<'_>) {
        self.drag = None;
        self.session.close(ctx.stage);
    }

    fn on_draw_frame(&self, ctx: &ManipulatorContext<'_>, draws: &mut GizmoDrawList) {
        if !ctx.config.gizmo.enabled {
            return;
        }
        let Some(frame) = self.frame(ctx) else {
            return;
        };
        draws.push(GizmoDraw {
            shape: GizmoShape::TranslationArrows,
            to_world: frame,
            scale: Self::arrow_scale(ctx, frame.w_axis.truncate()),
            highlight: self.selected_axis,
        });
    }

    fn on_selection_change(&mut self, ctx: &ManipulatorContext<'_>) {
        let target = EditTarget::from_selection(ctx.stage, ctx.selection);
        if target != self.target {
            self.drag = None;
            self.selected_axis = Axis::None;
        }
        self.target = target;
    }

    fn selected_axis(&self) -> Axis {
        self.selected_axis
    }
}
