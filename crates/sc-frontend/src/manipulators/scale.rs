//! Scale manipulator
//!
//! Three handles along the prim's rotated axes. Dragging a handle scales
//! that axis by the ratio of the cursor's current to initial distance along
//! the handle line.

use glam::{DMat4, DVec3};
use sc_core::XformOp;
use sc_renderer::{Axis, GizmoDraw, GizmoDrawList, GizmoShape, ray_sphere_intersection};

use super::edit_target::{EditSession, EditTarget};
use super::position::{AxisLine, pick_shaft};
use super::{Manipulator, ManipulatorContext, ManipulatorKind};

/// Smallest ratio applied to a scale component
const MIN_SCALE_RATIO: f64 = 1e-6;

#[derive(Debug, Clone)]
struct ScaleDrag {
    axis_index: usize,
    line: AxisLine,
    start_parameter: f64,
    scale_on_begin: DVec3,
    last: DVec3,
}

#[derive(Debug, Default)]
pub struct ScaleManipulator {
    target: EditTarget,
    selected_axis: Axis,
    drag: Option<ScaleDrag>,
    session: EditSession,
}

impl ScaleManipulator {
    pub fn new() -> Self {
        Self::default()
    }

    fn frame(&self, ctx: &ManipulatorContext<'_>) -> Option<DMat4> {
        self.target.manipulator_to_world(ctx.stage, ctx.time, true)
    }

    fn handle_scale(ctx: &ManipulatorContext<'_>, origin: DVec3) -> f64 {
        ctx.compute_scale_factor(origin, ctx.config.gizmo.axis_size)
    }

    /// Handle under the cursor: tip cubes first, then shafts
    fn pick(ctx: &ManipulatorContext<'_>, frame: &DMat4) -> Axis {
        let origin = frame.w_axis.truncate();
        let scale = Self::handle_scale(ctx, origin);
        if scale <= 0.0 {
            return Axis::None;
        }
        let radius = scale * ctx.config.gizmo.handle_radius;
        let ray = ctx.mouse_ray();

        let mut best = (f64::INFINITY, Axis::None);
        for axis in Axis::ALL {
            let Some(index) = axis.index() else { continue };
            let line = AxisLine::from_frame(frame, index);
            let tip = line.origin + line.direction * scale;
            if let Some(t) = ray_sphere_intersection(&ray, tip, radius * 1.5) {
                if t < best.0 {
                    best = (t, axis);
                }
            }
        }
        if best.1 != Axis::None {
            return best.1;
        }
        pick_shaft(&ray, frame, scale, radius)
    }
}

impl Manipulator for ScaleManipulator {
    fn kind(&self) -> ManipulatorKind {
        ManipulatorKind::Scale
    }

    fn is_mouse_over(&mut self, ctx: &ManipulatorContext<'_>) -> bool {
        self.selected_axis = match self.frame(ctx) {
            Some(frame) => Self::pick(ctx, &frame),
            None => Axis::None,
        };
        self.selected_axis != Axis::None
    }

    fn on_begin_edition(&mut self, ctx: &mut ManipulatorContext<'_>) {
        self.session.open(ctx.stage, "Scale");
        self.drag = None;

        let Some(axis_index) = self.selected_axis.index() else {
            return;
        };
        let (Some(frame), Some(transform)) = (self.frame(ctx), self.target.transform(ctx.stage, ctx.time)) else {
            return;
        };
        let line = AxisLine::from_frame(&frame, axis_index);
        let start_parameter = match line.parameter(&ctx.mouse_ray()) {
            Some(s) if s.abs() > f64::EPSILON => s,
            _ => {
                tracing::debug!("Scale handle grabbed at the pivot, drag ignored");
                return;
            }
        };
        self.drag = Some(ScaleDrag {
            axis_index,
            line,
            start_parameter,
            scale_on_begin: transform.scale,
            last: transform.scale,
        });
    }

    fn on_update(&mut self, ctx: &mut ManipulatorContext<'_>) -> ManipulatorKind {
        if let Some(drag) = self.drag.as_mut() {
            let ratio = drag
                .line
                .parameter(&ctx.mouse_ray())
                .map(|s| s / drag.start_parameter)
                .filter(|ratio| ratio.is_finite() && ratio.abs() > MIN_SCALE_RATIO);
            if let Some(ratio) = ratio {
                if self.target.is_valid(ctx.stage) {
                    let mut scale = drag.scale_on_begin;
                    scale[drag.axis_index] *= ratio;
                    if scale != drag.last {
                        self.target.write(ctx.stage, XformOp::Scale, scale, ctx.time);
                        drag.last = scale;
                    }
                }
            }
        }

        if ctx.is_dragging() {
            ManipulatorKind::Scale
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
            shape: GizmoShape::ScaleHandles,
            to_world: frame,
            scale: Self::handle_scale(ctx, frame.w_axis.truncate()),
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
