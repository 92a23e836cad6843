//! Camera navigation
//!
//! Alt + left drag orbits (pans on orthographic cameras), middle drag pans,
//! right drag zooms. Navigation edits the editable camera; when a stage
//! camera is in use the whole drag is one undoable edit of the camera prim.

use sc_core::Projection;

use super::edit_target::EditSession;
use super::{Manipulator, ManipulatorContext, ManipulatorKind};
use crate::input::MouseButton;

/// Navigation mode of a camera drag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraMotion {
    Orbit,
    Pan,
    Zoom,
}

#[derive(Debug, Default)]
pub struct CameraManipulator {
    motion: Option<CameraMotion>,
    session: EditSession,
}

impl CameraManipulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Motion of the drag in progress
    pub fn motion(&self) -> Option<CameraMotion> {
        self.motion
    }

    fn motion_for(ctx: &ManipulatorContext<'_>) -> Option<CameraMotion> {
        let input = ctx.input;
        let orthographic = ctx.cameras.current_camera().projection == Projection::Orthographic;
        if input.is_down(MouseButton::Right) {
            Some(CameraMotion::Zoom)
        } else if input.is_down(MouseButton::Middle) {
            Some(CameraMotion::Pan)
        } else if input.is_down(MouseButton::Left) && input.modifiers.alt {
            Some(if orthographic { CameraMotion::Pan } else { CameraMotion::Orbit })
        } else {
            None
        }
    }
}

impl Manipulator for CameraManipulator {
    fn kind(&self) -> ManipulatorKind {
        ManipulatorKind::CameraOrbit
    }

    fn is_mouse_over(&mut self, ctx: &ManipulatorContext<'_>) -> bool {
        let input = ctx.input;
        input.modifiers.alt || input.is_down(MouseButton::Middle) || input.is_down(MouseButton::Right)
    }

    fn on_begin_edition(&mut self, ctx: &mut ManipulatorContext<'_>) {
        self.motion = Self::motion_for(ctx);
        if ctx.cameras.is_using_stage_camera() {
            self.session.open(ctx.stage, "Move camera");
        }
    }

    fn on_update(&mut self, ctx: &mut ManipulatorContext<'_>) -> ManipulatorKind {
        let delta = ctx.input.mouse_delta;
        let sensitivity = &ctx.config.camera;
        let up = ctx.stage.up_axis().up_vector();
        match self.motion {
            Some(CameraMotion::Orbit) => ctx.cameras.editable_camera().orbit(
                -delta.x * sensitivity.orbit_sensitivity,
                -delta.y * sensitivity.orbit_sensitivity,
                up,
            ),
            Some(CameraMotion::Pan) => ctx.cameras.editable_camera().pan(delta.x, delta.y),
            Some(CameraMotion::Zoom) => ctx
                .cameras
                .editable_camera()
                .zoom((delta.x + delta.y) * sensitivity.zoom_sensitivity),
            None => {}
        }

        if ctx.input.any_down() && self.motion.is_some() {
            ManipulatorKind::CameraOrbit
        } else {
            ManipulatorKind::MouseHover
        }
    }

    fn on_end_edition(&mut self, ctx: &mut ManipulatorContext<'_>) {
        self.motion = None;
        if self.session.is_open() {
            // Author the last motion inside the transaction
            let aspect = ctx.input.aspect_ratio();
            ctx.cameras.update(ctx.stage, ctx.time, aspect);
        }
        self.session.close(ctx.stage);
    }
}
