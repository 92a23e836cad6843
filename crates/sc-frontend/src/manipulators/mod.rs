//! Viewport manipulators and the state machine that drives them
//!
//! Every manipulator implements [`Manipulator`]. The viewport idles in the
//! mouse-hover state; a mouse press over a manipulator begins an edition and
//! hands every following frame to that manipulator until its
//! [`Manipulator::on_update`] returns another state.

mod camera;
mod edit_target;
mod hover;
mod position;
mod rotation;
mod scale;
mod selection;

pub use camera::{CameraManipulator, CameraMotion};
pub use edit_target::{EditSession, EditTarget, orthonormalize};
pub use hover::MouseHoverManipulator;
pub use position::PositionManipulator;
pub use rotation::RotationManipulator;
pub use scale::ScaleManipulator;
pub use selection::SelectionManipulator;

use glam::{DVec2, DVec3};
use sc_core::{Selection, Stage, TimeCode};
use sc_renderer::{
    Axis, Frustum, GizmoDrawList, IntersectionResult, Ray, RenderEngine, RenderParams,
    RendererConfig,
};
use serde::{Deserialize, Serialize};

use crate::input::{MouseButton, ViewportInput};
use crate::viewport::{compute_scale_factor, picking_boundary_size, test_intersection};
use crate::viewport_cameras::ViewportCameras;

/// The closed set of manipulators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ManipulatorKind {
    #[default]
    Position,
    Rotation,
    Scale,
    Selection,
    CameraOrbit,
    /// Idle state
    MouseHover,
}

impl ManipulatorKind {
    /// Manipulators the user can pick from the toolbar
    pub const CHOOSABLE: [ManipulatorKind; 4] = [
        ManipulatorKind::Position,
        ManipulatorKind::Rotation,
        ManipulatorKind::Scale,
        ManipulatorKind::Selection,
    ];

    /// Listed in [`ManipulatorKind::CHOOSABLE`]
    pub fn is_choosable(&self) -> bool {
        Self::CHOOSABLE.contains(self)
    }

    /// Display name used in log messages
    pub fn name(&self) -> &'static str {
        match self {
            ManipulatorKind::Position => "Translate",
            ManipulatorKind::Rotation => "Rotate",
            ManipulatorKind::Scale => "Scale",
            ManipulatorKind::Selection => "Select",
            ManipulatorKind::CameraOrbit => "Camera",
            ManipulatorKind::MouseHover => "Hover",
        }
    }
}

/// Everything a manipulator may read or edit during one call
pub struct ManipulatorContext<'a> {
    pub stage: &'a mut Stage,
    pub selection: &'a mut Selection,
    pub cameras: &'a mut ViewportCameras,
    pub engine: &'a mut dyn RenderEngine,
    pub input: &'a ViewportInput,
    pub config: &'a RendererConfig,
    pub render_params: &'a RenderParams,
    /// Viewport time code
    pub time: TimeCode,
}

impl ManipulatorContext<'_> {
    pub fn mouse_position(&self) -> DVec2 {
        self.input.mouse_position
    }

    /// Frustum of the conformed viewport camera
    pub fn frustum(&self) -> Frustum {
        self.cameras.viewport_camera().frustum()
    }

    /// World ray under the cursor
    pub fn mouse_ray(&self) -> Ray {
        self.frustum().compute_ray(self.mouse_position())
    }

    /// Gizmo size at `position` for a constant on-screen size
    pub fn compute_scale_factor(&self, position: DVec3, multiplier: f64) -> f64 {
        compute_scale_factor(
            &self.frustum(),
            position,
            self.config.gizmo.screen_fraction,
            multiplier,
        )
    }

    /// Pick the stage around an NDC position
    pub fn test_intersection(&mut self, ndc: DVec2) -> Option<IntersectionResult> {
        let boundary = picking_boundary_size(
            self.config.viewport.picking_boundary_px,
            self.input.viewport_size,
        );
        test_intersection(
            self.stage,
            self.engine,
            self.cameras.viewport_camera(),
            self.render_params,
            ndc,
            boundary,
        )
    }

    /// Left button still held
    pub fn is_dragging(&self) -> bool {
        self.input.is_down(MouseButton::Left) && !self.input.released(MouseButton::Left)
    }
}

/// Contract shared by every manipulator.
///
/// No method fails: an invalid edit target makes hit tests miss and
/// updates do nothing.
pub trait Manipulator {
    fn kind(&self) -> ManipulatorKind;

    /// Hit test under the cursor. Updates the hovered handle; never edits
    /// the stage.
    fn is_mouse_over(&mut self, _ctx: &ManipulatorContext<'_>) -> bool {
        false
    }

    /// Enter the editing state. Called once per drag.
    fn on_begin_edition(&mut self, _ctx: &mut ManipulatorContext<'_>) {}

    /// Called every frame while editing. Returns the next state.
    fn on_update(&mut self, ctx: &mut ManipulatorContext<'_>) -> ManipulatorKind;

    /// Leave the editing state. Always reachable, including on cancel.
    fn on_end_edition(&mut self, _ctx: &mut ManipulatorContext<'_>) {}

    /// Queue the gizmo for this frame
    fn on_draw_frame(&self, _ctx: &ManipulatorContext<'_>, _draws: &mut GizmoDrawList) {}

    /// Refresh cached state after the selection changed
    fn on_selection_change(&mut self, _ctx: &ManipulatorContext<'_>) {}

    /// Handle currently hovered or dragged
    fn selected_axis(&self) -> Axis {
        Axis::None
    }
}

/// All manipulators of a viewport plus the chosen and editing states
pub struct ManipulatorSet {
    position: PositionManipulator,
    rotation: RotationManipulator,
    scale: ScaleManipulator,
    selection: SelectionManipulator,
    camera: CameraManipulator,
    hover: MouseHoverManipulator,
    /// Manipulator chosen by the user
    active: ManipulatorKind,
    /// Manipulator currently driven by the state machine
    editing: ManipulatorKind,
}

impl Default for ManipulatorSet {
    fn default() -> Self {
        Self::new()
    }
}

impl ManipulatorSet {
    /// All manipulators idle, with the default one chosen
    pub fn new() -> Self {
        Self {
            position: PositionManipulator::new(),
            rotation: RotationManipulator::new(),
            scale: ScaleManipulator::new(),
            selection: SelectionManipulator::new(),
            camera: CameraManipulator::new(),
            hover: MouseHoverManipulator,
            active: ManipulatorKind::default(),
            editing: ManipulatorKind::MouseHover,
        }
    }

    /// Manipulator handling `kind`
    pub fn get(&self, kind: ManipulatorKind) -> &dyn Manipulator {
        match kind {
            ManipulatorKind::Position => &self.position,
            ManipulatorKind::Rotation => &self.rotation,
            ManipulatorKind::Scale => &self.scale,
            ManipulatorKind::Selection => &self.selection,
            ManipulatorKind::CameraOrbit => &self.camera,
            ManipulatorKind::MouseHover => &self.hover,
        }
    }

    /// Mutable manipulator handling `kind`
    pub fn get_mut(&mut self, kind: ManipulatorKind) -> &mut dyn Manipulator {
        match kind {
            ManipulatorKind::Position => &mut self.position,
            ManipulatorKind::Rotation => &mut self.rotation,
            ManipulatorKind::Scale => &mut self.scale,
            ManipulatorKind::Selection => &mut self.selection,
            ManipulatorKind::CameraOrbit => &mut self.camera,
            ManipulatorKind::MouseHover => &mut self.hover,
        }
    }

    /// The rotation rings, to query the hovered axis
    pub fn rotation(&self) -> &RotationManipulator {
        &self.rotation
    }

    /// Manipulator chosen from the toolbar
    pub fn active(&self) -> ManipulatorKind {
        self.active
    }

    /// Manipulator receiving events this frame, `MouseHover` when idle
    pub fn editing(&self) -> ManipulatorKind {
        self.editing
    }

    /// An edition is in progress
    pub fn is_editing(&self) -> bool {
        self.editing != ManipulatorKind::MouseHover
    }

    /// Choose the toolbar manipulator. An edition in progress is ended first.
    pub fn choose(&mut self, kind: ManipulatorKind, ctx: &mut ManipulatorContext<'_>) {
        if !kind.is_choosable() {
            tracing::warn!("{} cannot be chosen as the active manipulator", kind.name());
            return;
        }
        if self.active == kind {
            return;
        }
        self.cancel(ctx);
        tracing::debug!("Active manipulator: {}", kind.name());
        self.active = kind;
    }

    /// Force the current edition to end
    pub fn cancel(&mut self, ctx: &mut ManipulatorContext<'_>) {
        if !self.is_editing() {
            return;
        }
        let editing = self.editing;
        tracing::debug!("Cancelling {} edition", editing.name());
        self.get_mut(editing).on_end_edition(ctx);
        self.editing = ManipulatorKind::MouseHover;
    }

    fn begin(&mut self, kind: ManipulatorKind, ctx: &mut ManipulatorContext<'_>) {
        tracing::debug!("Begin {} edition", kind.name());
        self.get_mut(kind).on_begin_edition(ctx);
        self.editing = kind;
    }

    /// Run one frame of the state machine
    pub fn handle_events(&mut self, ctx: &mut ManipulatorContext<'_>) {
        if self.is_editing() {
            let editing = self.editing;
            let next = self.get_mut(editing).on_update(ctx);
            if next != editing {
                tracing::debug!("End {} edition", editing.name());
                self.get_mut(editing).on_end_edition(ctx);
                self.editing = ManipulatorKind::MouseHover;
            }
            return;
        }

        if !ctx.input.hovered {
            return;
        }

        let input = ctx.input;
        let navigating = self.camera.is_mouse_over(ctx);
        if navigating
            && (input.pressed(MouseButton::Left)
                || input.pressed(MouseButton::Middle)
                || input.pressed(MouseButton::Right))
        {
            self.begin(ManipulatorKind::CameraOrbit, ctx);
            return;
        }
        if input.scroll != 0.0 {
            let amount = input.scroll * ctx.config.camera.scroll_sensitivity;
            ctx.cameras.editable_camera().zoom(amount);
        }
        if navigating {
            return;
        }

        let active = self.active;
        let over_active = self.get_mut(active).is_mouse_over(ctx);
        if input.pressed(MouseButton::Left) {
            if over_active {
                self.begin(active, ctx);
            } else if self.selection.is_mouse_over(ctx) {
                self.begin(ManipulatorKind::Selection, ctx);
            }
        }
    }

    /// Tell every manipulator the selection changed
    pub fn broadcast_selection_change(&mut self, ctx: &ManipulatorContext<'_>) {
        self.position.on_selection_change(ctx);
        self.rotation.on_selection_change(ctx);
        self.scale.on_selection_change(ctx);
        self.selection.on_selection_change(ctx);
        self.camera.on_selection_change(ctx);
        self.hover.on_selection_change(ctx);
    }

    /// Queue the gizmo of the chosen manipulator
    pub fn draw(&self, ctx: &ManipulatorContext<'_>, draws: &mut GizmoDrawList) {
        self.get(self.active).on_draw_frame(ctx, draws);
    }
}
