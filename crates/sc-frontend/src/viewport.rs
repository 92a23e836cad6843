//! Viewport controller
//!
//! Owns the cameras, the manipulators and the render engine of one viewport.
//! Every frame [`Viewport::update`] feeds the input snapshot through the
//! manipulator state machine, then [`Viewport::render`] asks the engine for
//! a new image when anything it depends on changed.

use std::sync::Arc;

use glam::{DMat4, DVec2, DVec3};
use parking_lot::Mutex;
use sc_core::{PrimPath, Projection, SceneError, Selection, SelectionHash, Stage, TimeCode};
use sc_renderer::{
    Camera, Frustum, GizmoDrawList, ImagingSettings, IntersectionResult, OrthoView, PhysicsSettings,
    PickParams, RenderEngine, RenderParams, RendererConfig, SimulationEngine,
};

use crate::input::{Key, ViewportInput};
use crate::manipulators::{ManipulatorContext, ManipulatorKind, ManipulatorSet};
use crate::settings::ViewportSettings;
use crate::viewport_cameras::{ViewportCameras, camera_prim_from};

pub type SharedStage = Arc<Mutex<Stage>>;
pub type SharedSelection = Arc<Mutex<Selection>>;

/// Scale that keeps a unit gizmo at `position` the same size on screen.
///
/// Perspective cameras scale with the depth of the point; a point at or
/// behind the eye gets 0. Orthographic cameras scale with the window height.
pub fn compute_scale_factor(frustum: &Frustum, position: DVec3, screen_fraction: f64, multiplier: f64) -> f64 {
    let window_height = frustum.window_height();
    match frustum.kind {
        Projection::Perspective => {
            let depth = frustum.depth_of(position);
            if depth <= 0.0 {
                return 0.0;
            }
            depth * window_height * screen_fraction * multiplier
        }
        Projection::Orthographic => window_height * screen_fraction * multiplier,
    }
}

/// Half size in NDC of a square pick region `pixels` wide
pub fn picking_boundary_size(pixels: f64, viewport_size: DVec2) -> DVec2 {
    let size = viewport_size.max(DVec2::ONE);
    DVec2::new(pixels / size.x, pixels / size.y)
}

/// Nearest prim under `ndc`, picked through a frustum narrowed to
/// `boundary` around the click
pub fn test_intersection(
    stage: &Stage,
    engine: &mut dyn RenderEngine,
    camera: &Camera,
    params: &RenderParams,
    ndc: DVec2,
    boundary: DVec2,
) -> Option<IntersectionResult> {
    let frustum = camera.frustum().narrowed(ndc, boundary);
    engine
        .test_intersection(
            stage,
            &PickParams::default(),
            &frustum.view,
            &frustum.projection,
            &PrimPath::root(),
            params,
        )
        .into_iter()
        .next()
}

/// Everything the last render depended on
#[derive(Debug, Clone, PartialEq)]
struct RenderSnapshot {
    params: RenderParams,
    view: DMat4,
    projection: DMat4,
    buffer_size: (u32, u32),
    revision: u64,
    selection: SelectionHash,
}

macro_rules! manipulator_context {
    ($viewport:ident, $stage:expr, $selection:expr) => {
        ManipulatorContext {
            stage: &mut *$stage,
            selection: &mut *$selection,
            cameras: &mut $viewport.cameras,
            engine: $viewport.engine.as_mut(),
            input: &$viewport.input,
            config: &$viewport.config,
            render_params: &$viewport.imaging.render,
            time: $viewport.time,
        }
    };
}

pub struct Viewport {
    stage: SharedStage,
    selection: SharedSelection,
    last_selection_hash: Option<SelectionHash>,
    cameras: ViewportCameras,
    manipulators: ManipulatorSet,
    engine: Box<dyn RenderEngine>,
    simulation: Option<Box<dyn SimulationEngine>>,
    imaging: ImagingSettings,
    physics: PhysicsSettings,
    synced_physics: Option<PhysicsSettings>,
    config: RendererConfig,
    input: ViewportInput,
    time: TimeCode,
    last_render: Option<RenderSnapshot>,
    draws: GizmoDrawList,
}

impl Viewport {
    pub fn new(stage: SharedStage, selection: SharedSelection, engine: Box<dyn RenderEngine>) -> Self {
        let up_axis = stage.lock().up_axis();
        let config = RendererConfig::default();
        let mut cameras = ViewportCameras::new(up_axis);
        cameras.set_conform_policy(config.camera.conform_policy);
        tracing::info!("Viewport created with the {} engine", engine.renderer_name());
        Self {
            stage,
            selection,
            last_selection_hash: None,
            cameras,
            manipulators: ManipulatorSet::new(),
            engine,
            simulation: None,
            imaging: ImagingSettings::default(),
            physics: PhysicsSettings::default(),
            synced_physics: None,
            config,
            input: ViewportInput::default(),
            time: TimeCode::Default,
            last_render: None,
            draws: GizmoDrawList::new(),
        }
    }

    /// Attach the physics collaborator that receives visualization toggles
    pub fn with_simulation(mut self, simulation: Box<dyn SimulationEngine>) -> Self {
        self.simulation = Some(simulation);
        self.synced_physics = None;
        self
    }

    pub fn stage(&self) -> &SharedStage {
        &self.stage
    }

    pub fn selection(&self) -> &SharedSelection {
        &self.selection
    }

    pub fn cameras(&self) -> &ViewportCameras {
        &self.cameras
    }

    pub fn cameras_mut(&mut self) -> &mut ViewportCameras {
        &mut self.cameras
    }

    pub fn manipulators(&self) -> &ManipulatorSet {
        &self.manipulators
    }

    pub fn active_manipulator(&self) -> ManipulatorKind {
        self.manipulators.active()
    }

    /// State of the manipulator state machine
    pub fn editing_state(&self) -> ManipulatorKind {
        self.manipulators.editing()
    }

    pub fn engine(&self) -> &dyn RenderEngine {
        self.engine.as_ref()
    }

    pub fn engine_mut(&mut self) -> &mut dyn RenderEngine {
        self.engine.as_mut()
    }

    pub fn input(&self) -> &ViewportInput {
        &self.input
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: RendererConfig) {
        self.cameras.set_conform_policy(config.camera.conform_policy);
        self.config = config;
    }

    pub fn imaging(&self) -> &ImagingSettings {
        &self.imaging
    }

    pub fn imaging_mut(&mut self) -> &mut ImagingSettings {
        &mut self.imaging
    }

    pub fn physics(&self) -> &PhysicsSettings {
        &self.physics
    }

    pub fn physics_mut(&mut self) -> &mut PhysicsSettings {
        &mut self.physics
    }

    pub fn current_time(&self) -> TimeCode {
        self.time
    }

    /// Set the time read and written by the viewport. NaN and infinite
    /// frames fall back to the default time.
    pub fn set_current_time(&mut self, time: TimeCode) {
        let time = match time.finite() {
            TimeCode::Default if !time.is_default() => {
                tracing::warn!("Ignoring non-finite frame {}, using the default time", time);
                TimeCode::Default
            }
            finite => finite,
        };
        self.time = time;
        self.imaging.render.frame = time;
    }

    /// Gizmos queued by the last update
    pub fn draw_list(&self) -> &GizmoDrawList {
        &self.draws
    }

    /// Apply stored settings; ends any edition in progress
    pub fn apply_settings(&mut self, settings: &ViewportSettings) {
        self.cancel_edition();
        self.imaging = settings.imaging.clone();
        self.imaging.render.frame = self.time;
        self.physics = settings.physics.clone();
        self.set_config(settings.renderer.clone());
        self.choose_manipulator(settings.default_manipulator);
    }

    /// Settings reflecting the current viewport state
    pub fn settings(&self) -> ViewportSettings {
        ViewportSettings {
            imaging: self.imaging.clone(),
            renderer: self.config.clone(),
            physics: self.physics.clone(),
            default_manipulator: self.manipulators.active(),
        }
    }

    // ============== Frame update ==============

    /// Process one frame of input
    pub fn update(&mut self, input: ViewportInput) {
        self.input = input;
        let aspect = self.input.aspect_ratio();
        let shared_stage = Arc::clone(&self.stage);
        let shared_selection = Arc::clone(&self.selection);
        let mut stage_guard = shared_stage.lock();
        let mut selection_guard = shared_selection.lock();
        let stage: &mut Stage = &mut stage_guard;
        let selection: &mut Selection = &mut selection_guard;

        self.cameras.update(stage, self.time, aspect);
        self.sync_selection(stage, selection);

        if !self.input.focused && self.manipulators.is_editing() {
            tracing::debug!("Viewport lost focus");
            let mut ctx = manipulator_context!(self, stage, selection);
            self.manipulators.cancel(&mut ctx);
        }

        self.handle_keyboard_shortcuts(stage, selection);

        {
            let mut ctx = manipulator_context!(self, stage, selection);
            self.manipulators.handle_events(&mut ctx);
        }

        self.sync_selection(stage, selection);
        self.cameras.update(stage, self.time, aspect);
        self.sync_physics();

        self.draws.clear();
        if self.imaging.show_gizmos {
            let ctx = manipulator_context!(self, stage, selection);
            self.manipulators.draw(&ctx, &mut self.draws);
        }
    }

    /// Broadcast a selection change to the engine and every manipulator
    fn sync_selection(&mut self, stage: &mut Stage, selection: &mut Selection) {
        let hash = selection.hash();
        if self.last_selection_hash == Some(hash) {
            return;
        }
        self.last_selection_hash = Some(hash);
        tracing::debug!("Selection changed ({} items)", selection.len());
        self.engine.set_selected(&selection.paths());
        let ctx = manipulator_context!(self, stage, selection);
        self.manipulators.broadcast_selection_change(&ctx);
    }

    fn sync_physics(&mut self) {
        let Some(simulation) = self.simulation.as_mut() else {
            return;
        };
        if self.synced_physics.as_ref() == Some(&self.physics) {
            return;
        }
        self.physics.sync(simulation.as_mut());
        self.synced_physics = Some(self.physics.clone());
    }

    fn handle_keyboard_shortcuts(&mut self, stage: &mut Stage, selection: &mut Selection) {
        if self.input.keys_pressed.is_empty() {
            return;
        }
        let modifiers = self.input.modifiers;
        let keys = self.input.keys_pressed.clone();
        for key in keys {
            match key {
                Key::Escape => {
                    let mut ctx = manipulator_context!(self, stage, selection);
                    self.manipulators.cancel(&mut ctx);
                }
                Key::Z if modifiers.ctrl => {
                    if self.manipulators.is_editing() {
                        continue;
                    }
                    let applied = if modifiers.shift { stage.redo() } else { stage.undo() };
                    if !applied {
                        tracing::debug!("Nothing to {}", if modifiers.shift { "redo" } else { "undo" });
                    }
                }
                _ if modifiers.ctrl => {}
                Key::W | Key::E | Key::R | Key::Q => {
                    let kind = match key {
                        Key::W => ManipulatorKind::Position,
                        Key::E => ManipulatorKind::Rotation,
                        Key::R => ManipulatorKind::Scale,
                        _ => ManipulatorKind::Selection,
                    };
                    let mut ctx = manipulator_context!(self, stage, selection);
                    self.manipulators.choose(kind, &mut ctx);
                }
                Key::F => self.cameras.frame_selection(stage, selection, self.time),
                Key::A => self.cameras.frame_root(stage, self.time),
                Key::Z => {}
            }
        }
    }

    // ============== Render ==============

    /// Render if the parameters, camera, stage or selection changed since the
    /// last render, or the engine asked for another pass. Returns true when
    /// a render was issued.
    pub fn render(&mut self) -> bool {
        let stage = self.stage.lock();
        let camera = self.cameras.viewport_camera();
        let size = self.input.viewport_size;
        let snapshot = RenderSnapshot {
            params: self.imaging.render.clone(),
            view: camera.view_matrix(),
            projection: camera.projection_matrix(),
            buffer_size: (size.x.max(1.0) as u32, size.y.max(1.0) as u32),
            revision: stage.revision(),
            selection: self.last_selection_hash.unwrap_or_default(),
        };

        let async_update = self.engine.poll_for_asynchronous_updates(&stage);
        let unchanged = self.last_render.as_ref() == Some(&snapshot);
        if unchanged && !async_update && self.engine.is_converged() {
            return false;
        }

        self.engine.set_camera_state(&snapshot.view, &snapshot.projection);
        self.engine
            .set_render_buffer_size(snapshot.buffer_size.0, snapshot.buffer_size.1);
        self.engine.render(&stage, &PrimPath::root(), &snapshot.params);
        self.last_render = Some(snapshot);
        true
    }

    // ============== Manipulators ==============

    pub fn choose_manipulator(&mut self, kind: ManipulatorKind) {
        let shared_stage = Arc::clone(&self.stage);
        let shared_selection = Arc::clone(&self.selection);
        let mut stage = shared_stage.lock();
        let mut selection = shared_selection.lock();
        let mut ctx = manipulator_context!(self, stage, selection);
        self.manipulators.choose(kind, &mut ctx);
    }

    /// End the edition in progress, closing its transaction
    pub fn cancel_edition(&mut self) {
        if !self.manipulators.is_editing() {
            return;
        }
        let shared_stage = Arc::clone(&self.stage);
        let shared_selection = Arc::clone(&self.selection);
        let mut stage = shared_stage.lock();
        let mut selection = shared_selection.lock();
        let mut ctx = manipulator_context!(self, stage, selection);
        self.manipulators.cancel(&mut ctx);
    }

    // ============== Picking and sizing ==============

    /// Gizmo scale at `position` for the current viewport camera
    pub fn compute_scale_factor(&self, position: DVec3, multiplier: f64) -> f64 {
        compute_scale_factor(
            &self.cameras.viewport_camera().frustum(),
            position,
            self.config.gizmo.screen_fraction,
            multiplier,
        )
    }

    /// Half size of the pick region in NDC
    pub fn picking_boundary_size(&self) -> DVec2 {
        picking_boundary_size(self.config.viewport.picking_boundary_px, self.input.viewport_size)
    }

    /// Prim under an NDC position
    pub fn test_intersection(&mut self, ndc: DVec2) -> Option<IntersectionResult> {
        let boundary = self.picking_boundary_size();
        let stage = self.stage.lock();
        test_intersection(
            &stage,
            self.engine.as_mut(),
            self.cameras.viewport_camera(),
            &self.imaging.render,
            ndc,
            boundary,
        )
    }

    // ============== Cameras ==============

    pub fn frame_camera_on_selection(&mut self) {
        let stage = self.stage.lock();
        let selection = self.selection.lock();
        self.cameras.frame_selection(&stage, &selection, self.time);
    }

    pub fn frame_camera_on_root_prim(&mut self) {
        let stage = self.stage.lock();
        self.cameras.frame_root(&stage, self.time);
    }

    pub fn frame_all_cameras(&mut self) {
        let stage = self.stage.lock();
        self.cameras.frame_all_cameras(&stage, self.time);
    }

    pub fn use_perspective_camera(&mut self) {
        self.cameras.use_perspective_camera();
    }

    pub fn use_ortho_camera(&mut self, view: OrthoView) {
        self.cameras.use_ortho_camera(view);
    }

    /// Look through a camera prim. Returns false when `path` is not a camera.
    pub fn use_stage_camera(&mut self, path: &PrimPath) -> bool {
        let stage = self.stage.lock();
        self.cameras.use_stage_camera(&stage, path, self.time)
    }

    /// Define a camera prim at `path` placed like the current view and look
    /// through it
    pub fn create_camera_from_view(&mut self, path: PrimPath) -> Result<(), SceneError> {
        let prim = camera_prim_from(self.cameras.current_camera()).ok_or_else(|| SceneError::NonFinite(path.clone()))?;
        let mut stage = self.stage.lock();
        stage.define_prim(path.clone(), prim)?;
        tracing::info!("Created camera {} from the current view", path);
        self.cameras.use_stage_camera(&stage, &path, self.time);
        Ok(())
    }

    // ============== History ==============

    /// Undo the last edit. Ignored while a manipulator is editing.
    pub fn undo(&mut self) -> bool {
        if self.manipulators.is_editing() {
            return false;
        }
        self.stage.lock().undo()
    }

    pub fn redo(&mut self) -> bool {
        if self.manipulators.is_editing() {
            return false;
        }
        self.stage.lock().redo()
    }

    /// Replace the stage, resetting cameras and manipulators
    pub fn set_stage(&mut self, stage: Stage) {
        self.cancel_edition();
        let up_axis = stage.up_axis();
        *self.stage.lock() = stage;
        self.selection.lock().clear();
        self.cameras.reset(up_axis);
        self.last_selection_hash = None;
        self.last_render = None;
        tracing::info!("Stage replaced");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use sc_core::{Prim, SelectionItem, Transform};
    use sc_renderer::HeadlessEngine;

    use crate::input::{InputEvent, InputState, MouseButton};

    fn path(s: &str) -> PrimPath {
        PrimPath::new(s).unwrap()
    }

    fn viewport() -> Viewport {
        let mut stage = Stage::new();
        stage
            .define_prim(
                path("/Box"),
                Prim::cube(1.0).with_transform(Transform::from_translation(DVec3::new(3.0, 0.0, 0.0))),
            )
            .unwrap();
        Viewport::new(
            Arc::new(Mutex::new(stage)),
            Arc::new(Mutex::new(Selection::new())),
            Box::new(HeadlessEngine::new()),
        )
    }

    #[test]
    fn test_scale_factor_follows_depth() {
        let view = DMat4::look_at_rh(DVec3::new(0.0, 0.0, 10.0), DVec3::ZERO, DVec3::Y);
        let projection = DMat4::perspective_rh(60f64.to_radians(), 1.0, 0.1, 1000.0);
        let frustum = Frustum::new(view, projection, Projection::Perspective);
        let near = compute_scale_factor(&frustum, DVec3::new(0.0, 0.0, 5.0), 0.1, 1.0);
        let far = compute_scale_factor(&frustum, DVec3::new(0.0, 0.0, 0.0), 0.1, 1.0);
        assert_relative_eq!(far / near, 2.0, epsilon = 1e-12);
        assert_eq!(compute_scale_factor(&frustum, DVec3::new(0.0, 0.0, 20.0), 0.1, 1.0), 0.0);
    }

    #[test]
    fn test_orthographic_scale_factor_ignores_depth() {
        let view = DMat4::look_at_rh(DVec3::new(0.0, 0.0, 10.0), DVec3::ZERO, DVec3::Y);
        let projection = DMat4::orthographic_rh(-5.0, 5.0, -5.0, 5.0, 0.1, 100.0);
        let frustum = Frustum::new(view, projection, Projection::Orthographic);
        let near = compute_scale_factor(&frustum, DVec3::new(0.0, 0.0, 5.0), 0.1, 1.0);
        let far = compute_scale_factor(&frustum, DVec3::new(2.0, 1.0, -50.0), 0.1, 1.0);
        assert_relative_eq!(near, 1.0, epsilon = 1e-12);
        assert_relative_eq!(far, near, epsilon = 1e-12);
        // Behind the eye still sized
        assert_relative_eq!(compute_scale_factor(&frustum, DVec3::new(0.0, 0.0, 20.0), 0.1, 2.0), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_picking_boundary_is_pixel_sized() {
        let size = picking_boundary_size(5.0, DVec2::new(500.0, 250.0));
        assert_relative_eq!(size.x, 0.01);
        assert_relative_eq!(size.y, 0.02);
    }

    #[test]
    fn test_render_only_when_something_changed() {
        let mut viewport = viewport();
        viewport.update(ViewportInput::default());
        assert!(viewport.render());
        assert!(!viewport.render());

        viewport.imaging_mut().render.complexity = 1.1;
        assert!(viewport.render());
        assert!(!viewport.render());

        viewport.frame_camera_on_root_prim();
        viewport.update(ViewportInput::default());
        assert!(viewport.render());
    }

    #[test]
    fn test_selection_from_click() {
        let mut viewport = viewport();
        viewport.update(ViewportInput::default());
        viewport.frame_camera_on_root_prim();
        viewport.choose_manipulator(ManipulatorKind::Selection);
        viewport.update(ViewportInput::default());

        let target = viewport
            .cameras()
            .viewport_camera()
            .frustum()
            .project(DVec3::new(3.0, 0.0, 0.0))
            .unwrap();
        let mut input = InputState::new();
        input.apply(&InputEvent::MoveTo(target.x, target.y));
        input.apply(&InputEvent::Press(MouseButton::Left));
        viewport.update(input.snapshot());
        assert_eq!(viewport.editing_state(), ManipulatorKind::Selection);
        assert!(
            viewport
                .selection()
                .lock()
                .contains(&SelectionItem::prim(path("/Box")))
        );

        input.apply(&InputEvent::Release(MouseButton::Left));
        viewport.update(input.snapshot());
        assert_eq!(viewport.editing_state(), ManipulatorKind::MouseHover);
    }

    #[test]
    fn test_set_stage_resets_selection() {
        let mut viewport = viewport();
        viewport.selection().lock().add(SelectionItem::prim(path("/Box")));
        viewport.update(ViewportInput::default());
        assert!(viewport.render());

        viewport.set_stage(Stage::new());
        assert!(viewport.selection().lock().is_empty());
        assert!(viewport.stage().lock().is_empty());
        viewport.update(ViewportInput::default());
        assert!(viewport.render());
    }

    #[test]
    fn test_non_finite_time_falls_back_to_default() {
        let mut viewport = viewport();
        viewport.set_current_time(TimeCode::Frame(12.0));
        assert_eq!(viewport.current_time(), TimeCode::Frame(12.0));

        viewport.set_current_time(TimeCode::Frame(f64::NAN));
        assert_eq!(viewport.current_time(), TimeCode::Default);
        assert_eq!(viewport.imaging_mut().render.frame, TimeCode::Default);
        viewport.update(ViewportInput::default());
        assert!(viewport.render());
    }
}
