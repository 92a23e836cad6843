//! Viewport driven by scripted input

#![allow(dead_code)]

use std::sync::Arc;

use glam::DVec3;
use parking_lot::Mutex;
use sc_core::{CameraParams, Prim, PrimPath, Selection, SelectionItem, Stage, TimeCode, Transform};
use sc_frontend::{InputEvent, InputState, Modifiers, MouseButton, Viewport};
use sc_renderer::HeadlessEngine;

pub fn path(s: &str) -> PrimPath {
    PrimPath::new(s).unwrap()
}

/// `/World/Box`, a unit cube at the origin, and `/World/Cam` on +Z
pub fn test_stage() -> Stage {
    let mut stage = Stage::new();
    stage.define_prim(path("/World"), Prim::xform()).unwrap();
    stage.define_prim(path("/World/Box"), Prim::cube(1.0)).unwrap();
    stage
        .define_prim(
            path("/World/Cam"),
            Prim::camera(CameraParams {
                focus_distance: 10.0,
                ..CameraParams::default()
            })
            .with_transform(Transform::from_translation(DVec3::new(0.0, 0.0, 10.0))),
        )
        .unwrap();
    stage
}

pub struct Harness {
    pub viewport: Viewport,
    pub input: InputState,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_stage(test_stage())
    }

    pub fn with_stage(stage: Stage) -> Self {
        let viewport = Viewport::new(
            Arc::new(Mutex::new(stage)),
            Arc::new(Mutex::new(Selection::new())),
            Box::new(HeadlessEngine::new()),
        );
        let mut harness = Self {
            viewport,
            input: InputState::new(),
        };
        harness.frame();
        harness
    }

    /// Run one frame with the queued events
    pub fn frame(&mut self) {
        self.viewport.update(self.input.snapshot());
    }

    /// Point the internal camera at the origin from `eye`
    pub fn look_from(&mut self, eye: DVec3, up: DVec3) {
        self.viewport
            .cameras_mut()
            .editable_camera()
            .look_at(eye, DVec3::ZERO, up);
        self.frame();
    }

    pub fn select(&mut self, s: &str) {
        self.viewport
            .selection()
            .lock()
            .replace(SelectionItem::prim(path(s)));
        self.frame();
    }

    /// NDC position of a world point in the viewport camera
    pub fn ndc(&self, world: DVec3) -> (f64, f64) {
        let ndc = self
            .viewport
            .cameras()
            .viewport_camera()
            .frustum()
            .project(world)
            .unwrap();
        (ndc.x, ndc.y)
    }

    /// Gizmo size at the origin
    pub fn gizmo_scale(&self) -> f64 {
        self.viewport
            .compute_scale_factor(DVec3::ZERO, self.viewport.config().gizmo.axis_size)
    }

    pub fn move_to(&mut self, world: DVec3) {
        let (x, y) = self.ndc(world);
        self.input.apply(&InputEvent::MoveTo(x, y));
        self.frame();
    }

    pub fn press_at(&mut self, world: DVec3, button: MouseButton) {
        let (x, y) = self.ndc(world);
        self.input.apply(&InputEvent::MoveTo(x, y));
        self.input.apply(&InputEvent::Press(button));
        self.frame();
    }

    pub fn release(&mut self, button: MouseButton) {
        self.input.apply(&InputEvent::Release(button));
        self.frame();
    }

    /// Press at `from`, move through `path`, release
    pub fn drag(&mut self, from: DVec3, path: &[DVec3]) {
        self.press_at(from, MouseButton::Left);
        for point in path {
            self.move_to(*point);
        }
        self.release(MouseButton::Left);
    }

    pub fn modifiers(&mut self, alt: bool, ctrl: bool, shift: bool) {
        self.input
            .apply(&InputEvent::Modifiers(Modifiers { alt, ctrl, shift }));
    }

    pub fn transform(&self, s: &str) -> Transform {
        self.viewport
            .stage()
            .lock()
            .local_transform(&path(s), TimeCode::Default)
            .unwrap()
    }
}
