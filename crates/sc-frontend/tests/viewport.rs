mod common;

use std::sync::Arc;

use approx::assert_abs_diff_eq;
use common::{Harness, path, test_stage};
use glam::DVec3;
use parking_lot::Mutex;
use sc_core::{BoundingBox, Prim, PrimPath, Selection, SelectionItem, TimeCode, Transform};
use sc_frontend::{InputEvent, Key, ManipulatorKind, MouseButton, Script, Viewport, ViewportSettings};
use sc_renderer::{HeadlessEngine, SimulationEngine, VisualizationParameter};

fn harness_looking_down_z() -> Harness {
    let mut harness = Harness::new();
    harness.look_from(DVec3::new(0.0, 0.0, 10.0), DVec3::Y);
    harness.select("/World/Box");
    harness
}

fn press_key(harness: &mut Harness, key: Key) {
    harness.input.apply(&InputEvent::Key(key));
    harness.frame();
}

#[test]
fn test_press_on_empty_space_selects_nothing() {
    let mut harness = harness_looking_down_z();
    harness.input.apply(&InputEvent::MoveTo(0.9, 0.9));
    harness.input.apply(&InputEvent::Press(MouseButton::Left));
    harness.frame();

    assert_eq!(harness.viewport.editing_state(), ManipulatorKind::Selection);
    assert!(harness.viewport.selection().lock().is_empty());

    harness.release(MouseButton::Left);
    assert_eq!(harness.viewport.editing_state(), ManipulatorKind::MouseHover);
}

#[test]
fn test_shift_click_adds_to_selection() {
    let mut stage = test_stage();
    stage
        .define_prim(
            path("/World/Other"),
            Prim::cube(1.0).with_transform(Transform::from_translation(DVec3::new(3.0, 0.0, 0.0))),
        )
        .unwrap();
    let mut harness = Harness::with_stage(stage);
    harness.look_from(DVec3::new(0.0, 0.0, 20.0), DVec3::Y);
    harness.viewport.choose_manipulator(ManipulatorKind::Selection);

    harness.press_at(DVec3::new(0.0, 0.3, 0.5), MouseButton::Left);
    harness.release(MouseButton::Left);
    harness.modifiers(false, false, true);
    harness.press_at(DVec3::new(3.0, 0.3, 0.5), MouseButton::Left);
    harness.release(MouseButton::Left);

    let selection = harness.viewport.selection().lock();
    assert_eq!(selection.paths(), vec![path("/World/Box"), path("/World/Other")]);
}

#[test]
fn test_click_on_instance_selects_instance() {
    let mut stage = test_stage();
    stage
        .define_prim(
            path("/World/Points"),
            Prim::point_instancer(
                BoundingBox::from_center_half_extents(DVec3::ZERO, DVec3::splat(0.25)),
                vec![DVec3::new(-3.0, 2.0, 0.0), DVec3::new(0.0, 2.0, 0.0), DVec3::new(3.0, 2.0, 0.0)],
            ),
        )
        .unwrap();
    let mut harness = Harness::with_stage(stage);
    harness.look_from(DVec3::new(0.0, 0.0, 20.0), DVec3::Y);
    harness.viewport.choose_manipulator(ManipulatorKind::Selection);

    harness.press_at(DVec3::new(3.0, 2.0, 0.25), MouseButton::Left);
    harness.release(MouseButton::Left);

    let selection = harness.viewport.selection().lock();
    assert!(selection.contains(&SelectionItem::instance(path("/World/Points"), 2)));
    assert_eq!(selection.len(), 1);
}

#[test]
fn test_click_just_off_the_edge_selects_within_boundary() {
    let mut harness = Harness::new();
    harness.look_from(DVec3::new(0.0, 0.0, 10.0), DVec3::Y);
    harness.viewport.choose_manipulator(ManipulatorKind::Selection);
    let (edge_x, _) = harness.ndc(DVec3::new(0.5, 0.0, 0.5));
    // One pixel is 2/800 NDC wide
    let pixel = 2.0 / 800.0;

    harness.input.apply(&InputEvent::MoveTo(edge_x + 2.0 * pixel, 0.0));
    harness.input.apply(&InputEvent::Press(MouseButton::Left));
    harness.frame();
    harness.release(MouseButton::Left);
    assert!(harness.viewport.selection().lock().contains(&SelectionItem::prim(path("/World/Box"))));

    harness.viewport.selection().lock().clear();
    harness.input.apply(&InputEvent::MoveTo(edge_x + 10.0 * pixel, 0.0));
    harness.input.apply(&InputEvent::Press(MouseButton::Left));
    harness.frame();
    harness.release(MouseButton::Left);
    assert!(harness.viewport.selection().lock().is_empty());
}

#[test]
fn test_focus_loss_cancels_edition() {
    let mut harness = harness_looking_down_z();
    let scale = harness.gizmo_scale();
    let grab = DVec3::new(0.5 * scale, 0.0, 0.0);

    harness.press_at(grab, MouseButton::Left);
    harness.move_to(grab + DVec3::new(1.0, 0.0, 0.0));
    assert_eq!(harness.viewport.editing_state(), ManipulatorKind::Position);
    assert!(harness.viewport.stage().lock().is_editing());

    harness.input.apply(&InputEvent::FocusLost);
    harness.frame();
    assert_eq!(harness.viewport.editing_state(), ManipulatorKind::MouseHover);
    assert!(!harness.viewport.stage().lock().is_editing());
    // The edit made before the focus loss is kept
    assert_abs_diff_eq!(harness.transform("/World/Box").translation.x, 1.0, epsilon = 1e-9);
}

#[test]
fn test_escape_cancels_edition() {
    let mut harness = harness_looking_down_z();
    harness.viewport.choose_manipulator(ManipulatorKind::Rotation);
    let radius = harness.gizmo_scale();

    harness.press_at(DVec3::new(0.6 * radius, 0.8 * radius, 0.0), MouseButton::Left);
    assert_eq!(harness.viewport.editing_state(), ManipulatorKind::Rotation);
    press_key(&mut harness, Key::Escape);
    assert_eq!(harness.viewport.editing_state(), ManipulatorKind::MouseHover);
    assert!(!harness.viewport.stage().lock().is_editing());

    // Releasing afterwards does not start anything
    harness.release(MouseButton::Left);
    assert_eq!(harness.viewport.editing_state(), ManipulatorKind::MouseHover);
}

#[test]
fn test_shortcuts_choose_manipulators() {
    let mut harness = Harness::new();
    assert_eq!(harness.viewport.active_manipulator(), ManipulatorKind::Position);

    press_key(&mut harness, Key::E);
    assert_eq!(harness.viewport.active_manipulator(), ManipulatorKind::Rotation);
    press_key(&mut harness, Key::R);
    assert_eq!(harness.viewport.active_manipulator(), ManipulatorKind::Scale);
    press_key(&mut harness, Key::Q);
    assert_eq!(harness.viewport.active_manipulator(), ManipulatorKind::Selection);

    // Ctrl combinations are not manipulator shortcuts
    harness.modifiers(false, true, false);
    press_key(&mut harness, Key::W);
    assert_eq!(harness.viewport.active_manipulator(), ManipulatorKind::Selection);

    harness.modifiers(false, false, false);
    press_key(&mut harness, Key::W);
    assert_eq!(harness.viewport.active_manipulator(), ManipulatorKind::Position);
}

#[test]
fn test_frame_shortcuts_move_camera() {
    let mut harness = harness_looking_down_z();
    let before = *harness.viewport.cameras().current_camera();
    press_key(&mut harness, Key::F);
    let framed = *harness.viewport.cameras().current_camera();
    assert_ne!(before, framed);

    let center = harness.ndc(DVec3::ZERO);
    assert_abs_diff_eq!(center.0, 0.0, epsilon = 1e-9);
    assert_abs_diff_eq!(center.1, 0.0, epsilon = 1e-9);

    press_key(&mut harness, Key::A);
    let root = harness
        .viewport
        .stage()
        .lock()
        .world_bound(&PrimPath::root(), TimeCode::Default)
        .unwrap();
    let center = harness.ndc(root.center());
    assert_abs_diff_eq!(center.0, 0.0, epsilon = 1e-9);
    assert_abs_diff_eq!(center.1, 0.0, epsilon = 1e-9);
}

#[test]
fn test_undo_and_redo_shortcuts() {
    let mut harness = harness_looking_down_z();
    let scale = harness.gizmo_scale();
    let grab = DVec3::new(0.5 * scale, 0.0, 0.0);
    harness.drag(grab, &[grab + DVec3::new(1.0, 0.0, 0.0)]);
    assert_abs_diff_eq!(harness.transform("/World/Box").translation.x, 1.0, epsilon = 1e-9);

    harness.modifiers(false, true, false);
    press_key(&mut harness, Key::Z);
    assert_eq!(harness.transform("/World/Box").translation, DVec3::ZERO);

    harness.modifiers(false, true, true);
    press_key(&mut harness, Key::Z);
    assert_abs_diff_eq!(harness.transform("/World/Box").translation.x, 1.0, epsilon = 1e-9);
}

#[test]
fn test_undo_is_ignored_while_editing() {
    let mut harness = harness_looking_down_z();
    let scale = harness.gizmo_scale();
    let grab = DVec3::new(0.5 * scale, 0.0, 0.0);
    harness.drag(grab, &[grab + DVec3::new(1.0, 0.0, 0.0)]);

    harness.press_at(grab + DVec3::new(1.0, 0.0, 0.0), MouseButton::Left);
    assert!(harness.viewport.manipulators().is_editing());
    assert!(!harness.viewport.undo());
    harness.release(MouseButton::Left);
    assert!(harness.viewport.undo());
    assert_eq!(harness.transform("/World/Box").translation, DVec3::ZERO);
}

#[test]
fn test_alt_drag_orbits_camera() {
    let mut harness = harness_looking_down_z();
    let before = *harness.viewport.cameras().current_camera();

    harness.modifiers(true, false, false);
    harness.input.apply(&InputEvent::MoveTo(0.0, 0.0));
    harness.input.apply(&InputEvent::Press(MouseButton::Left));
    harness.frame();
    assert_eq!(harness.viewport.editing_state(), ManipulatorKind::CameraOrbit);

    harness.input.apply(&InputEvent::MoveTo(0.3, 0.0));
    harness.frame();
    let orbited = *harness.viewport.cameras().current_camera();
    assert_ne!(orbited.position(), before.position());
    // Orbit keeps the distance to the center of interest
    assert_abs_diff_eq!(orbited.position().length(), 10.0, epsilon = 1e-9);

    harness.release(MouseButton::Left);
    assert_eq!(harness.viewport.editing_state(), ManipulatorKind::MouseHover);
    // Navigating never touches the selection or the stage history
    assert_eq!(harness.viewport.selection().lock().len(), 1);
    assert!(!harness.viewport.stage().lock().history().can_undo());
}

#[test]
fn test_scroll_zooms_camera() {
    let mut harness = harness_looking_down_z();
    harness.input.apply(&InputEvent::Scroll(2.0));
    harness.frame();
    let distance = harness.viewport.cameras().current_camera().position().length();
    assert!(distance < 10.0);
    assert_eq!(harness.viewport.editing_state(), ManipulatorKind::MouseHover);
}

#[test]
fn test_stage_camera_navigation_is_one_undo_step() {
    let mut harness = Harness::new();
    assert!(harness.viewport.use_stage_camera(&path("/World/Cam")));
    harness.frame();

    harness.input.apply(&InputEvent::MoveTo(0.0, 0.0));
    harness.input.apply(&InputEvent::Press(MouseButton::Right));
    harness.frame();
    assert_eq!(harness.viewport.editing_state(), ManipulatorKind::CameraOrbit);
    for x in [0.05, 0.1, 0.15, 0.2] {
        harness.input.apply(&InputEvent::MoveTo(x, 0.0));
        harness.frame();
    }
    harness.release(MouseButton::Right);

    let moved = harness.transform("/World/Cam").translation.z;
    assert!(moved < 10.0);
    {
        let stage = harness.viewport.stage().lock();
        assert!(!stage.is_editing());
        assert_eq!(stage.history().undo_labels().collect::<Vec<_>>(), vec!["Move camera"]);
    }

    assert!(harness.viewport.undo());
    harness.frame();
    assert_abs_diff_eq!(harness.transform("/World/Cam").translation.z, 10.0, epsilon = 1e-9);
    assert_abs_diff_eq!(
        harness.viewport.cameras().current_camera().position().z,
        10.0,
        epsilon = 1e-9
    );
}

#[test]
fn test_stage_camera_wheel_zoom_is_one_undo_step() {
    let mut harness = Harness::new();
    assert!(harness.viewport.use_stage_camera(&path("/World/Cam")));
    harness.frame();

    harness.input.apply(&InputEvent::Scroll(1.0));
    harness.frame();
    assert!(harness.transform("/World/Cam").translation.z < 10.0);
    let stage = harness.viewport.stage().lock();
    assert!(!stage.is_editing());
    assert_eq!(stage.history().undo_labels().collect::<Vec<_>>(), vec!["Move camera"]);
}

#[test]
fn test_create_camera_from_view() {
    let mut harness = harness_looking_down_z();
    harness
        .viewport
        .create_camera_from_view(path("/World/Saved"))
        .unwrap();
    assert_eq!(
        harness.viewport.cameras().stage_camera_path(),
        Some(&path("/World/Saved"))
    );
    assert_abs_diff_eq!(harness.transform("/World/Saved").translation.z, 10.0, epsilon = 1e-9);
    assert!(harness.viewport.create_camera_from_view(path("/World/Saved")).is_err());
}

/// Records every visualization parameter it receives
#[derive(Clone, Default)]
struct RecordingSimulation {
    calls: Arc<Mutex<Vec<(VisualizationParameter, f32)>>>,
}

impl SimulationEngine for RecordingSimulation {
    fn set_visualization_parameter(&mut self, parameter: VisualizationParameter, value: f32) {
        self.calls.lock().push((parameter, value));
    }
}

#[test]
fn test_physics_toggles_are_forwarded_on_change() {
    let simulation = RecordingSimulation::default();
    let calls = Arc::clone(&simulation.calls);
    let mut viewport = Viewport::new(
        Arc::new(Mutex::new(test_stage())),
        Arc::new(Mutex::new(Selection::new())),
        Box::new(HeadlessEngine::new()),
    )
    .with_simulation(Box::new(simulation));

    viewport.update(Default::default());
    assert_eq!(calls.lock().len(), 28);

    viewport.update(Default::default());
    assert_eq!(calls.lock().len(), 28);

    viewport.physics_mut().contact_point = true;
    viewport.update(Default::default());
    let calls = calls.lock();
    assert_eq!(calls.len(), 56);
    assert!(calls[28..].contains(&(VisualizationParameter::ContactPoint, 1.0)));
}

#[test]
fn test_settings_apply_default_manipulator() {
    let mut harness = Harness::new();
    let mut settings = ViewportSettings::default();
    settings.default_manipulator = ManipulatorKind::Scale;
    settings.imaging.show_gizmos = false;
    harness.viewport.apply_settings(&settings);
    harness.select("/World/Box");

    assert_eq!(harness.viewport.active_manipulator(), ManipulatorKind::Scale);
    assert!(harness.viewport.draw_list().is_empty());
    assert_eq!(harness.viewport.settings(), settings);
}

#[test]
fn test_gizmo_draw_follows_active_manipulator() {
    let mut harness = harness_looking_down_z();
    assert_eq!(harness.viewport.draw_list().len(), 1);
    harness.viewport.selection().lock().clear();
    harness.frame();
    assert!(harness.viewport.draw_list().is_empty());
}

#[test]
fn test_script_replays_drag() {
    let mut harness = harness_looking_down_z();
    let scale = harness.gizmo_scale();
    let (x0, y0) = harness.ndc(DVec3::new(0.5 * scale, 0.0, 0.0));
    let (x1, y1) = harness.ndc(DVec3::new(0.5 * scale + 2.0, 0.0, 0.0));
    let script = Script::parse(&format!(
        "(commands: [Select([\"/World/Box\"]), Drag(button: Left, from: ({x0:?}, {y0:?}), to: ({x1:?}, {y1:?}), steps: 4), Input(Modifiers((ctrl: true))), Input(Key(Z))])"
    ))
    .unwrap();

    let report = script.run(&mut harness.viewport, None).unwrap();
    assert_eq!(report.frames, 8);
    // The final flush runs Ctrl+Z
    assert_eq!(harness.transform("/World/Box").translation, DVec3::ZERO);
    assert!(harness.viewport.stage().lock().history().can_redo());
}

#[test]
fn test_script_rejects_unknown_camera() {
    let mut harness = Harness::new();
    let script = Script::parse(r#"(commands: [UseCamera(Stage("/World/Box"))])"#).unwrap();
    assert!(script.run(&mut harness.viewport, None).is_err());
}
