mod common;

use approx::assert_abs_diff_eq;
use common::{Harness, path};
use glam::DVec3;
use sc_core::{TimeCode, Transform, XformOp};
use sc_frontend::{Manipulator, ManipulatorKind, MouseButton};
use sc_renderer::Axis;

/// Point on the ring around the Z axis, as seen from +Z
fn z_ring_point(radius: f64, degrees: f64) -> DVec3 {
    let angle = degrees.to_radians();
    DVec3::new(radius * angle.cos(), radius * angle.sin(), 0.0)
}

fn harness_looking_down_z() -> Harness {
    let mut harness = Harness::new();
    harness.look_from(DVec3::new(0.0, 0.0, 10.0), DVec3::Y);
    harness.select("/World/Box");
    harness
}

#[test]
fn test_translate_arrows_hit_under_cursor() {
    let mut harness = harness_looking_down_z();
    let scale = harness.gizmo_scale();

    harness.move_to(DVec3::new(0.5 * scale, 0.0, 0.0));
    assert_eq!(
        harness.viewport.manipulators().get(ManipulatorKind::Position).selected_axis(),
        Axis::X
    );

    harness.move_to(DVec3::new(0.0, 0.5 * scale, 0.0));
    assert_eq!(
        harness.viewport.manipulators().get(ManipulatorKind::Position).selected_axis(),
        Axis::Y
    );

    harness.look_from(DVec3::new(10.0, 0.0, 0.0), DVec3::Y);
    harness.move_to(DVec3::new(0.0, 0.0, 0.5 * scale));
    assert_eq!(
        harness.viewport.manipulators().get(ManipulatorKind::Position).selected_axis(),
        Axis::Z
    );

    harness.move_to(DVec3::new(0.0, 3.0 * scale, 3.0 * scale));
    assert_eq!(
        harness.viewport.manipulators().get(ManipulatorKind::Position).selected_axis(),
        Axis::None
    );
}

#[test]
fn test_translate_drag_moves_along_axis() {
    let mut harness = harness_looking_down_z();
    let scale = harness.gizmo_scale();
    let grab = DVec3::new(0.5 * scale, 0.0, 0.0);

    harness.press_at(grab, MouseButton::Left);
    assert_eq!(harness.viewport.editing_state(), ManipulatorKind::Position);
    harness.move_to(grab + DVec3::new(0.75, 0.4, 0.0));
    harness.move_to(grab + DVec3::new(1.5, 0.0, 0.0));
    harness.release(MouseButton::Left);

    assert_eq!(harness.viewport.editing_state(), ManipulatorKind::MouseHover);
    let translation = harness.transform("/World/Box").translation;
    assert_abs_diff_eq!(translation.x, 1.5, epsilon = 1e-9);
    assert_abs_diff_eq!(translation.y, 0.0, epsilon = 1e-12);
    assert_abs_diff_eq!(translation.z, 0.0, epsilon = 1e-12);

    let stage = harness.viewport.stage().lock();
    assert!(!stage.is_editing());
    assert_eq!(stage.history().undo_labels().collect::<Vec<_>>(), vec!["Translate"]);
}

#[test]
fn test_translate_respects_parent_scale() {
    let mut harness = harness_looking_down_z();
    harness
        .viewport
        .stage()
        .lock()
        .set_xform_value(&path("/World"), XformOp::Scale, DVec3::splat(2.0), TimeCode::Default)
        .unwrap();
    harness.frame();
    let scale = harness.gizmo_scale();
    let grab = DVec3::new(0.5 * scale, 0.0, 0.0);

    harness.drag(grab, &[grab + DVec3::new(1.0, 0.0, 0.0)]);
    // One world unit is half a unit in the scaled parent
    assert_abs_diff_eq!(harness.transform("/World/Box").translation.x, 0.5, epsilon = 1e-9);
}

#[test]
fn test_rotation_rings_hit_under_cursor() {
    let mut harness = harness_looking_down_z();
    harness.viewport.choose_manipulator(ManipulatorKind::Rotation);
    let radius = harness.gizmo_scale();

    harness.move_to(z_ring_point(radius, 30.0));
    assert_eq!(harness.viewport.manipulators().rotation().selected_axis(), Axis::Z);

    harness.move_to(z_ring_point(radius * 0.5, 30.0));
    assert_eq!(harness.viewport.manipulators().rotation().selected_axis(), Axis::None);

    harness.look_from(DVec3::new(10.0, 0.0, 0.0), DVec3::Y);
    let angle = 30f64.to_radians();
    harness.move_to(DVec3::new(0.0, radius * angle.cos(), radius * angle.sin()));
    assert_eq!(harness.viewport.manipulators().rotation().selected_axis(), Axis::X);

    harness.look_from(DVec3::new(0.0, 10.0, 0.0), DVec3::Z);
    harness.move_to(DVec3::new(radius * angle.cos(), 0.0, radius * angle.sin()));
    assert_eq!(harness.viewport.manipulators().rotation().selected_axis(), Axis::Y);
}

#[test]
fn test_quarter_turn_about_z() {
    let mut harness = harness_looking_down_z();
    harness.viewport.choose_manipulator(ManipulatorKind::Rotation);
    let radius = harness.gizmo_scale();

    let path: Vec<DVec3> = [75.0, 105.0, 135.0]
        .into_iter()
        .map(|degrees| z_ring_point(radius, degrees))
        .collect();
    harness.drag(z_ring_point(radius, 45.0), &path);

    let rotation = harness.transform("/World/Box").rotation;
    assert_abs_diff_eq!(rotation.x, 0.0, epsilon = 1e-9);
    assert_abs_diff_eq!(rotation.y, 0.0, epsilon = 1e-9);
    assert_abs_diff_eq!(rotation.z, 90.0, epsilon = 1e-9);
}

#[test]
fn test_mirrored_parent_turns_with_the_cursor() {
    let mut harness = harness_looking_down_z();
    harness
        .viewport
        .stage()
        .lock()
        .set_xform_value(&path("/World"), XformOp::Scale, DVec3::new(-1.0, 1.0, 1.0), TimeCode::Default)
        .unwrap();
    harness.frame();
    harness.viewport.choose_manipulator(ManipulatorKind::Rotation);
    let radius = harness.gizmo_scale();

    let path_ccw: Vec<DVec3> = [75.0, 105.0, 135.0]
        .into_iter()
        .map(|degrees| z_ring_point(radius, degrees))
        .collect();
    harness.drag(z_ring_point(radius, 45.0), &path_ccw);

    // Local +X starts on world -X; a quarter turn counterclockwise puts it on -Y
    let x_in_world = harness
        .viewport
        .stage()
        .lock()
        .local_to_world(&path("/World/Box"), TimeCode::Default)
        .unwrap()
        .transform_vector3(DVec3::X);
    assert_abs_diff_eq!(x_in_world.x, 0.0, epsilon = 1e-9);
    assert_abs_diff_eq!(x_in_world.y, -1.0, epsilon = 1e-9);
    assert_abs_diff_eq!(harness.transform("/World/Box").rotation.z, -90.0, epsilon = 1e-9);
}

#[test]
fn test_rotation_holds_when_cursor_leaves_ring_plane() {
    let mut harness = Harness::new();
    harness.look_from(DVec3::new(0.0, -10.0, 1.0), DVec3::Z);
    harness.select("/World/Box");
    harness.viewport.choose_manipulator(ManipulatorKind::Rotation);
    let radius = harness.gizmo_scale();

    harness.press_at(z_ring_point(radius, 60.0), MouseButton::Left);
    harness.move_to(z_ring_point(radius, 80.0));
    harness.move_to(z_ring_point(radius, 105.0));
    assert_abs_diff_eq!(harness.transform("/World/Box").rotation.z, 45.0, epsilon = 1e-9);

    // Above the horizon the cursor ray never meets the ring plane
    harness.move_to(DVec3::new(0.0, 0.0, 1.2));
    assert_eq!(harness.viewport.editing_state(), ManipulatorKind::Rotation);
    assert_abs_diff_eq!(harness.transform("/World/Box").rotation.z, 45.0, epsilon = 1e-9);

    harness.release(MouseButton::Left);
    assert_abs_diff_eq!(harness.transform("/World/Box").rotation.z, 45.0, epsilon = 1e-9);
}

#[test]
fn test_full_turn_returns_to_start() {
    let mut harness = harness_looking_down_z();
    harness.viewport.choose_manipulator(ManipulatorKind::Rotation);
    let radius = harness.gizmo_scale();

    let mut peak = 0.0f64;
    harness.press_at(z_ring_point(radius, 45.0), MouseButton::Left);
    for step in 1..=12 {
        harness.move_to(z_ring_point(radius, 45.0 + 30.0 * step as f64));
        peak = peak.max(harness.transform("/World/Box").rotation.z);
    }
    harness.release(MouseButton::Left);

    // Angles stay continuous past 180 degrees
    assert!(peak > 300.0);
    let rotation = harness.transform("/World/Box").rotation;
    assert_abs_diff_eq!(rotation.x, 0.0, epsilon = 1e-9);
    assert_abs_diff_eq!(rotation.y, 0.0, epsilon = 1e-9);
    assert_abs_diff_eq!(rotation.z, 0.0, epsilon = 1e-9);
}

#[test]
fn test_click_without_motion_leaves_transform_untouched() {
    let mut harness = Harness::new();
    let authored = Transform {
        translation: DVec3::ZERO,
        rotation: DVec3::new(0.0, 0.0, 37.123456789),
        scale: DVec3::new(1.0, 2.0, 3.0),
        ..Transform::IDENTITY
    };
    {
        let mut stage = harness.viewport.stage().lock();
        stage
            .set_xform_value(&path("/World/Box"), XformOp::Rotate, authored.rotation, TimeCode::Default)
            .unwrap();
        stage
            .set_xform_value(&path("/World/Box"), XformOp::Scale, authored.scale, TimeCode::Default)
            .unwrap();
    }
    harness.look_from(DVec3::new(0.0, 0.0, 10.0), DVec3::Y);
    harness.select("/World/Box");
    harness.viewport.choose_manipulator(ManipulatorKind::Rotation);
    let radius = harness.gizmo_scale();
    let undo_before = harness.viewport.stage().lock().history().undo_labels().count();

    harness.press_at(z_ring_point(radius, 60.0), MouseButton::Left);
    assert_eq!(harness.viewport.editing_state(), ManipulatorKind::Rotation);
    harness.frame();
    harness.release(MouseButton::Left);

    assert_eq!(harness.transform("/World/Box"), authored);
    let stage = harness.viewport.stage().lock();
    assert_eq!(stage.history().undo_labels().count(), undo_before);
    assert!(!stage.is_editing());
}

#[test]
fn test_scale_handle_doubles_axis() {
    let mut harness = harness_looking_down_z();
    harness.viewport.choose_manipulator(ManipulatorKind::Scale);
    let scale = harness.gizmo_scale();

    harness.move_to(DVec3::new(scale, 0.0, 0.0));
    assert_eq!(
        harness.viewport.manipulators().get(ManipulatorKind::Scale).selected_axis(),
        Axis::X
    );

    harness.drag(
        DVec3::new(scale, 0.0, 0.0),
        &[DVec3::new(1.5 * scale, 0.1, 0.0), DVec3::new(2.0 * scale, 0.0, 0.0)],
    );
    let result = harness.transform("/World/Box").scale;
    assert_abs_diff_eq!(result.x, 2.0, epsilon = 1e-9);
    assert_eq!(result.y, 1.0);
    assert_eq!(result.z, 1.0);
}

#[test]
fn test_selection_cleared_mid_drag() {
    let mut harness = harness_looking_down_z();
    harness.viewport.choose_manipulator(ManipulatorKind::Rotation);
    let radius = harness.gizmo_scale();

    harness.press_at(z_ring_point(radius, 45.0), MouseButton::Left);
    harness.move_to(z_ring_point(radius, 75.0));
    let before = harness.transform("/World/Box");
    assert_abs_diff_eq!(before.rotation.z, 30.0, epsilon = 1e-9);

    harness.viewport.selection().lock().clear();
    harness.move_to(z_ring_point(radius, 120.0));
    harness.move_to(z_ring_point(radius, 160.0));
    assert_eq!(harness.viewport.editing_state(), ManipulatorKind::Rotation);
    assert_eq!(harness.transform("/World/Box"), before);

    harness.release(MouseButton::Left);
    assert_eq!(harness.viewport.editing_state(), ManipulatorKind::MouseHover);
    let stage = harness.viewport.stage().lock();
    assert!(!stage.is_editing());
    assert_eq!(stage.history().undo_labels().collect::<Vec<_>>(), vec!["Rotate"]);
}

#[test]
fn test_animated_attribute_is_written_at_current_time() {
    let mut harness = harness_looking_down_z();
    harness
        .viewport
        .stage()
        .lock()
        .set_xform_value(&path("/World/Box"), XformOp::Translate, DVec3::ZERO, TimeCode::Frame(1.0))
        .unwrap();
    harness.viewport.set_current_time(TimeCode::Frame(5.0));
    harness.frame();
    let scale = harness.gizmo_scale();
    let grab = DVec3::new(0.5 * scale, 0.0, 0.0);

    harness.drag(grab, &[grab + DVec3::new(1.0, 0.0, 0.0)]);

    let stage = harness.viewport.stage().lock();
    let box_path = path("/World/Box");
    let at_five = stage.xform_value(&box_path, XformOp::Translate, TimeCode::Frame(5.0)).unwrap();
    let at_one = stage.xform_value(&box_path, XformOp::Translate, TimeCode::Frame(1.0)).unwrap();
    assert_abs_diff_eq!(at_five.x, 1.0, epsilon = 1e-9);
    assert_eq!(at_one, DVec3::ZERO);
    // The unanimated rotation still has no samples
    assert!(!stage.has_time_samples(&box_path, XformOp::Rotate));
}
