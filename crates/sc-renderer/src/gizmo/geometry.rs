//! Gizmo geometry generation
//!
//! Unit-sized meshes for the three gizmo shapes. Vertices carry the axis
//! they belong to so the shader can recolor and highlight whole handles.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::constants::gizmo;

/// Axis id of vertices that belong to no handle
pub const NEUTRAL_AXIS_ID: u32 = 3;

/// Gizmo vertex data
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct GizmoVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
    pub axis_id: u32,
}

const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

/// Rotation taking +Y onto the given axis
fn axis_alignment(axis_id: u32) -> Mat4 {
    match axis_id {
        0 => Mat4::from_rotation_z(-std::f32::consts::FRAC_PI_2),
        2 => Mat4::from_rotation_x(std::f32::consts::FRAC_PI_2),
        _ => Mat4::IDENTITY,
    }
}

fn push(vertices: &mut Vec<GizmoVertex>, position: Vec3, axis_id: u32) -> u32 {
    vertices.push(GizmoVertex {
        position: position.into(),
        color: WHITE,
        axis_id,
    });
    vertices.len() as u32 - 1
}

/// Cylinder along +Y from `start` to `end`, open at both ends
fn push_cylinder(
    vertices: &mut Vec<GizmoVertex>,
    indices: &mut Vec<u32>,
    rotation: Mat4,
    radius: f32,
    start: f32,
    end: f32,
    axis_id: u32,
) {
    let segments = gizmo::ARROW_SEGMENTS;
    let base_index = vertices.len() as u32;
    for i in 0..=segments {
        let angle = (i as f32 / segments as f32) * std::f32::consts::TAU;
        let x = angle.cos() * radius;
        let z = angle.sin() * radius;
        push(vertices, rotation.transform_point3(Vec3::new(x, start, z)), axis_id);
        push(vertices, rotation.transform_point3(Vec3::new(x, end, z)), axis_id);
    }
    for i in 0..segments {
        let i0 = base_index + i * 2;
        let i1 = base_index + i * 2 + 1;
        let i2 = base_index + (i + 1) * 2;
        let i3 = base_index + (i + 1) * 2 + 1;
        indices.extend_from_slice(&[i0, i2, i1, i1, i2, i3]);
    }
}

/// Axis-aligned cube centered at `center`
fn push_cube(vertices: &mut Vec<GizmoVertex>, indices: &mut Vec<u32>, center: Vec3, half: f32, axis_id: u32) {
    let base_index = vertices.len() as u32;
    for corner in 0..8u32 {
        let offset = Vec3::new(
            if corner & 1 == 0 { -half } else { half },
            if corner & 2 == 0 { -half } else { half },
            if corner & 4 == 0 { -half } else { half },
        );
        push(vertices, center + offset, axis_id);
    }
    const FACES: [[u32; 4]; 6] = [
        [0, 2, 3, 1],
        [4, 5, 7, 6],
        [0, 1, 5, 4],
        [2, 6, 7, 3],
        [0, 4, 6, 2],
        [1, 3, 7, 5],
    ];
    for [a, b, c, d] in FACES {
        indices.extend_from_slice(&[
            base_index + a,
            base_index + b,
            base_index + c,
            base_index + a,
            base_index + c,
            base_index + d,
        ]);
    }
}

/// Generate translation gizmo geometry (3 arrows along X, Y, Z axes).
///
/// Returns (vertices, indices) for indexed triangle rendering.
pub fn generate_translation_gizmo() -> (Vec<GizmoVertex>, Vec<u32>) {
    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    let arrow_length = gizmo::ARROW_LENGTH;
    let head_length = gizmo::HEAD_LENGTH;
    let head_radius = gizmo::HEAD_RADIUS;
    let segments = gizmo::ARROW_SEGMENTS;

    for axis_id in 0..3u32 {
        let rotation = axis_alignment(axis_id);
        let shaft_end = arrow_length - head_length;

        push_cylinder(
            &mut vertices,
            &mut indices,
            rotation,
            gizmo::SHAFT_RADIUS,
            0.0,
            shaft_end,
            axis_id,
        );

        // Cone head
        let tip_index = push(
            &mut vertices,
            rotation.transform_point3(Vec3::new(0.0, arrow_length, 0.0)),
            axis_id,
        );
        for i in 0..=segments {
            let angle = (i as f32 / segments as f32) * std::f32::consts::TAU;
            let x = angle.cos() * head_radius;
            let z = angle.sin() * head_radius;
            push(&mut vertices, rotation.transform_point3(Vec3::new(x, shaft_end, z)), axis_id);
        }
        for i in 0..segments {
            let i0 = tip_index + 1 + i;
            let i1 = tip_index + 1 + (i + 1);
            indices.extend_from_slice(&[tip_index, i1, i0]);
        }

        // Cone base cap
        let center_index = push(
            &mut vertices,
            rotation.transform_point3(Vec3::new(0.0, shaft_end, 0.0)),
            axis_id,
        );
        for i in 0..segments {
            let i0 = tip_index + 1 + i;
            let i1 = tip_index + 1 + (i + 1);
            indices.extend_from_slice(&[center_index, i0, i1]);
        }
    }

    (vertices, indices)
}

/// Generate rotation gizmo geometry: one unit-radius band per axis, lying
/// in the plane perpendicular to that axis.
pub fn generate_rotation_gizmo() -> (Vec<GizmoVertex>, Vec<u32>) {
    let mut vertices = Vec::new();
    let mut indices = Vec::new();
    let segments = gizmo::RING_SEGMENTS;
    let half_width = gizmo::RING_HALF_WIDTH;

    for axis_id in 0..3u32 {
        // The ring around +Y lies in the XZ plane
        let rotation = axis_alignment(axis_id);
        let base_index = vertices.len() as u32;
        for i in 0..=segments {
            let angle = (i as f32 / segments as f32) * std::f32::consts::TAU;
            let radial = Vec3::new(angle.cos(), 0.0, angle.sin());
            let inner = radial * (1.0 - half_width);
            let outer = radial * (1.0 + half_width);
            push(&mut vertices, rotation.transform_point3(inner), axis_id);
            push(&mut vertices, rotation.transform_point3(outer), axis_id);
        }
        for i in 0..segments {
            let i0 = base_index + i * 2;
            let i1 = base_index + i * 2 + 1;
            let i2 = base_index + (i + 1) * 2;
            let i3 = base_index + (i + 1) * 2 + 1;
            indices.extend_from_slice(&[i0, i2, i1, i1, i2, i3]);
        }
    }

    (vertices, indices)
}

/// Generate scale gizmo geometry: a thin shaft ending in a cube per axis,
/// plus a neutral cube at the origin for uniform scaling.
pub fn generate_scale_gizmo() -> (Vec<GizmoVertex>, Vec<u32>) {
    let mut vertices = Vec::new();
    let mut indices = Vec::new();
    let half = gizmo::CUBE_HALF_SIZE;

    for axis_id in 0..3u32 {
        let rotation = axis_alignment(axis_id);
        let tip = gizmo::ARROW_LENGTH - half;
        push_cylinder(
            &mut vertices,
            &mut indices,
            rotation,
            gizmo::SHAFT_RADIUS,
            0.0,
            tip,
            axis_id,
        );
        push_cube(
            &mut vertices,
            &mut indices,
            rotation.transform_point3(Vec3::new(0.0, tip, 0.0)),
            half,
            axis_id,
        );
    }
    push_cube(&mut vertices, &mut indices, Vec3::ZERO, half, NEUTRAL_AXIS_ID);

    (vertices, indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_valid(vertices: &[GizmoVertex], indices: &[u32]) {
        assert!(!indices.is_empty());
        assert_eq!(indices.len() % 3, 0);
        assert!(indices.iter().all(|&i| (i as usize) < vertices.len()));
    }

    #[test]
    fn test_meshes_are_indexed_triangles() {
        for (vertices, indices) in [
            generate_translation_gizmo(),
            generate_rotation_gizmo(),
            generate_scale_gizmo(),
        ] {
            assert_valid(&vertices, &indices);
        }
    }

    #[test]
    fn test_rings_are_perpendicular_to_their_axis() {
        let (vertices, _) = generate_rotation_gizmo();
        for vertex in vertices {
            let position = Vec3::from(vertex.position);
            let along_axis = position[vertex.axis_id as usize];
            assert!(along_axis.abs() < 1e-5);
            let radius = position.length();
            assert!((radius - 1.0).abs() <= gizmo::RING_HALF_WIDTH + 1e-5);
        }
    }

    #[test]
    fn test_arrows_point_along_their_axis() {
        let (vertices, _) = generate_translation_gizmo();
        for axis in 0..3u32 {
            let tip = vertices
                .iter()
                .filter(|v| v.axis_id == axis)
                .map(|v| Vec3::from(v.position)[axis as usize])
                .fold(f32::MIN, f32::max);
            assert!((tip - gizmo::ARROW_LENGTH).abs() < 1e-5);
        }
    }
}
