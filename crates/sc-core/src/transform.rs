//! Decomposed local transforms and rotation orders
//!
//! A [`Transform`] stores the translate / rotate / scale / pivot vectors of a
//! prim. Composition follows the common xform convention (column vectors):
//!
//! ```text
//! M = T * P * R * S * P⁻¹
//! ```
//!
//! Rotation angles are in degrees. A [`RotationOrder`] `XYZ` rotates about X
//! first, then Y, then Z, all about the parent frame axes, so the rotation
//! matrix is `Rz * Ry * Rx`.

use std::fmt;
use std::str::FromStr;

use glam::{DMat3, DMat4, DVec3};
use serde::{Deserialize, Serialize};

use crate::constants::{GIMBAL_LOCK_EPSILON, MATRIX_EPSILON};

/// Order in which per-axis rotations are applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RotationOrder {
    #[default]
    XYZ,
    XZY,
    YXZ,
    YZX,
    ZXY,
    ZYX,
}

impl RotationOrder {
    pub const ALL: [RotationOrder; 6] = [
        RotationOrder::XYZ,
        RotationOrder::XZY,
        RotationOrder::YXZ,
        RotationOrder::YZX,
        RotationOrder::ZXY,
        RotationOrder::ZYX,
    ];

    /// Axis indices in application order
    pub fn axes(&self) -> [usize; 3] {
        match self {
            RotationOrder::XYZ => [0, 1, 2],
            RotationOrder::XZY => [0, 2, 1],
            RotationOrder::YXZ => [1, 0, 2],
            RotationOrder::YZX => [1, 2, 0],
            RotationOrder::ZXY => [2, 0, 1],
            RotationOrder::ZYX => [2, 1, 0],
        }
    }

    /// +1 for cyclic orders (XYZ, YZX, ZXY), -1 otherwise
    fn parity(&self) -> f64 {
        match self {
            RotationOrder::XYZ | RotationOrder::YZX | RotationOrder::ZXY => 1.0,
            _ => -1.0,
        }
    }

    pub fn token(&self) -> &'static str {
        match self {
            RotationOrder::XYZ => "XYZ",
            RotationOrder::XZY => "XZY",
            RotationOrder::YXZ => "YXZ",
            RotationOrder::YZX => "YZX",
            RotationOrder::ZXY => "ZXY",
            RotationOrder::ZYX => "ZYX",
        }
    }
}

impl fmt::Display for RotationOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for RotationOrder {
    type Err = UnknownRotationOrder;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RotationOrder::ALL
            .into_iter()
            .find(|order| order.token() == s)
            .ok_or_else(|| UnknownRotationOrder(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown rotation order token: {0}")]
pub struct UnknownRotationOrder(pub String);

fn axis_rotation(axis: usize, radians: f64) -> DMat3 {
    match axis {
        0 => DMat3::from_rotation_x(radians),
        1 => DMat3::from_rotation_y(radians),
        _ => DMat3::from_rotation_z(radians),
    }
}

/// Element at `row`, `col` of a column-major matrix
fn at(m: &DMat3, row: usize, col: usize) -> f64 {
    m.col(col)[row]
}

/// Build a rotation matrix from per-axis angles in degrees.
///
/// `degrees` is indexed by axis (x, y, z), independent of the order.
pub fn euler_to_matrix(degrees: DVec3, order: RotationOrder) -> DMat3 {
    let [i, j, k] = order.axes();
    let angles = degrees.to_array().map(f64::to_radians);
    axis_rotation(k, angles[k]) * axis_rotation(j, angles[j]) * axis_rotation(i, angles[i])
}

/// Decompose a rotation matrix into per-axis angles in degrees.
///
/// Every rotation has two Euler solutions for a given order, each of them
/// repeated every 360°. When `seed` is given the solution nearest to it is
/// returned, which keeps values continuous while a rotation is dragged
/// across ±180°. In gimbal lock the first rotation keeps the seed value.
pub fn matrix_to_euler(rotation: &DMat3, order: RotationOrder, seed: Option<DVec3>) -> DVec3 {
    let [i, j, k] = order.axes();
    let s = order.parity();
    let seed_rad = seed.unwrap_or(DVec3::ZERO).to_array().map(f64::to_radians);

    let sin_b = (-s * at(rotation, k, i)).clamp(-1.0, 1.0);

    let mut candidates = Vec::with_capacity(2);
    if 1.0 - sin_b.abs() < GIMBAL_LOCK_EPSILON {
        let b = std::f64::consts::FRAC_PI_2.copysign(sin_b);
        let a = seed_rad[i];
        let unwound = *rotation * axis_rotation(i, -a);
        let c = (-s * at(&unwound, i, j)).atan2(at(&unwound, j, j));
        candidates.push((a, b, c));
    } else {
        let b = sin_b.asin();
        let a = (s * at(rotation, k, j)).atan2(at(rotation, k, k));
        let c = (s * at(rotation, j, i)).atan2(at(rotation, i, i));
        candidates.push((a, b, c));
        candidates.push((
            a + std::f64::consts::PI,
            std::f64::consts::PI - b,
            c + std::f64::consts::PI,
        ));
    }

    let mut best = DVec3::ZERO;
    let mut best_distance = f64::INFINITY;
    for (a, b, c) in candidates {
        let mut angles = [0.0; 3];
        angles[i] = a;
        angles[j] = b;
        angles[k] = c;
        if seed.is_some() {
            for axis in 0..3 {
                angles[axis] = nearest_equivalent(angles[axis], seed_rad[axis]);
            }
        } else {
            for angle in angles.iter_mut() {
                *angle = wrap_pi(*angle);
            }
        }
        let distance: f64 = (0..3).map(|axis| (angles[axis] - seed_rad[axis]).powi(2)).sum();
        if distance < best_distance {
            best_distance = distance;
            best = DVec3::from_array(angles);
        }
    }

    DVec3::new(best.x.to_degrees(), best.y.to_degrees(), best.z.to_degrees())
}

/// Angle congruent to `angle` (mod 2π) closest to `target`
fn nearest_equivalent(angle: f64, target: f64) -> f64 {
    let tau = std::f64::consts::TAU;
    angle + ((target - angle) / tau).round() * tau
}

fn wrap_pi(angle: f64) -> f64 {
    let wrapped = nearest_equivalent(angle, 0.0);
    if wrapped <= -std::f64::consts::PI + 1e-12 {
        wrapped + std::f64::consts::TAU
    } else {
        wrapped
    }
}

/// Local-to-parent transform of a prim in decomposed form
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub translation: DVec3,
    /// Per-axis rotation in degrees
    pub rotation: DVec3,
    pub scale: DVec3,
    pub pivot: DVec3,
    pub rotation_order: RotationOrder,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: DVec3::ZERO,
        rotation: DVec3::ZERO,
        scale: DVec3::ONE,
        pivot: DVec3::ZERO,
        rotation_order: RotationOrder::XYZ,
    };

    pub fn from_translation(translation: DVec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    pub fn rotation_matrix(&self) -> DMat3 {
        euler_to_matrix(self.rotation, self.rotation_order)
    }

    /// Compose into a 4x4 local-to-parent matrix
    pub fn to_matrix(&self) -> DMat4 {
        DMat4::from_translation(self.translation)
            * DMat4::from_translation(self.pivot)
            * DMat4::from_mat3(self.rotation_matrix())
            * DMat4::from_scale(self.scale)
            * DMat4::from_translation(-self.pivot)
    }

    /// Decompose `matrix` keeping the given pivot and rotation order.
    ///
    /// `seed` disambiguates the Euler solution (see [`matrix_to_euler`]).
    /// Returns `None` for singular matrices or matrices with shear or
    /// projection, which cannot be expressed by this decomposition.
    pub fn decompose(
        matrix: &DMat4,
        pivot: DVec3,
        rotation_order: RotationOrder,
        seed: Option<DVec3>,
    ) -> Option<Self> {
        let row3 = matrix.row(3);
        if (row3 - glam::DVec4::W).abs().max_element() > MATRIX_EPSILON {
            return None;
        }

        let linear = DMat3::from_mat4(*matrix);
        let mut scale = DVec3::new(
            linear.x_axis.length(),
            linear.y_axis.length(),
            linear.z_axis.length(),
        );
        if scale.min_element() < MATRIX_EPSILON {
            return None;
        }
        if linear.determinant() < 0.0 {
            scale = -scale;
        }
        let rotation = DMat3::from_cols(
            linear.x_axis / scale.x,
            linear.y_axis / scale.y,
            linear.z_axis / scale.z,
        );

        // Reject shear: the rotation part must be orthonormal
        let orthogonality = rotation.transpose() * rotation - DMat3::IDENTITY;
        let max_error = orthogonality
            .to_cols_array()
            .iter()
            .fold(0.0_f64, |acc, v| acc.max(v.abs()));
        if max_error > 1e-6 {
            return None;
        }

        let translation = matrix.w_axis.truncate() - pivot + linear * pivot;
        Some(Self {
            translation,
            rotation: matrix_to_euler(&rotation, rotation_order, seed),
            scale,
            pivot,
            rotation_order,
        })
    }
}
