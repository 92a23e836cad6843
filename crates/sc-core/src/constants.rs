//! Global constants for sc-core

/// Tolerance used when validating affine matrices and scale factors
pub const MATRIX_EPSILON: f64 = 1e-9;

/// `1 - |sin(middle angle)|` below which an Euler decomposition is treated
/// as gimbal locked
pub const GIMBAL_LOCK_EPSILON: f64 = 1e-10;

/// Current stage file format version
pub const STAGE_FORMAT_VERSION: u32 = 1;
