//! Renderer constants

/// Scene units per orthographic aperture unit
pub const ORTHO_APERTURE_UNIT: f64 = 0.1;

/// Closest a free camera gets to its center of interest
pub const MIN_CAMERA_DISTANCE: f64 = 1e-3;

/// Farthest a free camera gets from its center of interest
pub const MAX_CAMERA_DISTANCE: f64 = 1e7;

/// Gizmo mesh dimensions, in units of the gizmo size
pub mod gizmo {
    /// Length of a translation arrow including its head
    pub const ARROW_LENGTH: f32 = 1.0;
    /// Radius of a translation arrow shaft
    pub const SHAFT_RADIUS: f32 = 0.015;
    /// Radius of a translation arrow cone base
    pub const HEAD_RADIUS: f32 = 0.06;
    /// Length of a translation arrow cone
    pub const HEAD_LENGTH: f32 = 0.2;
    /// Half width of a rotation ring band
    pub const RING_HALF_WIDTH: f32 = 0.015;
    /// Half size of a scale handle cube
    pub const CUBE_HALF_SIZE: f32 = 0.06;
    /// Segments around arrow shafts and cones
    pub const ARROW_SEGMENTS: u32 = 12;
    /// Segments around rotation rings
    pub const RING_SEGMENTS: u32 = 64;
    /// Most gizmos drawn in one frame
    pub const MAX_INSTANCES: usize = 64;
}
