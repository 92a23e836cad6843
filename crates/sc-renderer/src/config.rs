//! Renderer configuration structures
//!
//! Settings for gizmo sizing, picking and camera navigation. All structures
//! are serde-serializable so they can be stored in the viewport settings
//! file; missing fields fall back to their defaults.

use serde::{Deserialize, Serialize};

use crate::camera::ConformWindowPolicy;

/// Gizmo configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GizmoConfig {
    /// Whether gizmos are drawn
    pub enabled: bool,
    /// Radius of rotation rings and length of axis handles, as a multiple
    /// of the screen scale factor
    pub axis_size: f64,
    /// Relative tolerance for ring hits (0.1 accepts radii within 10%)
    pub hit_tolerance: f64,
    /// Fraction of the viewport height covered by a unit gizmo
    pub screen_fraction: f64,
    /// Radius of arrow and scale handles, relative to `axis_size`
    pub handle_radius: f64,
    /// X-axis color (RGBA)
    pub x_axis_color: [f32; 4],
    /// Y-axis color (RGBA)
    pub y_axis_color: [f32; 4],
    /// Z-axis color (RGBA)
    pub z_axis_color: [f32; 4],
    /// Color of the hovered or dragged handle (RGBA)
    pub highlight_color: [f32; 4],
}

impl Default for GizmoConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            axis_size: 1.2,
            hit_tolerance: 0.1,
            screen_fraction: 0.1,
            handle_radius: 0.08,
            x_axis_color: [1.0, 0.2, 0.2, 1.0],
            y_axis_color: [0.2, 1.0, 0.2, 1.0],
            z_axis_color: [0.2, 0.2, 1.0, 1.0],
            highlight_color: [1.0, 1.0, 0.2, 1.0],
        }
    }
}

/// Viewport rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ViewportConfig {
    /// Background clear color (RGBA)
    pub background_color: [f32; 4],
    /// Side of the square picking region around the cursor, in pixels
    pub picking_boundary_px: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self::dark()
    }
}

impl ViewportConfig {
    /// Create dark theme viewport config
    pub fn dark() -> Self {
        Self {
            background_color: [0.15, 0.15, 0.18, 1.0],
            picking_boundary_px: 5.0,
        }
    }

    /// Create light theme viewport config
    pub fn light() -> Self {
        Self {
            background_color: [0.92, 0.92, 0.94, 1.0],
            picking_boundary_px: 5.0,
        }
    }
}

/// Camera navigation configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    /// Degrees of orbit per NDC unit of mouse motion
    pub orbit_sensitivity: f64,
    /// Zoom amount per NDC unit of mouse motion
    pub zoom_sensitivity: f64,
    /// Zoom amount per scroll wheel notch
    pub scroll_sensitivity: f64,
    /// How camera windows adapt to the viewport aspect ratio
    pub conform_policy: ConformWindowPolicy,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            orbit_sensitivity: 90.0,
            zoom_sensitivity: 5.0,
            scroll_sensitivity: 1.0,
            conform_policy: ConformWindowPolicy::Fit,
        }
    }
}

/// Complete renderer configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RendererConfig {
    /// Viewport settings
    #[serde(default)]
    pub viewport: ViewportConfig,
    /// Camera settings
    #[serde(default)]
    pub camera: CameraConfig,
    /// Gizmo settings
    #[serde(default)]
    pub gizmo: GizmoConfig,
}

impl RendererConfig {
    /// Create a new renderer configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply light theme colors
    pub fn apply_light_theme(&mut self) {
        self.viewport = ViewportConfig {
            picking_boundary_px: self.viewport.picking_boundary_px,
            ..ViewportConfig::light()
        };
    }
}
