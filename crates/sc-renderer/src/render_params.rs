//! Per-frame render parameters and viewport imaging settings

use glam::DVec4;
use sc_core::{BoundingBox, TimeCode};
use serde::{Deserialize, Serialize};

/// Geometry draw style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DrawMode {
    /// Points only
    Points,
    /// Edges only
    Wireframe,
    /// Shaded surfaces with edges on top
    WireframeOnSurface,
    /// Flat shading
    ShadedFlat,
    /// Smooth shading
    #[default]
    ShadedSmooth,
    /// Geometry without materials or lighting
    GeomOnly,
    /// Flat-shaded geometry without materials
    GeomFlat,
    /// Smooth-shaded geometry without materials
    GeomSmooth,
}

/// Face culling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CullStyle {
    /// Defer to the prim
    NoOpinion,
    /// Draw both sides
    #[default]
    Nothing,
    /// Cull back faces
    Back,
    /// Cull front faces
    Front,
    /// Cull back faces of single-sided prims
    BackUnlessDoubleSided,
}

/// Output color transform
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorCorrection {
    /// Linear output
    #[default]
    Disabled,
    /// Linear to sRGB
    Srgb,
    /// OpenColorIO transform
    OpenColorIo {
        /// Display name
        display: String,
        /// View name
        view: String,
        /// Input color space
        color_space: String,
        /// Look name
        look: String,
        /// 3D LUT edge length
        lut3d_size: u32,
    },
}

/// Parameters handed to the render engine every frame.
///
/// Two parameter sets with equal fields compare equal, which the viewport
/// uses to skip redundant renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderParams {
    /// Time at which attributes are sampled
    pub frame: TimeCode,
    /// Refinement level, 1.0 to 2.0
    pub complexity: f32,
    /// Geometry draw style
    pub draw_mode: DrawMode,
    /// Show guide purpose prims
    pub show_guides: bool,
    /// Show proxy purpose prims
    pub show_proxy: bool,
    /// Show render purpose prims
    pub show_render: bool,
    /// Discard cached data before rendering
    pub force_refresh: bool,
    /// Reverse winding order
    pub flip_front_facing: bool,
    /// Face culling
    pub cull_style: CullStyle,
    /// Render prim ids instead of colors
    pub enable_id_render: bool,
    /// Enable scene lighting
    pub enable_lighting: bool,
    /// Alpha to coverage
    pub enable_sample_alpha_to_coverage: bool,
    /// Let the engine set GPU state
    pub apply_render_state: bool,
    /// Gamma correct output colors
    pub gamma_correct_colors: bool,
    /// Highlight selected prims
    pub highlight: bool,
    /// Color blended over all geometry (RGBA)
    pub override_color: [f32; 4],
    /// Wireframe color (RGBA)
    pub wireframe_color: [f32; 4],
    /// Alpha cutoff; negative means automatic
    pub alpha_threshold: f32,
    /// Clip planes as (a, b, c, d) with ax + by + cz + d >= 0 kept
    pub clip_planes: Vec<DVec4>,
    /// Use materials authored on the stage
    pub enable_scene_materials: bool,
    /// Use lights authored on the stage
    pub enable_scene_lights: bool,
    /// Respect per-prim draw modes
    pub enable_usd_draw_modes: bool,
    /// Background color (RGBA)
    pub clear_color: [f32; 4],
    /// Output color transform
    pub color_correction: ColorCorrection,
    /// Bounding boxes drawn as overlays
    pub bboxes: Vec<BoundingBox>,
    /// Overlay line color (RGBA)
    pub bbox_line_color: [f32; 4],
    /// Overlay dash length in pixels
    pub bbox_line_dash_size: f32,
}

impl Default for RenderParams {
    fn default() -> Self {
        Self {
            frame: TimeCode::Default,
            complexity: 1.0,
            draw_mode: DrawMode::ShadedSmooth,
            show_guides: false,
            show_proxy: true,
            show_render: false,
            force_refresh: false,
            flip_front_facing: false,
            cull_style: CullStyle::Nothing,
            enable_id_render: false,
            enable_lighting: true,
            enable_sample_alpha_to_coverage: false,
            apply_render_state: true,
            gamma_correct_colors: true,
            highlight: false,
            override_color: [0.0; 4],
            wireframe_color: [0.0; 4],
            alpha_threshold: -1.0,
            clip_planes: Vec::new(),
            enable_scene_materials: true,
            enable_scene_lights: true,
            enable_usd_draw_modes: true,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            color_correction: ColorCorrection::Disabled,
            bboxes: Vec::new(),
            bbox_line_color: [1.0; 4],
            bbox_line_dash_size: 3.0,
        }
    }
}

/// Render parameters plus viewport display toggles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImagingSettings {
    /// Parameters forwarded to the engine
    pub render: RenderParams,
    /// Attach a headlight to the camera
    pub enable_camera_light: bool,
    /// Draw the ground grid
    pub show_grid: bool,
    /// Draw manipulator gizmos
    pub show_gizmos: bool,
    /// Draw viewport overlays
    pub show_ui: bool,
    /// Draw the viewport menu bar
    pub show_viewport_menu: bool,
}

impl Default for ImagingSettings {
    fn default() -> Self {
        Self {
            render: RenderParams::default(),
            enable_camera_light: true,
            show_grid: true,
            show_gizmos: true,
            show_ui: true,
            show_viewport_menu: true,
        }
    }
}
