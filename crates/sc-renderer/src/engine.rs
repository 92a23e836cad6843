//! Render engine contract
//!
//! The viewport drives rendering and picking through [`RenderEngine`]. It
//! only converts viewport state into the arguments below; how the engine
//! draws or resolves hits is up to the implementation.

use glam::{DMat4, DVec3};
use sc_core::{PrimPath, Stage};

use crate::render_params::RenderParams;

/// How multiple hits under the pick region are reduced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolveMode {
    /// Closest hit to the eye
    #[default]
    NearestToCamera,
    /// Hit closest to the center of the pick region
    NearestToCenter,
    /// One hit per prim and instance
    Unique,
    /// Every hit, sorted by distance
    All,
}

/// Picking request options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PickParams {
    /// Hit reduction
    pub resolve_mode: ResolveMode,
}

/// One picking hit
#[derive(Debug, Clone, PartialEq)]
pub struct IntersectionResult {
    /// World-space hit point
    pub hit_point: DVec3,
    /// World-space surface normal at the hit
    pub hit_normal: DVec3,
    /// Prim that was hit
    pub hit_prim_path: PrimPath,
    /// Point instancer owning the hit instance, if any
    pub hit_instancer_path: Option<PrimPath>,
    /// Index of the hit instance, if any
    pub hit_instance_index: Option<usize>,
    /// Distance from the pick ray origin
    pub distance: f64,
}

/// Scene renderer and picker
pub trait RenderEngine {
    /// Draw the stage below `root`
    fn render(&mut self, stage: &Stage, root: &PrimPath, params: &RenderParams);

    /// Find geometry inside the frustum given by `view` and `projection`.
    /// Callers pass a frustum already narrowed to the pick region.
    fn test_intersection(
        &mut self,
        stage: &Stage,
        pick_params: &PickParams,
        view: &DMat4,
        projection: &DMat4,
        root: &PrimPath,
        params: &RenderParams,
    ) -> Vec<IntersectionResult>;

    /// Camera used by the next render
    fn set_camera_state(&mut self, view: &DMat4, projection: &DMat4);

    /// Prims drawn highlighted
    fn set_selected(&mut self, paths: &[PrimPath]);

    /// Non-blocking check for scene changes processed in the background.
    /// True means another render should be requested, not that data is
    /// ready now.
    fn poll_for_asynchronous_updates(&mut self, stage: &Stage) -> bool;

    /// True when the last render needs no further refinement
    fn is_converged(&self) -> bool;

    /// Size of the render buffers in pixels
    fn set_render_buffer_size(&mut self, _width: u32, _height: u32) {}

    /// Output buffers the engine can display
    fn renderer_aovs(&self) -> Vec<String> {
        vec!["color".to_string()]
    }

    /// Select the displayed output buffer. Returns false when unsupported.
    fn set_renderer_aov(&mut self, aov: &str) -> bool {
        aov == "color"
    }

    /// Name of the active renderer
    fn renderer_name(&self) -> &str;
}
