//! CPU render engine without a GPU
//!
//! Rendering only records the requested state. Picking casts rays across
//! the whole pick frustum against world-space bounds of geometry prims and
//! of each point-instancer instance, keeping for each the ray closest to
//! the pick center.

use glam::{DMat4, DVec2, DVec3};
use sc_core::{BoundingBox, PrimKind, PrimPath, Projection, Stage};

use crate::engine::{IntersectionResult, PickParams, RenderEngine, ResolveMode};
use crate::frustum::Frustum;
use crate::render_params::RenderParams;

const AOVS: [&str; 3] = ["color", "depth", "primId"];

/// Rays per side of the pick region when the projected bounds are unknown
const GRID_STEPS: usize = 5;

/// Reference engine used by the headless binary and tests
#[derive(Debug, Clone)]
pub struct HeadlessEngine {
    camera: Option<(DMat4, DMat4)>,
    selected: Vec<PrimPath>,
    rendered_revision: Option<u64>,
    last_params: Option<RenderParams>,
    frames_rendered: u64,
    buffer_size: (u32, u32),
    aov: String,
    allow_asynchronous_scene_processing: bool,
}

impl Default for HeadlessEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessEngine {
    /// Create an engine with background scene processing disabled
    pub fn new() -> Self {
        Self {
            camera: None,
            selected: Vec::new(),
            rendered_revision: None,
            last_params: None,
            frames_rendered: 0,
            buffer_size: (0, 0),
            aov: AOVS[0].to_string(),
            allow_asynchronous_scene_processing: false,
        }
    }

    /// Report stage changes from [`RenderEngine::poll_for_asynchronous_updates`]
    pub fn set_allow_asynchronous_scene_processing(&mut self, allow: bool) {
        self.allow_asynchronous_scene_processing = allow;
    }

    /// Number of completed renders
    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// Camera set for the next render
    pub fn camera_state(&self) -> Option<(DMat4, DMat4)> {
        self.camera
    }

    /// Highlighted prims
    pub fn selected(&self) -> &[PrimPath] {
        &self.selected
    }

    /// Parameters of the last render
    pub fn last_params(&self) -> Option<&RenderParams> {
        self.last_params.as_ref()
    }

    /// Current render buffer size
    pub fn buffer_size(&self) -> (u32, u32) {
        self.buffer_size
    }

    /// Active output buffer
    pub fn aov(&self) -> &str {
        &self.aov
    }
}

fn projection_kind(projection: &DMat4) -> Projection {
    // Perspective matrices copy -z into w
    if projection.row(3).z.abs() > 0.5 {
        Projection::Perspective
    } else {
        Projection::Orthographic
    }
}

/// Outward normal of the box face closest to `point`
fn box_normal(bounds: &BoundingBox, point: DVec3) -> DVec3 {
    let mut best = (f64::INFINITY, DVec3::ZERO);
    for axis in 0..3 {
        let mut unit = DVec3::ZERO;
        unit[axis] = 1.0;
        let to_min = (point[axis] - bounds.min[axis]).abs();
        let to_max = (bounds.max[axis] - point[axis]).abs();
        if to_min < best.0 {
            best = (to_min, -unit);
        }
        if to_max < best.0 {
            best = (to_max, unit);
        }
    }
    best.1
}

/// NDC rectangle covered by `bounds`, or `None` when part of it lies behind
/// a perspective eye
fn projected_rect(frustum: &Frustum, bounds: &BoundingBox) -> Option<(DVec2, DVec2)> {
    let mut lo = DVec2::splat(f64::INFINITY);
    let mut hi = DVec2::splat(f64::NEG_INFINITY);
    for corner in 0..8 {
        let point = DVec3::new(
            if corner & 1 == 0 { bounds.min.x } else { bounds.max.x },
            if corner & 2 == 0 { bounds.min.y } else { bounds.max.y },
            if corner & 4 == 0 { bounds.min.z } else { bounds.max.z },
        );
        let ndc = frustum.project(point)?;
        lo = lo.min(ndc);
        hi = hi.max(ndc);
    }
    Some((lo, hi))
}

/// Closest hit on `bounds` seen through the pick region.
///
/// Returns the hit, the ray distance and the NDC offset of its ray from the
/// region center. Rays are cast at the point of the projected bounds nearest
/// the center, then over a grid of the covered part of the region.
fn pick_bounds(frustum: &Frustum, bounds: &BoundingBox) -> Option<(DVec3, f64, f64)> {
    let (lo, hi) = projected_rect(frustum, bounds).unwrap_or((DVec2::NEG_ONE, DVec2::ONE));
    let lo = lo.max(DVec2::NEG_ONE);
    let hi = hi.min(DVec2::ONE);
    if lo.x > hi.x || lo.y > hi.y {
        return None;
    }

    let step = (hi - lo) / (GRID_STEPS - 1) as f64;
    let grid = (0..GRID_STEPS)
        .flat_map(|i| (0..GRID_STEPS).map(move |j| (i, j)))
        .map(|(i, j)| lo + step * DVec2::new(i as f64, j as f64));

    let mut best: Option<(DVec3, f64, f64)> = None;
    for ndc in std::iter::once(DVec2::ZERO.clamp(lo, hi)).chain(grid) {
        let offset = ndc.length();
        if best.is_some_and(|(_, _, best_offset)| best_offset <= offset) {
            continue;
        }
        let ray = frustum.compute_ray(ndc);
        if let Some(distance) = bounds.intersect_ray(ray.origin, ray.direction) {
            best = Some((ray.at(distance), distance, offset));
        }
    }
    best
}

impl RenderEngine for HeadlessEngine {
    fn render(&mut self, stage: &Stage, root: &PrimPath, params: &RenderParams) {
        self.frames_rendered += 1;
        self.rendered_revision = Some(stage.revision());
        self.last_params = Some(params.clone());
        tracing::trace!("Rendered {} at {} (frame {})", root, params.frame, self.frames_rendered);
    }

    fn test_intersection(
        &mut self,
        stage: &Stage,
        pick_params: &PickParams,
        view: &DMat4,
        projection: &DMat4,
        root: &PrimPath,
        params: &RenderParams,
    ) -> Vec<IntersectionResult> {
        let frustum = Frustum::new(*view, *projection, projection_kind(projection));
        let time = params.frame;

        // Hits paired with their offset from the pick center
        let mut hits: Vec<(f64, IntersectionResult)> = Vec::new();
        let mut test = |bounds: &BoundingBox, path: &PrimPath, instance: Option<usize>| {
            if let Some((hit_point, distance, offset)) = pick_bounds(&frustum, bounds) {
                hits.push((
                    offset,
                    IntersectionResult {
                        hit_point,
                        hit_normal: box_normal(bounds, hit_point),
                        hit_prim_path: path.clone(),
                        hit_instancer_path: instance.map(|_| path.clone()),
                        hit_instance_index: instance,
                        distance,
                    },
                ));
            }
        };

        for (path, prim) in stage.subtree(root) {
            if !prim.visible {
                continue;
            }
            if path.ancestors().iter().any(|a| stage.prim(a).is_some_and(|p| !p.visible)) {
                continue;
            }
            match &prim.kind {
                PrimKind::Mesh { extent } => {
                    if let Some(world) = stage.local_to_world(path, time) {
                        test(&extent.transform(&world), path, None);
                    }
                }
                PrimKind::PointInstancer { .. } => {
                    for (index, bounds) in stage.instance_world_bounds(path, time) {
                        test(&bounds, path, Some(index));
                    }
                }
                _ => {}
            }
        }

        match pick_params.resolve_mode {
            ResolveMode::NearestToCenter => {
                hits.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.distance.total_cmp(&b.1.distance)))
            }
            _ => hits.sort_by(|a, b| a.1.distance.total_cmp(&b.1.distance)),
        }
        let mut hits: Vec<IntersectionResult> = hits.into_iter().map(|(_, hit)| hit).collect();
        match pick_params.resolve_mode {
            ResolveMode::NearestToCamera | ResolveMode::NearestToCenter => hits.truncate(1),
            ResolveMode::Unique => {
                let mut seen = Vec::new();
                hits.retain(|hit| {
                    let key = (hit.hit_prim_path.clone(), hit.hit_instance_index);
                    if seen.contains(&key) {
                        false
                    } else {
                        seen.push(key);
                        true
                    }
                });
            }
            ResolveMode::All => {}
        }
        hits
    }

    fn set_camera_state(&mut self, view: &DMat4, projection: &DMat4) {
        self.camera = Some((*view, *projection));
    }

    fn set_selected(&mut self, paths: &[PrimPath]) {
        self.selected = paths.to_vec();
    }

    fn poll_for_asynchronous_updates(&mut self, stage: &Stage) -> bool {
        if !self.allow_asynchronous_scene_processing {
            return false;
        }
        self.rendered_revision != Some(stage.revision())
    }

    fn is_converged(&self) -> bool {
        self.frames_rendered > 0
    }

    fn set_render_buffer_size(&mut self, width: u32, height: u32) {
        self.buffer_size = (width, height);
    }

    fn renderer_aovs(&self) -> Vec<String> {
        AOVS.iter().map(|aov| aov.to_string()).collect()
    }

    fn set_renderer_aov(&mut self, aov: &str) -> bool {
        if AOVS.contains(&aov) {
            self.aov = aov.to_string();
            true
        } else {
            false
        }
    }

    fn renderer_name(&self) -> &str {
        "Headless"
    }
}
