//! Camera ownership for a viewport
//!
//! A viewport renders through exactly one camera at a time: the internal
//! perspective camera, one of the internal orthographic cameras, or a camera
//! prim on the stage. Navigation always edits an editable copy; for stage
//! cameras [`ViewportCameras::update`] authors the copy back onto the prim.

use glam::{DMat4, DVec3};
use sc_core::{
    BoundingBox, Prim, PrimPath, RotationOrder, SceneError, Selection, Stage, TimeCode, Transform,
    UpAxis, XformOp,
};
use sc_renderer::{Camera, ConformWindowPolicy, OrthoView};
use serde::{Deserialize, Serialize};

/// Which camera the viewport looks through
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CameraSource {
    /// Internal free perspective camera
    #[default]
    Perspective,
    /// Internal orthographic camera
    Ortho(OrthoView),
    /// Camera prim on the stage
    Stage(PrimPath),
}

/// State of the stage camera being looked through
#[derive(Debug, Clone)]
struct StageCamera {
    path: PrimPath,
    /// Copy edited by navigation
    editable: Camera,
    /// Value last read from or written to the stage
    synced: Camera,
}

/// Internal cameras plus the active camera selection
#[derive(Debug, Clone)]
pub struct ViewportCameras {
    perspective: Camera,
    ortho: [Camera; 3],
    source: CameraSource,
    stage_camera: Option<StageCamera>,
    conform_policy: ConformWindowPolicy,
    /// Active camera adapted to the viewport aspect ratio
    viewport_camera: Camera,
}

fn ortho_index(view: OrthoView) -> usize {
    match view {
        OrthoView::Top => 0,
        OrthoView::Front => 1,
        OrthoView::Right => 2,
    }
}

/// World camera for a camera prim at `time`
fn read_stage_camera(stage: &Stage, path: &PrimPath, time: TimeCode) -> Option<Camera> {
    let params = stage.prim(path)?.camera_params()?;
    let transform = stage.local_to_world(path, time)?;
    Some(Camera::from_params(params, transform))
}

impl ViewportCameras {
    pub fn new(up_axis: UpAxis) -> Self {
        let perspective = Camera::perspective(up_axis);
        Self {
            perspective,
            ortho: OrthoView::ALL.map(|view| Camera::orthographic(view, up_axis)),
            source: CameraSource::Perspective,
            stage_camera: None,
            conform_policy: ConformWindowPolicy::default(),
            viewport_camera: perspective,
        }
    }

    pub fn source(&self) -> &CameraSource {
        &self.source
    }

    pub fn conform_policy(&self) -> ConformWindowPolicy {
        self.conform_policy
    }

    pub fn set_conform_policy(&mut self, policy: ConformWindowPolicy) {
        self.conform_policy = policy;
    }

    pub fn is_using_stage_camera(&self) -> bool {
        matches!(self.source, CameraSource::Stage(_))
    }

    pub fn is_using_ortho_camera(&self) -> bool {
        matches!(self.source, CameraSource::Ortho(_))
    }

    /// Path of the stage camera in use
    pub fn stage_camera_path(&self) -> Option<&PrimPath> {
        match &self.source {
            CameraSource::Stage(path) => Some(path),
            _ => None,
        }
    }

    pub fn use_perspective_camera(&mut self) {
        self.source = CameraSource::Perspective;
        self.stage_camera = None;
    }

    pub fn use_ortho_camera(&mut self, view: OrthoView) {
        self.source = CameraSource::Ortho(view);
        self.stage_camera = None;
    }

    /// Look through a camera prim. Returns false and keeps the current
    /// camera when `path` is not a camera.
    pub fn use_stage_camera(&mut self, stage: &Stage, path: &PrimPath, time: TimeCode) -> bool {
        let Some(camera) = read_stage_camera(stage, path, time) else {
            tracing::warn!("{} is not a camera prim", path);
            return false;
        };
        tracing::info!("Looking through stage camera {}", path);
        self.source = CameraSource::Stage(path.clone());
        self.stage_camera = Some(StageCamera {
            path: path.clone(),
            editable: camera,
            synced: camera,
        });
        true
    }

    /// Camera chosen by the user, before aspect conforming
    pub fn current_camera(&self) -> &Camera {
        match (&self.source, &self.stage_camera) {
            (CameraSource::Stage(_), Some(stage_camera)) => &stage_camera.editable,
            (CameraSource::Ortho(view), _) => &self.ortho[ortho_index(*view)],
            _ => &self.perspective,
        }
    }

    /// Camera modified by navigation and framing
    pub fn editable_camera(&mut self) -> &mut Camera {
        match (&self.source, &mut self.stage_camera) {
            (CameraSource::Stage(_), Some(stage_camera)) => &mut stage_camera.editable,
            (CameraSource::Ortho(view), _) => &mut self.ortho[ortho_index(*view)],
            _ => &mut self.perspective,
        }
    }

    /// Camera used for rendering and picking, conformed to the viewport
    pub fn viewport_camera(&self) -> &Camera {
        &self.viewport_camera
    }

    /// Synchronize with the stage and conform to `aspect`.
    ///
    /// Edits made to a stage camera since the last update are authored
    /// back onto the prim; otherwise the prim is re-read so changes made
    /// elsewhere show up.
    pub fn update(&mut self, stage: &mut Stage, time: TimeCode, aspect: f64) {
        if let Some(stage_camera) = self.stage_camera.as_mut() {
            if stage_camera.editable != stage_camera.synced {
                // Moves outside a camera drag, like wheel zoom, get their own undo step
                let own_transaction = !stage.is_editing() && stage.begin_edit("Move camera").is_ok();
                if let Err(e) = write_stage_camera(stage, &stage_camera.path, &stage_camera.editable, time) {
                    tracing::warn!("Failed to update camera {}: {}", stage_camera.path, e);
                }
                if own_transaction {
                    if let Err(e) = stage.end_edit() {
                        tracing::warn!("Failed to close camera edit: {}", e);
                    }
                }
                stage_camera.synced = stage_camera.editable;
            } else {
                match read_stage_camera(stage, &stage_camera.path, time) {
                    Some(camera) => {
                        stage_camera.editable = camera;
                        stage_camera.synced = camera;
                    }
                    None => {
                        tracing::warn!(
                            "Stage camera {} is gone, using the perspective camera",
                            stage_camera.path
                        );
                        self.use_perspective_camera();
                    }
                }
            }
        }
        self.viewport_camera = self.current_camera().conformed(aspect, self.conform_policy);
    }

    // ============== Framing ==============

    /// Frame the active camera on the selected prims
    pub fn frame_selection(&mut self, stage: &Stage, selection: &Selection, time: TimeCode) {
        let mut bounds = None;
        for path in selection.paths() {
            if let Some(bound) = stage.world_bound(&path, time) {
                bounds = Some(bounds.map_or(bound, |b: BoundingBox| b.union(&bound)));
            }
        }
        match bounds {
            Some(bounds) => {
                tracing::info!("Framing selection");
                self.editable_camera().frame_bounds(&bounds);
            }
            None => self.frame_root(stage, time),
        }
    }

    /// Frame the active camera on the whole stage
    pub fn frame_root(&mut self, stage: &Stage, time: TimeCode) {
        if let Some(bounds) = stage.world_bound(&PrimPath::root(), time) {
            tracing::info!("Framing stage");
            self.editable_camera().frame_bounds(&bounds);
        }
    }

    /// Frame every internal camera on the whole stage
    pub fn frame_all_cameras(&mut self, stage: &Stage, time: TimeCode) {
        let Some(bounds) = stage.world_bound(&PrimPath::root(), time) else {
            return;
        };
        self.perspective.frame_bounds(&bounds);
        for camera in &mut self.ortho {
            camera.frame_bounds(&bounds);
        }
    }

    /// Reset the internal cameras for a new stage
    pub fn reset(&mut self, up_axis: UpAxis) {
        let policy = self.conform_policy;
        *self = Self::new(up_axis);
        self.conform_policy = policy;
    }
}

/// Author `camera` onto the camera prim at `path`
fn write_stage_camera(
    stage: &mut Stage,
    path: &PrimPath,
    camera: &Camera,
    time: TimeCode,
) -> Result<(), SceneError> {
    let parent = stage.parent_to_world(path, time).unwrap_or(DMat4::IDENTITY);
    let previous = stage
        .local_transform(path, time)
        .unwrap_or(Transform::IDENTITY);
    let local = parent.inverse() * camera.transform;
    let Some(transform) = Transform::decompose(
        &local,
        previous.pivot,
        previous.rotation_order,
        Some(previous.rotation),
    ) else {
        tracing::warn!("Camera transform for {} cannot be decomposed", path);
        return Ok(());
    };

    for (op, value) in [
        (XformOp::Translate, transform.translation),
        (XformOp::Rotate, transform.rotation),
        (XformOp::Scale, transform.scale),
    ] {
        let edit_time = if stage.has_time_samples(path, op) {
            time
        } else {
            TimeCode::Default
        };
        stage.set_xform_value(path, op, value, edit_time)?;
    }
    stage.set_camera_params(path, camera.params())
}

/// Camera prim placed like `camera`, for saving a viewpoint to the stage
pub fn camera_prim_from(camera: &Camera) -> Option<Prim> {
    let transform = Transform::decompose(&camera.transform, DVec3::ZERO, RotationOrder::XYZ, None)?;
    Some(Prim::camera(camera.params()).with_transform(transform))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use sc_core::CameraParams;

    fn path(s: &str) -> PrimPath {
        PrimPath::new(s).unwrap()
    }

    fn stage_with_camera() -> Stage {
        let mut stage = Stage::new();
        stage
            .define_prim(
                path("/Cam"),
                Prim::camera(CameraParams::default())
                    .with_transform(Transform::from_translation(DVec3::new(0.0, 0.0, 10.0))),
            )
            .unwrap();
        stage
            .define_prim(path("/Box"), Prim::cube(2.0))
            .unwrap();
        stage
    }

    #[test]
    fn test_navigation_is_written_to_stage_camera() {
        let mut stage = stage_with_camera();
        let mut cameras = ViewportCameras::new(UpAxis::Y);
        assert!(cameras.use_stage_camera(&stage, &path("/Cam"), TimeCode::Default));
        assert!(cameras.is_using_stage_camera());

        cameras.editable_camera().transform = DMat4::from_translation(DVec3::new(1.0, 2.0, 10.0));
        cameras.update(&mut stage, TimeCode::Default, 1.5);

        let written = stage.local_transform(&path("/Cam"), TimeCode::Default).unwrap();
        assert_relative_eq!(written.translation.x, 1.0, epsilon = 1e-9);
        assert_relative_eq!(written.translation.y, 2.0, epsilon = 1e-9);
        assert_relative_eq!(written.translation.z, 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_stage_edits_are_read_back() {
        let mut stage = stage_with_camera();
        let mut cameras = ViewportCameras::new(UpAxis::Y);
        cameras.use_stage_camera(&stage, &path("/Cam"), TimeCode::Default);
        stage
            .set_xform_value(&path("/Cam"), XformOp::Translate, DVec3::new(0.0, 5.0, 10.0), TimeCode::Default)
            .unwrap();
        cameras.update(&mut stage, TimeCode::Default, 1.5);
        assert_relative_eq!(cameras.current_camera().position().y, 5.0, epsilon = 1e-9);
    }

    #[test]
    fn test_removed_camera_falls_back_to_perspective() {
        let mut stage = stage_with_camera();
        let mut cameras = ViewportCameras::new(UpAxis::Y);
        cameras.use_stage_camera(&stage, &path("/Cam"), TimeCode::Default);
        stage.remove_prim(&path("/Cam")).unwrap();
        cameras.update(&mut stage, TimeCode::Default, 1.5);
        assert_eq!(cameras.source(), &CameraSource::Perspective);
        assert!(cameras.stage_camera_path().is_none());
    }

    #[test]
    fn test_non_camera_prim_is_refused() {
        let stage = stage_with_camera();
        let mut cameras = ViewportCameras::new(UpAxis::Y);
        assert!(!cameras.use_stage_camera(&stage, &path("/Box"), TimeCode::Default));
        assert_eq!(cameras.source(), &CameraSource::Perspective);
    }

    #[test]
    fn test_viewport_camera_matches_aspect() {
        let mut stage = stage_with_camera();
        let mut cameras = ViewportCameras::new(UpAxis::Y);
        for policy in [
            ConformWindowPolicy::Fit,
            ConformWindowPolicy::Crop,
            ConformWindowPolicy::MatchVertically,
            ConformWindowPolicy::MatchHorizontally,
        ] {
            cameras.set_conform_policy(policy);
            cameras.update(&mut stage, TimeCode::Default, 2.0);
            assert_relative_eq!(cameras.viewport_camera().aspect_ratio(), 2.0, epsilon = 1e-9);
        }
        // The editable camera keeps its own aperture
        assert_eq!(cameras.current_camera(), &Camera::perspective(UpAxis::Y));
    }

    #[test]
    fn test_frame_root_centers_stage() {
        let mut stage = stage_with_camera();
        stage
            .set_xform_value(&path("/Box"), XformOp::Translate, DVec3::new(4.0, 1.0, -3.0), TimeCode::Default)
            .unwrap();
        let mut cameras = ViewportCameras::new(UpAxis::Y);
        cameras.frame_selection(&stage, &Selection::new(), TimeCode::Default);
        cameras.update(&mut stage, TimeCode::Default, 1.0);

        let center = stage.world_bound(&PrimPath::root(), TimeCode::Default).unwrap().center();
        let ndc = cameras.viewport_camera().frustum().project(center).unwrap();
        assert_relative_eq!(ndc.x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(ndc.y, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_camera_prim_from_view() {
        let mut camera = Camera::perspective(UpAxis::Y);
        camera.look_at(DVec3::new(3.0, 4.0, 5.0), DVec3::ZERO, DVec3::Y);
        let prim = camera_prim_from(&camera).unwrap();
        assert_eq!(prim.camera_params(), Some(&camera.params()));
        let transform = prim.local_transform(TimeCode::Default);
        assert_relative_eq!(transform.translation.x, 3.0, epsilon = 1e-9);
        assert_relative_eq!(transform.translation.z, 5.0, epsilon = 1e-9);
    }
}
