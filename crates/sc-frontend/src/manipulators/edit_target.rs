//! Prim edited by the transform manipulators

use glam::{DMat4, DVec3};
use sc_core::{PrimHandle, PrimPath, Selection, Stage, TimeCode, Transform, XformOp};

/// Generation-checked reference to the first selected xformable prim.
///
/// Re-resolved on every selection change. A target whose prim was removed or
/// redefined stops resolving, which makes the manipulators inert.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditTarget {
    handle: Option<PrimHandle>,
}

impl EditTarget {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn from_selection(stage: &Stage, selection: &Selection) -> Self {
        let handle = selection
            .first_path()
            .filter(|path| !path.is_root())
            .filter(|path| stage.prim(path).is_some_and(|prim| prim.is_xformable()))
            .and_then(|path| stage.handle(path));
        Self { handle }
    }

    pub fn path(&self) -> Option<&PrimPath> {
        self.handle.as_ref().map(|handle| &handle.path)
    }

    pub fn is_valid(&self, stage: &Stage) -> bool {
        self.handle
            .as_ref()
            .and_then(|handle| stage.resolve(handle))
            .is_some_and(|prim| prim.is_xformable())
    }

    /// Resolved path, `None` when the target is stale or empty
    fn resolved<'a>(&'a self, stage: &Stage) -> Option<&'a PrimPath> {
        if self.is_valid(stage) { self.path() } else { None }
    }

    pub fn transform(&self, stage: &Stage, time: TimeCode) -> Option<Transform> {
        stage.local_transform(self.resolved(stage)?, time)
    }

    pub fn parent_to_world(&self, stage: &Stage, time: TimeCode) -> Option<DMat4> {
        stage.parent_to_world(self.resolved(stage)?, time)
    }

    /// Orthonormal world frame of the manipulator.
    ///
    /// The frame sits at the pivot. With `with_rotation` its axes follow the
    /// prim's rotation, otherwise the parent frame.
    pub fn manipulator_to_world(&self, stage: &Stage, time: TimeCode, with_rotation: bool) -> Option<DMat4> {
        let transform = self.transform(stage, time)?;
        let parent = self.parent_to_world(stage, time)?;
        let mut local = DMat4::from_translation(transform.translation + transform.pivot);
        if with_rotation {
            local *= DMat4::from_mat3(transform.rotation_matrix());
        }
        Some(orthonormalize(&(parent * local)))
    }

    /// Time at which `op` is written: the viewport time when the attribute
    /// is animated, the default slot otherwise
    pub fn edition_time(&self, stage: &Stage, op: XformOp, time: TimeCode) -> TimeCode {
        match self.path() {
            Some(path) if stage.has_time_samples(path, op) => time,
            _ => TimeCode::Default,
        }
    }

    /// Author `value` for `op`. Returns true when the stage accepted it.
    pub fn write(&self, stage: &mut Stage, op: XformOp, value: DVec3, time: TimeCode) -> bool {
        let Some(path) = self.resolved(stage).cloned() else {
            return false;
        };
        let edit_time = self.edition_time(stage, op, time);
        match stage.set_xform_value(&path, op, value, edit_time) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Rejected {} edit on {}: {}", op.attribute_name(), path, e);
                false
            }
        }
    }
}

/// Remove scale and shear from the linear part of `matrix`, keeping the
/// direction of each axis and the translation
pub fn orthonormalize(matrix: &DMat4) -> DMat4 {
    let x = matrix.x_axis.truncate().normalize_or(DVec3::X);
    let y = matrix.y_axis.truncate();
    let y = (y - x * x.dot(y)).normalize_or(x.any_orthonormal_vector());
    let z = matrix.z_axis.truncate();
    let z = (z - x * x.dot(z) - y * y.dot(z)).normalize_or(x.cross(y));
    DMat4::from_cols(
        x.extend(0.0),
        y.extend(0.0),
        z.extend(0.0),
        matrix.w_axis.truncate().extend(1.0),
    )
}

/// Scoped edit transaction opened by a manipulator.
///
/// Tracks whether this manipulator owns the open transaction so that
/// closing is safe to call from every exit path.
#[derive(Debug, Default)]
pub struct EditSession {
    open: bool,
}

impl EditSession {
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn open(&mut self, stage: &mut Stage, label: &str) {
        if self.open {
            return;
        }
        match stage.begin_edit(label) {
            Ok(()) => {
                tracing::debug!("Opened edit transaction '{}'", label);
                self.open = true;
            }
            Err(e) => tracing::warn!("Cannot open edit transaction '{}': {}", label, e),
        }
    }

    pub fn close(&mut self, stage: &mut Stage) {
        if !self.open {
            return;
        }
        self.open = false;
        match stage.end_edit() {
            Ok(true) => tracing::debug!("Closed edit transaction with changes"),
            Ok(false) => tracing::debug!("Closed empty edit transaction"),
            Err(e) => tracing::warn!("Failed to close edit transaction: {}", e),
        }
    }
}
