//! Stage: the prim hierarchy being viewed and edited

use std::collections::BTreeMap;
use std::path::Path;

use glam::{DMat4, DVec3};
use serde::{Deserialize, Serialize};

use crate::bounds::BoundingBox;
use crate::constants::STAGE_FORMAT_VERSION;
use crate::edit::{EditHistory, EditRecord};
use crate::error::{PersistError, SceneError};
use crate::path::PrimPath;
use crate::prim::{CameraParams, Prim, PrimKind, XformOp, instance_extent};
use crate::time::TimeCode;
use crate::transform::Transform;

/// Stage up axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UpAxis {
    #[default]
    Y,
    Z,
}

impl UpAxis {
    pub fn up_vector(&self) -> DVec3 {
        match self {
            UpAxis::Y => DVec3::Y,
            UpAxis::Z => DVec3::Z,
        }
    }
}

/// Reference to a prim that detects removal and redefinition.
///
/// Handles are resolved through [`Stage::resolve`] on every use, so a
/// handle kept across edits fails to resolve instead of pointing at a
/// different prim defined at the same path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PrimHandle {
    pub path: PrimPath,
    generation: u64,
}

#[derive(Debug, Clone)]
struct PrimEntry {
    prim: Prim,
    generation: u64,
}

/// Serialization format
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StageData {
    version: u32,
    #[serde(default)]
    up_axis: UpAxis,
    prims: Vec<(PrimPath, Prim)>,
}

#[derive(Debug, Clone, Default)]
pub struct Stage {
    prims: BTreeMap<PrimPath, PrimEntry>,
    up_axis: UpAxis,
    next_generation: u64,
    /// Bumped on every mutation
    revision: u64,
    history: EditHistory,
}

impl Stage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn up_axis(&self) -> UpAxis {
        self.up_axis
    }

    pub fn set_up_axis(&mut self, up_axis: UpAxis) {
        self.up_axis = up_axis;
        self.touch();
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    // ============== Hierarchy ==============

    pub fn prim(&self, path: &PrimPath) -> Option<&Prim> {
        self.prims.get(path).map(|entry| &entry.prim)
    }

    pub fn contains(&self, path: &PrimPath) -> bool {
        path.is_root() || self.prims.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.prims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prims.is_empty()
    }

    /// All prims in depth-first path order
    pub fn prims(&self) -> impl Iterator<Item = (&PrimPath, &Prim)> {
        self.prims.iter().map(|(path, entry)| (path, &entry.prim))
    }

    /// `path` and all of its descendants, in path order
    pub fn subtree<'a>(&'a self, path: &'a PrimPath) -> impl Iterator<Item = (&'a PrimPath, &'a Prim)> {
        self.prims
            .range(path.clone()..)
            .take_while(move |(candidate, _)| candidate.has_prefix(path))
            .map(|(path, entry)| (path, &entry.prim))
    }

    pub fn children<'a>(&'a self, path: &'a PrimPath) -> impl Iterator<Item = &'a PrimPath> {
        let depth = path.depth() + 1;
        self.subtree(path)
            .map(|(child, _)| child)
            .filter(move |child| child.depth() == depth)
    }

    pub fn camera_paths(&self) -> Vec<PrimPath> {
        self.prims()
            .filter(|(_, prim)| matches!(prim.kind, PrimKind::Camera(_)))
            .map(|(path, _)| path.clone())
            .collect()
    }

    /// Define a new prim below an existing parent
    pub fn define_prim(&mut self, path: PrimPath, prim: Prim) -> Result<PrimHandle, SceneError> {
        if path.is_root() {
            return Err(SceneError::RootNotEditable);
        }
        if self.prims.contains_key(&path) {
            return Err(SceneError::PrimExists(path));
        }
        let parent_exists = path.parent().is_some_and(|parent| self.contains(&parent));
        if !parent_exists {
            return Err(SceneError::ParentMissing(path));
        }
        self.next_generation += 1;
        let generation = self.next_generation;
        tracing::debug!("Defined {} prim {}", prim.kind.type_name(), path);
        self.prims.insert(path.clone(), PrimEntry { prim, generation });
        self.touch();
        Ok(PrimHandle { path, generation })
    }

    /// Remove a prim and its descendants. Returns the removed prim.
    pub fn remove_prim(&mut self, path: &PrimPath) -> Result<Prim, SceneError> {
        if path.is_root() {
            return Err(SceneError::RootNotEditable);
        }
        let doomed: Vec<PrimPath> = self.subtree(path).map(|(p, _)| p.clone()).collect();
        let mut removed = None;
        for doomed_path in doomed {
            let entry = self.prims.remove(&doomed_path);
            if doomed_path == *path {
                removed = entry.map(|e| e.prim);
            }
        }
        let prim = removed.ok_or_else(|| SceneError::PrimNotFound(path.clone()))?;
        self.touch();
        Ok(prim)
    }

    pub fn handle(&self, path: &PrimPath) -> Option<PrimHandle> {
        self.prims.get(path).map(|entry| PrimHandle {
            path: path.clone(),
            generation: entry.generation,
        })
    }

    /// Resolve a handle, `None` when the prim was removed or redefined
    pub fn resolve(&self, handle: &PrimHandle) -> Option<&Prim> {
        self.prims
            .get(&handle.path)
            .filter(|entry| entry.generation == handle.generation)
            .map(|entry| &entry.prim)
    }

    pub fn is_valid(&self, handle: &PrimHandle) -> bool {
        self.resolve(handle).is_some()
    }

    // ============== Transforms ==============

    pub fn local_transform(&self, path: &PrimPath, time: TimeCode) -> Option<Transform> {
        if path.is_root() {
            return Some(Transform::IDENTITY);
        }
        self.prim(path).map(|prim| prim.local_transform(time))
    }

    /// World transform of the parent of `path`
    pub fn parent_to_world(&self, path: &PrimPath, time: TimeCode) -> Option<DMat4> {
        if !self.contains(path) {
            return None;
        }
        let mut matrix = DMat4::IDENTITY;
        for ancestor in path.ancestors() {
            if let Some(prim) = self.prim(&ancestor) {
                matrix *= prim.local_transform(time).to_matrix();
            }
        }
        Some(matrix)
    }

    pub fn local_to_world(&self, path: &PrimPath, time: TimeCode) -> Option<DMat4> {
        let parent = self.parent_to_world(path, time)?;
        let local = self.local_transform(path, time)?;
        Some(parent * local.to_matrix())
    }

    /// World-space bounds of a prim and its descendants
    pub fn world_bound(&self, path: &PrimPath, time: TimeCode) -> Option<BoundingBox> {
        let mut bounds = BoundingBox::empty();
        for (prim_path, prim) in self.subtree(path) {
            if !prim.visible {
                continue;
            }
            let Some(extent) = prim.local_extent() else {
                continue;
            };
            if let Some(world) = self.local_to_world(prim_path, time) {
                bounds = bounds.union(&extent.transform(&world));
            }
        }
        bounds.is_valid().then_some(bounds)
    }

    /// World-space bounds of each instance of a point instancer
    pub fn instance_world_bounds(&self, path: &PrimPath, time: TimeCode) -> Vec<(usize, BoundingBox)> {
        let Some(PrimKind::PointInstancer {
            prototype_extent,
            positions,
        }) = self.prim(path).map(|p| &p.kind)
        else {
            return Vec::new();
        };
        let Some(world) = self.local_to_world(path, time) else {
            return Vec::new();
        };
        positions
            .iter()
            .enumerate()
            .map(|(index, position)| (index, instance_extent(prototype_extent, *position).transform(&world)))
            .collect()
    }

    // ============== Attribute edits ==============

    fn xformable(&self, path: &PrimPath) -> Result<&Prim, SceneError> {
        if path.is_root() {
            return Err(SceneError::RootNotEditable);
        }
        let prim = self
            .prim(path)
            .ok_or_else(|| SceneError::PrimNotFound(path.clone()))?;
        if !prim.is_xformable() {
            return Err(SceneError::NotXformable(path.clone()));
        }
        Ok(prim)
    }

    /// Resolved value of a transform component
    pub fn xform_value(&self, path: &PrimPath, op: XformOp, time: TimeCode) -> Result<DVec3, SceneError> {
        let prim = self.xformable(path)?;
        Ok(prim
            .xform
            .as_ref()
            .map(|xform| xform.value(op, time))
            .unwrap_or_else(|| op.fallback()))
    }

    pub fn has_time_samples(&self, path: &PrimPath, op: XformOp) -> bool {
        self.prim(path)
            .and_then(|prim| prim.xform.as_ref())
            .is_some_and(|xform| xform.attribute(op).has_time_samples())
    }

    /// Author a transform component at `time`, recording it for undo
    pub fn set_xform_value(
        &mut self,
        path: &PrimPath,
        op: XformOp,
        value: DVec3,
        time: TimeCode,
    ) -> Result<(), SceneError> {
        if !value.is_finite() {
            return Err(SceneError::NonFinite(path.clone()));
        }
        self.xformable(path)?;
        let before = self.write_slot(path, op, time, Some(value));
        self.history.record(EditRecord {
            path: path.clone(),
            op,
            time,
            before,
            after: Some(value),
        });
        Ok(())
    }

    /// Write one slot without recording. Returns the previous opinion.
    fn write_slot(&mut self, path: &PrimPath, op: XformOp, time: TimeCode, value: Option<DVec3>) -> Option<DVec3> {
        let xform = self.prims.get_mut(path)?.prim.xform.as_mut()?;
        let attribute = xform.attribute_mut(op);
        let before = attribute.authored_at(time);
        match value {
            Some(value) => attribute.set(value, time),
            None => attribute.clear(time),
        }
        self.touch();
        before
    }

    pub fn set_camera_params(&mut self, path: &PrimPath, params: CameraParams) -> Result<(), SceneError> {
        let entry = self
            .prims
            .get_mut(path)
            .ok_or_else(|| SceneError::PrimNotFound(path.clone()))?;
        match &mut entry.prim.kind {
            PrimKind::Camera(existing) => *existing = params,
            _ => return Err(SceneError::NotCamera(path.clone())),
        }
        self.touch();
        Ok(())
    }

    // ============== Transactions ==============

    /// Open an edit transaction; fails if one is already open
    pub fn begin_edit(&mut self, label: impl Into<String>) -> Result<(), SceneError> {
        self.history.begin(label)?;
        Ok(())
    }

    /// Close the open transaction. Returns true when an undo step was added.
    pub fn end_edit(&mut self) -> Result<bool, SceneError> {
        Ok(self.history.end()?)
    }

    pub fn is_editing(&self) -> bool {
        self.history.is_open()
    }

    pub fn history(&self) -> &EditHistory {
        &self.history
    }

    /// Revert the last transaction. Returns false when there is nothing to
    /// undo or a transaction is open.
    pub fn undo(&mut self) -> bool {
        let Some(transaction) = self.history.take_undo() else {
            return false;
        };
        for record in transaction.records.iter().rev() {
            self.apply_record(record, record.before);
        }
        tracing::debug!("Undo '{}'", transaction.label);
        self.history.push_redo(transaction);
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(transaction) = self.history.take_redo() else {
            return false;
        };
        for record in &transaction.records {
            self.apply_record(record, record.after);
        }
        tracing::debug!("Redo '{}'", transaction.label);
        self.history.push_undo(transaction);
        true
    }

    fn apply_record(&mut self, record: &EditRecord, value: Option<DVec3>) {
        if self.prim(&record.path).is_none() {
            tracing::warn!("Skipping history record for missing prim {}", record.path);
            return;
        }
        self.write_slot(&record.path, record.op, record.time, value);
    }

    // ============== Persistence ==============

    /// Save stage to a file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        let content = self.to_bytes()?;
        std::fs::write(path.as_ref(), content).map_err(|e| PersistError::Io(e.to_string()))?;
        tracing::info!("Saved stage to {}", path.as_ref().display());
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, PersistError> {
        let data = StageData {
            version: STAGE_FORMAT_VERSION,
            up_axis: self.up_axis,
            prims: self
                .prims()
                .map(|(path, prim)| (path.clone(), prim.clone()))
                .collect(),
        };
        let content = ron::ser::to_string_pretty(&data, ron::ser::PrettyConfig::default())
            .map_err(|e| PersistError::Serialize(e.to_string()))?;
        Ok(content.into_bytes())
    }

    /// Load stage from a file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let content = std::fs::read(path.as_ref()).map_err(|e| PersistError::Io(e.to_string()))?;
        let stage = Self::load_from_bytes(&content)?;
        tracing::info!(
            "Loaded stage from {} ({} prims)",
            path.as_ref().display(),
            stage.len()
        );
        Ok(stage)
    }

    pub fn load_from_bytes(data: &[u8]) -> Result<Self, PersistError> {
        let content = std::str::from_utf8(data).map_err(|e| PersistError::Deserialize(e.to_string()))?;
        let data: StageData =
            ron::from_str(content).map_err(|e| PersistError::Deserialize(e.to_string()))?;
        if data.version > STAGE_FORMAT_VERSION {
            return Err(PersistError::UnsupportedVersion(data.version));
        }

        let mut stage = Stage::new();
        stage.up_axis = data.up_axis;
        let mut prims = data.prims;
        prims.sort_by_key(|(path, _)| path.depth());
        for (path, mut prim) in prims {
            if prim.kind.is_xformable() && prim.xform.is_none() {
                prim.xform = Some(Default::default());
            }
            if !prim.kind.is_xformable() {
                prim.xform = None;
            }
            stage
                .define_prim(path, prim)
                .map_err(|e| PersistError::InvalidHierarchy(e.to_string()))?;
        }
        Ok(stage)
    }
}
