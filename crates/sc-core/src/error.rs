//! Stage errors

use crate::edit::EditError;
use crate::path::{PathError, PrimPath};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SceneError {
    #[error("Prim not found: {0}")]
    PrimNotFound(PrimPath),
    #[error("Prim already exists: {0}")]
    PrimExists(PrimPath),
    #[error("Parent of {0} does not exist")]
    ParentMissing(PrimPath),
    #[error("Prim {0} has no transform")]
    NotXformable(PrimPath),
    #[error("Prim {0} is not a camera")]
    NotCamera(PrimPath),
    #[error("The pseudo-root cannot be edited")]
    RootNotEditable,
    #[error("Stale handle for {0}")]
    StaleHandle(PrimPath),
    #[error("Non-finite value written to {0}")]
    NonFinite(PrimPath),
    #[error(transparent)]
    Path(#[from] PathError),
    #[error(transparent)]
    Edit(#[from] EditError),
}

/// Stage file errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialize(String),
    #[error("Deserialization error: {0}")]
    Deserialize(String),
    #[error("Unsupported stage version {0}")]
    UnsupportedVersion(u32),
    #[error("Invalid stage hierarchy: {0}")]
    InvalidHierarchy(String),
}
