//! Scene data model for the stage viewport
//!
//! Prims live on a [`Stage`] addressed by [`PrimPath`]. Xformable prims carry
//! decomposed, optionally time-sampled transform attributes. Edits go through
//! transactions that feed the undo history.

pub mod attribute;
pub mod bounds;
pub mod constants;
pub mod edit;
pub mod error;
pub mod path;
pub mod prim;
pub mod selection;
pub mod stage;
pub mod time;
pub mod transform;

pub use attribute::Attribute;
pub use bounds::BoundingBox;
pub use edit::{EditError, EditHistory};
pub use error::{PersistError, SceneError};
pub use path::{PathError, PrimPath};
pub use prim::{CameraParams, Prim, PrimKind, Projection, XformAttributes, XformOp};
pub use selection::{Selection, SelectionHash, SelectionItem};
pub use stage::{PrimHandle, Stage, UpAxis};
pub use time::TimeCode;
pub use transform::{RotationOrder, Transform, euler_to_matrix, matrix_to_euler};
