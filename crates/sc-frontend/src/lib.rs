//! Stage viewport frontend
//!
//! Viewport controller, transform manipulators and camera handling for a
//! stage, driven by egui input or by replayed scripts.

pub mod gpu;
pub mod input;
pub mod manipulators;
pub mod script;
pub mod settings;
pub mod viewport;
pub mod viewport_cameras;

pub use gpu::GizmoGpu;
pub use input::{InputEvent, InputState, Key, Modifiers, MouseButton, ViewportInput};
pub use manipulators::{Manipulator, ManipulatorContext, ManipulatorKind, ManipulatorSet};
pub use script::{Script, ScriptCommand, ScriptError, ScriptReport};
pub use settings::{SettingsError, ViewportSettings};
pub use viewport::{SharedSelection, SharedStage, Viewport};
pub use viewport_cameras::{CameraSource, ViewportCameras};

/// Process exit code when the gizmo shader cannot be compiled
pub const EXIT_UNABLE_TO_COMPILE_SHADER: i32 = 3;
