//! Stage viewport renderer
//!
//! Cameras, frusta and picking math, the render and simulation engine
//! contracts, and a WGPU renderer for manipulator gizmos.

pub mod camera;
pub mod config;
pub mod constants;
pub mod engine;
pub mod frustum;
pub mod geometry;
pub mod gizmo;
pub mod headless;
pub mod render_params;
pub mod simulation;

pub use camera::*;
pub use config::*;
pub use engine::*;
pub use frustum::Frustum;
pub use geometry::{Plane, Ray};
pub use gizmo::*;
pub use headless::HeadlessEngine;
pub use render_params::*;
pub use simulation::*;
