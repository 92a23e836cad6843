//! Scripted viewport sessions
//!
//! A script is a RON list of commands replayed against a [`Viewport`].
//! Input events accumulate until a `Frame` command, which feeds one
//! snapshot through the manipulator state machine and renders.
//!
//! ```ron
//! (
//!     commands: [
//!         Resize(800.0, 600.0),
//!         Select(["/World/Cube"]),
//!         Choose(Rotation),
//!         Drag(button: Left, from: (0.0, 0.3), to: (0.3, 0.0), steps: 8),
//!     ],
//! )
//! ```

use std::path::Path;

use sc_core::{PrimPath, SceneError, SelectionItem, TimeCode};
use sc_renderer::OrthoView;
use serde::{Deserialize, Serialize};

use crate::gpu::GizmoGpu;
use crate::input::{InputEvent, InputState, MouseButton};
use crate::manipulators::ManipulatorKind;
use crate::viewport::Viewport;

#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse script: {0}")]
    Parse(String),
    #[error("No camera prim at {0}")]
    NotACamera(PrimPath),
    #[error(transparent)]
    Scene(#[from] SceneError),
}

/// Camera to look through
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScriptCamera {
    Perspective,
    Ortho(OrthoView),
    Stage(PrimPath),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScriptCommand {
    /// Queue a single input event for the next frame
    Input(InputEvent),
    /// Shorthand for `Input(Resize(..))`
    Resize(f64, f64),
    /// Run one frame
    Frame,
    /// Run several frames without new input
    Frames(u32),
    /// Press at `from`, move to `to` over `steps` frames, release
    Drag {
        button: MouseButton,
        from: (f64, f64),
        to: (f64, f64),
        steps: u32,
    },
    /// Left click at an NDC position
    Click(f64, f64),
    Choose(ManipulatorKind),
    /// Replace the selection
    Select(Vec<PrimPath>),
    ClearSelection,
    SetTime(TimeCode),
    UseCamera(ScriptCamera),
    /// Save the current view as a camera prim and look through it
    CreateCamera(PrimPath),
    FrameSelection,
    FrameRoot,
    FrameAllCameras,
    Undo,
    Redo,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Script {
    pub commands: Vec<ScriptCommand>,
}

/// Counters collected while replaying a script
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScriptReport {
    pub frames: u64,
    pub renders: u64,
}

impl Script {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScriptError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let script = Self::parse(&content)?;
        tracing::info!(
            "Loaded script {} ({} commands)",
            path.as_ref().display(),
            script.commands.len()
        );
        Ok(script)
    }

    pub fn parse(content: &str) -> Result<Self, ScriptError> {
        ron::from_str(content).map_err(|e| ScriptError::Parse(e.to_string()))
    }

    /// Replay every command against `viewport`, drawing gizmos on `gpu` each
    /// frame when given
    pub fn run(&self, viewport: &mut Viewport, gpu: Option<&mut GizmoGpu>) -> Result<ScriptReport, ScriptError> {
        let mut runner = ScriptRunner {
            viewport,
            gpu,
            input: InputState::new(),
            report: ScriptReport::default(),
        };
        for command in &self.commands {
            runner.execute(command)?;
        }
        // Flush events queued after the last frame
        runner.frame();
        tracing::info!(
            "Script finished: {} frames, {} renders",
            runner.report.frames,
            runner.report.renders
        );
        Ok(runner.report)
    }
}

struct ScriptRunner<'a> {
    viewport: &'a mut Viewport,
    gpu: Option<&'a mut GizmoGpu>,
    input: InputState,
    report: ScriptReport,
}

impl ScriptRunner<'_> {
    fn frame(&mut self) {
        self.viewport.update(self.input.snapshot());
        if self.viewport.render() {
            self.report.renders += 1;
        }
        if let Some(gpu) = self.gpu.as_deref_mut() {
            gpu.draw(self.viewport);
        }
        self.report.frames += 1;
    }

    fn execute(&mut self, command: &ScriptCommand) -> Result<(), ScriptError> {
        tracing::trace!("Script command {:?}", command);
        match command {
            ScriptCommand::Input(event) => self.input.apply(event),
            ScriptCommand::Resize(width, height) => self.input.apply(&InputEvent::Resize(*width, *height)),
            ScriptCommand::Frame => self.frame(),
            ScriptCommand::Frames(count) => {
                for _ in 0..*count {
                    self.frame();
                }
            }
            ScriptCommand::Drag {
                button,
                from,
                to,
                steps,
            } => {
                self.input.apply(&InputEvent::MoveTo(from.0, from.1));
                self.frame();
                self.input.apply(&InputEvent::Press(*button));
                self.frame();
                let steps = (*steps).max(1);
                for step in 1..=steps {
                    let t = step as f64 / steps as f64;
                    self.input.apply(&InputEvent::MoveTo(
                        from.0 + (to.0 - from.0) * t,
                        from.1 + (to.1 - from.1) * t,
                    ));
                    self.frame();
                }
                self.input.apply(&InputEvent::Release(*button));
                self.frame();
            }
            ScriptCommand::Click(x, y) => {
                self.input.apply(&InputEvent::MoveTo(*x, *y));
                self.input.apply(&InputEvent::Press(MouseButton::Left));
                self.frame();
                self.input.apply(&InputEvent::Release(MouseButton::Left));
                self.frame();
            }
            ScriptCommand::Choose(kind) => self.viewport.choose_manipulator(*kind),
            ScriptCommand::Select(paths) => {
                let mut selection = self.viewport.selection().lock();
                selection.clear();
                for path in paths {
                    selection.add(SelectionItem::prim(path.clone()));
                }
            }
            ScriptCommand::ClearSelection => self.viewport.selection().lock().clear(),
            ScriptCommand::SetTime(time) => self.viewport.set_current_time(*time),
            ScriptCommand::UseCamera(camera) => match camera {
                ScriptCamera::Perspective => self.viewport.use_perspective_camera(),
                ScriptCamera::Ortho(view) => self.viewport.use_ortho_camera(*view),
                ScriptCamera::Stage(path) => {
                    if !self.viewport.use_stage_camera(path) {
                        return Err(ScriptError::NotACamera(path.clone()));
                    }
                }
            },
            ScriptCommand::CreateCamera(path) => self.viewport.create_camera_from_view(path.clone())?,
            ScriptCommand::FrameSelection => self.viewport.frame_camera_on_selection(),
            ScriptCommand::FrameRoot => self.viewport.frame_camera_on_root_prim(),
            ScriptCommand::FrameAllCameras => self.viewport.frame_all_cameras(),
            ScriptCommand::Undo => {
                self.viewport.undo();
            }
            ScriptCommand::Redo => {
                self.viewport.redo();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_script() {
        let script = Script::parse(
            r#"(commands: [
                Resize(640.0, 480.0),
                Select(["/World/Cube"]),
                Choose(Scale),
                Drag(button: Left, from: (0.0, 0.0), to: (0.5, 0.0), steps: 4),
                Input(Key(Z)),
                SetTime(Frame(12.0)),
                UseCamera(Ortho(Top)),
                Frames(2),
            ])"#,
        )
        .unwrap();
        assert_eq!(script.commands.len(), 8);
        assert_eq!(script.commands[2], ScriptCommand::Choose(ManipulatorKind::Scale));
        assert_eq!(
            script.commands[1],
            ScriptCommand::Select(vec![PrimPath::new("/World/Cube").unwrap()])
        );
    }

    #[test]
    fn test_invalid_path_is_rejected() {
        assert!(matches!(
            Script::parse(r#"(commands: [Select(["World"])])"#),
            Err(ScriptError::Parse(_))
        ));
    }
}
