//! Idle state of the viewport state machine

use super::{Manipulator, ManipulatorContext, ManipulatorKind};

/// Does nothing; the state machine rests here between drags
#[derive(Debug, Default)]
pub struct MouseHoverManipulator;

impl Manipulator for MouseHoverManipulator {
    fn kind(&self) -> ManipulatorKind {
        ManipulatorKind::MouseHover
    }

    fn on_update(&mut self, _ctx: &mut ManipulatorContext<'_>) -> ManipulatorKind {
        ManipulatorKind::MouseHover
    }
}
