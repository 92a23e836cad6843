//! Click selection

use sc_core::SelectionItem;

use super::{Manipulator, ManipulatorContext, ManipulatorKind};

/// Picks the prim under the cursor on press.
///
/// Without modifiers the hit replaces the selection and a miss clears it.
/// Shift adds the hit, Ctrl toggles it.
#[derive(Debug, Default)]
pub struct SelectionManipulator;

impl SelectionManipulator {
    pub fn new() -> Self {
        Self
    }
}

impl Manipulator for SelectionManipulator {
    fn kind(&self) -> ManipulatorKind {
        ManipulatorKind::Selection
    }

    fn is_mouse_over(&mut self, ctx: &ManipulatorContext<'_>) -> bool {
        ctx.input.hovered
    }

    fn on_begin_edition(&mut self, ctx: &mut ManipulatorContext<'_>) {
        let modifiers = ctx.input.modifiers;
        let hit = ctx.test_intersection(ctx.mouse_position());
        let Some(hit) = hit else {
            if !modifiers.shift && !modifiers.ctrl {
                ctx.selection.clear();
            }
            return;
        };

        let item = match (hit.hit_instancer_path, hit.hit_instance_index) {
            (Some(instancer), Some(index)) => SelectionItem::instance(instancer, index),
            _ => SelectionItem::prim(hit.hit_prim_path),
        };
        tracing::debug!("Picked {}", item.path);
        if modifiers.ctrl {
            ctx.selection.toggle(item);
        } else if modifiers.shift {
            ctx.selection.add(item);
        } else {
            ctx.selection.replace(item);
        }
    }

    fn on_update(&mut self, ctx: &mut ManipulatorContext<'_>) -> ManipulatorKind {
        if ctx.is_dragging() {
            ManipulatorKind::Selection
        } else {
            ManipulatorKind::MouseHover
        }
    }
}
