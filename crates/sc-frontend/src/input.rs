//! Per-frame input snapshot for the viewport
//!
//! The viewport never reads a windowing library directly. Each frame it
//! receives a [`ViewportInput`], built either from egui or from a scripted
//! list of [`InputEvent`]s accumulated by an [`InputState`].

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Mouse buttons the viewport reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl MouseButton {
    fn index(self) -> usize {
        match self {
            MouseButton::Left => 0,
            MouseButton::Right => 1,
            MouseButton::Middle => 2,
        }
    }
}

/// Keys bound to viewport shortcuts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    W,
    E,
    R,
    Q,
    F,
    A,
    Z,
    Escape,
}

/// Modifier keys held this frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    pub alt: bool,
    pub ctrl: bool,
    pub shift: bool,
}

/// Input seen by the viewport during one frame
#[derive(Debug, Clone, PartialEq)]
pub struct ViewportInput {
    /// Cursor in normalized device coordinates, `[-1, 1]` with +y up
    pub mouse_position: DVec2,
    /// Cursor motion since the previous frame, in NDC units
    pub mouse_delta: DVec2,
    buttons_down: [bool; 3],
    buttons_pressed: [bool; 3],
    buttons_released: [bool; 3],
    /// Scroll wheel notches, positive away from the user
    pub scroll: f64,
    pub modifiers: Modifiers,
    /// Keys pressed this frame
    pub keys_pressed: Vec<Key>,
    /// Cursor is over the viewport
    pub hovered: bool,
    /// Viewport has keyboard and mouse focus
    pub focused: bool,
    /// Viewport size in pixels
    pub viewport_size: DVec2,
}

impl Default for ViewportInput {
    fn default() -> Self {
        Self {
            mouse_position: DVec2::ZERO,
            mouse_delta: DVec2::ZERO,
            buttons_down: [false; 3],
            buttons_pressed: [false; 3],
            buttons_released: [false; 3],
            scroll: 0.0,
            modifiers: Modifiers::default(),
            keys_pressed: Vec::new(),
            hovered: true,
            focused: true,
            viewport_size: DVec2::new(800.0, 600.0),
        }
    }
}

impl ViewportInput {
    pub fn is_down(&self, button: MouseButton) -> bool {
        self.buttons_down[button.index()]
    }

    /// Button went down this frame
    pub fn pressed(&self, button: MouseButton) -> bool {
        self.buttons_pressed[button.index()]
    }

    /// Button went up this frame
    pub fn released(&self, button: MouseButton) -> bool {
        self.buttons_released[button.index()]
    }

    pub fn any_down(&self) -> bool {
        self.buttons_down.iter().any(|&down| down)
    }

    pub fn key_pressed(&self, key: Key) -> bool {
        self.keys_pressed.contains(&key)
    }

    /// Width over height of the viewport
    pub fn aspect_ratio(&self) -> f64 {
        if self.viewport_size.y <= 0.0 {
            return 1.0;
        }
        self.viewport_size.x / self.viewport_size.y
    }

    /// Convert a pixel position (origin top-left) to NDC
    pub fn pixel_to_ndc(pixel: DVec2, size: DVec2) -> DVec2 {
        let size = size.max(DVec2::ONE);
        DVec2::new(pixel.x / size.x * 2.0 - 1.0, 1.0 - pixel.y / size.y * 2.0)
    }

    /// Build a snapshot from egui for a viewport widget.
    ///
    /// `previous` supplies the last cursor position for motion deltas.
    pub fn from_egui(input: &egui::InputState, response: &egui::Response, previous: &ViewportInput) -> Self {
        let rect = response.rect;
        let size = DVec2::new(rect.width() as f64, rect.height() as f64);
        let mouse_position = input
            .pointer
            .latest_pos()
            .map(|pos| {
                let local = pos - rect.min;
                Self::pixel_to_ndc(DVec2::new(local.x as f64, local.y as f64), size)
            })
            .unwrap_or(previous.mouse_position);

        let buttons = [
            egui::PointerButton::Primary,
            egui::PointerButton::Secondary,
            egui::PointerButton::Middle,
        ];
        let mut buttons_down = [false; 3];
        let mut buttons_pressed = [false; 3];
        let mut buttons_released = [false; 3];
        for (i, button) in buttons.iter().enumerate() {
            buttons_down[i] = input.pointer.button_down(*button);
            buttons_pressed[i] = input.pointer.button_pressed(*button) && response.hovered();
            buttons_released[i] = input.pointer.button_released(*button);
        }

        let bindings = [
            (egui::Key::W, Key::W),
            (egui::Key::E, Key::E),
            (egui::Key::R, Key::R),
            (egui::Key::Q, Key::Q),
            (egui::Key::F, Key::F),
            (egui::Key::A, Key::A),
            (egui::Key::Z, Key::Z),
            (egui::Key::Escape, Key::Escape),
        ];
        let keys_pressed = if response.hovered() {
            bindings
                .iter()
                .filter(|(egui_key, _)| input.key_pressed(*egui_key))
                .map(|(_, key)| *key)
                .collect()
        } else {
            Vec::new()
        };

        Self {
            mouse_position,
            mouse_delta: mouse_position - previous.mouse_position,
            buttons_down,
            buttons_pressed,
            buttons_released,
            scroll: if response.hovered() {
                (input.raw_scroll_delta.y / 50.0) as f64
            } else {
                0.0
            },
            modifiers: Modifiers {
                alt: input.modifiers.alt,
                ctrl: input.modifiers.command,
                shift: input.modifiers.shift,
            },
            keys_pressed,
            hovered: response.hovered(),
            focused: input.focused,
            viewport_size: size,
        }
    }
}

/// Recorded or scripted input event
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    /// Move the cursor to an NDC position
    MoveTo(f64, f64),
    Press(MouseButton),
    Release(MouseButton),
    Scroll(f64),
    Key(Key),
    Modifiers(Modifiers),
    /// Viewport size in pixels
    Resize(f64, f64),
    FocusLost,
    FocusGained,
}

/// Accumulates events into per-frame snapshots
#[derive(Debug, Clone, Default)]
pub struct InputState {
    current: ViewportInput,
    last_position: DVec2,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: &InputEvent) {
        let input = &mut self.current;
        match *event {
            InputEvent::MoveTo(x, y) => input.mouse_position = DVec2::new(x, y),
            InputEvent::Press(button) => {
                input.buttons_down[button.index()] = true;
                input.buttons_pressed[button.index()] = true;
            }
            InputEvent::Release(button) => {
                input.buttons_down[button.index()] = false;
                input.buttons_released[button.index()] = true;
            }
            InputEvent::Scroll(amount) => input.scroll += amount,
            InputEvent::Key(key) => input.keys_pressed.push(key),
            InputEvent::Modifiers(modifiers) => input.modifiers = modifiers,
            InputEvent::Resize(width, height) => input.viewport_size = DVec2::new(width, height),
            InputEvent::FocusLost => input.focused = false,
            InputEvent::FocusGained => input.focused = true,
        }
    }

    /// Snapshot for this frame; clears the per-frame edges
    pub fn snapshot(&mut self) -> ViewportInput {
        let mut input = self.current.clone();
        input.mouse_delta = input.mouse_position - self.last_position;
        self.last_position = input.mouse_position;

        self.current.buttons_pressed = [false; 3];
        self.current.buttons_released = [false; 3];
        self.current.scroll = 0.0;
        self.current.keys_pressed.clear();
        input
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_to_ndc() {
        let size = DVec2::new(200.0, 100.0);
        assert_eq!(ViewportInput::pixel_to_ndc(DVec2::ZERO, size), DVec2::new(-1.0, 1.0));
        assert_eq!(ViewportInput::pixel_to_ndc(DVec2::new(100.0, 50.0), size), DVec2::ZERO);
        assert_eq!(ViewportInput::pixel_to_ndc(size, size), DVec2::new(1.0, -1.0));
    }

    #[test]
    fn test_edges_last_one_frame() {
        let mut state = InputState::new();
        state.apply(&InputEvent::MoveTo(0.5, 0.0));
        state.apply(&InputEvent::Press(MouseButton::Left));
        state.apply(&InputEvent::Key(Key::W));

        let first = state.snapshot();
        assert!(first.pressed(MouseButton::Left));
        assert!(first.is_down(MouseButton::Left));
        assert!(first.key_pressed(Key::W));
        assert_eq!(first.mouse_delta, DVec2::new(0.5, 0.0));

        let second = state.snapshot();
        assert!(!second.pressed(MouseButton::Left));
        assert!(second.is_down(MouseButton::Left));
        assert!(second.keys_pressed.is_empty());
        assert_eq!(second.mouse_delta, DVec2::ZERO);

        state.apply(&InputEvent::Release(MouseButton::Left));
        let third = state.snapshot();
        assert!(third.released(MouseButton::Left));
        assert!(!third.any_down());
    }

    /// Run one egui frame over a 200x100 screen and convert its input
    fn egui_frame(ctx: &egui::Context, events: Vec<egui::Event>) -> ViewportInput {
        let screen = egui::Rect::from_min_size(egui::Pos2::ZERO, egui::vec2(200.0, 100.0));
        let raw = egui::RawInput {
            screen_rect: Some(screen),
            events,
            ..Default::default()
        };
        let mut converted = ViewportInput::default();
        let _ = ctx.run(raw, |ctx| {
            egui::CentralPanel::default()
                .frame(egui::Frame::none())
                .show(ctx, |ui| {
                    let response = ui.allocate_rect(screen, egui::Sense::click_and_drag());
                    converted = ui.input(|input| ViewportInput::from_egui(input, &response, &ViewportInput::default()));
                });
        });
        converted
    }

    #[test]
    fn test_egui_events_become_viewport_input() {
        let ctx = egui::Context::default();
        let pos = egui::pos2(150.0, 25.0);
        // Hover is resolved against the widgets of the previous frame
        egui_frame(&ctx, vec![egui::Event::PointerMoved(pos)]);

        let input = egui_frame(
            &ctx,
            vec![
                egui::Event::PointerButton {
                    pos,
                    button: egui::PointerButton::Primary,
                    pressed: true,
                    modifiers: egui::Modifiers::default(),
                },
                egui::Event::Key {
                    key: egui::Key::W,
                    physical_key: None,
                    pressed: true,
                    repeat: false,
                    modifiers: egui::Modifiers::default(),
                },
            ],
        );
        assert_eq!(input.viewport_size, DVec2::new(200.0, 100.0));
        assert_eq!(input.mouse_position, DVec2::new(0.5, 0.5));
        assert_eq!(input.mouse_delta, DVec2::new(0.5, 0.5));
        assert!(input.hovered);
        assert!(input.focused);
        assert!(input.pressed(MouseButton::Left));
        assert!(input.is_down(MouseButton::Left));
        assert!(input.key_pressed(Key::W));

        let released = egui_frame(
            &ctx,
            vec![egui::Event::PointerButton {
                pos,
                button: egui::PointerButton::Primary,
                pressed: false,
                modifiers: egui::Modifiers::default(),
            }],
        );
        assert!(released.released(MouseButton::Left));
        assert!(!released.any_down());
        assert!(released.keys_pressed.is_empty());
    }
}
