use std::collections::HashSet;

use glam::Vec2;

use super::frame::{InputSource, KeyboardAxes};
use super::types::{InputEvent, Key, KeyState, MouseButton, MouseButtonState};

/// Current input state for a single window.
///
/// Holds "is down" information and the pointer position. Velocity is the
/// pointer displacement since the last [`end_frame`](Self::end_frame).
#[derive(Debug, Default)]
pub struct InputState {
    /// Last known pointer position in physical pixels.
    pub pointer_pos: Vec2,

    /// Pointer position at the end of the previous frame.
    frame_start_pos: Vec2,

    /// False until the first move and again after the pointer leaves.
    pointer_inside: bool,

    pub keys_down: HashSet<Key>,

    pub buttons_down: HashSet<MouseButton>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a platform-agnostic input event.
    pub fn apply_event(&mut self, ev: InputEvent) {
        match ev {
            // Releases are not delivered to an unfocused window.
            InputEvent::Focused(false) => {
                self.keys_down.clear();
                self.buttons_down.clear();
            }
            InputEvent::Focused(true) => {}

            InputEvent::PointerMoved { x, y } => {
                self.pointer_pos = Vec2::new(x, y);
                if !self.pointer_inside {
                    // Entering is not movement.
                    self.frame_start_pos = self.pointer_pos;
                    self.pointer_inside = true;
                }
            }

            // Keep the last position so the gradient does not jump.
            InputEvent::PointerLeft => {
                self.pointer_inside = false;
            }

            InputEvent::Key { key, state, .. } => match state {
                KeyState::Pressed => {
                    self.keys_down.insert(key);
                }
                KeyState::Released => {
                    self.keys_down.remove(&key);
                }
            },

            InputEvent::PointerButton { button, state } => match state {
                MouseButtonState::Pressed => {
                    self.buttons_down.insert(button);
                }
                MouseButtonState::Released => {
                    self.buttons_down.remove(&button);
                }
            },
        }
    }

    /// Closes the current frame; velocity restarts from the current position.
    pub fn end_frame(&mut self) {
        self.frame_start_pos = self.pointer_pos;
    }

    pub fn key_down(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }

    pub fn button_down(&self, btn: MouseButton) -> bool {
        self.buttons_down.contains(&btn)
    }

    fn axis(&self, positive: [Key; 2], negative: [Key; 2]) -> f32 {
        let pos = positive.iter().any(|k| self.key_down(*k));
        let neg = negative.iter().any(|k| self.key_down(*k));
        match (pos, neg) {
            (true, false) => 1.0,
            (false, true) => -1.0,
            _ => 0.0,
        }
    }
}

impl InputSource for InputState {
    fn pointer_position(&self) -> Vec2 {
        self.pointer_pos
    }

    fn pointer_velocity(&self) -> Vec2 {
        self.pointer_pos - self.frame_start_pos
    }

    fn primary_button_down(&self) -> bool {
        self.button_down(MouseButton::Left)
    }

    fn axes(&self) -> KeyboardAxes {
        KeyboardAxes {
            left_right: self.axis([Key::ArrowRight, Key::D], [Key::ArrowLeft, Key::A]),
            up_down: self.axis([Key::ArrowUp, Key::W], [Key::ArrowDown, Key::S]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(state: &mut InputState, key: Key) {
        state.apply_event(InputEvent::Key {
            key,
            state: KeyState::Pressed,
            repeat: false,
        });
    }

    // ── axes ─────────────────────────────────────────────────────────────

    #[test]
    fn arrows_and_letters_drive_the_same_axis() {
        let mut s = InputState::new();
        press(&mut s, Key::ArrowRight);
        assert_eq!(s.axes().left_right, 1.0);

        let mut s = InputState::new();
        press(&mut s, Key::S);
        assert_eq!(s.axes().up_down, -1.0);
    }

    #[test]
    fn opposite_keys_cancel() {
        let mut s = InputState::new();
        press(&mut s, Key::ArrowLeft);
        press(&mut s, Key::D);
        assert_eq!(s.axes().left_right, 0.0);
    }

    #[test]
    fn release_returns_axis_to_rest() {
        let mut s = InputState::new();
        press(&mut s, Key::W);
        s.apply_event(InputEvent::Key {
            key: Key::W,
            state: KeyState::Released,
            repeat: false,
        });
        assert_eq!(s.axes(), KeyboardAxes::default());
    }

    // ── pointer ──────────────────────────────────────────────────────────

    #[test]
    fn velocity_is_displacement_since_end_frame() {
        let mut s = InputState::new();
        s.apply_event(InputEvent::PointerMoved { x: 10.0, y: 10.0 });
        s.end_frame();
        s.apply_event(InputEvent::PointerMoved { x: 14.0, y: 7.0 });
        s.apply_event(InputEvent::PointerMoved { x: 25.0, y: 12.0 });

        assert_eq!(s.pointer_velocity(), Vec2::new(15.0, 2.0));
        s.end_frame();
        assert_eq!(s.pointer_velocity(), Vec2::ZERO);
    }

    #[test]
    fn first_move_has_no_velocity() {
        let mut s = InputState::new();
        s.apply_event(InputEvent::PointerMoved { x: 400.0, y: 300.0 });
        assert_eq!(s.pointer_velocity(), Vec2::ZERO);

        s.apply_event(InputEvent::PointerMoved { x: 403.0, y: 300.0 });
        assert_eq!(s.pointer_velocity(), Vec2::new(3.0, 0.0));
    }

    #[test]
    fn reentry_does_not_count_as_movement() {
        let mut s = InputState::new();
        s.apply_event(InputEvent::PointerMoved { x: 10.0, y: 10.0 });
        s.end_frame();
        s.apply_event(InputEvent::PointerLeft);
        s.apply_event(InputEvent::PointerMoved { x: 700.0, y: 20.0 });
        assert_eq!(s.pointer_velocity(), Vec2::ZERO);

        s.apply_event(InputEvent::PointerMoved { x: 705.0, y: 20.0 });
        assert_eq!(s.pointer_velocity(), Vec2::new(5.0, 0.0));
    }

    #[test]
    fn focus_loss_releases_everything() {
        let mut s = InputState::new();
        press(&mut s, Key::A);
        s.apply_event(InputEvent::PointerButton {
            button: MouseButton::Left,
            state: MouseButtonState::Pressed,
        });
        assert!(s.primary_button_down());

        s.apply_event(InputEvent::Focused(false));
        assert!(!s.primary_button_down());
        assert_eq!(s.axes().left_right, 0.0);
    }
}
