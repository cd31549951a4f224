//! Per-frame rotation and pointer state.

use glam::Vec2;

use crate::input::InputSample;
use crate::projection::ViewportState;

/// Radians of rotation per pixel of horizontal pointer velocity while dragging.
pub const POINTER_ROTATION_SCALE: f32 = 1e-4;

/// Radians of rotation per frame at full keyboard axis deflection.
pub const KEYBOARD_ROTATION_SPEED: f32 = 0.4;

/// Rotation angles and normalized pointer position.
///
/// `alpha` and `beta` accumulate without wrapping.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AnimationState {
    pub alpha: f32,
    pub beta: f32,
    /// Pointer in normalized device coordinates, `(-1, 1)` is the top-left corner.
    pub pointer: Vec2,
}

impl Default for AnimationState {
    fn default() -> Self {
        Self {
            alpha: 0.0,
            beta: 0.0,
            pointer: Vec2::ONE,
        }
    }
}

impl AnimationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one frame of input.
    ///
    /// Pointer drag and keyboard rotation are both applied when active; neither
    /// suppresses the other.
    pub fn update(&mut self, input: &InputSample) {
        if input.primary_down {
            let delta = input.velocity.x * POINTER_ROTATION_SCALE;
            self.alpha += delta;
            self.beta += delta;
        }

        self.alpha += input.axes.left_right * KEYBOARD_ROTATION_SPEED;
        self.beta += input.axes.up_down * KEYBOARD_ROTATION_SPEED;
    }

    /// Stores the pointer in normalized coordinates for `viewport`.
    ///
    /// Without a viewport the previous value is kept.
    pub fn track_pointer(&mut self, pointer_px: Vec2, viewport: Option<&ViewportState>) {
        if let Some(viewport) = viewport {
            self.pointer = normalize_pointer(pointer_px, viewport.width, viewport.height);
        }
    }
}

/// Maps a pixel position (origin top-left) to `[-1, 1]` with +y up.
pub fn normalize_pointer(pointer_px: Vec2, width: u32, height: u32) -> Vec2 {
    let half_w = width as f32 / 2.0;
    let half_h = height as f32 / 2.0;
    Vec2::new(pointer_px.x / half_w - 1.0, -(pointer_px.y / half_h - 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::KeyboardAxes;

    fn sample(velocity_x: f32, primary_down: bool, axes: KeyboardAxes) -> InputSample {
        InputSample {
            pointer: Vec2::ZERO,
            velocity: Vec2::new(velocity_x, 0.0),
            primary_down,
            axes,
        }
    }

    // ── rotation ─────────────────────────────────────────────────────────

    #[test]
    fn full_left_right_adds_exactly_keyboard_speed() {
        let mut a = AnimationState::new();
        a.update(&sample(
            0.0,
            false,
            KeyboardAxes {
                left_right: 1.0,
                up_down: 0.0,
            },
        ));
        assert_eq!(a.alpha, 0.4);
        assert_eq!(a.beta, 0.0);
    }

    #[test]
    fn drag_rotates_both_angles() {
        let mut a = AnimationState::new();
        a.update(&sample(1000.0, true, KeyboardAxes::default()));
        assert!((a.alpha - 0.1).abs() < 1e-6);
        assert!((a.beta - 0.1).abs() < 1e-6);
    }

    #[test]
    fn velocity_without_button_is_ignored() {
        let mut a = AnimationState::new();
        a.update(&sample(1000.0, false, KeyboardAxes::default()));
        assert_eq!((a.alpha, a.beta), (0.0, 0.0));
    }

    #[test]
    fn drag_and_keyboard_are_additive() {
        let mut a = AnimationState::new();
        a.update(&sample(
            1000.0,
            true,
            KeyboardAxes {
                left_right: -1.0,
                up_down: 1.0,
            },
        ));
        assert!((a.alpha - (0.1 - 0.4)).abs() < 1e-6);
        assert!((a.beta - (0.1 + 0.4)).abs() < 1e-6);
    }

    #[test]
    fn angles_accumulate_unbounded() {
        let mut a = AnimationState::new();
        let right = KeyboardAxes {
            left_right: 1.0,
            up_down: 0.0,
        };
        for _ in 0..100 {
            a.update(&sample(0.0, false, right));
        }
        assert!(a.alpha > std::f32::consts::TAU * 6.0);
    }

    // ── pointer ──────────────────────────────────────────────────────────

    #[test]
    fn center_maps_to_origin() {
        assert_eq!(normalize_pointer(Vec2::new(400.0, 300.0), 800, 600), Vec2::ZERO);
    }

    #[test]
    fn top_left_maps_to_minus_one_one() {
        assert_eq!(normalize_pointer(Vec2::ZERO, 800, 600), Vec2::new(-1.0, 1.0));
    }

    #[test]
    fn pointer_is_kept_without_viewport() {
        let mut a = AnimationState::new();
        a.track_pointer(Vec2::new(10.0, 10.0), None);
        assert_eq!(a.pointer, Vec2::ONE);
    }
}
