use glam::Vec2;

/// Digital keyboard axes, each in `[-1, 1]`.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct KeyboardAxes {
    /// `+1` for right, `-1` for left.
    pub left_right: f32,
    /// `+1` for up, `-1` for down.
    pub up_down: f32,
}

/// Read-only view of the input devices used by the frame update.
pub trait InputSource {
    /// Pointer position in pixels, origin top-left.
    fn pointer_position(&self) -> Vec2;

    /// Pointer displacement in pixels since the previous frame.
    fn pointer_velocity(&self) -> Vec2;

    fn primary_button_down(&self) -> bool;

    fn axes(&self) -> KeyboardAxes;
}

/// One frame's worth of input, sampled once before the animation update.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct InputSample {
    pub pointer: Vec2,
    pub velocity: Vec2,
    pub primary_down: bool,
    pub axes: KeyboardAxes,
}

impl InputSample {
    pub fn from_source<S: InputSource + ?Sized>(source: &S) -> Self {
        Self {
            pointer: source.pointer_position(),
            velocity: source.pointer_velocity(),
            primary_down: source.primary_button_down(),
            axes: source.axes(),
        }
    }
}

impl InputSource for InputSample {
    fn pointer_position(&self) -> Vec2 {
        self.pointer
    }

    fn pointer_velocity(&self) -> Vec2 {
        self.velocity
    }

    fn primary_button_down(&self) -> bool {
        self.primary_down
    }

    fn axes(&self) -> KeyboardAxes {
        self.axes
    }
}
