//! Input subsystem.
//!
//! Public API is platform-agnostic and does not expose winit types.
//! The runtime translates platform events into `InputEvent`s (see
//! [`platform`]); the frame controller reads an [`InputSource`].

mod frame;
pub mod platform;
mod state;
mod types;

pub use frame::{InputSample, InputSource, KeyboardAxes};
pub use state::InputState;
pub use types::{InputEvent, Key, KeyState, MouseButton, MouseButtonState};
