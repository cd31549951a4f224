//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and the window, and drives a
//! [`FrameController`](crate::frame::FrameController) on the wgpu backend.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig};
pub use winit::dpi::LogicalSize;
