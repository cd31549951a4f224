//! Spindle engine crate.
//!
//! Renders a small scene of rotating meshes driven by pointer and keyboard
//! input. The frame loop ([`frame::FrameController`]) talks to the GPU only
//! through [`backend::GraphicsBackend`], so it runs unchanged on the wgpu
//! backend and on the headless backend used by tests.

pub mod animation;
pub mod backend;
pub mod color;
pub mod device;
pub mod error;
pub mod frame;
pub mod input;
pub mod logging;
pub mod mesh;
pub mod projection;
pub mod scene;
pub mod shader;
pub mod window;

pub use animation::AnimationState;
pub use backend::{ClearFlags, GraphicsBackend, HeadlessBackend, WgpuBackend};
pub use color::Color;
pub use error::{RenderError, Result};
pub use frame::{FrameController, FrameState};
pub use scene::SceneDesc;
