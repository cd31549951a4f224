//! Graphics backend contract.
//!
//! The frame controller talks to the GPU only through [`GraphicsBackend`].
//! Two implementations ship with the engine:
//! - [`WgpuBackend`]: renders to a window surface through wgpu
//! - [`HeadlessBackend`]: records calls; no GPU required

mod gpu;
mod headless;

pub use gpu::WgpuBackend;
pub use headless::{BackendCall, HeadlessBackend};

use bitflags::bitflags;
use glam::Mat4;

use crate::color::Color;
use crate::error::Result;
use crate::mesh::Mesh;
use crate::shader::{ParamHandle, ParamValue, ProgramId, ProgramInfo};

bitflags! {
    /// Framebuffer attachments cleared by [`GraphicsBackend::clear`].
    #[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
    pub struct ClearFlags: u8 {
        const COLOR = 1 << 0;
        const DEPTH = 1 << 1;
    }
}

/// Viewport rectangle in physical pixels.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct ViewportRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Operations the render loop needs from a graphics API.
///
/// All calls are synchronous from the caller's point of view even when the
/// implementation queues work. Errors are fatal for the current frame.
pub trait GraphicsBackend {
    /// Compiles and links a WGSL vertex + fragment pair.
    fn create_shader(&mut self, vertex_src: &str, fragment_src: &str) -> Result<ProgramInfo>;

    /// Stages a parameter value; visible to the next draw using the handle's program.
    fn set_param(&mut self, handle: ParamHandle, value: ParamValue) -> Result<()>;

    /// Selects the program used by subsequent [`render`](Self::render) calls.
    fn set_shader(&mut self, program: ProgramId) -> Result<()>;

    /// Draws `mesh` with the current program, uploading it first if needed.
    fn render(&mut self, mesh: &Mesh) -> Result<()>;

    fn clear(&mut self, flags: ClearFlags) -> Result<()>;

    fn set_clear_color(&mut self, color: Color);

    fn set_viewport(&mut self, rect: ViewportRect);

    /// Projection matrix of the render context.
    ///
    /// Programs that declare a `projection: mat4x4<f32>` uniform receive it at
    /// every draw.
    fn set_projection(&mut self, projection: Mat4);

    /// Finishes the frame and shows it.
    fn present(&mut self) -> Result<()>;
}

/// Uniform name filled from [`GraphicsBackend::set_projection`].
pub const PROJECTION_UNIFORM: &str = "projection";
