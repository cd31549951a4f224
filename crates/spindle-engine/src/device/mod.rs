//! GPU device + surface management for the wgpu backend.
//!
//! Responsibilities:
//! - creating the wgpu Instance/Adapter/Device/Queue
//! - creating & configuring the Surface and the matching depth target
//! - acquiring frames and providing an encoder + views for rendering

mod context;
mod frame;
mod init;
mod surface;

pub use context::Gpu;
pub use frame::GpuFrame;
pub use init::GpuInit;
pub use surface::SurfaceErrorAction;
