/// A single acquired surface frame.
///
/// Short-lived: holding it blocks acquisition of the next surface texture.
/// [`Gpu::submit`](super::Gpu::submit) consumes it and presents.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}
