/// Initialization parameters for the GPU layer.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Prefer an sRGB surface format when true, a linear one when false.
    ///
    /// Scene colors are written for direct display, so an sRGB surface shows
    /// them brighter than authored.
    pub prefer_srgb: bool,

    /// Present mode. FIFO is always supported and syncs to the display refresh,
    /// which is the cadence `render_frame` expects.
    pub present_mode: wgpu::PresentMode,

    /// Alpha mode preference; ignored if the surface does not support it.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,

    /// Depth attachment format used by every program's pipeline.
    pub depth_format: wgpu::TextureFormat,

    pub power_preference: wgpu::PowerPreference,

    pub required_features: wgpu::Features,

    pub required_limits: wgpu::Limits,

    /// Hint for how many frames may be queued ahead of presentation.
    pub desired_maximum_frame_latency: u32,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            prefer_srgb: false,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: None,
            depth_format: wgpu::TextureFormat::Depth32Float,
            power_preference: wgpu::PowerPreference::HighPerformance,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::downlevel_defaults(),
            desired_maximum_frame_latency: 2,
        }
    }
}
