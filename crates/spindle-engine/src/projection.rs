//! Viewport-dependent projection.

use glam::Mat4;

use crate::backend::{GraphicsBackend, ViewportRect};
use crate::error::{RenderError, Result};

/// Perspective parameters. `far` is tuned per scene.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ProjectionConfig {
    /// Vertical field of view in radians.
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            fov_y: std::f32::consts::FRAC_PI_4,
            near: 1.0,
            far: 20_000.0,
        }
    }
}

impl ProjectionConfig {
    pub fn with_far(far: f32) -> Self {
        Self {
            far,
            ..Self::default()
        }
    }

    /// Right-handed perspective with a 0..1 depth range.
    pub fn matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, aspect, self.near, self.far)
    }
}

/// Current viewport size and the projection derived from it.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ViewportState {
    pub width: u32,
    pub height: u32,
    pub projection: Mat4,
}

impl ViewportState {
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

/// Recomputes the projection whenever the viewport changes.
#[derive(Debug, Clone, Default)]
pub struct ProjectionManager {
    config: ProjectionConfig,
}

impl ProjectionManager {
    pub fn new(config: ProjectionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProjectionConfig {
        &self.config
    }

    /// Sets the backend viewport to the full `width` x `height` area and
    /// pushes the matching projection.
    pub fn on_resize<B>(&self, backend: &mut B, width: u32, height: u32) -> Result<ViewportState>
    where
        B: GraphicsBackend + ?Sized,
    {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidViewport { width, height });
        }

        let aspect = width as f32 / height as f32;
        let projection = self.config.matrix(aspect);

        backend.set_viewport(ViewportRect {
            x: 0,
            y: 0,
            width,
            height,
        });
        backend.set_projection(projection);

        log::debug!("viewport {width}x{height}, aspect {aspect:.3}");

        Ok(ViewportState {
            width,
            height,
            projection,
        })
    }
}
