use std::collections::{HashMap, HashSet};

use glam::Mat4;

use crate::color::Color;
use crate::error::{RenderError, Result};
use crate::mesh::{Mesh, MeshId};
use crate::shader::{
    reflect_program, ParamHandle, ParamValue, ProgramId, ProgramInfo, UniformBlock,
};

use super::{ClearFlags, GraphicsBackend, ViewportRect, PROJECTION_UNIFORM};

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    CreateShader(ProgramId),
    SetParam { handle: ParamHandle, value: ParamValue },
    SetShader(ProgramId),
    Render { mesh: MeshId, program: ProgramId },
    Clear(ClearFlags),
    SetClearColor(Color),
    SetViewport(ViewportRect),
    SetProjection(Mat4),
    Present,
}

/// Uniform state captured at a draw call.
#[derive(Debug, Clone)]
pub struct DrawRecord {
    pub mesh: MeshId,
    pub program: ProgramId,
    pub uniforms: UniformBlock,
}

/// Backend that validates and records calls without touching a GPU.
///
/// Shader programs go through the same WGSL checks as on the GPU, so compile
/// and parameter errors behave identically.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    programs: HashMap<ProgramId, UniformBlock>,
    current: Option<ProgramId>,
    uploaded: HashSet<MeshId>,

    clear_color: Color,
    viewport: Option<ViewportRect>,
    projection: Mat4,

    calls: Vec<BackendCall>,
    draws: Vec<DrawRecord>,
    frames_presented: u64,

    fail_next_render: Option<String>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> &[BackendCall] {
        &self.calls
    }

    /// Drains the call log.
    pub fn take_calls(&mut self) -> Vec<BackendCall> {
        std::mem::take(&mut self.calls)
    }

    /// Uniform snapshots of every draw so far.
    pub fn draws(&self) -> &[DrawRecord] {
        &self.draws
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    /// Number of distinct meshes uploaded (first drawn) so far.
    pub fn uploaded_meshes(&self) -> usize {
        self.uploaded.len()
    }

    pub fn clear_color(&self) -> Color {
        self.clear_color
    }

    pub fn viewport(&self) -> Option<ViewportRect> {
        self.viewport
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    /// Makes the next `render` call fail with a backend error.
    pub fn fail_next_render(&mut self, reason: impl Into<String>) {
        self.fail_next_render = Some(reason.into());
    }
}

impl GraphicsBackend for HeadlessBackend {
    fn create_shader(&mut self, vertex_src: &str, fragment_src: &str) -> Result<ProgramInfo> {
        let reflection = reflect_program(vertex_src, fragment_src)?;
        let id = ProgramId::allocate();

        self.programs
            .insert(id, UniformBlock::new(reflection.layout.clone()));
        self.calls.push(BackendCall::CreateShader(id));

        Ok(ProgramInfo {
            id,
            layout: reflection.layout,
        })
    }

    fn set_param(&mut self, handle: ParamHandle, value: ParamValue) -> Result<()> {
        let block = self.programs.get_mut(&handle.program()).ok_or_else(|| {
            RenderError::InvalidHandle(format!("{} was not created here", handle.program()))
        })?;
        block.write(handle.slot(), &value)?;

        self.calls.push(BackendCall::SetParam { handle, value });
        Ok(())
    }

    fn set_shader(&mut self, program: ProgramId) -> Result<()> {
        if !self.programs.contains_key(&program) {
            return Err(RenderError::InvalidHandle(format!(
                "{program} was not created here"
            )));
        }
        self.current = Some(program);
        self.calls.push(BackendCall::SetShader(program));
        Ok(())
    }

    fn render(&mut self, mesh: &Mesh) -> Result<()> {
        if let Some(reason) = self.fail_next_render.take() {
            return Err(RenderError::Backend(reason));
        }

        let program = self
            .current
            .ok_or_else(|| RenderError::Backend("draw issued with no program bound".into()))?;
        let Some(block) = self.programs.get(&program) else {
            return Err(RenderError::InvalidHandle(format!("{program} is gone")));
        };

        let mut uniforms = block.clone();
        uniforms.write_if_declared(PROJECTION_UNIFORM, &ParamValue::Mat4(self.projection));

        if self.uploaded.insert(mesh.id()) {
            log::trace!("headless upload of mesh {}", mesh.id().raw());
        }

        self.draws.push(DrawRecord {
            mesh: mesh.id(),
            program,
            uniforms,
        });
        self.calls.push(BackendCall::Render {
            mesh: mesh.id(),
            program,
        });
        Ok(())
    }

    fn clear(&mut self, flags: ClearFlags) -> Result<()> {
        self.calls.push(BackendCall::Clear(flags));
        Ok(())
    }

    fn set_clear_color(&mut self, color: Color) {
        self.clear_color = color;
        self.calls.push(BackendCall::SetClearColor(color));
    }

    fn set_viewport(&mut self, rect: ViewportRect) {
        self.viewport = Some(rect);
        self.calls.push(BackendCall::SetViewport(rect));
    }

    fn set_projection(&mut self, projection: Mat4) {
        self.projection = projection;
        self.calls.push(BackendCall::SetProjection(projection));
    }

    fn present(&mut self) -> Result<()> {
        self.frames_presented += 1;
        self.calls.push(BackendCall::Present);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::mesh::shapes;

    const VERTEX: &str = "
        struct Params { tint: f32, offset: vec2<f32>, projection: mat4x4<f32> }
        @group(0) @binding(0) var<uniform> params: Params;
        @vertex
        fn vs_main(@location(0) p: vec3<f32>) -> @builtin(position) vec4<f32> {
            return params.projection * vec4<f32>(p.xy + params.offset, p.z, params.tint);
        }
    ";
    const FRAGMENT: &str = "
        @fragment
        fn fs_main() -> @location(0) vec4<f32> { return vec4<f32>(1.0); }
    ";

    #[test]
    fn draw_snapshots_uniforms_and_projection() {
        let mut b = HeadlessBackend::new();
        let info = b.create_shader(VERTEX, FRAGMENT).unwrap();
        let offset = ParamHandle::new(info.id, 1);

        b.set_shader(info.id).unwrap();
        b.set_projection(Mat4::from_scale(glam::Vec3::splat(3.0)));
        b.set_param(offset, ParamValue::Vec2(Vec2::new(1.0, 2.0))).unwrap();

        let mesh = shapes::tetrahedron();
        b.render(&mesh).unwrap();
        b.set_param(offset, ParamValue::Vec2(Vec2::ZERO)).unwrap();
        b.render(&mesh).unwrap();

        let draws = b.draws();
        assert_eq!(draws.len(), 2);
        assert_eq!(
            draws[0].uniforms.read("offset"),
            Some(ParamValue::Vec2(Vec2::new(1.0, 2.0)))
        );
        assert_eq!(draws[1].uniforms.read("offset"), Some(ParamValue::Vec2(Vec2::ZERO)));
        assert_eq!(
            draws[0].uniforms.read("projection"),
            Some(ParamValue::Mat4(Mat4::from_scale(glam::Vec3::splat(3.0))))
        );
        assert_eq!(b.uploaded_meshes(), 1);
    }

    #[test]
    fn render_without_program_fails() {
        let mut b = HeadlessBackend::new();
        let err = b.render(&shapes::house()).unwrap_err();
        assert!(matches!(err, RenderError::Backend(_)));
    }

    #[test]
    fn foreign_program_is_rejected() {
        let mut a = HeadlessBackend::new();
        let mut b = HeadlessBackend::new();
        let info = a.create_shader(VERTEX, FRAGMENT).unwrap();

        assert!(matches!(b.set_shader(info.id), Err(RenderError::InvalidHandle(_))));
        assert!(matches!(
            b.set_param(ParamHandle::new(info.id, 0), ParamValue::Float(1.0)),
            Err(RenderError::InvalidHandle(_))
        ));
    }

    #[test]
    fn injected_render_failure_fires_once() {
        let mut b = HeadlessBackend::new();
        let info = b.create_shader(VERTEX, FRAGMENT).unwrap();
        b.set_shader(info.id).unwrap();
        b.fail_next_render("device lost");

        let mesh = shapes::house();
        assert!(matches!(b.render(&mesh), Err(RenderError::Backend(m)) if m == "device lost"));
        assert!(b.render(&mesh).is_ok());
    }
}
