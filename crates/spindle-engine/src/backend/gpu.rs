use std::collections::HashMap;
use std::num::NonZeroU64;

use glam::Mat4;
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;

use crate::color::Color;
use crate::device::{Gpu, GpuFrame, SurfaceErrorAction};
use crate::error::{RenderError, Result, ShaderStage};
use crate::mesh::{Mesh, MeshId, Vertex};
use crate::shader::{
    reflect_program, ParamHandle, ParamValue, ProgramId, ProgramInfo, UniformBlock,
};

use super::{ClearFlags, GraphicsBackend, ViewportRect, PROJECTION_UNIFORM};

struct GpuProgram {
    pipeline: wgpu::RenderPipeline,
    /// `None` when the program declares no uniform block.
    bind_group_layout: Option<wgpu::BindGroupLayout>,
    uniforms: UniformBlock,
}

struct GpuMesh {
    vertices: wgpu::Buffer,
    indices: wgpu::Buffer,
    index_count: u32,
}

/// The frame between the first `clear`/`render` and `present`.
enum FrameSlot {
    Idle,
    Open(OpenFrame),
    /// No surface texture this time; draws are dropped until `present`.
    Skipped,
}

struct OpenFrame {
    gpu: GpuFrame,
    /// Clears requested since the last pass; applied as load ops of the next one.
    pending_clear: ClearFlags,
}

/// [`GraphicsBackend`] rendering to a window surface through wgpu.
///
/// A frame is opened lazily by the first `clear` or `render` after a
/// `present`. Each draw records its own render pass with a snapshot of the
/// current program's uniforms. When the surface has no texture to give
/// (timeout, minimized window) the whole frame is skipped, not failed.
pub struct WgpuBackend<'w> {
    gpu: Gpu<'w>,

    programs: HashMap<ProgramId, GpuProgram>,
    meshes: HashMap<MeshId, GpuMesh>,
    current: Option<ProgramId>,

    clear_color: Color,
    viewport: Option<ViewportRect>,
    projection: Mat4,

    frame: FrameSlot,
}

impl<'w> WgpuBackend<'w> {
    pub fn new(gpu: Gpu<'w>) -> Self {
        Self {
            gpu,
            programs: HashMap::new(),
            meshes: HashMap::new(),
            current: None,
            clear_color: Color::black(),
            viewport: None,
            projection: Mat4::IDENTITY,
            frame: FrameSlot::Idle,
        }
    }

    /// Reconfigures the surface and depth target. Call before the frame
    /// controller's `on_resize` so the new viewport fits the new surface.
    pub fn resize_surface(&mut self, size: PhysicalSize<u32>) {
        // A frame acquired at the old size cannot be presented after reconfiguring.
        if matches!(
            std::mem::replace(&mut self.frame, FrameSlot::Idle),
            FrameSlot::Open(_)
        ) {
            log::debug!("dropping in-flight frame on resize");
        }
        self.gpu.resize(size);
    }

    /// The open frame, acquiring one if needed; `None` while this frame is skipped.
    fn open_frame(&mut self) -> Result<Option<&mut OpenFrame>> {
        if matches!(self.frame, FrameSlot::Idle) {
            self.frame = match self.acquire()? {
                Some(gpu) => FrameSlot::Open(OpenFrame {
                    gpu,
                    pending_clear: ClearFlags::empty(),
                }),
                None => FrameSlot::Skipped,
            };
        }
        Ok(match &mut self.frame {
            FrameSlot::Open(frame) => Some(frame),
            _ => None,
        })
    }

    fn acquire(&mut self) -> Result<Option<GpuFrame>> {
        let err = match self.gpu.begin_frame() {
            Ok(frame) => return Ok(Some(frame)),
            Err(err) => err,
        };

        match self.gpu.handle_surface_error(&err) {
            SurfaceErrorAction::Reconfigured => {
                log::debug!("surface reconfigured after {err:?}; retrying acquire");
                match self.gpu.begin_frame() {
                    Ok(frame) => Ok(Some(frame)),
                    Err(retry) => match self.gpu.handle_surface_error(&retry) {
                        SurfaceErrorAction::Fatal => Err(acquire_failed(&retry)),
                        _ => {
                            log::debug!("surface still unavailable ({retry:?}); skipping frame");
                            Ok(None)
                        }
                    },
                }
            }
            SurfaceErrorAction::SkipFrame => {
                log::debug!("surface acquire failed ({err:?}); skipping frame");
                Ok(None)
            }
            SurfaceErrorAction::Fatal => Err(acquire_failed(&err)),
        }
    }

    fn upload(&mut self, mesh: &Mesh) {
        if self.meshes.contains_key(&mesh.id()) {
            return;
        }

        let device = self.gpu.device();
        let vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("spindle mesh vbo"),
            contents: bytemuck::cast_slice(mesh.vertices()),
            usage: wgpu::BufferUsages::VERTEX,
        });

        // Index buffer sizes must be 4-byte aligned.
        let mut indices = mesh.indices().to_vec();
        if indices.len() % 2 == 1 {
            indices.push(0);
        }
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("spindle mesh ibo"),
            contents: bytemuck::cast_slice(&indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        log::trace!(
            "uploaded mesh {} ({} vertices, {} triangles)",
            mesh.id().raw(),
            mesh.vertex_count(),
            mesh.triangle_count()
        );

        self.meshes.insert(
            mesh.id(),
            GpuMesh {
                vertices,
                indices: index_buffer,
                index_count: mesh.indices().len() as u32,
            },
        );
    }

    fn create_pipeline(
        &self,
        vertex_src: &str,
        fragment_src: &str,
        vertex_entry: &str,
        fragment_entry: &str,
        bind_group_layout: Option<&wgpu::BindGroupLayout>,
    ) -> wgpu::RenderPipeline {
        let device = self.gpu.device();

        let vertex_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("spindle vertex shader"),
            source: wgpu::ShaderSource::Wgsl(vertex_src.into()),
        });
        let fragment_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("spindle fragment shader"),
            source: wgpu::ShaderSource::Wgsl(fragment_src.into()),
        });

        let bind_group_layouts: Vec<&wgpu::BindGroupLayout> =
            bind_group_layout.into_iter().collect();
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("spindle pipeline layout"),
            bind_group_layouts: &bind_group_layouts,
            immediate_size: 0,
        });

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("spindle pipeline"),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module: &vertex_module,
                entry_point: Some(vertex_entry),
                compilation_options: Default::default(),
                buffers: &[Vertex::layout()],
            },

            fragment: Some(wgpu::FragmentState {
                module: &fragment_module,
                entry_point: Some(fragment_entry),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.gpu.surface_format(),
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                // Mesh winding is not consistent.
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: Some(wgpu::DepthStencilState {
                format: self.gpu.depth_format(),
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),

            multiview_mask: None,
            cache: None,
        })
    }
}

impl GraphicsBackend for WgpuBackend<'_> {
    fn create_shader(&mut self, vertex_src: &str, fragment_src: &str) -> Result<ProgramInfo> {
        let reflection = reflect_program(vertex_src, fragment_src)?;

        // Anything naga accepted but wgpu rejects comes back as a link error
        // instead of reaching the uncaptured-error handler.
        let error_scope = self
            .gpu
            .device()
            .push_error_scope(wgpu::ErrorFilter::Validation);

        let bind_group_layout = NonZeroU64::new(u64::from(reflection.layout.size)).map(|size| {
            self.gpu
                .device()
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("spindle uniforms bgl"),
                    entries: &[wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: Some(size),
                        },
                        count: None,
                    }],
                })
        });

        let pipeline = self.create_pipeline(
            vertex_src,
            fragment_src,
            &reflection.vertex_entry,
            &reflection.fragment_entry,
            bind_group_layout.as_ref(),
        );

        if let Some(err) = pollster::block_on(error_scope.pop()) {
            return Err(RenderError::compile(ShaderStage::Link, err.to_string()));
        }

        let id = ProgramId::allocate();
        self.programs.insert(
            id,
            GpuProgram {
                pipeline,
                bind_group_layout,
                uniforms: UniformBlock::new(reflection.layout.clone()),
            },
        );

        Ok(ProgramInfo {
            id,
            layout: reflection.layout,
        })
    }

    fn set_param(&mut self, handle: ParamHandle, value: ParamValue) -> Result<()> {
        let program = self.programs.get_mut(&handle.program()).ok_or_else(|| {
            RenderError::InvalidHandle(format!("{} was not created here", handle.program()))
        })?;
        program.uniforms.write(handle.slot(), &value)
    }

    fn set_shader(&mut self, program: ProgramId) -> Result<()> {
        if !self.programs.contains_key(&program) {
            return Err(RenderError::InvalidHandle(format!(
                "{program} was not created here"
            )));
        }
        self.current = Some(program);
        Ok(())
    }

    fn render(&mut self, mesh: &Mesh) -> Result<()> {
        let id = self
            .current
            .ok_or_else(|| RenderError::Backend("draw issued with no program bound".into()))?;

        if self.open_frame()?.is_none() {
            return Ok(());
        }
        self.upload(mesh);

        let program = self
            .programs
            .get(&id)
            .ok_or_else(|| RenderError::InvalidHandle(format!("{id} is gone")))?;
        let gpu_mesh = self.meshes.get(&mesh.id()).ok_or_else(|| {
            RenderError::Backend(format!("mesh {} not uploaded", mesh.id().raw()))
        })?;

        let bind_group = program.bind_group_layout.as_ref().map(|layout| {
            let mut uniforms = program.uniforms.clone();
            uniforms.write_if_declared(PROJECTION_UNIFORM, &ParamValue::Mat4(self.projection));

            let device = self.gpu.device();
            let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("spindle draw ubo"),
                contents: uniforms.bytes(),
                usage: wgpu::BufferUsages::UNIFORM,
            });
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("spindle draw bind group"),
                layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                }],
            })
        });

        let FrameSlot::Open(frame) = &mut self.frame else {
            return Err(RenderError::Backend("no frame in flight".into()));
        };
        let target = PassTarget {
            depth_view: self.gpu.depth_view(),
            clear_color: self.clear_color,
            viewport: self.viewport.and_then(|r| clamp_viewport(r, self.gpu.size())),
        };
        record_pass(
            frame,
            &target,
            Some(Draw {
                program,
                mesh: gpu_mesh,
                bind_group: bind_group.as_ref(),
            }),
        );
        Ok(())
    }

    fn clear(&mut self, flags: ClearFlags) -> Result<()> {
        if let Some(frame) = self.open_frame()? {
            frame.pending_clear |= flags;
        }
        Ok(())
    }

    fn set_clear_color(&mut self, color: Color) {
        self.clear_color = color;
    }

    fn set_viewport(&mut self, rect: ViewportRect) {
        self.viewport = Some(rect);
    }

    fn set_projection(&mut self, projection: Mat4) {
        self.projection = projection;
    }

    fn present(&mut self) -> Result<()> {
        self.open_frame()?;

        match std::mem::replace(&mut self.frame, FrameSlot::Idle) {
            FrameSlot::Open(mut frame) => {
                if !frame.pending_clear.is_empty() {
                    let target = PassTarget {
                        depth_view: self.gpu.depth_view(),
                        clear_color: self.clear_color,
                        viewport: None,
                    };
                    record_pass(&mut frame, &target, None);
                }
                self.gpu.submit(frame.gpu);
                Ok(())
            }
            FrameSlot::Skipped => {
                log::trace!("frame skipped, nothing presented");
                Ok(())
            }
            FrameSlot::Idle => Err(RenderError::Backend("no frame in flight".into())),
        }
    }
}

struct PassTarget<'a> {
    depth_view: &'a wgpu::TextureView,
    clear_color: Color,
    viewport: Option<ViewportRect>,
}

struct Draw<'a> {
    program: &'a GpuProgram,
    mesh: &'a GpuMesh,
    bind_group: Option<&'a wgpu::BindGroup>,
}

/// Records one pass into `frame`, applying its pending clears as load ops.
fn record_pass(frame: &mut OpenFrame, target: &PassTarget<'_>, draw: Option<Draw<'_>>) {
    let pending = std::mem::replace(&mut frame.pending_clear, ClearFlags::empty());

    let color_load = if pending.contains(ClearFlags::COLOR) {
        wgpu::LoadOp::Clear(target.clear_color.to_wgpu())
    } else {
        wgpu::LoadOp::Load
    };
    let depth_load = if pending.contains(ClearFlags::DEPTH) {
        wgpu::LoadOp::Clear(1.0)
    } else {
        wgpu::LoadOp::Load
    };

    let GpuFrame { view, encoder, .. } = &mut frame.gpu;
    let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("spindle pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: &*view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: color_load,
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
            view: target.depth_view,
            depth_ops: Some(wgpu::Operations {
                load: depth_load,
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        }),
        timestamp_writes: None,
        occlusion_query_set: None,
        multiview_mask: None,
    });

    let Some(Draw {
        program,
        mesh,
        bind_group,
    }) = draw
    else {
        return;
    };
    if mesh.index_count == 0 {
        return;
    }

    if let Some(rect) = target.viewport {
        rpass.set_viewport(
            rect.x as f32,
            rect.y as f32,
            rect.width as f32,
            rect.height as f32,
            0.0,
            1.0,
        );
    }

    rpass.set_pipeline(&program.pipeline);
    if let Some(bind_group) = bind_group {
        rpass.set_bind_group(0, bind_group, &[]);
    }
    rpass.set_vertex_buffer(0, mesh.vertices.slice(..));
    rpass.set_index_buffer(mesh.indices.slice(..), wgpu::IndexFormat::Uint16);
    rpass.draw_indexed(0..mesh.index_count, 0, 0..1);
}

fn acquire_failed(err: &wgpu::SurfaceError) -> RenderError {
    RenderError::Backend(format!("surface acquire failed: {err}"))
}

/// Restricts `rect` to the surface; `None` when nothing remains.
fn clamp_viewport(rect: ViewportRect, size: PhysicalSize<u32>) -> Option<ViewportRect> {
    let x = rect.x.min(size.width);
    let y = rect.y.min(size.height);
    let width = rect.width.min(size.width - x);
    let height = rect.height.min(size.height - y);
    (width > 0 && height > 0).then_some(ViewportRect {
        x,
        y,
        width,
        height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewport_within_surface_is_kept() {
        let rect = ViewportRect {
            x: 0,
            y: 0,
            width: 800,
            height: 600,
        };
        assert_eq!(clamp_viewport(rect, PhysicalSize::new(800, 600)), Some(rect));
    }

    #[test]
    fn oversized_viewport_is_clamped() {
        let rect = ViewportRect {
            x: 100,
            y: 0,
            width: 1000,
            height: 1000,
        };
        let clamped = clamp_viewport(rect, PhysicalSize::new(800, 600)).unwrap();
        assert_eq!((clamped.width, clamped.height), (700, 600));
    }

    #[test]
    fn viewport_outside_surface_is_dropped() {
        let rect = ViewportRect {
            x: 900,
            y: 0,
            width: 10,
            height: 10,
        };
        assert_eq!(clamp_viewport(rect, PhysicalSize::new(800, 600)), None);
    }
}
