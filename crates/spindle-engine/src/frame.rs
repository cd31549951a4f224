//! Frame controller: owns the per-frame pipeline and its lifecycle.
//!
//! ```text
//! Uninitialized --init--> Ready --render_frame--> RenderingFrame --ok--> Ready
//!                           |                           |
//!                       shutdown                      error
//!                           v                           v
//!                       Terminated <--------------------+
//! ```
//!
//! Each frame runs, in order: clear, input sample, animation update, pointer
//! normalization, parameter upload, draws, present.

use std::collections::HashMap;
use std::fmt;

use crate::animation::AnimationState;
use crate::backend::{ClearFlags, GraphicsBackend};
use crate::error::{RenderError, Result};
use crate::input::{InputSample, InputSource};
use crate::mesh::{Mesh, MeshId, MeshStore};
use crate::projection::{ProjectionManager, ViewportState};
use crate::scene::SceneDesc;
use crate::shader::{ParamHandle, ShaderProgram};

/// Uniform names driven by [`AnimationState`].
pub const ALPHA_PARAM: &str = "alpha";
pub const BETA_PARAM: &str = "beta";
pub const MOUSE_PARAM: &str = "mouse";

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FrameState {
    Uninitialized,
    Ready,
    RenderingFrame,
    Terminated,
}

impl FrameState {
    fn describe(self) -> &'static str {
        match self {
            FrameState::Uninitialized => "uninitialized",
            FrameState::Ready => "ready",
            FrameState::RenderingFrame => "rendering a frame",
            FrameState::Terminated => "terminated",
        }
    }
}

impl fmt::Display for FrameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// Animation parameters a program declares; absent ones stay `None`.
#[derive(Debug, Copy, Clone, Default)]
struct AnimationHandles {
    alpha: Option<ParamHandle>,
    beta: Option<ParamHandle>,
    mouse: Option<ParamHandle>,
}

#[derive(Debug)]
struct ProgramSlot {
    name: String,
    program: ShaderProgram,
    handles: AnimationHandles,
}

#[derive(Debug, Copy, Clone)]
struct ResolvedDraw {
    mesh: MeshId,
    program: usize,
}

/// Drives one scene on one backend.
pub struct FrameController<B> {
    backend: B,
    scene: SceneDesc,
    state: FrameState,

    meshes: MeshStore,
    programs: Vec<ProgramSlot>,
    draws: Vec<ResolvedDraw>,

    animation: AnimationState,
    projection: ProjectionManager,
    viewport: Option<ViewportState>,

    frame_index: u64,
}

impl<B: GraphicsBackend> FrameController<B> {
    pub fn new(backend: B, scene: SceneDesc) -> Self {
        let projection = ProjectionManager::new(scene.projection);
        Self {
            backend,
            scene,
            state: FrameState::Uninitialized,
            meshes: MeshStore::new(),
            programs: Vec::new(),
            draws: Vec::new(),
            animation: AnimationState::new(),
            projection,
            viewport: None,
            frame_index: 0,
        }
    }

    /// Builds meshes, compiles programs and resolves draws.
    ///
    /// On failure the controller is terminated.
    pub fn init(&mut self) -> Result<()> {
        self.expect_state("init", &[FrameState::Uninitialized])?;

        match self.build_scene() {
            Ok(()) => {
                self.state = FrameState::Ready;
                log::info!(
                    "scene `{}` ready: {} mesh(es), {} program(s), {} draw(s)",
                    self.scene.name,
                    self.meshes.len(),
                    self.programs.len(),
                    self.draws.len()
                );
                Ok(())
            }
            Err(e) => Err(self.terminate("init", e)),
        }
    }

    /// Renders one frame from `input`.
    ///
    /// Any error terminates the controller; no partial frame is retried.
    pub fn render_frame<S>(&mut self, input: &S) -> Result<()>
    where
        S: InputSource + ?Sized,
    {
        self.expect_state("render_frame", &[FrameState::Ready])?;
        self.state = FrameState::RenderingFrame;

        match self.run_frame(input) {
            Ok(()) => {
                self.state = FrameState::Ready;
                self.frame_index += 1;
                Ok(())
            }
            Err(e) => Err(self.terminate("render_frame", e)),
        }
    }

    /// Applies a new viewport size.
    ///
    /// Allowed before `init` and between frames. A rejected size leaves the
    /// previous viewport in place.
    pub fn on_resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.expect_state(
            "on_resize",
            &[FrameState::Uninitialized, FrameState::Ready],
        )?;

        let viewport = self.projection.on_resize(&mut self.backend, width, height)?;
        self.viewport = Some(viewport);
        Ok(())
    }

    pub fn shutdown(&mut self) {
        if self.state != FrameState::Terminated {
            log::info!(
                "scene `{}` shut down after {} frame(s)",
                self.scene.name,
                self.frame_index
            );
            self.state = FrameState::Terminated;
        }
    }

    #[inline]
    pub fn state(&self) -> FrameState {
        self.state
    }

    #[inline]
    pub fn animation(&self) -> &AnimationState {
        &self.animation
    }

    #[inline]
    pub fn viewport(&self) -> Option<&ViewportState> {
        self.viewport.as_ref()
    }

    #[inline]
    pub fn meshes(&self) -> &MeshStore {
        &self.meshes
    }

    /// Number of frames completed.
    #[inline]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn scene(&self) -> &SceneDesc {
        &self.scene
    }

    /// Compiled program registered under `name`.
    pub fn program(&self, name: &str) -> Option<&ShaderProgram> {
        self.programs
            .iter()
            .find(|slot| slot.name == name)
            .map(|slot| &slot.program)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    fn expect_state(&self, operation: &'static str, allowed: &[FrameState]) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(RenderError::InvalidState {
                operation,
                state: self.state.describe(),
            })
        }
    }

    fn terminate(&mut self, operation: &str, err: RenderError) -> RenderError {
        log::error!("{operation} failed, terminating: {err}");
        self.state = FrameState::Terminated;
        err
    }

    fn build_scene(&mut self) -> Result<()> {
        for desc in &self.scene.meshes {
            let mesh = Mesh::from_positions(&desc.positions, &desc.indices)?;
            self.meshes.insert(desc.name.clone(), mesh)?;
        }

        let mut by_name: HashMap<&str, usize> = HashMap::with_capacity(self.scene.programs.len());
        for desc in &self.scene.programs {
            if by_name.contains_key(desc.name.as_str()) {
                return Err(RenderError::InvalidScene(format!(
                    "duplicate program name `{}`",
                    desc.name
                )));
            }

            let program = ShaderProgram::compile(
                &mut self.backend,
                desc.vertex.as_str(),
                desc.fragment.as_str(),
            )
            .inspect_err(|e| {
                log::error!(
                    "program `{}` ({} + {}): {e}",
                    desc.name,
                    desc.vertex.origin,
                    desc.fragment.origin
                );
            })?;

            let handles = AnimationHandles {
                alpha: optional_param(&program, &desc.name, ALPHA_PARAM)?,
                beta: optional_param(&program, &desc.name, BETA_PARAM)?,
                mouse: optional_param(&program, &desc.name, MOUSE_PARAM)?,
            };

            by_name.insert(desc.name.as_str(), self.programs.len());
            self.programs.push(ProgramSlot {
                name: desc.name.clone(),
                program,
                handles,
            });
        }

        for draw in &self.scene.draws {
            let mesh = self.meshes.by_name(&draw.mesh).ok_or_else(|| {
                RenderError::InvalidScene(format!("draw references unknown mesh `{}`", draw.mesh))
            })?;
            let program = by_name.get(draw.program.as_str()).copied().ok_or_else(|| {
                RenderError::InvalidScene(format!(
                    "draw references unknown program `{}`",
                    draw.program
                ))
            })?;
            self.draws.push(ResolvedDraw {
                mesh: mesh.id(),
                program,
            });
        }

        self.animation = AnimationState::new();
        self.backend.set_clear_color(self.scene.clear_color);
        Ok(())
    }

    fn run_frame<S>(&mut self, input: &S) -> Result<()>
    where
        S: InputSource + ?Sized,
    {
        self.backend.clear(ClearFlags::COLOR | ClearFlags::DEPTH)?;

        let sample = InputSample::from_source(input);
        self.animation.update(&sample);
        self.animation
            .track_pointer(sample.pointer, self.viewport.as_ref());

        log::trace!(
            "frame {}: alpha {:.4} beta {:.4} pointer {:?}",
            self.frame_index,
            self.animation.alpha,
            self.animation.beta,
            self.animation.pointer
        );

        for slot in &self.programs {
            let AnimationHandles { alpha, beta, mouse } = slot.handles;
            if let Some(h) = alpha {
                slot.program
                    .set_parameter(&mut self.backend, h, self.animation.alpha)?;
            }
            if let Some(h) = beta {
                slot.program
                    .set_parameter(&mut self.backend, h, self.animation.beta)?;
            }
            if let Some(h) = mouse {
                slot.program
                    .set_parameter(&mut self.backend, h, self.animation.pointer)?;
            }
        }

        for draw in &self.draws {
            let mesh = self.meshes.get(draw.mesh).ok_or_else(|| {
                RenderError::InvalidScene(format!("mesh {} left the store", draw.mesh.raw()))
            })?;
            self.backend.set_shader(self.programs[draw.program].program.id())?;
            self.backend.render(mesh)?;
        }

        self.backend.present()
    }
}

/// Resolves `name`, mapping "not declared" to `None`.
fn optional_param(
    program: &ShaderProgram,
    program_name: &str,
    name: &str,
) -> Result<Option<ParamHandle>> {
    match program.parameter(name) {
        Ok(handle) => Ok(Some(handle)),
        Err(RenderError::UnknownParameter { .. }) => {
            log::debug!("program `{program_name}` does not declare `{name}`");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
