use std::collections::HashMap;

use crate::backend::GraphicsBackend;
use crate::error::{RenderError, Result};

use super::{ParamHandle, ParamValue, ProgramId, UniformLayout};

/// What a backend reports after creating a program.
#[derive(Debug, Clone)]
pub struct ProgramInfo {
    pub id: ProgramId,
    pub layout: UniformLayout,
}

/// A compiled vertex + fragment program and its parameter handles.
///
/// Handles for every declared parameter are resolved once at compile time;
/// [`ShaderProgram::parameter`] only reads that cache.
#[derive(Debug, Clone)]
pub struct ShaderProgram {
    info: ProgramInfo,
    handles: HashMap<String, ParamHandle>,
}

impl ShaderProgram {
    /// Compiles and links a program on `backend`.
    pub fn compile<B>(backend: &mut B, vertex_src: &str, fragment_src: &str) -> Result<Self>
    where
        B: GraphicsBackend + ?Sized,
    {
        let info = backend.create_shader(vertex_src, fragment_src)?;

        let handles = info
            .layout
            .fields
            .iter()
            .enumerate()
            .map(|(slot, f)| (f.name.clone(), ParamHandle::new(info.id, slot as u32)))
            .collect();

        log::debug!(
            "compiled {} with {} parameter(s)",
            info.id,
            info.layout.fields.len()
        );

        Ok(Self { info, handles })
    }

    #[inline]
    pub fn id(&self) -> ProgramId {
        self.info.id
    }

    #[inline]
    pub fn layout(&self) -> &UniformLayout {
        &self.info.layout
    }

    /// Looks up a parameter by name.
    ///
    /// Absence is not necessarily a bug: a backend may strip parameters that
    /// no stage reads. Callers that can live without a parameter should treat
    /// `UnknownParameter` as "nothing to bind".
    pub fn parameter(&self, name: &str) -> Result<ParamHandle> {
        self.handles
            .get(name)
            .copied()
            .ok_or_else(|| RenderError::UnknownParameter {
                name: name.to_string(),
            })
    }

    /// Stages `value` for `handle`; it takes effect on the next draw with this program.
    pub fn set_parameter<B>(
        &self,
        backend: &mut B,
        handle: ParamHandle,
        value: impl Into<ParamValue>,
    ) -> Result<()>
    where
        B: GraphicsBackend + ?Sized,
    {
        if handle.program() != self.id() {
            return Err(RenderError::InvalidHandle(format!(
                "handle belongs to {}, not {}",
                handle.program(),
                self.id()
            )));
        }
        backend.set_param(handle, value.into())
    }
}
