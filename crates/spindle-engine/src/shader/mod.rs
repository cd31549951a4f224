//! Shader programs and uniform parameters.
//!
//! Programs are WGSL vertex + fragment pairs. Uniform parameters are the
//! members of the struct bound at `@group(0) @binding(0)` in the uniform
//! address space; see [`reflect`] for the exact rules.

mod param;
mod program;
pub mod reflect;
mod source;
mod uniform;

pub use param::{ParamHandle, ParamKind, ParamValue, ProgramId};
pub use program::{ProgramInfo, ShaderProgram};
pub use reflect::{reflect_program, ProgramReflection};
pub use source::{ShaderOrigin, ShaderSource};
pub use uniform::{UniformBlock, UniformField, UniformLayout};
