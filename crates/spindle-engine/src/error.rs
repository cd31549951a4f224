//! Error types shared by the render loop.
//!
//! Every variant is fatal for the operation that produced it: the frame
//! controller never retries and never downgrades an error into a partial frame.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::shader::ParamKind;

/// Convenience alias used across the engine.
pub type Result<T> = std::result::Result<T, RenderError>;

/// Pipeline stage a shader diagnostic refers to.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    /// Both stages compiled but do not form a valid program.
    Link,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
            ShaderStage::Link => f.write_str("link"),
        }
    }
}

#[derive(Error, Debug)]
pub enum RenderError {
    /// Mesh description violates the index invariants.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Shader source failed to compile, or the two stages failed to link.
    #[error("{stage} shader failed to compile:\n{diagnostics}")]
    ShaderCompile {
        stage: ShaderStage,
        diagnostics: String,
    },

    /// Parameter is not declared by any stage of the program.
    #[error("unknown shader parameter `{name}`")]
    UnknownParameter { name: String },

    /// Handle used with a program it was not obtained from, or no longer valid.
    #[error("invalid parameter handle: {0}")]
    InvalidHandle(String),

    #[error("parameter `{name}` is declared as {expected}, got {found}")]
    ParamTypeMismatch {
        name: String,
        expected: ParamKind,
        found: ParamKind,
    },

    #[error("invalid viewport {width}x{height}")]
    InvalidViewport { width: u32, height: u32 },

    /// Operation called in a lifecycle state that does not allow it.
    #[error("`{operation}` is not allowed while {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },

    #[error("invalid scene: {0}")]
    InvalidScene(String),

    /// Device or surface failure reported by the graphics backend.
    #[error("graphics backend failure: {0}")]
    Backend(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RenderError {
    pub(crate) fn compile(stage: ShaderStage, diagnostics: impl Into<String>) -> Self {
        RenderError::ShaderCompile {
            stage,
            diagnostics: diagnostics.into(),
        }
    }
}
