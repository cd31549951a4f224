use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{RenderError, Result};

/// Where a shader's text came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShaderOrigin {
    /// Compiled into the binary under this name.
    Embedded(&'static str),
    File(PathBuf),
}

impl fmt::Display for ShaderOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderOrigin::Embedded(name) => write!(f, "embedded:{name}"),
            ShaderOrigin::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// WGSL source text.
///
/// Shaders are assets: a configured shader directory overrides the embedded
/// defaults file by file, so a shader can be edited without rebuilding.
#[derive(Debug, Clone)]
pub struct ShaderSource {
    pub origin: ShaderOrigin,
    pub text: Cow<'static, str>,
}

impl ShaderSource {
    pub const fn embedded(name: &'static str, text: &'static str) -> Self {
        Self {
            origin: ShaderOrigin::Embedded(name),
            text: Cow::Borrowed(text),
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| RenderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            origin: ShaderOrigin::File(path.to_path_buf()),
            text: Cow::Owned(text),
        })
    }

    /// Reads `dir/name` when `dir` is set and the file exists, otherwise uses `embedded`.
    ///
    /// Only "not found" falls back; any other read error is returned.
    pub fn load_or_default(dir: Option<&Path>, name: &'static str, embedded: &'static str) -> Result<Self> {
        let Some(dir) = dir else {
            return Ok(Self::embedded(name, embedded));
        };

        let path = dir.join(name);
        match Self::from_file(&path) {
            Ok(src) => {
                log::info!("loaded shader {}", path.display());
                Ok(src)
            }
            Err(RenderError::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("{} not found; using embedded {name}", path.display());
                Ok(Self::embedded(name, embedded))
            }
            Err(e) => Err(e),
        }
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.text
    }
}
