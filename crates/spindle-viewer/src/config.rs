//! Viewer configuration.
//!
//! Sources, later ones overriding earlier ones:
//! 1. built-in defaults
//! 2. `spindle.toml` in the working directory (optional)
//! 3. environment variables prefixed `SPINDLE_`, with `__` separating nested
//!    keys (e.g. `SPINDLE_SCENE=dual`, `SPINDLE_WINDOW__WIDTH=1024`)

use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Which built-in scene to render.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SceneChoice {
    #[default]
    House,
    /// House plus an orbiting pyramid.
    Dual,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    /// Logical pixels.
    pub width: f64,
    pub height: f64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Spindle".to_string(),
            width: 1280.0,
            height: 720.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub scene: SceneChoice,
    /// Directory whose WGSL files override the embedded shaders by name.
    pub shader_dir: Option<PathBuf>,
    /// `env_logger` filter; `RUST_LOG` applies when unset.
    pub log_filter: Option<String>,
    pub window: WindowConfig,
}

impl ViewerConfig {
    /// Loads `spindle.toml` (if present) and `SPINDLE_*` variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_sources(
            File::with_name("spindle").required(false),
            Environment::with_prefix("SPINDLE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
    }

    fn from_sources<S, E>(file: S, env: E) -> Result<Self, ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
        E: config::Source + Send + Sync + 'static,
    {
        Config::builder()
            .add_source(file)
            .add_source(env)
            .build()?
            .try_deserialize()
    }
}
