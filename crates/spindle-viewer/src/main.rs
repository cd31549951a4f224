mod config;

use anyhow::{Context, Result};
use spindle_engine::device::GpuInit;
use spindle_engine::logging::{init_logging, LoggingConfig};
use spindle_engine::scene::SceneDesc;
use spindle_engine::window::{LogicalSize, Runtime, RuntimeConfig};

use crate::config::{SceneChoice, ViewerConfig};

fn main() -> Result<()> {
    let config = ViewerConfig::load().context("failed to load viewer configuration")?;

    init_logging(LoggingConfig {
        env_filter: config.log_filter.clone(),
        ..LoggingConfig::default()
    });
    log::debug!("{config:?}");

    let shader_dir = config.shader_dir.as_deref();
    let scene = match config.scene {
        SceneChoice::House => SceneDesc::house(shader_dir),
        SceneChoice::Dual => SceneDesc::house_and_pyramid(shader_dir),
    }
    .context("failed to load scene shaders")?;

    log::info!("starting scene `{}`", scene.name);

    Runtime::run(
        RuntimeConfig {
            title: config.window.title,
            initial_size: LogicalSize::new(config.window.width, config.window.height),
        },
        GpuInit::default(),
        scene,
    )
}
