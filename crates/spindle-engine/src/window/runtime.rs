use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::backend::WgpuBackend;
use crate::device::{Gpu, GpuInit};
use crate::frame::FrameController;
use crate::input::platform::translate_window_event;
use crate::input::{InputEvent, InputState, Key, KeyState};
use crate::scene::SceneDesc;

/// Window configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "spindle".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
        }
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens a window, renders `scene` until the window closes and returns
    /// the first fatal error, if any.
    pub fn run(config: RuntimeConfig, gpu_init: GpuInit, scene: SceneDesc) -> Result<()> {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, gpu_init, scene);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[self_referencing]
struct Session {
    input: InputState,

    window: Window,

    #[borrows(window)]
    #[covariant]
    controller: FrameController<WgpuBackend<'this>>,
}

struct AppState {
    config: RuntimeConfig,
    gpu_init: GpuInit,
    /// Consumed when the session is created.
    scene: Option<SceneDesc>,

    session: Option<Session>,
    /// Last reported size was 0x0; nothing is drawn until it grows again.
    minimized: bool,
    error: Option<anyhow::Error>,
}

impl AppState {
    fn new(config: RuntimeConfig, gpu_init: GpuInit, scene: SceneDesc) -> Self {
        Self {
            config,
            gpu_init,
            scene: Some(scene),
            session: None,
            minimized: false,
            error: None,
        }
    }

    fn create_session(&mut self, event_loop: &ActiveEventLoop) -> Result<Session> {
        let scene = self.scene.take().context("scene already consumed")?;

        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let gpu_init = self.gpu_init.clone();

        SessionTryBuilder {
            input: InputState::new(),
            window,
            controller_builder: |w| {
                let gpu = pollster::block_on(Gpu::new(w, gpu_init))
                    .context("GPU initialization failed")?;
                let mut controller = FrameController::new(WgpuBackend::new(gpu), scene);

                let size = w.inner_size();
                controller
                    .on_resize(size.width, size.height)
                    .context("initial viewport")?;
                controller.init().context("scene initialization failed")?;
                Ok(controller)
            },
        }
        .try_build()
    }

    /// Records the first fatal error and stops the loop.
    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        if self.error.is_none() {
            self.error = Some(err);
        }
        self.close(event_loop);
    }

    fn close(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(mut session) = self.session.take() {
            session.with_controller_mut(|c| c.shutdown());
        }
        event_loop.exit();
    }

    fn resize(&mut self, size: PhysicalSize<u32>) -> Result<()> {
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };

        // Minimized windows report 0x0: the surface records it, the viewport
        // keeps its last value.
        self.minimized = size.width == 0 || size.height == 0;
        let minimized = self.minimized;

        session.with_mut(|fields| {
            fields.controller.backend_mut().resize_surface(size);
            if minimized {
                log::debug!("window minimized; pausing frames");
                return Ok(());
            }
            fields.controller.on_resize(size.width, size.height)?;
            fields.window.request_redraw();
            Ok(())
        })
    }

    fn redraw(&mut self) -> Result<()> {
        if self.minimized {
            return Ok(());
        }
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };

        session.with_mut(|fields| {
            fields.window.pre_present_notify();
            fields.controller.render_frame(&*fields.input)?;
            fields.input.end_frame();
            Ok(())
        })
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.session.is_some() || self.error.is_some() {
            return;
        }

        match self.create_session(event_loop) {
            Ok(session) => {
                session.with_window(|w| w.request_redraw());
                self.session = Some(session);
            }
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Wait);

        // Continuous redraw; the animation advances once per frame.
        if self.minimized {
            return;
        }
        if let Some(session) = &self.session {
            session.with_window(|w| w.request_redraw());
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let translated = translate_window_event(&event);
        if let Some(ev) = translated {
            session.with_input_mut(|input| input.apply_event(ev));
        }

        if let Some(InputEvent::Key {
            key: Key::Escape,
            state: KeyState::Pressed,
            ..
        }) = translated
        {
            self.close(event_loop);
            return;
        }

        match &event {
            WindowEvent::CloseRequested => self.close(event_loop),

            WindowEvent::Resized(new_size) => {
                if let Err(e) = self.resize(*new_size) {
                    self.fail(event_loop, e);
                }
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                let new_size = session.with_window(|w| w.inner_size());
                if let Err(e) = self.resize(new_size) {
                    self.fail(event_loop, e);
                }
            }

            WindowEvent::RedrawRequested => {
                if let Err(e) = self.redraw() {
                    self.fail(event_loop, e);
                }
            }

            _ => {}
        }
    }
}
