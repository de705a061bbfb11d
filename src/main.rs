use std::sync::Arc;

use clap::Parser;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use lagoon::app::{AppContext, LoopState};
use lagoon::cli::Cli;
use lagoon::config::LagoonConfig;
use lagoon::core::{FrameClock, Viewport};
use lagoon::renderer::Renderer;

struct App {
    config: LagoonConfig,
    window: Option<Arc<Window>>,
    renderer: Option<Renderer>,
    context: Option<AppContext>,
}

impl App {
    fn new(config: LagoonConfig) -> Self {
        Self {
            config,
            window: None,
            renderer: None,
            context: None,
        }
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(context) = &self.context {
            context.cancel_token().cancel();
        }
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window = match event_loop.create_window(
            Window::default_attributes()
                .with_title(self.config.window.title.clone())
                .with_inner_size(winit::dpi::LogicalSize::new(
                    self.config.window.width,
                    self.config.window.height,
                )),
        ) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                log::error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let scale_factor = window.scale_factor();
        let logical = window.inner_size().to_logical::<u32>(scale_factor);
        let viewport = Viewport::new(logical.width, logical.height, scale_factor);

        let renderer = match pollster::block_on(Renderer::new(window.clone(), viewport)) {
            Ok(r) => r,
            Err(e) => {
                log::error!("Failed to initialize renderer: {:#}", e);
                event_loop.exit();
                return;
            }
        };

        let mut context = match AppContext::new(self.config.clone(), FrameClock::system(), viewport) {
            Ok(c) => c,
            Err(e) => {
                log::error!("Failed to build scene: {:#}", e);
                event_loop.exit();
                return;
            }
        };
        context.request_assets();

        window.request_redraw();
        self.window = Some(window);
        self.renderer = Some(renderer);
        self.context = Some(context);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        // Let egui handle the event first
        if let Some(renderer) = &mut self.renderer {
            if renderer.handle_event(&event) {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => self.shutdown(event_loop),
            WindowEvent::Resized(size) => {
                if let (Some(window), Some(renderer), Some(context)) =
                    (&self.window, &mut self.renderer, &mut self.context)
                {
                    let scale_factor = window.scale_factor();
                    let logical = size.to_logical::<u32>(scale_factor);
                    if context.resize(renderer, logical.width, logical.height, scale_factor) {
                        window.request_redraw();
                    }
                }
            }
            WindowEvent::RedrawRequested => {
                let (Some(renderer), Some(context)) = (&mut self.renderer, &mut self.context) else {
                    return;
                };
                match context.tick(renderer) {
                    Ok(LoopState::Running) => {}
                    Ok(LoopState::Stopped) => event_loop.exit(),
                    Err(e) => {
                        log::error!("Frame failed: {:#}", e);
                        self.shutdown(event_loop);
                    }
                }
            }
            other => {
                if let Some(context) = &mut self.context {
                    context.input_mut().process_event(&other);
                }
            }
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let mut config = LagoonConfig::load_or_default(cli.config.as_deref())?;
    cli.apply(&mut config);

    if let Some(path) = &cli.write_config {
        config.save(path)?;
        log::info!("Wrote configuration to {}", path.display());
        return Ok(());
    }

    log::info!(
        "Starting {} scene, assets from {}",
        config.preset.name(),
        config.assets_dir.display()
    );

    let event_loop = EventLoop::new()?;
    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    Ok(())
}
