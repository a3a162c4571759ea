//! bassbloom - Audio-reactive particle visualizer
//!
//! Frequency bins above a threshold burst into coloured particles that
//! drift outward and fade over a trailing canvas.

use anyhow::Context;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use bassbloom::audio::{CpalBackend, InputController, InputMode, SampleTap, SpectrumAnalyser};
use bassbloom::cli::Args;
use bassbloom::params::RenderConfig;
use bassbloom::particles::Simulator;
use bassbloom::rendering::Renderer;
use bassbloom::surface::RenderSurface;

/// Main application state
struct App {
    // Window and rendering
    window: Option<Arc<Window>>,
    renderer: Option<Renderer>,
    surface: RenderSurface,
    title: String,

    // Simulation
    simulator: Simulator,
    rng: StdRng,

    // Audio
    analyser: SpectrumAnalyser,
    tap: SampleTap,
    input: InputController<CpalBackend>,
    spectrum: Vec<u8>,

    // Configuration
    render_config: RenderConfig,
    file: Option<PathBuf>,
    start_with_mic: bool,
}

impl App {
    fn new(args: Args) -> anyhow::Result<Self> {
        let render_config = args.render_config();
        render_config
            .validate()
            .context("Invalid render parameters")?;
        let fft_config = args.fft_config();

        let simulator =
            Simulator::new(args.simulation_config()).context("Invalid simulation parameters")?;
        let analyser = SpectrumAnalyser::new(fft_config).context("Invalid FFT parameters")?;

        let tap = SampleTap::new(fft_config.fft_size);
        let input = InputController::new(CpalBackend::new(), tap.clone());

        let rng = match args.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            window: None,
            renderer: None,
            surface: RenderSurface::new(0, 0, render_config.height_fraction),
            title: String::new(),
            simulator,
            rng,
            spectrum: vec![0; analyser.bin_count()],
            analyser,
            tap,
            input,
            render_config,
            file: args.file,
            start_with_mic: args.mic,
        })
    }

    /// Load the configured file, if any
    fn open_file(&mut self) {
        match self.file.clone() {
            Some(path) => self.input.open_file(&path),
            None => info!("No file given; press M for microphone input"),
        }
    }

    fn toggle_microphone(&mut self) {
        if self.input.mode() == InputMode::Microphone {
            self.input.set_microphone(false);
            self.open_file();
        } else {
            self.input.set_microphone(true);
        }
        self.analyser.reset();
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, key: KeyCode) {
        match key {
            KeyCode::Escape => event_loop.exit(),
            KeyCode::Space => self.input.toggle_playback(),
            KeyCode::KeyM => self.toggle_microphone(),
            _ => {}
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        if self.surface.resize(width, height) {
            debug!(
                "Drawing surface {}x{}",
                self.surface.width, self.surface.height
            );
        }
        if let Some(renderer) = self.renderer.as_mut() {
            renderer.resize(width, height, self.surface);
        }
    }

    /// Render a single frame
    fn render_frame(&mut self, event_loop: &ActiveEventLoop) {
        self.input.refresh_time();
        let title = self.input.title(&self.render_config.title);
        if title != self.title {
            if let Some(window) = &self.window {
                window.set_title(&title);
            }
            self.title = title;
        }

        if self.surface.is_empty() {
            return;
        }
        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };

        self.analyser.sample(&self.tap, &mut self.spectrum);
        let frame = self
            .simulator
            .tick(&self.spectrum, self.surface, &mut self.rng);

        match renderer.render(&frame) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => renderer.reconfigure(),
            Err(wgpu::SurfaceError::OutOfMemory) => {
                error!("GPU out of memory");
                event_loop.exit();
            }
            Err(e) => warn!("Render error: {:?}", e),
        }
    }
}

impl ApplicationHandler for App {
    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return; // Already initialized
        }

        let window_attributes = Window::default_attributes()
            .with_title(self.render_config.title.as_str())
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.render_config.window_width,
                self.render_config.window_height,
            ));

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let size = window.inner_size();
        self.surface.resize(size.width, size.height);

        let renderer = match pollster::block_on(Renderer::new(Arc::clone(&window), self.surface))
        {
            Ok(renderer) => renderer,
            Err(e) => {
                error!("Failed to initialize renderer: {}", e);
                event_loop.exit();
                return;
            }
        };

        self.window = Some(window);
        self.renderer = Some(renderer);

        if self.start_with_mic {
            self.input.set_microphone(true);
        } else {
            self.open_file();
        }

        info!("bassbloom is running (M: microphone, Space: play/pause, Esc: quit)");
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => self.resize(size.width, size.height),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key,
                        repeat,
                        ..
                    },
                ..
            } => {
                let unlocked = self.input.on_user_interaction();
                if let (PhysicalKey::Code(key), false) = (physical_key, repeat) {
                    // A play/pause press that unlocked playback is spent
                    if !(unlocked && key == KeyCode::Space) {
                        self.handle_key(event_loop, key);
                    }
                }
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                ..
            } => {
                self.input.on_user_interaction();
            }
            WindowEvent::RedrawRequested => self.render_frame(event_loop),
            _ => {}
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut app = App::new(args)?;

    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    event_loop
        .run_app(&mut app)
        .context("Event loop terminated with an error")?;
    Ok(())
}
