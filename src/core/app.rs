//! Windowed runner: drives an [`Engine`] from a winit event loop

use std::sync::Arc;
use std::time::Instant;

use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::audio::{AudioPlayer, SilentPlayer};
use crate::core::{Engine, EngineError, FixedStep, logger};
use crate::input::{InputSource, WindowInput};
use crate::logic::TickReport;
use crate::renderer::Renderer;

/// An input source that can take window events
pub trait WindowSource: InputSource {
    /// The keyboard and pointer part of the source
    fn window_input(&mut self) -> &mut WindowInput;
}

impl WindowSource for WindowInput {
    fn window_input(&mut self) -> &mut WindowInput {
        self
    }
}

impl<B: InputSource> WindowSource for (WindowInput, B) {
    fn window_input(&mut self) -> &mut WindowInput {
        &mut self.0
    }
}

/// Game hooks called by [`App`]
pub trait Game<S: InputSource = WindowInput>: 'static {
    /// Called once the window exists; build the scene and register logic here
    fn init(&mut self, engine: &mut Engine<S>) -> anyhow::Result<()>;

    /// Called after every engine tick
    fn after_tick(&mut self, _engine: &mut Engine<S>, _report: &TickReport) {}

    /// Called when the window is resized
    fn on_resize(&mut self, _engine: &mut Engine<S>, _width: u32, _height: u32) {}

    /// Called when the game is shutting down
    fn shutdown(&mut self, _engine: &mut Engine<S>) {}
}

/// Runs an engine in a window, ticking at the configured rate and handing a
/// frame to the renderer and queued audio to the player on every redraw
pub struct App<G, R, S = WindowInput>
where
    G: Game<S>,
    R: Renderer,
    S: WindowSource,
{
    engine: Engine<S>,
    game: G,
    renderer: R,
    audio: Box<dyn AudioPlayer>,
    window: Option<Arc<Window>>,
    clock: FixedStep,
    last_frame: Instant,
    initialized: bool,
    error: Option<anyhow::Error>,
}

impl<G, R, S> App<G, R, S>
where
    G: Game<S>,
    R: Renderer,
    S: WindowSource,
{
    /// Create a runner
    pub fn new(engine: Engine<S>, game: G, renderer: R) -> Self {
        let clock = FixedStep::new(engine.config().tick());
        Self {
            engine,
            game,
            renderer,
            audio: Box::new(SilentPlayer),
            window: None,
            clock,
            last_frame: Instant::now(),
            initialized: false,
            error: None,
        }
    }

    /// Use an audio backend; the default plays nothing
    #[must_use]
    pub fn with_audio_player(mut self, player: impl AudioPlayer + 'static) -> Self {
        self.audio = Box::new(player);
        self
    }

    /// Run until the window closes or the game quits
    ///
    /// # Errors
    ///
    /// Returns an error if the event loop fails or the game fails to start
    pub fn run(mut self) -> Result<(), EngineError> {
        logger::init(&self.engine.config().log_filter);
        log::info!("Starting {}", self.engine.config().title);

        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);
        event_loop.run_app(&mut self)?;

        match self.error.take() {
            Some(err) => Err(EngineError::Game(err)),
            None => Ok(()),
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{error:#}");
        self.error = Some(error);
        event_loop.exit();
    }

    fn stop(&mut self, event_loop: &ActiveEventLoop) {
        self.game.shutdown(&mut self.engine);
        log::info!("Stopped after {} ticks", self.clock.total_ticks());
        event_loop.exit();
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        let ticks = self.clock.advance(now - self.last_frame);
        self.last_frame = now;

        for _ in 0..ticks {
            let report = self.engine.tick();
            self.game.after_tick(&mut self.engine, &report);
            if self.engine.should_quit() {
                self.stop(event_loop);
                return;
            }
        }

        self.engine.play_audio(self.audio.as_mut());
        self.engine.render(&mut self.renderer);
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

impl<G, R, S> ApplicationHandler for App<G, R, S>
where
    G: Game<S>,
    R: Renderer,
    S: WindowSource,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let config = self.engine.config();
        let window_attrs = Window::default_attributes()
            .with_title(&config.title)
            .with_inner_size(PhysicalSize::new(config.width, config.height));

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                self.fail(event_loop, anyhow::Error::new(err).context("failed to create window"));
                return;
            }
        };
        let size = window.inner_size();
        self.renderer.resize(size.width, size.height);
        self.window = Some(window);

        if !self.initialized {
            if let Err(err) = self.game.init(&mut self.engine) {
                self.fail(event_loop, err);
                return;
            }
            self.initialized = true;
            self.last_frame = Instant::now();
            log::info!("Game initialized");
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, shutting down");
                self.stop(event_loop);
            }

            WindowEvent::Resized(new_size) => {
                if new_size.width > 0 && new_size.height > 0 {
                    self.engine.resize(new_size.width, new_size.height);
                    self.renderer.resize(new_size.width, new_size.height);
                    self.game
                        .on_resize(&mut self.engine, new_size.width, new_size.height);
                }
            }

            WindowEvent::RedrawRequested => self.redraw(event_loop),

            other => {
                self.engine
                    .source_mut()
                    .window_input()
                    .process_window_event(&other);
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}
