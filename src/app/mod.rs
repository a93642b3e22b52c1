//! Application lifecycle and main loop.
//!
//! An [`Application`] owns the [`Surface`] (window plus context), the
//! optional [`UiOverlay`] and the frame loop. User code implements
//! [`Lifecycle`] and hands it to [`Application::run`]:
//!
//! ```no_run
//! use glstage::{Application, Lifecycle, Platform, WindowConfig};
//!
//! struct Demo;
//!
//! impl Lifecycle for Demo {
//!     fn on_tick(&mut self, app: &mut Application, _dt: f32) {
//!         app.gpu().clear([0.1, 0.1, 0.1, 1.0], true);
//!         app.end_frame();
//!     }
//! }
//!
//! let app = Application::new(WindowConfig::default(), Platform::desktop())?;
//! app.run(Demo);
//! # Ok::<(), glstage::InitError>(())
//! ```

mod lifecycle;

pub use lifecycle::{Lifecycle, RunState};

use serde::Deserialize;

use crate::error::InitError;
use crate::gpu::{gl_size, GpuBackend};
use crate::overlay::UiOverlay;
use crate::platform::{LoopDriver, Platform};
use crate::shader::ShaderManager;
#[cfg(feature = "glfw")]
use crate::surface::GlfwSurface;
use crate::surface::{Key, Surface, SurfaceEvent};
use crate::texture::TextureLoader;

/// Window parameters, fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Window title.
    pub title: String,
    /// Initial width in screen coordinates. Must be non-zero.
    pub width: u32,
    /// Initial height in screen coordinates. Must be non-zero.
    pub height: u32,
    /// Wait for vertical blank on swap.
    pub vsync: bool,
    /// Create the Dear ImGui overlay.
    pub ui_overlay: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "glstage".to_owned(),
            width: 1280,
            height: 720,
            vsync: true,
            ui_overlay: true,
        }
    }
}

impl WindowConfig {
    /// Checks the values a window cannot be created from.
    ///
    /// # Errors
    ///
    /// Returns [`InitError::InvalidConfig`] for a zero width or height.
    pub fn validate(&self) -> Result<(), InitError> {
        if self.width == 0 || self.height == 0 {
            return Err(InitError::InvalidConfig(format!(
                "window size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

/// How [`Application::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The blocking loop exited and `on_shutdown` ran.
    Finished,
    /// The frame callback was registered with the host; the application now
    /// lives inside it.
    HandedToHost,
}

/// `width / height`, or exactly `1.0` when `height` is zero.
#[must_use]
#[expect(clippy::cast_precision_loss)]
pub fn aspect_ratio(width: u32, height: u32) -> f32 {
    if height == 0 {
        1.0
    } else {
        width as f32 / height as f32
    }
}

/// Window, context, overlay and frame loop.
pub struct Application {
    platform: Platform,
    overlay: Option<UiOverlay>,
    surface: Box<dyn Surface>,
    state: RunState,
    last_frame_time: f64,
    last_delta: f32,
    frame_count: u64,
    frame_presented: bool,
}

impl Application {
    /// Opens a GLFW window for `config` with a context of the platform's
    /// dialect and bootstraps it (see [`with_surface`](Self::with_surface)).
    ///
    /// # Errors
    ///
    /// Returns an [`InitError`] if the configuration is invalid or the
    /// window, context or overlay cannot be created, including
    /// [`InitError::OverlayInUse`] when another overlay is alive. Everything
    /// created before the failure has been released.
    #[cfg(feature = "glfw")]
    pub fn new(config: WindowConfig, platform: Platform) -> Result<Self, InitError> {
        config.validate()?;
        let surface = GlfwSurface::open(&config, platform.dialect())?;
        Self::with_surface(config, platform, Box::new(surface))
    }

    /// Bootstraps an already-open surface: logs the driver versions, sets
    /// the viewport and vsync, and creates the overlay if requested.
    ///
    /// # Errors
    ///
    /// Returns [`InitError::InvalidConfig`] for a zero-sized config,
    /// [`InitError::OverlayInUse`] if the overlay is requested while another
    /// UI context is alive (for example another `Application` with an
    /// overlay), and [`InitError::Overlay`] if the overlay cannot be created.
    pub fn with_surface(
        config: WindowConfig,
        platform: Platform,
        mut surface: Box<dyn Surface>,
    ) -> Result<Self, InitError> {
        config.validate()?;

        let (version, glsl) = surface.gpu().version_strings();
        log::info!("OpenGL version: {version}");
        log::info!("GLSL version: {glsl}");

        let (width, height) = surface.framebuffer_size();
        surface.gpu().viewport(0, 0, gl_size(width), gl_size(height));
        surface.set_vsync(config.vsync);

        let overlay = if config.ui_overlay {
            Some(UiOverlay::new(surface.gpu(), platform.dialect())?)
        } else {
            None
        };

        log::info!(
            "Created window \"{}\" ({}x{}, {:?})",
            config.title,
            config.width,
            config.height,
            platform.dialect()
        );

        Ok(Self {
            platform,
            overlay,
            surface,
            state: RunState::Uninitialized,
            last_frame_time: 0.0,
            last_delta: 0.0,
            frame_count: 0,
            frame_presented: false,
        })
    }

    /// Runs `on_init`, then the platform's frame loop.
    ///
    /// With a blocking driver this returns after `should_quit` turns true and
    /// `on_shutdown` has run. With a host driver it registers a per-frame
    /// callback that owns the application and returns immediately;
    /// `on_shutdown` is then never called.
    pub fn run<L: Lifecycle + 'static>(mut self, mut lifecycle: L) -> RunOutcome {
        self.start(&mut lifecycle);
        match self.platform.take_loop_driver() {
            LoopDriver::Blocking => {
                log::info!("Entering main loop");
                while !lifecycle.should_quit(&self) {
                    self.tick(&mut lifecycle);
                }
                self.shutdown(&mut lifecycle);
                RunOutcome::Finished
            }
            LoopDriver::Host(mut host) => {
                log::info!("Handing main loop to host");
                host.set_main_loop(Box::new(move || self.tick(&mut lifecycle)));
                RunOutcome::HandedToHost
            }
        }
    }

    /// Calls `on_init` if it has not run yet. [`run`](Self::run) does this
    /// itself; call it directly only when ticking by hand.
    pub fn start<L: Lifecycle + ?Sized>(&mut self, lifecycle: &mut L) {
        if self.state != RunState::Uninitialized {
            return;
        }
        self.state = RunState::Initializing;
        lifecycle.on_init(self);
        self.state = RunState::Running;
    }

    /// Runs one frame: measures the delta since the previous frame, handles
    /// pending events, then calls `on_tick`.
    ///
    /// The first frame's delta is the surface time since creation.
    #[expect(clippy::cast_possible_truncation)]
    pub fn tick<L: Lifecycle + ?Sized>(&mut self, lifecycle: &mut L) {
        if self.state != RunState::Running {
            log::warn!("tick() ignored in state {:?}", self.state);
            return;
        }

        let now = self.surface.time();
        let delta_time = (now - self.last_frame_time).max(0.0) as f32;
        self.last_frame_time = now;
        self.last_delta = delta_time;
        self.frame_presented = false;

        for event in self.surface.poll_events() {
            self.handle_event(&event);
        }

        lifecycle.on_tick(self, delta_time);
        self.frame_count += 1;
    }

    /// Calls `on_shutdown` and releases the overlay. Runs at most once, and
    /// only after `on_init`.
    pub fn shutdown<L: Lifecycle + ?Sized>(&mut self, lifecycle: &mut L) {
        if self.state != RunState::Running {
            return;
        }
        log::info!("Shutting down...");
        self.state = RunState::ShuttingDown;
        lifecycle.on_shutdown(self);
        if let Some(mut overlay) = self.overlay.take() {
            overlay.release(self.surface.gpu());
        }
        self.state = RunState::Terminated;
    }

    fn handle_event(&mut self, event: &SurfaceEvent) {
        match *event {
            SurfaceEvent::FramebufferResized { width, height } => {
                log::debug!("framebuffer resized to {width}x{height}");
                self.surface
                    .gpu()
                    .viewport(0, 0, gl_size(width), gl_size(height));
            }
            SurfaceEvent::Key {
                key: Key::Escape,
                pressed: true,
                ..
            }
            | SurfaceEvent::CloseRequested => self.surface.set_should_close(true),
            _ => {}
        }
        if let Some(overlay) = &mut self.overlay {
            overlay.handle_event(event);
        }
    }

    /// Presents the frame. Only the first call in a tick swaps; later calls
    /// are ignored with a warning.
    pub fn end_frame(&mut self) {
        if self.frame_presented {
            log::warn!("end_frame() called more than once in frame {}", self.frame_count);
            return;
        }
        self.surface.swap_buffers();
        self.frame_presented = true;
    }

    /// Builds and draws one overlay frame. Does nothing without an overlay.
    pub fn draw_overlay(&mut self, build: impl FnOnce(&imgui::Ui)) {
        if let Some(overlay) = &mut self.overlay {
            overlay.frame(
                self.surface.gpu(),
                self.surface.window_size(),
                self.surface.framebuffer_size(),
                self.last_delta,
                build,
            );
        }
    }

    /// Backend of this application's context.
    #[must_use]
    pub fn gpu(&self) -> &dyn GpuBackend {
        self.surface.gpu()
    }

    /// Shader loader for this context and dialect.
    #[must_use]
    pub fn shaders(&self) -> ShaderManager<'_> {
        ShaderManager::new(self.surface.gpu(), self.platform.shader_suffix())
    }

    /// Texture loader for this context.
    #[must_use]
    pub fn textures(&self) -> TextureLoader<'_> {
        TextureLoader::new(self.surface.gpu())
    }

    /// Platform this application was built for.
    #[must_use]
    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    /// Framebuffer width in pixels.
    #[must_use]
    pub fn window_width(&self) -> u32 {
        self.surface.framebuffer_size().0
    }

    /// Framebuffer height in pixels.
    #[must_use]
    pub fn window_height(&self) -> u32 {
        self.surface.framebuffer_size().1
    }

    /// Framebuffer aspect ratio; `1.0` while the height is zero (minimized).
    #[must_use]
    pub fn aspect_ratio(&self) -> f32 {
        let (width, height) = self.surface.framebuffer_size();
        aspect_ratio(width, height)
    }

    /// Asks the loop to stop after the current frame.
    pub fn request_close(&mut self) {
        self.surface.set_should_close(true);
    }

    /// Whether closing has been requested.
    #[must_use]
    pub fn close_requested(&self) -> bool {
        self.surface.should_close()
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn run_state(&self) -> RunState {
        self.state
    }

    /// Number of completed ticks.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Delta passed to the most recent `on_tick`.
    #[must_use]
    pub fn delta_time(&self) -> f32 {
        self.last_delta
    }

    /// Whether an overlay was created.
    #[must_use]
    pub fn has_overlay(&self) -> bool {
        self.overlay.is_some()
    }
}

impl Drop for Application {
    fn drop(&mut self) {
        if let Some(mut overlay) = self.overlay.take() {
            overlay.release(self.surface.gpu());
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::headless::HeadlessSurface;
    use crate::surface::Modifiers;

    fn app_on(surface: HeadlessSurface) -> Application {
        Application::with_surface(config(), Platform::desktop(), Box::new(surface)).unwrap()
    }

    fn config() -> WindowConfig {
        WindowConfig {
            title: "Test".into(),
            width: 320,
            height: 200,
            vsync: false,
            ui_overlay: false,
        }
    }

    #[derive(Default)]
    struct Counter {
        inits: u32,
        ticks: Vec<f32>,
        shutdowns: u32,
        presents: u32,
    }

    impl Lifecycle for Counter {
        fn on_init(&mut self, _app: &mut Application) {
            self.inits += 1;
        }

        fn on_tick(&mut self, app: &mut Application, delta_time: f32) {
            self.ticks.push(delta_time);
            for _ in 0..self.presents {
                app.end_frame();
            }
        }

        fn on_shutdown(&mut self, _app: &mut Application) {
            self.shutdowns += 1;
        }
    }

    #[test]
    fn aspect_ratio_handles_zero_height() {
        assert!((aspect_ratio(1920, 1080) - 16.0 / 9.0).abs() < 1e-6);
        assert!((aspect_ratio(800, 0) - 1.0).abs() < f32::EPSILON);
        assert!((aspect_ratio(0, 0) - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn zero_sized_config_is_rejected() {
        let bad = WindowConfig { width: 0, ..config() };
        let surface = Box::new(HeadlessSurface::new(1, 1));
        let err = Application::with_surface(bad, Platform::desktop(), surface)
            .err()
            .unwrap();
        assert!(matches!(err, InitError::InvalidConfig(_)));
    }

    #[test]
    fn construction_sets_viewport_and_vsync() {
        let surface = HeadlessSurface::new(320, 200).with_framebuffer(640, 400);
        let probe = surface.probe();
        let app = app_on(surface);

        assert_eq!(probe.gpu().viewport(), [0, 0, 640, 400]);
        assert_eq!(probe.vsync(), Some(false));
        assert_eq!((app.window_width(), app.window_height()), (640, 400));
        assert_eq!(app.run_state(), RunState::Uninitialized);
        assert!(!app.has_overlay());
    }

    #[test]
    fn tick_measures_delta_from_surface_clock() {
        let surface = HeadlessSurface::new(320, 200);
        let probe = surface.probe();
        let mut app = app_on(surface);
        let mut counter = Counter::default();

        app.tick(&mut counter);
        assert!(counter.ticks.is_empty());

        app.start(&mut counter);
        app.start(&mut counter);
        assert_eq!(counter.inits, 1);

        probe.set_time(0.5);
        app.tick(&mut counter);
        probe.advance(0.25);
        app.tick(&mut counter);
        assert_eq!(counter.ticks, vec![0.5, 0.25]);
        assert_eq!(app.frame_count(), 2);
    }

    #[test]
    fn second_end_frame_in_a_tick_is_ignored() {
        let surface = HeadlessSurface::new(320, 200);
        let probe = surface.probe();
        let mut app = app_on(surface);
        let mut counter = Counter {
            presents: 3,
            ..Counter::default()
        };
        app.start(&mut counter);
        app.tick(&mut counter);
        app.tick(&mut counter);
        assert_eq!(probe.swap_count(), 2);
    }

    #[test]
    fn resize_and_escape_are_handled_before_on_tick() {
        let surface = HeadlessSurface::new(320, 200);
        let probe = surface.probe();
        let mut app = app_on(surface);
        let mut counter = Counter::default();
        app.start(&mut counter);

        probe.resize(100, 0);
        app.tick(&mut counter);
        assert_eq!(probe.gpu().viewport(), [0, 0, 100, 0]);
        assert!((app.aspect_ratio() - 1.0).abs() < f32::EPSILON);
        assert!(!counter.should_quit(&app));

        probe.push_event(SurfaceEvent::Key {
            key: Key::Letter('A'),
            pressed: true,
            modifiers: Modifiers::default(),
        });
        app.tick(&mut counter);
        assert!(!app.close_requested());

        probe.push_event(SurfaceEvent::Key {
            key: Key::Escape,
            pressed: true,
            modifiers: Modifiers::default(),
        });
        app.tick(&mut counter);
        assert!(counter.should_quit(&app));
    }

    #[test]
    fn shutdown_runs_once_and_only_after_init() {
        let surface = HeadlessSurface::new(320, 200);
        let mut app = app_on(surface);
        let mut counter = Counter::default();

        app.shutdown(&mut counter);
        assert_eq!(counter.shutdowns, 0);

        app.start(&mut counter);
        app.shutdown(&mut counter);
        app.shutdown(&mut counter);
        assert_eq!(counter.shutdowns, 1);
        assert_eq!(app.run_state(), RunState::Terminated);
    }
}
