#![allow(clippy::unwrap_used)]

use std::cell::RefCell;
use std::rc::Rc;

use glstage::headless::{HeadlessProbe, HeadlessSurface, ManualFrameHost};
use glstage::surface::{Key, Modifiers};
use glstage::{
    aspect_ratio, Application, InitError, Lifecycle, Platform, Program, RunOutcome, RunState,
    SurfaceEvent, Texture, WindowConfig,
};
use proptest::prelude::*;

const VERT: &str = "#version 460 core\nlayout(location = 0) in vec3 aPos;\nuniform mat4 uMVP;\nvoid main() {\n    gl_Position = uMVP * vec4(aPos, 1.0);\n}\n";
const FRAG: &str = "#version 460 core\nout vec4 FragColor;\nvoid main() {\n    FragColor = vec4(1.0);\n}\n";

fn test_config(ui_overlay: bool) -> WindowConfig {
    WindowConfig {
        title: "Test".into(),
        width: 800,
        height: 600,
        vsync: true,
        ui_overlay,
    }
}

fn headless_app(ui_overlay: bool, platform: Platform) -> (Application, HeadlessProbe) {
    let surface = HeadlessSurface::new(800, 600);
    let probe = surface.probe();
    let app =
        Application::with_surface(test_config(ui_overlay), platform, Box::new(surface)).unwrap();
    (app, probe)
}

#[derive(Debug, Default)]
struct Journal {
    inits: u32,
    deltas: Vec<f32>,
    shutdowns: u32,
}

/// Records every hook call and presents each frame.
struct Recorder {
    journal: Rc<RefCell<Journal>>,
    probe: HeadlessProbe,
    escape_on_tick: Option<usize>,
}

impl Lifecycle for Recorder {
    fn on_init(&mut self, _app: &mut Application) {
        self.journal.borrow_mut().inits += 1;
    }

    fn on_tick(&mut self, app: &mut Application, delta_time: f32) {
        let mut journal = self.journal.borrow_mut();
        journal.deltas.push(delta_time);
        if self.escape_on_tick == Some(journal.deltas.len()) {
            self.probe.push_event(SurfaceEvent::Key {
                key: Key::Escape,
                pressed: true,
                modifiers: Modifiers::default(),
            });
        }
        self.probe.advance(0.01);
        app.end_frame();
    }

    fn on_shutdown(&mut self, _app: &mut Application) {
        self.journal.borrow_mut().shutdowns += 1;
    }
}

/// Loads a program and a texture during init, like a real demo.
struct Loader {
    dir: tempfile::TempDir,
    program: Option<Program>,
    texture: Option<Texture>,
    last_delta: Option<f32>,
}

impl Lifecycle for Loader {
    fn on_init(&mut self, app: &mut Application) {
        let shader_dir = format!("{}/shaders/", self.dir.path().display());
        self.program = Some(app.shaders().load_program("basic", &shader_dir).unwrap());
        let texture_path = self.dir.path().join("textures/2x2_red.png");
        self.texture = Some(app.textures().load_texture(texture_path, true).unwrap());
    }

    fn on_tick(&mut self, app: &mut Application, delta_time: f32) {
        self.last_delta = Some(delta_time);
        app.draw_overlay(|ui| ui.text("frame"));
        app.end_frame();
    }

    fn on_shutdown(&mut self, app: &mut Application) {
        app.textures().delete_texture(&mut self.texture);
        app.shaders().delete_program(&mut self.program);
    }
}

fn loader_fixture() -> Loader {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("shaders")).unwrap();
    std::fs::create_dir_all(dir.path().join("textures")).unwrap();
    std::fs::write(dir.path().join("shaders/basic_gl46.vert"), VERT).unwrap();
    std::fs::write(dir.path().join("shaders/basic_gl46.frag"), FRAG).unwrap();
    image::RgbaImage::from_pixel(2, 2, image::Rgba([255, 0, 0, 255]))
        .save(dir.path().join("textures/2x2_red.png"))
        .unwrap();
    Loader {
        dir,
        program: None,
        texture: None,
        last_delta: None,
    }
}

// The only test in this binary that creates an ImGui overlay.
#[test]
fn one_tick_with_forced_delta_presents_once() {
    let (mut app, probe) = headless_app(true, Platform::desktop());
    assert!(app.has_overlay());
    let mut lifecycle = loader_fixture();

    app.start(&mut lifecycle);
    assert!(lifecycle.program.is_some());
    assert!(lifecycle.texture.is_some());
    assert_eq!(app.run_state(), RunState::Running);

    probe.set_time(0.016);
    app.tick(&mut lifecycle);

    assert!((lifecycle.last_delta.unwrap() - 0.016).abs() < 1e-6);
    assert_eq!(probe.swap_count(), 1);
    assert!(!lifecycle.should_quit(&app));
    assert!((app.aspect_ratio() - 800.0 / 600.0).abs() < 1e-6);

    app.shutdown(&mut lifecycle);
    assert_eq!(probe.gpu().live_objects().total(), 0);

    let second = HeadlessSurface::new(800, 600);
    let second_probe = second.probe();
    let err = Application::with_surface(test_config(true), Platform::desktop(), Box::new(second))
        .err()
        .unwrap();
    assert!(matches!(err, InitError::OverlayInUse));
    assert_eq!(second_probe.gpu().live_objects().total(), 0);

    drop(app);
    let (again, _probe) = headless_app(true, Platform::desktop());
    assert!(again.has_overlay());
}

#[test]
fn blocking_run_stops_on_escape_and_shuts_down_once() {
    let (app, probe) = headless_app(false, Platform::desktop());
    let journal = Rc::new(RefCell::new(Journal::default()));
    let recorder = Recorder {
        journal: Rc::clone(&journal),
        probe: probe.clone(),
        escape_on_tick: Some(3),
    };

    assert_eq!(app.run(recorder), RunOutcome::Finished);

    let journal = journal.borrow();
    assert_eq!(journal.inits, 1);
    // The escape queued during tick 3 is handled at the start of tick 4.
    assert_eq!(journal.deltas.len(), 4);
    assert_eq!(journal.shutdowns, 1);
    assert_eq!(probe.swap_count(), 4);
    assert!(probe.should_close());
}

#[test]
fn host_driven_run_returns_immediately_and_never_shuts_down() {
    let host = ManualFrameHost::new();
    let (app, probe) = headless_app(false, Platform::web(Box::new(host.clone())));
    let journal = Rc::new(RefCell::new(Journal::default()));
    let recorder = Recorder {
        journal: Rc::clone(&journal),
        probe: probe.clone(),
        escape_on_tick: Some(2),
    };

    assert_eq!(app.run(recorder), RunOutcome::HandedToHost);
    assert!(host.is_registered());
    assert_eq!(journal.borrow().inits, 1);
    assert!(journal.borrow().deltas.is_empty());

    assert_eq!(host.run_frames(5), 5);
    assert_eq!(journal.borrow().deltas.len(), 5);
    assert_eq!(journal.borrow().shutdowns, 0);
    assert_eq!(probe.swap_count(), 5);
}

struct QuitAfter(u64);

impl Lifecycle for QuitAfter {
    fn on_tick(&mut self, app: &mut Application, _delta_time: f32) {
        app.end_frame();
    }

    fn should_quit(&self, app: &Application) -> bool {
        app.frame_count() >= self.0
    }
}

#[test]
fn should_quit_can_be_overridden() {
    let (app, probe) = headless_app(false, Platform::es3());
    assert_eq!(app.run(QuitAfter(7)), RunOutcome::Finished);
    assert_eq!(probe.swap_count(), 7);
    assert!(!probe.should_close());
}

#[test]
fn request_close_stops_the_default_loop() {
    struct CloseImmediately;
    impl Lifecycle for CloseImmediately {
        fn on_tick(&mut self, app: &mut Application, _delta_time: f32) {
            app.request_close();
        }
    }

    let (app, probe) = headless_app(false, Platform::desktop());
    assert_eq!(app.run(CloseImmediately), RunOutcome::Finished);
    assert!(probe.should_close());
    assert_eq!(probe.swap_count(), 0);
}

#[cfg(feature = "glfw")]
#[test]
fn zero_width_is_rejected_before_any_window_is_opened() {
    let config = WindowConfig {
        width: 0,
        ..test_config(false)
    };
    let err = Application::new(config, Platform::desktop()).err().unwrap();
    assert!(matches!(err, InitError::InvalidConfig(_)));
}

proptest! {
    #[test]
    fn aspect_ratio_is_width_over_height(width in 0_u32..100_000, height in 1_u32..100_000) {
        #[allow(clippy::cast_precision_loss)]
        let expected = width as f32 / height as f32;
        let tolerance = f32::EPSILON * expected.max(1.0);
        prop_assert!((aspect_ratio(width, height) - expected).abs() <= tolerance);
    }

    #[test]
    fn aspect_ratio_is_one_for_zero_height(width in any::<u32>()) {
        prop_assert!((aspect_ratio(width, 0) - 1.0).abs() < f32::EPSILON);
    }
}
