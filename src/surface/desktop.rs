//! [`Surface`] on a GLFW window.

use glfw::{Action, Context as _, OpenGlProfileHint, SwapInterval, WindowEvent, WindowHint};

use super::{Key, Modifiers, MouseButton, Surface, SurfaceEvent};
use crate::app::WindowConfig;
use crate::error::InitError;
use crate::gpu::{GlowBackend, GpuBackend};
use crate::platform::Dialect;

/// A GLFW window whose OpenGL (ES) context stays current on the creating
/// thread.
pub struct GlfwSurface {
    // Dropped first: the backend must go before the context it wraps.
    gl: GlowBackend,
    events: glfw::GlfwReceiver<(f64, WindowEvent)>,
    window: glfw::PWindow,
    glfw: glfw::Glfw,
}

impl GlfwSurface {
    /// Opens a window for `config` with a context of the given dialect and
    /// makes it current.
    ///
    /// # Errors
    ///
    /// Returns [`InitError::Windowing`] if GLFW cannot start,
    /// [`InitError::WindowCreation`] if the window or context cannot be
    /// created, and [`InitError::Context`] if no GL functions could be
    /// loaded.
    pub fn open(config: &WindowConfig, dialect: Dialect) -> Result<Self, InitError> {
        let mut glfw =
            glfw::init(glfw::log_errors).map_err(|e| InitError::Windowing(e.to_string()))?;

        let (major, minor) = dialect.context_version();
        glfw.window_hint(WindowHint::ContextVersion(major, minor));
        match dialect {
            Dialect::Desktop => {
                glfw.window_hint(WindowHint::OpenGlProfile(OpenGlProfileHint::Core));
                glfw.window_hint(WindowHint::OpenGlForwardCompat(true));
            }
            Dialect::Es3 => {
                glfw.window_hint(WindowHint::ClientApi(glfw::ClientApiHint::OpenGlEs));
            }
        }

        let (mut window, events) = glfw
            .create_window(
                config.width,
                config.height,
                &config.title,
                glfw::WindowMode::Windowed,
            )
            .ok_or_else(|| InitError::WindowCreation {
                title: config.title.clone(),
                width: config.width,
                height: config.height,
            })?;

        window.make_current();
        window.set_framebuffer_size_polling(true);
        window.set_key_polling(true);
        window.set_cursor_pos_polling(true);
        window.set_mouse_button_polling(true);
        window.set_scroll_polling(true);
        window.set_char_polling(true);
        window.set_close_polling(true);

        // SAFETY: the window's context was made current above, and the
        // backend is dropped before the window (field order).
        let gl = unsafe {
            let context = glow::Context::from_loader_function(|name| {
                window.get_proc_address(name) as *const _
            });
            GlowBackend::new(context)
        };
        let (version, _) = gl.version_strings();
        if version.is_empty() {
            return Err(InitError::Context(
                "driver reported no GL_VERSION after loading".to_owned(),
            ));
        }

        Ok(Self {
            gl,
            events,
            window,
            glfw,
        })
    }
}

fn translate(event: WindowEvent) -> Option<SurfaceEvent> {
    let pressed = |action: Action| action != Action::Release;
    Some(match event {
        WindowEvent::FramebufferSize(w, h) => SurfaceEvent::FramebufferResized {
            width: u32::try_from(w).unwrap_or(0),
            height: u32::try_from(h).unwrap_or(0),
        },
        WindowEvent::Key(key, _, action, mods) => {
            let key = translate_key(key);
            SurfaceEvent::Key {
                key,
                pressed: pressed(action),
                modifiers: modifiers(mods, key, pressed(action)),
            }
        }
        WindowEvent::CursorPos(x, y) => SurfaceEvent::CursorMoved { x, y },
        WindowEvent::MouseButton(button, action, _) => SurfaceEvent::MouseButton {
            button: match button as i32 {
                0 => MouseButton::Left,
                1 => MouseButton::Right,
                2 => MouseButton::Middle,
                n => MouseButton::Extra(u8::try_from(n - 3).unwrap_or(u8::MAX)),
            },
            pressed: pressed(action),
        },
        WindowEvent::Scroll(x, y) => SurfaceEvent::Scroll { x, y },
        WindowEvent::Char(c) => SurfaceEvent::Text(c),
        WindowEvent::Close => SurfaceEvent::CloseRequested,
        _ => return None,
    })
}

fn size_pair((w, h): (i32, i32)) -> (u32, u32) {
    (u32::try_from(w).unwrap_or(0), u32::try_from(h).unwrap_or(0))
}

impl Surface for GlfwSurface {
    fn gpu(&self) -> &dyn GpuBackend {
        &self.gl
    }

    fn framebuffer_size(&self) -> (u32, u32) {
        size_pair(self.window.get_framebuffer_size())
    }

    fn window_size(&self) -> (u32, u32) {
        size_pair(self.window.get_size())
    }

    fn time(&self) -> f64 {
        self.glfw.get_time()
    }

    fn set_vsync(&mut self, enabled: bool) {
        let interval = if enabled {
            SwapInterval::Sync(1)
        } else {
            SwapInterval::None
        };
        self.glfw.set_swap_interval(interval);
    }

    fn poll_events(&mut self) -> Vec<SurfaceEvent> {
        self.glfw.poll_events();
        glfw::flush_messages(&self.events)
            .filter_map(|(_, event)| translate(event))
            .collect()
    }

    fn swap_buffers(&mut self) {
        self.window.swap_buffers();
    }

    fn should_close(&self) -> bool {
        self.window.should_close()
    }

    fn set_should_close(&mut self, value: bool) {
        self.window.set_should_close(value);
    }
}

fn translate_key(key: glfw::Key) -> Key {
    use glfw::Key as G;
    match key {
        G::Escape => Key::Escape,
        G::Tab => Key::Tab,
        G::Left => Key::Left,
        G::Right => Key::Right,
        G::Up => Key::Up,
        G::Down => Key::Down,
        G::PageUp => Key::PageUp,
        G::PageDown => Key::PageDown,
        G::Home => Key::Home,
        G::End => Key::End,
        G::Insert => Key::Insert,
        G::Delete => Key::Delete,
        G::Backspace => Key::Backspace,
        G::Space => Key::Space,
        G::Enter => Key::Enter,
        G::KpEnter => Key::KeypadEnter,
        G::LeftControl => Key::LeftControl,
        G::RightControl => Key::RightControl,
        G::LeftShift => Key::LeftShift,
        G::RightShift => Key::RightShift,
        G::LeftAlt => Key::LeftAlt,
        G::RightAlt => Key::RightAlt,
        G::LeftSuper => Key::LeftSuper,
        G::RightSuper => Key::RightSuper,
        other => {
            let code = other as i32;
            match u8::try_from(code) {
                Ok(c @ b'A'..=b'Z') => Key::Letter(char::from(c)),
                _ => Key::Other(code),
            }
        }
    }
}

/// GLFW reports the modifier state from before the event on some platforms,
/// so a modifier key's own press or release is folded in here.
fn modifiers(mods: glfw::Modifiers, key: Key, pressed: bool) -> Modifiers {
    let held = |flag: glfw::Modifiers, left: Key, right: Key| {
        if key == left || key == right {
            pressed
        } else {
            mods.contains(flag)
        }
    };
    Modifiers {
        ctrl: held(glfw::Modifiers::Control, Key::LeftControl, Key::RightControl),
        shift: held(glfw::Modifiers::Shift, Key::LeftShift, Key::RightShift),
        alt: held(glfw::Modifiers::Alt, Key::LeftAlt, Key::RightAlt),
        super_key: held(glfw::Modifiers::Super, Key::LeftSuper, Key::RightSuper),
    }
}
