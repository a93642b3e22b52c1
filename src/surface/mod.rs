//! Window and context providers.
//!
//! The [`Application`](crate::Application) never talks to a windowing
//! library directly. It owns a boxed [`Surface`], which hands out the GPU
//! backend for its context, a monotonic clock and a queue of input events.
//! [`GlfwSurface`] is the real implementation; the
//! [`headless`](crate::headless) module provides one without a display.

#[cfg(feature = "glfw")]
mod desktop;

#[cfg(feature = "glfw")]
pub use desktop::GlfwSurface;

use crate::gpu::GpuBackend;

/// Keys the core and the UI overlay react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)] // Self-describing
pub enum Key {
    /// Requests that the application close.
    Escape,
    Tab,
    Left,
    Right,
    Up,
    Down,
    PageUp,
    PageDown,
    Home,
    End,
    Insert,
    Delete,
    Backspace,
    Space,
    Enter,
    KeypadEnter,
    LeftControl,
    RightControl,
    LeftShift,
    RightShift,
    LeftAlt,
    RightAlt,
    LeftSuper,
    RightSuper,
    /// A letter key, as an uppercase ASCII character.
    Letter(char),
    /// Any other key, by platform key code.
    Other(i32),
}

/// Modifier keys held down, including the key of the event that carries
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[expect(clippy::struct_excessive_bools)]
pub struct Modifiers {
    /// Either Control key.
    pub ctrl: bool,
    /// Either Shift key.
    pub shift: bool,
    /// Either Alt key.
    pub alt: bool,
    /// Either Super (Windows, Command) key.
    pub super_key: bool,
}

/// Mouse buttons, numbered the way the UI overlay expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    /// Primary button.
    Left,
    /// Secondary button.
    Right,
    /// Wheel button.
    Middle,
    /// Extra buttons, zero-based after `Middle`.
    Extra(u8),
}

impl MouseButton {
    /// Zero-based index (`Left` = 0, `Right` = 1, `Middle` = 2, ...).
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::Left => 0,
            Self::Right => 1,
            Self::Middle => 2,
            Self::Extra(n) => 3 + usize::from(n),
        }
    }
}

/// Input and window events, already translated from the windowing library.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SurfaceEvent {
    /// Drawable size changed, in pixels.
    FramebufferResized {
        /// New width.
        width: u32,
        /// New height.
        height: u32,
    },
    /// A key was pressed or released.
    Key {
        /// Which key.
        key: Key,
        /// `true` on press or repeat.
        pressed: bool,
        /// Modifier state after this event.
        modifiers: Modifiers,
    },
    /// Cursor moved, in window coordinates.
    CursorMoved {
        /// Horizontal position.
        x: f64,
        /// Vertical position, top is 0.
        y: f64,
    },
    /// A mouse button changed state.
    MouseButton {
        /// Which button.
        button: MouseButton,
        /// `true` on press.
        pressed: bool,
    },
    /// Wheel or trackpad scroll.
    Scroll {
        /// Horizontal offset.
        x: f64,
        /// Vertical offset.
        y: f64,
    },
    /// A character was typed.
    Text(char),
    /// The user asked the window to close.
    CloseRequested,
}

/// A window with a current graphics context.
pub trait Surface {
    /// Backend for this surface's context.
    fn gpu(&self) -> &dyn GpuBackend;

    /// Drawable size in pixels.
    fn framebuffer_size(&self) -> (u32, u32);

    /// Window size in screen coordinates. Differs from
    /// [`framebuffer_size`](Self::framebuffer_size) on high-DPI displays.
    fn window_size(&self) -> (u32, u32);

    /// Monotonic seconds since the surface was created.
    fn time(&self) -> f64;

    /// Enables or disables waiting for vertical blank on swap.
    fn set_vsync(&mut self, enabled: bool);

    /// Drains the events received since the last call.
    fn poll_events(&mut self) -> Vec<SurfaceEvent>;

    /// Presents the back buffer.
    fn swap_buffers(&mut self);

    /// Whether closing has been requested.
    fn should_close(&self) -> bool;

    /// Sets or clears the close request.
    fn set_should_close(&mut self, value: bool);
}
