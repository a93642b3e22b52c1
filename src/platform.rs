//! Runtime platform capabilities.
//!
//! A [`Platform`] is built once at startup and passed explicitly to the
//! [`Application`](crate::Application) and, through it, to the
//! [`ShaderManager`](crate::ShaderManager). It decides three things: which
//! GLSL dialect to request, which shader-file suffix to look for, and who
//! drives the frame loop.

use std::fmt;

use serde::Deserialize;

/// Shading-language dialect of the graphics context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// OpenGL 4.6 core profile.
    #[default]
    Desktop,
    /// OpenGL ES 3.0 (the WebGL 2 feature level).
    Es3,
}

impl Dialect {
    /// `#version` line matching this dialect.
    #[must_use]
    pub fn glsl_version(self) -> &'static str {
        match self {
            Self::Desktop => "#version 460 core",
            Self::Es3 => "#version 300 es",
        }
    }

    /// Token inserted between a shader's base name and its extension.
    #[must_use]
    pub fn shader_suffix(self) -> &'static str {
        match self {
            Self::Desktop => "_gl46",
            Self::Es3 => "_es3",
        }
    }

    /// Context version `(major, minor)` requested from the windowing layer.
    #[must_use]
    pub fn context_version(self) -> (u32, u32) {
        match self {
            Self::Desktop => (4, 6),
            Self::Es3 => (3, 0),
        }
    }
}

/// A host environment that schedules frames on its own (e.g. a browser's
/// animation-frame callback).
pub trait FrameHost {
    /// Registers `frame` to be invoked once per host-scheduled frame.
    ///
    /// Implementations must return without calling `frame` re-entrantly.
    fn set_main_loop(&mut self, frame: Box<dyn FnMut()>);
}

/// Who owns the frame loop.
pub enum LoopDriver {
    /// [`Application::run`](crate::Application::run) blocks and ticks until
    /// the application asks to quit.
    Blocking,
    /// `run` registers a per-frame callback with the host and returns.
    Host(Box<dyn FrameHost>),
}

impl fmt::Debug for LoopDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blocking => f.write_str("Blocking"),
            Self::Host(_) => f.write_str("Host(..)"),
        }
    }
}

/// Capabilities chosen for the running process.
#[derive(Debug)]
pub struct Platform {
    dialect: Dialect,
    loop_driver: LoopDriver,
}

impl Platform {
    /// Desktop OpenGL 4.6 core with a blocking loop.
    #[must_use]
    pub fn desktop() -> Self {
        Self::new(Dialect::Desktop, LoopDriver::Blocking)
    }

    /// OpenGL ES 3.0 with a blocking loop (ES shaders on a desktop window).
    #[must_use]
    pub fn es3() -> Self {
        Self::new(Dialect::Es3, LoopDriver::Blocking)
    }

    /// OpenGL ES 3.0 with frames scheduled by `host`.
    #[must_use]
    pub fn web(host: Box<dyn FrameHost>) -> Self {
        Self::new(Dialect::Es3, LoopDriver::Host(host))
    }

    /// Arbitrary combination of dialect and loop driver.
    #[must_use]
    pub fn new(dialect: Dialect, loop_driver: LoopDriver) -> Self {
        Self {
            dialect,
            loop_driver,
        }
    }

    /// Context dialect.
    #[must_use]
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Shader file suffix (`_gl46` or `_es3`).
    #[must_use]
    pub fn shader_suffix(&self) -> &'static str {
        self.dialect.shader_suffix()
    }

    /// GLSL `#version` directive.
    #[must_use]
    pub fn glsl_version(&self) -> &'static str {
        self.dialect.glsl_version()
    }

    /// Whether the frame loop is owned by an external host.
    #[must_use]
    pub fn is_host_driven(&self) -> bool {
        matches!(self.loop_driver, LoopDriver::Host(_))
    }

    /// Moves the loop driver out, leaving [`LoopDriver::Blocking`].
    pub(crate) fn take_loop_driver(&mut self) -> LoopDriver {
        std::mem::replace(&mut self.loop_driver, LoopDriver::Blocking)
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::desktop()
    }
}
