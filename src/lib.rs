//! Application lifecycle and GPU resource loading for small OpenGL and
//! OpenGL ES demos, built on [glow] and [glfw].
//!
//! The crate provides an [`Application`] that owns a window, its graphics
//! context and the frame loop, and drives a user [`Lifecycle`] through
//! init, tick and shutdown hooks. Whether the loop blocks (desktop) or is
//! handed to a host scheduler (web) is decided at runtime by the
//! [`Platform`] value, which also selects the shader dialect.
//!
//! Resources are loaded through [`ShaderManager`] and [`TextureLoader`],
//! which return owning handles ([`Program`], [`Texture`]) or a typed
//! [`LoadError`]. A failed load never leaves GPU objects behind.
//!
//! # Features
//!
//! - **Two dialects**: desktop GL 4.6 core (`*_gl46` shaders) and GL ES 3.0
//!   (`*_es3` shaders).
//! - **Dear ImGui overlay** drawn through the same backend as the scene.
//! - **Headless backend** ([`headless`]) for testing loaders and lifecycles
//!   without a display.
//!
//! # Safety
//!
//! GL calls are only issued while the owning [`Surface`]'s context is
//! current on the calling thread. `GlfwSurface` makes its context current
//! on creation and keeps it so; an [`Application`] must stay on the thread
//! that created it.
//!
//! [glow]: https://docs.rs/glow
//! [glfw]: https://docs.rs/glfw

pub mod app;
pub mod config;
mod error;
pub mod gpu;
pub mod headless;
pub mod logging;
pub mod overlay;
pub mod platform;
mod shader;
pub mod surface;
mod texture;

pub use app::{aspect_ratio, Application, Lifecycle, RunOutcome, RunState, WindowConfig};
pub use error::{InitError, LoadError, Result};
pub use gpu::{Buffer, GpuBackend, GpuHandle, Program, Texture, UniformLocation, VertexArray};
pub use overlay::UiOverlay;
pub use platform::{Dialect, FrameHost, LoopDriver, Platform};
pub use shader::ShaderManager;
#[cfg(feature = "glfw")]
pub use surface::GlfwSurface;
pub use surface::{Surface, SurfaceEvent};
pub use texture::TextureLoader;

/// Re-exported so overlay callbacks can name [`imgui::Ui`] without a direct
/// dependency.
pub use imgui;
