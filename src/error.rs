//! Error types.
//!
//! Loader operations ([`ShaderManager`](crate::ShaderManager),
//! [`TextureLoader`](crate::TextureLoader)) return [`Result`], whose error is
//! a [`LoadError`]: the caller decides whether a missing asset is worth
//! aborting for. Bootstrapping the window and context uses [`InitError`]
//! instead, because nothing else can work without them.

use thiserror::Error;

/// Alias used by every fallible loader operation.
pub type Result<T> = std::result::Result<T, LoadError>;

/// A recoverable failure while loading a GPU resource.
///
/// Every variant can be read as a `message` (what failed) plus a `context`
/// (the path, stage log or OS diagnostic that explains it); see
/// [`message`](Self::message) and [`context`](Self::context).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// A shader source file could not be read.
    #[error("failed to open shader file: {path} ({reason})")]
    FileRead {
        /// Path that was opened.
        path: String,
        /// OS-level diagnostic.
        reason: String,
    },

    /// A shader stage failed to compile.
    #[error("{stage} shader compilation failed: {log}")]
    ShaderCompile {
        /// `"vertex"` or `"fragment"`.
        stage: &'static str,
        /// Compiler info log.
        log: String,
    },

    /// The vertex and fragment stages failed to link.
    #[error("shader program linking failed: {log}")]
    ShaderLink {
        /// Linker info log.
        log: String,
    },

    /// An image file could not be decoded.
    #[error("failed to load texture: {path} ({reason})")]
    ImageDecode {
        /// Path (or label, for in-memory images) that was decoded.
        path: String,
        /// Decoder diagnostic.
        reason: String,
    },

    /// The backend refused to allocate an object name.
    #[error("failed to create {object}: {reason}")]
    ResourceCreation {
        /// Kind of object, e.g. `"texture"`.
        object: &'static str,
        /// Backend diagnostic.
        reason: String,
    },
}

impl LoadError {
    /// Short human-readable description of what failed.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::FileRead { .. } => "Failed to open shader file".to_owned(),
            Self::ShaderCompile { stage, .. } => format!("{stage} shader compilation failed"),
            Self::ShaderLink { .. } => "Shader program linking failed".to_owned(),
            Self::ImageDecode { .. } => "Failed to load texture".to_owned(),
            Self::ResourceCreation { object, .. } => format!("Failed to create {object}"),
        }
    }

    /// Supporting detail: path plus diagnostic, or the GL info log.
    #[must_use]
    pub fn context(&self) -> String {
        match self {
            Self::FileRead { path, reason } | Self::ImageDecode { path, reason } => {
                format!("{path} ({reason})")
            }
            Self::ShaderCompile { log, .. } | Self::ShaderLink { log } => log.clone(),
            Self::ResourceCreation { reason, .. } => reason.clone(),
        }
    }
}

/// A fatal failure while bootstrapping the window, context or UI overlay.
///
/// No [`Application`](crate::Application) exists when this is returned; any
/// partially created state has already been released.
#[derive(Debug, Error)]
pub enum InitError {
    /// The windowing library could not be initialized.
    #[error("failed to initialize GLFW: {0}")]
    Windowing(String),

    /// The window (and its context) could not be created.
    #[error("failed to create window \"{title}\" ({width}x{height})")]
    WindowCreation {
        /// Requested title.
        title: String,
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },

    /// The window configuration is unusable.
    #[error("invalid window configuration: {0}")]
    InvalidConfig(String),

    /// The OpenGL function loader did not produce a usable context.
    #[error("failed to load OpenGL functions: {0}")]
    Context(String),

    /// The immediate-mode UI overlay could not be set up.
    #[error("failed to initialize UI overlay: {0}")]
    Overlay(#[source] LoadError),

    /// Another Dear ImGui context is active in this process; only one may
    /// exist at a time.
    #[error("failed to initialize UI overlay: another UI context is already active")]
    OverlayInUse,
}
