//! Settings file.
//!
//! The binary reads an optional TOML file; every field has a default, so an
//! empty or missing file yields [`Settings::default`].
//!
//! ```toml
//! dialect = "desktop"          # or "es3"
//! log_filter = "glstage=debug"
//! shader_dir = "shaders/"
//! texture_path = "textures/sample.png"
//!
//! [window]
//! title = "glstage"
//! width = 1280
//! height = 720
//! vsync = true
//! ui_overlay = true
//! ```

use std::io;
use std::path::Path;

use serde::Deserialize;

use crate::app::WindowConfig;
use crate::platform::Dialect;

/// Default settings file name, looked up in the working directory.
pub const DEFAULT_PATH: &str = "glstage.toml";

/// Errors reading the settings file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The file is not valid settings TOML.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Everything the binary can be configured with.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Window parameters.
    pub window: WindowConfig,
    /// Context dialect to request.
    pub dialect: Dialect,
    /// `env_logger` filter; `RUST_LOG` applies when unset.
    pub log_filter: Option<String>,
    /// Directory prefix for shader files, including the trailing separator.
    pub shader_dir: String,
    /// Texture shown on the demo cube.
    pub texture_path: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            window: WindowConfig {
                title: "glstage cube".to_owned(),
                width: 1280,
                height: 720,
                vsync: true,
                ui_overlay: true,
            },
            dialect: Dialect::default(),
            log_filter: None,
            shader_dir: "shaders/".to_owned(),
            texture_path: "textures/sample.png".to_owned(),
        }
    }
}

impl Settings {
    /// Parses settings from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed TOML or unknown values.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Loads settings from `path`, or the defaults if the file does not
    /// exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file exists but cannot be read and
    /// [`ConfigError::Parse`] if it is malformed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path.as_ref()) {
            Ok(text) => Self::from_toml(&text),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(ConfigError::Io(e)),
        }
    }
}
