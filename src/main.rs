//! `glstage-cube`: a rotating textured cube with a Dear ImGui control panel.
//!
//! Usage: `glstage-cube [settings.toml]` (defaults to `glstage.toml` in the
//! working directory; a missing file means default settings).

mod demo;

use std::process::ExitCode;

use glstage::config::{self, Settings};
use glstage::logging::{init_logging, LoggingConfig};
use glstage::{Application, LoopDriver, Platform};

use demo::CubeDemo;

fn main() -> ExitCode {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| config::DEFAULT_PATH.to_owned());

    let settings = match Settings::load(&path) {
        Ok(settings) => settings,
        Err(e) => {
            init_logging(LoggingConfig::default());
            log::error!("Failed to read settings from {path}: {e}");
            return ExitCode::FAILURE;
        }
    };

    init_logging(LoggingConfig {
        env_filter: settings.log_filter.clone(),
        ..LoggingConfig::default()
    });

    let platform = Platform::new(settings.dialect, LoopDriver::Blocking);
    let app = match Application::new(settings.window, platform) {
        Ok(app) => app,
        Err(e) => {
            log::error!("Initialization failed: {e}");
            return ExitCode::FAILURE;
        }
    };

    app.run(CubeDemo::new(settings.shader_dir, settings.texture_path));
    ExitCode::SUCCESS
}
