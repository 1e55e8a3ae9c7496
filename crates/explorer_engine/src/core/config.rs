//! # Unified Configuration System
//!
//! All configuration structures for the engine live here. Every section is
//! serializable (TOML or RON through [`Config`]) and every field has a
//! default, so partial files are accepted.
//!
//! ## Configuration Categories
//!
//! - **Window Config**: title and initial size of the window
//! - **Shader Config**: locations of the GLSL sources for the engine program
//! - **Engine Config**: logging, clear color and frame statistics

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use crate::config::{Config, ConfigError};

/// # Window Configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Window title
    pub title: String,
    /// Window width in screen coordinates
    pub width: u32,
    /// Window height in screen coordinates
    pub height: u32,
    /// Whether the user may resize the window
    pub resizable: bool,
}

impl WindowConfig {
    /// Create a window configuration
    pub fn new(title: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            title: title.into(),
            width,
            height,
            resizable: true,
        }
    }

    /// Set whether the window is resizable
    pub fn with_resizable(mut self, resizable: bool) -> Self {
        self.resizable = resizable;
        self
    }

    /// Validate the window configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "window size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self::new("OpenGL Explorer", 640, 480)
    }
}

/// # Shader Configuration
///
/// Paths of the plain-text GLSL sources for the engine program. Sources are
/// read in full at startup and again on every reload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShaderConfig {
    /// Path to the vertex shader source
    pub vertex_shader_path: PathBuf,
    /// Path to the fragment shader source
    pub fragment_shader_path: PathBuf,
}

impl ShaderConfig {
    /// Create a new shader configuration
    pub fn new(vertex_path: impl Into<PathBuf>, fragment_path: impl Into<PathBuf>) -> Self {
        Self {
            vertex_shader_path: vertex_path.into(),
            fragment_shader_path: fragment_path.into(),
        }
    }

    /// Create shader config with automatic path resolution
    ///
    /// Tries a few common locations so the binary can be run from the
    /// workspace root or from its own crate directory.
    pub fn with_path_resolution(base_vertex: &str, base_fragment: &str) -> Self {
        let shader_dirs = ["resources/shaders", "../resources/shaders", "shaders", "."];

        let find = |file: &str| {
            shader_dirs
                .iter()
                .map(|dir| Path::new(dir).join(file))
                .find(|candidate| candidate.exists())
                .unwrap_or_else(|| Path::new("resources/shaders").join(file))
        };

        Self::new(find(base_vertex), find(base_fragment))
    }
}

impl Default for ShaderConfig {
    fn default() -> Self {
        Self::with_path_resolution("vertex_shader.glsl", "fragment_shader.glsl")
    }
}

/// # Engine Configuration
///
/// Core engine behavior configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Log filter for the engine (`env_logger` syntax)
    pub log_level: String,
    /// Framebuffer clear color (RGBA)
    pub clear_color: [f32; 4],
    /// How often per second the FPS figure is resampled
    pub fps_sample_rate: f64,
}

impl EngineConfig {
    /// Create a new engine configuration
    pub fn new() -> Self {
        Self {
            log_level: "info".to_string(),
            clear_color: [0.5, 0.5, 0.5, 1.0],
            fps_sample_rate: crate::foundation::time::DEFAULT_SAMPLE_RATE,
        }
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Set the clear color
    pub fn with_clear_color(mut self, color: [f32; 4]) -> Self {
        self.clear_color = color;
        self
    }

    /// Validate the engine configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fps_sample_rate <= 0.0 {
            return Err(ConfigError::Invalid("fps_sample_rate must be positive".to_string()));
        }
        if self.clear_color.iter().any(|c| !(0.0..=1.0).contains(c)) {
            return Err(ConfigError::Invalid(format!(
                "clear_color components must be in [0, 1], got {:?}",
                self.clear_color
            )));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Complete Application Configuration
///
/// Top-level configuration that encompasses all engine subsystems.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Engine core configuration
    pub engine: EngineConfig,
    /// Window configuration
    pub window: WindowConfig,
    /// Engine shader program sources
    pub shaders: ShaderConfig,
}

impl ApplicationConfig {
    /// Create a configuration with defaults and the given window title
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            window: WindowConfig {
                title: title.into(),
                ..WindowConfig::default()
            },
            ..Self::default()
        }
    }

    /// Replace the window configuration
    pub fn with_window(mut self, window: WindowConfig) -> Self {
        self.window = window;
        self
    }

    /// Replace the shader configuration
    pub fn with_shaders(mut self, shaders: ShaderConfig) -> Self {
        self.shaders = shaders;
        self
    }

    /// Validate the entire configuration
    ///
    /// Shader file existence is not checked here; that is reported when the
    /// sources are loaded so a missing file reads as a shader error.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine.validate()?;
        self.window.validate()?;
        Ok(())
    }
}

impl Config for ApplicationConfig {}
