//! Windowing and input
//!
//! The engine talks to the window system through two traits: a [`Platform`]
//! creates the window and its graphics context, a [`WindowBackend`] is the
//! created window. Input arrives as a per-frame list of [`WindowEvent`]s.

mod headless;

#[cfg(feature = "glfw-window")]
mod glfw_window;

use std::any::Any;

use thiserror::Error;

use crate::core::WindowConfig;
use crate::render::GraphicsApi;

pub use headless::{HeadlessPlatform, HeadlessWindow};

#[cfg(feature = "glfw-window")]
pub use glfw_window::{GlfwPlatform, GlfwWindow};

/// Window management errors
#[derive(Error, Debug)]
pub enum WindowError {
    /// The window system could not be initialized
    #[error("Window system initialization failed: {0}")]
    InitializationFailed(String),

    /// The window could not be created
    #[error("Window creation failed: {0}")]
    CreationFailed(String),

    /// The graphics context could not be created or made current
    #[error("Graphics context creation failed: {0}")]
    ContextCreationFailed(String),
}

/// Result type for window operations
pub type WindowResult<T> = Result<T, WindowError>;

/// Keys the engine reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// Escape
    Escape,
    /// R
    R,
    /// Space bar
    Space,
    /// Any other key
    Other,
}

/// Key transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAction {
    /// Key went down
    Press,
    /// Key went up
    Release,
    /// Key held long enough to auto-repeat
    Repeat,
}

/// Input and window-state events for one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowEvent {
    /// Keyboard input
    Key {
        /// Key involved
        key: Key,
        /// What happened to it
        action: KeyAction,
    },
    /// The drawable area changed size
    FramebufferResized {
        /// New width in pixels
        width: u32,
        /// New height in pixels
        height: u32,
    },
    /// The user asked to close the window
    CloseRequested,
}

impl WindowEvent {
    /// Shorthand for a key press event
    pub fn key_press(key: Key) -> Self {
        Self::Key {
            key,
            action: KeyAction::Press,
        }
    }
}

/// Window facts handed to the UI overlay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowInfo {
    /// Window title
    pub title: String,
    /// Framebuffer width in pixels
    pub width: u32,
    /// Framebuffer height in pixels
    pub height: u32,
}

/// A created window
pub trait WindowBackend {
    /// Drain the events that arrived since the last call
    fn poll_events(&mut self) -> Vec<WindowEvent>;

    /// Present the frame that was just rendered
    fn swap_buffers(&mut self);

    /// Whether closing has been requested
    fn should_close(&self) -> bool;

    /// Request or cancel closing
    fn set_should_close(&mut self, should_close: bool);

    /// Drawable area in pixels
    fn framebuffer_size(&self) -> (u32, u32);

    /// Window title
    fn title(&self) -> &str;

    /// Snapshot for the UI overlay
    fn info(&self) -> WindowInfo {
        let (width, height) = self.framebuffer_size();
        WindowInfo {
            title: self.title().to_string(),
            width,
            height,
        }
    }

    /// Downcast to the concrete window type
    fn as_any(&self) -> &dyn Any;

    /// Downcast to the concrete window type mutably
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Creates windows and their graphics contexts
pub trait Platform {
    /// Open a window described by `config`
    fn create_window(&mut self, config: &WindowConfig) -> WindowResult<Box<dyn WindowBackend>>;

    /// Create the graphics context for `window`
    fn create_context(&mut self, window: &mut dyn WindowBackend) -> WindowResult<Box<dyn GraphicsApi>>;
}
