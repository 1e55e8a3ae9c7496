//! UI overlay
//!
//! The engine drives one [`UIOverlay`] per run, around the scene:
//! `initialize` once the window and context exist, `update` and `render`
//! every frame before the scene, `exit` at shutdown. Overlays own whatever
//! GPU resources they draw with and release them in `exit`.
//!
//! - [`NullOverlay`]: draws nothing
//! - [`StatsOverlay`]: frame statistics panel with a button

mod stats;
pub mod widgets;

use thiserror::Error;

use crate::foundation::time::FrameTimer;
use crate::render::{GraphicsApi, RenderError};
use crate::window::{WindowEvent, WindowInfo};

pub use stats::StatsOverlay;
pub use widgets::{Anchor, ButtonState, Rect, UIButton, UIElement, UIPanel, UIRenderCommand, UIText};

/// UI errors
#[derive(Error, Debug)]
pub enum UIError {
    /// The overlay was used before `initialize` or after `exit`
    #[error("UI overlay is not initialized")]
    NotInitialized,

    /// The overlay could not be set up for the window
    #[error("UI overlay setup failed: {0}")]
    Setup(String),

    /// Drawing resources failed
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Immediate-mode overlay drawn on top of the scene
pub trait UIOverlay {
    /// Set up for `window`, creating drawing resources in `api`
    fn initialize(&mut self, window: &WindowInfo, api: &mut dyn GraphicsApi) -> Result<(), UIError>;

    /// Rebuild the frame's widgets
    fn update(&mut self, timer: &FrameTimer);

    /// Submit the frame's widgets
    fn render(&mut self, api: &mut dyn GraphicsApi) -> Result<(), UIError>;

    /// Window framebuffer changed size
    fn resize(&mut self, _width: u32, _height: u32) {}

    /// Window input, seen before the engine reacts to it
    fn handle_event(&mut self, _event: &WindowEvent) {}

    /// Tear down and release drawing resources
    fn exit(&mut self, api: &mut dyn GraphicsApi);
}

/// Overlay that draws nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NullOverlay;

impl UIOverlay for NullOverlay {
    fn initialize(&mut self, _window: &WindowInfo, _api: &mut dyn GraphicsApi) -> Result<(), UIError> {
        Ok(())
    }

    fn update(&mut self, _timer: &FrameTimer) {}

    fn render(&mut self, _api: &mut dyn GraphicsApi) -> Result<(), UIError> {
        Ok(())
    }

    fn exit(&mut self, _api: &mut dyn GraphicsApi) {}
}
