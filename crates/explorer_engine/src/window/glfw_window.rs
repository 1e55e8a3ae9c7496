//! Desktop window using GLFW
//!
//! Opens a window with an OpenGL 4.1 core context, made current on the
//! calling thread, and loads a [`GlApi`] against it. GLFW errors are logged,
//! not fatal.

use std::any::Any;

use glfw::Context;

use crate::core::WindowConfig;
use crate::render::{GlApi, GraphicsApi};
use crate::window::{Key, KeyAction, Platform, WindowBackend, WindowError, WindowEvent, WindowResult};

/// Platform backed by the GLFW library
#[derive(Debug, Default)]
pub struct GlfwPlatform;

impl GlfwPlatform {
    /// Create the platform; GLFW itself is initialized with the first window
    pub fn new() -> Self {
        Self
    }
}

impl Platform for GlfwPlatform {
    fn create_window(&mut self, config: &WindowConfig) -> WindowResult<Box<dyn WindowBackend>> {
        let mut glfw = glfw::init(glfw::log_errors)
            .map_err(|e| WindowError::InitializationFailed(format!("{e:?}")))?;

        glfw.window_hint(glfw::WindowHint::ContextVersion(4, 1));
        glfw.window_hint(glfw::WindowHint::OpenGlProfile(glfw::OpenGlProfileHint::Core));
        glfw.window_hint(glfw::WindowHint::OpenGlForwardCompat(true));
        glfw.window_hint(glfw::WindowHint::Resizable(config.resizable));

        let (mut window, events) = glfw
            .create_window(config.width, config.height, &config.title, glfw::WindowMode::Windowed)
            .ok_or_else(|| WindowError::CreationFailed(config.title.clone()))?;

        window.set_key_polling(true);
        window.set_close_polling(true);
        window.set_framebuffer_size_polling(true);
        window.make_current();
        glfw.set_swap_interval(glfw::SwapInterval::Sync(1));

        log::info!("Created GLFW window '{}' ({}x{})", config.title, config.width, config.height);
        Ok(Box::new(GlfwWindow {
            glfw,
            window,
            events,
            title: config.title.clone(),
        }))
    }

    fn create_context(&mut self, window: &mut dyn WindowBackend) -> WindowResult<Box<dyn GraphicsApi>> {
        let window = window
            .as_any_mut()
            .downcast_mut::<GlfwWindow>()
            .ok_or_else(|| WindowError::ContextCreationFailed("not a GLFW window".to_string()))?;
        if !window.window.is_current() {
            return Err(WindowError::ContextCreationFailed("context is not current".to_string()));
        }
        // The context was made current at creation and lives as long as the window,
        // which the engine drops after the graphics context.
        let api = unsafe { GlApi::from_loader(|symbol| window.window.get_proc_address(symbol) as *const _) };
        Ok(Box::new(api))
    }
}

/// GLFW window with a current OpenGL context
pub struct GlfwWindow {
    glfw: glfw::Glfw,
    window: glfw::PWindow,
    events: glfw::GlfwReceiver<(f64, glfw::WindowEvent)>,
    title: String,
}

fn translate_key(key: glfw::Key) -> Key {
    match key {
        glfw::Key::Escape => Key::Escape,
        glfw::Key::R => Key::R,
        glfw::Key::Space => Key::Space,
        _ => Key::Other,
    }
}

fn translate_action(action: glfw::Action) -> KeyAction {
    match action {
        glfw::Action::Press => KeyAction::Press,
        glfw::Action::Release => KeyAction::Release,
        glfw::Action::Repeat => KeyAction::Repeat,
    }
}

impl WindowBackend for GlfwWindow {
    fn poll_events(&mut self) -> Vec<WindowEvent> {
        self.glfw.poll_events();
        glfw::flush_messages(&self.events)
            .filter_map(|(_, event)| match event {
                glfw::WindowEvent::Key(key, _, action, _) => Some(WindowEvent::Key {
                    key: translate_key(key),
                    action: translate_action(action),
                }),
                glfw::WindowEvent::FramebufferSize(width, height) => Some(WindowEvent::FramebufferResized {
                    width: width.max(0) as u32,
                    height: height.max(0) as u32,
                }),
                glfw::WindowEvent::Close => Some(WindowEvent::CloseRequested),
                _ => None,
            })
            .collect()
    }

    fn swap_buffers(&mut self) {
        self.window.swap_buffers();
    }

    fn should_close(&self) -> bool {
        self.window.should_close()
    }

    fn set_should_close(&mut self, should_close: bool) {
        self.window.set_should_close(should_close);
    }

    fn framebuffer_size(&self) -> (u32, u32) {
        let (width, height) = self.window.get_framebuffer_size();
        (width.max(0) as u32, height.max(0) as u32)
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::HeadlessPlatform;

    #[test]
    fn test_context_requires_glfw_window() {
        let mut headless = HeadlessPlatform::new();
        let mut window = headless.create_window(&WindowConfig::default()).unwrap();

        let result = GlfwPlatform::new().create_context(window.as_mut());
        assert!(matches!(result, Err(WindowError::ContextCreationFailed(_))));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_missing_display_is_an_error() {
        if std::env::var_os("DISPLAY").is_some() || std::env::var_os("WAYLAND_DISPLAY").is_some() {
            return;
        }
        // The error callback only logs, so init failure comes back as a value.
        let result = GlfwPlatform::new().create_window(&WindowConfig::default());
        assert!(matches!(result, Err(WindowError::InitializationFailed(_))));
    }
}
