//! Window-less platform
//!
//! Replays scripted input, one batch per frame, and optionally closes itself
//! after a fixed number of presented frames. The graphics context is a
//! [`HeadlessApi`].

use std::any::Any;
use std::collections::VecDeque;

use crate::core::WindowConfig;
use crate::render::{GraphicsApi, HeadlessApi};
use crate::window::{Platform, WindowBackend, WindowError, WindowEvent, WindowResult};

/// Platform producing [`HeadlessWindow`]s
#[derive(Debug, Default)]
pub struct HeadlessPlatform {
    script: Vec<Vec<WindowEvent>>,
    frame_limit: Option<u64>,
    fail_window: bool,
    fail_context: bool,
}

impl HeadlessPlatform {
    /// Platform with no scripted input and no frame limit
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `events` on the next frame after those already scripted
    #[must_use]
    pub fn with_frame_events(mut self, events: Vec<WindowEvent>) -> Self {
        self.script.push(events);
        self
    }

    /// Request close once `frames` frames have been presented
    #[must_use]
    pub fn with_frame_limit(mut self, frames: u64) -> Self {
        self.frame_limit = Some(frames);
        self
    }

    /// Make window creation fail
    #[must_use]
    pub fn with_window_failure(mut self) -> Self {
        self.fail_window = true;
        self
    }

    /// Make context creation fail
    #[must_use]
    pub fn with_context_failure(mut self) -> Self {
        self.fail_context = true;
        self
    }
}

impl Platform for HeadlessPlatform {
    fn create_window(&mut self, config: &WindowConfig) -> WindowResult<Box<dyn WindowBackend>> {
        if self.fail_window {
            return Err(WindowError::CreationFailed(format!("'{}' refused by headless platform", config.title)));
        }
        log::info!("Created headless window '{}' ({}x{})", config.title, config.width, config.height);
        Ok(Box::new(HeadlessWindow {
            title: config.title.clone(),
            size: (config.width, config.height),
            script: std::mem::take(&mut self.script).into(),
            frame_limit: self.frame_limit,
            frames_presented: 0,
            should_close: false,
        }))
    }

    fn create_context(&mut self, _window: &mut dyn WindowBackend) -> WindowResult<Box<dyn GraphicsApi>> {
        if self.fail_context {
            return Err(WindowError::ContextCreationFailed("headless context disabled".to_string()));
        }
        Ok(Box::new(HeadlessApi::new()))
    }
}

/// Window that exists only in memory
#[derive(Debug)]
pub struct HeadlessWindow {
    title: String,
    size: (u32, u32),
    script: VecDeque<Vec<WindowEvent>>,
    frame_limit: Option<u64>,
    frames_presented: u64,
    should_close: bool,
}

impl HeadlessWindow {
    /// Frames presented so far
    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }
}

impl WindowBackend for HeadlessWindow {
    fn poll_events(&mut self) -> Vec<WindowEvent> {
        let events = self.script.pop_front().unwrap_or_default();
        for event in &events {
            match *event {
                WindowEvent::FramebufferResized { width, height } => self.size = (width, height),
                WindowEvent::CloseRequested => self.should_close = true,
                WindowEvent::Key { .. } => {}
            }
        }
        events
    }

    fn swap_buffers(&mut self) {
        self.frames_presented += 1;
        if self.frame_limit.is_some_and(|limit| self.frames_presented >= limit) {
            self.should_close = true;
        }
    }

    fn should_close(&self) -> bool {
        self.should_close
    }

    fn set_should_close(&mut self, should_close: bool) {
        self.should_close = should_close;
    }

    fn framebuffer_size(&self) -> (u32, u32) {
        self.size
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
    use crate::window::Key;

    #[test]
    fn test_scripted_events_arrive_one_frame_at_a_time() {
        let mut platform = HeadlessPlatform::new()
            .with_frame_events(vec![WindowEvent::key_press(Key::R)])
            .with_frame_events(vec![WindowEvent::FramebufferResized { width: 800, height: 600 }]);
        let mut window = platform.create_window(&WindowConfig::default()).unwrap();

        assert_eq!(window.poll_events(), vec![WindowEvent::key_press(Key::R)]);
        assert_eq!(window.framebuffer_size(), (640, 480));
        assert_eq!(window.poll_events().len(), 1);
        assert_eq!(window.framebuffer_size(), (800, 600));
        assert!(window.poll_events().is_empty());
    }

    #[test]
    fn test_frame_limit_requests_close() {
        let mut platform = HeadlessPlatform::new().with_frame_limit(2);
        let mut window = platform.create_window(&WindowConfig::default()).unwrap();

        window.swap_buffers();
        assert!(!window.should_close());
        window.swap_buffers();
        assert!(window.should_close());
    }

    #[test]
    fn test_close_request_event() {
        let mut platform = HeadlessPlatform::new().with_frame_events(vec![WindowEvent::CloseRequested]);
        let mut window = platform.create_window(&WindowConfig::default()).unwrap();

        window.poll_events();

        assert!(window.should_close());
    }

    #[test]
    fn test_injected_failures() {
        let mut platform = HeadlessPlatform::new().with_window_failure();
        assert!(matches!(platform.create_window(&WindowConfig::default()), Err(WindowError::CreationFailed(_))));

        let mut platform = HeadlessPlatform::new().with_context_failure();
        let mut window = platform.create_window(&WindowConfig::default()).unwrap();
        assert!(matches!(platform.create_context(window.as_mut()), Err(WindowError::ContextCreationFailed(_))));
    }
}
