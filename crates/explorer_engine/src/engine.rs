//! Core engine implementation
//!
//! The [`Engine`] owns the window, the graphics context, the UI overlay, the
//! engine shader program and every scene. One frame is
//! `process_events → update → render → swap_buffers`:
//!
//! ```rust,no_run
//! use explorer_engine::prelude::*;
//!
//! fn main() -> Result<(), EngineError> {
//!     let mut engine = Engine::new(ApplicationConfig::default(), HeadlessPlatform::new(), NullOverlay);
//!     engine.initialize()?;
//!     let scene = Scene::new("main").with_object(GameObject::new("cube").with_component(MeshRenderer::new("cube")));
//!     let index = engine.add_scene(scene);
//!     engine.enter_scene(index)?;
//!     engine.run()
//! }
//! ```

use thiserror::Error;

use crate::config::ConfigError;
use crate::core::ApplicationConfig;
use crate::foundation::time::FrameTimer;
use crate::render::{ClearFlags, GraphicsApi, RenderContext, RenderError, ShaderProgram, ShaderSources};
use crate::scene::{Scene, SceneError};
use crate::ui::{UIError, UIOverlay};
use crate::window::{Key, KeyAction, Platform, WindowBackend, WindowError, WindowEvent};

/// Engine lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Constructed, nothing acquired
    Created,
    /// Window, context and shaders ready; frames may run
    Running,
    /// `initialize` failed; call it again before anything else
    Failed,
    /// Torn down
    Exited,
}

/// Main engine struct
///
/// Scenes are owned by the engine; the current scene is an index into them.
pub struct Engine {
    config: ApplicationConfig,
    platform: Box<dyn Platform>,
    window: Option<Box<dyn WindowBackend>>,
    api: Option<Box<dyn GraphicsApi>>,
    ui: Box<dyn UIOverlay>,
    ui_initialized: bool,
    shader: ShaderProgram,
    scenes: Vec<Scene>,
    current_scene: Option<usize>,
    timer: FrameTimer,
    state: EngineState,
}

impl Engine {
    /// Create an engine; nothing is acquired until [`Engine::initialize`]
    pub fn new(config: ApplicationConfig, platform: impl Platform + 'static, ui: impl UIOverlay + 'static) -> Self {
        let timer = FrameTimer::with_sample_rate(config.engine.fps_sample_rate);
        Self {
            config,
            platform: Box::new(platform),
            window: None,
            api: None,
            ui: Box::new(ui),
            ui_initialized: false,
            shader: ShaderProgram::new(),
            scenes: Vec::new(),
            current_scene: None,
            timer,
            state: EngineState::Created,
        }
    }

    /// Open the window, create the context, set up the UI and load the shaders
    ///
    /// On failure everything acquired so far is released and the engine is
    /// left [`EngineState::Failed`].
    pub fn initialize(&mut self) -> Result<(), EngineError> {
        if self.state == EngineState::Running {
            log::warn!("Engine already initialized");
            return Ok(());
        }
        log::info!("Initializing engine...");

        if let Err(e) = self.acquire() {
            log::error!("Engine initialization failed: {e}");
            self.release();
            self.state = EngineState::Failed;
            return Err(e);
        }

        self.timer = FrameTimer::with_sample_rate(self.config.engine.fps_sample_rate);
        self.state = EngineState::Running;
        log::info!("Engine initialized");
        Ok(())
    }

    fn acquire(&mut self) -> Result<(), EngineError> {
        self.config.validate()?;

        let mut window = self.platform.create_window(&self.config.window)?;
        let mut api = self.platform.create_context(window.as_mut())?;
        let (width, height) = window.framebuffer_size();
        api.set_viewport(width, height);
        let info = api.info();
        log::info!("Renderer: {}", info.renderer);
        log::info!("Version: {}", info.version);

        let window_info = window.info();
        self.window = Some(window);
        let api: &mut dyn GraphicsApi = self.api.insert(api).as_mut();

        self.ui.initialize(&window_info, api)?;
        self.ui_initialized = true;

        let sources = ShaderSources::from_files(&self.config.shaders)?;
        self.shader = ShaderProgram::new();
        self.shader.load(api, &sources, false)?;
        Ok(())
    }

    fn release(&mut self) {
        if let Some(api) = self.api.as_deref_mut() {
            if self.ui_initialized {
                self.ui.exit(api);
            }
            if let Some(index) = self.current_scene.take() {
                self.scenes[index].exit(api);
            }
            self.shader.destroy(api);
        }
        self.ui_initialized = false;
        self.api = None;
        self.window = None;
    }

    /// Append a scene and return its index
    pub fn add_scene(&mut self, scene: Scene) -> usize {
        self.scenes.push(scene);
        self.scenes.len() - 1
    }

    /// Exit the current scene (if any) and make scene `index` current
    ///
    /// If the new scene fails to initialize there is no current scene.
    pub fn enter_scene(&mut self, index: usize) -> Result<(), EngineError> {
        if index >= self.scenes.len() {
            return Err(EngineError::SceneIndexOutOfBounds {
                index,
                count: self.scenes.len(),
            });
        }
        let api = running_api(self.state, &mut self.api)?;

        if let Some(current) = self.current_scene.take() {
            self.scenes[current].exit(api);
        }
        self.scenes[index].initialize(api)?;
        self.current_scene = Some(index);
        log::info!("Entered scene '{}'", self.scenes[index].name());
        Ok(())
    }

    /// Poll window events and react to them
    ///
    /// Escape closes the window, R reloads the shaders, a framebuffer resize
    /// updates the viewport. The UI sees every event first.
    pub fn process_events(&mut self) -> Result<(), EngineError> {
        if self.state != EngineState::Running {
            return Err(EngineError::NotInitialized);
        }
        let (Some(window), Some(api)) = (self.window.as_deref_mut(), self.api.as_deref_mut()) else {
            return Err(EngineError::NotInitialized);
        };

        let mut reload = false;
        for event in window.poll_events() {
            self.ui.handle_event(&event);
            match event {
                WindowEvent::Key { key: Key::Escape, action: KeyAction::Press } => window.set_should_close(true),
                WindowEvent::Key { key: Key::R, action: KeyAction::Press } => reload = true,
                WindowEvent::Key { .. } => {}
                WindowEvent::FramebufferResized { width, height } => {
                    api.set_viewport(width, height);
                    self.ui.resize(width, height);
                }
                WindowEvent::CloseRequested => window.set_should_close(true),
            }
        }

        if reload {
            if let Err(e) = self.reload_shaders() {
                log::error!("Shader reload failed, keeping the previous program: {e}");
            }
        }
        Ok(())
    }

    /// Re-read the shader sources and relink the engine program
    ///
    /// On any failure the previously registered program stays in use.
    pub fn reload_shaders(&mut self) -> Result<(), EngineError> {
        let api = running_api(self.state, &mut self.api)?;
        log::info!("Reloading shaders");
        let sources = ShaderSources::from_files(&self.config.shaders)?;
        self.shader.load(api, &sources, true)?;
        Ok(())
    }

    /// Advance the UI and the current scene by one frame
    pub fn update(&mut self) -> Result<(), EngineError> {
        if self.state != EngineState::Running {
            return Err(EngineError::NotInitialized);
        }
        self.timer.update();
        let delta_time = self.timer.delta_time();

        self.ui.update(&self.timer);
        if let Some(index) = self.current_scene {
            self.scenes[index].update(delta_time);
        }
        Ok(())
    }

    /// Clear the framebuffer and draw the UI, then the current scene
    ///
    /// Both are drawn even if the first fails; the first error is returned.
    pub fn render(&mut self) -> Result<(), EngineError> {
        let api = running_api(self.state, &mut self.api)?;
        api.clear(ClearFlags::COLOR | ClearFlags::DEPTH, self.config.engine.clear_color);

        let ui_result = self.ui.render(api);

        let program = self.shader.program();
        if program.is_some() {
            api.use_program(program)?;
        }
        let scene_result = match self.current_scene {
            Some(index) => {
                let mut ctx = RenderContext::new(api, program);
                self.scenes[index].render(&mut ctx)
            }
            None => Ok(()),
        };

        ui_result?;
        scene_result?;
        Ok(())
    }

    /// Run one full frame and present it
    pub fn run_frame(&mut self) -> Result<(), EngineError> {
        self.process_events()?;
        self.update()?;
        let rendered = self.render();
        if let Some(window) = self.window.as_deref_mut() {
            window.swap_buffers();
        }
        rendered
    }

    /// Run frames until the window asks to close, then shut down
    ///
    /// Errors from individual frames are logged and the loop continues.
    pub fn run(&mut self) -> Result<(), EngineError> {
        if self.state != EngineState::Running {
            return Err(EngineError::NotInitialized);
        }
        log::info!("Starting main loop");
        while !self.needs_to_close_window() {
            if let Err(e) = self.run_frame() {
                log::error!("Frame {} failed: {}", self.timer.frame_count(), e);
            }
        }
        log::info!("Main loop finished after {} frames", self.timer.frame_count());
        self.exit();
        Ok(())
    }

    /// Tear down the UI and the current scene, then release the context and window
    ///
    /// Safe to call more than once.
    pub fn exit(&mut self) {
        if matches!(self.state, EngineState::Created | EngineState::Exited) {
            return;
        }
        log::info!("Shutting down engine...");
        self.release();
        self.state = EngineState::Exited;
        log::info!("Engine shutdown complete");
    }

    /// Whether the window asked to close; true when there is no window
    pub fn needs_to_close_window(&self) -> bool {
        self.window.as_ref().map_or(true, |window| window.should_close())
    }

    /// Lifecycle state
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Configuration the engine was built with
    pub fn config(&self) -> &ApplicationConfig {
        &self.config
    }

    /// All scenes, in insertion order
    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    /// Scene at `index`, mutably
    pub fn scene_mut(&mut self, index: usize) -> Option<&mut Scene> {
        self.scenes.get_mut(index)
    }

    /// Index of the current scene
    pub fn current_scene_index(&self) -> Option<usize> {
        self.current_scene
    }

    /// The current scene
    pub fn current_scene(&self) -> Option<&Scene> {
        self.current_scene.and_then(|index| self.scenes.get(index))
    }

    /// Frame timing
    pub fn timer(&self) -> &FrameTimer {
        &self.timer
    }

    /// The engine shader program
    pub fn shader_program(&self) -> &ShaderProgram {
        &self.shader
    }

    /// The graphics context, while running
    pub fn graphics_api(&self) -> Option<&dyn GraphicsApi> {
        self.api.as_deref()
    }

    /// The window, while running
    pub fn window(&self) -> Option<&dyn WindowBackend> {
        self.window.as_deref()
    }
}

fn running_api(
    state: EngineState,
    api: &mut Option<Box<dyn GraphicsApi>>,
) -> Result<&mut (dyn GraphicsApi + 'static), EngineError> {
    if state != EngineState::Running {
        return Err(EngineError::NotInitialized);
    }
    api.as_deref_mut().ok_or(EngineError::NotInitialized)
}

impl Drop for Engine {
    fn drop(&mut self) {
        if self.state == EngineState::Running {
            log::warn!("Engine dropped while running; shutting down");
            self.exit();
        }
    }
}

/// Engine errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Window or context failure
    #[error("Window error: {0}")]
    Window(#[from] WindowError),

    /// GPU resource failure
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// Scene initialization or draw failure
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    /// UI overlay failure
    #[error("UI error: {0}")]
    UI(#[from] UIError),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A frame operation was called while the engine is not running
    #[error("Engine is not initialized")]
    NotInitialized,

    /// `enter_scene` was given an index past the end of the scene list
    #[error("Scene index {index} out of bounds ({count} scenes)")]
    SceneIndexOutOfBounds {
        /// Requested index
        index: usize,
        /// Number of scenes
        count: usize,
    },
}
