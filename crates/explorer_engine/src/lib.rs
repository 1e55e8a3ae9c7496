//! # Explorer Engine
//!
//! A minimal frame-synchronous rendering engine: a window with one graphics
//! context, a scene of game objects advanced once per frame, and explicit
//! lifecycles for GPU shader programs and mesh buffers.
//!
//! ## Features
//!
//! - **Scene model**: scenes own game objects, game objects own components
//! - **GPU lifecycles**: shader compile/link/use/destroy, mesh upload/draw/release
//! - **Explicit context**: every GPU call takes `&mut dyn GraphicsApi`
//! - **Live shader reload**: press R; a failed reload keeps the running program
//! - **Headless by default**: the GLFW window sits behind the `glfw-window` feature
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use explorer_engine::prelude::*;
//!
//! fn main() -> Result<(), EngineError> {
//!     explorer_engine::foundation::logging::init();
//!
//!     let config = ApplicationConfig::load_or_default("explorer.toml")?;
//!     let mut engine = Engine::new(config, HeadlessPlatform::new().with_frame_limit(60), StatsOverlay::default());
//!     engine.initialize()?;
//!
//!     let cube = GameObject::new("cube")
//!         .with_component(MeshRenderer::new("cube"))
//!         .with_component(Spin::new(Vec3::new(0.0, 1.0, 0.0)));
//!     let scene = engine.add_scene(Scene::new("main").with_object(cube));
//!     engine.enter_scene(scene)?;
//!
//!     engine.run()
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Core engine modules
pub mod config;
pub mod core;
pub mod foundation;
pub mod render;
pub mod scene;
pub mod ui;
pub mod window;

mod engine;

pub use engine::{Engine, EngineError, EngineState};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::Config,
        core::{ApplicationConfig, EngineConfig, ShaderConfig, WindowConfig},
        foundation::{
            math::{Mat4, Mat4Ext, Vec3},
            time::FrameTimer,
        },
        render::{GlApi, GraphicsApi, HeadlessApi, Mesh, RenderContext, RenderError, ShaderProgram, ShaderSources},
        scene::{Component, ComponentError, GameObject, MeshRenderer, Scene, SceneError, SceneObject, Spin, Transform},
        ui::{NullOverlay, StatsOverlay, UIOverlay},
        window::{HeadlessPlatform, Key, Platform, WindowBackend, WindowEvent},
        Engine, EngineError, EngineState,
    };

    #[cfg(feature = "glfw-window")]
    pub use crate::window::GlfwPlatform;
}
