//! Scene system
//!
//! Objects, components and the scenes that own them.
//!
//! ```text
//! Scene ──owns──► GameObject ──owns──► Transform + [Component]
//!   │                  │
//!   └ initialize/update/render/exit fan out in insertion order
//! ```
//!
//! GPU-owning components release their handles in `exit`, so a scene must be
//! exited before it is dropped.

mod component;
mod components;
mod game_object;
#[allow(clippy::module_inception)]
mod scene;
mod transform;

use thiserror::Error;

use crate::render::RenderError;

pub use component::{Component, ComponentSlot, ComponentState};
pub use components::{MeshRenderer, Spin};
pub use game_object::{GameObject, SceneObject};
pub use scene::{Scene, SceneState};
pub use transform::Transform;

/// Failure inside one component
#[derive(Error, Debug)]
pub enum ComponentError {
    /// A GPU resource could not be created
    #[error(transparent)]
    Render(#[from] RenderError),

    /// Component-specific failure
    #[error("{0}")]
    Failed(String),

    /// The component was already exited and cannot be initialized again
    #[error("{0} was exited and cannot be reused")]
    Exited(&'static str),
}

/// Scene-level errors, always naming the object involved
#[derive(Error, Debug)]
pub enum SceneError {
    /// A component of `object` failed to initialize
    #[error("Object '{object}': component {component} failed to initialize: {source}")]
    ComponentInitialization {
        /// Object name
        object: String,
        /// Component type name
        component: &'static str,
        /// Underlying failure
        source: ComponentError,
    },

    /// A custom scene object failed to initialize
    #[error("Object '{object}' failed to initialize: {reason}")]
    ObjectInitialization {
        /// Object name
        object: String,
        /// Failure description
        reason: String,
    },

    /// A component of `object` failed to draw
    #[error("Object '{object}' failed to render: {source}")]
    Render {
        /// Object name
        object: String,
        /// Underlying draw failure
        source: RenderError,
    },
}
