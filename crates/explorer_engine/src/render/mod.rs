//! Rendering system
//!
//! GPU resource lifecycles on top of the [`GraphicsApi`] context abstraction.
//!
//! - `api`: the context trait, handle types and the per-frame [`RenderContext`]
//! - `backends`: context implementations
//! - `primitives`: mesh geometry and its buffer lifecycle
//! - `shader`: the compile → link → use → destroy program state machine

pub mod api;
pub mod backends;
pub mod primitives;
pub mod shader;

use std::path::PathBuf;

use thiserror::Error;

pub use api::{
    ApiInfo, BufferHandle, BufferTarget, BufferUsage, ClearFlags, GraphicsApi, ProgramHandle,
    RenderContext, ShaderHandle, ShaderStage, VertexArrayHandle, VertexAttribute,
};
pub use backends::{DrawCall, GlApi, HeadlessApi, ObjectKind};
pub use primitives::{Mesh, MeshGeometry, Vertex};
pub use shader::{ProgramState, ShaderProgram, ShaderSources};

/// High-level rendering error types
///
/// Diagnostics from the compiler and linker are carried verbatim so callers
/// can surface them; they are also logged where they occur.
#[derive(Error, Debug)]
pub enum RenderError {
    /// The graphics context could not be created
    #[error("Graphics context creation failed: {0}")]
    ContextCreationFailed(String),

    /// A GPU object could not be allocated
    #[error("Resource creation failed: {0}")]
    ResourceCreationFailed(String),

    /// A handle does not name a live object of the expected kind
    #[error("Invalid handle: {0}")]
    InvalidHandle(String),

    /// A shader stage failed to compile
    #[error("{stage} shader compilation error: {log}")]
    ShaderCompilation {
        /// Stage that failed
        stage: ShaderStage,
        /// Compiler diagnostic text
        log: String,
    },

    /// The program failed to link
    #[error("Shader linking error: {0}")]
    ProgramLink(String),

    /// A program is registered and overwriting it was not allowed
    #[error("Program is already registered")]
    ProgramAlreadyRegistered,

    /// Linking was requested before the stage was compiled
    #[error("Cannot link program without a compiled {0} shader")]
    MissingShaderStage(ShaderStage),

    /// The program was destroyed and cannot be used again
    #[error("Shader program has been destroyed")]
    ProgramDestroyed,

    /// A draw was issued with no registered program
    #[error("No shader program is active")]
    NoActiveProgram,

    /// Mesh geometry is not a valid triangle list
    #[error("Invalid mesh geometry: {0}")]
    InvalidGeometry(String),

    /// A mesh was drawn before `initialize` succeeded or after `exit`
    #[error("Mesh '{0}' has no GPU buffers")]
    MeshNotInitialized(String),

    /// Shader source could not be read
    #[error("Failed to read shader source {path}: {source}")]
    ShaderSource {
        /// File that was read
        path: PathBuf,
        /// Underlying IO error
        source: std::io::Error,
    },
}

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;
