//! Public rendering API
//!
//! The graphics context trait, its handle types and the per-frame render
//! context handed to scene objects.

pub mod graphics_api;
pub mod render_context;

// Re-export commonly used types
pub use graphics_api::{
    ApiInfo, BackendResult, BufferHandle, BufferTarget, BufferUsage, ClearFlags, GraphicsApi,
    ProgramHandle, ShaderHandle, ShaderStage, VertexArrayHandle, VertexAttribute,
};
pub use render_context::RenderContext;
