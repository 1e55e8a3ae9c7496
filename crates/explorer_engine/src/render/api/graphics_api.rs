//! Graphics context abstraction
//!
//! Every GPU operation in the engine goes through [`GraphicsApi`]. The context
//! is passed explicitly (`&mut dyn GraphicsApi`) to whoever needs it, so there
//! is no ambient "currently bound" state outside the one context object.
//!
//! Handles are opaque `u64` newtypes, one type per object kind, so a buffer
//! handle can never be passed where a program handle is expected.

use std::any::Any;
use std::fmt;

use bitflags::bitflags;

use crate::foundation::math::{Mat4, Vec4};
use crate::render::RenderError;

/// Result type for backend operations
pub type BackendResult<T> = Result<T, RenderError>;

/// Handle to one compiled shader stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderHandle(pub u64);

/// Handle to a linked shader program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub u64);

/// Handle to a vertex or index buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u64);

/// Handle to vertex layout state (attribute bindings + index buffer)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexArrayHandle(pub u64);

/// Programmable pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// Per-vertex stage
    Vertex,
    /// Per-fragment stage
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertex => write!(f, "vertex"),
            Self::Fragment => write!(f, "fragment"),
        }
    }
}

/// What a buffer holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    /// Per-vertex attribute data
    Vertex,
    /// Triangle indices
    Index,
}

/// Upload frequency hint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    /// Uploaded once, drawn many times
    Static,
    /// Re-uploaded regularly
    Dynamic,
}

/// Layout of one float vertex attribute inside a vertex buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    /// Attribute location in the vertex shader
    pub location: u32,
    /// Number of `f32` components
    pub components: u32,
    /// Bytes between consecutive vertices
    pub stride: u32,
    /// Byte offset of the attribute inside a vertex
    pub offset: u32,
}

bitflags! {
    /// Framebuffer planes to clear
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClearFlags: u32 {
        /// Color attachment
        const COLOR = 1 << 0;
        /// Depth attachment
        const DEPTH = 1 << 1;
    }
}

/// Human readable description of the context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiInfo {
    /// Renderer (device) name
    pub renderer: String,
    /// API version string
    pub version: String,
}

/// The single graphics context all GPU handles belong to
///
/// Creation methods fail with [`RenderError::ResourceCreationFailed`] when the
/// context cannot allocate; methods taking a handle fail with
/// [`RenderError::InvalidHandle`] when the handle was never created or has
/// already been deleted.
pub trait GraphicsApi {
    /// Renderer and version strings, logged at startup
    fn info(&self) -> ApiInfo;

    /// Create an empty shader object for `stage`
    fn create_shader(&mut self, stage: ShaderStage) -> BackendResult<ShaderHandle>;

    /// Compile `source` into `shader`
    ///
    /// Fails with [`RenderError::ShaderCompilation`] carrying the compiler log.
    fn compile_shader(&mut self, shader: ShaderHandle, source: &str) -> BackendResult<()>;

    /// Release a shader object
    fn delete_shader(&mut self, shader: ShaderHandle) -> BackendResult<()>;

    /// Create an empty program object
    fn create_program(&mut self) -> BackendResult<ProgramHandle>;

    /// Attach a compiled shader to a program before linking
    fn attach_shader(&mut self, program: ProgramHandle, shader: ShaderHandle) -> BackendResult<()>;

    /// Link the attached stages
    ///
    /// Fails with [`RenderError::ProgramLink`] carrying the linker log.
    fn link_program(&mut self, program: ProgramHandle) -> BackendResult<()>;

    /// Make `program` current for subsequent draws, or unbind with `None`
    fn use_program(&mut self, program: Option<ProgramHandle>) -> BackendResult<()>;

    /// Upload a 4x4 matrix uniform to a linked program
    fn set_uniform_mat4(&mut self, program: ProgramHandle, name: &str, value: &Mat4) -> BackendResult<()>;

    /// Upload a 4-component vector uniform to a linked program
    fn set_uniform_vec4(&mut self, program: ProgramHandle, name: &str, value: &Vec4) -> BackendResult<()>;

    /// Release a program object
    fn delete_program(&mut self, program: ProgramHandle) -> BackendResult<()>;

    /// Create an empty buffer
    fn create_buffer(&mut self, target: BufferTarget) -> BackendResult<BufferHandle>;

    /// Replace the contents of a buffer
    fn upload_buffer(&mut self, buffer: BufferHandle, data: &[u8], usage: BufferUsage) -> BackendResult<()>;

    /// Release a buffer
    fn delete_buffer(&mut self, buffer: BufferHandle) -> BackendResult<()>;

    /// Create an empty vertex array
    fn create_vertex_array(&mut self) -> BackendResult<VertexArrayHandle>;

    /// Bind a float attribute sourced from `buffer`
    fn set_vertex_attribute(
        &mut self,
        vertex_array: VertexArrayHandle,
        buffer: BufferHandle,
        attribute: VertexAttribute,
    ) -> BackendResult<()>;

    /// Bind the index buffer used by indexed draws of `vertex_array`
    fn set_index_buffer(&mut self, vertex_array: VertexArrayHandle, buffer: BufferHandle) -> BackendResult<()>;

    /// Release a vertex array
    fn delete_vertex_array(&mut self, vertex_array: VertexArrayHandle) -> BackendResult<()>;

    /// Draw `index_count` indices as a triangle list with the current program
    fn draw_indexed(&mut self, vertex_array: VertexArrayHandle, index_count: u32) -> BackendResult<()>;

    /// Set the viewport to cover `width` x `height` pixels
    fn set_viewport(&mut self, width: u32, height: u32);

    /// Clear the selected framebuffer planes
    fn clear(&mut self, flags: ClearFlags, color: [f32; 4]);

    /// Downcast to the concrete context type
    fn as_any(&self) -> &dyn Any;

    /// Downcast to the concrete context type mutably
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
