//! Core primitive types for rendering
//!
//! Mesh geometry and the GPU buffers that hold it.

pub mod mesh;

// Re-export commonly used types
pub use mesh::{Mesh, MeshGeometry, Vertex};
