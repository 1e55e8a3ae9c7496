//! Mesh geometry and GPU buffer lifecycle
//!
//! A [`Mesh`] owns three GPU objects: the vertex buffer, the vertex array that
//! describes its layout, and the index buffer. They are allocated together in
//! [`Mesh::initialize`], used by [`Mesh::render`] and released together in
//! [`Mesh::exit`]. Each handle is tracked separately so a partially failed
//! initialization releases exactly what was created.

use bytemuck::{Pod, Zeroable};

use crate::render::api::{BufferHandle, BufferTarget, BufferUsage, GraphicsApi, VertexArrayHandle, VertexAttribute};
use crate::render::{RenderError, RenderResult};

/// Shader location of the position attribute
pub const POSITION_ATTRIBUTE: u32 = 0;

/// Vertex with a single position attribute
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Vertex {
    /// Position in model space
    pub position: [f32; 3],
}

impl Vertex {
    /// Create a vertex at `position`
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { position: [x, y, z] }
    }

    /// Layout of the position attribute inside a vertex buffer
    pub fn position_attribute() -> VertexAttribute {
        VertexAttribute {
            location: POSITION_ATTRIBUTE,
            components: 3,
            stride: std::mem::size_of::<Vertex>() as u32,
            offset: 0,
        }
    }
}

/// CPU-side triangle list
#[derive(Debug, Clone, PartialEq)]
pub struct MeshGeometry {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
}

impl MeshGeometry {
    /// Build geometry from a vertex list and triangle-list indices
    ///
    /// Fails when the index count is not a multiple of three or an index
    /// points past the vertex list.
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> RenderResult<Self> {
        if indices.is_empty() || indices.len() % 3 != 0 {
            return Err(RenderError::InvalidGeometry(format!(
                "{} indices do not form a triangle list",
                indices.len()
            )));
        }
        if let Some(index) = indices.iter().find(|index| **index as usize >= vertices.len()) {
            return Err(RenderError::InvalidGeometry(format!(
                "index {index} out of range for {} vertices",
                vertices.len()
            )));
        }
        Ok(Self { vertices, indices })
    }

    /// Axis-aligned cube of side 1 centred on the origin
    ///
    /// 8 corners, 12 triangles.
    pub fn unit_cube() -> Self {
        let vertices = vec![
            Vertex::new(-0.5, -0.5, 0.5),
            Vertex::new(-0.5, 0.5, 0.5),
            Vertex::new(0.5, 0.5, 0.5),
            Vertex::new(0.5, -0.5, 0.5),
            Vertex::new(-0.5, -0.5, -0.5),
            Vertex::new(-0.5, 0.5, -0.5),
            Vertex::new(0.5, 0.5, -0.5),
            Vertex::new(0.5, -0.5, -0.5),
        ];
        #[rustfmt::skip]
        let indices = vec![
            0, 2, 1,  0, 3, 2,
            4, 3, 0,  4, 7, 3,
            4, 1, 5,  4, 0, 1,
            3, 6, 2,  3, 7, 6,
            1, 6, 5,  1, 2, 6,
            7, 5, 6,  7, 4, 5,
        ];
        Self { vertices, indices }
    }

    /// Vertex list
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Index list
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }
}

/// Indexed mesh with GPU-resident buffers
#[derive(Debug)]
pub struct Mesh {
    name: String,
    geometry: MeshGeometry,
    vertex_buffer: Option<BufferHandle>,
    vertex_array: Option<VertexArrayHandle>,
    index_buffer: Option<BufferHandle>,
}

impl Default for Mesh {
    fn default() -> Self {
        Self::from_geometry(MeshGeometry::unit_cube())
    }
}

impl Mesh {
    /// Unit cube mesh, not yet uploaded
    pub fn new() -> Self {
        Self::default()
    }

    /// Mesh over caller-supplied geometry, not yet uploaded
    pub fn from_geometry(geometry: MeshGeometry) -> Self {
        Self {
            name: String::new(),
            geometry,
            vertex_buffer: None,
            vertex_array: None,
            index_buffer: None,
        }
    }

    /// Upload the geometry and create the vertex layout
    ///
    /// `name` identifies the mesh in logs and errors. On failure every handle
    /// created so far is released and the mesh stays uninitialized.
    pub fn initialize(&mut self, api: &mut dyn GraphicsApi, name: &str) -> RenderResult<()> {
        if self.is_initialized() {
            log::debug!("Mesh '{}' already initialized", self.name);
            return Ok(());
        }
        self.name = name.to_string();
        log::debug!(
            "Initializing mesh '{}' ({} vertices, {} indices)",
            self.name,
            self.geometry.vertices.len(),
            self.geometry.indices.len()
        );

        if let Err(e) = self.upload(api) {
            log::error!("Failed to initialize mesh '{}': {}", self.name, e);
            self.release(api);
            return Err(e);
        }
        Ok(())
    }

    fn upload(&mut self, api: &mut dyn GraphicsApi) -> RenderResult<()> {
        let vertex_buffer = api.create_buffer(BufferTarget::Vertex)?;
        self.vertex_buffer = Some(vertex_buffer);
        api.upload_buffer(vertex_buffer, bytemuck::cast_slice(&self.geometry.vertices), BufferUsage::Static)?;

        let vertex_array = api.create_vertex_array()?;
        self.vertex_array = Some(vertex_array);
        api.set_vertex_attribute(vertex_array, vertex_buffer, Vertex::position_attribute())?;

        let index_buffer = api.create_buffer(BufferTarget::Index)?;
        self.index_buffer = Some(index_buffer);
        api.upload_buffer(index_buffer, bytemuck::cast_slice(&self.geometry.indices), BufferUsage::Static)?;
        api.set_index_buffer(vertex_array, index_buffer)?;
        Ok(())
    }

    /// Issue one indexed draw of the whole mesh with the current program
    pub fn render(&self, api: &mut dyn GraphicsApi) -> RenderResult<()> {
        match (self.vertex_buffer, self.vertex_array, self.index_buffer) {
            (Some(_), Some(vertex_array), Some(_)) => api.draw_indexed(vertex_array, self.index_count()),
            _ => Err(RenderError::MeshNotInitialized(self.name.clone())),
        }
    }

    /// Release the GPU buffers; calling it again is a no-op
    pub fn exit(&mut self, api: &mut dyn GraphicsApi) {
        if self.is_initialized() {
            log::debug!("Releasing mesh '{}'", self.name);
        }
        self.release(api);
    }

    fn release(&mut self, api: &mut dyn GraphicsApi) {
        if let Some(buffer) = self.vertex_buffer.take() {
            if let Err(e) = api.delete_buffer(buffer) {
                log::warn!("Mesh '{}': failed to delete vertex buffer: {}", self.name, e);
            }
        }
        if let Some(vertex_array) = self.vertex_array.take() {
            if let Err(e) = api.delete_vertex_array(vertex_array) {
                log::warn!("Mesh '{}': failed to delete vertex array: {}", self.name, e);
            }
        }
        if let Some(buffer) = self.index_buffer.take() {
            if let Err(e) = api.delete_buffer(buffer) {
                log::warn!("Mesh '{}': failed to delete index buffer: {}", self.name, e);
            }
        }
    }

    /// Whether all three GPU objects are allocated
    pub fn is_initialized(&self) -> bool {
        self.vertex_buffer.is_some() && self.vertex_array.is_some() && self.index_buffer.is_some()
    }

    /// Name given at initialization
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Indices drawn per call
    pub fn index_count(&self) -> u32 {
        self.geometry.indices.len() as u32
    }

    /// CPU-side geometry
    pub fn geometry(&self) -> &MeshGeometry {
        &self.geometry
    }

    /// Vertex array handle while initialized
    pub fn vertex_array(&self) -> Option<VertexArrayHandle> {
        self.vertex_array
    }
}

impl Drop for Mesh {
    fn drop(&mut self) {
        if self.vertex_buffer.is_some() || self.vertex_array.is_some() || self.index_buffer.is_some() {
            log::warn!("Mesh '{}' dropped without exit; GPU buffers leaked", self.name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::api::ShaderStage;
    use crate::render::backends::{HeadlessApi, ObjectKind};

    fn api_with_program() -> HeadlessApi {
        let mut api = HeadlessApi::new();
        let vertex = api.create_shader(ShaderStage::Vertex).unwrap();
        api.compile_shader(vertex, "#version 410 core\nvoid main() {}").unwrap();
        let fragment = api.create_shader(ShaderStage::Fragment).unwrap();
        api.compile_shader(fragment, "#version 410 core\nvoid main() {}").unwrap();
        let program = api.create_program().unwrap();
        api.attach_shader(program, vertex).unwrap();
        api.attach_shader(program, fragment).unwrap();
        api.link_program(program).unwrap();
        api.use_program(Some(program)).unwrap();
        api
    }

    #[test]
    fn test_unit_cube_shape() {
        let cube = MeshGeometry::unit_cube();

        assert_eq!(cube.vertices().len(), 8);
        assert_eq!(cube.indices().len(), 36);
        assert!(cube.indices().iter().all(|i| *i < 8));
        assert!(cube.vertices().iter().all(|v| v.position.iter().all(|c| c.abs() == 0.5)));
        assert_eq!(std::mem::size_of::<Vertex>(), 12);
    }

    #[test]
    fn test_geometry_validation() {
        let triangle = vec![Vertex::new(0.0, 0.0, 0.0), Vertex::new(1.0, 0.0, 0.0), Vertex::new(0.0, 1.0, 0.0)];

        assert!(MeshGeometry::new(triangle.clone(), vec![0, 1, 2]).is_ok());
        assert!(matches!(MeshGeometry::new(triangle.clone(), vec![0, 1]), Err(RenderError::InvalidGeometry(_))));
        assert!(matches!(MeshGeometry::new(triangle, vec![0, 1, 3]), Err(RenderError::InvalidGeometry(_))));
    }

    #[test]
    fn test_initialize_uploads_cube() {
        let mut api = HeadlessApi::new();
        let mut mesh = Mesh::new();
        mesh.initialize(&mut api, "cube").unwrap();

        assert!(mesh.is_initialized());
        assert_eq!(api.live_objects(ObjectKind::Buffer), 2);
        assert_eq!(api.live_objects(ObjectKind::VertexArray), 1);
        let vertex_array = mesh.vertex_array().unwrap();
        assert_eq!(api.vertex_attributes(vertex_array), vec![Vertex::position_attribute()]);
        assert_eq!(Vertex::position_attribute().stride, 12);

        mesh.exit(&mut api);
    }

    #[test]
    fn test_each_draw_uses_36_indices() {
        let mut api = api_with_program();
        let mut mesh = Mesh::new();
        mesh.initialize(&mut api, "cube").unwrap();

        for _ in 0..3 {
            mesh.render(&mut api).unwrap();
        }

        assert_eq!(api.total_draws(), 3);
        assert!(api.frame_draws().iter().all(|draw| draw.index_count == 36));
        mesh.exit(&mut api);
    }

    #[test]
    fn test_render_before_initialize_fails() {
        let mut api = api_with_program();
        let mesh = Mesh::new();

        assert!(matches!(mesh.render(&mut api), Err(RenderError::MeshNotInitialized(_))));
        assert_eq!(api.total_draws(), 0);
    }

    #[test]
    fn test_allocation_failure_releases_partial_handles() {
        let mut api = HeadlessApi::new();
        api.fail_next_allocation(ObjectKind::VertexArray);
        let mut mesh = Mesh::new();

        let result = mesh.initialize(&mut api, "cube");

        assert!(matches!(result, Err(RenderError::ResourceCreationFailed(_))));
        assert!(!mesh.is_initialized());
        assert_eq!(api.live_objects(ObjectKind::Buffer), 0);
        assert_eq!(api.live_objects(ObjectKind::VertexArray), 0);

        mesh.initialize(&mut api, "cube").unwrap();
        assert!(mesh.is_initialized());
        mesh.exit(&mut api);
    }

    #[test]
    fn test_exit_is_idempotent() {
        let mut api = api_with_program();
        let mut mesh = Mesh::new();
        mesh.initialize(&mut api, "cube").unwrap();

        mesh.exit(&mut api);
        mesh.exit(&mut api);

        assert_eq!(api.live_objects(ObjectKind::Buffer), 0);
        assert_eq!(api.live_objects(ObjectKind::VertexArray), 0);
        assert!(matches!(mesh.render(&mut api), Err(RenderError::MeshNotInitialized(_))));
    }
}
