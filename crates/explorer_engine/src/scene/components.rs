//! Built-in components

use std::any::Any;

use crate::foundation::math::{Mat4, Vec3};
use crate::render::{GraphicsApi, Mesh, RenderContext, RenderResult};
use crate::scene::{Component, ComponentError, Transform};

/// Draws a [`Mesh`] with the owner's world matrix
#[derive(Debug)]
pub struct MeshRenderer {
    mesh_name: String,
    mesh: Mesh,
}

impl MeshRenderer {
    /// Renderer for the unit cube, identified as `mesh_name`
    pub fn new(mesh_name: impl Into<String>) -> Self {
        Self::with_mesh(mesh_name, Mesh::new())
    }

    /// Renderer for caller-supplied mesh data
    pub fn with_mesh(mesh_name: impl Into<String>, mesh: Mesh) -> Self {
        Self {
            mesh_name: mesh_name.into(),
            mesh,
        }
    }

    /// The mesh being drawn
    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }
}

impl Component for MeshRenderer {
    fn initialize(&mut self, api: &mut dyn GraphicsApi) -> Result<(), ComponentError> {
        self.mesh.initialize(api, &self.mesh_name)?;
        Ok(())
    }

    fn render(&self, ctx: &mut RenderContext<'_>, world: &Mat4) -> RenderResult<()> {
        ctx.draw_mesh(&self.mesh, world)
    }

    fn exit(&mut self, api: &mut dyn GraphicsApi) {
        self.mesh.exit(api);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Rotates the owner at a constant angular velocity
#[derive(Debug, Clone, PartialEq)]
pub struct Spin {
    /// Radians per second about each axis, as `(pitch, yaw, roll)`
    pub angular_velocity: Vec3,
}

impl Spin {
    /// Spin with `angular_velocity` radians per second
    pub fn new(angular_velocity: Vec3) -> Self {
        Self { angular_velocity }
    }
}

impl Component for Spin {
    fn initialize(&mut self, _api: &mut dyn GraphicsApi) -> Result<(), ComponentError> {
        Ok(())
    }

    fn update_transform(&mut self, delta_time: f32, transform: &mut Transform) {
        transform.rotate(self.angular_velocity * delta_time);
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
    use crate::render::{HeadlessApi, ObjectKind};
    use approx::assert_relative_eq;

    #[test]
    fn test_mesh_renderer_owns_mesh_lifecycle() {
        let mut api = HeadlessApi::new();
        let mut renderer = MeshRenderer::new("cube");

        renderer.initialize(&mut api).unwrap();
        assert!(renderer.mesh().is_initialized());
        assert_eq!(renderer.mesh().name(), "cube");

        renderer.exit(&mut api);
        assert_eq!(api.live_objects(ObjectKind::Buffer), 0);
    }

    #[test]
    fn test_mesh_renderer_propagates_allocation_failure() {
        let mut api = HeadlessApi::new();
        api.fail_next_allocation(ObjectKind::Buffer);
        let mut renderer = MeshRenderer::new("cube");

        assert!(matches!(renderer.initialize(&mut api), Err(ComponentError::Render(_))));
    }

    #[test]
    fn test_spin_rotates_by_velocity_times_dt() {
        let mut spin = Spin::new(Vec3::new(0.0, 2.0, 0.0));
        let mut transform = Transform::new();

        spin.update_transform(0.25, &mut transform);

        assert_relative_eq!(transform.rotation(), Vec3::new(0.0, 0.5, 0.0), epsilon = 1e-6);
        assert!(transform.is_dirty());
    }
}
