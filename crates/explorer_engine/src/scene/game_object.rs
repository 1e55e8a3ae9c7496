//! Game objects
//!
//! A [`GameObject`] is a named bag of components that always carries a
//! [`Transform`]. Scenes hold objects through the [`SceneObject`] trait, so
//! a custom object can wrap a `GameObject` and add its own per-frame logic.

use crate::render::{GraphicsApi, RenderContext};
use crate::scene::{Component, ComponentSlot, ComponentState, SceneError, Transform};

/// Anything a [`Scene`](crate::scene::Scene) can drive
pub trait SceneObject {
    /// Name used in logs and errors
    fn name(&self) -> &str;

    /// Acquire resources; on failure nothing stays acquired
    fn initialize(&mut self, api: &mut dyn GraphicsApi) -> Result<(), SceneError>;

    /// Advance by `delta_time` seconds
    fn update(&mut self, delta_time: f32);

    /// Issue this object's draws
    fn render(&self, ctx: &mut RenderContext<'_>) -> Result<(), SceneError>;

    /// Release resources
    fn exit(&mut self, api: &mut dyn GraphicsApi);
}

/// Named object with a transform and an ordered component list
pub struct GameObject {
    name: String,
    transform: ComponentSlot<Transform>,
    components: Vec<ComponentSlot>,
}

impl GameObject {
    /// Object with an identity transform and no other components
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: ComponentSlot::new(Box::new(Transform::new())),
            components: Vec::new(),
        }
    }

    /// Builder form of [`GameObject::add_component`]
    #[must_use]
    pub fn with_component(mut self, component: impl Component) -> Self {
        self.add_component(component);
        self
    }

    /// Append a component; it runs after those already attached
    pub fn add_component(&mut self, component: impl Component) {
        self.components.push(ComponentSlot::new(Box::new(component)));
    }

    /// The object's transform
    pub fn transform(&self) -> &Transform {
        self.transform.get()
    }

    /// Mutable access to the object's transform
    pub fn transform_mut(&mut self) -> &mut Transform {
        self.transform.get_mut()
    }

    /// First component of type `T`
    pub fn component<T: Component>(&self) -> Option<&T> {
        self.components
            .iter()
            .find_map(|slot| slot.get().as_any().downcast_ref::<T>())
    }

    /// First component of type `T`, mutably
    pub fn component_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.components
            .iter_mut()
            .find_map(|slot| slot.get_mut().as_any_mut().downcast_mut::<T>())
    }

    /// Number of components besides the transform
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Whether the transform and every component are initialized
    pub fn is_initialized(&self) -> bool {
        self.transform.state() == ComponentState::Initialized
            && self.components.iter().all(|slot| slot.state() == ComponentState::Initialized)
    }
}

impl SceneObject for GameObject {
    fn name(&self) -> &str {
        &self.name
    }

    fn initialize(&mut self, api: &mut dyn GraphicsApi) -> Result<(), SceneError> {
        let name = self.name.clone();
        let fail = |component: &'static str, source| SceneError::ComponentInitialization {
            object: name.clone(),
            component,
            source,
        };

        self.transform.initialize(api).map_err(|e| fail("Transform", e))?;

        for index in 0..self.components.len() {
            if let Err(e) = self.components[index].initialize(api) {
                let kind = self.components[index].get().kind();
                log::error!("'{}': {} failed to initialize: {}", self.name, kind, e);
                for slot in self.components[..index].iter_mut().rev() {
                    slot.exit(api);
                }
                self.transform.exit(api);
                return Err(fail(kind, e));
            }
        }

        log::debug!("Initialized '{}' with {} components", self.name, self.components.len());
        Ok(())
    }

    fn update(&mut self, delta_time: f32) {
        self.transform.update(delta_time, None);
        let transform = self.transform.get_mut();
        for slot in &mut self.components {
            slot.update(delta_time, Some(&mut *transform));
        }
        if self.transform.state() == ComponentState::Initialized && self.transform.get().is_dirty() {
            self.transform.get_mut().recompute();
        }
    }

    fn render(&self, ctx: &mut RenderContext<'_>) -> Result<(), SceneError> {
        let world = self.transform().transform_matrix();
        let mut first_error = None;
        for slot in &self.components {
            if let Err(e) = slot.render(ctx, &world) {
                log::error!("'{}': {} failed to render: {}", self.name, slot.get().kind(), e);
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(source) => Err(SceneError::Render {
                object: self.name.clone(),
                source,
            }),
            None => Ok(()),
        }
    }

    fn exit(&mut self, api: &mut dyn GraphicsApi) {
        for slot in self.components.iter_mut().rev() {
            slot.exit(api);
        }
        self.transform.exit(api);
    }
}

impl std::fmt::Debug for GameObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameObject")
            .field("name", &self.name)
            .field("transform", self.transform())
            .field("components", &self.components.iter().map(|slot| slot.get().kind()).collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Mat4, Vec3};
    use crate::render::{HeadlessApi, ObjectKind};
    use crate::scene::{ComponentError, MeshRenderer, Spin};
    use approx::assert_relative_eq;
    use std::any::Any;

    struct Failing;

    impl Component for Failing {
        fn initialize(&mut self, _api: &mut dyn GraphicsApi) -> Result<(), ComponentError> {
            Err(ComponentError::Failed("no texture".to_string()))
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    #[test]
    fn test_component_lookup_by_type() {
        let mut object = GameObject::new("cube")
            .with_component(Spin::new(Vec3::new(0.0, 1.0, 0.0)))
            .with_component(MeshRenderer::new("cube"));

        assert_eq!(object.component_count(), 2);
        assert!(object.component::<MeshRenderer>().is_some());
        assert!(object.component::<Transform>().is_none());

        object.component_mut::<Spin>().unwrap().angular_velocity = Vec3::zeros();
        assert_relative_eq!(object.component::<Spin>().unwrap().angular_velocity, Vec3::zeros());
    }

    #[test]
    fn test_update_applies_component_transform_changes() {
        let mut api = HeadlessApi::new();
        let mut object = GameObject::new("spinner").with_component(Spin::new(Vec3::new(0.0, 1.0, 0.0)));
        object.initialize(&mut api).unwrap();

        object.update(0.5);

        assert!(!object.transform().is_dirty());
        assert_relative_eq!(
            object.transform().transform_matrix(),
            Mat4::from_axis_angle(&Vec3::y_axis(), 0.5),
            epsilon = 1e-6
        );
        object.exit(&mut api);
    }

    #[test]
    fn test_failed_component_rolls_back_earlier_ones() {
        let mut api = HeadlessApi::new();
        let mut object = GameObject::new("broken")
            .with_component(MeshRenderer::new("cube"))
            .with_component(Failing);

        let result = object.initialize(&mut api);

        assert!(matches!(
            result,
            Err(SceneError::ComponentInitialization { ref object, component: "Failing", .. }) if object == "broken"
        ));
        assert_eq!(api.live_objects(ObjectKind::Buffer), 0);
        assert!(!object.is_initialized());
    }

    #[test]
    fn test_render_without_program_reports_object() {
        let mut api = HeadlessApi::new();
        let mut object = GameObject::new("cube").with_component(MeshRenderer::new("cube"));
        object.initialize(&mut api).unwrap();

        let result = {
            let mut ctx = RenderContext::new(&mut api, None);
            object.render(&mut ctx)
        };

        assert!(matches!(result, Err(SceneError::Render { ref object, .. }) if object == "cube"));
        object.exit(&mut api);
    }
}
