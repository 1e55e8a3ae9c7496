//! Component trait and lifecycle guard

use std::any::Any;

use crate::foundation::math::Mat4;
use crate::render::{GraphicsApi, RenderContext, RenderResult};
use crate::scene::{ComponentError, Transform};

/// A unit of behaviour attached to a [`GameObject`](crate::scene::GameObject)
///
/// Every hook except `initialize` has a no-op default, so a component only
/// implements what it uses. Components are driven through a [`ComponentSlot`],
/// which guarantees `initialize` runs once before any `update` or `render`,
/// and that nothing runs after `exit`.
pub trait Component: Any {
    /// Short type name used in logs and errors
    fn kind(&self) -> &'static str {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }

    /// Acquire resources; called once before the first update
    fn initialize(&mut self, api: &mut dyn GraphicsApi) -> Result<(), ComponentError>;

    /// Advance by `delta_time` seconds
    fn update(&mut self, _delta_time: f32) {}

    /// Adjust the owner's transform after `update`
    fn update_transform(&mut self, _delta_time: f32, _transform: &mut Transform) {}

    /// Issue draws with the owner's world matrix
    fn render(&self, _ctx: &mut RenderContext<'_>, _world: &Mat4) -> RenderResult<()> {
        Ok(())
    }

    /// Release resources; called once at teardown
    fn exit(&mut self, _api: &mut dyn GraphicsApi) {}

    /// Downcast support for typed lookup
    fn as_any(&self) -> &dyn Any;

    /// Mutable downcast support for typed lookup
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Lifecycle state of one component instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentState {
    /// Created, not yet initialized
    Uninitialized,
    /// Initialized and receiving updates
    Initialized,
    /// Torn down; never reused
    Exited,
}

/// Owns a component and enforces `Uninitialized → Initialized → Exited`
pub struct ComponentSlot<C: ?Sized = dyn Component> {
    component: Box<C>,
    state: ComponentState,
}

impl<C: Component + ?Sized> ComponentSlot<C> {
    /// Wrap a component that has not been initialized yet
    pub fn new(component: Box<C>) -> Self {
        Self {
            component,
            state: ComponentState::Uninitialized,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> ComponentState {
        self.state
    }

    /// Shared access to the component
    pub fn get(&self) -> &C {
        &self.component
    }

    /// Mutable access to the component
    pub fn get_mut(&mut self) -> &mut C {
        &mut self.component
    }

    /// Initialize once; a second call is a no-op, a call after exit fails
    pub fn initialize(&mut self, api: &mut dyn GraphicsApi) -> Result<(), ComponentError> {
        match self.state {
            ComponentState::Initialized => {
                log::debug!("{} already initialized", self.component.kind());
                Ok(())
            }
            ComponentState::Exited => Err(ComponentError::Exited(self.component.kind())),
            ComponentState::Uninitialized => {
                self.component.initialize(api)?;
                self.state = ComponentState::Initialized;
                Ok(())
            }
        }
    }

    /// Update if initialized
    pub fn update(&mut self, delta_time: f32, transform: Option<&mut Transform>) {
        if !self.is_live("update") {
            return;
        }
        self.component.update(delta_time);
        if let Some(transform) = transform {
            self.component.update_transform(delta_time, transform);
        }
    }

    /// Render if initialized
    pub fn render(&self, ctx: &mut RenderContext<'_>, world: &Mat4) -> RenderResult<()> {
        if !self.is_live("render") {
            return Ok(());
        }
        self.component.render(ctx, world)
    }

    /// Exit if initialized; any other state is a no-op
    pub fn exit(&mut self, api: &mut dyn GraphicsApi) {
        match self.state {
            ComponentState::Initialized => {
                self.component.exit(api);
                self.state = ComponentState::Exited;
            }
            ComponentState::Uninitialized => {
                log::debug!("{} exited before initialize", self.component.kind());
                self.state = ComponentState::Exited;
            }
            ComponentState::Exited => {}
        }
    }

    fn is_live(&self, operation: &str) -> bool {
        if self.state == ComponentState::Initialized {
            return true;
        }
        log::debug!("Skipping {} on {:?} {}", operation, self.state, self.component.kind());
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::HeadlessApi;

    #[derive(Default)]
    struct Counter {
        initialized: u32,
        updates: u32,
        exited: u32,
    }

    impl Component for Counter {
        fn initialize(&mut self, _api: &mut dyn GraphicsApi) -> Result<(), ComponentError> {
            self.initialized += 1;
            Ok(())
        }

        fn update(&mut self, _delta_time: f32) {
            self.updates += 1;
        }

        fn exit(&mut self, _api: &mut dyn GraphicsApi) {
            self.exited += 1;
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    #[test]
    fn test_update_before_initialize_is_ignored() {
        let mut slot = ComponentSlot::new(Box::new(Counter::default()));

        slot.update(0.016, None);

        assert_eq!(slot.get().updates, 0);
        assert_eq!(slot.state(), ComponentState::Uninitialized);
    }

    #[test]
    fn test_lifecycle_runs_each_hook_once() {
        let mut api = HeadlessApi::new();
        let mut slot = ComponentSlot::new(Box::new(Counter::default()));

        slot.initialize(&mut api).unwrap();
        slot.initialize(&mut api).unwrap();
        slot.update(0.016, None);
        slot.exit(&mut api);
        slot.exit(&mut api);
        slot.update(0.016, None);

        let counter = slot.get();
        assert_eq!((counter.initialized, counter.updates, counter.exited), (1, 1, 1));
        assert!(matches!(slot.initialize(&mut api), Err(ComponentError::Exited(_))));
    }

    #[test]
    fn test_kind_is_short_type_name() {
        assert_eq!(Counter::default().kind(), "Counter");
    }
}
