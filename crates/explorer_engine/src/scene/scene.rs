//! Scenes
//!
//! An ordered list of objects with a shared lifecycle. Insertion order is
//! both update order and draw order.

use crate::render::{GraphicsApi, RenderContext};
use crate::scene::{SceneError, SceneObject};

/// Lifecycle state of a [`Scene`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneState {
    /// Objects added, not yet initialized
    Created,
    /// Every object initialized; updates and draws run
    Active,
    /// An object failed to initialize and the rest were rolled back
    Failed,
    /// Objects exited and dropped
    Exited,
}

/// Ordered collection of scene objects
pub struct Scene {
    name: String,
    objects: Vec<Box<dyn SceneObject>>,
    state: SceneState,
}

impl Scene {
    /// Empty scene
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            objects: Vec::new(),
            state: SceneState::Created,
        }
    }

    /// Builder form of [`Scene::add_object`]
    #[must_use]
    pub fn with_object(mut self, object: impl SceneObject + 'static) -> Self {
        self.add_object(object);
        self
    }

    /// Append an object; it is updated and drawn after those already present
    ///
    /// Objects added to an active scene are not initialized automatically.
    pub fn add_object(&mut self, object: impl SceneObject + 'static) {
        if self.state == SceneState::Active {
            log::warn!("Adding '{}' to active scene '{}' without initializing it", object.name(), self.name);
        }
        self.objects.push(Box::new(object));
    }

    /// Initialize every object in order
    ///
    /// Stops at the first failure, exits the objects already initialized in
    /// reverse order and leaves the scene [`SceneState::Failed`].
    pub fn initialize(&mut self, api: &mut dyn GraphicsApi) -> Result<(), SceneError> {
        if self.state == SceneState::Active {
            log::debug!("Scene '{}' already active", self.name);
            return Ok(());
        }
        log::info!("Initializing scene '{}' ({} objects)", self.name, self.objects.len());

        for index in 0..self.objects.len() {
            if let Err(e) = self.objects[index].initialize(api) {
                log::error!("Scene '{}': {}", self.name, e);
                for object in self.objects[..index].iter_mut().rev() {
                    object.exit(api);
                }
                self.state = SceneState::Failed;
                return Err(e);
            }
        }

        self.state = SceneState::Active;
        Ok(())
    }

    /// Update every object in order; no-op unless active
    pub fn update(&mut self, delta_time: f32) {
        if self.state != SceneState::Active {
            return;
        }
        for object in &mut self.objects {
            object.update(delta_time);
        }
    }

    /// Draw every object in order; no-op unless active
    ///
    /// A failing object is logged and skipped; the first error is returned
    /// after the remaining objects have drawn.
    pub fn render(&self, ctx: &mut RenderContext<'_>) -> Result<(), SceneError> {
        if self.state != SceneState::Active {
            return Ok(());
        }
        let mut first_error = None;
        for object in &self.objects {
            if let Err(e) = object.render(ctx) {
                log::error!("Scene '{}': {}", self.name, e);
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Exit every initialized object, then drop all objects
    pub fn exit(&mut self, api: &mut dyn GraphicsApi) {
        if self.state == SceneState::Active {
            log::info!("Exiting scene '{}'", self.name);
            for object in &mut self.objects {
                object.exit(api);
            }
        }
        self.objects.clear();
        self.state = SceneState::Exited;
    }

    /// Scene name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current lifecycle state
    pub fn state(&self) -> SceneState {
        self.state
    }

    /// Number of objects
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the scene has no objects
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Objects in update order
    pub fn objects(&self) -> impl Iterator<Item = &dyn SceneObject> {
        self.objects.iter().map(|object| object.as_ref())
    }

    /// First object called `name`
    pub fn find_object(&self, name: &str) -> Option<&dyn SceneObject> {
        self.objects().find(|object| object.name() == name)
    }
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("name", &self.name)
            .field("state", &self.state)
            .field("objects", &self.objects.iter().map(|object| object.name().to_string()).collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::HeadlessApi;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Records every lifecycle call into a shared journal
    struct Tracked {
        name: &'static str,
        fail: bool,
        journal: Rc<RefCell<Vec<String>>>,
    }

    impl Tracked {
        fn new(name: &'static str, fail: bool, journal: &Rc<RefCell<Vec<String>>>) -> Self {
            Self {
                name,
                fail,
                journal: Rc::clone(journal),
            }
        }

        fn record(&self, event: &str) {
            self.journal.borrow_mut().push(format!("{}:{}", self.name, event));
        }
    }

    impl SceneObject for Tracked {
        fn name(&self) -> &str {
            self.name
        }

        fn initialize(&mut self, _api: &mut dyn GraphicsApi) -> Result<(), SceneError> {
            self.record("initialize");
            if self.fail {
                return Err(SceneError::ObjectInitialization {
                    object: self.name.to_string(),
                    reason: "scripted failure".to_string(),
                });
            }
            Ok(())
        }

        fn update(&mut self, _delta_time: f32) {
            self.record("update");
        }

        fn render(&self, _ctx: &mut RenderContext<'_>) -> Result<(), SceneError> {
            self.record("render");
            Ok(())
        }

        fn exit(&mut self, _api: &mut dyn GraphicsApi) {
            self.record("exit");
        }
    }

    fn journal() -> Rc<RefCell<Vec<String>>> {
        Rc::new(RefCell::new(Vec::new()))
    }

    #[test]
    fn test_objects_run_in_insertion_order() {
        let events = journal();
        let mut api = HeadlessApi::new();
        let mut scene = Scene::new("ordered")
            .with_object(Tracked::new("a", false, &events))
            .with_object(Tracked::new("b", false, &events));

        scene.initialize(&mut api).unwrap();
        scene.update(0.016);
        {
            let mut ctx = RenderContext::new(&mut api, None);
            scene.render(&mut ctx).unwrap();
        }
        scene.exit(&mut api);

        assert_eq!(
            *events.borrow(),
            [
                "a:initialize", "b:initialize", "a:update", "b:update", "a:render", "b:render", "a:exit", "b:exit"
            ]
        );
        assert!(scene.is_empty());
        assert_eq!(scene.state(), SceneState::Exited);
    }

    #[test]
    fn test_initialize_stops_at_first_failure_and_rolls_back() {
        let events = journal();
        let mut api = HeadlessApi::new();
        let mut scene = Scene::new("broken")
            .with_object(Tracked::new("a", false, &events))
            .with_object(Tracked::new("b", true, &events))
            .with_object(Tracked::new("c", false, &events));

        let result = scene.initialize(&mut api);
        scene.update(0.016);
        {
            let mut ctx = RenderContext::new(&mut api, None);
            scene.render(&mut ctx).unwrap();
        }

        assert!(matches!(result, Err(SceneError::ObjectInitialization { ref object, .. }) if object == "b"));
        assert_eq!(scene.state(), SceneState::Failed);
        assert_eq!(*events.borrow(), ["a:initialize", "b:initialize", "a:exit"]);
    }

    #[test]
    fn test_exit_of_failed_scene_does_not_exit_again() {
        let events = journal();
        let mut api = HeadlessApi::new();
        let mut scene = Scene::new("broken")
            .with_object(Tracked::new("a", false, &events))
            .with_object(Tracked::new("b", true, &events));
        assert!(scene.initialize(&mut api).is_err());

        scene.exit(&mut api);

        assert_eq!(events.borrow().iter().filter(|event| *event == "a:exit").count(), 1);
        assert!(scene.is_empty());
    }

    #[test]
    fn test_find_object() {
        let events = journal();
        let scene = Scene::new("lookup")
            .with_object(Tracked::new("first", false, &events))
            .with_object(Tracked::new("second", false, &events));

        assert_eq!(scene.find_object("second").map(SceneObject::name), Some("second"));
        assert!(scene.find_object("third").is_none());
        assert_eq!(scene.len(), 2);
    }
}
