//! Shader program lifecycle
//!
//! A [`ShaderProgram`] walks the compile → link → use → destroy sequence for
//! one vertex/fragment pair:
//!
//! ```text
//! Empty ─┬─ vertex ──► VertexCompiled ──┐
//!        └─ fragment ► FragmentCompiled ┴─► BothCompiled ─ link ─► Linked ─► Destroyed
//! ```
//!
//! Stage handles are consumed by linking whether it succeeds or not. A failed
//! link leaves the already registered program registered and bound.

use std::fs;
use std::path::Path;

use crate::core::ShaderConfig;
use crate::render::api::{GraphicsApi, ProgramHandle, ShaderHandle, ShaderStage};
use crate::render::{RenderError, RenderResult};

/// GLSL source text for both stages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSources {
    /// Vertex stage source
    pub vertex: String,
    /// Fragment stage source
    pub fragment: String,
}

impl ShaderSources {
    /// Sources given directly as strings
    pub fn inline(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            vertex: vertex.into(),
            fragment: fragment.into(),
        }
    }

    /// Read both stage files named by `config` in full
    pub fn from_files(config: &ShaderConfig) -> RenderResult<Self> {
        Ok(Self {
            vertex: read_source(&config.vertex_shader_path)?,
            fragment: read_source(&config.fragment_shader_path)?,
        })
    }
}

fn read_source(path: &Path) -> RenderResult<String> {
    log::debug!("Reading shader source {}", path.display());
    fs::read_to_string(path).map_err(|source| RenderError::ShaderSource {
        path: path.to_path_buf(),
        source,
    })
}

/// Observable state of a [`ShaderProgram`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramState {
    /// Nothing compiled, nothing linked
    Empty,
    /// Only the vertex stage is compiled
    VertexCompiled,
    /// Only the fragment stage is compiled
    FragmentCompiled,
    /// Both stages compiled, ready to link
    BothCompiled,
    /// A linked program is registered and bound
    Linked,
    /// Torn down; no further use
    Destroyed,
}

/// Vertex + fragment program owned by the engine
#[derive(Debug, Default)]
pub struct ShaderProgram {
    vertex: Option<ShaderHandle>,
    fragment: Option<ShaderHandle>,
    program: Option<ProgramHandle>,
    destroyed: bool,
}

impl ShaderProgram {
    /// Empty program
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile and register all of `sources`, then link
    pub fn load(&mut self, api: &mut dyn GraphicsApi, sources: &ShaderSources, erase_if_registered: bool) -> RenderResult<()> {
        self.register_shader(api, ShaderStage::Vertex, &sources.vertex)?;
        self.register_shader(api, ShaderStage::Fragment, &sources.fragment)?;
        self.register_program(api, erase_if_registered)
    }

    /// Compile one stage and keep it for the next link
    ///
    /// A failed compile releases its own handle and leaves every previously
    /// held handle untouched. A successful compile replaces (and deletes) any
    /// earlier handle for the same stage.
    pub fn register_shader(&mut self, api: &mut dyn GraphicsApi, stage: ShaderStage, source: &str) -> RenderResult<()> {
        if self.destroyed {
            return Err(RenderError::ProgramDestroyed);
        }

        let shader = api.create_shader(stage)?;
        if let Err(e) = api.compile_shader(shader, source) {
            log::error!("{e}");
            if let Err(delete_error) = api.delete_shader(shader) {
                log::warn!("Failed to delete rejected {stage} shader: {delete_error}");
            }
            return Err(e);
        }

        let slot = match stage {
            ShaderStage::Vertex => &mut self.vertex,
            ShaderStage::Fragment => &mut self.fragment,
        };
        if let Some(previous) = slot.replace(shader) {
            if let Err(e) = api.delete_shader(previous) {
                log::warn!("Failed to delete replaced {stage} shader: {e}");
            }
        }
        log::debug!("Compiled {stage} shader");
        Ok(())
    }

    /// Link the compiled stages into a program and make it current
    ///
    /// With a program already registered this fails with
    /// [`RenderError::ProgramAlreadyRegistered`] unless `erase_if_registered`
    /// is set, in which case the old program is released once the new one has
    /// linked.
    ///
    /// Order: create, link and bind the new program first; only then delete
    /// the old one. A failed link leaves the old program registered and bound.
    pub fn register_program(&mut self, api: &mut dyn GraphicsApi, erase_if_registered: bool) -> RenderResult<()> {
        if self.destroyed {
            return Err(RenderError::ProgramDestroyed);
        }
        if self.program.is_some() && !erase_if_registered {
            log::warn!("Shader program already registered; keeping the existing program");
            return Err(RenderError::ProgramAlreadyRegistered);
        }
        let vertex = self.vertex.ok_or(RenderError::MissingShaderStage(ShaderStage::Vertex))?;
        let fragment = self.fragment.ok_or(RenderError::MissingShaderStage(ShaderStage::Fragment))?;

        let program = api.create_program()?;
        let linked = link_and_bind(api, program, vertex, fragment);
        self.release_stages(api);

        if let Err(e) = linked {
            log::error!("{e}");
            if let Err(delete_error) = api.delete_program(program) {
                log::warn!("Failed to delete unlinked program: {delete_error}");
            }
            if let Some(current) = self.program {
                if let Err(rebind_error) = api.use_program(Some(current)) {
                    log::warn!("Failed to rebind previous program: {rebind_error}");
                }
            }
            return Err(e);
        }

        if let Some(previous) = self.program.replace(program) {
            if let Err(e) = api.delete_program(previous) {
                log::warn!("Failed to delete replaced program: {e}");
            }
        }
        log::info!("Shader program linked");
        Ok(())
    }

    /// Currently registered program
    pub fn program(&self) -> Option<ProgramHandle> {
        self.program
    }

    /// Whether a linked program is registered
    pub fn is_registered(&self) -> bool {
        self.program.is_some()
    }

    /// Current lifecycle state
    pub fn state(&self) -> ProgramState {
        if self.destroyed {
            return ProgramState::Destroyed;
        }
        if self.program.is_some() {
            return ProgramState::Linked;
        }
        match (self.vertex, self.fragment) {
            (None, None) => ProgramState::Empty,
            (Some(_), None) => ProgramState::VertexCompiled,
            (None, Some(_)) => ProgramState::FragmentCompiled,
            (Some(_), Some(_)) => ProgramState::BothCompiled,
        }
    }

    /// Release every handle still held; safe to call in any state
    pub fn destroy(&mut self, api: &mut dyn GraphicsApi) {
        self.release_stages(api);
        if let Some(program) = self.program.take() {
            if api.use_program(None).is_err() {
                log::warn!("Failed to unbind shader program");
            }
            if let Err(e) = api.delete_program(program) {
                log::warn!("Failed to delete shader program: {e}");
            }
        }
        if !self.destroyed {
            log::debug!("Shader program destroyed");
        }
        self.destroyed = true;
    }

    fn release_stages(&mut self, api: &mut dyn GraphicsApi) {
        for (stage, slot) in [(ShaderStage::Vertex, &mut self.vertex), (ShaderStage::Fragment, &mut self.fragment)] {
            if let Some(shader) = slot.take() {
                if let Err(e) = api.delete_shader(shader) {
                    log::warn!("Failed to delete {stage} shader: {e}");
                }
            }
        }
    }
}

fn link_and_bind(
    api: &mut dyn GraphicsApi,
    program: ProgramHandle,
    vertex: ShaderHandle,
    fragment: ShaderHandle,
) -> RenderResult<()> {
    api.attach_shader(program, vertex)?;
    api.attach_shader(program, fragment)?;
    api.link_program(program)?;
    api.use_program(Some(program))
}

impl Drop for ShaderProgram {
    fn drop(&mut self) {
        if self.vertex.is_some() || self.fragment.is_some() || self.program.is_some() {
            log::warn!("ShaderProgram dropped without destroy; GPU handles leaked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backends::{HeadlessApi, ObjectKind};

    const VERTEX: &str = "#version 410 core\nlayout(location = 0) in vec3 position;\nuniform mat4 model;\nvoid main() {\n    gl_Position = model * vec4(position, 1.0);\n}\n";
    const FRAGMENT: &str = "#version 410 core\nout vec4 color;\nvoid main() {\n    color = vec4(1.0, 0.5, 0.2, 1.0);\n}\n";
    const BROKEN: &str = "#version 410 core\nvoid main() {\n";

    fn sources() -> ShaderSources {
        ShaderSources::inline(VERTEX, FRAGMENT)
    }

    #[test]
    fn test_states_follow_registration() {
        let mut api = HeadlessApi::new();
        let mut shader = ShaderProgram::new();
        assert_eq!(shader.state(), ProgramState::Empty);

        shader.register_shader(&mut api, ShaderStage::Fragment, FRAGMENT).unwrap();
        assert_eq!(shader.state(), ProgramState::FragmentCompiled);
        shader.register_shader(&mut api, ShaderStage::Vertex, VERTEX).unwrap();
        assert_eq!(shader.state(), ProgramState::BothCompiled);
        shader.register_program(&mut api, false).unwrap();
        assert_eq!(shader.state(), ProgramState::Linked);

        assert_eq!(api.current_program(), shader.program());
        assert_eq!(api.live_objects(ObjectKind::Shader), 0);

        shader.destroy(&mut api);
        assert_eq!(shader.state(), ProgramState::Destroyed);
    }

    #[test]
    fn test_link_requires_both_stages() {
        let mut api = HeadlessApi::new();
        let mut shader = ShaderProgram::new();
        shader.register_shader(&mut api, ShaderStage::Vertex, VERTEX).unwrap();

        let result = shader.register_program(&mut api, false);

        assert!(matches!(result, Err(RenderError::MissingShaderStage(ShaderStage::Fragment))));
        assert_eq!(shader.state(), ProgramState::VertexCompiled);
        shader.destroy(&mut api);
    }

    #[test]
    fn test_reregistration_without_erase_keeps_program() {
        let mut api = HeadlessApi::new();
        let mut shader = ShaderProgram::new();
        shader.load(&mut api, &sources(), false).unwrap();
        let previous = shader.program();

        let result = shader.load(&mut api, &sources(), false);

        assert!(matches!(result, Err(RenderError::ProgramAlreadyRegistered)));
        assert_eq!(shader.program(), previous);
        assert_eq!(api.current_program(), previous);
        assert_eq!(api.live_objects(ObjectKind::Program), 1);
        shader.destroy(&mut api);
    }

    #[test]
    fn test_reregistration_with_erase_replaces_program() {
        let mut api = HeadlessApi::new();
        let mut shader = ShaderProgram::new();
        shader.load(&mut api, &sources(), false).unwrap();
        let previous = shader.program().unwrap();

        shader.load(&mut api, &sources(), true).unwrap();

        let replacement = shader.program().unwrap();
        assert_ne!(replacement, previous);
        assert!(!api.is_program_live(previous));
        assert_eq!(api.current_program(), Some(replacement));
        assert_eq!(api.live_objects(ObjectKind::Program), 1);
        assert_eq!(api.live_objects(ObjectKind::Shader), 0);
        shader.destroy(&mut api);
    }

    #[test]
    fn test_compile_failure_leaves_other_stage() {
        let mut api = HeadlessApi::new();
        let mut shader = ShaderProgram::new();
        shader.register_shader(&mut api, ShaderStage::Vertex, VERTEX).unwrap();

        let result = shader.register_shader(&mut api, ShaderStage::Fragment, BROKEN);

        assert!(matches!(result, Err(RenderError::ShaderCompilation { stage: ShaderStage::Fragment, .. })));
        assert_eq!(shader.state(), ProgramState::VertexCompiled);
        assert_eq!(api.live_objects(ObjectKind::Shader), 1);
        shader.destroy(&mut api);
    }

    #[test]
    fn test_replaced_stage_is_deleted() {
        let mut api = HeadlessApi::new();
        let mut shader = ShaderProgram::new();

        shader.register_shader(&mut api, ShaderStage::Vertex, VERTEX).unwrap();
        shader.register_shader(&mut api, ShaderStage::Vertex, VERTEX).unwrap();

        assert_eq!(api.live_objects(ObjectKind::Shader), 1);
        shader.destroy(&mut api);
        assert_eq!(api.live_objects(ObjectKind::Shader), 0);
    }

    #[test]
    fn test_link_failure_keeps_previous_program() {
        let mut api = HeadlessApi::new();
        let mut shader = ShaderProgram::new();
        shader.load(&mut api, &sources(), false).unwrap();
        let previous = shader.program();

        api.fail_next_link("ERROR: varying 'v_color' not written by vertex shader");
        let result = shader.load(&mut api, &sources(), true);

        assert!(matches!(result, Err(RenderError::ProgramLink(log)) if log.contains("v_color")));
        assert_eq!(shader.program(), previous);
        assert_eq!(api.current_program(), previous);
        assert_eq!(api.live_objects(ObjectKind::Program), 1);
        assert_eq!(api.live_objects(ObjectKind::Shader), 0);
        shader.destroy(&mut api);
    }

    #[test]
    fn test_destroy_is_idempotent_and_final() {
        let mut api = HeadlessApi::new();
        let mut shader = ShaderProgram::new();
        shader.load(&mut api, &sources(), false).unwrap();

        shader.destroy(&mut api);
        shader.destroy(&mut api);

        assert_eq!(api.live_objects(ObjectKind::Program), 0);
        assert_eq!(api.current_program(), None);
        assert!(matches!(shader.load(&mut api, &sources(), true), Err(RenderError::ProgramDestroyed)));
        assert_eq!(api.live_objects(ObjectKind::Shader), 0);
    }

    #[test]
    fn test_sources_from_files() {
        let dir = std::env::temp_dir().join(format!("explorer_shader_test_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let vertex_path = dir.join("vertex_shader.glsl");
        let fragment_path = dir.join("fragment_shader.glsl");
        std::fs::write(&vertex_path, VERTEX).unwrap();
        std::fs::write(&fragment_path, FRAGMENT).unwrap();

        let loaded = ShaderSources::from_files(&ShaderConfig::new(&vertex_path, &fragment_path)).unwrap();
        let missing = ShaderSources::from_files(&ShaderConfig::new(dir.join("nope.glsl"), &fragment_path));

        assert_eq!(loaded, sources());
        assert!(matches!(missing, Err(RenderError::ShaderSource { .. })));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
