//! Headless graphics context
//!
//! A CPU-side implementation of [`GraphicsApi`] that tracks every object it
//! hands out. It performs the same bookkeeping a driver would (stale handles
//! are rejected, draws require a linked program and a complete vertex array)
//! and exposes what happened for inspection. Used for tests, tooling and runs
//! without a display.
//!
//! Object storage is a `slotmap`, so a handle to a deleted object stays
//! invalid even after its slot is reused.

use std::any::Any;
use std::collections::HashMap;

use slotmap::{DefaultKey, SlotMap};

use super::{to_key, to_raw};

use crate::foundation::math::{Mat4, Vec4};
use crate::render::api::{
    ApiInfo, BackendResult, BufferHandle, BufferTarget, BufferUsage, ClearFlags, GraphicsApi,
    ProgramHandle, ShaderHandle, ShaderStage, VertexArrayHandle, VertexAttribute,
};
use crate::render::RenderError;

/// Kind of object tracked by the headless context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// Shader stage object
    Shader,
    /// Program object
    Program,
    /// Vertex or index buffer
    Buffer,
    /// Vertex array object
    VertexArray,
}

/// One recorded indexed draw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawCall {
    /// Vertex array drawn
    pub vertex_array: VertexArrayHandle,
    /// Program current at draw time
    pub program: ProgramHandle,
    /// Number of indices drawn
    pub index_count: u32,
}

#[derive(Debug)]
struct ShaderObject {
    stage: ShaderStage,
    compiled: bool,
    interface: StageInterface,
}

#[derive(Debug, Default)]
struct ProgramObject {
    attached: Vec<ShaderHandle>,
    linked_stages: Vec<ShaderStage>,
    linked: bool,
    uniforms: HashMap<String, Mat4>,
    vector_uniforms: HashMap<String, Vec4>,
}

#[derive(Debug)]
struct BufferObject {
    target: BufferTarget,
    data: Vec<u8>,
    usage: Option<BufferUsage>,
}

#[derive(Debug, Default)]
struct VertexArrayObject {
    attributes: Vec<(BufferHandle, VertexAttribute)>,
    index_buffer: Option<BufferHandle>,
}

#[derive(Debug)]
enum GpuObject {
    Shader(ShaderObject),
    Program(ProgramObject),
    Buffer(BufferObject),
    VertexArray(VertexArrayObject),
}

impl GpuObject {
    fn kind(&self) -> ObjectKind {
        match self {
            Self::Shader(_) => ObjectKind::Shader,
            Self::Program(_) => ObjectKind::Program,
            Self::Buffer(_) => ObjectKind::Buffer,
            Self::VertexArray(_) => ObjectKind::VertexArray,
        }
    }
}

/// CPU-side graphics context
#[derive(Debug, Default)]
pub struct HeadlessApi {
    objects: SlotMap<DefaultKey, GpuObject>,
    current_program: Option<ProgramHandle>,
    viewport: (u32, u32),
    clear_count: u64,
    frame_draws: Vec<DrawCall>,
    total_draws: u64,
    pending_allocation_failures: Vec<ObjectKind>,
    pending_link_failure: Option<String>,
}

macro_rules! lookup {
    ($self:ident, $method:ident, $variant:ident, $handle:expr, $what:literal) => {
        match $self.objects.$method(to_key($handle.0)) {
            Some(GpuObject::$variant(object)) => Ok(object),
            _ => Err(RenderError::InvalidHandle(format!(concat!($what, " {}"), $handle.0))),
        }
    };
}

impl HeadlessApi {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next creation of `kind` fail as if the device were out of memory
    pub fn fail_next_allocation(&mut self, kind: ObjectKind) {
        self.pending_allocation_failures.push(kind);
    }

    /// Make the next link fail with `log` as the linker diagnostic
    pub fn fail_next_link(&mut self, log: impl Into<String>) {
        self.pending_link_failure = Some(log.into());
    }

    /// Number of live objects of `kind`
    pub fn live_objects(&self, kind: ObjectKind) -> usize {
        self.objects.values().filter(|object| object.kind() == kind).count()
    }

    /// Whether `shader` names a live shader object
    pub fn is_shader_live(&self, shader: ShaderHandle) -> bool {
        matches!(self.objects.get(to_key(shader.0)), Some(GpuObject::Shader(_)))
    }

    /// Whether `program` names a live program object
    pub fn is_program_live(&self, program: ProgramHandle) -> bool {
        matches!(self.objects.get(to_key(program.0)), Some(GpuObject::Program(_)))
    }

    /// Whether `buffer` names a live buffer
    pub fn is_buffer_live(&self, buffer: BufferHandle) -> bool {
        matches!(self.objects.get(to_key(buffer.0)), Some(GpuObject::Buffer(_)))
    }

    /// Whether `vertex_array` names a live vertex array
    pub fn is_vertex_array_live(&self, vertex_array: VertexArrayHandle) -> bool {
        matches!(self.objects.get(to_key(vertex_array.0)), Some(GpuObject::VertexArray(_)))
    }

    /// Contents last uploaded to `buffer`
    pub fn buffer_data(&self, buffer: BufferHandle) -> Option<&[u8]> {
        match self.objects.get(to_key(buffer.0)) {
            Some(GpuObject::Buffer(object)) => Some(&object.data),
            _ => None,
        }
    }

    /// Usage hint of the last upload to `buffer`
    pub fn buffer_usage(&self, buffer: BufferHandle) -> Option<BufferUsage> {
        match self.objects.get(to_key(buffer.0)) {
            Some(GpuObject::Buffer(object)) => object.usage,
            _ => None,
        }
    }

    /// Attributes bound on `vertex_array`
    pub fn vertex_attributes(&self, vertex_array: VertexArrayHandle) -> Vec<VertexAttribute> {
        match self.objects.get(to_key(vertex_array.0)) {
            Some(GpuObject::VertexArray(object)) => object.attributes.iter().map(|(_, attr)| *attr).collect(),
            _ => Vec::new(),
        }
    }

    /// Last value uploaded to uniform `name` of `program`
    pub fn uniform(&self, program: ProgramHandle, name: &str) -> Option<Mat4> {
        match self.objects.get(to_key(program.0)) {
            Some(GpuObject::Program(object)) => object.uniforms.get(name).copied(),
            _ => None,
        }
    }

    /// Last value uploaded to vector uniform `name` of `program`
    pub fn uniform_vec4(&self, program: ProgramHandle, name: &str) -> Option<Vec4> {
        match self.objects.get(to_key(program.0)) {
            Some(GpuObject::Program(object)) => object.vector_uniforms.get(name).copied(),
            _ => None,
        }
    }

    /// Program currently in use
    pub fn current_program(&self) -> Option<ProgramHandle> {
        self.current_program
    }

    /// Current viewport size
    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    /// Number of framebuffer clears so far
    pub fn clear_count(&self) -> u64 {
        self.clear_count
    }

    /// Draws issued since the last clear
    pub fn frame_draws(&self) -> &[DrawCall] {
        &self.frame_draws
    }

    /// Draws issued over the lifetime of the context
    pub fn total_draws(&self) -> u64 {
        self.total_draws
    }

    fn allocate(&mut self, object: GpuObject) -> BackendResult<u64> {
        let kind = object.kind();
        if let Some(index) = self.pending_allocation_failures.iter().position(|k| *k == kind) {
            self.pending_allocation_failures.remove(index);
            return Err(RenderError::ResourceCreationFailed(format!("out of memory allocating {kind:?}")));
        }
        Ok(to_raw(self.objects.insert(object)))
    }

    fn release(&mut self, raw: u64, kind: ObjectKind) -> BackendResult<()> {
        let key = to_key(raw);
        match self.objects.get(key) {
            Some(object) if object.kind() == kind => {
                self.objects.remove(key);
                Ok(())
            }
            _ => Err(RenderError::InvalidHandle(format!("{kind:?} {raw}"))),
        }
    }
}

/// Source with comments blanked out; line breaks are kept so line numbers hold
fn strip_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    while let Some(c) = chars.next() {
        match (c, chars.peek()) {
            ('/', Some('/')) => {
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut previous = ' ';
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        out.push('\n');
                    }
                    if previous == '*' && skipped == '/' {
                        break;
                    }
                    previous = skipped;
                }
                out.push(' ');
            }
            _ => out.push(c),
        }
    }
    out
}

/// Global `in`/`out` variables declared by one stage
#[derive(Debug, Default)]
struct StageInterface {
    inputs: Vec<String>,
    outputs: Vec<String>,
}

impl StageInterface {
    fn record(&mut self, declaration: &str) {
        let declaration = match (declaration.find("layout"), declaration.find(')')) {
            (Some(start), Some(end)) if start < end => format!("{}{}", &declaration[..start], &declaration[end + 1..]),
            _ => declaration.to_string(),
        };
        let tokens: Vec<&str> = declaration.split_whitespace().collect();
        let Some(name) = tokens.last().and_then(|last| last.split('[').next()) else {
            return;
        };
        if tokens.len() < 3 {
            return;
        }
        if tokens.contains(&"in") {
            self.inputs.push(name.to_string());
        } else if tokens.contains(&"out") {
            self.outputs.push(name.to_string());
        }
    }
}

/// Front-end checks standing in for a GLSL compiler
///
/// Catches a missing `#version`, unbalanced braces, a statement missing its
/// `;` before a closing brace and a missing `main`. Collects the stage's
/// global inputs and outputs for link-time matching.
fn check_glsl(source: &str) -> Result<StageInterface, String> {
    let stripped = strip_comments(source);
    let first_line = stripped.lines().map(str::trim).find(|line| !line.is_empty());
    match first_line {
        None => return Err("ERROR: 0:1: '' : empty shader source".to_string()),
        Some(line) if !line.starts_with("#version") => {
            return Err("ERROR: 0:1: '' : #version required and missing".to_string());
        }
        Some(_) => {}
    }

    let mut interface = StageInterface::default();
    let mut depth: i64 = 0;
    let mut last = '{';
    let mut statement = String::new();
    for (number, line) in stripped.lines().enumerate() {
        if line.trim_start().starts_with('#') {
            continue;
        }
        for c in line.chars() {
            match c {
                '{' => {
                    depth += 1;
                    statement.clear();
                }
                '}' => {
                    if !matches!(last, ';' | '{' | '}') {
                        return Err(format!("ERROR: 0:{}: '}}' : syntax error, expecting ';'", number + 1));
                    }
                    depth -= 1;
                    if depth < 0 {
                        return Err(format!("ERROR: 0:{}: '}}' : syntax error, unexpected closing brace", number + 1));
                    }
                    statement.clear();
                }
                ';' if depth == 0 => {
                    interface.record(&statement);
                    statement.clear();
                }
                _ if depth == 0 => statement.push(c),
                _ => {}
            }
            if !c.is_whitespace() {
                last = c;
            }
        }
        statement.push(' ');
    }
    if depth != 0 || !matches!(last, ';' | '{' | '}') {
        return Err("ERROR: 0:EOF: '' : syntax error, unexpected end of file".to_string());
    }

    if !stripped.contains("void main") {
        return Err("ERROR: 0:EOF: 'main' : function not defined".to_string());
    }
    Ok(interface)
}

impl GraphicsApi for HeadlessApi {
    fn info(&self) -> ApiInfo {
        ApiInfo {
            renderer: "Headless".to_string(),
            version: "4.1 (headless)".to_string(),
        }
    }

    fn create_shader(&mut self, stage: ShaderStage) -> BackendResult<ShaderHandle> {
        self.allocate(GpuObject::Shader(ShaderObject {
            stage,
            compiled: false,
            interface: StageInterface::default(),
        }))
            .map(ShaderHandle)
    }

    fn compile_shader(&mut self, shader: ShaderHandle, source: &str) -> BackendResult<()> {
        let object = lookup!(self, get_mut, Shader, shader, "shader")?;
        match check_glsl(source) {
            Ok(interface) => {
                object.compiled = true;
                object.interface = interface;
                Ok(())
            }
            Err(log) => {
                object.compiled = false;
                Err(RenderError::ShaderCompilation { stage: object.stage, log })
            }
        }
    }

    fn delete_shader(&mut self, shader: ShaderHandle) -> BackendResult<()> {
        self.release(shader.0, ObjectKind::Shader)
    }

    fn create_program(&mut self) -> BackendResult<ProgramHandle> {
        self.allocate(GpuObject::Program(ProgramObject::default())).map(ProgramHandle)
    }

    fn attach_shader(&mut self, program: ProgramHandle, shader: ShaderHandle) -> BackendResult<()> {
        lookup!(self, get, Shader, shader, "shader")?;
        let object = lookup!(self, get_mut, Program, program, "program")?;
        if !object.attached.contains(&shader) {
            object.attached.push(shader);
        }
        Ok(())
    }

    fn link_program(&mut self, program: ProgramHandle) -> BackendResult<()> {
        let attached = lookup!(self, get, Program, program, "program")?.attached.clone();

        let mut stages = Vec::new();
        let mut vertex_outputs: Vec<&str> = Vec::new();
        let mut fragment_inputs: Vec<&str> = Vec::new();
        for shader in attached {
            match self.objects.get(to_key(shader.0)) {
                Some(GpuObject::Shader(object)) if object.compiled => {
                    stages.push(object.stage);
                    match object.stage {
                        ShaderStage::Vertex => vertex_outputs.extend(object.interface.outputs.iter().map(String::as_str)),
                        ShaderStage::Fragment => fragment_inputs.extend(object.interface.inputs.iter().map(String::as_str)),
                    }
                }
                Some(GpuObject::Shader(object)) => {
                    return Err(RenderError::ProgramLink(format!(
                        "ERROR: {} shader {} is not compiled",
                        object.stage, shader.0
                    )));
                }
                _ => return Err(RenderError::ProgramLink(format!("ERROR: attached shader {} was deleted", shader.0))),
            }
        }

        let unmatched = fragment_inputs
            .iter()
            .find(|input| !vertex_outputs.contains(input))
            .map(|input| (*input).to_string());

        let injected = self.pending_link_failure.take();
        let object = lookup!(self, get_mut, Program, program, "program")?;
        object.linked = false;
        if let Some(log) = injected {
            return Err(RenderError::ProgramLink(log));
        }
        for required in [ShaderStage::Vertex, ShaderStage::Fragment] {
            if stages.iter().filter(|stage| **stage == required).count() != 1 {
                return Err(RenderError::ProgramLink(format!(
                    "ERROR: program requires exactly one {required} shader"
                )));
            }
        }
        if let Some(input) = unmatched {
            return Err(RenderError::ProgramLink(format!(
                "ERROR: fragment input '{input}' is not written by the vertex shader"
            )));
        }

        object.linked = true;
        object.linked_stages = stages;
        Ok(())
    }

    fn use_program(&mut self, program: Option<ProgramHandle>) -> BackendResult<()> {
        if let Some(handle) = program {
            let object = lookup!(self, get, Program, handle, "program")?;
            if !object.linked {
                return Err(RenderError::InvalidHandle(format!("program {} is not linked", handle.0)));
            }
        }
        self.current_program = program;
        Ok(())
    }

    fn set_uniform_mat4(&mut self, program: ProgramHandle, name: &str, value: &Mat4) -> BackendResult<()> {
        let object = lookup!(self, get_mut, Program, program, "program")?;
        if !object.linked {
            return Err(RenderError::InvalidHandle(format!("program {} is not linked", program.0)));
        }
        object.uniforms.insert(name.to_string(), *value);
        Ok(())
    }

    fn set_uniform_vec4(&mut self, program: ProgramHandle, name: &str, value: &Vec4) -> BackendResult<()> {
        let object = lookup!(self, get_mut, Program, program, "program")?;
        if !object.linked {
            return Err(RenderError::InvalidHandle(format!("program {} is not linked", program.0)));
        }
        object.vector_uniforms.insert(name.to_string(), *value);
        Ok(())
    }

    fn delete_program(&mut self, program: ProgramHandle) -> BackendResult<()> {
        self.release(program.0, ObjectKind::Program)?;
        if self.current_program == Some(program) {
            self.current_program = None;
        }
        Ok(())
    }

    fn create_buffer(&mut self, target: BufferTarget) -> BackendResult<BufferHandle> {
        self.allocate(GpuObject::Buffer(BufferObject {
            target,
            data: Vec::new(),
            usage: None,
        }))
        .map(BufferHandle)
    }

    fn upload_buffer(&mut self, buffer: BufferHandle, data: &[u8], usage: BufferUsage) -> BackendResult<()> {
        let object = lookup!(self, get_mut, Buffer, buffer, "buffer")?;
        object.data.clear();
        object.data.extend_from_slice(data);
        object.usage = Some(usage);
        Ok(())
    }

    fn delete_buffer(&mut self, buffer: BufferHandle) -> BackendResult<()> {
        self.release(buffer.0, ObjectKind::Buffer)
    }

    fn create_vertex_array(&mut self) -> BackendResult<VertexArrayHandle> {
        self.allocate(GpuObject::VertexArray(VertexArrayObject::default()))
            .map(VertexArrayHandle)
    }

    fn set_vertex_attribute(
        &mut self,
        vertex_array: VertexArrayHandle,
        buffer: BufferHandle,
        attribute: VertexAttribute,
    ) -> BackendResult<()> {
        if lookup!(self, get, Buffer, buffer, "buffer")?.target != BufferTarget::Vertex {
            return Err(RenderError::InvalidHandle(format!("buffer {} is not a vertex buffer", buffer.0)));
        }
        let object = lookup!(self, get_mut, VertexArray, vertex_array, "vertex array")?;
        object.attributes.retain(|(_, existing)| existing.location != attribute.location);
        object.attributes.push((buffer, attribute));
        Ok(())
    }

    fn set_index_buffer(&mut self, vertex_array: VertexArrayHandle, buffer: BufferHandle) -> BackendResult<()> {
        if lookup!(self, get, Buffer, buffer, "buffer")?.target != BufferTarget::Index {
            return Err(RenderError::InvalidHandle(format!("buffer {} is not an index buffer", buffer.0)));
        }
        let object = lookup!(self, get_mut, VertexArray, vertex_array, "vertex array")?;
        object.index_buffer = Some(buffer);
        Ok(())
    }

    fn delete_vertex_array(&mut self, vertex_array: VertexArrayHandle) -> BackendResult<()> {
        self.release(vertex_array.0, ObjectKind::VertexArray)
    }

    fn draw_indexed(&mut self, vertex_array: VertexArrayHandle, index_count: u32) -> BackendResult<()> {
        let program = self.current_program.ok_or(RenderError::NoActiveProgram)?;
        let object = lookup!(self, get, VertexArray, vertex_array, "vertex array")?;
        if object.attributes.is_empty() {
            return Err(RenderError::InvalidHandle(format!(
                "vertex array {} has no attributes",
                vertex_array.0
            )));
        }
        let index_buffer = object.index_buffer.ok_or_else(|| {
            RenderError::InvalidHandle(format!("vertex array {} has no index buffer", vertex_array.0))
        })?;
        let available = lookup!(self, get, Buffer, index_buffer, "index buffer")?.data.len() / std::mem::size_of::<u32>();
        if index_count as usize > available {
            return Err(RenderError::InvalidHandle(format!(
                "draw of {index_count} indices exceeds index buffer of {available}"
            )));
        }

        self.frame_draws.push(DrawCall {
            vertex_array,
            program,
            index_count,
        });
        self.total_draws += 1;
        Ok(())
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
    }

    fn clear(&mut self, flags: ClearFlags, _color: [f32; 4]) {
        if flags.contains(ClearFlags::COLOR) {
            self.frame_draws.clear();
        }
        self.clear_count += 1;
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

    const VERTEX: &str = "#version 410 core\nlayout(location = 0) in vec3 position;\nvoid main() { gl_Position = vec4(position, 1.0); }\n";
    const FRAGMENT: &str = "#version 410 core\nout vec4 color;\nvoid main() { color = vec4(1.0); }\n";

    fn compiled(api: &mut HeadlessApi, stage: ShaderStage, source: &str) -> ShaderHandle {
        let shader = api.create_shader(stage).unwrap();
        api.compile_shader(shader, source).unwrap();
        shader
    }

    #[test]
    fn test_compile_reports_diagnostics() {
        let mut api = HeadlessApi::new();
        let shader = api.create_shader(ShaderStage::Fragment).unwrap();

        let missing_version = api.compile_shader(shader, "void main() {}");
        let unbalanced = api.compile_shader(shader, "#version 410\nvoid main() {");
        let no_main = api.compile_shader(shader, "#version 410\nvoid other() {}");

        assert!(matches!(missing_version, Err(RenderError::ShaderCompilation { stage: ShaderStage::Fragment, .. })));
        assert!(matches!(unbalanced, Err(RenderError::ShaderCompilation { .. })));
        assert!(matches!(no_main, Err(RenderError::ShaderCompilation { log, .. }) if log.contains("main")));
    }

    #[test]
    fn test_comments_are_ignored() {
        let mut api = HeadlessApi::new();
        let shader = api.create_shader(ShaderStage::Vertex).unwrap();

        let result = api.compile_shader(shader, "#version 410 core\n// closes with }\n/* { */\nvoid main() {\n}\n");

        assert!(result.is_ok());
    }

    #[test]
    fn test_missing_semicolon_fails_compile() {
        let mut api = HeadlessApi::new();
        let shader = api.create_shader(ShaderStage::Vertex).unwrap();

        let result = api.compile_shader(shader, "#version 410 core\nvoid main() { gl_Position = vec4(0.0) }\n");

        assert!(matches!(result, Err(RenderError::ShaderCompilation { log, .. }) if log.contains("expecting ';'")));
    }

    #[test]
    fn test_link_matches_stage_interface() {
        let mut api = HeadlessApi::new();
        let vertex = compiled(&mut api, ShaderStage::Vertex, VERTEX);
        let fragment = compiled(
            &mut api,
            ShaderStage::Fragment,
            "#version 410 core\nin vec3 normal;\nout vec4 color;\nvoid main() { color = vec4(normal, 1.0); }\n",
        );
        let program = api.create_program().unwrap();
        api.attach_shader(program, vertex).unwrap();
        api.attach_shader(program, fragment).unwrap();

        let result = api.link_program(program);

        assert!(matches!(result, Err(RenderError::ProgramLink(log)) if log.contains("'normal'")));

        let writer = compiled(
            &mut api,
            ShaderStage::Vertex,
            "#version 410 core\nlayout(location = 0) in vec3 position;\nout vec3 normal;\nvoid main() {\n    normal = position;\n    gl_Position = vec4(position, 1.0);\n}\n",
        );
        let matched = api.create_program().unwrap();
        api.attach_shader(matched, writer).unwrap();
        api.attach_shader(matched, fragment).unwrap();
        assert!(api.link_program(matched).is_ok());
    }

    #[test]
    fn test_link_requires_both_stages() {
        let mut api = HeadlessApi::new();
        let vertex = compiled(&mut api, ShaderStage::Vertex, VERTEX);
        let program = api.create_program().unwrap();
        api.attach_shader(program, vertex).unwrap();

        assert!(matches!(api.link_program(program), Err(RenderError::ProgramLink(_))));
        assert!(api.use_program(Some(program)).is_err());

        let fragment = compiled(&mut api, ShaderStage::Fragment, FRAGMENT);
        api.attach_shader(program, fragment).unwrap();
        api.link_program(program).unwrap();
        api.use_program(Some(program)).unwrap();

        assert_eq!(api.current_program(), Some(program));
    }

    #[test]
    fn test_deleted_handles_stay_invalid() {
        let mut api = HeadlessApi::new();
        let first = api.create_buffer(BufferTarget::Vertex).unwrap();
        api.delete_buffer(first).unwrap();
        let second = api.create_buffer(BufferTarget::Vertex).unwrap();

        assert_ne!(first, second);
        assert!(!api.is_buffer_live(first));
        assert!(api.is_buffer_live(second));
        assert!(matches!(api.delete_buffer(first), Err(RenderError::InvalidHandle(_))));
        assert!(matches!(api.upload_buffer(first, &[0; 4], BufferUsage::Static), Err(RenderError::InvalidHandle(_))));
    }

    #[test]
    fn test_handle_kinds_are_checked() {
        let mut api = HeadlessApi::new();
        let buffer = api.create_buffer(BufferTarget::Vertex).unwrap();

        assert!(api.delete_program(ProgramHandle(buffer.0)).is_err());
        assert!(api.is_buffer_live(buffer));
    }

    #[test]
    fn test_injected_allocation_failure_is_one_shot() {
        let mut api = HeadlessApi::new();
        api.fail_next_allocation(ObjectKind::Buffer);

        assert!(api.create_vertex_array().is_ok());
        assert!(matches!(api.create_buffer(BufferTarget::Index), Err(RenderError::ResourceCreationFailed(_))));
        assert!(api.create_buffer(BufferTarget::Index).is_ok());
    }

    #[test]
    fn test_draw_requires_program_and_indices() {
        let mut api = HeadlessApi::new();
        let vertex_buffer = api.create_buffer(BufferTarget::Vertex).unwrap();
        let index_buffer = api.create_buffer(BufferTarget::Index).unwrap();
        api.upload_buffer(index_buffer, bytemuck::cast_slice(&[0u32, 1, 2]), BufferUsage::Static).unwrap();
        let vao = api.create_vertex_array().unwrap();
        let attribute = VertexAttribute { location: 0, components: 3, stride: 12, offset: 0 };
        api.set_vertex_attribute(vao, vertex_buffer, attribute).unwrap();
        api.set_index_buffer(vao, index_buffer).unwrap();

        assert!(matches!(api.draw_indexed(vao, 3), Err(RenderError::NoActiveProgram)));

        let program = api.create_program().unwrap();
        let vertex = compiled(&mut api, ShaderStage::Vertex, VERTEX);
        let fragment = compiled(&mut api, ShaderStage::Fragment, FRAGMENT);
        api.attach_shader(program, vertex).unwrap();
        api.attach_shader(program, fragment).unwrap();
        api.link_program(program).unwrap();
        api.use_program(Some(program)).unwrap();

        api.draw_indexed(vao, 3).unwrap();
        assert!(api.draw_indexed(vao, 4).is_err());
        assert_eq!(api.frame_draws(), &[DrawCall { vertex_array: vao, program, index_count: 3 }]);

        api.clear(ClearFlags::COLOR | ClearFlags::DEPTH, [0.0; 4]);
        assert!(api.frame_draws().is_empty());
        assert_eq!(api.total_draws(), 1);
    }
}
