//! OpenGL context through `glow`
//!
//! Wraps an OpenGL 4.1 core context that is current on the calling thread.
//! Objects are recorded in a slot map next to their native names, so stale
//! or mistyped handles are rejected before they reach the driver. Compile and
//! link failures carry the driver's own info logs.
//!
//! Buffer uploads go through `COPY_WRITE_BUFFER` so they never disturb the
//! element binding of whichever vertex array is bound.

use std::any::Any;
use std::ffi::c_void;
use std::fmt;

use glow::HasContext;
use slotmap::{DefaultKey, SlotMap};

use super::{to_key, to_raw};
use crate::foundation::math::{Mat4, Vec4};
use crate::render::api::{
    ApiInfo, BackendResult, BufferHandle, BufferTarget, BufferUsage, ClearFlags, GraphicsApi,
    ProgramHandle, ShaderHandle, ShaderStage, VertexArrayHandle, VertexAttribute,
};
use crate::render::RenderError;

enum GlObject {
    Shader { native: glow::NativeShader, stage: ShaderStage },
    Program(glow::NativeProgram),
    Buffer { native: glow::NativeBuffer, target: BufferTarget },
    VertexArray { native: glow::NativeVertexArray, indexed: bool },
}

impl GlObject {
    fn kind(&self) -> &'static str {
        match self {
            Self::Shader { .. } => "shader",
            Self::Program(_) => "program",
            Self::Buffer { .. } => "buffer",
            Self::VertexArray { .. } => "vertex array",
        }
    }
}

/// Graphics context backed by a live OpenGL context
pub struct GlApi {
    gl: glow::Context,
    objects: SlotMap<DefaultKey, GlObject>,
    current_program: Option<ProgramHandle>,
}

impl fmt::Debug for GlApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlApi")
            .field("objects", &self.objects.len())
            .field("current_program", &self.current_program)
            .finish()
    }
}

fn gl_stage(stage: ShaderStage) -> u32 {
    match stage {
        ShaderStage::Vertex => glow::VERTEX_SHADER,
        ShaderStage::Fragment => glow::FRAGMENT_SHADER,
    }
}

fn gl_usage(usage: BufferUsage) -> u32 {
    match usage {
        BufferUsage::Static => glow::STATIC_DRAW,
        BufferUsage::Dynamic => glow::DYNAMIC_DRAW,
    }
}

fn clear_mask(flags: ClearFlags) -> u32 {
    let mut mask = 0;
    if flags.contains(ClearFlags::COLOR) {
        mask |= glow::COLOR_BUFFER_BIT;
    }
    if flags.contains(ClearFlags::DEPTH) {
        mask |= glow::DEPTH_BUFFER_BIT;
    }
    mask
}

fn to_gl_int(value: u32, what: &str) -> BackendResult<i32> {
    i32::try_from(value).map_err(|_| RenderError::InvalidHandle(format!("{what} {value} exceeds the GL range")))
}

fn invalid(kind: &str, raw: u64) -> RenderError {
    RenderError::InvalidHandle(format!("{kind} {raw}"))
}

impl GlApi {
    /// Load GL entry points through `loader`
    ///
    /// # Safety
    ///
    /// The context `loader` resolves against must be current on this thread
    /// and must outlive the returned value.
    pub unsafe fn from_loader(loader: impl FnMut(&str) -> *const c_void) -> Self {
        Self {
            gl: glow::Context::from_loader_function(loader),
            objects: SlotMap::new(),
            current_program: None,
        }
    }

    fn shader(&self, handle: ShaderHandle) -> BackendResult<(glow::NativeShader, ShaderStage)> {
        match self.objects.get(to_key(handle.0)) {
            Some(GlObject::Shader { native, stage }) => Ok((*native, *stage)),
            _ => Err(invalid("shader", handle.0)),
        }
    }

    fn program(&self, handle: ProgramHandle) -> BackendResult<glow::NativeProgram> {
        match self.objects.get(to_key(handle.0)) {
            Some(GlObject::Program(native)) => Ok(*native),
            _ => Err(invalid("program", handle.0)),
        }
    }

    fn buffer(&self, handle: BufferHandle) -> BackendResult<(glow::NativeBuffer, BufferTarget)> {
        match self.objects.get(to_key(handle.0)) {
            Some(GlObject::Buffer { native, target }) => Ok((*native, *target)),
            _ => Err(invalid("buffer", handle.0)),
        }
    }

    fn vertex_array(&self, handle: VertexArrayHandle) -> BackendResult<(glow::NativeVertexArray, bool)> {
        match self.objects.get(to_key(handle.0)) {
            Some(GlObject::VertexArray { native, indexed }) => Ok((*native, *indexed)),
            _ => Err(invalid("vertex array", handle.0)),
        }
    }

    /// Remove `raw` from the table if it names an object of `kind`
    fn take(&mut self, raw: u64, kind: &'static str) -> BackendResult<GlObject> {
        let key = to_key(raw);
        match self.objects.get(key) {
            Some(object) if object.kind() == kind => self.objects.remove(key).ok_or_else(|| invalid(kind, raw)),
            _ => Err(invalid(kind, raw)),
        }
    }

    /// Run `upload` with `program` current, restoring the previous binding
    fn with_program(
        &mut self,
        handle: ProgramHandle,
        upload: impl FnOnce(&glow::Context, glow::NativeProgram),
    ) -> BackendResult<()> {
        let native = self.program(handle)?;
        let rebind = self.current_program != Some(handle);
        let previous = match self.current_program {
            Some(current) if rebind => Some(self.program(current)?),
            _ => None,
        };
        unsafe {
            if rebind {
                self.gl.use_program(Some(native));
            }
            upload(&self.gl, native);
            if rebind {
                self.gl.use_program(previous);
            }
        }
        Ok(())
    }

    fn delete_native(&self, object: GlObject) {
        unsafe {
            match object {
                GlObject::Shader { native, .. } => self.gl.delete_shader(native),
                GlObject::Program(native) => self.gl.delete_program(native),
                GlObject::Buffer { native, .. } => self.gl.delete_buffer(native),
                GlObject::VertexArray { native, .. } => self.gl.delete_vertex_array(native),
            }
        }
    }
}

impl GraphicsApi for GlApi {
    fn info(&self) -> ApiInfo {
        unsafe {
            ApiInfo {
                renderer: self.gl.get_parameter_string(glow::RENDERER),
                version: self.gl.get_parameter_string(glow::VERSION),
            }
        }
    }

    fn create_shader(&mut self, stage: ShaderStage) -> BackendResult<ShaderHandle> {
        let native = unsafe { self.gl.create_shader(gl_stage(stage)) }.map_err(RenderError::ResourceCreationFailed)?;
        Ok(ShaderHandle(to_raw(self.objects.insert(GlObject::Shader { native, stage }))))
    }

    fn compile_shader(&mut self, shader: ShaderHandle, source: &str) -> BackendResult<()> {
        let (native, stage) = self.shader(shader)?;
        unsafe {
            self.gl.shader_source(native, source);
            self.gl.compile_shader(native);
            if self.gl.get_shader_compile_status(native) {
                Ok(())
            } else {
                Err(RenderError::ShaderCompilation {
                    stage,
                    log: self.gl.get_shader_info_log(native),
                })
            }
        }
    }

    fn delete_shader(&mut self, shader: ShaderHandle) -> BackendResult<()> {
        let object = self.take(shader.0, "shader")?;
        self.delete_native(object);
        Ok(())
    }

    fn create_program(&mut self) -> BackendResult<ProgramHandle> {
        let native = unsafe { self.gl.create_program() }.map_err(RenderError::ResourceCreationFailed)?;
        Ok(ProgramHandle(to_raw(self.objects.insert(GlObject::Program(native)))))
    }

    fn attach_shader(&mut self, program: ProgramHandle, shader: ShaderHandle) -> BackendResult<()> {
        let (shader, _) = self.shader(shader)?;
        let program = self.program(program)?;
        unsafe { self.gl.attach_shader(program, shader) };
        Ok(())
    }

    fn link_program(&mut self, program: ProgramHandle) -> BackendResult<()> {
        let native = self.program(program)?;
        unsafe {
            self.gl.link_program(native);
            if self.gl.get_program_link_status(native) {
                Ok(())
            } else {
                Err(RenderError::ProgramLink(self.gl.get_program_info_log(native)))
            }
        }
    }

    fn use_program(&mut self, program: Option<ProgramHandle>) -> BackendResult<()> {
        let native = program.map(|handle| self.program(handle)).transpose()?;
        unsafe { self.gl.use_program(native) };
        self.current_program = program;
        Ok(())
    }

    fn set_uniform_mat4(&mut self, program: ProgramHandle, name: &str, value: &Mat4) -> BackendResult<()> {
        self.with_program(program, |gl, native| unsafe {
            match gl.get_uniform_location(native, name) {
                Some(location) => gl.uniform_matrix_4_f32_slice(Some(&location), false, value.as_slice()),
                None => log::trace!("Uniform '{name}' is not active"),
            }
        })
    }

    fn set_uniform_vec4(&mut self, program: ProgramHandle, name: &str, value: &Vec4) -> BackendResult<()> {
        self.with_program(program, |gl, native| unsafe {
            match gl.get_uniform_location(native, name) {
                Some(location) => gl.uniform_4_f32(Some(&location), value.x, value.y, value.z, value.w),
                None => log::trace!("Uniform '{name}' is not active"),
            }
        })
    }

    fn delete_program(&mut self, program: ProgramHandle) -> BackendResult<()> {
        let object = self.take(program.0, "program")?;
        self.delete_native(object);
        if self.current_program == Some(program) {
            self.current_program = None;
        }
        Ok(())
    }

    fn create_buffer(&mut self, target: BufferTarget) -> BackendResult<BufferHandle> {
        let native = unsafe { self.gl.create_buffer() }.map_err(RenderError::ResourceCreationFailed)?;
        Ok(BufferHandle(to_raw(self.objects.insert(GlObject::Buffer { native, target }))))
    }

    fn upload_buffer(&mut self, buffer: BufferHandle, data: &[u8], usage: BufferUsage) -> BackendResult<()> {
        let (native, _) = self.buffer(buffer)?;
        unsafe {
            self.gl.bind_buffer(glow::COPY_WRITE_BUFFER, Some(native));
            self.gl.buffer_data_u8_slice(glow::COPY_WRITE_BUFFER, data, gl_usage(usage));
            self.gl.bind_buffer(glow::COPY_WRITE_BUFFER, None);
        }
        Ok(())
    }

    fn delete_buffer(&mut self, buffer: BufferHandle) -> BackendResult<()> {
        let object = self.take(buffer.0, "buffer")?;
        self.delete_native(object);
        Ok(())
    }

    fn create_vertex_array(&mut self) -> BackendResult<VertexArrayHandle> {
        let native = unsafe { self.gl.create_vertex_array() }.map_err(RenderError::ResourceCreationFailed)?;
        let object = GlObject::VertexArray { native, indexed: false };
        Ok(VertexArrayHandle(to_raw(self.objects.insert(object))))
    }

    fn set_vertex_attribute(
        &mut self,
        vertex_array: VertexArrayHandle,
        buffer: BufferHandle,
        attribute: VertexAttribute,
    ) -> BackendResult<()> {
        let (buffer_native, target) = self.buffer(buffer)?;
        if target != BufferTarget::Vertex {
            return Err(RenderError::InvalidHandle(format!("buffer {} is not a vertex buffer", buffer.0)));
        }
        let (array_native, _) = self.vertex_array(vertex_array)?;
        let size = to_gl_int(attribute.components, "component count")?;
        let stride = to_gl_int(attribute.stride, "stride")?;
        let offset = to_gl_int(attribute.offset, "offset")?;
        unsafe {
            self.gl.bind_vertex_array(Some(array_native));
            self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(buffer_native));
            self.gl.enable_vertex_attrib_array(attribute.location);
            self.gl
                .vertex_attrib_pointer_f32(attribute.location, size, glow::FLOAT, false, stride, offset);
            self.gl.bind_vertex_array(None);
            self.gl.bind_buffer(glow::ARRAY_BUFFER, None);
        }
        Ok(())
    }

    fn set_index_buffer(&mut self, vertex_array: VertexArrayHandle, buffer: BufferHandle) -> BackendResult<()> {
        let (buffer_native, target) = self.buffer(buffer)?;
        if target != BufferTarget::Index {
            return Err(RenderError::InvalidHandle(format!("buffer {} is not an index buffer", buffer.0)));
        }
        let (array_native, _) = self.vertex_array(vertex_array)?;
        unsafe {
            self.gl.bind_vertex_array(Some(array_native));
            self.gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(buffer_native));
            self.gl.bind_vertex_array(None);
        }
        if let Some(GlObject::VertexArray { indexed, .. }) = self.objects.get_mut(to_key(vertex_array.0)) {
            *indexed = true;
        }
        Ok(())
    }

    fn delete_vertex_array(&mut self, vertex_array: VertexArrayHandle) -> BackendResult<()> {
        let object = self.take(vertex_array.0, "vertex array")?;
        self.delete_native(object);
        Ok(())
    }

    fn draw_indexed(&mut self, vertex_array: VertexArrayHandle, index_count: u32) -> BackendResult<()> {
        self.current_program.ok_or(RenderError::NoActiveProgram)?;
        let (native, indexed) = self.vertex_array(vertex_array)?;
        if !indexed {
            return Err(RenderError::InvalidHandle(format!(
                "vertex array {} has no index buffer",
                vertex_array.0
            )));
        }
        let count = to_gl_int(index_count, "index count")?;
        unsafe {
            self.gl.bind_vertex_array(Some(native));
            self.gl.draw_elements(glow::TRIANGLES, count, glow::UNSIGNED_INT, 0);
            self.gl.bind_vertex_array(None);
        }
        Ok(())
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        let width = i32::try_from(width).unwrap_or(i32::MAX);
        let height = i32::try_from(height).unwrap_or(i32::MAX);
        unsafe { self.gl.viewport(0, 0, width, height) };
    }

    fn clear(&mut self, flags: ClearFlags, color: [f32; 4]) {
        unsafe {
            self.gl.clear_color(color[0], color[1], color[2], color[3]);
            self.gl.clear(clear_mask(flags));
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Drop for GlApi {
    fn drop(&mut self) {
        if self.objects.is_empty() {
            return;
        }
        log::warn!("Releasing {} GL objects still alive at shutdown", self.objects.len());
        let objects: Vec<GlObject> = self.objects.drain().map(|(_, object)| object).collect();
        for object in objects {
            self.delete_native(object);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_mask_selects_planes() {
        assert_eq!(clear_mask(ClearFlags::COLOR), glow::COLOR_BUFFER_BIT);
        assert_eq!(
            clear_mask(ClearFlags::COLOR | ClearFlags::DEPTH),
            glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT
        );
        assert_eq!(clear_mask(ClearFlags::empty()), 0);
    }

    #[test]
    fn test_enum_translation() {
        assert_eq!(gl_stage(ShaderStage::Vertex), glow::VERTEX_SHADER);
        assert_eq!(gl_stage(ShaderStage::Fragment), glow::FRAGMENT_SHADER);
        assert_eq!(gl_usage(BufferUsage::Static), glow::STATIC_DRAW);
        assert!(to_gl_int(u32::MAX, "index count").is_err());
        assert_eq!(to_gl_int(36, "index count").unwrap(), 36);
    }
}
