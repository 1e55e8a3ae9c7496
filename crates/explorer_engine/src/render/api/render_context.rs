//! Per-frame render context
//!
//! Bundles the graphics context with the program the engine bound for this
//! frame, so scene objects can issue draws without reaching for global state.

use crate::foundation::math::Mat4;
use crate::render::api::{GraphicsApi, ProgramHandle};
use crate::render::primitives::Mesh;
use crate::render::{RenderError, RenderResult};

/// Name of the model matrix uniform in the engine shaders
pub const MODEL_MATRIX_UNIFORM: &str = "model";

/// Draw-time view of the graphics context
pub struct RenderContext<'a> {
    api: &'a mut dyn GraphicsApi,
    program: Option<ProgramHandle>,
    draw_calls: u32,
}

impl<'a> RenderContext<'a> {
    /// Wrap `api` with `program` as the active program for this frame
    pub fn new(api: &'a mut dyn GraphicsApi, program: Option<ProgramHandle>) -> Self {
        Self {
            api,
            program,
            draw_calls: 0,
        }
    }

    /// Direct access to the graphics context
    pub fn api(&mut self) -> &mut dyn GraphicsApi {
        &mut *self.api
    }

    /// Program bound for this frame
    pub fn active_program(&self) -> Option<ProgramHandle> {
        self.program
    }

    /// Draw `mesh` with `model` as its world matrix
    ///
    /// Drawing without a registered program is a caller error and is reported
    /// as [`RenderError::NoActiveProgram`].
    pub fn draw_mesh(&mut self, mesh: &Mesh, model: &Mat4) -> RenderResult<()> {
        let program = self.program.ok_or(RenderError::NoActiveProgram)?;
        self.api.set_uniform_mat4(program, MODEL_MATRIX_UNIFORM, model)?;
        mesh.render(&mut *self.api)?;
        self.draw_calls += 1;
        Ok(())
    }

    /// Number of draws issued through this context
    pub fn draw_calls(&self) -> u32 {
        self.draw_calls
    }
}
