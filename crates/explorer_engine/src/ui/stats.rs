//! Frame statistics overlay

use crate::foundation::math::{Mat4, Vec3, Vec4};
use crate::foundation::time::FrameTimer;
use crate::render::api::render_context::MODEL_MATRIX_UNIFORM;
use crate::render::{GraphicsApi, Mesh, MeshGeometry, ShaderProgram, ShaderSources, Vertex};
use crate::ui::{
    Anchor, ButtonState, Rect, UIButton, UIElement, UIError, UIOverlay, UIPanel, UIRenderCommand, UIText,
};
use crate::window::{Key, KeyAction, WindowEvent, WindowInfo};

const PANEL_SIZE: (f32, f32) = (220.0, 110.0);
const MARGIN: f32 = 10.0;
const LINE_HEIGHT: f32 = 20.0;

const COLOR_UNIFORM: &str = "color";

const QUAD_VERTEX_SHADER: &str = "#version 410 core
layout(location = 0) in vec3 position;
uniform mat4 model;
void main() {
    gl_Position = model * vec4(position, 1.0);
}
";

const QUAD_FRAGMENT_SHADER: &str = "#version 410 core
uniform vec4 color;
out vec4 frag_color;
void main() {
    frag_color = color;
}
";

/// Clip-space transform taking the unit quad `[0, 1]²` onto `rect`
///
/// Screen space is pixels with y down; clip space is `[-1, 1]²` with y up.
fn quad_transform(rect: &Rect, screen: (f32, f32)) -> Mat4 {
    let left = rect.x / screen.0 * 2.0 - 1.0;
    let top = 1.0 - rect.y / screen.1 * 2.0;
    Mat4::new_translation(&Vec3::new(left, top, 0.0))
        * Mat4::new_nonuniform_scaling(&Vec3::new(rect.width / screen.0 * 2.0, -rect.height / screen.1 * 2.0, 1.0))
}

fn unit_quad() -> Result<MeshGeometry, UIError> {
    let vertices = vec![
        Vertex::new(0.0, 0.0, 0.0),
        Vertex::new(1.0, 0.0, 0.0),
        Vertex::new(1.0, 1.0, 0.0),
        Vertex::new(0.0, 1.0, 0.0),
    ];
    Ok(MeshGeometry::new(vertices, vec![0, 1, 2, 2, 3, 0])?)
}

/// Panel showing FPS and frame time, with a button
///
/// The draw list is rebuilt on every update, the way an immediate-mode UI
/// regenerates its frame. Quads are drawn with a flat-color program; text
/// runs are laid out but there is no glyph atlas to draw them with.
/// Holding Space presses the button.
#[derive(Debug)]
pub struct StatsOverlay {
    window: Option<WindowInfo>,
    panel: UIPanel,
    fps_text: UIText,
    frame_text: UIText,
    button: UIButton,
    commands: Vec<UIRenderCommand>,
    program: ShaderProgram,
    quad: Option<Mesh>,
    frames_submitted: u64,
}

impl Default for StatsOverlay {
    fn default() -> Self {
        Self::new("Explorer")
    }
}

impl StatsOverlay {
    /// Overlay whose panel is titled `title`
    pub fn new(title: impl Into<String>) -> Self {
        let at = |line: f32| UIElement {
            position: (MARGIN * 2.0, MARGIN + LINE_HEIGHT * line),
            size: (PANEL_SIZE.0 - MARGIN * 2.0, LINE_HEIGHT),
            anchor: Anchor::TopLeft,
            visible: true,
        };
        Self {
            window: None,
            panel: UIPanel {
                element: UIElement {
                    position: (MARGIN, MARGIN),
                    size: PANEL_SIZE,
                    anchor: Anchor::TopLeft,
                    visible: true,
                },
                title: title.into(),
                ..UIPanel::default()
            },
            fps_text: UIText {
                element: at(1.0),
                ..UIText::default()
            },
            frame_text: UIText {
                element: at(2.0),
                color: Vec4::new(0.8, 0.8, 0.8, 1.0),
                ..UIText::default()
            },
            button: UIButton {
                element: UIElement {
                    size: (80.0, LINE_HEIGHT + 4.0),
                    ..at(3.3)
                },
                text: "Save".to_string(),
                ..UIButton::default()
            },
            commands: Vec::new(),
            program: ShaderProgram::new(),
            quad: None,
            frames_submitted: 0,
        }
    }

    /// Draw list built by the last update
    pub fn commands(&self) -> &[UIRenderCommand] {
        &self.commands
    }

    /// Text of the FPS line
    pub fn fps_text(&self) -> &str {
        &self.fps_text.text
    }

    /// The "Save" button
    pub fn button(&self) -> &UIButton {
        &self.button
    }

    /// Program the quads are drawn with
    pub fn shader_program(&self) -> &ShaderProgram {
        &self.program
    }

    /// Frames submitted by `render`
    pub fn frames_submitted(&self) -> u64 {
        self.frames_submitted
    }

    fn rebuild(&mut self, screen: (f32, f32)) {
        self.commands.clear();
        if !self.panel.element.visible {
            return;
        }

        let panel_rect = self.panel.element.layout(screen);
        self.commands.push(UIRenderCommand::Quad {
            rect: panel_rect,
            color: self.panel.color,
        });
        self.commands.push(UIRenderCommand::Text {
            rect: panel_rect,
            text: self.panel.title.clone(),
            color: Vec4::new(1.0, 1.0, 1.0, 1.0),
        });
        for text in [&self.fps_text, &self.frame_text] {
            if text.element.visible {
                self.commands.push(UIRenderCommand::Text {
                    rect: text.element.layout(screen),
                    text: text.text.clone(),
                    color: text.color,
                });
            }
        }
        if self.button.element.visible {
            let rect = self.button.element.layout(screen);
            self.commands.push(UIRenderCommand::Quad {
                rect,
                color: self.button.current_color(),
            });
            self.commands.push(UIRenderCommand::Text {
                rect,
                text: self.button.text.clone(),
                color: Vec4::new(1.0, 1.0, 1.0, 1.0),
            });
        }
    }

    fn release(&mut self, api: &mut dyn GraphicsApi) {
        if let Some(mut quad) = self.quad.take() {
            quad.exit(api);
        }
        self.program.destroy(api);
    }
}

impl UIOverlay for StatsOverlay {
    fn initialize(&mut self, window: &WindowInfo, api: &mut dyn GraphicsApi) -> Result<(), UIError> {
        if window.width == 0 || window.height == 0 {
            return Err(UIError::Setup(format!("window '{}' has an empty framebuffer", window.title)));
        }

        self.program = ShaderProgram::new();
        let mut quad = Mesh::from_geometry(unit_quad()?);
        let loaded = self
            .program
            .load(api, &ShaderSources::inline(QUAD_VERTEX_SHADER, QUAD_FRAGMENT_SHADER), false)
            .and_then(|()| quad.initialize(api, "ui_quad"));
        if let Err(e) = loaded {
            quad.exit(api);
            self.program.destroy(api);
            return Err(e.into());
        }

        log::debug!("Stats overlay attached to '{}'", window.title);
        self.quad = Some(quad);
        self.window = Some(window.clone());
        Ok(())
    }

    fn update(&mut self, timer: &FrameTimer) {
        let Some(window) = &self.window else {
            return;
        };
        let screen = (window.width as f32, window.height as f32);
        self.fps_text.text = format!("{:.1} FPS ({:.2} ms)", timer.fps(), timer.frame_ms());
        self.frame_text.text = format!("Frame {}", timer.frame_count());
        self.rebuild(screen);
    }

    fn render(&mut self, api: &mut dyn GraphicsApi) -> Result<(), UIError> {
        let (Some(window), Some(quad)) = (&self.window, &self.quad) else {
            return Err(UIError::NotInitialized);
        };
        let program = self.program.program().ok_or(UIError::NotInitialized)?;
        let screen = (window.width as f32, window.height as f32);

        api.use_program(Some(program))?;
        let mut text_runs = 0;
        for command in &self.commands {
            match command {
                UIRenderCommand::Quad { rect, color } => {
                    api.set_uniform_mat4(program, MODEL_MATRIX_UNIFORM, &quad_transform(rect, screen))?;
                    api.set_uniform_vec4(program, COLOR_UNIFORM, color)?;
                    quad.render(api)?;
                }
                UIRenderCommand::Text { .. } => text_runs += 1,
            }
        }
        log::trace!("Submitted {} UI commands, {} text runs undrawn", self.commands.len(), text_runs);
        self.frames_submitted += 1;
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        if let Some(window) = &mut self.window {
            window.width = width;
            window.height = height;
        }
    }

    fn handle_event(&mut self, event: &WindowEvent) {
        if let WindowEvent::Key { key: Key::Space, action } = event {
            self.button.state = match action {
                KeyAction::Press | KeyAction::Repeat => ButtonState::Pressed,
                KeyAction::Release => ButtonState::Normal,
            };
        }
    }

    fn exit(&mut self, api: &mut dyn GraphicsApi) {
        self.release(api);
        self.window = None;
        self.commands.clear();
    }
}
