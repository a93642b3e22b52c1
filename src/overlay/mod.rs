//! Immediate-mode UI overlay.
//!
//! Wraps a Dear ImGui context and renders its draw lists through the
//! [`GpuBackend`] seam, so the overlay works on both dialects and on the
//! headless backend. The [`Application`](crate::Application) owns at most one
//! overlay and feeds it surface events; user code only sees it through
//! [`Application::draw_overlay`](crate::Application::draw_overlay).
//!
//! Dear ImGui allows a single live context per process.

pub mod shaders;

use std::mem::size_of;
use std::path::PathBuf;

use bytemuck::{Pod, Zeroable};
use imgui::{ConfigFlags, DrawCmd, DrawCmdParams, DrawData, FontSource, TextureId};

use crate::error::{InitError, Result};
use crate::gpu::{
    gl_size, AttribKind, Buffer, BufferTarget, BufferUsage, Capability, GpuBackend, GpuHandle,
    IndexType, Program, RawId, Texture, TextureParams, UniformLocation, VertexArray, VertexAttrib,
};
use crate::platform::Dialect;
use crate::shader::ShaderManager;
use crate::surface::{Key, Modifiers, SurfaceEvent};
use crate::texture::TextureLoader;

/// Interleaved overlay vertex, mirroring `imgui::DrawVert`.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct OverlayVertex {
    pos: [f32; 2],
    uv: [f32; 2],
    col: [u8; 4],
}

impl From<&imgui::DrawVert> for OverlayVertex {
    fn from(v: &imgui::DrawVert) -> Self {
        Self {
            pos: v.pos,
            uv: v.uv,
            col: v.col,
        }
    }
}

#[expect(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
const STRIDE: i32 = size_of::<OverlayVertex>() as i32;

const ATTRIBUTES: [VertexAttrib; 3] = [
    VertexAttrib {
        index: 0,
        components: 2,
        kind: AttribKind::F32,
        stride: STRIDE,
        offset: 0,
    },
    VertexAttrib {
        index: 1,
        components: 2,
        kind: AttribKind::F32,
        stride: STRIDE,
        offset: 8,
    },
    VertexAttrib {
        index: 2,
        components: 4,
        kind: AttribKind::U8Normalized,
        stride: STRIDE,
        offset: 16,
    },
];

const INDEX_TYPE: IndexType = if size_of::<imgui::DrawIdx>() == 2 {
    IndexType::U16
} else {
    IndexType::U32
};

/// GPU objects owned by the overlay.
#[derive(Default)]
struct DeviceObjects {
    program: Option<Program>,
    font_texture: Option<Texture>,
    vertex_array: Option<VertexArray>,
    vertices: Option<Buffer>,
    indices: Option<Buffer>,
    projection: UniformLocation,
    sampler: UniformLocation,
}

impl DeviceObjects {
    fn create(gpu: &dyn GpuBackend, dialect: Dialect, ctx: &mut imgui::Context) -> Result<Self> {
        let mut objects = Self::default();
        if let Err(e) = objects.fill(gpu, dialect, ctx) {
            objects.release(gpu);
            return Err(e);
        }
        Ok(objects)
    }

    fn fill(
        &mut self,
        gpu: &dyn GpuBackend,
        dialect: Dialect,
        ctx: &mut imgui::Context,
    ) -> Result<()> {
        let shaders = ShaderManager::new(gpu, dialect.shader_suffix());
        let (vs, fs) = shaders::sources(dialect);
        let program = shaders.load_program_from_sources(vs, fs)?;
        self.projection = shaders.uniform_location(&program, "uProjection");
        self.sampler = shaders.uniform_location(&program, "uTexture");
        self.program = Some(program);

        let fonts = ctx.fonts();
        let texture = {
            let atlas = fonts.build_rgba32_texture();
            TextureLoader::new(gpu).upload_rgba8(
                atlas.width,
                atlas.height,
                atlas.data,
                &TextureParams::LINEAR_CLAMPED,
            )?
        };
        fonts.tex_id = TextureId::new(texture.id() as usize);
        self.font_texture = Some(texture);

        let vertex_array = VertexArray::create(gpu)?;
        vertex_array.bind(gpu);
        let vertices = Buffer::create(gpu, BufferTarget::Vertex, &[], BufferUsage::Stream)?;
        for attrib in &ATTRIBUTES {
            gpu.vertex_attrib(attrib);
        }
        let indices = Buffer::create(gpu, BufferTarget::Index, &[], BufferUsage::Stream)?;
        gpu.bind_vertex_array(None);

        self.vertex_array = Some(vertex_array);
        self.vertices = Some(vertices);
        self.indices = Some(indices);
        Ok(())
    }

    fn release(&mut self, gpu: &dyn GpuBackend) {
        Buffer::release(gpu, &mut self.indices);
        Buffer::release(gpu, &mut self.vertices);
        VertexArray::release(gpu, &mut self.vertex_array);
        TextureLoader::new(gpu).delete_texture(&mut self.font_texture);
        ShaderManager::new(gpu, "").delete_program(&mut self.program);
    }
}

/// Dear ImGui context plus the GPU objects that draw it.
pub struct UiOverlay {
    ctx: imgui::Context,
    objects: DeviceObjects,
}

impl UiOverlay {
    /// Creates the ImGui context and uploads the font atlas and shaders.
    ///
    /// # Errors
    ///
    /// Returns [`InitError::OverlayInUse`] if another ImGui context is
    /// active in this process, and [`InitError::Overlay`] with the
    /// [`LoadError`](crate::LoadError) of whichever object failed to load;
    /// everything created before it has been released.
    pub fn new(gpu: &dyn GpuBackend, dialect: Dialect) -> std::result::Result<Self, InitError> {
        let mut ctx = imgui::SuspendedContext::create()
            .activate()
            .map_err(|_| InitError::OverlayInUse)?;
        ctx.io_mut().config_flags |= ConfigFlags::NAV_ENABLE_KEYBOARD;
        ctx.set_ini_filename(None::<PathBuf>);
        ctx.set_log_filename(None::<PathBuf>);
        ctx.style_mut().use_dark_colors();
        ctx.fonts()
            .add_font(&[FontSource::DefaultFontData { config: None }]);

        let objects = DeviceObjects::create(gpu, dialect, &mut ctx).map_err(InitError::Overlay)?;
        log::debug!("UI overlay initialized ({dialect:?})");
        Ok(Self { ctx, objects })
    }

    /// Forwards one surface event to ImGui's input state.
    #[expect(clippy::cast_possible_truncation)]
    pub fn handle_event(&mut self, event: &SurfaceEvent) {
        let io = self.ctx.io_mut();
        match *event {
            SurfaceEvent::CursorMoved { x, y } => io.mouse_pos = [x as f32, y as f32],
            SurfaceEvent::MouseButton { button, pressed } => {
                if let Some(down) = io.mouse_down.get_mut(button.index()) {
                    *down = pressed;
                }
            }
            SurfaceEvent::Scroll { x, y } => {
                io.mouse_wheel_h += x as f32;
                io.mouse_wheel += y as f32;
            }
            SurfaceEvent::Text(c) => io.add_input_character(c),
            SurfaceEvent::Key {
                key,
                pressed,
                modifiers,
            } => {
                add_modifiers(io, modifiers);
                if let Some(key) = imgui_key(key) {
                    io.add_key_event(key, pressed);
                }
            }
            _ => {}
        }
    }

    /// Runs one UI frame: `build` declares the widgets, then the resulting
    /// draw lists are rendered over whatever is in the framebuffer.
    ///
    /// `window` is the logical window size and `framebuffer` its size in
    /// pixels; their ratio becomes ImGui's framebuffer scale.
    #[expect(clippy::cast_precision_loss)]
    pub fn frame(
        &mut self,
        gpu: &dyn GpuBackend,
        window: (u32, u32),
        framebuffer: (u32, u32),
        delta_time: f32,
        build: impl FnOnce(&imgui::Ui),
    ) {
        let io = self.ctx.io_mut();
        io.display_size = [window.0 as f32, window.1 as f32];
        io.display_framebuffer_scale = if window.0 > 0 && window.1 > 0 {
            [
                framebuffer.0 as f32 / window.0 as f32,
                framebuffer.1 as f32 / window.1 as f32,
            ]
        } else {
            [1.0, 1.0]
        };
        io.delta_time = delta_time.max(1e-5);

        let ui = self.ctx.new_frame();
        build(ui);
        let draw_data = self.ctx.render();
        render(gpu, &self.objects, draw_data);
    }

    /// Releases every GPU object. The overlay must not be used afterwards.
    pub fn release(&mut self, gpu: &dyn GpuBackend) {
        self.objects.release(gpu);
    }
}

fn add_modifiers(io: &mut imgui::Io, modifiers: Modifiers) {
    io.add_key_event(imgui::Key::ModCtrl, modifiers.ctrl);
    io.add_key_event(imgui::Key::ModShift, modifiers.shift);
    io.add_key_event(imgui::Key::ModAlt, modifiers.alt);
    io.add_key_event(imgui::Key::ModSuper, modifiers.super_key);
}

const LETTERS: [imgui::Key; 26] = {
    use imgui::Key as K;
    [
        K::A, K::B, K::C, K::D, K::E, K::F, K::G, K::H, K::I, K::J, K::K, K::L, K::M, K::N,
        K::O, K::P, K::Q, K::R, K::S, K::T, K::U, K::V, K::W, K::X, K::Y, K::Z,
    ]
};

/// ImGui key for a surface key, if ImGui has one.
fn imgui_key(key: Key) -> Option<imgui::Key> {
    use imgui::Key as K;
    Some(match key {
        Key::Escape => K::Escape,
        Key::Tab => K::Tab,
        Key::Left => K::LeftArrow,
        Key::Right => K::RightArrow,
        Key::Up => K::UpArrow,
        Key::Down => K::DownArrow,
        Key::PageUp => K::PageUp,
        Key::PageDown => K::PageDown,
        Key::Home => K::Home,
        Key::End => K::End,
        Key::Insert => K::Insert,
        Key::Delete => K::Delete,
        Key::Backspace => K::Backspace,
        Key::Space => K::Space,
        Key::Enter => K::Enter,
        Key::KeypadEnter => K::KeypadEnter,
        Key::LeftControl => K::LeftCtrl,
        Key::RightControl => K::RightCtrl,
        Key::LeftShift => K::LeftShift,
        Key::RightShift => K::RightShift,
        Key::LeftAlt => K::LeftAlt,
        Key::RightAlt => K::RightAlt,
        Key::LeftSuper => K::LeftSuper,
        Key::RightSuper => K::RightSuper,
        Key::Letter(c) => {
            let index = u8::try_from(c).ok()?.checked_sub(b'A')?;
            return LETTERS.get(usize::from(index)).copied();
        }
        Key::Other(_) => return None,
    })
}

/// Column-major orthographic projection of the display rectangle.
fn projection(draw_data: &DrawData) -> [f32; 16] {
    let [l, t] = draw_data.display_pos;
    let r = l + draw_data.display_size[0];
    let b = t + draw_data.display_size[1];
    #[rustfmt::skip]
    let m = [
        2.0 / (r - l),     0.0,               0.0,  0.0,
        0.0,               2.0 / (t - b),     0.0,  0.0,
        0.0,               0.0,               -1.0, 0.0,
        (r + l) / (l - r), (t + b) / (b - t), 0.0,  1.0,
    ];
    m
}

/// Converts an ImGui clip rectangle to a GL scissor box `[x, y, w, h]`
/// (origin bottom-left), or `None` if it is empty.
#[expect(clippy::cast_possible_truncation)]
fn scissor_box(
    clip_rect: [f32; 4],
    [ox, oy]: [f32; 2],
    [sx, sy]: [f32; 2],
    fb_height: f32,
) -> Option<[i32; 4]> {
    let min = [(clip_rect[0] - ox) * sx, (clip_rect[1] - oy) * sy];
    let max = [(clip_rect[2] - ox) * sx, (clip_rect[3] - oy) * sy];
    if max[0] <= min[0] || max[1] <= min[1] {
        return None;
    }
    Some([
        min[0] as i32,
        (fb_height - max[1]) as i32,
        (max[0] - min[0]) as i32,
        (max[1] - min[1]) as i32,
    ])
}

fn texture_raw(id: TextureId) -> Option<RawId> {
    u32::try_from(id.id()).ok().and_then(RawId::new)
}

#[expect(clippy::cast_possible_truncation)]
fn render(gpu: &dyn GpuBackend, objects: &DeviceObjects, draw_data: &DrawData) {
    let fb_width = draw_data.display_size[0] * draw_data.framebuffer_scale[0];
    let fb_height = draw_data.display_size[1] * draw_data.framebuffer_scale[1];
    if fb_width <= 0.0 || fb_height <= 0.0 {
        return;
    }
    let (Some(program), Some(vertex_array), Some(vertices), Some(indices)) = (
        &objects.program,
        &objects.vertex_array,
        &objects.vertices,
        &objects.indices,
    ) else {
        return;
    };

    gpu.viewport(0, 0, fb_width as i32, fb_height as i32);
    gpu.set_capability(Capability::Blend, true);
    gpu.set_alpha_blending();
    gpu.set_capability(Capability::CullFace, false);
    gpu.set_capability(Capability::DepthTest, false);
    gpu.set_capability(Capability::ScissorTest, true);

    program.bind(gpu);
    gpu.set_uniform_i32(objects.sampler, 0);
    gpu.set_uniform_mat4(objects.projection, &projection(draw_data));
    vertex_array.bind(gpu);

    for list in draw_data.draw_lists() {
        let vtx: Vec<OverlayVertex> = list.vtx_buffer().iter().map(OverlayVertex::from).collect();
        vertices.update(gpu, BufferTarget::Vertex, bytemuck::cast_slice(&vtx), BufferUsage::Stream);
        indices.update(
            gpu,
            BufferTarget::Index,
            bytemuck::cast_slice(list.idx_buffer()),
            BufferUsage::Stream,
        );

        for cmd in list.commands() {
            let DrawCmd::Elements {
                count,
                cmd_params:
                    DrawCmdParams {
                        clip_rect,
                        texture_id,
                        idx_offset,
                        ..
                    },
            } = cmd
            else {
                continue;
            };
            let Some([x, y, w, h]) = scissor_box(
                clip_rect,
                draw_data.display_pos,
                draw_data.framebuffer_scale,
                fb_height,
            ) else {
                continue;
            };
            gpu.scissor(x, y, w, h);
            gpu.bind_texture(0, texture_raw(texture_id));
            gpu.draw_elements(
                gl_size(count),
                INDEX_TYPE,
                gl_size(idx_offset * INDEX_TYPE.size()),
            );
        }
    }

    gpu.bind_vertex_array(None);
    gpu.use_program(None);
    gpu.set_capability(Capability::ScissorTest, false);
    gpu.set_capability(Capability::Blend, false);
}
