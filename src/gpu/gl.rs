//! [`GpuBackend`] over a live OpenGL / OpenGL ES context via [glow].
//!
//! [glow]: https://docs.rs/glow

use glow::{HasContext, PixelUnpackData};

use super::{
    gl_size, AttribKind, BufferTarget, BufferUsage, Capability, ContextId, Filter, GpuBackend,
    IndexType, RawId, ShaderStage, TextureParams, UniformLocation, VertexAttrib, Wrap,
};

/// GL internal format for RGBA8 textures, pre-cast to the `i32` that
/// `tex_image_2d` expects.
#[expect(clippy::cast_possible_wrap)]
const RGBA8_INTERNAL_FORMAT: i32 = glow::RGBA8 as i32;

/// Forwards [`GpuBackend`] calls to a [`glow::Context`].
///
/// # Safety
///
/// The wrapped context must stay current on the thread that owns this value
/// for as long as it is used. `GlfwSurface`
/// guarantees this by making its window's context current before building
/// the backend and never releasing it.
pub struct GlowBackend {
    gl: glow::Context,
    id: ContextId,
}

impl GlowBackend {
    /// Wraps an already-current context.
    ///
    /// # Safety
    ///
    /// `gl` must have been loaded for the context that is current on this
    /// thread, and that context must outlive the returned value.
    pub unsafe fn new(gl: glow::Context) -> Self {
        Self {
            gl,
            id: ContextId::next(),
        }
    }
}

fn shader(raw: RawId) -> glow::Shader {
    glow::NativeShader(raw)
}

fn program(raw: RawId) -> glow::Program {
    glow::NativeProgram(raw)
}

fn texture(raw: RawId) -> glow::Texture {
    glow::NativeTexture(raw)
}

fn buffer(raw: RawId) -> glow::Buffer {
    glow::NativeBuffer(raw)
}

fn vertex_array(raw: RawId) -> glow::VertexArray {
    glow::NativeVertexArray(raw)
}

fn location(location: UniformLocation) -> Option<glow::UniformLocation> {
    location.raw().map(glow::NativeUniformLocation)
}

fn buffer_target(target: BufferTarget) -> u32 {
    match target {
        BufferTarget::Vertex => glow::ARRAY_BUFFER,
        BufferTarget::Index => glow::ELEMENT_ARRAY_BUFFER,
    }
}

fn wrap_mode(wrap: Wrap) -> u32 {
    match wrap {
        Wrap::Repeat => glow::REPEAT,
        Wrap::ClampToEdge => glow::CLAMP_TO_EDGE,
    }
}

fn filter_mode(filter: Filter) -> u32 {
    match filter {
        Filter::Nearest => glow::NEAREST,
        Filter::Linear => glow::LINEAR,
        Filter::LinearMipmapLinear => glow::LINEAR_MIPMAP_LINEAR,
    }
}

fn capability(capability: Capability) -> u32 {
    match capability {
        Capability::DepthTest => glow::DEPTH_TEST,
        Capability::Blend => glow::BLEND,
        Capability::ScissorTest => glow::SCISSOR_TEST,
        Capability::CullFace => glow::CULL_FACE,
    }
}

impl GpuBackend for GlowBackend {
    fn context_id(&self) -> ContextId {
        self.id
    }

    fn version_strings(&self) -> (String, String) {
        unsafe {
            (
                self.gl.get_parameter_string(glow::VERSION),
                self.gl.get_parameter_string(glow::SHADING_LANGUAGE_VERSION),
            )
        }
    }

    fn create_shader(&self, stage: ShaderStage) -> Result<RawId, String> {
        let kind = match stage {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        };
        unsafe { self.gl.create_shader(kind) }.map(|s| s.0)
    }

    fn compile_shader(&self, raw: RawId, source: &str) -> bool {
        unsafe {
            self.gl.shader_source(shader(raw), source);
            self.gl.compile_shader(shader(raw));
            self.gl.get_shader_compile_status(shader(raw))
        }
    }

    fn shader_info_log(&self, raw: RawId) -> String {
        unsafe { self.gl.get_shader_info_log(shader(raw)) }
    }

    fn delete_shader(&self, raw: RawId) {
        unsafe { self.gl.delete_shader(shader(raw)) };
    }

    fn create_program(&self) -> Result<RawId, String> {
        unsafe { self.gl.create_program() }.map(|p| p.0)
    }

    fn attach_shader(&self, prog: RawId, stage: RawId) {
        unsafe { self.gl.attach_shader(program(prog), shader(stage)) };
    }

    fn detach_shader(&self, prog: RawId, stage: RawId) {
        unsafe { self.gl.detach_shader(program(prog), shader(stage)) };
    }

    fn link_program(&self, raw: RawId) -> bool {
        unsafe {
            self.gl.link_program(program(raw));
            self.gl.get_program_link_status(program(raw))
        }
    }

    fn program_info_log(&self, raw: RawId) -> String {
        unsafe { self.gl.get_program_info_log(program(raw)) }
    }

    fn delete_program(&self, raw: RawId) {
        unsafe { self.gl.delete_program(program(raw)) };
    }

    fn use_program(&self, raw: Option<RawId>) {
        unsafe { self.gl.use_program(raw.map(program)) };
    }

    fn uniform_location(&self, raw: RawId, name: &str) -> UniformLocation {
        let found = unsafe { self.gl.get_uniform_location(program(raw), name) };
        UniformLocation::new(found.map(|l| l.0))
    }

    fn set_uniform_i32(&self, loc: UniformLocation, value: i32) {
        if let Some(loc) = location(loc) {
            unsafe { self.gl.uniform_1_i32(Some(&loc), value) };
        }
    }

    fn set_uniform_vec3(&self, loc: UniformLocation, value: [f32; 3]) {
        if let Some(loc) = location(loc) {
            unsafe { self.gl.uniform_3_f32_slice(Some(&loc), &value) };
        }
    }

    fn set_uniform_mat4(&self, loc: UniformLocation, value: &[f32; 16]) {
        if let Some(loc) = location(loc) {
            unsafe { self.gl.uniform_matrix_4_f32_slice(Some(&loc), false, value) };
        }
    }

    fn create_texture(&self) -> Result<RawId, String> {
        unsafe { self.gl.create_texture() }.map(|t| t.0)
    }

    // GL constant values are small enough that the casts are always safe.
    #[expect(clippy::cast_possible_wrap)]
    fn upload_texture_rgba8(
        &self,
        raw: RawId,
        width: u32,
        height: u32,
        pixels: &[u8],
        params: &TextureParams,
    ) {
        let gl = &self.gl;
        unsafe {
            gl.bind_texture(glow::TEXTURE_2D, Some(texture(raw)));
            gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);

            let wrap = wrap_mode(params.wrap) as i32;
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, wrap);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, wrap);
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MIN_FILTER,
                filter_mode(params.min_filter) as i32,
            );
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MAG_FILTER,
                filter_mode(params.mag_filter) as i32,
            );

            gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                RGBA8_INTERNAL_FORMAT,
                gl_size(width),
                gl_size(height),
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                PixelUnpackData::Slice(Some(pixels)),
            );
            if params.mipmaps {
                gl.generate_mipmap(glow::TEXTURE_2D);
            }
            gl.bind_texture(glow::TEXTURE_2D, None);
        }
    }

    fn bind_texture(&self, unit: u32, raw: Option<RawId>) {
        unsafe {
            self.gl.active_texture(glow::TEXTURE0 + unit);
            self.gl.bind_texture(glow::TEXTURE_2D, raw.map(texture));
        }
    }

    fn delete_texture(&self, raw: RawId) {
        unsafe { self.gl.delete_texture(texture(raw)) };
    }

    fn create_buffer(&self) -> Result<RawId, String> {
        unsafe { self.gl.create_buffer() }.map(|b| b.0)
    }

    fn bind_buffer(&self, target: BufferTarget, raw: Option<RawId>) {
        unsafe { self.gl.bind_buffer(buffer_target(target), raw.map(buffer)) };
    }

    fn upload_buffer(&self, raw: RawId, target: BufferTarget, data: &[u8], usage: BufferUsage) {
        let usage = match usage {
            BufferUsage::Static => glow::STATIC_DRAW,
            BufferUsage::Stream => glow::STREAM_DRAW,
        };
        let target = buffer_target(target);
        unsafe {
            self.gl.bind_buffer(target, Some(buffer(raw)));
            self.gl.buffer_data_u8_slice(target, data, usage);
        }
    }

    fn delete_buffer(&self, raw: RawId) {
        unsafe { self.gl.delete_buffer(buffer(raw)) };
    }

    fn create_vertex_array(&self) -> Result<RawId, String> {
        unsafe { self.gl.create_vertex_array() }.map(|v| v.0)
    }

    fn bind_vertex_array(&self, raw: Option<RawId>) {
        unsafe { self.gl.bind_vertex_array(raw.map(vertex_array)) };
    }

    fn vertex_attrib(&self, attrib: &VertexAttrib) {
        let (data_type, normalized) = match attrib.kind {
            AttribKind::F32 => (glow::FLOAT, false),
            AttribKind::U8Normalized => (glow::UNSIGNED_BYTE, true),
        };
        unsafe {
            self.gl.vertex_attrib_pointer_f32(
                attrib.index,
                attrib.components,
                data_type,
                normalized,
                attrib.stride,
                attrib.offset,
            );
            self.gl.enable_vertex_attrib_array(attrib.index);
        }
    }

    fn delete_vertex_array(&self, raw: RawId) {
        unsafe { self.gl.delete_vertex_array(vertex_array(raw)) };
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        unsafe { self.gl.viewport(x, y, width, height) };
    }

    fn scissor(&self, x: i32, y: i32, width: i32, height: i32) {
        unsafe { self.gl.scissor(x, y, width, height) };
    }

    fn set_capability(&self, cap: Capability, enabled: bool) {
        unsafe {
            if enabled {
                self.gl.enable(capability(cap));
            } else {
                self.gl.disable(capability(cap));
            }
        }
    }

    fn set_alpha_blending(&self) {
        unsafe {
            self.gl.blend_equation(glow::FUNC_ADD);
            self.gl.blend_func_separate(
                glow::SRC_ALPHA,
                glow::ONE_MINUS_SRC_ALPHA,
                glow::ONE,
                glow::ONE_MINUS_SRC_ALPHA,
            );
        }
    }

    fn clear(&self, [r, g, b, a]: [f32; 4], depth: bool) {
        let mut mask = glow::COLOR_BUFFER_BIT;
        if depth {
            mask |= glow::DEPTH_BUFFER_BIT;
        }
        unsafe {
            self.gl.clear_color(r, g, b, a);
            self.gl.clear(mask);
        }
    }

    fn draw_elements(&self, count: i32, index_type: IndexType, byte_offset: i32) {
        let element_type = match index_type {
            IndexType::U16 => glow::UNSIGNED_SHORT,
            IndexType::U32 => glow::UNSIGNED_INT,
        };
        unsafe {
            self.gl
                .draw_elements(glow::TRIANGLES, count, element_type, byte_offset);
        }
    }
}
