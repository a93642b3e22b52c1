//! The graphics-API seam.
//!
//! [`GpuBackend`] lists exactly the OpenGL calls the loaders, the overlay and
//! the demo issue. [`GlowBackend`] forwards them to a live context through
//! [glow]; [`HeadlessGpu`](crate::headless::HeadlessGpu) records them so the
//! loaders can be tested without a display.
//!
//! Object names cross the seam as [`RawId`]s. Callers normally never see
//! them: the loaders wrap each name in an owning handle from [`handle`].
//!
//! [glow]: https://docs.rs/glow

use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};

mod gl;
pub mod handle;

pub use gl::GlowBackend;
pub use handle::{Buffer, GpuHandle, Program, Texture, VertexArray};

/// A GL object name. Zero is never a valid name, so it is excluded by type.
pub type RawId = NonZeroU32;

/// Identifies one graphics context for the lifetime of the process.
///
/// Every handle remembers the context that created it, so a handle can never
/// be released through a different context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(u64);

impl ContextId {
    /// Allocates a fresh, process-unique id.
    #[must_use]
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Programmable pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// Vertex shader.
    Vertex,
    /// Fragment shader.
    Fragment,
}

impl ShaderStage {
    /// Lower-case stage name used in diagnostics.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Vertex => "vertex",
            Self::Fragment => "fragment",
        }
    }
}

/// Texture coordinate wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wrap {
    /// `GL_REPEAT`.
    Repeat,
    /// `GL_CLAMP_TO_EDGE`.
    ClampToEdge,
}

/// Texture sampling filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    /// `GL_NEAREST`.
    Nearest,
    /// `GL_LINEAR`.
    Linear,
    /// `GL_LINEAR_MIPMAP_LINEAR` (minification only).
    LinearMipmapLinear,
}

/// Sampler state applied when a texture is uploaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureParams {
    /// Wrap mode on both S and T.
    pub wrap: Wrap,
    /// Minification filter.
    pub min_filter: Filter,
    /// Magnification filter.
    pub mag_filter: Filter,
    /// Generate the full mipmap chain after upload.
    pub mipmaps: bool,
}

impl TextureParams {
    /// Repeat wrapping, trilinear minification, linear magnification, mipmaps.
    pub const MIPMAPPED_REPEAT: Self = Self {
        wrap: Wrap::Repeat,
        min_filter: Filter::LinearMipmapLinear,
        mag_filter: Filter::Linear,
        mipmaps: true,
    };

    /// Clamped, linear, no mipmaps. Suited to UI atlases.
    pub const LINEAR_CLAMPED: Self = Self {
        wrap: Wrap::ClampToEdge,
        min_filter: Filter::Linear,
        mag_filter: Filter::Linear,
        mipmaps: false,
    };
}

/// Buffer binding point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferTarget {
    /// `GL_ARRAY_BUFFER`.
    Vertex,
    /// `GL_ELEMENT_ARRAY_BUFFER`.
    Index,
}

/// Expected update frequency of a buffer's contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    /// Uploaded once, drawn many times.
    Static,
    /// Re-uploaded every frame.
    Stream,
}

/// Component type of a vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttribKind {
    /// 32-bit floats.
    F32,
    /// Unsigned bytes normalized to `[0, 1]`.
    U8Normalized,
}

/// Layout of one vertex attribute inside an interleaved vertex buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttrib {
    /// Attribute index (`layout(location = N)`).
    pub index: u32,
    /// Number of components (1..=4).
    pub components: i32,
    /// Component type.
    pub kind: AttribKind,
    /// Byte distance between consecutive vertices.
    pub stride: i32,
    /// Byte offset of the attribute within a vertex.
    pub offset: i32,
}

/// Element type of an index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexType {
    /// `GL_UNSIGNED_SHORT`.
    U16,
    /// `GL_UNSIGNED_INT`.
    U32,
}

impl IndexType {
    /// Size of one index in bytes.
    #[must_use]
    pub fn size(self) -> usize {
        match self {
            Self::U16 => 2,
            Self::U32 => 4,
        }
    }
}

/// Fixed-function toggles used by the demo and the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// `GL_DEPTH_TEST`.
    DepthTest,
    /// `GL_BLEND`.
    Blend,
    /// `GL_SCISSOR_TEST`.
    ScissorTest,
    /// `GL_CULL_FACE`.
    CullFace,
}

/// A uniform location cached after linking.
///
/// An invalid location (the uniform was optimized out or never declared)
/// is kept as-is: writes through it are silently ignored, matching GL's
/// behaviour for location `-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UniformLocation(Option<u32>);

impl UniformLocation {
    /// The location that refers to nothing.
    pub const INVALID: Self = Self(None);

    /// Wraps a location reported by the backend.
    #[must_use]
    pub fn new(location: Option<u32>) -> Self {
        Self(location)
    }

    /// Whether the uniform exists in the program.
    #[must_use]
    pub fn is_valid(self) -> bool {
        self.0.is_some()
    }

    /// Raw location, if valid.
    #[must_use]
    pub fn raw(self) -> Option<u32> {
        self.0
    }
}

/// The graphics calls available to the rest of the crate.
///
/// Every method assumes the backend's context is current on the calling
/// thread; both implementations are single-threaded. Creation methods
/// return the backend's diagnostic string on failure; no other call is
/// checked for GL errors.
pub trait GpuBackend {
    /// The context every object created here belongs to.
    fn context_id(&self) -> ContextId;

    /// `(GL_VERSION, GL_SHADING_LANGUAGE_VERSION)` strings.
    fn version_strings(&self) -> (String, String);

    /// Creates an empty shader object of the given stage.
    ///
    /// # Errors
    ///
    /// Returns the backend's diagnostic when no name could be allocated.
    fn create_shader(&self, stage: ShaderStage) -> Result<RawId, String>;
    /// Sets the source of `shader`, compiles it and reports success.
    fn compile_shader(&self, shader: RawId, source: &str) -> bool;
    /// Compiler log of `shader`.
    fn shader_info_log(&self, shader: RawId) -> String;
    /// Releases a shader object.
    fn delete_shader(&self, shader: RawId);

    /// Creates an empty program object.
    ///
    /// # Errors
    ///
    /// Returns the backend's diagnostic when no name could be allocated.
    fn create_program(&self) -> Result<RawId, String>;
    /// Attaches `shader` to `program`.
    fn attach_shader(&self, program: RawId, shader: RawId);
    /// Detaches `shader` from `program`.
    fn detach_shader(&self, program: RawId, shader: RawId);
    /// Links `program` and reports success.
    fn link_program(&self, program: RawId) -> bool;
    /// Linker log of `program`.
    fn program_info_log(&self, program: RawId) -> String;
    /// Releases a program object.
    fn delete_program(&self, program: RawId);
    /// Makes `program` current, or unbinds with `None`.
    fn use_program(&self, program: Option<RawId>);
    /// Looks up a uniform in a linked program.
    fn uniform_location(&self, program: RawId, name: &str) -> UniformLocation;
    /// Writes an `int`/`sampler2D` uniform of the current program.
    fn set_uniform_i32(&self, location: UniformLocation, value: i32);
    /// Writes a `vec3` uniform of the current program.
    fn set_uniform_vec3(&self, location: UniformLocation, value: [f32; 3]);
    /// Writes a column-major `mat4` uniform of the current program.
    fn set_uniform_mat4(&self, location: UniformLocation, value: &[f32; 16]);

    /// Creates an empty texture object.
    ///
    /// # Errors
    ///
    /// Returns the backend's diagnostic when no name could be allocated.
    fn create_texture(&self) -> Result<RawId, String>;
    /// Uploads tightly packed RGBA8 rows (first row = bottom of the
    /// texture) and applies `params`.
    fn upload_texture_rgba8(
        &self,
        texture: RawId,
        width: u32,
        height: u32,
        pixels: &[u8],
        params: &TextureParams,
    );
    /// Binds `texture` to texture unit `unit`.
    fn bind_texture(&self, unit: u32, texture: Option<RawId>);
    /// Releases a texture object.
    fn delete_texture(&self, texture: RawId);

    /// Creates an empty buffer object.
    ///
    /// # Errors
    ///
    /// Returns the backend's diagnostic when no name could be allocated.
    fn create_buffer(&self) -> Result<RawId, String>;
    /// Binds `buffer` to `target`.
    fn bind_buffer(&self, target: BufferTarget, buffer: Option<RawId>);
    /// Binds `buffer` to `target` and replaces its contents.
    fn upload_buffer(&self, buffer: RawId, target: BufferTarget, data: &[u8], usage: BufferUsage);
    /// Releases a buffer object.
    fn delete_buffer(&self, buffer: RawId);

    /// Creates an empty vertex array object.
    ///
    /// # Errors
    ///
    /// Returns the backend's diagnostic when no name could be allocated.
    fn create_vertex_array(&self) -> Result<RawId, String>;
    /// Binds a vertex array, or unbinds with `None`.
    fn bind_vertex_array(&self, vertex_array: Option<RawId>);
    /// Describes and enables one attribute of the bound vertex array,
    /// sourcing from the bound vertex buffer.
    fn vertex_attrib(&self, attrib: &VertexAttrib);
    /// Releases a vertex array object.
    fn delete_vertex_array(&self, vertex_array: RawId);

    /// Sets the viewport rectangle.
    fn viewport(&self, x: i32, y: i32, width: i32, height: i32);
    /// Sets the scissor rectangle.
    fn scissor(&self, x: i32, y: i32, width: i32, height: i32);
    /// Enables or disables a fixed-function capability.
    fn set_capability(&self, capability: Capability, enabled: bool);
    /// Selects straight-alpha "over" blending.
    fn set_alpha_blending(&self);
    /// Clears the color buffer (and the depth buffer if `depth`).
    fn clear(&self, color: [f32; 4], depth: bool);
    /// Draws indexed triangles from the bound vertex array.
    fn draw_elements(&self, count: i32, index_type: IndexType, byte_offset: i32);
}

/// Converts a size to the `i32` GL expects, saturating instead of wrapping.
pub(crate) fn gl_size(value: impl TryInto<i32>) -> i32 {
    value.try_into().unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_ids_are_unique() {
        let a = ContextId::next();
        let b = ContextId::next();
        assert_ne!(a, b);
    }

    #[test]
    fn invalid_location_reports_invalid() {
        assert!(!UniformLocation::INVALID.is_valid());
        assert!(UniformLocation::new(Some(0)).is_valid());
        assert_eq!(UniformLocation::default(), UniformLocation::INVALID);
    }

    #[test]
    fn gl_size_saturates() {
        assert_eq!(gl_size(800_u32), 800);
        assert_eq!(gl_size(u32::MAX), i32::MAX);
        assert_eq!(gl_size(usize::MAX), i32::MAX);
    }
}
