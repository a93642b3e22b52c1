//! Display-less implementations of [`GpuBackend`], [`Surface`] and
//! [`FrameHost`].
//!
//! [`HeadlessGpu`] keeps every object it is asked to create in memory, runs a
//! small structural GLSL check in place of a compiler, and exposes what was
//! uploaded so tests can read it back. [`HeadlessSurface`] supplies a
//! manually driven clock and event queue; a [`HeadlessProbe`] obtained from
//! it keeps working after the surface has been moved into an
//! [`Application`](crate::Application).
//!
//! Everything here is single-threaded (`Rc`/`RefCell`), like the contexts it
//! stands in for.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::rc::Rc;

use crate::gpu::{
    BufferTarget, BufferUsage, Capability, ContextId, GpuBackend, IndexType, RawId, ShaderStage,
    TextureParams, UniformLocation, VertexAttrib,
};
use crate::platform::FrameHost;
use crate::surface::{Surface, SurfaceEvent};

/// Number of live objects of each kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObjectCounts {
    /// Shader stage objects.
    pub shaders: usize,
    /// Program objects.
    pub programs: usize,
    /// Texture objects.
    pub textures: usize,
    /// Buffer objects.
    pub buffers: usize,
    /// Vertex array objects.
    pub vertex_arrays: usize,
}

impl ObjectCounts {
    /// Sum over all kinds.
    #[must_use]
    pub fn total(&self) -> usize {
        self.shaders + self.programs + self.textures + self.buffers + self.vertex_arrays
    }
}

/// What was last uploaded to a texture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureSnapshot {
    /// Width of level 0.
    pub width: u32,
    /// Height of level 0.
    pub height: u32,
    /// RGBA8 rows of level 0, bottom row first.
    pub pixels: Vec<u8>,
    /// Sampler state applied with the upload.
    pub params: TextureParams,
    /// Number of mip levels, including level 0.
    pub mip_levels: u32,
}

/// A value written to a uniform.
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    /// `int` / sampler.
    I32(i32),
    /// `vec3`.
    Vec3([f32; 3]),
    /// `mat4`, column-major.
    Mat4([f32; 16]),
}

/// One recorded `draw_elements` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawCall {
    /// Program in use.
    pub program: Option<u32>,
    /// Texture bound to unit 0.
    pub texture: Option<u32>,
    /// Index count.
    pub count: i32,
    /// Index element type.
    pub index_type: IndexType,
    /// Byte offset into the index buffer.
    pub byte_offset: i32,
    /// Scissor rectangle, if the scissor test was enabled.
    pub scissor: Option<[i32; 4]>,
}

#[derive(Debug)]
struct ShaderObject {
    stage: ShaderStage,
    compiled: bool,
    log: String,
    decls: Declarations,
}

#[derive(Debug, Default, Clone)]
struct Declarations {
    inputs: Vec<String>,
    outputs: Vec<String>,
    uniforms: Vec<String>,
}

#[derive(Debug, Default)]
struct ProgramObject {
    attached: Vec<u32>,
    linked: bool,
    log: String,
    uniforms: Vec<String>,
}

#[derive(Debug, Default)]
struct GpuState {
    next_name: u32,
    fail_allocations: bool,
    shaders: HashMap<u32, ShaderObject>,
    programs: HashMap<u32, ProgramObject>,
    textures: HashMap<u32, Option<TextureSnapshot>>,
    buffers: HashMap<u32, Vec<u8>>,
    vertex_arrays: HashSet<u32>,
    current_program: Option<u32>,
    bound_vertex_buffer: Option<u32>,
    bound_index_buffer: Option<u32>,
    bound_vertex_array: Option<u32>,
    bound_textures: BTreeMap<u32, u32>,
    uniforms: HashMap<(u32, u32), UniformValue>,
    capabilities: HashSet<&'static str>,
    viewport: [i32; 4],
    scissor: [i32; 4],
    clears: usize,
    draws: Vec<DrawCall>,
    invalid_deletes: usize,
}

impl GpuState {
    fn allocate(&mut self) -> Result<RawId, String> {
        if self.fail_allocations {
            return Err("out of object names".to_owned());
        }
        self.next_name += 1;
        RawId::new(self.next_name).ok_or_else(|| "object names exhausted".to_owned())
    }

    fn invalid_delete(&mut self, kind: &str, name: RawId) {
        log::warn!("headless: delete of unknown {kind} {name}");
        self.invalid_deletes += 1;
    }
}

/// A recording, display-less [`GpuBackend`].
///
/// Cloning yields another view of the same context.
#[derive(Debug, Clone)]
pub struct HeadlessGpu {
    id: ContextId,
    state: Rc<RefCell<GpuState>>,
}

impl Default for HeadlessGpu {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessGpu {
    /// A fresh context with no objects.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: ContextId::next(),
            state: Rc::default(),
        }
    }

    /// Live object counts.
    #[must_use]
    pub fn live_objects(&self) -> ObjectCounts {
        let state = self.state.borrow();
        ObjectCounts {
            shaders: state.shaders.len(),
            programs: state.programs.len(),
            textures: state.textures.len(),
            buffers: state.buffers.len(),
            vertex_arrays: state.vertex_arrays.len(),
        }
    }

    /// Makes every subsequent `create_*` call fail (or succeed again).
    pub fn fail_allocations(&self, fail: bool) {
        self.state.borrow_mut().fail_allocations = fail;
    }

    /// Contents of texture `id`, if it exists and has been uploaded.
    #[must_use]
    pub fn texture(&self, id: u32) -> Option<TextureSnapshot> {
        self.state.borrow().textures.get(&id).cloned().flatten()
    }

    /// Contents of buffer `id`.
    #[must_use]
    pub fn buffer_contents(&self, id: u32) -> Option<Vec<u8>> {
        self.state.borrow().buffers.get(&id).cloned()
    }

    /// Whether program `id` exists and linked successfully.
    #[must_use]
    pub fn is_linked(&self, id: u32) -> bool {
        self.state
            .borrow()
            .programs
            .get(&id)
            .is_some_and(|p| p.linked)
    }

    /// Last value written to uniform `name` of program `program`.
    #[must_use]
    pub fn uniform_value(&self, program: u32, name: &str) -> Option<UniformValue> {
        let state = self.state.borrow();
        let index = state.programs.get(&program)?.uniforms.iter().position(|u| u == name)?;
        let location = u32::try_from(index).ok()?;
        state.uniforms.get(&(program, location)).cloned()
    }

    /// Program made current by the last `use_program`.
    #[must_use]
    pub fn current_program(&self) -> Option<u32> {
        self.state.borrow().current_program
    }

    /// Texture bound to `unit`.
    #[must_use]
    pub fn bound_texture(&self, unit: u32) -> Option<u32> {
        self.state.borrow().bound_textures.get(&unit).copied()
    }

    /// Buffer bound to `target`.
    #[must_use]
    pub fn bound_buffer(&self, target: BufferTarget) -> Option<u32> {
        let state = self.state.borrow();
        match target {
            BufferTarget::Vertex => state.bound_vertex_buffer,
            BufferTarget::Index => state.bound_index_buffer,
        }
    }

    /// Currently bound vertex array.
    #[must_use]
    pub fn bound_vertex_array(&self) -> Option<u32> {
        self.state.borrow().bound_vertex_array
    }

    /// Current viewport `[x, y, width, height]`.
    #[must_use]
    pub fn viewport(&self) -> [i32; 4] {
        self.state.borrow().viewport
    }

    /// Whether a capability is currently enabled.
    #[must_use]
    pub fn is_enabled(&self, capability: Capability) -> bool {
        self.state
            .borrow()
            .capabilities
            .contains(capability_name(capability))
    }

    /// Number of `clear` calls so far.
    #[must_use]
    pub fn clear_count(&self) -> usize {
        self.state.borrow().clears
    }

    /// Every draw call recorded so far.
    #[must_use]
    pub fn draw_calls(&self) -> Vec<DrawCall> {
        self.state.borrow().draws.clone()
    }

    /// Deletes that named an object which did not exist.
    #[must_use]
    pub fn invalid_deletes(&self) -> usize {
        self.state.borrow().invalid_deletes
    }
}

fn capability_name(capability: Capability) -> &'static str {
    match capability {
        Capability::DepthTest => "depth_test",
        Capability::Blend => "blend",
        Capability::ScissorTest => "scissor_test",
        Capability::CullFace => "cull_face",
    }
}

/// Structural stand-in for a GLSL compiler.
///
/// Accepts a source when it starts with a `#version` directive, has balanced
/// braces, defines `main` and contains no `#error` directive. Collects the
/// `in`/`out`/`uniform` declarations for the link step.
fn check_glsl(source: &str) -> Result<Declarations, String> {
    let mut lines = source.lines().enumerate().filter(|(_, l)| !l.trim().is_empty());
    match lines.next() {
        Some((_, first)) if first.trim_start().starts_with("#version") => {}
        Some((n, _)) => {
            return Err(format!(
                "0:{}: error: #version directive must come first",
                n + 1
            ));
        }
        None => return Err("0:0: error: empty shader source".to_owned()),
    }

    let mut depth = 0_i64;
    let mut decls = Declarations::default();
    for (n, line) in source.lines().enumerate() {
        let trimmed = line.trim();
        if let Some(rest) = trimmed.strip_prefix("#error") {
            return Err(format!("0:{}: error: #error{rest}", n + 1));
        }
        for c in trimmed.chars() {
            match c {
                '{' => depth += 1,
                '}' => depth -= 1,
                _ => {}
            }
            if depth < 0 {
                return Err(format!("0:{}: error: syntax error, unexpected '}}'", n + 1));
            }
        }
        collect_declaration(trimmed, &mut decls);
    }
    if depth != 0 {
        return Err("0:0: error: syntax error, unexpected end of file".to_owned());
    }
    if !source.contains("void main") {
        return Err("0:0: error: no definition of main".to_owned());
    }
    Ok(decls)
}

fn collect_declaration(line: &str, decls: &mut Declarations) {
    let line = match line.strip_prefix("layout") {
        Some(rest) => rest.split_once(')').map_or("", |(_, tail)| tail.trim()),
        None => line,
    };
    let Some(statement) = line.strip_suffix(';') else {
        return;
    };
    let tokens: Vec<&str> = statement.split_whitespace().collect();
    if tokens.len() < 3 {
        return;
    }
    let Some(name) = tokens.last().map(|t| t.split('[').next().unwrap_or(t).to_owned()) else {
        return;
    };
    match tokens[0] {
        "in" => decls.inputs.push(name),
        "out" => decls.outputs.push(name),
        "uniform" => decls.uniforms.push(name),
        _ => {}
    }
}

impl GpuBackend for HeadlessGpu {
    fn context_id(&self) -> ContextId {
        self.id
    }

    fn version_strings(&self) -> (String, String) {
        ("headless".to_owned(), "headless".to_owned())
    }

    fn create_shader(&self, stage: ShaderStage) -> Result<RawId, String> {
        let mut state = self.state.borrow_mut();
        let name = state.allocate()?;
        state.shaders.insert(
            name.get(),
            ShaderObject {
                stage,
                compiled: false,
                log: String::new(),
                decls: Declarations::default(),
            },
        );
        Ok(name)
    }

    fn compile_shader(&self, shader: RawId, source: &str) -> bool {
        let mut state = self.state.borrow_mut();
        let Some(object) = state.shaders.get_mut(&shader.get()) else {
            return false;
        };
        match check_glsl(source) {
            Ok(decls) => {
                object.compiled = true;
                object.log.clear();
                object.decls = decls;
            }
            Err(log) => {
                object.compiled = false;
                object.log = log;
            }
        }
        object.compiled
    }

    fn shader_info_log(&self, shader: RawId) -> String {
        self.state
            .borrow()
            .shaders
            .get(&shader.get())
            .map(|s| s.log.clone())
            .unwrap_or_default()
    }

    fn delete_shader(&self, shader: RawId) {
        let mut state = self.state.borrow_mut();
        if state.shaders.remove(&shader.get()).is_none() {
            state.invalid_delete("shader", shader);
        }
    }

    fn create_program(&self) -> Result<RawId, String> {
        let mut state = self.state.borrow_mut();
        let name = state.allocate()?;
        state.programs.insert(name.get(), ProgramObject::default());
        Ok(name)
    }

    fn attach_shader(&self, program: RawId, shader: RawId) {
        if let Some(p) = self.state.borrow_mut().programs.get_mut(&program.get()) {
            p.attached.push(shader.get());
        }
    }

    fn detach_shader(&self, program: RawId, shader: RawId) {
        if let Some(p) = self.state.borrow_mut().programs.get_mut(&program.get()) {
            p.attached.retain(|s| *s != shader.get());
        }
    }

    fn link_program(&self, program: RawId) -> bool {
        let mut state = self.state.borrow_mut();
        let Some(attached) = state.programs.get(&program.get()).map(|p| p.attached.clone()) else {
            return false;
        };

        let stage_decls = |stage: ShaderStage| {
            attached
                .iter()
                .filter_map(|id| state.shaders.get(id))
                .find(|s| s.stage == stage && s.compiled)
                .map(|s| s.decls.clone())
        };
        let result = match (stage_decls(ShaderStage::Vertex), stage_decls(ShaderStage::Fragment)) {
            (Some(vs), Some(fs)) => match fs.inputs.iter().find(|i| !vs.outputs.contains(*i)) {
                Some(missing) => Err(format!(
                    "error: fragment shader input '{missing}' is not written by the vertex shader"
                )),
                None => {
                    let mut uniforms = vs.uniforms;
                    for u in fs.uniforms {
                        if !uniforms.contains(&u) {
                            uniforms.push(u);
                        }
                    }
                    Ok(uniforms)
                }
            },
            _ => Err("error: program needs a compiled vertex and fragment shader".to_owned()),
        };

        let Some(p) = state.programs.get_mut(&program.get()) else {
            return false;
        };
        match result {
            Ok(uniforms) => {
                p.linked = true;
                p.log.clear();
                p.uniforms = uniforms;
            }
            Err(log) => {
                p.linked = false;
                p.log = log;
                p.uniforms.clear();
            }
        }
        p.linked
    }

    fn program_info_log(&self, program: RawId) -> String {
        self.state
            .borrow()
            .programs
            .get(&program.get())
            .map(|p| p.log.clone())
            .unwrap_or_default()
    }

    fn delete_program(&self, program: RawId) {
        let mut state = self.state.borrow_mut();
        if state.programs.remove(&program.get()).is_none() {
            state.invalid_delete("program", program);
        }
        if state.current_program == Some(program.get()) {
            state.current_program = None;
        }
    }

    fn use_program(&self, program: Option<RawId>) {
        self.state.borrow_mut().current_program = program.map(RawId::get);
    }

    fn uniform_location(&self, program: RawId, name: &str) -> UniformLocation {
        let state = self.state.borrow();
        let index = state
            .programs
            .get(&program.get())
            .filter(|p| p.linked)
            .and_then(|p| p.uniforms.iter().position(|u| u == name))
            .and_then(|i| u32::try_from(i).ok());
        UniformLocation::new(index)
    }

    fn set_uniform_i32(&self, location: UniformLocation, value: i32) {
        store_uniform(&self.state, location, UniformValue::I32(value));
    }

    fn set_uniform_vec3(&self, location: UniformLocation, value: [f32; 3]) {
        store_uniform(&self.state, location, UniformValue::Vec3(value));
    }

    fn set_uniform_mat4(&self, location: UniformLocation, value: &[f32; 16]) {
        store_uniform(&self.state, location, UniformValue::Mat4(*value));
    }

    fn create_texture(&self) -> Result<RawId, String> {
        let mut state = self.state.borrow_mut();
        let name = state.allocate()?;
        state.textures.insert(name.get(), None);
        Ok(name)
    }

    fn upload_texture_rgba8(
        &self,
        texture: RawId,
        width: u32,
        height: u32,
        pixels: &[u8],
        params: &TextureParams,
    ) {
        let mip_levels = if params.mipmaps {
            32 - width.max(height).max(1).leading_zeros()
        } else {
            1
        };
        if let Some(slot) = self.state.borrow_mut().textures.get_mut(&texture.get()) {
            *slot = Some(TextureSnapshot {
                width,
                height,
                pixels: pixels.to_vec(),
                params: *params,
                mip_levels,
            });
        }
    }

    fn bind_texture(&self, unit: u32, texture: Option<RawId>) {
        let mut state = self.state.borrow_mut();
        match texture {
            Some(t) => state.bound_textures.insert(unit, t.get()),
            None => state.bound_textures.remove(&unit),
        };
    }

    fn delete_texture(&self, texture: RawId) {
        let mut state = self.state.borrow_mut();
        if state.textures.remove(&texture.get()).is_none() {
            state.invalid_delete("texture", texture);
        }
        state.bound_textures.retain(|_, t| *t != texture.get());
    }

    fn create_buffer(&self) -> Result<RawId, String> {
        let mut state = self.state.borrow_mut();
        let name = state.allocate()?;
        state.buffers.insert(name.get(), Vec::new());
        Ok(name)
    }

    fn bind_buffer(&self, target: BufferTarget, buffer: Option<RawId>) {
        let mut state = self.state.borrow_mut();
        let slot = match target {
            BufferTarget::Vertex => &mut state.bound_vertex_buffer,
            BufferTarget::Index => &mut state.bound_index_buffer,
        };
        *slot = buffer.map(RawId::get);
    }

    fn upload_buffer(
        &self,
        buffer: RawId,
        _target: BufferTarget,
        data: &[u8],
        _usage: BufferUsage,
    ) {
        if let Some(contents) = self.state.borrow_mut().buffers.get_mut(&buffer.get()) {
            contents.clear();
            contents.extend_from_slice(data);
        }
    }

    fn delete_buffer(&self, buffer: RawId) {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        if state.buffers.remove(&buffer.get()).is_none() {
            state.invalid_delete("buffer", buffer);
        }
        for bound in [&mut state.bound_vertex_buffer, &mut state.bound_index_buffer] {
            if *bound == Some(buffer.get()) {
                *bound = None;
            }
        }
    }

    fn create_vertex_array(&self) -> Result<RawId, String> {
        let mut state = self.state.borrow_mut();
        let name = state.allocate()?;
        state.vertex_arrays.insert(name.get());
        Ok(name)
    }

    fn bind_vertex_array(&self, vertex_array: Option<RawId>) {
        self.state.borrow_mut().bound_vertex_array = vertex_array.map(RawId::get);
    }

    fn vertex_attrib(&self, _attrib: &VertexAttrib) {}

    fn delete_vertex_array(&self, vertex_array: RawId) {
        let mut state = self.state.borrow_mut();
        if !state.vertex_arrays.remove(&vertex_array.get()) {
            state.invalid_delete("vertex array", vertex_array);
        }
        if state.bound_vertex_array == Some(vertex_array.get()) {
            state.bound_vertex_array = None;
        }
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        self.state.borrow_mut().viewport = [x, y, width, height];
    }

    fn scissor(&self, x: i32, y: i32, width: i32, height: i32) {
        self.state.borrow_mut().scissor = [x, y, width, height];
    }

    fn set_capability(&self, capability: Capability, enabled: bool) {
        let mut state = self.state.borrow_mut();
        if enabled {
            state.capabilities.insert(capability_name(capability));
        } else {
            state.capabilities.remove(capability_name(capability));
        }
    }

    fn set_alpha_blending(&self) {}

    fn clear(&self, _color: [f32; 4], _depth: bool) {
        self.state.borrow_mut().clears += 1;
    }

    fn draw_elements(&self, count: i32, index_type: IndexType, byte_offset: i32) {
        let mut state = self.state.borrow_mut();
        let scissor = state
            .capabilities
            .contains(capability_name(Capability::ScissorTest))
            .then_some(state.scissor);
        let call = DrawCall {
            program: state.current_program,
            texture: state.bound_textures.get(&0).copied(),
            count,
            index_type,
            byte_offset,
            scissor,
        };
        state.draws.push(call);
    }
}

fn store_uniform(state: &RefCell<GpuState>, location: UniformLocation, value: UniformValue) {
    let mut state = state.borrow_mut();
    let (Some(program), Some(location)) = (state.current_program, location.raw()) else {
        return;
    };
    state.uniforms.insert((program, location), value);
}

#[derive(Debug)]
struct SurfaceState {
    framebuffer: (u32, u32),
    window: (u32, u32),
    time: f64,
    events: VecDeque<SurfaceEvent>,
    swaps: usize,
    vsync: Option<bool>,
    should_close: bool,
}

/// A [`Surface`] with no window behind it.
pub struct HeadlessSurface {
    gpu: HeadlessGpu,
    shared: Rc<RefCell<SurfaceState>>,
}

impl HeadlessSurface {
    /// A surface whose window and framebuffer are both `width × height`.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            gpu: HeadlessGpu::new(),
            shared: Rc::new(RefCell::new(SurfaceState {
                framebuffer: (width, height),
                window: (width, height),
                time: 0.0,
                events: VecDeque::new(),
                swaps: 0,
                vsync: None,
                should_close: false,
            })),
        }
    }

    /// Overrides the framebuffer size, e.g. to emulate a high-DPI display.
    #[must_use]
    pub fn with_framebuffer(self, width: u32, height: u32) -> Self {
        self.shared.borrow_mut().framebuffer = (width, height);
        self
    }

    /// A handle that observes and drives this surface from outside.
    #[must_use]
    pub fn probe(&self) -> HeadlessProbe {
        HeadlessProbe {
            gpu: self.gpu.clone(),
            shared: Rc::clone(&self.shared),
        }
    }
}

impl Surface for HeadlessSurface {
    fn gpu(&self) -> &dyn GpuBackend {
        &self.gpu
    }

    fn framebuffer_size(&self) -> (u32, u32) {
        self.shared.borrow().framebuffer
    }

    fn window_size(&self) -> (u32, u32) {
        self.shared.borrow().window
    }

    fn time(&self) -> f64 {
        self.shared.borrow().time
    }

    fn set_vsync(&mut self, enabled: bool) {
        self.shared.borrow_mut().vsync = Some(enabled);
    }

    fn poll_events(&mut self) -> Vec<SurfaceEvent> {
        self.shared.borrow_mut().events.drain(..).collect()
    }

    fn swap_buffers(&mut self) {
        self.shared.borrow_mut().swaps += 1;
    }

    fn should_close(&self) -> bool {
        self.shared.borrow().should_close
    }

    fn set_should_close(&mut self, value: bool) {
        self.shared.borrow_mut().should_close = value;
    }
}

/// Drives and inspects a [`HeadlessSurface`] after it has been handed off.
#[derive(Clone)]
pub struct HeadlessProbe {
    gpu: HeadlessGpu,
    shared: Rc<RefCell<SurfaceState>>,
}

impl HeadlessProbe {
    /// The surface's backend.
    #[must_use]
    pub fn gpu(&self) -> &HeadlessGpu {
        &self.gpu
    }

    /// Sets the surface clock, in seconds since the surface was created.
    pub fn set_time(&self, seconds: f64) {
        self.shared.borrow_mut().time = seconds;
    }

    /// Advances the surface clock.
    pub fn advance(&self, seconds: f64) {
        self.shared.borrow_mut().time += seconds;
    }

    /// Queues an event for the next poll.
    pub fn push_event(&self, event: SurfaceEvent) {
        self.shared.borrow_mut().events.push_back(event);
    }

    /// Resizes both window and framebuffer and queues the matching event.
    pub fn resize(&self, width: u32, height: u32) {
        let mut shared = self.shared.borrow_mut();
        shared.framebuffer = (width, height);
        shared.window = (width, height);
        shared
            .events
            .push_back(SurfaceEvent::FramebufferResized { width, height });
    }

    /// Number of buffer swaps so far.
    #[must_use]
    pub fn swap_count(&self) -> usize {
        self.shared.borrow().swaps
    }

    /// Vsync setting last applied, if any.
    #[must_use]
    pub fn vsync(&self) -> Option<bool> {
        self.shared.borrow().vsync
    }

    /// Whether closing has been requested.
    #[must_use]
    pub fn should_close(&self) -> bool {
        self.shared.borrow().should_close
    }
}

type FrameSlot = Rc<RefCell<Option<Box<dyn FnMut()>>>>;

/// A [`FrameHost`] whose frames are fired by hand.
///
/// Clones share the registered callback, so one clone can be given to a
/// [`Platform`](crate::Platform) while another drives frames.
#[derive(Clone, Default)]
pub struct ManualFrameHost {
    frame: FrameSlot,
}

impl ManualFrameHost {
    /// A host with no callback registered.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a callback has been registered.
    #[must_use]
    pub fn is_registered(&self) -> bool {
        self.frame.borrow().is_some()
    }

    /// Invokes the registered callback `count` times. Returns how many
    /// frames actually ran.
    pub fn run_frames(&self, count: usize) -> usize {
        let Some(mut frame) = self.frame.borrow_mut().take() else {
            return 0;
        };
        for _ in 0..count {
            frame();
        }
        *self.frame.borrow_mut() = Some(frame);
        count
    }
}

impl FrameHost for ManualFrameHost {
    fn set_main_loop(&mut self, frame: Box<dyn FnMut()>) {
        *self.frame.borrow_mut() = Some(frame);
    }
}
