//! Shader program loading.
//!
//! Shader files are looked up by base name plus the platform suffix, so one
//! call site serves both dialects:
//!
//! ```text
//! shaders/cube_gl46.vert   shaders/cube_gl46.frag   (desktop, #version 460 core)
//! shaders/cube_es3.vert    shaders/cube_es3.frag    (ES 3.0, #version 300 es)
//! ```
//!
//! Every failure path releases the objects it created, so a failed load
//! leaves no shader or program objects behind.

use std::fs;

use crate::error::{LoadError, Result};
use crate::gpu::handle::{owned_by, take_for_release};
use crate::gpu::{GpuBackend, GpuHandle, Program, RawId, ShaderStage, UniformLocation};

/// Compiles and links shader programs on one context.
///
/// Holds no state besides the borrowed backend and file suffix; create one
/// wherever it is needed with [`Application::shaders`](crate::Application::shaders).
#[derive(Clone, Copy)]
pub struct ShaderManager<'a> {
    gpu: &'a dyn GpuBackend,
    suffix: &'a str,
}

impl<'a> ShaderManager<'a> {
    /// A manager issuing calls to `gpu` and looking for `<base><suffix>.vert`.
    #[must_use]
    pub fn new(gpu: &'a dyn GpuBackend, suffix: &'a str) -> Self {
        Self { gpu, suffix }
    }

    /// Loads `<directory><base_name><suffix>.vert` and `.frag`.
    ///
    /// `directory` is joined by plain concatenation, so it normally ends in a
    /// path separator (`"shaders/"`).
    ///
    /// # Errors
    ///
    /// See [`load_program_from_files`](Self::load_program_from_files).
    pub fn load_program(&self, base_name: &str, directory: &str) -> Result<Program> {
        let vert = format!("{directory}{base_name}{}.vert", self.suffix);
        let frag = format!("{directory}{base_name}{}.frag", self.suffix);
        self.load_program_from_files(&vert, &frag)
    }

    /// Reads both stages from disk, then compiles and links them.
    ///
    /// # Errors
    ///
    /// - [`LoadError::FileRead`] if either file cannot be read (nothing has
    ///   been allocated at that point).
    /// - [`LoadError::ShaderCompile`] naming the failing stage.
    /// - [`LoadError::ShaderLink`] with the linker log.
    /// - [`LoadError::ResourceCreation`] if the backend runs out of names.
    pub fn load_program_from_files(&self, vert_path: &str, frag_path: &str) -> Result<Program> {
        let vert_src = read_source(vert_path)?;
        let frag_src = read_source(frag_path)?;
        let program = self.load_program_from_sources(&vert_src, &frag_src)?;
        log::info!("Loaded shader program: {vert_path} + {frag_path}");
        Ok(program)
    }

    /// Compiles and links in-memory GLSL sources.
    ///
    /// On success the stage objects are detached and deleted, so only the
    /// returned program needs releasing.
    ///
    /// # Errors
    ///
    /// Same as [`load_program_from_files`](Self::load_program_from_files),
    /// minus file errors.
    pub fn load_program_from_sources(&self, vert_src: &str, frag_src: &str) -> Result<Program> {
        let gpu = self.gpu;
        let vs = self.compile_stage(ShaderStage::Vertex, vert_src)?;
        let fs = match self.compile_stage(ShaderStage::Fragment, frag_src) {
            Ok(fs) => fs,
            Err(e) => {
                gpu.delete_shader(vs);
                return Err(e);
            }
        };

        let program = match gpu.create_program() {
            Ok(program) => program,
            Err(reason) => {
                gpu.delete_shader(vs);
                gpu.delete_shader(fs);
                return Err(LoadError::ResourceCreation {
                    object: "program",
                    reason,
                });
            }
        };

        gpu.attach_shader(program, vs);
        gpu.attach_shader(program, fs);
        if !gpu.link_program(program) {
            let log = non_empty_log(gpu.program_info_log(program));
            gpu.delete_program(program);
            gpu.delete_shader(vs);
            gpu.delete_shader(fs);
            log::error!("Shader program linking failed: {log}");
            return Err(LoadError::ShaderLink { log });
        }

        gpu.detach_shader(program, vs);
        gpu.detach_shader(program, fs);
        gpu.delete_shader(vs);
        gpu.delete_shader(fs);

        Ok(Program::new(program, gpu.context_id()))
    }

    /// Location of uniform `name` in `program`, invalid if it does not exist
    /// or `program` belongs to another context.
    #[must_use]
    pub fn uniform_location(&self, program: &Program, name: &str) -> UniformLocation {
        if !owned_by(self.gpu, program, "query") {
            return UniformLocation::INVALID;
        }
        let location = self.gpu.uniform_location(program.raw(), name);
        if !location.is_valid() {
            log::warn!("uniform {name} not found in {program:?}");
        }
        location
    }

    /// Releases the program in `slot`, leaving `None`. No-op on `None`.
    pub fn delete_program(&self, slot: &mut Option<Program>) {
        if let Some(raw) = take_for_release(self.gpu, slot) {
            self.gpu.delete_program(raw);
        }
    }

    /// Compiles one stage, deleting the shader object again on failure.
    fn compile_stage(&self, stage: ShaderStage, source: &str) -> Result<RawId> {
        let shader = self
            .gpu
            .create_shader(stage)
            .map_err(|reason| LoadError::ResourceCreation {
                object: "shader",
                reason,
            })?;
        if !self.gpu.compile_shader(shader, source) {
            let log = non_empty_log(self.gpu.shader_info_log(shader));
            self.gpu.delete_shader(shader);
            log::error!("{} shader compilation failed: {log}", stage.name());
            return Err(LoadError::ShaderCompile {
                stage: stage.name(),
                log,
            });
        }
        Ok(shader)
    }
}

fn read_source(path: &str) -> Result<String> {
    fs::read_to_string(path).map_err(|e| {
        log::error!("Failed to open shader file: {path} ({e})");
        LoadError::FileRead {
            path: path.to_owned(),
            reason: e.to_string(),
        }
    })
}

fn non_empty_log(log: String) -> String {
    if log.trim().is_empty() {
        "(driver returned an empty info log)".to_owned()
    } else {
        log
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::headless::HeadlessGpu;

    const VS: &str = r"#version 460 core
layout(location = 0) in vec3 aPos;
out vec3 vColor;
uniform mat4 uMVP;
void main() {
    vColor = aPos;
    gl_Position = uMVP * vec4(aPos, 1.0);
}
";

    const FS: &str = r"#version 460 core
in vec3 vColor;
out vec4 FragColor;
uniform vec3 uColor;
void main() {
    FragColor = vec4(vColor * uColor, 1.0);
}
";

    #[test]
    fn successful_link_leaves_only_the_program() {
        let gpu = HeadlessGpu::new();
        let shaders = ShaderManager::new(&gpu, "_gl46");
        let mut program = Some(shaders.load_program_from_sources(VS, FS).unwrap());

        let live = gpu.live_objects();
        assert_eq!(live.shaders, 0);
        assert_eq!(live.programs, 1);
        assert!(gpu.is_linked(program.as_ref().unwrap().id()));

        shaders.delete_program(&mut program);
        assert!(program.is_none());
        assert_eq!(gpu.live_objects().total(), 0);
    }

    #[test]
    fn fragment_failure_releases_vertex_stage() {
        let gpu = HeadlessGpu::new();
        let shaders = ShaderManager::new(&gpu, "_gl46");
        let err = shaders
            .load_program_from_sources(VS, "#version 460 core\nvoid main() {\n")
            .unwrap_err();

        assert_eq!(err.message(), "fragment shader compilation failed");
        assert!(!err.context().is_empty());
        assert_eq!(gpu.live_objects().total(), 0);
        assert_eq!(gpu.invalid_deletes(), 0);
    }

    #[test]
    fn link_failure_releases_everything() {
        let gpu = HeadlessGpu::new();
        let shaders = ShaderManager::new(&gpu, "_gl46");
        let orphan_input = "#version 460 core\nin vec2 vUv;\nout vec4 c;\n\
                            void main() { c = vec4(vUv, 0.0, 1.0); }\n";
        let err = shaders.load_program_from_sources(VS, orphan_input).unwrap_err();

        assert!(matches!(err, LoadError::ShaderLink { .. }));
        assert!(err.context().contains("vUv"));
        assert_eq!(gpu.live_objects().total(), 0);
    }

    #[test]
    fn allocation_failure_is_reported() {
        let gpu = HeadlessGpu::new();
        gpu.fail_allocations(true);
        let err = ShaderManager::new(&gpu, "_es3")
            .load_program_from_sources(VS, FS)
            .unwrap_err();
        assert_eq!(err.message(), "Failed to create shader");
    }

    #[test]
    fn load_program_concatenates_directory_base_and_suffix() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("basic_es3.vert"), VS).unwrap();
        fs::write(dir.path().join("basic_es3.frag"), FS).unwrap();
        let directory = format!("{}/", dir.path().display());

        let gpu = HeadlessGpu::new();
        let shaders = ShaderManager::new(&gpu, "_es3");
        let mut program = Some(shaders.load_program("basic", &directory).unwrap());
        let program_ref = program.as_ref().unwrap();

        assert!(shaders.uniform_location(program_ref, "uMVP").is_valid());
        assert!(shaders.uniform_location(program_ref, "uColor").is_valid());
        assert!(!shaders.uniform_location(program_ref, "uTexture").is_valid());

        shaders.delete_program(&mut program);
        shaders.delete_program(&mut program);
        assert_eq!(gpu.invalid_deletes(), 0);
    }

    #[test]
    fn missing_fragment_file_allocates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let vert = dir.path().join("only.vert");
        fs::write(&vert, VS).unwrap();
        let frag = dir.path().join("only.frag");

        let gpu = HeadlessGpu::new();
        let err = ShaderManager::new(&gpu, "")
            .load_program_from_files(vert.to_str().unwrap(), frag.to_str().unwrap())
            .unwrap_err();

        assert!(matches!(err, LoadError::FileRead { .. }));
        assert!(err.context().contains("only.frag"));
        assert_eq!(gpu.live_objects().total(), 0);
    }

    #[test]
    fn programs_of_another_context_are_not_queried_or_bound() {
        let a = HeadlessGpu::new();
        let b = HeadlessGpu::new();
        let link = |gpu: &HeadlessGpu| {
            ShaderManager::new(gpu, "")
                .load_program_from_sources(VS, FS)
                .unwrap()
        };
        let mut program_a = Some(link(&a));
        let mut program_b = Some(link(&b));
        let (pa, pb) = (program_a.as_ref().unwrap(), program_b.as_ref().unwrap());
        assert_eq!(pa.id(), pb.id());

        let foreign = ShaderManager::new(&b, "");
        assert!(!foreign.uniform_location(pa, "uMVP").is_valid());
        assert!(foreign.uniform_location(pb, "uMVP").is_valid());

        pa.bind(&b);
        assert_eq!(b.current_program(), None);
        pb.bind(&b);
        assert_eq!(b.current_program(), Some(pb.id()));

        ShaderManager::new(&a, "").delete_program(&mut program_a);
        foreign.delete_program(&mut program_b);
        assert_eq!(a.live_objects().total() + b.live_objects().total(), 0);
    }
}
