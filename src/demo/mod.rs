//! Rotating textured cube with a control panel.

mod mesh;

use glstage::gpu::{AttribKind, BufferTarget, BufferUsage, Capability, IndexType, VertexAttrib};
use glstage::imgui::Condition;
use glstage::{
    Application, Buffer, GpuBackend, Lifecycle, LoadError, Program, ShaderManager, Texture,
    UniformLocation, VertexArray,
};
use nalgebra::{Matrix4, Unit, Vector3};

use mesh::{CubeVertex, CUBE_INDICES, CUBE_VERTICES};

const CLEAR_COLOR: [f32; 4] = [0.1, 0.1, 0.1, 1.0];

/// Uniform locations of the cube program, resolved once after linking.
#[derive(Debug, Clone, Copy, Default)]
struct ShaderLocations {
    mvp: UniformLocation,
    color: UniformLocation,
    texture: UniformLocation,
}

impl ShaderLocations {
    fn resolve(shaders: &ShaderManager<'_>, program: &Program) -> Self {
        Self {
            mvp: shaders.uniform_location(program, "uMVP"),
            color: shaders.uniform_location(program, "uColor"),
            texture: shaders.uniform_location(program, "uTexture"),
        }
    }
}

/// `projection · view · model` for a unit cube 3 units in front of the
/// camera, rotated `angle_deg` about `axis`. A zero axis means no rotation.
pub fn model_view_projection(aspect: f32, angle_deg: f32, axis: [f32; 3]) -> Matrix4<f32> {
    let model = Unit::try_new(Vector3::from(axis), 1e-6).map_or_else(Matrix4::identity, |axis| {
        Matrix4::from_axis_angle(&axis, angle_deg.to_radians())
    });
    let view = Matrix4::new_translation(&Vector3::new(0.0, 0.0, -3.0));
    let projection = Matrix4::new_perspective(aspect, 45.0_f32.to_radians(), 0.1, 100.0);
    projection * view * model
}

/// The demo's [`Lifecycle`].
pub struct CubeDemo {
    shader_dir: String,
    texture_path: String,

    program: Option<Program>,
    texture: Option<Texture>,
    vertex_array: Option<VertexArray>,
    vertices: Option<Buffer>,
    indices: Option<Buffer>,
    locations: ShaderLocations,

    angle: f32,
    velocity: f32,
    axis: [f32; 3],
    color: [f32; 3],
}

impl CubeDemo {
    pub fn new(shader_dir: impl Into<String>, texture_path: impl Into<String>) -> Self {
        Self {
            shader_dir: shader_dir.into(),
            texture_path: texture_path.into(),
            program: None,
            texture: None,
            vertex_array: None,
            vertices: None,
            indices: None,
            locations: ShaderLocations::default(),
            angle: 0.0,
            velocity: 45.0,
            axis: [0.5, 1.0, 0.0],
            color: [1.0, 1.0, 1.0],
        }
    }

    fn load_assets(&mut self, app: &Application) -> Result<(), LoadError> {
        let shaders = app.shaders();
        let program = shaders.load_program("cube", &self.shader_dir)?;
        self.locations = ShaderLocations::resolve(&shaders, &program);
        self.program = Some(program);

        self.texture = Some(app.textures().load_texture(&self.texture_path, true)?);
        self.create_geometry(app.gpu())
    }

    fn create_geometry(&mut self, gpu: &dyn GpuBackend) -> Result<(), LoadError> {
        let stride = vertex_stride();
        let vertex_array = self.vertex_array.insert(VertexArray::create(gpu)?);
        vertex_array.bind(gpu);
        self.vertices = Some(Buffer::create(
            gpu,
            BufferTarget::Vertex,
            bytemuck::cast_slice(&CUBE_VERTICES),
            BufferUsage::Static,
        )?);
        self.indices = Some(Buffer::create(
            gpu,
            BufferTarget::Index,
            bytemuck::cast_slice(&CUBE_INDICES),
            BufferUsage::Static,
        )?);
        gpu.vertex_attrib(&VertexAttrib {
            index: 0,
            components: 3,
            kind: AttribKind::F32,
            stride,
            offset: 0,
        });
        gpu.vertex_attrib(&VertexAttrib {
            index: 1,
            components: 2,
            kind: AttribKind::F32,
            stride,
            offset: 12,
        });
        gpu.bind_vertex_array(None);
        Ok(())
    }

    fn render_cube(&self, app: &Application) {
        let (Some(program), Some(vertex_array)) = (&self.program, &self.vertex_array) else {
            return;
        };
        let gpu = app.gpu();
        let mvp = model_view_projection(app.aspect_ratio(), self.angle, self.axis);
        let columns: [[f32; 4]; 4] = mvp.into();

        program.bind(gpu);
        gpu.set_uniform_mat4(self.locations.mvp, &bytemuck::cast(columns));
        gpu.set_uniform_vec3(self.locations.color, self.color);
        if let Some(texture) = &self.texture {
            texture.bind(gpu, 0);
        }
        gpu.set_uniform_i32(self.locations.texture, 0);

        vertex_array.bind(gpu);
        gpu.draw_elements(index_count(), IndexType::U32, 0);
        gpu.bind_vertex_array(None);
    }

    #[expect(clippy::cast_precision_loss)]
    fn render_ui(&mut self, app: &mut Application) {
        let width = app.window_width() as f32;
        let Self {
            velocity,
            axis,
            color,
            ..
        } = self;
        app.draw_overlay(|ui| {
            ui.window("Controls")
                .position([width - 300.0, 20.0], Condition::FirstUseEver)
                .size([280.0, 200.0], Condition::FirstUseEver)
                .build(|| {
                    ui.text(format!("FPS: {:.1}", ui.io().framerate));
                    ui.separator();
                    ui.slider_config("Rotation Axis", -1.0, 1.0)
                        .display_format("%.2f")
                        .build_array(axis);
                    ui.slider_config("Rotation Velocity", -180.0, 180.0)
                        .display_format("%.1f deg/s")
                        .build(velocity);
                    ui.color_edit3("Cube Color", color);
                });
        });
    }
}

#[expect(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
fn vertex_stride() -> i32 {
    std::mem::size_of::<CubeVertex>() as i32
}

#[expect(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
fn index_count() -> i32 {
    CUBE_INDICES.len() as i32
}

impl Lifecycle for CubeDemo {
    fn on_init(&mut self, app: &mut Application) {
        if let Err(e) = self.load_assets(app) {
            log::error!("Failed to load cube assets: {} - {}", e.message(), e.context());
        }
    }

    fn on_tick(&mut self, app: &mut Application, delta_time: f32) {
        self.angle = (self.angle + self.velocity * delta_time).rem_euclid(360.0);

        let gpu = app.gpu();
        gpu.set_capability(Capability::DepthTest, true);
        gpu.clear(CLEAR_COLOR, true);

        self.render_cube(app);
        self.render_ui(app);
        app.end_frame();
    }

    fn on_shutdown(&mut self, app: &mut Application) {
        let gpu = app.gpu();
        VertexArray::release(gpu, &mut self.vertex_array);
        Buffer::release(gpu, &mut self.vertices);
        Buffer::release(gpu, &mut self.indices);
        app.textures().delete_texture(&mut self.texture);
        app.shaders().delete_program(&mut self.program);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use glstage::headless::{HeadlessProbe, HeadlessSurface};
    use glstage::{Platform, WindowConfig};

    fn shader_dir() -> String {
        format!("{}/shaders/", env!("CARGO_MANIFEST_DIR"))
    }

    fn app(ui_overlay: bool, platform: Platform) -> (Application, HeadlessProbe) {
        let surface = HeadlessSurface::new(800, 600);
        let probe = surface.probe();
        let config = WindowConfig {
            title: "cube".into(),
            width: 800,
            height: 600,
            vsync: true,
            ui_overlay,
        };
        let app = Application::with_surface(config, platform, Box::new(surface)).unwrap();
        (app, probe)
    }

    fn write_texture(dir: &std::path::Path) -> String {
        let path = dir.join("sample.png");
        image::RgbaImage::from_pixel(4, 4, image::Rgba([200, 100, 50, 255]))
            .save(&path)
            .unwrap();
        path.display().to_string()
    }

    #[test]
    fn zero_axis_means_no_rotation() {
        let still = model_view_projection(4.0 / 3.0, 90.0, [0.0; 3]);
        let unrotated = model_view_projection(4.0 / 3.0, 0.0, [0.0, 1.0, 0.0]);
        assert!((still - unrotated).abs().max() < 1e-6);
    }

    #[test]
    fn shipped_shaders_load_for_both_dialects_and_cube_is_drawn() {
        let dir = tempfile::tempdir().unwrap();
        let texture = write_texture(dir.path());

        for platform in [Platform::desktop(), Platform::es3()] {
            let (mut app, probe) = app(false, platform);
            let mut demo = CubeDemo::new(shader_dir(), texture.clone());
            app.start(&mut demo);
            assert!(demo.program.is_some());
            assert!(demo.texture.is_some());
            assert!(demo.locations.mvp.is_valid());
            assert!(demo.locations.color.is_valid());
            assert!(demo.locations.texture.is_valid());

            probe.set_time(0.5);
            app.tick(&mut demo);
            assert!((demo.angle - 22.5).abs() < 1e-4);

            let draws = probe.gpu().draw_calls();
            assert_eq!(draws.len(), 1);
            assert_eq!(draws[0].count, 36);
            assert_eq!(draws[0].texture, demo.texture.as_ref().map(glstage::GpuHandle::id));
            assert_eq!(probe.swap_count(), 1);

            app.shutdown(&mut demo);
            assert_eq!(probe.gpu().live_objects().total(), 0);
            assert_eq!(probe.gpu().invalid_deletes(), 0);
        }
    }

    #[test]
    fn missing_assets_degrade_without_stopping_the_loop() {
        let (mut app, probe) = app(false, Platform::desktop());
        let mut demo = CubeDemo::new("no/such/dir/", "no/such/texture.png");
        app.start(&mut demo);
        assert!(demo.program.is_none());

        probe.set_time(0.016);
        app.tick(&mut demo);
        assert!(probe.gpu().draw_calls().is_empty());
        assert_eq!(probe.gpu().clear_count(), 1);
        assert_eq!(probe.swap_count(), 1);
        assert!(!demo.should_quit(&app));

        app.shutdown(&mut demo);
        assert_eq!(probe.gpu().live_objects().total(), 0);
    }

    #[test]
    fn angle_wraps_in_both_directions() {
        let (mut app, probe) = app(false, Platform::desktop());
        let mut demo = CubeDemo::new("no/such/dir/", "no/such/texture.png");
        app.start(&mut demo);

        demo.velocity = 180.0;
        probe.set_time(3.0);
        app.tick(&mut demo);
        assert!((demo.angle - 180.0).abs() < 1e-3);

        demo.velocity = -180.0;
        probe.advance(1.5);
        app.tick(&mut demo);
        assert!((demo.angle - 270.0).abs() < 1e-3);
    }

    // The only test in this binary that creates an ImGui context.
    #[test]
    fn controls_panel_is_drawn_after_the_cube() {
        let dir = tempfile::tempdir().unwrap();
        let texture = write_texture(dir.path());
        let (mut app, probe) = app(true, Platform::desktop());
        let mut demo = CubeDemo::new(shader_dir(), texture);
        app.start(&mut demo);

        probe.set_time(0.016);
        app.tick(&mut demo);

        let draws = probe.gpu().draw_calls();
        assert!(draws.len() > 1);
        assert_eq!(draws[0].count, 36);
        assert!(draws[1..].iter().all(|d| d.scissor.is_some()));
        assert_eq!(probe.swap_count(), 1);

        app.shutdown(&mut demo);
        assert_eq!(probe.gpu().live_objects().total(), 0);
    }
}
