//! The distortion renderer: owns the per-eye mesh buffers and the
//! distortion program, and draws both eyes into a target framebuffer.
//!
//! # GL state footprint
//!
//! The renderer does not save or restore context state it does not own.
//! Callers interleaving their own GL work must assume the following is
//! modified:
//!
//! - [`set_mesh`](DistortionRenderer::set_mesh): `ARRAY_BUFFER` and
//!   `ELEMENT_ARRAY_BUFFER` bindings (left unbound). On
//!   [`Backend::OpenGl3`] the index upload happens with the renderer's
//!   vertex array object bound, and none is left bound.
//! - [`render_eye_to_display`](DistortionRenderer::render_eye_to_display):
//!   viewport, `FRAMEBUFFER` binding, `CULL_FACE` (left disabled),
//!   `SCISSOR_TEST` (left disabled), scissor box, clear color, current
//!   program, the position and texture-coordinate attribute arrays (left
//!   enabled), the `u_start`/`u_end` uniforms, active texture unit (left at
//!   `TEXTURE0`), the `TEXTURE_2D` binding of unit 0 (left unbound), and
//!   `ARRAY_BUFFER` / `ELEMENT_ARRAY_BUFFER` bindings (left unbound). The
//!   [`Backend::OpenGl3`] variant additionally binds its vertex array object
//!   for the duration of the call and leaves none bound.

use std::sync::Arc;

use log::{debug, error, trace, warn};

use crate::{
    config::DistortionConfig,
    diagnostics::{check_gl_error, ErrorPolicy},
    error::DistortionError,
    gl::{self, GlApi},
    mesh_buffers::MeshBufferStore,
    shaders::{DistortionProgram, ShaderDialect},
    types::{DistortionMesh, Eye, EyeTextureDescription, Viewport},
};

/// Components per position and per UV.
const COMPONENTS_PER_VERTEX: i32 = 2;

/// Graphics API flavor a renderer draws with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Backend {
    /// OpenGL ES 2.0: GLSL ES 1.00 shaders, client-side attribute state.
    OpenGlEs2,
    /// OpenGL 3.1+ core profile: GLSL 1.40 shaders and a vertex array
    /// object, which core profiles require for any draw.
    OpenGl3,
}

impl Backend {
    /// Shader dialect compiled for this backend.
    #[must_use]
    pub fn dialect(self) -> ShaderDialect {
        match self {
            Backend::OpenGlEs2 => ShaderDialect::Es100,
            Backend::OpenGl3 => ShaderDialect::Glsl140,
        }
    }

    fn uses_vertex_array(self) -> bool {
        matches!(self, Backend::OpenGl3)
    }
}

/// Where a renderer is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererState {
    /// Program and buffers exist; neither eye has a mesh.
    Constructed,
    /// Only the given eye has a mesh.
    PartiallyReady(Eye),
    /// Both eyes have a mesh; frames can be drawn.
    Ready,
    /// GPU resources have been released.
    Destroyed,
}

/// Warps two eye textures through per-eye lens-distortion meshes.
///
/// All methods must be called on the thread that owns the GL context the
/// renderer was created with; there is no internal locking.
pub trait DistortionRenderer {
    /// The backend this renderer was created for.
    fn backend(&self) -> Backend;

    /// Current lifecycle state.
    fn state(&self) -> RendererState;

    /// Upload `mesh` for `eye`, fully replacing any previous mesh for that
    /// eye. Logs and does nothing after [`destroy`](Self::destroy).
    ///
    /// # Safety
    ///
    /// Requires the renderer's GL context to be current.
    unsafe fn set_mesh(&mut self, mesh: &DistortionMesh, eye: Eye);

    /// Clear `viewport` of framebuffer `target` (raw name, `0` for the
    /// default framebuffer) and draw the left eye into its left half and the
    /// right eye into its right half.
    ///
    /// Logs and draws nothing unless both eyes have a mesh. Eye textures are
    /// borrowed; the renderer never creates or deletes them.
    ///
    /// # Safety
    ///
    /// Requires the renderer's GL context to be current, and the eye texture
    /// names to belong to it.
    unsafe fn render_eye_to_display(
        &self,
        target: u64,
        viewport: Viewport,
        left_eye: &EyeTextureDescription,
        right_eye: &EyeTextureDescription,
    );

    /// Release the program, the six mesh buffers and any vertex array.
    /// Further calls do nothing.
    ///
    /// # Safety
    ///
    /// Requires the renderer's GL context to be current.
    unsafe fn destroy(&mut self);
}

/// Create a renderer for `backend` drawing through `gl`.
///
/// # Safety
///
/// The `gl` context must be current and valid. The caller must call
/// [`destroy`](DistortionRenderer::destroy) before the context goes away.
///
/// # Errors
///
/// Returns an error if shader compilation, program linking, location lookup
/// or GL object creation fails. No GL objects outlive a failed call.
pub unsafe fn create_distortion_renderer<G: GlApi + 'static>(
    gl: Arc<G>,
    backend: Backend,
    config: DistortionConfig,
) -> Result<Box<dyn DistortionRenderer>, DistortionError> {
    let renderer = unsafe { GlDistortionRenderer::new(gl, backend, config) }?;
    Ok(Box::new(renderer))
}

/// OpenGL implementation of [`DistortionRenderer`].
///
/// Holds one vertex, one UV and one index buffer per eye. Each eye has its
/// own buffers, so attribute pointers use zero stride and offset.
///
/// # Example
///
/// ```no_run
/// # use stereo_distortion_gl::*;
/// # use std::sync::Arc;
/// # fn example(gl: Arc<glow::Context>, left: DistortionMesh, right: DistortionMesh, texture: u64) {
/// // During setup (with a current GL context):
/// let mut renderer = unsafe {
///     GlDistortionRenderer::new(gl, Backend::OpenGlEs2, DistortionConfig::default())
/// }
/// .unwrap();
/// unsafe {
///     renderer.set_mesh(&left, Eye::Left);
///     renderer.set_mesh(&right, Eye::Right);
/// }
///
/// // Each frame:
/// unsafe {
///     renderer.render_eye_to_display(
///         0,
///         Viewport::new(0, 0, 1920, 1080),
///         &EyeTextureDescription::side_by_side(texture, Eye::Left),
///         &EyeTextureDescription::side_by_side(texture, Eye::Right),
///     );
/// }
/// # }
/// ```
pub struct GlDistortionRenderer<G: GlApi> {
    /// The GL context, shared via [`Arc`] with the rest of the application.
    gl: Arc<G>,
    backend: Backend,
    config: DistortionConfig,

    /// `None` once destroyed.
    program: Option<DistortionProgram<G>>,
    buffers: MeshBufferStore<G>,
    /// Only used by [`Backend::OpenGl3`].
    vertex_array: Option<G::VertexArray>,
}

impl<G: GlApi> GlDistortionRenderer<G> {
    /// Compile the distortion program and allocate the per-eye buffers.
    ///
    /// # Safety
    ///
    /// The `gl` context must be current and valid. The caller must ensure
    /// that [`destroy`](DistortionRenderer::destroy) is called before the
    /// context is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if shader compilation, program linking, location
    /// lookup or GL object creation fails. Objects created before the
    /// failure are released.
    pub unsafe fn new(
        gl: Arc<G>,
        backend: Backend,
        config: DistortionConfig,
    ) -> Result<Self, DistortionError> {
        let program = unsafe { DistortionProgram::new(&*gl, backend.dialect()) }?;

        let mut buffers = match unsafe { MeshBufferStore::new(&*gl) } {
            Ok(buffers) => buffers,
            Err(err) => {
                unsafe { gl.delete_program(program.program) };
                return Err(err);
            }
        };

        let vertex_array = if backend.uses_vertex_array() {
            match unsafe { gl.create_vertex_array() } {
                Ok(vao) => Some(vao),
                Err(reason) => {
                    unsafe {
                        buffers.release(&*gl);
                        gl.delete_program(program.program);
                    }
                    return Err(DistortionError::ResourceCreation {
                        what: "vertex array",
                        reason,
                    });
                }
            }
        } else {
            None
        };

        let renderer = Self {
            gl,
            backend,
            config,
            program: Some(program),
            buffers,
            vertex_array,
        };
        unsafe { renderer.check("distortion renderer setup") };
        debug!("created {backend:?} distortion renderer");
        Ok(renderer)
    }

    /// Number of indices currently uploaded for `eye`.
    #[must_use]
    pub fn index_count(&self, eye: Eye) -> usize {
        self.buffers.index_count(eye)
    }

    /// Per-frame error checks only log: a dropped frame is preferable to a
    /// crash in a head-mounted display.
    unsafe fn check(&self, label: &str) {
        if self.config.check_errors {
            let _ = unsafe { check_gl_error(&*self.gl, label, ErrorPolicy::Log) };
        }
    }

    /// Draw one eye's mesh with the current scissor box.
    ///
    /// Binds the eye's buffers, points both attributes at them, binds the
    /// eye texture to unit 0, sets the window uniforms and issues one
    /// indexed triangle-strip draw.
    unsafe fn render_distortion_mesh(
        &self,
        program: &DistortionProgram<G>,
        description: &EyeTextureDescription,
        eye: Eye,
    ) {
        let gl = &*self.gl;
        let Some(buffers) = self.buffers.eye(eye) else {
            return;
        };
        let Ok(index_count) = i32::try_from(buffers.index_count) else {
            error!(
                "{eye:?} distortion mesh has {} indices, more than a draw call accepts",
                buffers.index_count
            );
            return;
        };

        unsafe {
            // Stride and offset are 0: each eye has dedicated buffers.
            gl.bind_buffer(gl::ARRAY_BUFFER, Some(buffers.vertices));
            gl.vertex_attrib_pointer_f32(
                program.position,
                COMPONENTS_PER_VERTEX,
                gl::FLOAT,
                false,
                0,
                0,
            );
            gl.enable_vertex_attrib_array(program.position);

            gl.bind_buffer(gl::ARRAY_BUFFER, Some(buffers.uvs));
            gl.vertex_attrib_pointer_f32(
                program.tex_coords,
                COMPONENTS_PER_VERTEX,
                gl::FLOAT,
                false,
                0,
                0,
            );
            gl.enable_vertex_attrib_array(program.tex_coords);

            gl.active_texture(gl::TEXTURE0);
            gl.bind_texture(gl::TEXTURE_2D, gl.texture_from_raw(description.texture));

            let [start_u, start_v] = description.window_start();
            let [end_u, end_v] = description.window_end();
            gl.uniform_2_f32(Some(&program.start), start_u, start_v);
            gl.uniform_2_f32(Some(&program.end), end_u, end_v);

            gl.bind_buffer(gl::ELEMENT_ARRAY_BUFFER, Some(buffers.indices));
            gl.draw_elements(gl::TRIANGLE_STRIP, index_count, gl::UNSIGNED_INT, 0);
        }

        trace!("drew {eye:?} distortion mesh ({index_count} indices)");
    }
}

impl<G: GlApi> DistortionRenderer for GlDistortionRenderer<G> {
    fn backend(&self) -> Backend {
        self.backend
    }

    fn state(&self) -> RendererState {
        if self.buffers.is_released() {
            return RendererState::Destroyed;
        }
        let left = self.buffers.index_count(Eye::Left) > 0;
        let right = self.buffers.index_count(Eye::Right) > 0;
        match (left, right) {
            (true, true) => RendererState::Ready,
            (true, false) => RendererState::PartiallyReady(Eye::Left),
            (false, true) => RendererState::PartiallyReady(Eye::Right),
            (false, false) => RendererState::Constructed,
        }
    }

    unsafe fn set_mesh(&mut self, mesh: &DistortionMesh, eye: Eye) {
        let gl = &*self.gl;
        // Core profiles keep the element buffer binding in the vertex array.
        if let Some(vao) = self.vertex_array {
            unsafe { gl.bind_vertex_array(Some(vao)) };
        }
        let uploaded = unsafe { self.buffers.upload(gl, mesh, eye) };
        if self.vertex_array.is_some() {
            unsafe { gl.bind_vertex_array(None) };
        }
        if !uploaded {
            error!("set_mesh called on a destroyed distortion renderer");
            return;
        }
        unsafe { self.check("set_mesh") };
    }

    unsafe fn render_eye_to_display(
        &self,
        target: u64,
        viewport: Viewport,
        left_eye: &EyeTextureDescription,
        right_eye: &EyeTextureDescription,
    ) {
        let Some(program) = self.program.as_ref() else {
            error!("render_eye_to_display called on a destroyed distortion renderer");
            return;
        };
        if !self.buffers.is_ready() {
            error!("distortion mesh is empty: set_mesh has not been called for both eyes");
            return;
        }
        let handles = [
            ("target framebuffer", target),
            ("left eye texture", left_eye.texture),
            ("right eye texture", right_eye.texture),
        ];
        if let Some((what, raw)) = handles
            .into_iter()
            .find(|&(_, raw)| u32::try_from(raw).is_err())
        {
            error!("{what} handle {raw} is not a valid GL object name");
            return;
        }

        let gl = &*self.gl;
        let Viewport {
            x,
            y,
            width,
            height,
        } = viewport;
        let [red, green, blue, alpha] = self.config.clear_color;

        unsafe {
            gl.viewport(x, y, width, height);
            gl.bind_framebuffer(gl::FRAMEBUFFER, gl.framebuffer_from_raw(target));
            gl.disable(gl::SCISSOR_TEST);
            gl.disable(gl::CULL_FACE);
            gl.clear_color(red, green, blue, alpha);
            gl.clear(gl::COLOR_BUFFER_BIT | gl::DEPTH_BUFFER_BIT);

            gl.use_program(Some(program.program));
            if let Some(texture) = program.texture.as_ref() {
                gl.uniform_1_i32(Some(texture), 0);
            }
            if self.vertex_array.is_some() {
                gl.bind_vertex_array(self.vertex_array);
            }

            gl.enable(gl::SCISSOR_TEST);
            for (eye, description) in [(Eye::Left, left_eye), (Eye::Right, right_eye)] {
                let scissor = viewport.eye_scissor(eye);
                gl.scissor(scissor.x, scissor.y, scissor.width, scissor.height);
                self.render_distortion_mesh(program, description, eye);
            }

            gl.active_texture(gl::TEXTURE0);
            gl.bind_texture(gl::TEXTURE_2D, None);
            gl.bind_buffer(gl::ARRAY_BUFFER, None);
            gl.bind_buffer(gl::ELEMENT_ARRAY_BUFFER, None);
            if self.vertex_array.is_some() {
                gl.bind_vertex_array(None);
            }
            gl.disable(gl::SCISSOR_TEST);

            self.check("render_eye_to_display");
        }
    }

    unsafe fn destroy(&mut self) {
        let gl = &*self.gl;
        let Some(program) = self.program.take() else {
            debug!("distortion renderer already destroyed");
            return;
        };

        unsafe {
            gl.delete_program(program.program);
            if let Some(vao) = self.vertex_array.take() {
                gl.delete_vertex_array(vao);
            }
            self.buffers.release(gl);
        }
        unsafe { self.check("destroy") };
        debug!("destroyed {:?} distortion renderer", self.backend);
    }
}

impl<G: GlApi> Drop for GlDistortionRenderer<G> {
    fn drop(&mut self) {
        if self.program.is_some() {
            warn!("distortion renderer dropped without destroy(); its GL objects leak");
        }
    }
}
