//! GLSL shader sources and compilation helpers.
//!
//! The distortion program comes in two dialects: GLSL ES 1.00 for OpenGL
//! ES 2.0 devices and GLSL 1.40 (OpenGL 3.1) for desktop core profiles. Both
//! expose the same attribute and uniform names.

use log::{debug, error};

use crate::{
    error::DistortionError,
    gl::{self, GlApi},
};

/// Name of the vertex position attribute.
pub const POSITION_ATTRIBUTE: &str = "a_position";
/// Name of the mesh texture coordinate attribute.
pub const TEX_COORDS_ATTRIBUTE: &str = "a_tex_coords";
/// Name of the window start uniform.
pub const START_UNIFORM: &str = "u_start";
/// Name of the window end uniform.
pub const END_UNIFORM: &str = "u_end";
/// Name of the sampler uniform.
pub const TEXTURE_UNIFORM: &str = "u_texture";

/// Vertex shader (GLSL ES 1.00).
///
/// Mesh positions are already in normalized device coordinates, so they are
/// passed straight through along with the mesh texture coordinates.
pub const DISTORTION_VERTEX_SRC_ES2: &str = r"attribute vec2 a_position;
attribute vec2 a_tex_coords;

varying vec2 v_tex_coords;

void main() {
    gl_Position = vec4(a_position, 0.0, 1.0);
    v_tex_coords = a_tex_coords;
}
";

/// Fragment shader (GLSL ES 1.00).
///
/// # Uniforms
///
/// | Name        | Type        | Description                                   |
/// |-------------|-------------|-----------------------------------------------|
/// | `u_texture` | `sampler2D` | Eye texture, always unit 0                    |
/// | `u_start`   | `vec2`      | `(left_u, bottom_v)` of the visible region    |
/// | `u_end`     | `vec2`      | `(right_u, top_v)` of the visible region      |
///
/// Mesh UVs span `[0,1]x[0,1]` and are remapped linearly into the visible
/// region before sampling.
pub const DISTORTION_FRAGMENT_SRC_ES2: &str = r"precision mediump float;

uniform sampler2D u_texture;
uniform vec2 u_start;
uniform vec2 u_end;

varying vec2 v_tex_coords;

void main() {
    vec2 coords = u_start + v_tex_coords * (u_end - u_start);
    gl_FragColor = texture2D(u_texture, coords);
}
";

/// Vertex shader (GLSL 1.40).
pub const DISTORTION_VERTEX_SRC_140: &str = r"#version 140

in vec2 a_position;
in vec2 a_tex_coords;

out vec2 v_tex_coords;

void main() {
    gl_Position = vec4(a_position, 0.0, 1.0);
    v_tex_coords = a_tex_coords;
}
";

/// Fragment shader (GLSL 1.40). Same uniforms as
/// [`DISTORTION_FRAGMENT_SRC_ES2`].
pub const DISTORTION_FRAGMENT_SRC_140: &str = r"#version 140

uniform sampler2D u_texture;
uniform vec2 u_start;
uniform vec2 u_end;

in vec2 v_tex_coords;

out vec4 frag_color;

void main() {
    vec2 coords = u_start + v_tex_coords * (u_end - u_start);
    frag_color = texture(u_texture, coords);
}
";

/// Which GLSL dialect to compile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderDialect {
    /// GLSL ES 1.00, for OpenGL ES 2.0 contexts.
    Es100,
    /// GLSL 1.40, for OpenGL 3.1+ core contexts.
    Glsl140,
}

impl ShaderDialect {
    /// `(vertex, fragment)` sources for this dialect.
    #[must_use]
    pub fn sources(self) -> (&'static str, &'static str) {
        match self {
            ShaderDialect::Es100 => (DISTORTION_VERTEX_SRC_ES2, DISTORTION_FRAGMENT_SRC_ES2),
            ShaderDialect::Glsl140 => (DISTORTION_VERTEX_SRC_140, DISTORTION_FRAGMENT_SRC_140),
        }
    }
}

/// The linked distortion program and its cached locations.
pub struct DistortionProgram<G: GlApi> {
    /// Linked program handle.
    pub program: G::Program,
    /// `a_position` attribute index.
    pub position: u32,
    /// `a_tex_coords` attribute index.
    pub tex_coords: u32,
    /// `u_start` location.
    pub start: G::UniformLocation,
    /// `u_end` location.
    pub end: G::UniformLocation,
    /// `u_texture` location. Drivers may optimize it out of the active
    /// uniform list; unit 0 is the default either way.
    pub texture: Option<G::UniformLocation>,
}

impl<G: GlApi> DistortionProgram<G> {
    /// Compile and link the distortion program and resolve its locations.
    ///
    /// # Safety
    ///
    /// Requires a valid, current OpenGL context.
    ///
    /// # Errors
    ///
    /// Returns an error if either stage fails to compile, the program fails
    /// to link, or a required attribute or uniform is not active. Nothing is
    /// leaked on failure.
    pub unsafe fn new(gl: &G, dialect: ShaderDialect) -> Result<Self, DistortionError> {
        let (vertex_src, fragment_src) = dialect.sources();
        let program = unsafe { compile_program(gl, vertex_src, fragment_src) }?;

        let located = unsafe { Self::locate(gl, program) };
        if located.is_err() {
            unsafe { gl.delete_program(program) };
        }
        located
    }

    unsafe fn locate(gl: &G, program: G::Program) -> Result<Self, DistortionError> {
        unsafe {
            let position = gl
                .get_attrib_location(program, POSITION_ATTRIBUTE)
                .ok_or(DistortionError::MissingAttribute(POSITION_ATTRIBUTE))?;
            let tex_coords = gl
                .get_attrib_location(program, TEX_COORDS_ATTRIBUTE)
                .ok_or(DistortionError::MissingAttribute(TEX_COORDS_ATTRIBUTE))?;
            let start = gl
                .get_uniform_location(program, START_UNIFORM)
                .ok_or(DistortionError::MissingUniform(START_UNIFORM))?;
            let end = gl
                .get_uniform_location(program, END_UNIFORM)
                .ok_or(DistortionError::MissingUniform(END_UNIFORM))?;
            let texture = gl.get_uniform_location(program, TEXTURE_UNIFORM);

            debug!("distortion program {program:?}: a_position={position}, a_tex_coords={tex_coords}");

            Ok(Self {
                program,
                position,
                tex_coords,
                start,
                end,
                texture,
            })
        }
    }
}

/// Compile a shader program from vertex and fragment source strings.
///
/// Both stages are compiled before a program object is created, so a compile
/// failure never allocates one. The compiled shader objects are detached and
/// deleted after successful linking, so only the program handle needs to be
/// cleaned up by the caller.
///
/// # Safety
///
/// Requires a valid, current OpenGL context.
///
/// # Errors
///
/// Returns [`DistortionError::ShaderCompile`] or
/// [`DistortionError::ProgramLink`] with the driver's info log. Failures are
/// also logged.
pub unsafe fn compile_program<G: GlApi + ?Sized>(
    gl: &G,
    vertex_src: &str,
    fragment_src: &str,
) -> Result<G::Program, DistortionError> {
    let vs = unsafe { compile_shader(gl, gl::VERTEX_SHADER, vertex_src) }?;
    let fs = match unsafe { compile_shader(gl, gl::FRAGMENT_SHADER, fragment_src) } {
        Ok(fs) => fs,
        Err(err) => {
            unsafe { gl.delete_shader(vs) };
            return Err(err);
        }
    };

    let program = match unsafe { gl.create_program() } {
        Ok(program) => program,
        Err(reason) => {
            unsafe {
                gl.delete_shader(vs);
                gl.delete_shader(fs);
            }
            return Err(DistortionError::ResourceCreation {
                what: "program",
                reason,
            });
        }
    };

    unsafe {
        gl.attach_shader(program, vs);
        gl.attach_shader(program, fs);
        gl.link_program(program);

        if !gl.get_program_link_status(program) {
            let log = gl.get_program_info_log(program);
            error!("could not link distortion program: {log}");
            gl.delete_program(program);
            gl.delete_shader(vs);
            gl.delete_shader(fs);
            return Err(DistortionError::ProgramLink { log });
        }

        // Shaders can be detached and deleted after successful linking.
        gl.detach_shader(program, vs);
        gl.detach_shader(program, fs);
        gl.delete_shader(vs);
        gl.delete_shader(fs);
    }

    Ok(program)
}

/// Compile a single shader stage (vertex or fragment) from source.
///
/// # Safety
///
/// Requires a valid, current OpenGL context.
unsafe fn compile_shader<G: GlApi + ?Sized>(
    gl: &G,
    shader_type: u32,
    source: &str,
) -> Result<G::Shader, DistortionError> {
    let stage = if shader_type == gl::VERTEX_SHADER {
        "vertex"
    } else {
        "fragment"
    };

    unsafe {
        let shader = gl
            .create_shader(shader_type)
            .map_err(|reason| DistortionError::ResourceCreation {
                what: "shader",
                reason,
            })?;
        gl.shader_source(shader, source);
        gl.compile_shader(shader);

        if !gl.get_shader_compile_status(shader) {
            let log = gl.get_shader_info_log(shader);
            error!("could not compile {stage} shader (type {shader_type:#06x}): {log}");
            gl.delete_shader(shader);
            return Err(DistortionError::ShaderCompile {
                stage,
                kind: shader_type,
                log,
            });
        }

        Ok(shader)
    }
}
