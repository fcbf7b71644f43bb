//! Lens-distortion correction for head-mounted stereo viewers, rendered with
//! OpenGL.
//!
//! A head-mounted viewer looks at the screen through lenses that distort the
//! image. This crate pre-warps two eye textures through per-eye distortion
//! meshes so the image looks correct through the lenses. The meshes
//! themselves (positions, texture coordinates and triangle-strip indices)
//! come from an external lens model; this crate owns the GPU side only.
//!
//! [`GlDistortionRenderer`] keeps one set of static vertex/UV/index buffers
//! per eye and a small shader program. Each frame,
//! [`render_eye_to_display`](DistortionRenderer::render_eye_to_display)
//! clears the target and draws the left eye into the left half of the
//! viewport and the right eye into the right half, each clipped by a scissor
//! box and sampling only the visible sub-rectangle of its eye texture.
//!
//! # Features
//!
//! - **Two backends**: OpenGL ES 2.0 and OpenGL 3.1+ core profile, chosen
//!   through [`create_distortion_renderer`].
//! - **Explicit context**: all GL calls go through the [`GlApi`] trait,
//!   implemented for [`glow::Context`] with the `glow` feature.
//! - **Documented state footprint**: see the [`render`] module for exactly
//!   which GL state each operation leaves modified.
//! - **Eye texture uploads** from decoded [`image::RgbaImage`]s.
//!
//! # Safety
//!
//! Creating and using a renderer requires a valid OpenGL context that is
//! current on the calling thread. All GL-touching methods are `unsafe`
//! because they issue raw GL calls. The renderer is not thread-safe.

mod config;
mod diagnostics;
mod error;
pub mod gl;
mod mesh_buffers;
pub mod render;
mod shaders;
mod texture;
mod types;

#[cfg(test)]
mod testing;

pub use config::{DistortionConfig, DEFAULT_CLEAR_COLOR};
pub use diagnostics::{check_gl_error, gl_error_name, ErrorPolicy};
pub use error::{DistortionError, MeshError};
pub use gl::GlApi;
pub use mesh_buffers::{EyeBuffers, MeshBufferStore};
pub use render::{
    create_distortion_renderer, Backend, DistortionRenderer, GlDistortionRenderer, RendererState,
};
pub use shaders::{compile_program, DistortionProgram, ShaderDialect};
pub use texture::EyeTexture;
pub use types::{DistortionMesh, Eye, EyeTextureDescription, PerEye, Viewport};
