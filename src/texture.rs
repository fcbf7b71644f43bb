//! Uploading decoded images as eye textures.
//!
//! Texture uploads happen at load time, where a GL error means the
//! application and driver disagree about something. They are checked with
//! [`ErrorPolicy::Fail`] by default so the error reaches the caller instead
//! of producing a black eye at runtime.

use image::RgbaImage;
use log::debug;

use crate::{
    diagnostics::{check_gl_error, ErrorPolicy},
    error::DistortionError,
    gl::{self, GlApi},
    types::{Eye, EyeTextureDescription},
};

/// A 2D RGBA texture created by [`EyeTexture::from_rgba`].
///
/// The application owns it: the renderer only borrows its raw name through
/// an [`EyeTextureDescription`]. Call [`delete`](Self::delete) to free it.
#[derive(Debug, Clone, Copy)]
pub struct EyeTexture<T> {
    texture: T,
    raw: u64,
    width: u32,
    height: u32,
}

/// Convert a `u32` to `i32` for GL API calls.
fn gl_size(value: u32, what: &'static str) -> Result<i32, DistortionError> {
    i32::try_from(value).map_err(|_| DistortionError::ResourceCreation {
        what,
        reason: format!("dimension {value} exceeds i32::MAX"),
    })
}

// GL enum values are far below i32::MAX.
#[expect(clippy::cast_possible_wrap)]
const fn param(value: u32) -> i32 {
    value as i32
}

impl<T: Copy> EyeTexture<T> {
    /// Create a texture from decoded RGBA pixels.
    ///
    /// Wrapping is clamp-to-edge and magnification linear. With `mipmaps`,
    /// a mip chain is generated and minification uses
    /// `LINEAR_MIPMAP_NEAREST`; otherwise `LINEAR`. The `TEXTURE_2D`
    /// binding of the active unit is left unbound.
    ///
    /// # Safety
    ///
    /// Requires a valid, current OpenGL context.
    ///
    /// # Errors
    ///
    /// Returns an error if the texture cannot be created, the image is too
    /// large for GL, or `glGetError` reports a failure. The texture is
    /// deleted on error.
    pub unsafe fn from_rgba<G>(
        gl: &G,
        image: &RgbaImage,
        mipmaps: bool,
    ) -> Result<Self, DistortionError>
    where
        G: GlApi<Texture = T> + ?Sized,
    {
        unsafe { Self::from_rgba_with_policy(gl, image, mipmaps, ErrorPolicy::Fail) }
    }

    /// Like [`from_rgba`](Self::from_rgba), with an explicit reaction to GL
    /// errors. [`ErrorPolicy::Abort`] gives the crash-early behavior some
    /// development builds want.
    ///
    /// # Safety
    ///
    /// Requires a valid, current OpenGL context.
    ///
    /// # Errors
    ///
    /// As [`from_rgba`](Self::from_rgba); GL errors only become errors under
    /// [`ErrorPolicy::Fail`].
    pub unsafe fn from_rgba_with_policy<G>(
        gl: &G,
        image: &RgbaImage,
        mipmaps: bool,
        policy: ErrorPolicy,
    ) -> Result<Self, DistortionError>
    where
        G: GlApi<Texture = T> + ?Sized,
    {
        let (width, height) = image.dimensions();
        let w = gl_size(width, "texture")?;
        let h = gl_size(height, "texture")?;

        let texture = unsafe { gl.create_texture() }.map_err(|reason| {
            DistortionError::ResourceCreation {
                what: "texture",
                reason,
            }
        })?;

        let min_filter = if mipmaps {
            gl::LINEAR_MIPMAP_NEAREST
        } else {
            gl::LINEAR
        };

        unsafe {
            gl.bind_texture(gl::TEXTURE_2D, Some(texture));
            gl.tex_parameter_i32(gl::TEXTURE_2D, gl::TEXTURE_WRAP_S, param(gl::CLAMP_TO_EDGE));
            gl.tex_parameter_i32(gl::TEXTURE_2D, gl::TEXTURE_WRAP_T, param(gl::CLAMP_TO_EDGE));
            gl.tex_parameter_i32(gl::TEXTURE_2D, gl::TEXTURE_MIN_FILTER, param(min_filter));
            gl.tex_parameter_i32(gl::TEXTURE_2D, gl::TEXTURE_MAG_FILTER, param(gl::LINEAR));
            // GL ES 2.0 requires the internal format to equal the format.
            gl.tex_image_2d(
                gl::TEXTURE_2D,
                0,
                param(gl::RGBA),
                w,
                h,
                0,
                gl::RGBA,
                gl::UNSIGNED_BYTE,
                Some(image.as_raw().as_slice()),
            );
            if mipmaps {
                gl.generate_mipmap(gl::TEXTURE_2D);
            }
            gl.bind_texture(gl::TEXTURE_2D, None);
        }

        if let Err(err) = unsafe { check_gl_error(gl, "eye texture upload", policy) } {
            unsafe { gl.delete_texture(texture) };
            return Err(err);
        }

        let raw = gl.texture_to_raw(texture);
        debug!("uploaded {width}x{height} eye texture {raw}");
        Ok(Self {
            texture,
            raw,
            width,
            height,
        })
    }

    /// The backend texture handle.
    #[must_use]
    pub fn handle(&self) -> T {
        self.texture
    }

    /// The raw GL name, as used in [`EyeTextureDescription::texture`].
    #[must_use]
    pub fn raw(&self) -> u64 {
        self.raw
    }

    /// `(width, height)` in pixels.
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Describe the whole texture for one eye.
    #[must_use]
    pub fn full_description(&self) -> EyeTextureDescription {
        EyeTextureDescription::full(self.raw)
    }

    /// Describe `eye`'s half of a side-by-side stereo texture.
    #[must_use]
    pub fn side_by_side_description(&self, eye: Eye) -> EyeTextureDescription {
        EyeTextureDescription::side_by_side(self.raw, eye)
    }

    /// Delete the texture.
    ///
    /// # Safety
    ///
    /// Requires the context the texture was created with to be current. The
    /// texture must not be used afterwards.
    pub unsafe fn delete<G>(self, gl: &G)
    where
        G: GlApi<Texture = T> + ?Sized,
    {
        unsafe { gl.delete_texture(self.texture) };
    }
}
