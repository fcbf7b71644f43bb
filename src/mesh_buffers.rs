//! GPU-resident distortion meshes, one set of buffers per eye.

use log::debug;

use crate::{
    error::DistortionError,
    gl::{self, GlApi},
    types::{DistortionMesh, Eye, PerEye},
};

/// The three static buffers holding one eye's mesh.
#[derive(Debug, Clone, Copy)]
pub struct EyeBuffers<B> {
    /// `vec2` positions.
    pub vertices: B,
    /// `vec2` mesh texture coordinates.
    pub uvs: B,
    /// `u32` triangle-strip indices.
    pub indices: B,
    /// Indices uploaded by the last [`MeshBufferStore::upload`]. Zero until
    /// a mesh is set.
    pub index_count: usize,
}

impl<B: Copy> EyeBuffers<B> {
    fn handles(&self) -> [B; 3] {
        [self.vertices, self.uvs, self.indices]
    }
}

/// Owns the vertex, UV and index buffers for both eyes.
///
/// Buffers are created once and reused: every upload replaces the previous
/// contents of that eye's buffers wholesale.
pub struct MeshBufferStore<G: GlApi> {
    /// `None` once the buffers have been released.
    eyes: Option<PerEye<EyeBuffers<G::Buffer>>>,
}

impl<G: GlApi> MeshBufferStore<G> {
    /// Allocate six empty buffers.
    ///
    /// # Safety
    ///
    /// Requires a valid, current OpenGL context.
    ///
    /// # Errors
    ///
    /// Returns [`DistortionError::ResourceCreation`] if the driver refuses a
    /// buffer. Buffers created before the failure are deleted.
    pub unsafe fn new(gl: &G) -> Result<Self, DistortionError> {
        let mut created = Vec::with_capacity(6);
        let mut create = || -> Result<G::Buffer, DistortionError> {
            let buffer = unsafe { gl.create_buffer() }.map_err(|reason| {
                DistortionError::ResourceCreation {
                    what: "buffer",
                    reason,
                }
            })?;
            created.push(buffer);
            Ok(buffer)
        };

        let eyes: Result<PerEye<_>, DistortionError> = PerEye::try_from_fn(|_| {
            Ok(EyeBuffers {
                vertices: create()?,
                uvs: create()?,
                indices: create()?,
                index_count: 0,
            })
        });

        match eyes {
            Ok(eyes) => {
                debug!("created distortion mesh buffers {created:?}");
                Ok(Self { eyes: Some(eyes) })
            }
            Err(err) => {
                for buffer in created {
                    unsafe { gl.delete_buffer(buffer) };
                }
                Err(err)
            }
        }
    }

    /// Upload `mesh` into `eye`'s buffers as static data, replacing whatever
    /// they held. Returns `false` if the store has been released.
    ///
    /// Leaves `ARRAY_BUFFER` and `ELEMENT_ARRAY_BUFFER` unbound.
    ///
    /// # Safety
    ///
    /// Requires the context the store was created with to be current.
    pub unsafe fn upload(&mut self, gl: &G, mesh: &DistortionMesh, eye: Eye) -> bool {
        let Some(eyes) = self.eyes.as_mut() else {
            return false;
        };
        let buffers = &mut eyes[eye];

        unsafe {
            gl.bind_buffer(gl::ARRAY_BUFFER, Some(buffers.vertices));
            gl.buffer_data_u8_slice(
                gl::ARRAY_BUFFER,
                bytemuck::cast_slice(mesh.positions()),
                gl::STATIC_DRAW,
            );

            gl.bind_buffer(gl::ARRAY_BUFFER, Some(buffers.uvs));
            gl.buffer_data_u8_slice(
                gl::ARRAY_BUFFER,
                bytemuck::cast_slice(mesh.uvs()),
                gl::STATIC_DRAW,
            );

            gl.bind_buffer(gl::ELEMENT_ARRAY_BUFFER, Some(buffers.indices));
            gl.buffer_data_u8_slice(
                gl::ELEMENT_ARRAY_BUFFER,
                bytemuck::cast_slice(mesh.indices()),
                gl::STATIC_DRAW,
            );

            gl.bind_buffer(gl::ARRAY_BUFFER, None);
            gl.bind_buffer(gl::ELEMENT_ARRAY_BUFFER, None);
        }

        buffers.index_count = mesh.index_count();
        debug!(
            "uploaded {eye:?} distortion mesh: {} vertices, {} indices",
            mesh.vertex_count(),
            mesh.index_count()
        );
        true
    }

    /// Buffers for `eye`, or `None` once released.
    #[must_use]
    pub fn eye(&self, eye: Eye) -> Option<&EyeBuffers<G::Buffer>> {
        self.eyes.as_ref().map(|eyes| &eyes[eye])
    }

    /// Index count for `eye`; zero when no mesh is set or after release.
    #[must_use]
    pub fn index_count(&self, eye: Eye) -> usize {
        self.eye(eye).map_or(0, |buffers| buffers.index_count)
    }

    /// Whether both eyes have a non-empty mesh.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        Eye::BOTH.iter().all(|&eye| self.index_count(eye) > 0)
    }

    /// Whether [`release`](Self::release) has run.
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.eyes.is_none()
    }

    /// Delete all six buffers. Returns how many were deleted, which is zero
    /// on every call after the first.
    ///
    /// # Safety
    ///
    /// Requires the context the store was created with to be current.
    pub unsafe fn release(&mut self, gl: &G) -> usize {
        let Some(eyes) = self.eyes.take() else {
            return 0;
        };

        let mut released = 0;
        for (_, buffers) in eyes.iter() {
            for buffer in buffers.handles() {
                unsafe { gl.delete_buffer(buffer) };
                released += 1;
            }
        }
        debug!("released {released} distortion mesh buffers");
        released
    }
}
