//! Plain data types shared by the renderer and its callers.
//!
//! Nothing in here touches the GL context: eyes, per-eye storage, distortion
//! meshes, eye texture descriptions and viewport rectangles.

use std::ops::{Index, IndexMut};

use crate::error::MeshError;

/// One of the two stereo viewpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Eye {
    /// The left eye, drawn into the left half of the viewport.
    Left,
    /// The right eye, drawn into the right half of the viewport.
    Right,
}

impl Eye {
    /// Both eyes, in draw order.
    pub const BOTH: [Eye; 2] = [Eye::Left, Eye::Right];
}

/// A value per eye, with named access.
///
/// Eye count is fixed at two, so this is a record rather than a collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PerEye<T> {
    /// Value for [`Eye::Left`].
    pub left: T,
    /// Value for [`Eye::Right`].
    pub right: T,
}

impl<T> PerEye<T> {
    /// Build a record by evaluating `f` for the left eye, then the right.
    /// Stops at the first error.
    ///
    /// # Errors
    ///
    /// Returns the first error produced by `f`.
    pub fn try_from_fn<E>(mut f: impl FnMut(Eye) -> Result<T, E>) -> Result<Self, E> {
        let left = f(Eye::Left)?;
        let right = f(Eye::Right)?;
        Ok(Self { left, right })
    }

    /// Iterate over `(eye, value)` pairs, left first.
    pub fn iter(&self) -> impl Iterator<Item = (Eye, &T)> {
        [(Eye::Left, &self.left), (Eye::Right, &self.right)].into_iter()
    }
}

impl<T> Index<Eye> for PerEye<T> {
    type Output = T;

    fn index(&self, eye: Eye) -> &T {
        match eye {
            Eye::Left => &self.left,
            Eye::Right => &self.right,
        }
    }
}

impl<T> IndexMut<Eye> for PerEye<T> {
    fn index_mut(&mut self, eye: Eye) -> &mut T {
        match eye {
            Eye::Left => &mut self.left,
            Eye::Right => &mut self.right,
        }
    }
}

/// A 2D lens-distortion mesh for one eye.
///
/// Positions are `(x, y)` pairs in normalized device coordinates, UVs are
/// parallel `(u, v)` pairs in `[0, 1]`, and indices describe a triangle
/// strip. The renderer copies the arrays into GPU buffers; the mesh is not
/// referenced after [`set_mesh`](crate::DistortionRenderer::set_mesh)
/// returns.
#[derive(Debug, Clone, PartialEq)]
pub struct DistortionMesh {
    positions: Vec<f32>,
    uvs: Vec<f32>,
    indices: Vec<u32>,
}

impl DistortionMesh {
    /// Create a mesh from flat position, UV and index arrays.
    ///
    /// # Errors
    ///
    /// Returns a [`MeshError`] if the position array has odd length, the UV
    /// array does not mirror the position array, or an index points past
    /// the last vertex.
    pub fn new(positions: Vec<f32>, uvs: Vec<f32>, indices: Vec<u32>) -> Result<Self, MeshError> {
        if positions.len() % 2 != 0 {
            return Err(MeshError::OddCoordinateCount(positions.len()));
        }
        if uvs.len() != positions.len() {
            return Err(MeshError::UvCountMismatch {
                positions: positions.len(),
                uvs: uvs.len(),
            });
        }

        let vertex_count = positions.len() / 2;
        if let Some((at, &index)) = indices
            .iter()
            .enumerate()
            .find(|&(_, &i)| i as usize >= vertex_count)
        {
            return Err(MeshError::IndexOutOfRange {
                at,
                index,
                vertex_count,
            });
        }

        Ok(Self {
            positions,
            uvs,
            indices,
        })
    }

    /// Number of vertices (position pairs).
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 2
    }

    /// Number of triangle-strip indices.
    #[must_use]
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// Flat `(x, y)` position pairs.
    #[must_use]
    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    /// Flat `(u, v)` texture coordinate pairs, one per vertex.
    #[must_use]
    pub fn uvs(&self) -> &[f32] {
        &self.uvs
    }

    /// Triangle-strip indices.
    #[must_use]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }
}

/// A borrowed eye texture plus the sub-rectangle of it that is visible.
///
/// `texture` is a raw GL texture name owned by the caller; the renderer only
/// binds it. Bounds are normalized texture coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeTextureDescription {
    /// Raw GL texture name.
    pub texture: u64,
    /// Minimum `u` of the visible region.
    pub left_u: f32,
    /// Maximum `u` of the visible region.
    pub right_u: f32,
    /// Minimum `v` of the visible region.
    pub bottom_v: f32,
    /// Maximum `v` of the visible region.
    pub top_v: f32,
}

impl EyeTextureDescription {
    /// Sample the whole texture.
    #[must_use]
    pub fn full(texture: u64) -> Self {
        Self {
            texture,
            left_u: 0.0,
            right_u: 1.0,
            bottom_v: 0.0,
            top_v: 1.0,
        }
    }

    /// Sample one half of a texture that holds both eyes side by side.
    #[must_use]
    pub fn side_by_side(texture: u64, eye: Eye) -> Self {
        let (left_u, right_u) = match eye {
            Eye::Left => (0.0, 0.5),
            Eye::Right => (0.5, 1.0),
        };
        Self {
            texture,
            left_u,
            right_u,
            bottom_v: 0.0,
            top_v: 1.0,
        }
    }

    /// Value of the `u_start` uniform: `(left_u, bottom_v)`.
    #[must_use]
    pub fn window_start(&self) -> [f32; 2] {
        [self.left_u, self.bottom_v]
    }

    /// Value of the `u_end` uniform: `(right_u, top_v)`.
    #[must_use]
    pub fn window_end(&self) -> [f32; 2] {
        [self.right_u, self.top_v]
    }

    /// The texture coordinate sampled for mesh coordinate `uv`.
    ///
    /// Same arithmetic as the distortion fragment shader.
    #[must_use]
    pub fn sample_coords(&self, [u, v]: [f32; 2]) -> [f32; 2] {
        let [su, sv] = self.window_start();
        let [eu, ev] = self.window_end();
        [su + u * (eu - su), sv + v * (ev - sv)]
    }
}

/// A window-space rectangle in pixels, origin at the bottom left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    /// Left edge.
    pub x: i32,
    /// Bottom edge.
    pub y: i32,
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
}

impl Viewport {
    /// Create a viewport rectangle.
    #[must_use]
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The scissor box an eye is clipped to: the left or right half.
    ///
    /// Halves use integer division, so with an odd width the last column is
    /// covered by neither eye. The right half's origin saturates at
    /// `i32::MAX`.
    #[must_use]
    pub fn eye_scissor(&self, eye: Eye) -> Viewport {
        let half = self.width / 2;
        let x = match eye {
            Eye::Left => self.x,
            Eye::Right => self.x.saturating_add(half),
        };
        Viewport::new(x, self.y, half, self.height)
    }
}
