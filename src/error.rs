//! Error types.

use thiserror::Error;

/// Errors surfaced while creating GL resources or checking GL state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DistortionError {
    /// A shader stage failed to compile.
    #[error("could not compile {stage} shader (type {kind:#06x}): {log}")]
    ShaderCompile {
        /// `"vertex"` or `"fragment"`.
        stage: &'static str,
        /// The GL shader type enum.
        kind: u32,
        /// Compiler info log.
        log: String,
    },

    /// The program failed to link.
    #[error("could not link program: {log}")]
    ProgramLink {
        /// Linker info log.
        log: String,
    },

    /// A vertex attribute the renderer needs is not active in the program.
    #[error("attribute `{0}` missing from distortion program")]
    MissingAttribute(&'static str),

    /// A uniform the renderer needs is not active in the program.
    #[error("uniform `{0}` missing from distortion program")]
    MissingUniform(&'static str),

    /// The driver refused to create an object.
    #[error("could not create {what}: {reason}")]
    ResourceCreation {
        /// Kind of object, e.g. `"buffer"`.
        what: &'static str,
        /// Driver-provided reason.
        reason: String,
    },

    /// `glGetError` reported an error after the labelled call site.
    #[error("GL error {name} ({code:#06x}) after {label}")]
    Gl {
        /// Call site label.
        label: String,
        /// Raw error enum.
        code: u32,
        /// Symbolic name of `code`.
        name: &'static str,
    },
}

/// Reasons a [`DistortionMesh`](crate::DistortionMesh) is rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MeshError {
    /// Positions must come in `(x, y)` pairs.
    #[error("position array has odd length {0}")]
    OddCoordinateCount(usize),

    /// UVs must mirror positions one-to-one.
    #[error("{uvs} uv components for {positions} position components")]
    UvCountMismatch {
        /// Length of the position array.
        positions: usize,
        /// Length of the UV array.
        uvs: usize,
    },

    /// An index points past the last vertex.
    #[error("index {index} at position {at} exceeds vertex count {vertex_count}")]
    IndexOutOfRange {
        /// Position of the bad index in the index array.
        at: usize,
        /// The bad index.
        index: u32,
        /// Number of vertices in the mesh.
        vertex_count: usize,
    },
}
