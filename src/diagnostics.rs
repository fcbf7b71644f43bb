//! `glGetError` helpers.
//!
//! Different call sites want different reactions to a driver error, so the
//! reaction is an explicit [`ErrorPolicy`] argument rather than a global
//! setting. The renderer's per-frame checks use [`ErrorPolicy::Log`]; eye
//! texture uploads use [`ErrorPolicy::Fail`].

use log::error;

use crate::{
    error::DistortionError,
    gl::{self, GlApi},
};

/// Upper bound on error flags drained per check. A lost context keeps
/// reporting `CONTEXT_LOST`, so the loop must not be open-ended.
const MAX_DRAINED_ERRORS: usize = 16;

/// What a failed error check does after logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Log and carry on.
    #[default]
    Log,
    /// Log and return the first error to the caller.
    Fail,
    /// Log and abort the process. Meant for development builds, where a GL
    /// error is a programming mistake that should be impossible to miss.
    Abort,
}

/// Symbolic name of a `glGetError` value.
#[must_use]
pub fn gl_error_name(code: u32) -> &'static str {
    match code {
        gl::NO_ERROR => "GL_NO_ERROR",
        gl::INVALID_ENUM => "GL_INVALID_ENUM",
        gl::INVALID_VALUE => "GL_INVALID_VALUE",
        gl::INVALID_OPERATION => "GL_INVALID_OPERATION",
        gl::STACK_OVERFLOW => "GL_STACK_OVERFLOW",
        gl::STACK_UNDERFLOW => "GL_STACK_UNDERFLOW",
        gl::OUT_OF_MEMORY => "GL_OUT_OF_MEMORY",
        gl::INVALID_FRAMEBUFFER_OPERATION => "GL_INVALID_FRAMEBUFFER_OPERATION",
        gl::CONTEXT_LOST => "GL_CONTEXT_LOST",
        _ => "unknown GL error",
    }
}

/// Drain pending GL errors, logging each one against `label`.
///
/// # Safety
///
/// Requires a current GL context.
///
/// # Errors
///
/// With [`ErrorPolicy::Fail`], returns the first drained error as
/// [`DistortionError::Gl`]. The other policies always return `Ok`.
pub unsafe fn check_gl_error<G: GlApi + ?Sized>(
    gl: &G,
    label: &str,
    policy: ErrorPolicy,
) -> Result<(), DistortionError> {
    let mut first = None;

    for _ in 0..MAX_DRAINED_ERRORS {
        let code = unsafe { gl.get_error() };
        if code == gl::NO_ERROR {
            break;
        }
        let name = gl_error_name(code);
        error!("GL error {name} ({code:#06x}) after {label}");
        first.get_or_insert(code);
    }

    let Some(code) = first else {
        return Ok(());
    };

    match policy {
        ErrorPolicy::Log => Ok(()),
        ErrorPolicy::Fail => Err(DistortionError::Gl {
            label: label.to_owned(),
            code,
            name: gl_error_name(code),
        }),
        ErrorPolicy::Abort => std::process::abort(),
    }
}
