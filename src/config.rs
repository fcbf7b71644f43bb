//! Renderer configuration.

/// Clear color used before drawing the eyes: fully opaque black.
pub const DEFAULT_CLEAR_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// Tunables for a [`DistortionRenderer`](crate::DistortionRenderer).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistortionConfig {
    /// RGBA color the whole viewport is cleared to each frame.
    pub clear_color: [f32; 4],
    /// Query `glGetError` after each public operation and log what it
    /// reports. Each query is a driver round trip.
    pub check_errors: bool,
}

impl Default for DistortionConfig {
    fn default() -> Self {
        Self {
            clear_color: DEFAULT_CLEAR_COLOR,
            check_errors: true,
        }
    }
}

impl DistortionConfig {
    /// Replace the clear color.
    #[must_use]
    pub fn with_clear_color(mut self, clear_color: [f32; 4]) -> Self {
        self.clear_color = clear_color;
        self
    }

    /// Enable or disable post-call error queries.
    #[must_use]
    pub fn with_error_checks(mut self, check_errors: bool) -> Self {
        self.check_errors = check_errors;
        self
    }
}
