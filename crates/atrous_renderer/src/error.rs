//! Errors surfaced to callers of the path tracer.

use atrous_core::SceneError;
use thiserror::Error;

/// Fatal problems for the current render session.
///
/// Degenerate samples and out-of-range denoise weights are not errors: the
/// integrator drops the sample and the denoiser clamps the weight.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("Invalid state: {0}")]
    InvalidState(&'static str),

    #[error("Failed to allocate {bytes} bytes for the {buffer} buffer")]
    Allocation { buffer: &'static str, bytes: usize },

    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    #[error("Output buffer holds {actual} pixels, expected {expected}")]
    BufferSize { expected: usize, actual: usize },
}

/// Result alias used throughout the renderer.
pub type Result<T> = std::result::Result<T, RenderError>;
