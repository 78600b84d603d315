//! Error types for the Galaxy3D rasterizer
//!
//! This module defines the error types used throughout the rasterizer,
//! including GPU allocation, attachment and framebuffer validation failures.

use std::fmt;

/// Result type for Galaxy3D rasterizer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Galaxy3D rasterizer errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Backend-specific error (OpenGL, mock device, etc.)
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// GPU object creation returned no object (framebuffer, renderbuffer, texture)
    AllocationFailed(String),

    /// Attachment requested on a color slot the render target does not have
    UnsupportedSlot {
        /// Requested slot index
        slot: usize,
        /// Number of color slots available
        max: usize,
    },

    /// Framebuffer failed its completeness check
    IncompleteFramebuffer(String),

    /// Invalid resource (stale key, empty slot, wrong attachment kind)
    InvalidResource(String),

    /// Initialization failed (rasterizer, subsystems)
    InitializationFailed(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::AllocationFailed(msg) => write!(f, "Allocation failed: {}", msg),
            Error::UnsupportedSlot { slot, max } => write!(
                f,
                "Attaching to index {} framebuffer slot unsupported. Use at most {}",
                slot, max
            ),
            Error::IncompleteFramebuffer(msg) => write!(f, "Incomplete framebuffer: {}", msg),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
