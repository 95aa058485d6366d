//! Error types for the LookingGlass environment abstraction.

use thiserror::Error;

/// Errors raised at the host boundary.
#[derive(Debug, Error)]
pub enum EnvError {
    /// Capture target has a zero-sized or oversized resolution
    #[error("Invalid capture target: {width}x{height}")]
    InvalidCaptureTarget {
        /// Requested width in pixels
        width: u32,
        /// Requested height in pixels
        height: u32,
    },

    /// A capture update arrived before any target was configured
    #[error("Capture pipeline has no target configured")]
    CaptureNotConfigured,
}

impl EnvError {
    /// Creates an invalid-target error.
    pub fn invalid_target(width: u32, height: u32) -> Self {
        Self::InvalidCaptureTarget { width, height }
    }
}
