//! Startup configuration errors.

use crate::frames::WorldId;
use lookingglass_env::EnvError;
use thiserror::Error;

/// Errors that stop an engine from being built.
///
/// All of these are fatal at startup. A rejected flip is not an error and
/// never shows up here.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Anchor for {0} is not configured")]
    MissingAnchor(WorldId),

    #[error("Anchor for {0} has non-finite coordinates")]
    NonFiniteAnchor(WorldId),

    #[error("Safety clearance must be finite and positive, got {0}")]
    InvalidClearance(f64),

    #[error("Invalid body extents: height={height}, radius={radius}")]
    InvalidExtents { height: f64, radius: f64 },

    #[error("Capture target error: {0}")]
    Capture(#[from] EnvError),

    #[error("Config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Config I/O error: {0}")]
    Io(#[from] std::io::Error),
}
