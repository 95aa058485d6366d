//! The tracked body, its camera, and their shadows.

use lookingglass_env::{BodyExtents, Pose, ViewParams};
use serde::{Deserialize, Serialize};

/// The player-controlled body.
///
/// Written by the host's motion controller each tick, and by the engine
/// only when a flip commits (position overwrite).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackedEntity {
    pub pose: Pose,
    pub extents: BodyExtents,
}

impl TrackedEntity {
    pub fn new(pose: Pose, extents: BodyExtents) -> Self {
        Self { pose, extents }
    }
}

/// The camera attached to the tracked body. Read-only to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ObservationSource {
    pub pose: Pose,
    pub params: ViewParams,
}

impl ObservationSource {
    pub fn new(pose: Pose, params: ViewParams) -> Self {
        Self { pose, params }
    }
}

/// Mirror of the tracked body in the other world.
///
/// Fully derived each synchronization; it carries nothing across ticks
/// besides the pose downstream readers may look at.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ShadowEntity {
    pub pose: Pose,
}

/// Mirror of the camera in the other world, the capture pipeline's source.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ShadowObservation {
    pub pose: Pose,
    pub params: ViewParams,
}
