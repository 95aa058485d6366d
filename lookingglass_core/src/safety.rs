//! Destination clearance check.
//!
//! The gate places a capsule covering the body's standing volume at a
//! candidate position and asks the oracle whether anything is in the way.
//! The capsule is lifted by `height_buffer` so the floor under the
//! destination does not count as an obstruction.
//!
//! ```text
//!        ◯  end   = start + up * (height - 2r)
//!        │
//!        ◯  start = destination + up * (r + buffer)
//!   ─────┴───── destination (feet)
//! ```

use lookingglass_env::{BodyExtents, CapsuleQuery, LayerMask, OverlapOracle};
use nalgebra::Vector3;
use tracing::debug;

/// Clearance margin under the capsule, in meters.
pub const DEFAULT_HEIGHT_BUFFER: f64 = 0.05;

/// Capsule overlap gate in front of an [`OverlapOracle`].
#[derive(Debug, Clone)]
pub struct SafetyGate<O> {
    oracle: O,
    height_buffer: f64,
    mask: LayerMask,
}

impl<O: OverlapOracle> SafetyGate<O> {
    /// Creates a gate. `height_buffer` is validated by the config layer.
    pub fn new(oracle: O, height_buffer: f64, mask: LayerMask) -> Self {
        Self {
            oracle,
            height_buffer,
            mask,
        }
    }

    /// Builds the query for a body standing at `destination`.
    ///
    /// When `height <= 2 * radius` the end lands at or below the start.
    /// That segment is passed on unchanged; the oracle treats it as (at
    /// least) a sphere test.
    pub fn capsule_for(&self, destination: &Vector3<f64>, extents: &BodyExtents) -> CapsuleQuery {
        let up = extents.up_axis();
        let start = destination + up.as_ref() * (extents.radius + self.height_buffer);
        let end = start + up.as_ref() * (extents.height - 2.0 * extents.radius);

        CapsuleQuery {
            start,
            end,
            radius: extents.radius,
            mask: self.mask,
        }
    }

    /// Returns true if a body at `destination` would overlap the environment.
    pub fn is_obstructed(&self, destination: &Vector3<f64>, extents: &BodyExtents) -> bool {
        let query = self.capsule_for(destination, extents);
        if extents.is_degenerate() {
            debug!(
                height = extents.height,
                radius = extents.radius,
                "Degenerate capsule, querying as sphere"
            );
        }

        let hit = self.oracle.check_capsule(&query);
        debug!(
            start = ?query.start,
            end = ?query.end,
            radius = query.radius,
            mask = query.mask.0,
            hit,
            "Capsule clearance check"
        );
        hit
    }

    pub fn height_buffer(&self) -> f64 {
        self.height_buffer
    }

    pub fn mask(&self) -> LayerMask {
        self.mask
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }
}
