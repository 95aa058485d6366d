//! Anchor-to-anchor pose mapping.
//!
//! Both worlds share the same up axis and rotation convention, so only the
//! position moves: `p' = p - from + to`. Orientation passes through.
//!
//! Always mirror from the live source pose. Feeding a previous mirror
//! result back in would accumulate rounding error tick over tick.

use lookingglass_env::Pose;
use nalgebra::Vector3;

/// Maps a position from the `from` anchor's world into the `to` anchor's world.
#[inline]
pub fn mirror_position(
    position: &Vector3<f64>,
    from: &Vector3<f64>,
    to: &Vector3<f64>,
) -> Vector3<f64> {
    position - from + to
}

/// Maps a pose between worlds. Orientation is unchanged.
#[inline]
pub fn mirror(pose: &Pose, from: &Vector3<f64>, to: &Vector3<f64>) -> Pose {
    Pose {
        position: mirror_position(&pose.position, from, to),
        orientation: pose.orientation,
    }
}
