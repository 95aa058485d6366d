//! Common value types shared between the engine and its host.

use nalgebra::{Unit, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// Position and orientation of an object in world space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// World-space position in meters
    pub position: Vector3<f64>,

    /// World-space rotation
    pub orientation: UnitQuaternion<f64>,
}

impl Pose {
    /// Creates a pose from its parts.
    pub fn new(position: Vector3<f64>, orientation: UnitQuaternion<f64>) -> Self {
        Self { position, orientation }
    }

    /// Pose at the origin with no rotation.
    pub fn identity() -> Self {
        Self::at(Vector3::zeros())
    }

    /// Unrotated pose at the given position.
    pub fn at(position: Vector3<f64>) -> Self {
        Self {
            position,
            orientation: UnitQuaternion::identity(),
        }
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

/// Physical extents of the tracked body, as reported by its motion controller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyExtents {
    /// Standing height in meters
    pub height: f64,

    /// Lateral radius in meters
    pub radius: f64,

    /// World-space "up" of the body
    pub up: Vector3<f64>,
}

impl BodyExtents {
    /// Creates extents with world +Y as up.
    pub fn new(height: f64, radius: f64) -> Self {
        Self {
            height,
            radius,
            up: Vector3::y(),
        }
    }

    /// Returns the normalized up axis, falling back to +Y for a zero vector.
    pub fn up_axis(&self) -> Unit<Vector3<f64>> {
        Unit::try_new(self.up, f64::EPSILON).unwrap_or_else(Vector3::y_axis)
    }

    /// True when the capsule spine has zero or negative length.
    pub fn is_degenerate(&self) -> bool {
        self.height <= 2.0 * self.radius
    }
}

impl Default for BodyExtents {
    fn default() -> Self {
        Self::new(2.0, 0.5)
    }
}

/// Linear RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);

    /// Creates a color from components in [0, 1].
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Packs the color as ARGB32 bytes (alpha first).
    pub fn to_argb32(&self) -> [u8; 4] {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.a), q(self.r), q(self.g), q(self.b)]
    }
}

impl Default for Color {
    fn default() -> Self {
        // Typical camera clear color
        Color::rgba(0.192, 0.302, 0.475, 0.0)
    }
}

/// How a camera clears its target before drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClearFlags {
    /// Draw the sky behind geometry
    #[default]
    Skybox,
    /// Fill with the background color
    SolidColor,
    /// Clear depth only, keep color
    DepthOnly,
    /// Do not clear
    Nothing,
}

/// Non-spatial camera parameters.
///
/// These describe how a view renders, not where it is, so the shadow
/// camera copies them verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewParams {
    /// Vertical field of view in degrees
    pub field_of_view_deg: f64,

    /// Near clip distance in meters
    pub near_clip: f64,

    /// Far clip distance in meters
    pub far_clip: f64,

    /// Fill color used with [`ClearFlags::SolidColor`]
    pub background: Color,

    /// Clear behaviour
    pub clear_flags: ClearFlags,
}

impl Default for ViewParams {
    fn default() -> Self {
        Self {
            field_of_view_deg: 60.0,
            near_clip: 0.3,
            far_clip: 1000.0,
            background: Color::default(),
            clear_flags: ClearFlags::Skybox,
        }
    }
}

/// Bit mask over 32 physics layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerMask(pub u32);

impl LayerMask {
    /// Every layer participates.
    pub const ALL: LayerMask = LayerMask(!0);

    /// No layer participates.
    pub const NONE: LayerMask = LayerMask(0);

    /// Mask containing a single layer (0..32).
    pub fn layer(index: u8) -> Self {
        Self(1u32.checked_shl(index as u32).unwrap_or(0))
    }

    /// Returns true if the given layer index is in the mask.
    pub fn contains(&self, index: u8) -> bool {
        self.intersects(Self::layer(index))
    }

    /// Returns true if the masks share any layer.
    pub fn intersects(&self, other: LayerMask) -> bool {
        self.0 & other.0 != 0
    }

    /// Adds a layer.
    pub fn with(self, index: u8) -> Self {
        Self(self.0 | Self::layer(index).0)
    }

    /// Removes a layer.
    pub fn without(self, index: u8) -> Self {
        Self(self.0 & !Self::layer(index).0)
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        Self::ALL
    }
}

/// Arguments of a capsule overlap query.
///
/// The capsule is the swept sphere of `radius` along `start..end`.
/// A segment with `end` at or below `start` is still a valid query
/// and degenerates to (at least) a sphere test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapsuleQuery {
    /// Center of the lower cap
    pub start: Vector3<f64>,

    /// Center of the upper cap
    pub end: Vector3<f64>,

    /// Capsule radius in meters
    pub radius: f64,

    /// Layers that take part in the query
    pub mask: LayerMask,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_layer_mask_ops() {
        let mask = LayerMask::NONE.with(0).with(5);
        assert!(mask.contains(0));
        assert!(mask.contains(5));
        assert!(!mask.contains(1));
        assert!(!mask.without(5).contains(5));
        assert!(LayerMask::ALL.contains(31));
        assert_eq!(LayerMask::layer(40), LayerMask::NONE);
        assert_eq!(LayerMask::default(), LayerMask::ALL);
    }

    #[test]
    fn test_up_axis_normalizes() {
        let mut extents = BodyExtents::new(2.0, 0.5);
        extents.up = Vector3::new(0.0, 3.0, 0.0);
        assert_eq!(extents.up_axis().into_inner(), Vector3::y());

        extents.up = Vector3::new(1.0, 1.0, 0.0);
        let half = std::f64::consts::FRAC_1_SQRT_2;
        assert_relative_eq!(extents.up_axis().into_inner(), Vector3::new(half, half, 0.0), epsilon = 1.0e-12);

        extents.up = Vector3::zeros();
        assert_eq!(extents.up_axis().into_inner(), Vector3::y());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let extents: BodyExtents = serde_json::from_str(r#"{ "height": 1.8, "radius": 0.4 }"#).unwrap();
        assert_eq!(extents, BodyExtents::new(1.8, 0.4));

        let params: ViewParams = serde_json::from_str(r#"{ "field_of_view_deg": 90.0 }"#).unwrap();
        assert_eq!(params.field_of_view_deg, 90.0);
        assert_eq!(params.far_clip, ViewParams::default().far_clip);
        assert_eq!(params.clear_flags, ClearFlags::Skybox);
    }

    #[test]
    fn test_degenerate_extents() {
        assert!(!BodyExtents::new(2.0, 0.5).is_degenerate());
        assert!(BodyExtents::new(1.0, 0.5).is_degenerate());
        assert!(BodyExtents::new(0.5, 0.5).is_degenerate());
    }

    #[test]
    fn test_color_argb32() {
        assert_eq!(Color::BLACK.to_argb32(), [255, 0, 0, 0]);
        assert_eq!(Color::rgba(1.0, 0.5, 2.0, 0.0).to_argb32(), [0, 255, 128, 255]);
    }
}
