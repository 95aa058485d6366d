//! Engine configuration.
//!
//! Set once before the first tick. Loaded from JSON by the simulator CLI,
//! or built in code by an embedding host.

use crate::error::ConfigError;
use crate::frames::{WorldFrames, WorldId};
use crate::safety::DEFAULT_HEIGHT_BUFFER;
use lookingglass_env::{BodyExtents, CaptureTarget, LayerMask, ViewParams};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_height_buffer() -> f64 {
    DEFAULT_HEIGHT_BUFFER
}

/// Configuration for a [`RealityEngine`](crate::RealityEngine).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealityConfig {
    /// Anchor of world A (required)
    #[serde(default)]
    pub world_a_anchor: Option<[f64; 3]>,

    /// Anchor of world B (required)
    #[serde(default)]
    pub world_b_anchor: Option<[f64; 3]>,

    /// World the body starts in (default: A)
    #[serde(default)]
    pub initial_world: WorldId,

    /// Lift of the clearance capsule above the destination (default: 0.05 m)
    #[serde(default = "default_height_buffer")]
    pub safety_height_buffer: f64,

    /// Layers the clearance check collides with (default: all)
    #[serde(default)]
    pub safety_mask: LayerMask,

    /// Off-screen target for the shadow view (default: 1920x1080)
    #[serde(default)]
    pub capture: CaptureTarget,

    /// Initial body extents
    #[serde(default)]
    pub body: BodyExtents,

    /// Initial camera parameters
    #[serde(default)]
    pub view: ViewParams,

    /// Translate the camera with the body on a committed flip, for hosts
    /// whose camera is mounted on the body (default: false)
    #[serde(default)]
    pub carry_view_on_flip: bool,
}

impl Default for RealityConfig {
    fn default() -> Self {
        Self {
            world_a_anchor: None,
            world_b_anchor: None,
            initial_world: WorldId::A,
            safety_height_buffer: DEFAULT_HEIGHT_BUFFER,
            safety_mask: LayerMask::ALL,
            capture: CaptureTarget::default(),
            body: BodyExtents::default(),
            view: ViewParams::default(),
            carry_view_on_flip: false,
        }
    }
}

impl RealityConfig {
    /// Config with both anchors set and defaults elsewhere.
    pub fn with_anchors(world_a: [f64; 3], world_b: [f64; 3]) -> Self {
        Self {
            world_a_anchor: Some(world_a),
            world_b_anchor: Some(world_b),
            ..Default::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Checks every field and resolves the anchor registry.
    pub fn validate(&self) -> Result<WorldFrames, ConfigError> {
        let world_a = resolve_anchor(self.world_a_anchor, WorldId::A)?;
        let world_b = resolve_anchor(self.world_b_anchor, WorldId::B)?;

        let buffer = self.safety_height_buffer;
        if !buffer.is_finite() || buffer <= 0.0 {
            return Err(ConfigError::InvalidClearance(buffer));
        }

        let BodyExtents { height, radius, .. } = self.body;
        // Degenerate (height <= 2r) is allowed; negative or NaN is not.
        if !(height.is_finite() && radius.is_finite()) || height < 0.0 || radius < 0.0 {
            return Err(ConfigError::InvalidExtents { height, radius });
        }

        self.capture.validate()?;

        Ok(WorldFrames::new(world_a, world_b))
    }
}

fn resolve_anchor(anchor: Option<[f64; 3]>, world: WorldId) -> Result<Vector3<f64>, ConfigError> {
    let [x, y, z] = anchor.ok_or(ConfigError::MissingAnchor(world))?;
    let position = Vector3::new(x, y, z);
    if position.iter().all(|c| c.is_finite()) {
        Ok(position)
    } else {
        Err(ConfigError::NonFiniteAnchor(world))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_anchor_is_fatal() {
        let config = RealityConfig::default();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingAnchor(WorldId::A))
        ));

        let config = RealityConfig {
            world_a_anchor: Some([0.0; 3]),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingAnchor(WorldId::B))
        ));
    }

    #[test]
    fn test_valid_config_resolves_frames() {
        let config = RealityConfig::with_anchors([0.0, 0.0, 0.0], [10.0, 0.0, 0.0]);
        let frames = config.validate().unwrap();
        assert_eq!(frames.anchor_of(WorldId::B), Vector3::new(10.0, 0.0, 0.0));
    }

    #[test]
    fn test_rejects_bad_clearance() {
        for buffer in [0.0, -0.05, f64::NAN, f64::INFINITY] {
            let config = RealityConfig {
                safety_height_buffer: buffer,
                ..RealityConfig::with_anchors([0.0; 3], [1.0; 3])
            };
            assert!(matches!(config.validate(), Err(ConfigError::InvalidClearance(_))));
        }
    }

    #[test]
    fn test_extents_validation() {
        let mut config = RealityConfig::with_anchors([0.0; 3], [1.0; 3]);

        config.body = BodyExtents::new(0.5, 0.5);
        assert!(config.validate().is_ok(), "degenerate capsule is allowed");

        config.body = BodyExtents::new(-1.0, 0.5);
        assert!(matches!(config.validate(), Err(ConfigError::InvalidExtents { .. })));

        config.body = BodyExtents::new(2.0, f64::NAN);
        assert!(matches!(config.validate(), Err(ConfigError::InvalidExtents { .. })));
    }

    #[test]
    fn test_rejects_non_finite_anchor() {
        let config = RealityConfig::with_anchors([0.0; 3], [f64::NAN, 0.0, 0.0]);
        assert!(matches!(config.validate(), Err(ConfigError::NonFiniteAnchor(WorldId::B))));
    }

    #[test]
    fn test_rejects_bad_capture_target() {
        let mut config = RealityConfig::with_anchors([0.0; 3], [1.0; 3]);
        config.capture = CaptureTarget::new(0, 1080);
        assert!(matches!(config.validate(), Err(ConfigError::Capture(_))));
    }

    #[test]
    fn test_json_defaults() {
        let config = RealityConfig::from_json_str(
            r#"{ "world_a_anchor": [0, 0, 0], "world_b_anchor": [10, 0, 0], "safety_mask": 5 }"#,
        )
        .unwrap();

        assert_eq!(config.safety_height_buffer, DEFAULT_HEIGHT_BUFFER);
        assert_eq!(config.safety_mask, LayerMask(5));
        assert_eq!(config.initial_world, WorldId::A);
        assert_eq!(config.capture, CaptureTarget::new(1920, 1080));
        assert!(!config.carry_view_on_flip);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_json_partial_body_and_view() {
        let config = RealityConfig::from_json_str(
            r#"{
                "world_a_anchor": [0, 0, 0],
                "world_b_anchor": [10, 0, 0],
                "body": { "height": 1.8, "radius": 0.4 },
                "view": { "field_of_view_deg": 75.0 },
                "capture": { "width": 640, "height": 480 }
            }"#,
        )
        .unwrap();

        assert_eq!(config.body, BodyExtents::new(1.8, 0.4));
        assert_eq!(config.body.up_axis().into_inner(), Vector3::y());
        assert_eq!(config.view.field_of_view_deg, 75.0);
        assert_eq!(config.view.near_clip, ViewParams::default().near_clip);
        assert_eq!(config.capture, CaptureTarget::new(640, 480));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_json_parse_error() {
        assert!(matches!(
            RealityConfig::from_json_str("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            RealityConfig::from_json_file("/nonexistent/lookingglass.json"),
            Err(ConfigError::Io(_))
        ));
    }
}
