//! Per-tick shadow refresh.
//!
//! Each pass rebuilds the shadow body and shadow camera from the live
//! tracked state, then tells the capture pipeline its viewpoint is ready.
//! The capture call is the last step so the pipeline never renders a
//! half-updated camera.

use crate::entities::{ObservationSource, ShadowEntity, ShadowObservation, TrackedEntity};
use crate::frames::{WorldFrames, WorldId};
use crate::mirror::mirror;
use lookingglass_env::CapturePipeline;

/// Owns the shadow state and rebuilds it on demand.
#[derive(Debug, Clone, Default)]
pub struct ShadowSynchronizer {
    shadow: ShadowEntity,
    shadow_view: ShadowObservation,
    sync_count: u64,
}

impl ShadowSynchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the shadow from the tracked body and camera.
    ///
    /// `current` is the world the body occupies; the shadow goes into its
    /// complement. Idempotent for unchanged inputs.
    pub fn synchronize<C: CapturePipeline>(
        &mut self,
        frames: &WorldFrames,
        current: WorldId,
        body: &TrackedEntity,
        view: &ObservationSource,
        capture: &mut C,
    ) {
        let from = frames.current_anchor(current);
        let to = frames.other_anchor(current);

        self.shadow.pose = mirror(&body.pose, &from, &to);

        self.shadow_view.pose = mirror(&view.pose, &from, &to);
        // Rendering behaviour, not placement: copy, never transform.
        self.shadow_view.params = view.params;

        self.sync_count += 1;
        capture.source_updated(&self.shadow_view.pose, &self.shadow_view.params);
    }

    pub fn shadow(&self) -> &ShadowEntity {
        &self.shadow
    }

    pub fn shadow_view(&self) -> &ShadowObservation {
        &self.shadow_view
    }

    /// Number of completed passes.
    pub fn sync_count(&self) -> u64 {
        self.sync_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lookingglass_env::{
        BodyExtents, CaptureTarget, ClearFlags, Color, EnvError, Pose, ViewParams,
    };
    use nalgebra::{UnitQuaternion, Vector3};

    #[derive(Default)]
    struct LastView {
        updates: Vec<(Pose, ViewParams)>,
    }

    impl CapturePipeline for LastView {
        fn configure(&mut self, _target: CaptureTarget) -> Result<(), EnvError> {
            Ok(())
        }

        fn source_updated(&mut self, pose: &Pose, params: &ViewParams) {
            self.updates.push((*pose, *params));
        }
    }

    fn frames() -> WorldFrames {
        WorldFrames::new(Vector3::zeros(), Vector3::new(10.0, 0.0, 0.0))
    }

    fn body_at(x: f64, y: f64, z: f64) -> TrackedEntity {
        TrackedEntity::new(
            Pose::new(Vector3::new(x, y, z), UnitQuaternion::from_euler_angles(0.0, 0.7, 0.0)),
            BodyExtents::default(),
        )
    }

    fn camera() -> ObservationSource {
        ObservationSource::new(
            Pose::new(Vector3::new(2.0, 2.6, 0.0), UnitQuaternion::from_euler_angles(0.2, 0.7, 0.0)),
            ViewParams {
                field_of_view_deg: 75.0,
                near_clip: 0.1,
                far_clip: 250.0,
                background: Color::rgba(0.1, 0.2, 0.3, 1.0),
                clear_flags: ClearFlags::SolidColor,
            },
        )
    }

    #[test]
    fn test_shadow_mirrors_body_and_camera() {
        let mut sync = ShadowSynchronizer::new();
        let mut capture = LastView::default();
        let body = body_at(2.0, 1.0, 0.0);
        let view = camera();

        sync.synchronize(&frames(), WorldId::A, &body, &view, &mut capture);

        assert_eq!(sync.shadow().pose.position, Vector3::new(12.0, 1.0, 0.0));
        assert_eq!(sync.shadow().pose.orientation, body.pose.orientation);
        assert_eq!(sync.shadow_view().pose.position, Vector3::new(12.0, 2.6, 0.0));
        assert_eq!(sync.shadow_view().pose.orientation, view.pose.orientation);
        assert_eq!(sync.shadow_view().params, view.params);
    }

    #[test]
    fn test_capture_sees_final_viewpoint() {
        let mut sync = ShadowSynchronizer::new();
        let mut capture = LastView::default();

        sync.synchronize(&frames(), WorldId::A, &body_at(2.0, 1.0, 0.0), &camera(), &mut capture);

        assert_eq!(capture.updates.len(), 1);
        assert_eq!(capture.updates[0].0, sync.shadow_view().pose);
        assert_eq!(capture.updates[0].1, sync.shadow_view().params);
    }

    #[test]
    fn test_shadow_direction_follows_current_world() {
        let mut sync = ShadowSynchronizer::new();
        let mut capture = LastView::default();

        sync.synchronize(&frames(), WorldId::B, &body_at(12.0, 1.0, 0.0), &camera(), &mut capture);

        assert_eq!(sync.shadow().pose.position, Vector3::new(2.0, 1.0, 0.0));
    }

    #[test]
    fn test_static_pose_has_no_drift() {
        let mut sync = ShadowSynchronizer::new();
        let mut capture = LastView::default();
        let frames = WorldFrames::new(
            Vector3::new(0.1, 0.2, 0.3),
            Vector3::new(1.0e3 + 0.7, -0.9, 3.3),
        );
        let body = body_at(0.123456789, 1.0e-3, 98765.4321);
        let view = camera();

        sync.synchronize(&frames, WorldId::A, &body, &view, &mut capture);
        let first = *sync.shadow();
        let first_view = *sync.shadow_view();

        for _ in 0..10_000 {
            sync.synchronize(&frames, WorldId::A, &body, &view, &mut capture);
            assert_eq!(*sync.shadow(), first);
            assert_eq!(*sync.shadow_view(), first_view);
        }
        assert_eq!(sync.sync_count(), 10_001);
    }
}
