//! SimWorld - The simulation harness container.
//!
//! Drives a [`RealityEngine`] the way a host would: motion controller
//! first, then the engine tick, then an optional flip request. After every
//! step the harness checks the engine's guarantees and records any breach
//! as a violation instead of panicking, so a scenario can report it.

use crate::motion::{MotionDriver, MotionParams};

use lookingglass_core::{mirror, ConfigError, FlipResult, RealityConfig, RealityEngine, WorldId};
use lookingglass_env::{HeadlessCapture, OverlapOracle, Pose};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Configuration for a simulation run.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Master seed for determinism
    pub seed: u64,

    /// Tick rate in Hz
    pub tick_rate_hz: u32,

    /// Simulation duration in seconds
    pub duration_secs: f64,

    /// Request a flip every N ticks (None = never)
    pub flip_every_ticks: Option<u64>,

    /// Random walk of the body (None = stand still)
    pub motion: Option<MotionParams>,

    /// Engine configuration
    pub reality: RealityConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            tick_rate_hz: 30,
            duration_secs: 10.0,
            flip_every_ticks: None,
            motion: Some(MotionParams::default()),
            reality: RealityConfig::with_anchors([0.0, 0.0, 0.0], [10.0, 0.0, 0.0]),
        }
    }
}

impl SimConfig {
    /// Number of ticks covering `duration_secs`.
    pub fn target_ticks(&self) -> u64 {
        (self.duration_secs * self.tick_rate_hz as f64) as u64
    }

    fn dt(&self) -> f64 {
        1.0 / self.tick_rate_hz.max(1) as f64
    }
}

/// What happened during one simulation tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    pub time_secs: f64,

    /// World at the end of the tick
    pub world: WorldId,

    /// Outcome of this tick's flip request, if one was made
    pub flip: Option<FlipResult>,
}

/// The SimWorld - one engine, one body, one deterministic walk.
pub struct SimWorld<O: OverlapOracle> {
    config: SimConfig,
    engine: RealityEngine<O, HeadlessCapture>,
    motion: Option<MotionDriver>,

    /// Rejections heard through the engine's signal
    rejections_heard: Arc<AtomicU64>,

    /// Commits heard through the engine's signal
    commits_heard: Arc<AtomicU64>,

    violations: Vec<String>,
    flips_requested: u64,
    tick_count: u64,
    time_secs: f64,
}

impl<O: OverlapOracle> SimWorld<O> {
    /// Creates a new SimWorld over `oracle`.
    pub fn new(config: SimConfig, oracle: O) -> Result<Self, ConfigError> {
        let mut engine = RealityEngine::new(config.reality.clone(), oracle, HeadlessCapture::new())?;

        let rejections_heard = Arc::new(AtomicU64::new(0));
        let commits_heard = Arc::new(AtomicU64::new(0));
        {
            let rejections = Arc::clone(&rejections_heard);
            engine.signals_mut().on_rejected(move || {
                rejections.fetch_add(1, Ordering::SeqCst);
            });
            let commits = Arc::clone(&commits_heard);
            engine.signals_mut().on_committed(move |_| {
                commits.fetch_add(1, Ordering::SeqCst);
            });
        }

        // Separate stream from anything else seeded off the master seed
        let motion_seed = config.seed.wrapping_mul(0x9e3779b97f4a7c15);
        let motion = config.motion.map(|params| MotionDriver::new(motion_seed, params));

        Ok(Self {
            config,
            engine,
            motion,
            rejections_heard,
            commits_heard,
            violations: Vec::new(),
            flips_requested: 0,
            tick_count: 0,
            time_secs: 0.0,
        })
    }

    /// Advances simulation by one tick.
    pub fn tick(&mut self) -> TickReport {
        let dt = self.config.dt();
        self.tick_count += 1;
        self.time_secs += dt;

        if let Some(driver) = self.motion.as_mut() {
            let anchor = self.engine.current_anchor_position();
            let extents = self.engine.body().extents;
            let pose = driver.step(dt, &self.engine.body().pose, &anchor);
            let eye = driver.eye_pose(&pose, &extents);
            self.engine.body_mut().pose = pose;
            self.engine.view_mut().pose = eye;
        }

        let frames_before = self.engine.capture().frames();
        self.engine.tick();
        self.check_capture_order(frames_before);
        self.check_mirror();

        let flip = match self.config.flip_every_ticks {
            Some(every) if every > 0 && self.tick_count % every == 0 => Some(self.request_flip()),
            _ => None,
        };

        TickReport {
            tick: self.tick_count,
            time_secs: self.time_secs,
            world: self.engine.current_world(),
            flip,
        }
    }

    /// Runs until `duration_secs` is covered.
    pub fn run(&mut self) {
        for _ in 0..self.config.target_ticks() {
            self.tick();
        }
    }

    /// Requests a flip now and checks its outcome against the state before it.
    pub fn request_flip(&mut self) -> FlipResult {
        self.flips_requested += 1;

        let world_before = self.engine.current_world();
        let body_before = self.engine.body().pose;
        let view_before = self.engine.view().pose;
        // Where the body must land: the mirror of where it stands now,
        // whether or not the shadow was refreshed since the last move.
        let destination = mirror(
            &body_before,
            &self.engine.current_anchor_position(),
            &self.engine.other_anchor_position(),
        )
        .position;
        let rejections_before = self.rejections_heard.load(Ordering::SeqCst);
        let frames_before = self.engine.capture().frames();

        let result = self.engine.flip();

        match result {
            FlipResult::Rejected => {
                if self.engine.current_world() != world_before {
                    self.violation("rejected flip changed the current world");
                }
                if self.engine.body().pose != body_before || self.engine.view().pose != view_before {
                    self.violation("rejected flip moved the body or camera");
                }
                if self.rejections_heard.load(Ordering::SeqCst) != rejections_before + 1 {
                    self.violation("rejected flip did not signal exactly once");
                }
            }
            FlipResult::Committed => {
                if self.engine.current_world() != world_before.other() {
                    self.violation("committed flip did not toggle the world");
                }
                if self.engine.body().pose.position != destination {
                    self.violation("committed flip did not land on the shadow");
                }
                if self.engine.body().pose.orientation != body_before.orientation {
                    self.violation("committed flip rotated the body");
                }
                if self.rejections_heard.load(Ordering::SeqCst) != rejections_before {
                    self.violation("committed flip raised a rejection");
                }
                // The new pair must already be visible to the capture
                self.check_capture_order(frames_before);
                self.check_mirror();
            }
        }

        debug!(tick = self.tick_count, outcome = ?result, world = %self.engine.current_world(), "Flip requested");
        result
    }

    fn check_capture_order(&mut self, frames_before: u64) {
        if self.engine.capture().frames() <= frames_before {
            self.violation("capture was not refreshed");
            return;
        }

        let shadow_view = *self.engine.shadow_view();
        let in_sync = matches!(
            self.engine.capture().last_view(),
            Some((pose, params)) if *pose == shadow_view.pose && *params == shadow_view.params
        );
        if !in_sync {
            self.violation("capture saw a viewpoint other than the shadow camera");
        }
    }

    fn check_mirror(&mut self) {
        let from = self.engine.current_anchor_position();
        let to = self.engine.other_anchor_position();

        let expected = mirror(&self.engine.body().pose, &from, &to);
        if self.engine.shadow().pose != expected {
            self.violation("shadow body is not the mirror of the tracked body");
        }

        let expected_view = mirror(&self.engine.view().pose, &from, &to);
        if self.engine.shadow_view().pose != expected_view {
            self.violation("shadow camera is not the mirror of the tracked camera");
        }
    }

    fn violation(&mut self, message: &str) {
        warn!(tick = self.tick_count, "Invariant violated: {}", message);
        self.violations.push(format!("tick {}: {}", self.tick_count, message));
    }

    pub fn engine(&self) -> &RealityEngine<O, HeadlessCapture> {
        &self.engine
    }

    /// Host-side access, e.g. for teleporting the body in a scenario.
    pub fn engine_mut(&mut self) -> &mut RealityEngine<O, HeadlessCapture> {
        &mut self.engine
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn violations(&self) -> &[String] {
        &self.violations
    }

    pub fn flips_requested(&self) -> u64 {
        self.flips_requested
    }

    pub fn rejections_heard(&self) -> u64 {
        self.rejections_heard.load(Ordering::SeqCst)
    }

    pub fn commits_heard(&self) -> u64 {
        self.commits_heard.load(Ordering::SeqCst)
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn time_secs(&self) -> f64 {
        self.time_secs
    }

    pub fn body_pose(&self) -> Pose {
        self.engine.body().pose
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{ObstacleField, ScriptedOracle};
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    fn still(flip_every: Option<u64>) -> SimConfig {
        SimConfig {
            motion: None,
            flip_every_ticks: flip_every,
            duration_secs: 1.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_walk_without_flips_keeps_invariants() {
        let mut world = SimWorld::new(SimConfig::default(), ObstacleField::new()).unwrap();
        world.run();

        assert_eq!(world.tick_count(), 300);
        assert!(world.violations().is_empty(), "{:?}", world.violations());
        assert_eq!(world.engine().current_world(), WorldId::A);
        assert_eq!(world.engine().capture().frames(), 301);
    }

    #[test]
    fn test_same_seed_same_run() {
        let config = SimConfig {
            flip_every_ticks: Some(7),
            ..Default::default()
        };
        let mut w1 = SimWorld::new(config.clone(), ObstacleField::new()).unwrap();
        let mut w2 = SimWorld::new(config, ObstacleField::new()).unwrap();
        w1.run();
        w2.run();

        assert_eq!(w1.body_pose(), w2.body_pose());
        assert_eq!(w1.engine().current_world(), w2.engine().current_world());
    }

    #[test]
    fn test_scheduled_flips_follow_script() {
        let oracle = ScriptedOracle::new([false, true, false]);
        let mut world = SimWorld::new(still(Some(10)), oracle).unwrap();

        let outcomes: Vec<_> = (0..30).filter_map(|_| world.tick().flip).collect();

        assert_eq!(
            outcomes,
            vec![FlipResult::Committed, FlipResult::Rejected, FlipResult::Committed]
        );
        assert_eq!(world.engine().current_world(), WorldId::A);
        assert_eq!(world.rejections_heard(), 1);
        assert_eq!(world.commits_heard(), 2);
        assert!(world.violations().is_empty(), "{:?}", world.violations());
    }

    #[test]
    fn test_flip_with_motion_lands_on_shadow() {
        let config = SimConfig {
            flip_every_ticks: Some(1),
            duration_secs: 2.0,
            ..Default::default()
        };
        let mut world = SimWorld::new(config, ObstacleField::new()).unwrap();
        world.run();

        assert_eq!(world.engine().stats().committed, 60);
        assert!(world.violations().is_empty(), "{:?}", world.violations());
    }

    #[test]
    fn test_bad_config_is_reported() {
        let config = SimConfig {
            reality: RealityConfig::default(),
            ..Default::default()
        };
        assert!(matches!(
            SimWorld::new(config, ObstacleField::new()),
            Err(ConfigError::MissingAnchor(WorldId::A))
        ));
    }

    #[test]
    fn test_manual_teleport_then_flip() {
        let mut world = SimWorld::new(still(None), ScriptedOracle::always(false)).unwrap();
        world.engine_mut().body_mut().pose.position = Vector3::new(2.0, 1.0, 0.0);

        assert_eq!(world.request_flip(), FlipResult::Committed);
        assert_eq!(world.body_pose().position, Vector3::new(12.0, 1.0, 0.0));
        assert!(world.violations().is_empty(), "{:?}", world.violations());

        // Clearance was checked at the teleported spot, not the stale shadow
        let queries = world.engine().gate().oracle().queries();
        assert_eq!(queries.len(), 1);
        assert_relative_eq!(queries[0].start, Vector3::new(12.0, 1.55, 0.0), epsilon = 1.0e-12);
    }
}
