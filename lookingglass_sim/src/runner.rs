//! Scenario runner - executes the flip scenarios.

use crate::exporter::{SimEvent, SimExport, SimFrame};
use crate::motion::MotionParams;
use crate::oracle::{all_but, Obstacle, ObstacleField};
use crate::scenarios::ScenarioId;
use crate::world::{SimConfig, SimWorld, TickReport};

use lookingglass_core::{ConfigError, FlipResult, FlipStats, RealityConfig, WorldFrames, WorldId};
use lookingglass_env::{BodyExtents, LayerMask};
use nalgebra::Vector3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

/// Layer of the walkable floor.
const FLOOR_LAYER: u8 = 0;

/// Layer of pillars and other props.
const PROP_LAYER: u8 = 1;

/// Layer excluded from the clearance mask in `layer_filter`.
const IGNORED_LAYER: u8 = 3;

/// Results from running a scenario.
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    /// Scenario that was run
    pub scenario: ScenarioId,

    /// Seed used
    pub seed: u64,

    /// Whether scenario passed all assertions
    pub passed: bool,

    /// Total ticks executed
    pub total_ticks: u64,

    /// Final simulation time in seconds
    pub final_time_secs: f64,

    /// World the body ended in
    pub final_world: WorldId,

    /// Flip outcomes as counted by the engine
    pub flips: FlipStats,

    /// Failure message if any
    pub failure_reason: Option<String>,

    /// Metrics collected during run
    pub metrics: ScenarioMetrics,
}

/// Metrics collected during scenario execution.
#[derive(Debug, Clone, Default)]
pub struct ScenarioMetrics {
    /// Flip requests issued by the harness
    pub flips_requested: u64,

    /// Rejections heard through the engine's signal
    pub rejection_signals: u64,

    /// Commits heard through the engine's signal
    pub commit_signals: u64,

    /// Shadow synchronization passes
    pub sync_passes: u64,

    /// Viewpoints delivered to the capture pipeline
    pub frames_captured: u64,

    /// Invariant breaches caught by the harness
    pub invariant_violations: usize,
}

/// Runs flip scenarios.
pub struct ScenarioRunner {
    /// Configuration seed
    seed: u64,

    /// Tick rate in Hz
    tick_rate_hz: u32,

    /// Maximum duration in seconds
    max_duration_secs: f64,

    /// Engine configuration; anchors and props are placed relative to it
    reality: RealityConfig,
}

impl ScenarioRunner {
    /// Creates a new scenario runner with anchors at the origin and 10 m along +X.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            tick_rate_hz: 30,
            max_duration_secs: 10.0,
            reality: RealityConfig::with_anchors([0.0, 0.0, 0.0], [10.0, 0.0, 0.0]),
        }
    }

    /// Sets the tick rate.
    pub fn with_tick_rate(mut self, hz: u32) -> Self {
        self.tick_rate_hz = hz;
        self
    }

    /// Sets the maximum duration.
    pub fn with_duration(mut self, secs: f64) -> Self {
        self.max_duration_secs = secs;
        self
    }

    /// Replaces the engine configuration.
    pub fn with_reality(mut self, reality: RealityConfig) -> Self {
        self.reality = reality;
        self
    }

    /// Runs a scenario and returns the result.
    pub fn run(&self, scenario: ScenarioId) -> ScenarioResult {
        self.execute(scenario, None)
    }

    /// Runs a scenario and records every tick.
    pub fn run_exported(&self, scenario: ScenarioId) -> (ScenarioResult, SimExport) {
        let mut export = SimExport::new(scenario.name(), self.seed);
        let result = self.execute(scenario, Some(&mut export));
        export.finalize(result.passed, result.failure_reason.clone());
        (result, export)
    }

    fn execute(&self, scenario: ScenarioId, mut export: Option<&mut SimExport>) -> ScenarioResult {
        info!("Starting scenario: {} (seed={})", scenario.name(), self.seed);
        debug!("{}", scenario.description());

        let (config, field) = match self.setup(scenario) {
            Ok(setup) => setup,
            Err(e) => return self.aborted(scenario, e),
        };
        let initial_world = config.reality.initial_world;

        let mut world = match SimWorld::new(config, field) {
            Ok(world) => world,
            Err(e) => return self.aborted(scenario, e),
        };

        // The ignored obstacle must really be in the way, or the scenario proves nothing
        let mut failure = match scenario {
            ScenarioId::LayerFilter => check_masked_overlap(&world),
            _ => None,
        };

        let target_ticks = world.config().target_ticks();
        for _ in 0..target_ticks {
            let report = world.tick();

            if let Some(export) = export.as_deref_mut() {
                export.add_frame(frame_of(&world, &report));
            }

            if report.tick % self.tick_rate_hz.max(1) as u64 == 0 {
                let stats = world.engine().stats();
                debug!(
                    "  t={:.1}s | world={} | committed={} | rejected={}",
                    report.time_secs, report.world, stats.committed, stats.rejected
                );
            }
        }

        if failure.is_none() {
            failure = verify_common(&world).or_else(|| verify_scenario(scenario, &world, initial_world));
        }

        let passed = failure.is_none();
        if let Some(reason) = &failure {
            warn!("{} failed: {}", scenario.name(), reason);
        }

        let engine = world.engine();
        ScenarioResult {
            scenario,
            seed: self.seed,
            passed,
            total_ticks: world.tick_count(),
            final_time_secs: world.time_secs(),
            final_world: engine.current_world(),
            flips: engine.stats(),
            failure_reason: failure,
            metrics: ScenarioMetrics {
                flips_requested: world.flips_requested(),
                rejection_signals: world.rejections_heard(),
                commit_signals: world.commits_heard(),
                sync_passes: engine.sync_count(),
                frames_captured: engine.capture().frames(),
                invariant_violations: world.violations().len(),
            },
        }
    }

    /// Builds the sim config and obstacle layout for a scenario.
    fn setup(&self, scenario: ScenarioId) -> Result<(SimConfig, ObstacleField), ConfigError> {
        let mut config = SimConfig {
            seed: self.seed,
            tick_rate_hz: self.tick_rate_hz,
            duration_secs: self.max_duration_secs,
            flip_every_ticks: Some(self.tick_rate_hz.max(1) as u64),
            motion: None,
            reality: self.reality.clone(),
        };

        match scenario {
            ScenarioId::DegenerateCapsule => config.reality.body = BodyExtents::new(0.6, 0.5),
            ScenarioId::LayerFilter => config.reality.safety_mask = all_but(IGNORED_LAYER),
            _ => {}
        }

        let frames = config.reality.validate()?;
        let destination = frames.other_anchor(config.reality.initial_world);
        let up = *config.reality.body.up_axis();
        let mut field = ObstacleField::new();

        match scenario {
            ScenarioId::PortalClear => {
                add_floors(&mut field, &frames, &up);
            }
            ScenarioId::PortalBlocked => {
                add_floors(&mut field, &frames, &up);
                field.add(Obstacle::sphere(destination + up, 0.5, PROP_LAYER));
            }
            ScenarioId::PingPong => {
                add_floors(&mut field, &frames, &up);
                config.flip_every_ticks = Some(1);
                config.motion = Some(MotionParams::default());
            }
            ScenarioId::Wander => {
                add_floors(&mut field, &frames, &up);
                add_pillars(&mut field, &frames, &up, self.seed);
                config.flip_every_ticks = Some(20);
                config.motion = Some(MotionParams::default());
            }
            ScenarioId::DegenerateCapsule => {
                // No floor: an inverted capsule reaches below the feet.
                let extents = config.reality.body;
                let start = destination + up * (extents.radius + config.reality.safety_height_buffer);
                field.add(Obstacle::sphere(start, 0.1, PROP_LAYER));
            }
            ScenarioId::LayerFilter => {
                add_floors(&mut field, &frames, &up);
                field.add(Obstacle::sphere(destination + up, 0.5, IGNORED_LAYER));
            }
        }

        Ok((config, field))
    }

    fn aborted(&self, scenario: ScenarioId, error: ConfigError) -> ScenarioResult {
        warn!("{} could not start: {}", scenario.name(), error);
        ScenarioResult {
            scenario,
            seed: self.seed,
            passed: false,
            total_ticks: 0,
            final_time_secs: 0.0,
            final_world: self.reality.initial_world,
            flips: FlipStats::default(),
            failure_reason: Some(format!("Invalid configuration: {}", error)),
            metrics: ScenarioMetrics::default(),
        }
    }
}

/// A floor slab under each anchor. Assumes +Y up.
fn add_floors(field: &mut ObstacleField, frames: &WorldFrames, up: &Vector3<f64>) {
    let half = Vector3::new(20.0, 0.0, 20.0);
    for world in WorldId::BOTH {
        let anchor = frames.anchor_of(world);
        field.add(Obstacle::aabb(anchor - half - up, anchor + half, FLOOR_LAYER));
    }
}

/// Seeded pillars scattered around both anchors.
fn add_pillars(field: &mut ObstacleField, frames: &WorldFrames, up: &Vector3<f64>, seed: u64) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_mul(0x517cc1b727220a95));
    for world in WorldId::BOTH {
        let anchor = frames.anchor_of(world);
        for _ in 0..8 {
            let offset = Vector3::new(rng.gen_range(-6.0_f64..6.0), 0.0, rng.gen_range(-6.0_f64..6.0));
            let radius: f64 = rng.gen_range(0.3..0.8);
            field.add(Obstacle::sphere(anchor + offset + up, radius, PROP_LAYER));
        }
    }
}

fn check_masked_overlap(world: &SimWorld<ObstacleField>) -> Option<String> {
    let engine = world.engine();
    let mut query = engine
        .gate()
        .capsule_for(&engine.other_anchor_position(), &engine.body().extents);
    query.mask = LayerMask::ALL;

    if engine.gate().oracle().overlapping(&query).is_empty() {
        Some("ignored obstacle does not overlap the destination".to_string())
    } else {
        None
    }
}

/// Checks shared by every scenario.
fn verify_common(world: &SimWorld<ObstacleField>) -> Option<String> {
    if let Some(first) = world.violations().first() {
        return Some(format!("{} invariant violations, first: {}", world.violations().len(), first));
    }

    let stats = world.engine().stats();
    if stats.attempts() != world.flips_requested() {
        return Some(format!(
            "engine counted {} attempts for {} requests",
            stats.attempts(),
            world.flips_requested()
        ));
    }
    if stats.rejected != world.rejections_heard() || stats.committed != world.commits_heard() {
        return Some(format!(
            "signals ({} rejected, {} committed) disagree with stats {:?}",
            world.rejections_heard(),
            world.commits_heard(),
            stats
        ));
    }
    if world.flips_requested() == 0 {
        return Some("no flip was requested".to_string());
    }
    None
}

fn verify_scenario(scenario: ScenarioId, world: &SimWorld<ObstacleField>, initial: WorldId) -> Option<String> {
    let engine = world.engine();
    let stats = engine.stats();

    let expected_world = if stats.committed % 2 == 0 { initial } else { initial.other() };
    if engine.current_world() != expected_world {
        return Some(format!(
            "ended in {} after {} commits from {}",
            engine.current_world(),
            stats.committed,
            initial
        ));
    }

    match scenario {
        ScenarioId::PortalClear | ScenarioId::PingPong | ScenarioId::LayerFilter => {
            (stats.rejected > 0).then(|| format!("{} flips rejected on a clear destination", stats.rejected))
        }
        ScenarioId::PortalBlocked | ScenarioId::DegenerateCapsule => {
            if stats.committed > 0 {
                Some(format!("{} flips committed into an obstructed destination", stats.committed))
            } else if engine.body().pose.position != engine.frames().anchor_of(initial) {
                Some("body moved without walking or flipping".to_string())
            } else {
                None
            }
        }
        ScenarioId::Wander => None,
    }
}

fn frame_of(world: &SimWorld<ObstacleField>, report: &TickReport) -> SimFrame {
    let engine = world.engine();
    let events = report
        .flip
        .map(|flip| SimEvent {
            flip,
            message: match flip {
                FlipResult::Committed => format!("flipped into {}", report.world),
                FlipResult::Rejected => "flip rejected: destination obstructed".to_string(),
            },
        })
        .into_iter()
        .collect();

    SimFrame {
        time_sec: report.time_secs,
        world: report.world,
        body: engine.body().pose.position.into(),
        shadow: engine.shadow().pose.position.into(),
        events,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runner() -> ScenarioRunner {
        ScenarioRunner::new(42).with_duration(3.0)
    }

    #[test]
    fn test_all_scenarios_pass() {
        let runner = runner();
        for scenario in ScenarioId::all() {
            let result = runner.run(scenario);
            assert!(result.passed, "{}: {:?}", scenario, result.failure_reason);
            assert_eq!(result.total_ticks, 90);
            assert_eq!(result.metrics.invariant_violations, 0);
        }
    }

    #[test]
    fn test_portal_clear_counts() {
        let result = runner().run(ScenarioId::PortalClear);

        assert_eq!(result.flips, FlipStats { committed: 3, rejected: 0 });
        assert_eq!(result.final_world, WorldId::B);
        assert_eq!(result.metrics.commit_signals, 3);
    }

    #[test]
    fn test_portal_blocked_never_moves() {
        let result = runner().run(ScenarioId::PortalBlocked);

        assert_eq!(result.flips, FlipStats { committed: 0, rejected: 3 });
        assert_eq!(result.metrics.rejection_signals, 3);
        assert_eq!(result.final_world, WorldId::A);
    }

    #[test]
    fn test_ping_pong_flips_every_tick() {
        let result = runner().run(ScenarioId::PingPong);

        assert_eq!(result.flips.committed, 90);
        assert_eq!(result.final_world, WorldId::A);
        // One pass at startup, one per tick, one per commit
        assert_eq!(result.metrics.sync_passes, 1 + 90 + 90);
    }

    #[test]
    fn test_wander_is_deterministic() {
        let a = runner().run(ScenarioId::Wander);
        let b = runner().run(ScenarioId::Wander);

        assert!(a.passed, "{:?}", a.failure_reason);
        assert_eq!(a.flips, b.flips);
        assert_eq!(a.final_world, b.final_world);
    }

    #[test]
    fn test_custom_anchors_and_start_world() {
        let mut reality = RealityConfig::with_anchors([0.0, 0.0, 0.0], [0.0, 0.0, 50.0]);
        reality.initial_world = WorldId::B;
        let runner = runner().with_reality(reality);

        for scenario in [ScenarioId::PortalClear, ScenarioId::PortalBlocked, ScenarioId::LayerFilter] {
            let result = runner.run(scenario);
            assert!(result.passed, "{}: {:?}", scenario, result.failure_reason);
        }
    }

    #[test]
    fn test_invalid_config_fails_cleanly() {
        let result = runner()
            .with_reality(RealityConfig::default())
            .run(ScenarioId::PortalClear);

        assert!(!result.passed);
        assert_eq!(result.total_ticks, 0);
        assert!(result.failure_reason.unwrap().contains("Invalid configuration"));
    }

    #[test]
    fn test_export_has_a_frame_per_tick() {
        let (result, export) = runner().run_exported(ScenarioId::PortalBlocked);

        assert_eq!(export.frames.len() as u64, result.total_ticks);
        assert_eq!(export.flip_count(), 3);
        assert!(export.passed);
        assert_eq!(export.scenario, "portal_blocked");
    }
}
