//! Reality Engine - Tick driver and world-flip controller.
//!
//! Owns the current-world selector and everything that must change with it
//! in one step. The host runs, per tick:
//!
//! ```text
//! 1. engine.body_mut() / engine.view_mut()   motion + camera controllers
//! 2. engine.tick()                           shadow refresh -> capture
//! 3. engine.flip()                           optional, on player request
//! ```
//!
//! `flip()` borrows the engine mutably, so it cannot re-enter itself or
//! interleave with a synchronization pass.

use crate::config::RealityConfig;
use crate::entities::{ObservationSource, ShadowEntity, ShadowObservation, TrackedEntity};
use crate::error::ConfigError;
use crate::flip::{FlipResult, FlipSignals, FlipStats};
use crate::frames::{WorldFrames, WorldId};
use crate::safety::SafetyGate;
use crate::synchronizer::ShadowSynchronizer;

use lookingglass_env::{CapturePipeline, OverlapOracle, Pose};
use nalgebra::Vector3;
use tracing::{debug, info};

/// The dual-world engine.
///
/// Generic over the physics oracle and the capture pipeline, so the same
/// engine runs against a real host or the simulator's doubles.
pub struct RealityEngine<O, C>
where
    O: OverlapOracle,
    C: CapturePipeline,
{
    /// Anchor registry
    frames: WorldFrames,

    /// The world the body is in
    current: WorldId,

    /// Tracked body (written by the host and by committed flips)
    body: TrackedEntity,

    /// Tracked camera (written by the host; moved by flips only when carried)
    view: ObservationSource,

    synchronizer: ShadowSynchronizer,
    gate: SafetyGate<O>,
    capture: C,
    signals: FlipSignals,
    stats: FlipStats,

    /// Body or view changed since the last synchronization
    shadow_stale: bool,

    /// Camera is mounted on the body and moves with it on a flip
    carry_view: bool,

    tick_count: u64,
}

impl<O, C> RealityEngine<O, C>
where
    O: OverlapOracle,
    C: CapturePipeline,
{
    /// Validates the config, binds the capture target, and builds the engine.
    ///
    /// The body starts at the anchor of `config.initial_world` with the
    /// camera on top of it. The shadow is synchronized once before
    /// returning, so it is valid from the start.
    pub fn new(config: RealityConfig, oracle: O, mut capture: C) -> Result<Self, ConfigError> {
        let frames = config.validate()?;
        capture.configure(config.capture)?;

        let current = config.initial_world;
        let spawn = frames.anchor_of(current);
        let body = TrackedEntity::new(Pose::at(spawn), config.body);
        let eye = spawn + config.body.up_axis().as_ref() * config.body.height;
        let view = ObservationSource::new(Pose::at(eye), config.view);

        let gate = SafetyGate::new(oracle, config.safety_height_buffer, config.safety_mask);

        let mut engine = Self {
            frames,
            current,
            body,
            view,
            synchronizer: ShadowSynchronizer::new(),
            gate,
            capture,
            signals: FlipSignals::new(),
            stats: FlipStats::default(),
            shadow_stale: true,
            carry_view: config.carry_view_on_flip,
            tick_count: 0,
        };
        engine.synchronize();

        debug!(
            world = %current,
            world_a = ?frames.anchor_of(WorldId::A),
            world_b = ?frames.anchor_of(WorldId::B),
            "Reality engine ready"
        );
        Ok(engine)
    }

    /// Runs one tick: refreshes the shadow and hands it to the capture pipeline.
    pub fn tick(&mut self) {
        self.synchronize();
        self.tick_count += 1;
    }

    /// Rebuilds the shadow body and camera from the live tracked state.
    pub fn synchronize(&mut self) {
        self.synchronizer.synchronize(
            &self.frames,
            self.current,
            &self.body,
            &self.view,
            &mut self.capture,
        );
        self.shadow_stale = false;
    }

    /// Attempts to move the body into the other world.
    ///
    /// The destination is the shadow body's position: exactly what the
    /// player sees through the preview. If the shadow is stale (the body
    /// moved since the last pass) it is rebuilt first.
    ///
    /// On an obstructed destination nothing about the body or the current
    /// world changes and every `on_rejected` observer fires once. On
    /// success the body is moved, the world toggles, and the shadow is
    /// rebuilt for the new pair before returning. The camera is only moved
    /// when `carry_view_on_flip` is set.
    pub fn flip(&mut self) -> FlipResult {
        if self.shadow_stale {
            debug!("Shadow stale at flip, synchronizing first");
            self.synchronize();
        }

        let destination = self.synchronizer.shadow().pose.position;

        if self.gate.is_obstructed(&destination, &self.body.extents) {
            self.stats.rejected += 1;
            debug!(
                world = %self.current,
                destination = ?destination,
                "Flip rejected: destination obstructed"
            );
            self.signals.emit_rejected();
            return FlipResult::Rejected;
        }

        let from = self.current;
        let displacement = destination - self.body.pose.position;
        // Orientation is left alone; the mirror preserves it.
        self.body.pose.position = destination;
        if self.carry_view {
            self.view.pose.position += displacement;
        }
        self.current = from.other();
        self.synchronize();

        self.stats.committed += 1;
        info!(from = %from, to = %self.current, position = ?destination, "Flipped worlds");
        self.signals.emit_committed(self.current);
        FlipResult::Committed
    }

    /// Mutable access for the host's motion controller.
    pub fn body_mut(&mut self) -> &mut TrackedEntity {
        self.shadow_stale = true;
        &mut self.body
    }

    /// Mutable access for the host's camera controller.
    pub fn view_mut(&mut self) -> &mut ObservationSource {
        self.shadow_stale = true;
        &mut self.view
    }

    pub fn body(&self) -> &TrackedEntity {
        &self.body
    }

    pub fn view(&self) -> &ObservationSource {
        &self.view
    }

    pub fn shadow(&self) -> &ShadowEntity {
        self.synchronizer.shadow()
    }

    pub fn shadow_view(&self) -> &ShadowObservation {
        self.synchronizer.shadow_view()
    }

    pub fn current_world(&self) -> WorldId {
        self.current
    }

    pub fn other_world(&self) -> WorldId {
        self.current.other()
    }

    pub fn current_anchor_position(&self) -> Vector3<f64> {
        self.frames.current_anchor(self.current)
    }

    pub fn other_anchor_position(&self) -> Vector3<f64> {
        self.frames.other_anchor(self.current)
    }

    pub fn frames(&self) -> &WorldFrames {
        &self.frames
    }

    /// Observer registration for flip outcomes.
    pub fn signals_mut(&mut self) -> &mut FlipSignals {
        &mut self.signals
    }

    pub fn stats(&self) -> FlipStats {
        self.stats
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Total synchronization passes, including those triggered by flips.
    pub fn sync_count(&self) -> u64 {
        self.synchronizer.sync_count()
    }

    pub fn gate(&self) -> &SafetyGate<O> {
        &self.gate
    }

    pub fn capture(&self) -> &C {
        &self.capture
    }
}
