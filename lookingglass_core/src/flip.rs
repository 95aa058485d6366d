//! Flip outcomes and the observers that hear about them.

use crate::frames::WorldId;
use serde::{Deserialize, Serialize};

/// Outcome of a flip attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlipResult {
    /// The body moved into the other world
    Committed,
    /// The destination was obstructed; nothing changed
    Rejected,
}

impl FlipResult {
    pub fn is_committed(&self) -> bool {
        matches!(self, FlipResult::Committed)
    }
}

/// Running totals of flip attempts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlipStats {
    pub committed: u64,
    pub rejected: u64,
}

impl FlipStats {
    pub fn attempts(&self) -> u64 {
        self.committed + self.rejected
    }
}

type RejectedCallback = Box<dyn FnMut() + Send>;
type CommittedCallback = Box<dyn FnMut(WorldId) + Send>;

/// Synchronous observer lists for flip outcomes.
///
/// Callbacks run in registration order, inside the `flip()` call that
/// produced the outcome.
#[derive(Default)]
pub struct FlipSignals {
    rejected: Vec<RejectedCallback>,
    committed: Vec<CommittedCallback>,
}

impl FlipSignals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a zero-argument observer for rejected flips.
    pub fn on_rejected<F>(&mut self, callback: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.rejected.push(Box::new(callback));
    }

    /// Registers an observer for committed flips; receives the new world.
    pub fn on_committed<F>(&mut self, callback: F)
    where
        F: FnMut(WorldId) + Send + 'static,
    {
        self.committed.push(Box::new(callback));
    }

    pub(crate) fn emit_rejected(&mut self) {
        for callback in &mut self.rejected {
            callback();
        }
    }

    pub(crate) fn emit_committed(&mut self, world: WorldId) {
        for callback in &mut self.committed {
            callback(world);
        }
    }

    /// Number of registered observers.
    pub fn len(&self) -> usize {
        self.rejected.len() + self.committed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for FlipSignals {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlipSignals")
            .field("rejected", &self.rejected.len())
            .field("committed", &self.committed.len())
            .finish()
    }
}
