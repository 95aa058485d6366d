//! LookingGlass Core - Dual-World Synchronization Engine
//!
//! A tracked body lives in one of two parallel worlds, each pinned to an
//! anchor. This library keeps a mirrored "shadow" of the body (and of its
//! camera) in the other world every tick, and moves the body across when
//! asked, provided the landing spot is free:
//!
//! 1. **Frames**: the two worlds and their anchors
//! 2. **Mirror**: anchor-to-anchor pose mapping
//! 3. **Synchronizer**: per-tick shadow body/camera refresh
//! 4. **Safety Gate**: capsule overlap check at the destination
//! 5. **Flip**: the all-or-nothing world switch
//!
//! # Tick order
//!
//! ```text
//! host controllers ──► RealityEngine::tick() ──► capture pipeline
//!  (body_mut/view_mut)     (synchronize)          (source_updated)
//!                                │
//!                     RealityEngine::flip() ──► OverlapOracle
//! ```

pub mod config;
pub mod entities;
pub mod error;
pub mod flip;
pub mod frames;
pub mod mirror;
pub mod reality;
pub mod safety;
pub mod synchronizer;

// Re-export key types for convenience
pub use config::RealityConfig;
pub use entities::{ObservationSource, ShadowEntity, ShadowObservation, TrackedEntity};
pub use error::ConfigError;
pub use flip::{FlipResult, FlipSignals, FlipStats};
pub use frames::{WorldFrames, WorldId};
pub use mirror::{mirror, mirror_position};
pub use reality::RealityEngine;
pub use safety::SafetyGate;
pub use synchronizer::ShadowSynchronizer;
