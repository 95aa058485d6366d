//! LookingGlass Deterministic Simulation Harness
//!
//! Runs the dual-world engine headless, with a geometric stand-in for the
//! physics engine and a seeded stand-in for the player:
//!
//! - **Oracle**: layered spheres and boxes answering capsule overlap queries
//! - **Motion**: random walk of the body, camera at eye height
//! - **Capture**: `HeadlessCapture` receives the shadow viewpoint every tick
//!
//! Every run is a pure function of its seed.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                       SimWorld                       │
//! │                                                      │
//! │  MotionDriver ──► RealityEngine ──► HeadlessCapture  │
//! │                        │                             │
//! │                        ▼                             │
//! │                  ObstacleField                       │
//! │             (spheres + boxes by layer)               │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use lookingglass_sim::{ScenarioRunner, scenarios::ScenarioId};
//!
//! let result = ScenarioRunner::new(42).with_duration(5.0).run(ScenarioId::Wander);
//! assert!(result.passed);
//! ```

mod exporter;
mod motion;
mod oracle;
mod runner;
mod world;
pub mod scenarios;

pub use exporter::{Point, SimEvent, SimExport, SimFrame};
pub use motion::{MotionDriver, MotionParams};
pub use oracle::{all_but, closest_on_segment, segment_box_distance, Obstacle, ObstacleField, ScriptedOracle, Shape};
pub use runner::{ScenarioMetrics, ScenarioResult, ScenarioRunner};
pub use world::{SimConfig, SimWorld, TickReport};
