//! Overlap oracles for simulation.
//!
//! - [`ObstacleField`]: the simulated environment's colliders, answering
//!   capsule queries geometrically
//! - [`ScriptedOracle`]: canned answers, for driving the flip controller
//!   through exact outcomes

use lookingglass_env::{CapsuleQuery, LayerMask, OverlapOracle};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::VecDeque;

/// Iterations of the capsule-vs-box search. Each one keeps 2/3 of the interval.
const BOX_SEARCH_ITERATIONS: usize = 80;

/// Collider shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Shape {
    Sphere { center: Vector3<f64>, radius: f64 },
    Aabb { min: Vector3<f64>, max: Vector3<f64> },
}

/// A collider on a physics layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub shape: Shape,
    pub layer: u8,
}

impl Obstacle {
    pub fn sphere(center: Vector3<f64>, radius: f64, layer: u8) -> Self {
        Self {
            shape: Shape::Sphere { center, radius },
            layer,
        }
    }

    /// Axis-aligned box; corners may be given in any order.
    pub fn aabb(a: Vector3<f64>, b: Vector3<f64>, layer: u8) -> Self {
        Self {
            shape: Shape::Aabb {
                min: a.inf(&b),
                max: a.sup(&b),
            },
            layer,
        }
    }

    /// Returns true if the capsule (`start..end`, `radius`) touches this obstacle.
    pub fn overlaps_capsule(&self, start: &Vector3<f64>, end: &Vector3<f64>, radius: f64) -> bool {
        match self.shape {
            Shape::Sphere { center, radius: r } => {
                let closest = closest_on_segment(start, end, &center);
                (closest - center).norm() <= radius + r
            }
            Shape::Aabb { min, max } => segment_box_distance(start, end, &min, &max) <= radius,
        }
    }
}

/// Closest point to `p` on the segment `a..b`. A zero-length segment is the point `a`.
pub fn closest_on_segment(a: &Vector3<f64>, b: &Vector3<f64>, p: &Vector3<f64>) -> Vector3<f64> {
    let d = b - a;
    let len_sq = d.norm_squared();
    if len_sq <= f64::EPSILON {
        return *a;
    }
    let t = ((p - a).dot(&d) / len_sq).clamp(0.0, 1.0);
    a + d * t
}

fn point_box_distance(p: &Vector3<f64>, min: &Vector3<f64>, max: &Vector3<f64>) -> f64 {
    let clamped = p.sup(min).inf(max);
    (p - clamped).norm()
}

/// Minimum distance between the segment `a..b` and a box.
///
/// Distance to a convex set is convex along a line, so a ternary search
/// over the segment parameter converges on the minimum.
pub fn segment_box_distance(
    a: &Vector3<f64>,
    b: &Vector3<f64>,
    min: &Vector3<f64>,
    max: &Vector3<f64>,
) -> f64 {
    let d = b - a;
    let at = |t: f64| point_box_distance(&(a + d * t), min, max);

    let (mut lo, mut hi) = (0.0_f64, 1.0_f64);
    for _ in 0..BOX_SEARCH_ITERATIONS {
        let m1 = lo + (hi - lo) / 3.0;
        let m2 = hi - (hi - lo) / 3.0;
        if at(m1) <= at(m2) {
            hi = m2;
        } else {
            lo = m1;
        }
    }
    at(0.5 * (lo + hi)).min(at(0.0)).min(at(1.0))
}

/// The simulated environment's colliders.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObstacleField {
    obstacles: Vec<Obstacle>,
}

impl ObstacleField {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an obstacle and returns its index.
    pub fn add(&mut self, obstacle: Obstacle) -> usize {
        self.obstacles.push(obstacle);
        self.obstacles.len() - 1
    }

    /// Builder form of [`add`](Self::add).
    pub fn with(mut self, obstacle: Obstacle) -> Self {
        self.add(obstacle);
        self
    }

    /// Removes the obstacle at `index`, if present.
    pub fn remove(&mut self, index: usize) -> Option<Obstacle> {
        (index < self.obstacles.len()).then(|| self.obstacles.remove(index))
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }

    /// Obstacles on layers in `mask` that touch the capsule.
    pub fn overlapping(&self, query: &CapsuleQuery) -> Vec<&Obstacle> {
        self.obstacles
            .iter()
            .filter(|o| query.mask.contains(o.layer))
            .filter(|o| o.overlaps_capsule(&query.start, &query.end, query.radius))
            .collect()
    }
}

impl OverlapOracle for ObstacleField {
    fn check_capsule(&self, query: &CapsuleQuery) -> bool {
        self.obstacles
            .iter()
            .filter(|o| query.mask.contains(o.layer))
            .any(|o| o.overlaps_capsule(&query.start, &query.end, query.radius))
    }
}

/// Oracle that replays a fixed script of answers.
///
/// Answers are consumed in order; once the script runs out every query
/// gets the fallback answer. Every query is recorded.
#[derive(Debug, Default)]
pub struct ScriptedOracle {
    script: RefCell<VecDeque<bool>>,
    fallback: bool,
    queries: RefCell<Vec<CapsuleQuery>>,
}

impl ScriptedOracle {
    /// Script of answers (`true` = obstructed), clear once exhausted.
    pub fn new(answers: impl IntoIterator<Item = bool>) -> Self {
        Self {
            script: RefCell::new(answers.into_iter().collect()),
            fallback: false,
            queries: RefCell::new(Vec::new()),
        }
    }

    /// Always answers `blocked`.
    pub fn always(blocked: bool) -> Self {
        Self::new(std::iter::empty()).with_fallback(blocked)
    }

    pub fn with_fallback(mut self, blocked: bool) -> Self {
        self.fallback = blocked;
        self
    }

    /// Appends answers to the script.
    pub fn push(&self, answers: impl IntoIterator<Item = bool>) {
        self.script.borrow_mut().extend(answers);
    }

    /// All queries received so far.
    pub fn queries(&self) -> Vec<CapsuleQuery> {
        self.queries.borrow().clone()
    }

    pub fn query_count(&self) -> usize {
        self.queries.borrow().len()
    }
}

impl OverlapOracle for ScriptedOracle {
    fn check_capsule(&self, query: &CapsuleQuery) -> bool {
        self.queries.borrow_mut().push(*query);
        self.script.borrow_mut().pop_front().unwrap_or(self.fallback)
    }
}

/// Mask with every layer except `layer`.
pub fn all_but(layer: u8) -> LayerMask {
    LayerMask::ALL.without(layer)
}
