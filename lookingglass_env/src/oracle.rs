//! Volumetric overlap oracle abstraction.

use crate::types::CapsuleQuery;

/// Black-box overlap test against the physical environment.
///
/// # Implementations
///
/// - **Production**: wraps the host physics engine's capsule check
/// - **Simulation**: `ObstacleField` (geometric) or `ScriptedOracle` (canned answers)
///
/// # Contract
///
/// The engine treats the oracle as a pure predicate: no side effects on the
/// world, synchronous, bounded cost. It is called at most once per flip.
pub trait OverlapOracle {
    /// Returns true if the capsule overlaps any collider on a layer in `query.mask`.
    fn check_capsule(&self, query: &CapsuleQuery) -> bool;
}

impl<F> OverlapOracle for F
where
    F: Fn(&CapsuleQuery) -> bool,
{
    fn check_capsule(&self, query: &CapsuleQuery) -> bool {
        self(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LayerMask;
    use nalgebra::Vector3;

    fn query(mask: LayerMask) -> CapsuleQuery {
        CapsuleQuery {
            start: Vector3::zeros(),
            end: Vector3::y(),
            radius: 0.5,
            mask,
        }
    }

    #[test]
    fn test_closure_oracle() {
        let only_layer_three = |q: &CapsuleQuery| q.mask.contains(3);
        assert!(only_layer_three.check_capsule(&query(LayerMask::ALL)));
        assert!(!only_layer_three.check_capsule(&query(LayerMask::layer(1))));
    }

    #[test]
    fn test_borrowed_closure_oracle() {
        let always = |_: &CapsuleQuery| true;
        let borrowed = &always;
        assert!(borrowed.check_capsule(&query(LayerMask::NONE)));
    }
}
