//! The two worlds and their anchors.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Identifies one of the two parallel worlds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorldId {
    #[default]
    A,
    B,
}

impl WorldId {
    /// Both worlds, in declaration order.
    pub const BOTH: [WorldId; 2] = [WorldId::A, WorldId::B];

    /// Returns the complementary world.
    pub fn other(self) -> WorldId {
        match self {
            WorldId::A => WorldId::B,
            WorldId::B => WorldId::A,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            WorldId::A => "world_a",
            WorldId::B => "world_b",
        }
    }
}

impl std::fmt::Display for WorldId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for WorldId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "a" | "world_a" | "world1" | "1" => Ok(WorldId::A),
            "b" | "world_b" | "world2" | "2" => Ok(WorldId::B),
            _ => Err(format!("Unknown world: {}", s)),
        }
    }
}

/// Registry of the anchor position of each world.
///
/// Anchors are fixed at construction. Moving an anchor while the engine
/// runs is not supported, so there is no setter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldFrames {
    world_a: Vector3<f64>,
    world_b: Vector3<f64>,
}

impl WorldFrames {
    pub fn new(world_a: Vector3<f64>, world_b: Vector3<f64>) -> Self {
        Self { world_a, world_b }
    }

    /// Anchor position of the given world.
    pub fn anchor_of(&self, world: WorldId) -> Vector3<f64> {
        match world {
            WorldId::A => self.world_a,
            WorldId::B => self.world_b,
        }
    }

    /// Anchor of the world the body is in.
    pub fn current_anchor(&self, current: WorldId) -> Vector3<f64> {
        self.anchor_of(current)
    }

    /// Anchor of the shadowed world.
    pub fn other_anchor(&self, current: WorldId) -> Vector3<f64> {
        self.anchor_of(current.other())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_complement() {
        assert_eq!(WorldId::A.other(), WorldId::B);
        assert_eq!(WorldId::B.other(), WorldId::A);
        for world in WorldId::BOTH {
            assert_ne!(world, world.other());
            assert_eq!(world, world.other().other());
        }
    }

    #[test]
    fn test_world_parse() {
        assert_eq!("A".parse::<WorldId>(), Ok(WorldId::A));
        assert_eq!("world_b".parse::<WorldId>(), Ok(WorldId::B));
        assert_eq!("World2".parse::<WorldId>(), Ok(WorldId::B));
        assert!("c".parse::<WorldId>().is_err());
    }

    #[test]
    fn test_anchor_lookup() {
        let frames = WorldFrames::new(Vector3::zeros(), Vector3::new(10.0, 0.0, 0.0));

        assert_eq!(frames.anchor_of(WorldId::A), Vector3::zeros());
        assert_eq!(frames.current_anchor(WorldId::B), Vector3::new(10.0, 0.0, 0.0));
        assert_eq!(frames.other_anchor(WorldId::B), Vector3::zeros());
    }
}
