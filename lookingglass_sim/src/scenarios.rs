//! Flip scenarios for the simulation harness.

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScenarioId {
    /// LG-001: Standing flip into an empty destination
    PortalClear,

    /// LG-002: Destination occupied by a pillar, every flip refused
    PortalBlocked,

    /// LG-003: Flip on every tick, parity and landing checks
    PingPong,

    /// LG-004: Random walk through a seeded pillar field
    Wander,

    /// LG-005: Body shorter than its own diameter
    DegenerateCapsule,

    /// LG-006: Obstacle on a layer excluded from the clearance mask
    LayerFilter,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::PortalClear,
            ScenarioId::PortalBlocked,
            ScenarioId::PingPong,
            ScenarioId::Wander,
            ScenarioId::DegenerateCapsule,
            ScenarioId::LayerFilter,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::PortalClear => "portal_clear",
            ScenarioId::PortalBlocked => "portal_blocked",
            ScenarioId::PingPong => "ping_pong",
            ScenarioId::Wander => "wander",
            ScenarioId::DegenerateCapsule => "degenerate_capsule",
            ScenarioId::LayerFilter => "layer_filter",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::PortalClear => "Stand still and flip on a clear floor, every attempt commits",
            ScenarioId::PortalBlocked => "Pillar on the destination, every attempt is rejected without side effects",
            ScenarioId::PingPong => "Flip every tick, world parity follows the commit count",
            ScenarioId::Wander => "Seeded walk among pillars, flips every 20 ticks, all invariants hold",
            ScenarioId::DegenerateCapsule => "Height below twice the radius, the clearance check still runs",
            ScenarioId::LayerFilter => "Obstacle on a masked-out layer does not block the flip",
        }
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "portal_clear" | "portalclear" | "lg-001" => Ok(ScenarioId::PortalClear),
            "portal_blocked" | "portalblocked" | "lg-002" => Ok(ScenarioId::PortalBlocked),
            "ping_pong" | "pingpong" | "lg-003" => Ok(ScenarioId::PingPong),
            "wander" | "lg-004" => Ok(ScenarioId::Wander),
            "degenerate_capsule" | "degeneratecapsule" | "lg-005" => Ok(ScenarioId::DegenerateCapsule),
            "layer_filter" | "layerfilter" | "lg-006" => Ok(ScenarioId::LayerFilter),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_parse_back() {
        for scenario in ScenarioId::all() {
            assert_eq!(scenario.name().parse::<ScenarioId>(), Ok(scenario));
            assert_eq!(scenario.to_string(), scenario.name());
        }
    }

    #[test]
    fn test_aliases() {
        assert_eq!("LG-003".parse::<ScenarioId>(), Ok(ScenarioId::PingPong));
        assert_eq!("PortalBlocked".parse::<ScenarioId>(), Ok(ScenarioId::PortalBlocked));
        assert!("split_brain".parse::<ScenarioId>().is_err());
    }
}
