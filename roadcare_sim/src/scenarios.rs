//! Detection scenarios for the harness.

use serde::{Deserialize, Serialize};

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioId {
    /// SCN-001: Same user, same spot, 10 hours later
    RepeatSubmitter,

    /// SCN-002: Same user, same spot, after the window closed
    CooledDown,

    /// SCN-003: Many users at one spot, fed in as "own" history
    CrossUser,

    /// SCN-004: Random cluster vs. oracle ground truth
    Hotspot,

    /// SCN-005: Feed full of broken rows
    MalformedFeed,

    /// SCN-006: Inputs larger than the scan caps
    ScanCap,

    /// SCN-007: New report outside the valid coordinate range
    InvalidLocation,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::RepeatSubmitter,
            ScenarioId::CooledDown,
            ScenarioId::CrossUser,
            ScenarioId::Hotspot,
            ScenarioId::MalformedFeed,
            ScenarioId::ScanCap,
            ScenarioId::InvalidLocation,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::RepeatSubmitter => "repeat_submitter",
            ScenarioId::CooledDown => "cooled_down",
            ScenarioId::CrossUser => "cross_user",
            ScenarioId::Hotspot => "hotspot",
            ScenarioId::MalformedFeed => "malformed_feed",
            ScenarioId::ScanCap => "scan_cap",
            ScenarioId::InvalidLocation => "invalid_location",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::RepeatSubmitter => "Same user re-reports a spot after 10h; must block with ~62h left",
            ScenarioId::CooledDown => "Same user re-reports after 80h; must pass and count the old report",
            ScenarioId::CrossUser => "Five other users at the same spot; must never block",
            ScenarioId::Hotspot => "Gaussian cluster plus far noise; counts must match ground truth",
            ScenarioId::MalformedFeed => "Missing, partial and label locations; must skip, not fail",
            ScenarioId::ScanCap => "500-report pool and 61-report history; caps must hold",
            ScenarioId::InvalidLocation => "Latitude 95; must degrade and still allow submission",
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
            "repeat_submitter" | "repeatsubmitter" | "scn-001" => Ok(ScenarioId::RepeatSubmitter),
            "cooled_down" | "cooleddown" | "scn-002" => Ok(ScenarioId::CooledDown),
            "cross_user" | "crossuser" | "scn-003" => Ok(ScenarioId::CrossUser),
            "hotspot" | "scn-004" => Ok(ScenarioId::Hotspot),
            "malformed_feed" | "malformedfeed" | "scn-005" => Ok(ScenarioId::MalformedFeed),
            "scan_cap" | "scancap" | "scn-006" => Ok(ScenarioId::ScanCap),
            "invalid_location" | "invalidlocation" | "scn-007" => Ok(ScenarioId::InvalidLocation),
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
        }
    }

    #[test]
    fn test_aliases() {
        assert_eq!("SCN-004".parse::<ScenarioId>(), Ok(ScenarioId::Hotspot));
        assert!("split_brain".parse::<ScenarioId>().is_err());
    }
}
