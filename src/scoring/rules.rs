use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::types::{ActionType, PointType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sport {
    #[default]
    Volleyball,
    BeachVolleyball,
}

impl Sport {
    pub fn default_rules(self) -> ScoringRules {
        match self {
            Sport::Volleyball => ScoringRules {
                target_points: 25,
                deciding_set_points: 15,
                sets_to_win: 3,
                win_by: 2,
            },
            Sport::BeachVolleyball => ScoringRules {
                target_points: 21,
                deciding_set_points: 15,
                sets_to_win: 2,
                win_by: 2,
            },
        }
    }
}

impl TryFrom<&str> for Sport {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "volleyball" => Ok(Sport::Volleyball),
            "beach_volleyball" | "beach" => Ok(Sport::BeachVolleyball),
            _ => Err(s.to_string()),
        }
    }
}

/// Set and match win conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringRules {
    pub target_points: u32,
    /// Target for the deciding set (`2 * sets_to_win - 1`).
    pub deciding_set_points: u32,
    pub sets_to_win: u32,
    pub win_by: u32,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Sport::default().default_rules()
    }
}

impl ScoringRules {
    pub fn deciding_set_number(&self) -> u32 {
        (self.sets_to_win.max(1) * 2) - 1
    }

    pub fn target_for_set(&self, set_number: u32) -> u32 {
        if set_number == self.deciding_set_number() {
            self.deciding_set_points
        } else {
            self.target_points
        }
    }

    pub fn margin(&self) -> u32 {
        self.win_by.max(1)
    }

    /// Rules that can never decide a set or a match.
    pub fn problem(&self) -> Option<&'static str> {
        if self.target_points == 0 || self.deciding_set_points == 0 {
            Some("set targets must be positive")
        } else if self.sets_to_win == 0 {
            Some("sets to win must be positive")
        } else {
            None
        }
    }
}

/// Whether `switch_sides` is honoured while a set has points recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SideSwapPolicy {
    #[default]
    BetweenSets,
    Anytime,
}

impl TryFrom<&str> for SideSwapPolicy {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "between_sets" => Ok(SideSwapPolicy::BetweenSets),
            "anytime" => Ok(SideSwapPolicy::Anytime),
            _ => Err(s.to_string()),
        }
    }
}

/// Table of action categories that force a point type regardless of what
/// the operator staged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionPolicy {
    forced: HashMap<ActionType, PointType>,
}

impl Default for ActionPolicy {
    fn default() -> Self {
        Self::empty()
            .with_rule(ActionType::Service, PointType::Fault)
            .with_rule(ActionType::Attack, PointType::Fault)
            .with_rule(ActionType::BlockOut, PointType::Fault)
    }
}

impl ActionPolicy {
    pub fn empty() -> Self {
        Self {
            forced: HashMap::new(),
        }
    }

    pub fn with_rule(mut self, action: ActionType, forced: PointType) -> Self {
        self.forced.insert(action, forced);
        self
    }

    pub fn without_rule(mut self, action: ActionType) -> Self {
        self.forced.remove(&action);
        self
    }

    pub fn forced_type(&self, action: ActionType) -> Option<PointType> {
        self.forced.get(&action).copied()
    }

    pub fn resolve(&self, action: ActionType, requested: PointType) -> PointType {
        self.forced_type(action).unwrap_or(requested)
    }
}
