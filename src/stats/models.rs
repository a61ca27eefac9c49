use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::scoring::{ActionType, PerTeam, PointType, Score, Team};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamTally {
    /// Score contribution, honouring point values.
    pub points: u32,
    pub scored: u32,
    pub fault: u32,
}

impl TeamTally {
    pub fn record(&mut self, point_type: PointType, value: u32) {
        self.points = self.points.saturating_add(value);
        match point_type {
            PointType::Scored => self.scored += 1,
            PointType::Fault => self.fault += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerTally {
    pub player_id: String,
    pub scored: u32,
    pub fault: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapPoint {
    pub x: f64,
    pub y: f64,
    pub team: Team,
    pub set_number: u32,
}

/// Folded tallies for some set of points.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Breakdown {
    pub totals: PerTeam<TeamTally>,
    pub actions: BTreeMap<ActionType, PerTeam<u32>>,
    pub players: BTreeMap<String, PlayerTally>,
    pub heatmap: Vec<HeatmapPoint>,
}

impl Breakdown {
    pub fn action_count(&self, action: ActionType, team: Team) -> u32 {
        self.actions
            .get(&action)
            .map(|counts| *counts.get(team))
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetStats {
    pub number: u32,
    pub score: Score,
    pub winner: Option<Team>,
    /// `None` for the set still in progress.
    pub duration: Option<u64>,
    pub in_progress: bool,
    pub breakdown: Breakdown,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchStats {
    pub overall: Breakdown,
    pub sets: Vec<SetStats>,
    pub sets_score: Score,
}

impl MatchStats {
    pub fn set(&self, number: u32) -> Option<&SetStats> {
        self.sets.iter().find(|set| set.number == number)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CollectedData {
    TeamPoint {
        team: Team,
        point_type: PointType,
        value: u32,
    },
    ActionPoint {
        action: ActionType,
        team: Team,
    },
    PlayerPoint {
        player_id: String,
        point_type: PointType,
    },
    Spot(HeatmapPoint),
}
