use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::errors::SnapshotError;
use super::evaluator::checked_score_points;
use super::rules::{ScoringRules, Sport};
use super::types::{Player, Point, SetData, TeamNames};

/// Storage-agnostic record of a whole match. This is the shape handed to
/// persistence and sharing collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSummary {
    pub id: String,
    #[serde(default)]
    pub sport: Sport,
    /// Rules the match is played under. Older snapshots carry none and fall
    /// back to the sport's defaults.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<ScoringRules>,
    pub team_names: TeamNames,
    pub completed_sets: Vec<SetData>,
    pub current_set_number: u32,
    /// Points of the set in progress.
    pub points: Vec<Point>,
    pub sides_swapped: bool,
    pub chrono_seconds: u64,
    /// Clock reading at which the set in progress began.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_set_started_at: Option<u64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub finished: bool,
    #[serde(default)]
    pub players: Vec<Player>,
    /// Read-only share token. Owned by the repository: engines never set it
    /// and saves keep whatever token is already stored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share_token: Option<String>,
}

impl MatchSummary {
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let summary: MatchSummary = serde_json::from_str(json)?;
        summary.validate()?;
        Ok(summary)
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Clock reading at which the active set began, falling back to the sum
    /// of completed set durations for snapshots that predate the field.
    pub fn set_started_at(&self) -> u64 {
        self.current_set_started_at.unwrap_or_else(|| {
            self.completed_sets
                .iter()
                .map(|set| set.duration)
                .sum::<u64>()
                .min(self.chrono_seconds)
        })
    }

    pub fn effective_rules(&self) -> ScoringRules {
        self.rules.unwrap_or_else(|| self.sport.default_rules())
    }

    /// Checks every structural invariant. Nothing is applied on failure.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        if self.id.trim().is_empty() {
            return Err(SnapshotError::MissingField("id"));
        }
        if let Some(problem) = self.rules.as_ref().and_then(ScoringRules::problem) {
            return Err(SnapshotError::Rules(problem));
        }
        if self.updated_at < self.created_at {
            return Err(SnapshotError::Timestamps);
        }

        let expected_last = self.completed_sets.len() as u32;
        for (position, set) in self.completed_sets.iter().enumerate() {
            if set.id.trim().is_empty() {
                return Err(SnapshotError::MissingField("completedSets[].id"));
            }
            if set.number != position as u32 + 1 {
                return Err(SnapshotError::SetOrder {
                    position,
                    found: set.number,
                    expected_last,
                });
            }
            let computed = checked_score_points(&set.points)
                .ok_or(SnapshotError::ScoreOverflow { set: set.number })?;
            if computed != set.score {
                return Err(SnapshotError::ScoreMismatch {
                    set: set.number,
                    stored: set.score.to_string(),
                    computed: computed.to_string(),
                });
            }
            if let Some(winner) = set.winner {
                if set.score.leader() != Some(winner) {
                    return Err(SnapshotError::WinnerMismatch { set: set.number });
                }
            }
        }

        if self.current_set_number as usize != self.completed_sets.len() + 1 {
            return Err(SnapshotError::CurrentSetNumber {
                found: self.current_set_number,
                completed: self.completed_sets.len(),
            });
        }
        if checked_score_points(&self.points).is_none() {
            return Err(SnapshotError::ScoreOverflow {
                set: self.current_set_number,
            });
        }

        let roster: HashSet<&str> = self.players.iter().map(|p| p.id.as_str()).collect();
        let mut seen = HashSet::new();
        let ledgers = self
            .completed_sets
            .iter()
            .map(|set| set.points.as_slice())
            .chain(std::iter::once(self.points.as_slice()));

        for ledger in ledgers {
            let mut previous: Option<i64> = None;
            for point in ledger {
                if point.id.trim().is_empty() {
                    return Err(SnapshotError::MissingField("points[].id"));
                }
                if !seen.insert(point.id.as_str()) {
                    return Err(SnapshotError::DuplicatePoint(point.id.clone()));
                }
                if point.position.is_some_and(|p| !p.is_valid()) {
                    return Err(SnapshotError::InvalidPosition(point.id.clone()));
                }
                if previous.is_some_and(|t| point.timestamp < t) {
                    return Err(SnapshotError::TimestampOrder(point.id.clone()));
                }
                if let Some(player) = &point.player_id {
                    if !roster.contains(player.as_str()) {
                        return Err(SnapshotError::UnknownPlayer {
                            point: point.id.clone(),
                            player: player.clone(),
                        });
                    }
                }
                previous = Some(point.timestamp);
            }
        }

        if let Some(started) = self.current_set_started_at {
            if started > self.chrono_seconds {
                return Err(SnapshotError::Clock(format!(
                    "set started at {started}s but clock reads {}s",
                    self.chrono_seconds
                )));
            }
        }

        Ok(())
    }
}
