use serde::{Deserialize, Serialize};

use super::evaluator::score_points;
use super::rules::ActionPolicy;
use super::types::{ActionType, Point, PointType, Score, Team};

/// Selection staged by the operator before a point is committed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionCursor {
    pub team: Option<Team>,
    pub point_type: Option<PointType>,
    pub action: Option<ActionType>,
    pub player_id: Option<String>,
}

/// A complete cursor, ready to become a `Point`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedPoint {
    pub team: Team,
    pub point_type: PointType,
    pub action: ActionType,
    pub player_id: Option<String>,
}

impl SelectionCursor {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn stage(
        &mut self,
        team: Team,
        point_type: PointType,
        action: ActionType,
        policy: &ActionPolicy,
    ) {
        self.team = Some(team);
        self.action = Some(action);
        self.point_type = Some(policy.resolve(action, point_type));
    }

    pub fn set_action(&mut self, action: ActionType, policy: &ActionPolicy) {
        self.action = Some(action);
        if let Some(forced) = policy.forced_type(action) {
            self.point_type = Some(forced);
        }
    }

    /// Returns the staged point with the action policy re-applied, or `None`
    /// while team or action is missing.
    pub fn staged(&self, policy: &ActionPolicy) -> Option<StagedPoint> {
        let team = self.team?;
        let action = self.action?;
        let requested = self.point_type.unwrap_or_default();
        Some(StagedPoint {
            team,
            point_type: policy.resolve(action, requested),
            action,
            player_id: self.player_id.clone(),
        })
    }
}

/// Points of the active set, in commit order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointLedger {
    points: Vec<Point>,
}

impl PointLedger {
    pub fn from_points(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> Option<&Point> {
        self.points.last()
    }

    /// Timestamp for the next point, strictly after the last one.
    pub fn next_timestamp(&self, now_millis: i64) -> i64 {
        match self.points.last() {
            Some(last) if now_millis <= last.timestamp => last.timestamp + 1,
            _ => now_millis,
        }
    }

    pub fn append(&mut self, point: Point) -> &Point {
        self.points.push(point);
        &self.points[self.points.len() - 1]
    }

    pub fn pop(&mut self) -> Option<Point> {
        self.points.pop()
    }

    pub fn take(&mut self) -> Vec<Point> {
        std::mem::take(&mut self.points)
    }

    pub fn score(&self) -> Score {
        score_points(&self.points)
    }
}
