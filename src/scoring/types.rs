use serde::{Deserialize, Serialize};
use std::fmt;
use strum_macros::EnumIter;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, EnumIter,
)]
pub enum Team {
    A,
    B,
}

impl Team {
    pub fn opponent(self) -> Team {
        match self {
            Team::A => Team::B,
            Team::B => Team::A,
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Team::A => "A",
                Team::B => "B",
            }
        )
    }
}

impl TryFrom<&str> for Team {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "A" | "a" => Ok(Team::A),
            "B" | "b" => Ok(Team::B),
            _ => Err(s.to_string()),
        }
    }
}

/// How a point was won: outright, or through the opponent's error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointType {
    #[default]
    Scored,
    Fault,
}

impl fmt::Display for PointType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointType::Scored => write!(f, "scored"),
            PointType::Fault => write!(f, "fault"),
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, EnumIter,
)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    #[serde(alias = "serve")]
    Service,
    Attack,
    BlockOut,
    Other,
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                ActionType::Service => "service",
                ActionType::Attack => "attack",
                ActionType::BlockOut => "block_out",
                ActionType::Other => "other",
            }
        )
    }
}

/// A value held once per team, serialized as `{"A": .., "B": ..}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PerTeam<T> {
    #[serde(rename = "A")]
    pub a: T,
    #[serde(rename = "B")]
    pub b: T,
}

impl<T> PerTeam<T> {
    pub fn new(a: T, b: T) -> Self {
        Self { a, b }
    }

    pub fn get(&self, team: Team) -> &T {
        match team {
            Team::A => &self.a,
            Team::B => &self.b,
        }
    }

    pub fn get_mut(&mut self, team: Team) -> &mut T {
        match team {
            Team::A => &mut self.a,
            Team::B => &mut self.b,
        }
    }
}

pub type Score = PerTeam<u32>;

impl Score {
    pub fn total(&self) -> u32 {
        self.a + self.b
    }

    /// The team strictly ahead, if any.
    pub fn leader(&self) -> Option<Team> {
        match self.a.cmp(&self.b) {
            std::cmp::Ordering::Greater => Some(Team::A),
            std::cmp::Ordering::Less => Some(Team::B),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub fn lead(&self) -> u32 {
        self.a.abs_diff(self.b)
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.a, self.b)
    }
}

pub type TeamNames = PerTeam<String>;

impl TeamNames {
    pub fn with_defaults() -> Self {
        Self::new("Team A".to_string(), "Team B".to_string())
    }
}

/// Normalized court coordinates, both axes in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CourtPosition {
    pub x: f64,
    pub y: f64,
}

impl CourtPosition {
    pub fn new(x: f64, y: f64) -> Option<Self> {
        let position = Self { x, y };
        position.is_valid().then_some(position)
    }

    pub fn is_valid(&self) -> bool {
        (0.0..=1.0).contains(&self.x) && (0.0..=1.0).contains(&self.y)
    }
}

/// On the wire the position is flattened into top-level `x`/`y` fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "PointRecord", into = "PointRecord")]
pub struct Point {
    pub id: String,
    pub team: Team,
    pub point_type: PointType,
    pub action: ActionType,
    pub position: Option<CourtPosition>,
    /// Epoch milliseconds.
    pub timestamp: i64,
    pub player_id: Option<String>,
    pub point_value: Option<u32>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PointRecord {
    id: String,
    team: Team,
    #[serde(rename = "type")]
    point_type: PointType,
    action: ActionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    y: Option<f64>,
    // Nested form written by earlier builds; read only.
    #[serde(default, skip_serializing)]
    position: Option<CourtPosition>,
    timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    player_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    point_value: Option<u32>,
}

impl From<PointRecord> for Point {
    fn from(record: PointRecord) -> Self {
        let position = match (record.x, record.y) {
            (Some(x), Some(y)) => Some(CourtPosition { x, y }),
            _ => record.position,
        };
        Self {
            id: record.id,
            team: record.team,
            point_type: record.point_type,
            action: record.action,
            position,
            timestamp: record.timestamp,
            player_id: record.player_id,
            point_value: record.point_value,
        }
    }
}

impl From<Point> for PointRecord {
    fn from(point: Point) -> Self {
        Self {
            id: point.id,
            team: point.team,
            point_type: point.point_type,
            action: point.action,
            x: point.position.map(|p| p.x),
            y: point.position.map(|p| p.y),
            position: None,
            timestamp: point.timestamp,
            player_id: point.player_id,
            point_value: point.point_value,
        }
    }
}

impl Point {
    /// The team whose score this point increments. The operator always
    /// records the credited team, faults included.
    pub fn beneficiary(&self) -> Team {
        self.team
    }

    /// The team that committed the error, for fault points.
    pub fn team_at_fault(&self) -> Option<Team> {
        match self.point_type {
            PointType::Fault => Some(self.team.opponent()),
            PointType::Scored => None,
        }
    }

    pub fn value(&self) -> u32 {
        self.point_value.unwrap_or(1)
    }
}

/// A finished set. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetData {
    pub id: String,
    pub number: u32,
    pub points: Vec<Point>,
    pub score: Score,
    pub winner: Option<Team>,
    /// Clock seconds elapsed while the set was active.
    pub duration: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    pub name: String,
    pub team: Team,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn point(team: Team, point_type: PointType) -> Point {
        Point {
            id: "p1".to_string(),
            team,
            point_type,
            action: ActionType::Other,
            position: None,
            timestamp: 0,
            player_id: None,
            point_value: None,
        }
    }

    #[test]
    fn fault_points_credit_the_recorded_team() {
        let fault = point(Team::B, PointType::Fault);
        assert_eq!(fault.beneficiary(), Team::B);
        assert_eq!(fault.team_at_fault(), Some(Team::A));

        let scored = point(Team::A, PointType::Scored);
        assert_eq!(scored.beneficiary(), Team::A);
        assert_eq!(scored.team_at_fault(), None);
    }

    #[rstest]
    #[case(0.0, 0.0, true)]
    #[case(1.0, 1.0, true)]
    #[case(0.3, 0.7, true)]
    #[case(-0.1, 0.5, false)]
    #[case(0.5, 1.2, false)]
    #[case(f64::NAN, 0.5, false)]
    fn court_position_bounds(#[case] x: f64, #[case] y: f64, #[case] valid: bool) {
        assert_eq!(CourtPosition::new(x, y).is_some(), valid);
    }

    #[test]
    fn score_leader_and_lead() {
        let score = Score::new(25, 23);
        assert_eq!(score.leader(), Some(Team::A));
        assert_eq!(score.lead(), 2);
        assert_eq!(Score::new(10, 10).leader(), None);
        assert_eq!(score.to_string(), "25-23");
    }

    #[test]
    fn point_serializes_with_original_field_names() {
        let mut p = point(Team::A, PointType::Fault);
        p.action = ActionType::BlockOut;
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["type"], "fault");
        assert_eq!(json["action"], "block_out");
        assert_eq!(json["team"], "A");
        assert!(json.get("position").is_none());
    }

    #[test]
    fn point_decodes_top_level_coordinates() {
        let json = r#"{"id":"p","team":"A","type":"scored","action":"other","x":0.3,"y":0.7,"timestamp":1}"#;
        let p: Point = serde_json::from_str(json).unwrap();
        assert_eq!(p.position, CourtPosition::new(0.3, 0.7));
        assert_eq!(p.point_type, PointType::Scored);
        assert_eq!(p.timestamp, 1);
    }

    #[test]
    fn point_encodes_coordinates_at_top_level() {
        let mut p = point(Team::B, PointType::Scored);
        p.position = CourtPosition::new(0.25, 0.5);
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["x"], 0.25);
        assert_eq!(json["y"], 0.5);
        assert!(json.get("position").is_none());
    }

    #[rstest]
    #[case(r#"{"id":"p","team":"B","type":"fault","action":"serve","timestamp":1}"#, None)]
    #[case(r#"{"id":"p","team":"B","type":"fault","action":"serve","x":null,"y":null,"timestamp":1}"#, None)]
    #[case(r#"{"id":"p","team":"B","type":"fault","action":"serve","x":0.5,"timestamp":1}"#, None)]
    #[case(
        r#"{"id":"p","team":"B","type":"scored","action":"other","position":{"x":0.1,"y":0.9},"timestamp":1}"#,
        CourtPosition::new(0.1, 0.9)
    )]
    fn point_position_decoding(#[case] json: &str, #[case] expected: Option<CourtPosition>) {
        let p: Point = serde_json::from_str(json).unwrap();
        assert_eq!(p.position, expected);
    }

    #[test]
    fn serve_is_accepted_as_service_alias() {
        let action: ActionType = serde_json::from_str("\"serve\"").unwrap();
        assert_eq!(action, ActionType::Service);
    }

    #[test]
    fn team_parses_from_str() {
        assert_eq!(Team::try_from("a"), Ok(Team::A));
        assert_eq!(Team::try_from("B"), Ok(Team::B));
        assert!(Team::try_from("blue").is_err());
    }
}
