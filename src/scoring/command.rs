use serde::{Deserialize, Serialize};

use super::errors::CommandRejection;
use super::types::{ActionType, PointType, Team};

/// Operator commands accepted by `MatchEngine::apply`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum MatchCommand {
    SelectAction {
        team: Team,
        #[serde(rename = "type", default)]
        point_type: PointType,
        action: ActionType,
    },
    SelectTeam {
        team: Team,
    },
    SelectPointType {
        #[serde(rename = "type")]
        point_type: PointType,
    },
    SelectActionType {
        action: ActionType,
    },
    SelectPlayer {
        player_id: Option<String>,
    },
    CancelSelection,
    AddPoint {
        #[serde(default)]
        x: Option<f64>,
        #[serde(default)]
        y: Option<f64>,
    },
    Undo,
    EndSet,
    ResetMatch,
    SwitchSides,
    SetTeamNames {
        a: String,
        b: String,
    },
    StartChrono,
    PauseChrono,
    FinishMatch,
    AddPlayer {
        name: String,
        team: Team,
        #[serde(default)]
        number: Option<u8>,
    },
    RemovePlayer {
        player_id: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Applied,
    Ignored(CommandRejection),
}

impl CommandOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, CommandOutcome::Applied)
    }
}

impl<T> From<Result<T, CommandRejection>> for CommandOutcome {
    fn from(result: Result<T, CommandRejection>) -> Self {
        match result {
            Ok(_) => CommandOutcome::Applied,
            Err(rejection) => CommandOutcome::Ignored(rejection),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tagged_commands() {
        let command: MatchCommand = serde_json::from_str(
            r#"{"command": "select_action", "team": "B", "type": "scored", "action": "serve"}"#,
        )
        .unwrap();
        assert_eq!(
            command,
            MatchCommand::SelectAction {
                team: Team::B,
                point_type: PointType::Scored,
                action: ActionType::Service,
            }
        );

        let command: MatchCommand =
            serde_json::from_str(r#"{"command": "add_point", "x": 0.3, "y": 0.7}"#).unwrap();
        assert_eq!(
            command,
            MatchCommand::AddPoint {
                x: Some(0.3),
                y: Some(0.7)
            }
        );

        let command: MatchCommand = serde_json::from_str(r#"{"command": "undo"}"#).unwrap();
        assert_eq!(command, MatchCommand::Undo);
    }

    #[test]
    fn add_point_coordinates_are_optional() {
        let command: MatchCommand =
            serde_json::from_str(r#"{"command": "add_point"}"#).unwrap();
        assert_eq!(command, MatchCommand::AddPoint { x: None, y: None });
    }

    #[test]
    fn outcome_from_result() {
        let ok: Result<(), CommandRejection> = Ok(());
        assert!(CommandOutcome::from(ok).is_applied());

        let err: Result<(), CommandRejection> = Err(CommandRejection::EmptyLedger);
        assert_eq!(
            CommandOutcome::from(err),
            CommandOutcome::Ignored(CommandRejection::EmptyLedger)
        );
    }
}
