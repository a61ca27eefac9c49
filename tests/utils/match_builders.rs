#![allow(dead_code)] // Test utilities may not all be used in every test

use volley_tracker::{ActionType, MatchCommand, MatchEngine, PointType, Team};

// ============================================================================
// Rally Scripts
// ============================================================================

/// Ordered list of commands describing rallies, replayable against an engine
/// or a service.
#[derive(Default)]
pub struct MatchScript {
    commands: Vec<MatchCommand>,
}

impl MatchScript {
    pub fn new() -> Self {
        Self::default()
    }

    /// A point won outright by `team`, landing mid-court.
    pub fn scored(self, team: Team, action: ActionType) -> Self {
        self.rally(team, PointType::Scored, action, Some((0.5, 0.5)))
    }

    /// A point won through the opponent's error.
    pub fn fault(self, team: Team, action: ActionType) -> Self {
        self.rally(team, PointType::Fault, action, None)
    }

    pub fn rally(
        mut self,
        team: Team,
        point_type: PointType,
        action: ActionType,
        position: Option<(f64, f64)>,
    ) -> Self {
        self.commands.push(MatchCommand::SelectAction {
            team,
            point_type,
            action,
        });
        self.commands.push(MatchCommand::AddPoint {
            x: position.map(|p| p.0),
            y: position.map(|p| p.1),
        });
        self
    }

    /// `count` outright points for `team`.
    pub fn run(mut self, team: Team, count: usize) -> Self {
        for _ in 0..count {
            self = self.scored(team, ActionType::Other);
        }
        self
    }

    pub fn then(mut self, command: MatchCommand) -> Self {
        self.commands.push(command);
        self
    }

    pub fn end_set(self) -> Self {
        self.then(MatchCommand::EndSet)
    }

    /// Applies every command, panicking on the first one the engine ignores.
    pub fn play(self, engine: &mut MatchEngine) {
        for command in self.commands {
            let description = format!("{command:?}");
            let outcome = engine.apply(command);
            assert!(outcome.is_applied(), "{description} was ignored: {outcome:?}");
        }
    }

    pub fn into_commands(self) -> Vec<MatchCommand> {
        self.commands
    }
}
