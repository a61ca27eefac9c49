// Public API
pub use clock::{ClockState, ManualTimeSource, MatchClock, SystemTimeSource, TimeSource};
pub use command::{CommandOutcome, MatchCommand};
pub use engine::{MatchEngine, MatchEngineBuilder};
pub use errors::{CommandRejection, SnapshotError};
pub use evaluator::SetEvaluation;
pub use ledger::{PointLedger, SelectionCursor, StagedPoint};
pub use rules::{ActionPolicy, ScoringRules, SideSwapPolicy, Sport};
pub use snapshot::MatchSummary;
pub use types::{
    ActionType, CourtPosition, PerTeam, Player, Point, PointType, Score, SetData, Team, TeamNames,
};

// Internal modules
mod clock;
mod command;
mod engine;
mod errors;
pub mod evaluator;
mod ledger;
mod rules;
mod snapshot;
mod types;
