use thiserror::Error;

/// Why a command left the match untouched. Rejections are never fatal; the
/// caller may surface them or drop them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CommandRejection {
    #[error("no team and action staged")]
    IncompleteSelection,

    #[error("scored points need a court position")]
    MissingPosition,

    #[error("court position outside the unit square")]
    InvalidPosition,

    #[error("current set has no points")]
    EmptyLedger,

    #[error("match is finished")]
    MatchFinished,

    #[error("sides can only be switched between sets")]
    SetInProgress,

    #[error("clock already in the requested state")]
    ClockUnchanged,

    #[error("unknown player")]
    UnknownPlayer,

    #[error("player has recorded points")]
    PlayerHasPoints,

    #[error("name must not be empty")]
    EmptyName,
}

/// Structural problems found while rehydrating a `MatchSummary`.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("set numbers must run 1..={expected_last}, found {found} at position {position}")]
    SetOrder {
        position: usize,
        found: u32,
        expected_last: u32,
    },

    #[error("current set number {found} does not follow {completed} completed sets")]
    CurrentSetNumber { found: u32, completed: usize },

    #[error("set {set}: stored score {stored} does not match its points ({computed})")]
    ScoreMismatch {
        set: u32,
        stored: String,
        computed: String,
    },

    #[error("set {set}: point values overflow the score")]
    ScoreOverflow { set: u32 },

    #[error("invalid scoring rules: {0}")]
    Rules(&'static str),

    #[error("set {set}: winner does not lead the final score")]
    WinnerMismatch { set: u32 },

    #[error("duplicate point id {0}")]
    DuplicatePoint(String),

    #[error("point {0} has coordinates outside the court")]
    InvalidPosition(String),

    #[error("point {0} is older than the point before it")]
    TimestampOrder(String),

    #[error("point {point} references unknown player {player}")]
    UnknownPlayer { point: String, player: String },

    #[error("invalid clock: {0}")]
    Clock(String),

    #[error("updatedAt precedes createdAt")]
    Timestamps,
}
