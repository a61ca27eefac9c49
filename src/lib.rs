// Library crate for the volleyball match tracker
// This file exposes the public API for integration tests

pub mod config;
pub mod scoring;
pub mod service;
pub mod shared;
pub mod stats;
pub mod storage;

// Re-export commonly used types for easier access in tests
pub use config::TrackerConfig;
pub use scoring::{
    ActionType, CommandOutcome, CommandRejection, MatchCommand, MatchEngine, MatchSummary, Point,
    PointType, Score, SnapshotError, Team,
};
pub use service::{MatchService, MatchStatus};
pub use shared::AppError;
pub use stats::{MatchStats, StatsAggregator};
pub use storage::{FileMatchRepository, InMemoryMatchRepository, MatchRepository, StorageError};
