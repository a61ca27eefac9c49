pub mod aggregator;
pub mod collectors;
pub mod models;

pub use aggregator::{StatsAggregator, StatsAggregatorBuilder};
pub use models::*;

use crate::scoring::Point;

pub type CollectedDataBatch = Vec<CollectedData>;

/// A slice of one set's ledger handed to collectors.
#[derive(Debug, Clone, Copy)]
pub struct PointScope<'a> {
    pub set_number: u32,
    pub points: &'a [Point],
}

impl<'a> PointScope<'a> {
    pub fn new(set_number: u32, points: &'a [Point]) -> Self {
        Self { set_number, points }
    }
}

/// Turns points into tallies for the aggregator to fold. Collectors are pure
/// and see every point of the scope.
pub trait StatCollector: Send + Sync {
    fn collect(&self, scope: &PointScope<'_>) -> CollectedDataBatch;
}
