use std::sync::Arc;

use crate::scoring::evaluator::{score_points, sets_won};
use crate::scoring::{Point, SetData};

use super::{
    collectors::{
        ActionBreakdownCollector, HeatmapCollector, PlayerTotalsCollector, TeamTotalsCollector,
    },
    Breakdown, CollectedData, MatchStats, PlayerTally, PointScope, SetStats, StatCollector,
};

/// Folds collector output into per-set and whole-match views. Everything is
/// recomputed on each call; match ledgers are small.
#[derive(Clone)]
pub struct StatsAggregator {
    collectors: Vec<Arc<dyn StatCollector>>,
}

impl Default for StatsAggregator {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl StatsAggregator {
    pub fn builder() -> StatsAggregatorBuilder {
        StatsAggregatorBuilder::new()
    }

    pub fn aggregate(
        &self,
        completed_sets: &[SetData],
        current_points: &[Point],
        current_set_number: u32,
    ) -> MatchStats {
        let mut sets: Vec<SetStats> = completed_sets
            .iter()
            .map(|set| self.aggregate_set(set))
            .collect();

        if !current_points.is_empty() {
            sets.push(SetStats {
                number: current_set_number,
                score: score_points(current_points),
                winner: None,
                duration: None,
                in_progress: true,
                breakdown: self.breakdown(&[PointScope::new(current_set_number, current_points)]),
            });
        }

        let scopes: Vec<PointScope<'_>> = completed_sets
            .iter()
            .map(|set| PointScope::new(set.number, &set.points))
            .chain(std::iter::once(PointScope::new(
                current_set_number,
                current_points,
            )))
            .collect();

        MatchStats {
            overall: self.breakdown(&scopes),
            sets,
            sets_score: sets_won(completed_sets),
        }
    }

    pub fn aggregate_set(&self, set: &SetData) -> SetStats {
        SetStats {
            number: set.number,
            score: set.score,
            winner: set.winner,
            duration: Some(set.duration),
            in_progress: false,
            breakdown: self.breakdown(&[PointScope::new(set.number, &set.points)]),
        }
    }

    pub fn breakdown(&self, scopes: &[PointScope<'_>]) -> Breakdown {
        let mut breakdown = Breakdown::default();
        for scope in scopes {
            for collector in &self.collectors {
                for data in collector.collect(scope) {
                    fold(&mut breakdown, data);
                }
            }
        }
        breakdown
    }
}

fn fold(breakdown: &mut Breakdown, data: CollectedData) {
    match data {
        CollectedData::TeamPoint {
            team,
            point_type,
            value,
        } => breakdown.totals.get_mut(team).record(point_type, value),
        CollectedData::ActionPoint { action, team } => {
            *breakdown.actions.entry(action).or_default().get_mut(team) += 1;
        }
        CollectedData::PlayerPoint {
            player_id,
            point_type,
        } => {
            let tally = breakdown
                .players
                .entry(player_id.clone())
                .or_insert_with(|| PlayerTally {
                    player_id,
                    scored: 0,
                    fault: 0,
                });
            match point_type {
                crate::scoring::PointType::Scored => tally.scored += 1,
                crate::scoring::PointType::Fault => tally.fault += 1,
            }
        }
        CollectedData::Spot(spot) => breakdown.heatmap.push(spot),
    }
}

pub struct StatsAggregatorBuilder {
    collectors: Vec<Arc<dyn StatCollector>>,
}

impl StatsAggregatorBuilder {
    fn new() -> Self {
        Self {
            collectors: vec![
                Arc::new(TeamTotalsCollector::new()),
                Arc::new(ActionBreakdownCollector::new()),
                Arc::new(PlayerTotalsCollector::new()),
                Arc::new(HeatmapCollector::new()),
            ],
        }
    }

    pub fn with_collector(mut self, collector: Arc<dyn StatCollector>) -> Self {
        self.collectors.push(collector);
        self
    }

    pub fn without_defaults(mut self) -> Self {
        self.collectors.clear();
        self
    }

    pub fn build(self) -> StatsAggregator {
        StatsAggregator {
            collectors: self.collectors,
        }
    }
}
