use super::super::{CollectedData, CollectedDataBatch, PointScope, StatCollector};

pub struct TeamTotalsCollector;

impl Default for TeamTotalsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl TeamTotalsCollector {
    pub fn new() -> Self {
        Self
    }
}

impl StatCollector for TeamTotalsCollector {
    fn collect(&self, scope: &PointScope<'_>) -> CollectedDataBatch {
        scope
            .points
            .iter()
            .map(|point| CollectedData::TeamPoint {
                team: point.beneficiary(),
                point_type: point.point_type,
                value: point.value(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::{ActionType, PointType, Team};
    use crate::stats::collectors::test_points::point;

    #[test]
    fn emits_one_entry_per_point() {
        let collector = TeamTotalsCollector::new();
        let points = vec![
            point("1", Team::A, PointType::Scored, ActionType::Attack),
            point("2", Team::B, PointType::Fault, ActionType::Service),
        ];

        let data = collector.collect(&PointScope::new(1, &points));
        assert_eq!(data.len(), 2);

        match &data[1] {
            CollectedData::TeamPoint {
                team,
                point_type,
                value,
            } => {
                assert_eq!(*team, Team::B);
                assert_eq!(*point_type, PointType::Fault);
                assert_eq!(*value, 1);
            }
            _ => panic!("Expected TeamPoint variant"),
        }
    }
}
