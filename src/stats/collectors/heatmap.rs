use super::super::{CollectedData, CollectedDataBatch, HeatmapPoint, PointScope, StatCollector};
use crate::scoring::PointType;

/// Court locations of scored points. Faults carry no meaningful location and
/// are left out.
pub struct HeatmapCollector;

impl Default for HeatmapCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl HeatmapCollector {
    pub fn new() -> Self {
        Self
    }
}

impl StatCollector for HeatmapCollector {
    fn collect(&self, scope: &PointScope<'_>) -> CollectedDataBatch {
        scope
            .points
            .iter()
            .filter(|point| point.point_type == PointType::Scored)
            .filter_map(|point| {
                point.position.map(|position| {
                    CollectedData::Spot(HeatmapPoint {
                        x: position.x,
                        y: position.y,
                        team: point.beneficiary(),
                        set_number: scope.set_number,
                    })
                })
            })
            .collect()
    }
}
