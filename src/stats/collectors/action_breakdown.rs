use super::super::{CollectedData, CollectedDataBatch, PointScope, StatCollector};

pub struct ActionBreakdownCollector;

impl Default for ActionBreakdownCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionBreakdownCollector {
    pub fn new() -> Self {
        Self
    }
}

impl StatCollector for ActionBreakdownCollector {
    fn collect(&self, scope: &PointScope<'_>) -> CollectedDataBatch {
        scope
            .points
            .iter()
            .map(|point| CollectedData::ActionPoint {
                action: point.action,
                team: point.beneficiary(),
            })
            .collect()
    }
}
