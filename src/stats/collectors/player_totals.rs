use super::super::{CollectedData, CollectedDataBatch, PointScope, StatCollector};

/// Tallies points tagged with a player. Untagged points are skipped.
pub struct PlayerTotalsCollector;

impl Default for PlayerTotalsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl PlayerTotalsCollector {
    pub fn new() -> Self {
        Self
    }
}

impl StatCollector for PlayerTotalsCollector {
    fn collect(&self, scope: &PointScope<'_>) -> CollectedDataBatch {
        scope
            .points
            .iter()
            .filter_map(|point| {
                point
                    .player_id
                    .as_ref()
                    .map(|player_id| CollectedData::PlayerPoint {
                        player_id: player_id.clone(),
                        point_type: point.point_type,
                    })
            })
            .collect()
    }
}
