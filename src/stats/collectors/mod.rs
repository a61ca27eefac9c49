mod action_breakdown;
mod heatmap;
mod player_totals;
mod team_totals;

pub use action_breakdown::ActionBreakdownCollector;
pub use heatmap::HeatmapCollector;
pub use player_totals::PlayerTotalsCollector;
pub use team_totals::TeamTotalsCollector;
