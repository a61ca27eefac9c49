use std::path::PathBuf;
use tracing::warn;

use crate::scoring::{MatchEngineBuilder, ScoringRules, SideSwapPolicy, Sport};

const DEFAULT_DATA_FILE: &str = "volley-matches.json";

/// Runtime configuration for new matches and local storage
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerConfig {
    pub sport: Sport,
    pub rules: ScoringRules,
    pub side_swap: SideSwapPolicy,
    pub data_file: PathBuf,
    pub team_a: String,
    pub team_b: String,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        let sport = Sport::default();
        Self {
            sport,
            rules: sport.default_rules(),
            side_swap: SideSwapPolicy::default(),
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            team_a: "Team A".to_string(),
            team_b: "Team B".to_string(),
        }
    }
}

impl TrackerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Unparsable values fall back to
    /// the defaults for the selected sport.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let sport = lookup("VOLLEY_SPORT")
            .and_then(|s| parse_or_warn("VOLLEY_SPORT", Sport::try_from(s.as_str())))
            .unwrap_or_default();
        let defaults = sport.default_rules();

        let number = |key: &str, fallback: u32| {
            lookup(key)
                .and_then(|s| parse_or_warn(key, s.trim().parse::<u32>().map_err(|e| e.to_string())))
                .filter(|n| *n > 0)
                .unwrap_or(fallback)
        };

        let rules = ScoringRules {
            target_points: number("VOLLEY_TARGET_POINTS", defaults.target_points),
            deciding_set_points: number("VOLLEY_DECIDING_SET_POINTS", defaults.deciding_set_points),
            sets_to_win: number("VOLLEY_SETS_TO_WIN", defaults.sets_to_win),
            win_by: number("VOLLEY_WIN_BY", defaults.win_by),
        };

        let side_swap = lookup("VOLLEY_SIDE_SWAP")
            .and_then(|s| parse_or_warn("VOLLEY_SIDE_SWAP", SideSwapPolicy::try_from(s.as_str())))
            .unwrap_or_default();

        let fallback = Self::default();
        let name = |key: &str, fallback: String| {
            lookup(key)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or(fallback)
        };

        Self {
            sport,
            rules,
            side_swap,
            data_file: lookup("VOLLEY_DATA_FILE")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(fallback.data_file),
            team_a: name("VOLLEY_TEAM_A", fallback.team_a),
            team_b: name("VOLLEY_TEAM_B", fallback.team_b),
        }
    }

    /// Engine builder preloaded with this configuration.
    pub fn engine_builder(&self) -> MatchEngineBuilder {
        crate::scoring::MatchEngine::builder()
            .sport(self.sport)
            .rules(self.rules)
            .side_swap(self.side_swap)
            .team_names(self.team_a.clone(), self.team_b.clone())
    }
}

fn parse_or_warn<T, E: std::fmt::Display>(key: &str, parsed: Result<T, E>) -> Option<T> {
    match parsed {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key = %key, value = %e, "Ignoring unparsable configuration value");
            None
        }
    }
}
