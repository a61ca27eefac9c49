#![allow(dead_code)] // Test utilities may not all be used in every test

use chrono::DateTime;
use std::sync::Arc;

use volley_tracker::{
    scoring::{ManualTimeSource, Sport},
    InMemoryMatchRepository, MatchEngine, MatchRepository, MatchService, TrackerConfig,
};

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub struct TestSetup {
    pub time: Arc<ManualTimeSource>,
    pub repository: Arc<dyn MatchRepository>,
    pub service: MatchService,
    pub config: TrackerConfig,
}

impl TestSetup {
    /// Standalone engine sharing the setup's clock and rules.
    pub fn engine(&self) -> MatchEngine {
        self.config
            .engine_builder()
            .id("match-1")
            .time_source(self.time.clone())
            .build()
    }
}

pub struct TestSetupBuilder {
    config: TrackerConfig,
    repository: Option<Arc<dyn MatchRepository>>,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            config: TrackerConfig::default(),
            repository: None,
        }
    }

    pub fn with_sport(mut self, sport: Sport) -> Self {
        self.config.sport = sport;
        self.config.rules = sport.default_rules();
        self
    }

    pub fn with_teams(mut self, a: &str, b: &str) -> Self {
        self.config.team_a = a.to_string();
        self.config.team_b = b.to_string();
        self
    }

    pub fn with_repository(mut self, repository: Arc<dyn MatchRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    pub fn build(self) -> TestSetup {
        let time = Arc::new(ManualTimeSource::new(
            DateTime::from_timestamp(1_700_000_000, 0).expect("valid start time"),
        ));
        let repository = self
            .repository
            .unwrap_or_else(|| Arc::new(InMemoryMatchRepository::new()));
        let service = MatchService::builder(repository.clone())
            .with_config(self.config.clone())
            .with_time_source(time.clone())
            .build();

        TestSetup {
            time,
            repository,
            service,
            config: self.config,
        }
    }
}

impl Default for TestSetupBuilder {
    fn default() -> Self {
        Self::new()
    }
}
