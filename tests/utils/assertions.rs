//! Test assertion helpers - fluent API for verifying test expectations
#![allow(dead_code)] // Test utilities may not all be used in every test

use volley_tracker::{MatchEngine, Score, Team};

// ============================================================================
// Assertion Helpers
// ============================================================================

pub struct MatchAssertion<'a> {
    engine: &'a MatchEngine,
}

impl<'a> MatchAssertion<'a> {
    pub fn for_engine(engine: &'a MatchEngine) -> Self {
        Self { engine }
    }

    pub fn score(self, a: u32, b: u32) -> Self {
        assert_eq!(self.engine.score(), Score::new(a, b), "current set score");
        self
    }

    pub fn sets(self, a: u32, b: u32) -> Self {
        assert_eq!(self.engine.sets_score(), Score::new(a, b), "sets won");
        self
    }

    pub fn on_set(self, number: u32) -> Self {
        assert_eq!(self.engine.current_set_number(), number, "current set number");
        self
    }

    pub fn pending_winner(self, team: Option<Team>) -> Self {
        assert_eq!(self.engine.evaluation().winner, team, "pending set winner");
        self
    }

    pub fn match_winner(self, team: Option<Team>) -> Self {
        assert_eq!(self.engine.match_winner(), team, "match winner");
        self
    }

    pub fn finished(self, finished: bool) -> Self {
        assert_eq!(self.engine.is_finished(), finished, "finished flag");
        self
    }
}
