pub mod assertions;
pub mod match_builders;
pub mod setup;

// Re-export main utilities for use by test files
#[allow(unused_imports)]
pub use assertions::MatchAssertion;
#[allow(unused_imports)]
pub use match_builders::MatchScript;
#[allow(unused_imports)]
pub use setup::{TestSetup, TestSetupBuilder};
