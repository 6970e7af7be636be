//! Match rule engine: name normalization, rule tables and classification.

pub mod child_rules;
pub mod context;
pub mod engine;
pub mod normalize;
pub mod rules;

pub use context::{MatchContext, SpouseNameInput};
pub use engine::MatchEngine;
pub use rules::MatchOutcome;
