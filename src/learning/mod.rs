//! Learned suggestion patterns: persistence, lookup and statistics.

pub mod store;

pub use store::{LearnedHint, LearnedPatternStore, PatternKey, RecordOutcome};
