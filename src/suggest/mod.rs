//! Suggestion pipeline: ranking and the request-level engine.

pub mod engine;
pub mod ranker;

pub use engine::SuggestionEngine;
