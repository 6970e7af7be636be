//! # Sambahayan
//!
//! Household relationship suggestion engine for a membership registry.
//!
//! Given a designated head of household (and optionally a spouse), the
//! engine scans the person registries, proposes likely household members
//! with relationship labels and confidence tiers, blends in confidence
//! learned from prior user feedback, and returns a deterministically
//! ordered candidate list.
//!
//! ## Modules
//!
//! - [`cli`] - Command-line interface
//! - [`api`] - HTTP API server
//! - [`registry`] - Person registries: records, decryption, reader
//! - [`matching`] - Name normalization and the match rule tables
//! - [`learning`] - Learned suggestion patterns and statistics
//! - [`suggest`] - Ranking and the request-level suggestion engine
//! - [`reranker`] - Optional external AI relationship analyzer
//! - [`types`] - Shared types

pub mod api;
pub mod cli;
pub mod learning;
pub mod matching;
pub mod registry;
pub mod reranker;
pub mod suggest;
pub mod types;

pub use types::config::Config;
pub use types::errors::{SuggestError, SuggestResult};
