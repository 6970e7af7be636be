//! External AI relationship analyzer.
//!
//! A best-effort collaborator: it may reorder and annotate the ranked list,
//! and any failure makes the engine fall back to the internally ranked
//! order. It is never a blocking dependency.

pub mod http;

use async_trait::async_trait;
use thiserror::Error;

use crate::registry::records::PersonRecord;
use crate::types::responses::MatchCandidate;

pub use http::HttpAnalyzer;

/// Non-fatal reranker failures.
#[derive(Error, Debug)]
pub enum RerankError {
    #[error("reranker timed out after {0}s")]
    Timeout(u64),

    #[error("reranker transport error: {0}")]
    Transport(String),

    #[error("reranker returned a malformed response: {0}")]
    Malformed(String),
}

/// Reorders and annotates a ranked suggestion list.
#[async_trait]
pub trait RelationshipAnalyzer: Send + Sync {
    /// Analyzer name, for logging.
    fn name(&self) -> &str;

    /// Returns the adjusted list, which must cover exactly the same
    /// (registry source, person id) set as the input.
    async fn rerank(
        &self,
        head: &PersonRecord,
        ranked: &[MatchCandidate],
    ) -> Result<Vec<MatchCandidate>, RerankError>;
}
