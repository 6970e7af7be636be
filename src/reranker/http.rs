//! HTTP client for the external relationship-analysis service.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::{RelationshipAnalyzer, RerankError};
use crate::registry::records::PersonRecord;
use crate::types::config::RerankerConfig;
use crate::types::responses::MatchCandidate;

/// Analyzer backed by an HTTP service. Every call is bounded by the
/// configured timeout; exceeding it is treated identically to failure.
pub struct HttpAnalyzer {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct RerankResponse {
    suggestions: Vec<MatchCandidate>,
}

impl HttpAnalyzer {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            timeout,
        }
    }

    /// Builds the analyzer from configuration; None when disabled or no
    /// endpoint is set.
    pub fn from_config(config: &RerankerConfig) -> Option<Self> {
        if !config.enabled || config.endpoint.is_empty() {
            return None;
        }
        Some(Self::new(
            config.endpoint.clone(),
            Duration::from_secs(config.timeout_secs),
        ))
    }
}

#[async_trait]
impl RelationshipAnalyzer for HttpAnalyzer {
    fn name(&self) -> &str {
        "http"
    }

    async fn rerank(
        &self,
        head: &PersonRecord,
        ranked: &[MatchCandidate],
    ) -> Result<Vec<MatchCandidate>, RerankError> {
        let payload = json!({
            "head": {
                "full_name": head.full_name(),
                "family_name": head.last_name,
                "classification": head.classification,
                "location": head.location,
            },
            "suggestions": ranked,
        });

        let call = async {
            let response = self
                .client
                .post(&self.endpoint)
                .json(&payload)
                .send()
                .await
                .map_err(|e| RerankError::Transport(e.to_string()))?;

            if !response.status().is_success() {
                return Err(RerankError::Transport(format!(
                    "status {}",
                    response.status()
                )));
            }

            response
                .json::<RerankResponse>()
                .await
                .map_err(|e| RerankError::Malformed(e.to_string()))
        };

        let body = tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| RerankError::Timeout(self.timeout.as_secs()))??;

        validate_same_candidates(ranked, &body.suggestions)?;
        Ok(body.suggestions)
    }
}

/// The service may reorder and annotate, never add or drop persons.
fn validate_same_candidates(
    sent: &[MatchCandidate],
    received: &[MatchCandidate],
) -> Result<(), RerankError> {
    let sent_ids: HashSet<_> = sent.iter().map(|c| c.identity()).collect();
    let received_ids: HashSet<_> = received.iter().map(|c| c.identity()).collect();

    if sent_ids != received_ids || sent.len() != received.len() {
        return Err(RerankError::Malformed(
            "candidate set does not match the request".to_string(),
        ));
    }
    Ok(())
}
