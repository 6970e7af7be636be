//! Suggestion engine.
//!
//! Orchestrates one request: registry reads, rule classification, learned
//! confidence blending, ranking and the optional external reranker.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::learning::{LearnedPatternStore, PatternKey, RecordOutcome};
use crate::matching::{MatchContext, MatchEngine, SpouseNameInput};
use crate::registry::records::{Classification, PersonRecord};
use crate::registry::RegistryReader;
use crate::reranker::RelationshipAnalyzer;
use crate::suggest::ranker;
use crate::types::config::MatchingConfig;
use crate::types::errors::{SuggestError, SuggestResult};
use crate::types::requests::{FeedbackSubmission, SuggestionRequest};
use crate::types::responses::{ConfidenceTier, LearningStats, MatchCandidate, SuggestionResponse};

/// The suggestion engine shared by the API handlers.
pub struct SuggestionEngine {
    reader: Arc<Mutex<RegistryReader>>,
    store: Arc<Mutex<LearnedPatternStore>>,
    matcher: MatchEngine,
    analyzer: Option<Arc<dyn RelationshipAnalyzer>>,
    matching: MatchingConfig,
}

impl SuggestionEngine {
    pub fn new(
        reader: RegistryReader,
        store: LearnedPatternStore,
        analyzer: Option<Arc<dyn RelationshipAnalyzer>>,
        matching: MatchingConfig,
    ) -> Self {
        Self {
            reader: Arc::new(Mutex::new(reader)),
            store: Arc::new(Mutex::new(store)),
            matcher: MatchEngine::new(),
            analyzer,
            matching,
        }
    }

    /// Generates the ordered suggestion list for one request.
    ///
    /// A missing or unknown head short-circuits to an empty successful
    /// response: "no suggestions yet" is a valid state.
    pub async fn suggest(&self, request: &SuggestionRequest) -> SuggestResult<SuggestionResponse> {
        let Some(head_id) = request.head_id else {
            return Ok(SuggestionResponse::empty());
        };

        let (head, ctx, candidates) = {
            let reader = self.reader.lock().await;

            let Some(head) = reader.load_person(head_id)? else {
                tracing::debug!(head_id, "head not found, returning empty suggestions");
                return Ok(SuggestionResponse::empty());
            };

            let mut ctx = MatchContext::new(head.clone());
            ctx.selected_spouse_id = request.spouse_id;
            ctx.spouse_input = request
                .spouse_name
                .as_deref()
                .and_then(SpouseNameInput::parse);

            // The union registry is only consulted for union-eligible heads.
            if head.classification == Classification::AdultSpouseEligible {
                ctx.union_partner_id = reader.load_union_partner(head_id)?;
            }

            let pool = reader.load_candidates(&request.jurisdiction)?;
            let exclusion = reader.load_exclusion_set()?;

            let candidates = self.matcher.classify(&pool, &mut ctx, &exclusion);
            (head, ctx, candidates)
        };

        let spouse_family = ctx.spouse_family_name();
        let blended = self.blend(candidates, spouse_family.as_deref()).await;
        let ranked = ranker::rank(blended);

        let (suggestions, ai_enabled) = self.maybe_rerank(&head, ranked, request.use_ai).await;

        let learning_stats = self.statistics().await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "learning statistics unavailable");
            LearningStats::default()
        });

        Ok(SuggestionResponse {
            success: true,
            head_family_name: head.last_name.clone(),
            head_full_name: head.full_name(),
            suggestions,
            ai_enabled,
            learning_stats,
        })
    }

    /// Blends learned confidence into the rule outcomes.
    ///
    /// Above the label threshold the learned label replaces the rule's and
    /// the reason is attached; above the tier threshold the tier is forced
    /// to high. Learning can only raise a tier, never lower it.
    async fn blend(
        &self,
        candidates: Vec<MatchCandidate>,
        spouse_family: Option<&str>,
    ) -> Vec<MatchCandidate> {
        let store = self.store.lock().await;

        candidates
            .into_iter()
            .map(|mut candidate| {
                let key = PatternKey::new(
                    &candidate.head_family_name,
                    spouse_family,
                    &candidate.candidate_family_name,
                    &candidate.candidate_middle_name,
                    candidate.classification,
                    candidate.match_type,
                );

                let hint = match store.lookup(&key) {
                    Ok(hint) => hint,
                    Err(e) => {
                        // A learning-store read failure never blocks suggestions.
                        tracing::warn!(error = %e, "learned-pattern lookup failed");
                        None
                    }
                };

                if let Some(hint) = hint {
                    if hint.confidence > self.matching.label_threshold {
                        if let Some(label) = hint.label {
                            candidate.suggested_relationship_label = Some(label);
                        }
                        candidate.learned_confidence_percent =
                            Some((hint.confidence * 100.0).round() as u8);
                        candidate.learned_reason = Some(hint.reason);
                    }
                    if hint.confidence > self.matching.tier_threshold {
                        candidate.confidence_tier = ConfidenceTier::High;
                    }
                }

                candidate
            })
            .collect()
    }

    /// Calls the external analyzer when the caller opted in. Any failure
    /// falls back silently to the internal order.
    async fn maybe_rerank(
        &self,
        head: &PersonRecord,
        ranked: Vec<MatchCandidate>,
        use_ai: bool,
    ) -> (Vec<MatchCandidate>, bool) {
        if !use_ai {
            return (ranked, false);
        }
        let Some(analyzer) = &self.analyzer else {
            return (ranked, false);
        };

        match analyzer.rerank(head, &ranked).await {
            Ok(adjusted) if same_candidate_set(&ranked, &adjusted) => (adjusted, true),
            Ok(_) => {
                tracing::warn!(
                    analyzer = analyzer.name(),
                    "reranker changed the candidate set, keeping internal order"
                );
                (ranked, false)
            }
            Err(e) => {
                tracing::warn!(analyzer = analyzer.name(), error = %e, "reranker unavailable");
                (ranked, false)
            }
        }
    }

    /// Records feedback from the household-save path.
    pub async fn record_feedback(
        &self,
        feedback: &FeedbackSubmission,
    ) -> SuggestResult<RecordOutcome> {
        let mut store = self.store.lock().await;
        store
            .record(feedback)
            .map_err(|e| SuggestError::LearningStore(e.to_string()))
    }

    /// Current learning statistics.
    pub async fn statistics(&self) -> SuggestResult<LearningStats> {
        let store = self.store.lock().await;
        store.statistics()
    }
}

fn same_candidate_set(a: &[MatchCandidate], b: &[MatchCandidate]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let ids: HashSet<_> = a.iter().map(|c| c.identity()).collect();
    b.iter().all(|c| ids.contains(&c.identity()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::records::RegistrySource;
    use crate::registry::PlainCipher;
    use crate::reranker::RerankError;
    use crate::types::responses::MatchType;
    use async_trait::async_trait;

    fn engine_with(analyzer: Option<Arc<dyn RelationshipAnalyzer>>) -> SuggestionEngine {
        let reader = RegistryReader::open_in_memory(Arc::new(PlainCipher)).unwrap();
        reader.create_schema().unwrap();
        let store = LearnedPatternStore::open_in_memory(5).unwrap();
        SuggestionEngine::new(reader, store, analyzer, MatchingConfig::default())
    }

    struct FailingAnalyzer;

    #[async_trait]
    impl RelationshipAnalyzer for FailingAnalyzer {
        fn name(&self) -> &str {
            "failing"
        }

        async fn rerank(
            &self,
            _head: &PersonRecord,
            _ranked: &[MatchCandidate],
        ) -> Result<Vec<MatchCandidate>, RerankError> {
            Err(RerankError::Timeout(1))
        }
    }

    struct SetChangingAnalyzer;

    #[async_trait]
    impl RelationshipAnalyzer for SetChangingAnalyzer {
        fn name(&self) -> &str {
            "set_changing"
        }

        async fn rerank(
            &self,
            _head: &PersonRecord,
            ranked: &[MatchCandidate],
        ) -> Result<Vec<MatchCandidate>, RerankError> {
            let mut list = ranked.to_vec();
            list.push(MatchCandidate::new(
                999,
                RegistrySource::Adults,
                "Intruder",
                MatchType::Spouse,
                ConfidenceTier::High,
            ));
            Ok(list)
        }
    }

    #[tokio::test]
    async fn test_missing_head_is_empty_success() {
        let engine = engine_with(None);
        let response = engine
            .suggest(&SuggestionRequest::new(None))
            .await
            .unwrap();
        assert!(response.success);
        assert!(response.suggestions.is_empty());
        assert!(!response.ai_enabled);
    }

    #[tokio::test]
    async fn test_unknown_head_is_empty_success() {
        let engine = engine_with(None);
        let response = engine
            .suggest(&SuggestionRequest::new(Some(404)))
            .await
            .unwrap();
        assert!(response.success);
        assert!(response.suggestions.is_empty());
    }

    #[tokio::test]
    async fn test_failing_reranker_reports_ai_disabled() {
        let engine = engine_with(Some(Arc::new(FailingAnalyzer)));
        let head = PersonRecord {
            id: 1,
            first_name: "Pedro".to_string(),
            middle_name: String::new(),
            last_name: "Santos".to_string(),
            registry_number: "R-1".to_string(),
            classification: Classification::AdultSpouseEligible,
            jurisdiction_key: "d1".to_string(),
            location: None,
        };
        let ranked = vec![MatchCandidate::new(
            2,
            RegistrySource::Adults,
            "Luz Santos",
            MatchType::Spouse,
            ConfidenceTier::High,
        )];

        let (list, ai_enabled) = engine.maybe_rerank(&head, ranked.clone(), true).await;
        assert!(!ai_enabled);
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id, 2);
    }

    #[tokio::test]
    async fn test_set_changing_reranker_is_rejected() {
        let engine = engine_with(Some(Arc::new(SetChangingAnalyzer)));
        let head = PersonRecord {
            id: 1,
            first_name: "Pedro".to_string(),
            middle_name: String::new(),
            last_name: "Santos".to_string(),
            registry_number: "R-1".to_string(),
            classification: Classification::AdultSpouseEligible,
            jurisdiction_key: "d1".to_string(),
            location: None,
        };
        let ranked = vec![MatchCandidate::new(
            2,
            RegistrySource::Adults,
            "Luz Santos",
            MatchType::Spouse,
            ConfidenceTier::High,
        )];

        let (list, ai_enabled) = engine.maybe_rerank(&head, ranked, true).await;
        assert!(!ai_enabled);
        assert_eq!(list.len(), 1);
    }
}
