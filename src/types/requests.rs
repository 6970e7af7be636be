//! Request types for the suggestion API.

use serde::{Deserialize, Serialize};

use crate::registry::records::{Classification, JurisdictionFilter, RegistrySource};
use crate::types::responses::MatchType;

/// A single suggestion request.
#[derive(Debug, Clone)]
pub struct SuggestionRequest {
    /// Designated head of household. Absent means "no suggestions yet".
    pub head_id: Option<i64>,

    /// Whether the caller opted into the external reranker.
    pub use_ai: bool,

    /// Explicitly selected spouse.
    pub spouse_id: Option<i64>,

    /// Free-text spouse name, used when no spouse id was selected.
    pub spouse_name: Option<String>,

    /// Authorization scope resolved from the caller identity.
    pub jurisdiction: JurisdictionFilter,
}

impl SuggestionRequest {
    pub fn new(head_id: Option<i64>) -> Self {
        Self {
            head_id,
            use_ai: false,
            spouse_id: None,
            spouse_name: None,
            jurisdiction: JurisdictionFilter::Global,
        }
    }

    #[must_use]
    pub fn with_use_ai(mut self, use_ai: bool) -> Self {
        self.use_ai = use_ai;
        self
    }

    #[must_use]
    pub fn with_spouse_id(mut self, spouse_id: i64) -> Self {
        self.spouse_id = Some(spouse_id);
        self
    }

    #[must_use]
    pub fn with_spouse_name(mut self, spouse_name: impl Into<String>) -> Self {
        self.spouse_name = Some(spouse_name.into());
        self
    }

    #[must_use]
    pub fn with_jurisdiction(mut self, jurisdiction: JurisdictionFilter) -> Self {
        self.jurisdiction = jurisdiction;
        self
    }
}

/// Name context of a head or spouse, as submitted with feedback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonNameInfo {
    pub first_name: String,
    pub last_name: String,
}

/// Reference to one suggested person.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct SuggestionRef {
    pub source: RegistrySource,
    pub person_id: i64,
}

/// One suggestion as it was shown to the user, with the key context the
/// learned-pattern store aggregates on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShownSuggestion {
    pub source: RegistrySource,
    pub person_id: i64,
    pub candidate_family_name: String,
    pub candidate_middle_name: String,
    pub classification: Classification,
    pub match_type: MatchType,
    #[serde(default)]
    pub suggested_label: Option<String>,
}

/// A suggestion the user accepted but relabeled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModifiedSuggestion {
    pub source: RegistrySource,
    pub person_id: i64,
    pub final_label: String,
}

/// A member of the household as finally saved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalMember {
    pub source: RegistrySource,
    pub person_id: i64,
    pub relationship_label: String,
}

/// Feedback submitted by the household-save path after a save.
///
/// Delivered at-least-once; recording it must never affect the save.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackSubmission {
    #[serde(default = "new_submission_id")]
    pub submission_id: String,

    pub head: PersonNameInfo,

    #[serde(default)]
    pub spouse: Option<PersonNameInfo>,

    #[serde(default)]
    pub final_members: Vec<FinalMember>,

    #[serde(default)]
    pub shown: Vec<ShownSuggestion>,

    #[serde(default)]
    pub accepted: Vec<SuggestionRef>,

    #[serde(default)]
    pub modified: Vec<ModifiedSuggestion>,
}

fn new_submission_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl FeedbackSubmission {
    pub fn new(head: PersonNameInfo) -> Self {
        Self {
            submission_id: new_submission_id(),
            head,
            spouse: None,
            final_members: Vec::new(),
            shown: Vec::new(),
            accepted: Vec::new(),
            modified: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = SuggestionRequest::new(Some(42))
            .with_use_ai(true)
            .with_spouse_name("Luz Cruz");

        assert_eq!(request.head_id, Some(42));
        assert!(request.use_ai);
        assert_eq!(request.spouse_name.as_deref(), Some("Luz Cruz"));
        assert_eq!(request.jurisdiction, JurisdictionFilter::Global);
    }

    #[test]
    fn test_feedback_deserializes_without_submission_id() {
        let json = r#"{
            "head": {"first_name": "Pedro", "last_name": "Santos"},
            "shown": [],
            "accepted": []
        }"#;

        let feedback: FeedbackSubmission = serde_json::from_str(json).unwrap();
        assert!(!feedback.submission_id.is_empty());
        assert!(feedback.spouse.is_none());
    }
}
