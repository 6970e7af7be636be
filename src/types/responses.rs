//! Response types for the suggestion API.

use serde::{Deserialize, Serialize};

use crate::registry::records::{Classification, Location, RegistrySource};

/// Which matching rule produced a candidate suggestion.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    /// Partner found in the union registry.
    Spouse,
    /// Spouse explicitly selected by the caller.
    SelectedSpouse,
    /// Candidate matched the free-text spouse name input.
    SpouseInputMatch,
    /// Candidate's middle name carries the spouse's maiden name.
    MiddleNameMotherMatch,
    /// Shared surname plus shared area and sub-area.
    LastnameSameLocation,
    FatherMatch,
    MotherMatch,
    FatherSpouseMatch,
    MotherSpouseMatch,
    MotherAsawaInput,
    FatherAsawaInput,
}

impl MatchType {
    /// Ranking group, lower sorts first. Anything not explicitly grouped
    /// falls into the tier-ordered tail.
    pub fn priority_group(self) -> u8 {
        match self {
            MatchType::Spouse | MatchType::SelectedSpouse => 0,
            MatchType::SpouseInputMatch => 1,
            MatchType::MiddleNameMotherMatch => 2,
            MatchType::FatherMatch
            | MatchType::MotherMatch
            | MatchType::FatherSpouseMatch
            | MatchType::MotherSpouseMatch
            | MatchType::MotherAsawaInput
            | MatchType::FatherAsawaInput => 3,
            MatchType::LastnameSameLocation => 4,
        }
    }
}

impl std::fmt::Display for MatchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self {
            MatchType::Spouse => "spouse",
            MatchType::SelectedSpouse => "selected_spouse",
            MatchType::SpouseInputMatch => "spouse_input_match",
            MatchType::MiddleNameMotherMatch => "middle_name_mother_match",
            MatchType::LastnameSameLocation => "lastname_same_location",
            MatchType::FatherMatch => "father_match",
            MatchType::MotherMatch => "mother_match",
            MatchType::FatherSpouseMatch => "father_spouse_match",
            MatchType::MotherSpouseMatch => "mother_spouse_match",
            MatchType::MotherAsawaInput => "mother_asawa_input",
            MatchType::FatherAsawaInput => "father_asawa_input",
        };
        write!(f, "{}", tag)
    }
}

/// Coarse confidence bucket. Low exists internally but is never surfaced.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

impl ConfidenceTier {
    /// Sort rank, lower sorts first.
    pub fn rank(self) -> u8 {
        match self {
            ConfidenceTier::High => 0,
            ConfidenceTier::Medium => 1,
            ConfidenceTier::Low => 2,
        }
    }
}

impl std::fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfidenceTier::High => write!(f, "high"),
            ConfidenceTier::Medium => write!(f, "medium"),
            ConfidenceTier::Low => write!(f, "low"),
        }
    }
}

/// One suggested household member.
///
/// Ephemeral, produced per request. The trailing key-context fields feed
/// the learned-pattern lookup and are not serialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub id: i64,
    pub source: RegistrySource,
    pub full_name: String,
    pub registry_number: String,
    pub classification: Classification,
    pub source_label: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_relationship_label: Option<String>,

    pub match_type: MatchType,
    pub confidence_tier: ConfidenceTier,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub learned_confidence_percent: Option<u8>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub learned_reason: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub father_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mother_name: Option<String>,

    #[serde(default, skip_serializing)]
    pub head_family_name: String,

    #[serde(default, skip_serializing)]
    pub candidate_family_name: String,

    #[serde(default, skip_serializing)]
    pub candidate_middle_name: String,
}

impl MatchCandidate {
    /// Creates a candidate with the mandatory fields.
    pub fn new(
        id: i64,
        source: RegistrySource,
        full_name: impl Into<String>,
        match_type: MatchType,
        confidence_tier: ConfidenceTier,
    ) -> Self {
        Self {
            id,
            source,
            full_name: full_name.into(),
            registry_number: String::new(),
            classification: Classification::AdultIndependent,
            source_label: source.label().to_string(),
            location: None,
            suggested_relationship_label: None,
            match_type,
            confidence_tier,
            learned_confidence_percent: None,
            learned_reason: None,
            father_name: None,
            mother_name: None,
            head_family_name: String::new(),
            candidate_family_name: String::new(),
            candidate_middle_name: String::new(),
        }
    }

    pub fn with_registry_number(mut self, number: impl Into<String>) -> Self {
        self.registry_number = number.into();
        self
    }

    pub fn with_classification(mut self, classification: Classification) -> Self {
        self.classification = classification;
        self
    }

    pub fn with_location(mut self, location: Option<Location>) -> Self {
        self.location = location;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.suggested_relationship_label = Some(label.into());
        self
    }

    pub fn with_parents(mut self, father: Option<String>, mother: Option<String>) -> Self {
        self.father_name = father;
        self.mother_name = mother;
        self
    }

    /// Attaches the key context used for the learned-pattern lookup.
    pub fn with_lookup_context(
        mut self,
        head_family_name: impl Into<String>,
        candidate_family_name: impl Into<String>,
        candidate_middle_name: impl Into<String>,
    ) -> Self {
        self.head_family_name = head_family_name.into();
        self.candidate_family_name = candidate_family_name.into();
        self.candidate_middle_name = candidate_middle_name.into();
        self
    }

    /// Stable identity of the suggested person across registries.
    pub fn identity(&self) -> (RegistrySource, i64) {
        (self.source, self.id)
    }
}

/// Aggregate learning statistics exposed for transparency.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LearningStats {
    pub total_families: u64,
    pub total_members: u64,
    pub overall_accuracy: f64,
    pub total_shown: u64,
    pub total_accepted: u64,
    pub top_match_types: Vec<MatchTypeStat>,
    pub derived_rule_count: u64,
}

/// Per match-type aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchTypeStat {
    pub match_type: String,
    pub times_shown: u64,
    pub accuracy: f64,
}

/// Full suggestion response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionResponse {
    pub success: bool,
    pub head_family_name: String,
    pub head_full_name: String,
    pub suggestions: Vec<MatchCandidate>,
    pub ai_enabled: bool,
    pub learning_stats: LearningStats,
}

impl SuggestionResponse {
    /// "No suggestions yet" is a valid state, not an error.
    pub fn empty() -> Self {
        Self {
            success: true,
            head_family_name: String::new(),
            head_full_name: String::new(),
            suggestions: Vec::new(),
            ai_enabled: false,
            learning_stats: LearningStats::default(),
        }
    }
}

/// Well-formed JSON error envelope returned at the outermost boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub error: String,
}

impl ErrorEnvelope {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_groups() {
        assert_eq!(MatchType::Spouse.priority_group(), 0);
        assert_eq!(MatchType::SelectedSpouse.priority_group(), 0);
        assert_eq!(MatchType::SpouseInputMatch.priority_group(), 1);
        assert_eq!(MatchType::MiddleNameMotherMatch.priority_group(), 2);
        assert_eq!(MatchType::FatherMatch.priority_group(), 3);
        assert_eq!(MatchType::MotherAsawaInput.priority_group(), 3);
        assert_eq!(MatchType::LastnameSameLocation.priority_group(), 4);
    }

    #[test]
    fn test_tier_rank_high_first() {
        assert!(ConfidenceTier::High.rank() < ConfidenceTier::Medium.rank());
        assert!(ConfidenceTier::Medium.rank() < ConfidenceTier::Low.rank());
    }

    #[test]
    fn test_candidate_serialization_hides_lookup_context() {
        let candidate = MatchCandidate::new(
            7,
            RegistrySource::Adults,
            "Jose Cruz",
            MatchType::Spouse,
            ConfidenceTier::High,
        )
        .with_label("Spouse")
        .with_lookup_context("Cruz", "Cruz", "Reyes");

        let json = serde_json::to_value(&candidate).unwrap();
        assert_eq!(json["match_type"], "spouse");
        assert_eq!(json["confidence_tier"], "high");
        assert_eq!(json["suggested_relationship_label"], "Spouse");
        assert!(json.get("head_family_name").is_none());
        assert!(json.get("learned_confidence_percent").is_none());
    }
}
