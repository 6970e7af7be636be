//! Person and household record types shared across the three registries.

use serde::{Deserialize, Serialize};

/// Household-role tag assigned to a registry entry at import time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// Adult eligible to be recorded in the union registry.
    AdultSpouseEligible,
    /// Adult living independently.
    AdultIndependent,
    /// Minor dependent.
    MinorDependent,
    /// Young adult still counted with the parental household.
    YoungAdult,
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Classification::AdultSpouseEligible => write!(f, "adult_spouse_eligible"),
            Classification::AdultIndependent => write!(f, "adult_independent"),
            Classification::MinorDependent => write!(f, "minor_dependent"),
            Classification::YoungAdult => write!(f, "young_adult"),
        }
    }
}

impl Classification {
    pub fn from_tag(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "adult_spouse_eligible" => Classification::AdultSpouseEligible,
            "minor_dependent" => Classification::MinorDependent,
            "young_adult" => Classification::YoungAdult,
            _ => Classification::AdultIndependent,
        }
    }

    /// Classifications that rule 5 accepts as household dependents.
    pub fn is_dependent_like(self) -> bool {
        matches!(
            self,
            Classification::MinorDependent | Classification::YoungAdult
        )
    }
}

/// Which of the three independent registries a record came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RegistrySource {
    Adults,
    ChildrenA,
    ChildrenB,
}

impl RegistrySource {
    /// Human-readable label used in API responses.
    pub fn label(self) -> &'static str {
        match self {
            RegistrySource::Adults => "Adult Registry",
            RegistrySource::ChildrenA => "Children Registry A",
            RegistrySource::ChildrenB => "Children Registry B",
        }
    }
}

impl std::fmt::Display for RegistrySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistrySource::Adults => write!(f, "adults"),
            RegistrySource::ChildrenA => write!(f, "children_a"),
            RegistrySource::ChildrenB => write!(f, "children_b"),
        }
    }
}

/// Two-level location subdivision.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Location {
    pub area: String,
    pub sub_area: String,
}

/// Entry in the primary adult registry. Name fields are already decrypted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonRecord {
    pub id: i64,
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub registry_number: String,
    pub classification: Classification,
    pub jurisdiction_key: String,
    pub location: Option<Location>,
}

impl PersonRecord {
    pub fn full_name(&self) -> String {
        let mut name = self.first_name.clone();
        if !self.middle_name.is_empty() {
            name.push(' ');
            name.push_str(&self.middle_name);
        }
        if !self.last_name.is_empty() {
            name.push(' ');
            name.push_str(&self.last_name);
        }
        name
    }
}

/// Entry in one of the two dependent registries.
///
/// Parent-name fields are optional; absent values were never recorded at
/// import and must not be treated as empty-string matches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChildRecord {
    pub id: i64,
    pub source: RegistrySource,
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub registry_number: String,
    pub classification: Classification,
    pub jurisdiction_key: String,
    pub father_first_name: Option<String>,
    pub father_last_name: Option<String>,
    pub mother_first_name: Option<String>,
    pub mother_maiden_name: Option<String>,
    pub mother_married_name: Option<String>,
}

impl ChildRecord {
    pub fn full_name(&self) -> String {
        let mut name = self.first_name.clone();
        if !self.middle_name.is_empty() {
            name.push(' ');
            name.push_str(&self.middle_name);
        }
        if !self.last_name.is_empty() {
            name.push(' ');
            name.push_str(&self.last_name);
        }
        name
    }

    /// Father's display name, when any part is present.
    pub fn father_display_name(&self) -> Option<String> {
        join_name_parts(&self.father_first_name, &self.father_last_name)
    }

    /// Mother's display name (first + maiden, falling back to married).
    pub fn mother_display_name(&self) -> Option<String> {
        let last = self
            .mother_maiden_name
            .clone()
            .or_else(|| self.mother_married_name.clone());
        join_name_parts(&self.mother_first_name, &last)
    }
}

fn join_name_parts(first: &Option<String>, last: &Option<String>) -> Option<String> {
    match (first, last) {
        (Some(f), Some(l)) => Some(format!("{} {}", f, l)),
        (Some(f), None) => Some(f.clone()),
        (None, Some(l)) => Some(l.clone()),
        (None, None) => None,
    }
}

/// Association of a person to an already-saved household.
///
/// Only used to build the exclusion set; soft-deleted links are skipped.
#[derive(Debug, Clone)]
pub struct HouseholdLink {
    pub household_id: i64,
    pub source: RegistrySource,
    pub person_id: i64,
}

/// Authorization scope of the caller, applied to every registry read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JurisdictionFilter {
    /// Global role: no restriction.
    Global,
    /// Restricted to a single area code.
    Area(String),
    /// Restricted to a single sub-area code.
    SubArea(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_name_skips_empty_middle() {
        let person = PersonRecord {
            id: 1,
            first_name: "Maria".to_string(),
            middle_name: String::new(),
            last_name: "Santos".to_string(),
            registry_number: "R-001".to_string(),
            classification: Classification::AdultSpouseEligible,
            jurisdiction_key: "d1".to_string(),
            location: None,
        };
        assert_eq!(person.full_name(), "Maria Santos");
    }

    #[test]
    fn test_mother_display_name_prefers_maiden() {
        let child = ChildRecord {
            id: 9,
            source: RegistrySource::ChildrenA,
            first_name: "Ana".to_string(),
            middle_name: String::new(),
            last_name: "Reyes".to_string(),
            registry_number: "C-009".to_string(),
            classification: Classification::MinorDependent,
            jurisdiction_key: "d1".to_string(),
            father_first_name: None,
            father_last_name: None,
            mother_first_name: Some("Luz".to_string()),
            mother_maiden_name: Some("Cruz".to_string()),
            mother_married_name: Some("Reyes".to_string()),
        };
        assert_eq!(child.mother_display_name().as_deref(), Some("Luz Cruz"));
    }

    #[test]
    fn test_dependent_like_classifications() {
        assert!(Classification::MinorDependent.is_dependent_like());
        assert!(Classification::YoungAdult.is_dependent_like());
        assert!(!Classification::AdultIndependent.is_dependent_like());
        assert!(!Classification::AdultSpouseEligible.is_dependent_like());
    }
}
