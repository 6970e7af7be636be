//! Per-request matching context.

use crate::matching::normalize;
use crate::registry::records::PersonRecord;

/// Free-text spouse name supplied by the caller, already parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpouseNameInput {
    pub first_name: String,
    pub last_name: Option<String>,
}

impl SpouseNameInput {
    /// Parses the caller's free-text input. Empty input yields None.
    pub fn parse(input: &str) -> Option<Self> {
        normalize::split_full_name(input).map(|(first_name, last_name)| Self {
            first_name,
            last_name,
        })
    }
}

/// Everything the matching rules need about the household being assembled.
#[derive(Debug, Clone)]
pub struct MatchContext {
    /// Head of household ("pangulo").
    pub head: PersonRecord,

    /// Partner recorded in the union registry, when the head is
    /// union-eligible and a union exists.
    pub union_partner_id: Option<i64>,

    /// Spouse explicitly selected by the caller.
    pub selected_spouse_id: Option<i64>,

    /// Parsed free-text spouse name input.
    pub spouse_input: Option<SpouseNameInput>,

    /// Spouse record resolved by rules 1-3, once known.
    pub spouse: Option<PersonRecord>,
}

impl MatchContext {
    pub fn new(head: PersonRecord) -> Self {
        Self {
            head,
            union_partner_id: None,
            selected_spouse_id: None,
            spouse_input: None,
            spouse: None,
        }
    }

    /// Spouse family name known so far: the resolved spouse record wins,
    /// the parsed input is the fallback.
    pub fn spouse_family_name(&self) -> Option<String> {
        if let Some(spouse) = &self.spouse {
            if !spouse.last_name.trim().is_empty() {
                return Some(normalize::normalize(&spouse.last_name));
            }
        }
        self.spouse_input.as_ref().and_then(|i| i.last_name.clone())
    }

    /// Whether the candidate shares both area and sub-area with the head.
    pub fn same_location(&self, candidate: &PersonRecord) -> bool {
        match (&self.head.location, &candidate.location) {
            (Some(a), Some(b)) => a.area == b.area && a.sub_area == b.sub_area,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::records::Classification;

    fn head() -> PersonRecord {
        PersonRecord {
            id: 1,
            first_name: "Pedro".to_string(),
            middle_name: String::new(),
            last_name: "Santos".to_string(),
            registry_number: "R-1".to_string(),
            classification: Classification::AdultSpouseEligible,
            jurisdiction_key: "d1".to_string(),
            location: None,
        }
    }

    #[test]
    fn test_spouse_family_name_prefers_resolved_record() {
        let mut ctx = MatchContext::new(head());
        ctx.spouse_input = SpouseNameInput::parse("Luz Cruz");
        assert_eq!(ctx.spouse_family_name().as_deref(), Some("cruz"));

        let mut spouse = head();
        spouse.id = 2;
        spouse.last_name = "Reyes".to_string();
        ctx.spouse = Some(spouse);
        assert_eq!(ctx.spouse_family_name().as_deref(), Some("reyes"));
    }

    #[test]
    fn test_spouse_input_single_token_has_no_family_name() {
        let input = SpouseNameInput::parse("Luz").unwrap();
        assert_eq!(input.first_name, "luz");
        assert_eq!(input.last_name, None);
        assert!(SpouseNameInput::parse("   ").is_none());
    }
}
