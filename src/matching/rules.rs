//! Matching rules for the adult registry.
//!
//! The rules form an ordered table evaluated first-match-wins per
//! candidate. A candidate no rule fires for is dropped entirely; nothing
//! is ever emitted at low confidence from this table.

use crate::matching::context::MatchContext;
use crate::matching::normalize;
use crate::registry::records::PersonRecord;
use crate::types::responses::{ConfidenceTier, MatchType};

/// Outcome of a rule firing for one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchOutcome {
    pub match_type: MatchType,
    pub tier: ConfidenceTier,
    pub label: Option<String>,
}

impl MatchOutcome {
    pub fn new(match_type: MatchType, tier: ConfidenceTier) -> Self {
        Self {
            match_type,
            tier,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// One rule over an adult candidate.
pub trait AdultRule: Send + Sync {
    /// Rule name, for logging.
    fn name(&self) -> &'static str;

    /// Returns an outcome when the rule fires for this candidate.
    fn evaluate(&self, candidate: &PersonRecord, ctx: &MatchContext) -> Option<MatchOutcome>;
}

/// Rule 1: partner recorded in the union registry.
#[derive(Debug, Clone, Default)]
pub struct UnionSpouseRule;

impl AdultRule for UnionSpouseRule {
    fn name(&self) -> &'static str {
        "union_spouse"
    }

    fn evaluate(&self, candidate: &PersonRecord, ctx: &MatchContext) -> Option<MatchOutcome> {
        if ctx.union_partner_id == Some(candidate.id) {
            Some(
                MatchOutcome::new(MatchType::Spouse, ConfidenceTier::High).with_label("Spouse"),
            )
        } else {
            None
        }
    }
}

/// Rule 2: spouse explicitly selected by the caller.
#[derive(Debug, Clone, Default)]
pub struct SelectedSpouseRule;

impl AdultRule for SelectedSpouseRule {
    fn name(&self) -> &'static str {
        "selected_spouse"
    }

    fn evaluate(&self, candidate: &PersonRecord, ctx: &MatchContext) -> Option<MatchOutcome> {
        if ctx.selected_spouse_id == Some(candidate.id) {
            Some(
                MatchOutcome::new(MatchType::SelectedSpouse, ConfidenceTier::High)
                    .with_label("Spouse"),
            )
        } else {
            None
        }
    }
}

/// Rule 3: candidate's first and last name both equal the parsed free-text
/// spouse input.
#[derive(Debug, Clone, Default)]
pub struct SpouseNameInputRule;

impl AdultRule for SpouseNameInputRule {
    fn name(&self) -> &'static str {
        "spouse_name_input"
    }

    fn evaluate(&self, candidate: &PersonRecord, ctx: &MatchContext) -> Option<MatchOutcome> {
        let input = ctx.spouse_input.as_ref()?;
        let input_last = input.last_name.as_deref()?;

        if normalize::eq_normalized(&candidate.first_name, &input.first_name)
            && normalize::eq_normalized(&candidate.last_name, input_last)
        {
            Some(
                MatchOutcome::new(MatchType::SpouseInputMatch, ConfidenceTier::High)
                    .with_label("Spouse"),
            )
        } else {
            None
        }
    }
}

/// Rule 4: the candidate's middle name carries the spouse's maiden name.
///
/// The surname condition is mandatory: a middle-name hit whose family name
/// differs from the head's indicates a maternal relative outside the
/// household and must be discarded.
#[derive(Debug, Clone, Default)]
pub struct MaidenMiddleNameRule;

impl AdultRule for MaidenMiddleNameRule {
    fn name(&self) -> &'static str {
        "maiden_middle_name"
    }

    fn evaluate(&self, candidate: &PersonRecord, ctx: &MatchContext) -> Option<MatchOutcome> {
        let spouse_family = ctx.spouse_family_name()?;

        if !normalize::equals_or_contains(&candidate.middle_name, &spouse_family) {
            return None;
        }
        if !normalize::eq_normalized(&candidate.last_name, &ctx.head.last_name) {
            return None;
        }

        let tier = if ctx.same_location(candidate) {
            ConfidenceTier::High
        } else {
            ConfidenceTier::Medium
        };

        Some(MatchOutcome::new(MatchType::MiddleNameMotherMatch, tier))
    }
}

/// Rule 5: shared surname plus shared area and sub-area, for dependent-like
/// classifications only. Surname alone never fires.
#[derive(Debug, Clone, Default)]
pub struct SurnameLocationRule;

impl AdultRule for SurnameLocationRule {
    fn name(&self) -> &'static str {
        "surname_location"
    }

    fn evaluate(&self, candidate: &PersonRecord, ctx: &MatchContext) -> Option<MatchOutcome> {
        if !normalize::eq_normalized(&candidate.last_name, &ctx.head.last_name) {
            return None;
        }
        if !candidate.classification.is_dependent_like() {
            return None;
        }
        if !ctx.same_location(candidate) {
            return None;
        }

        Some(MatchOutcome::new(
            MatchType::LastnameSameLocation,
            ConfidenceTier::Medium,
        ))
    }
}

/// The adult rule table, in priority order.
pub fn adult_rules() -> Vec<Box<dyn AdultRule>> {
    vec![
        Box::new(UnionSpouseRule),
        Box::new(SelectedSpouseRule),
        Box::new(SpouseNameInputRule),
        Box::new(MaidenMiddleNameRule),
        Box::new(SurnameLocationRule),
    ]
}
