//! Matching rules for the two dependent registries.
//!
//! Evaluated independently per record, first-fire-wins. The label is always
//! "Child" and only high-confidence outcomes are kept; surname-only
//! matching for dependents is excluded outright as false-positive-prone.

use crate::matching::context::MatchContext;
use crate::matching::normalize;
use crate::matching::rules::MatchOutcome;
use crate::registry::records::ChildRecord;
use crate::types::responses::{ConfidenceTier, MatchType};

/// One rule over a dependent-registry record.
pub trait ChildRule: Send + Sync {
    fn name(&self) -> &'static str;

    fn evaluate(&self, record: &ChildRecord, ctx: &MatchContext) -> Option<MatchOutcome>;
}

fn child_outcome(match_type: MatchType, tier: ConfidenceTier) -> MatchOutcome {
    MatchOutcome::new(match_type, tier).with_label("Child")
}

/// Rule a: father's name equals the head's name.
#[derive(Debug, Clone, Default)]
pub struct FatherHeadRule;

impl ChildRule for FatherHeadRule {
    fn name(&self) -> &'static str {
        "father_head"
    }

    fn evaluate(&self, record: &ChildRecord, ctx: &MatchContext) -> Option<MatchOutcome> {
        let father_first = record.father_first_name.as_deref()?;
        let father_last = record.father_last_name.as_deref()?;

        if normalize::eq_normalized(father_first, &ctx.head.first_name)
            && normalize::eq_normalized(father_last, &ctx.head.last_name)
        {
            Some(child_outcome(MatchType::FatherMatch, ConfidenceTier::High))
        } else {
            None
        }
    }
}

/// Rule b: mother's first plus maiden name equals the head's name.
#[derive(Debug, Clone, Default)]
pub struct MotherHeadRule;

impl ChildRule for MotherHeadRule {
    fn name(&self) -> &'static str {
        "mother_head"
    }

    fn evaluate(&self, record: &ChildRecord, ctx: &MatchContext) -> Option<MatchOutcome> {
        let mother_first = record.mother_first_name.as_deref()?;
        let mother_maiden = record.mother_maiden_name.as_deref()?;

        if normalize::eq_normalized(mother_first, &ctx.head.first_name)
            && normalize::eq_normalized(mother_maiden, &ctx.head.last_name)
        {
            Some(child_outcome(MatchType::MotherMatch, ConfidenceTier::High))
        } else {
            None
        }
    }
}

/// Rule c: father's name equals the resolved spouse's name.
#[derive(Debug, Clone, Default)]
pub struct FatherSpouseRule;

impl ChildRule for FatherSpouseRule {
    fn name(&self) -> &'static str {
        "father_spouse"
    }

    fn evaluate(&self, record: &ChildRecord, ctx: &MatchContext) -> Option<MatchOutcome> {
        let spouse = ctx.spouse.as_ref()?;
        let father_first = record.father_first_name.as_deref()?;
        let father_last = record.father_last_name.as_deref()?;

        if normalize::eq_normalized(father_first, &spouse.first_name)
            && normalize::eq_normalized(father_last, &spouse.last_name)
        {
            Some(child_outcome(
                MatchType::FatherSpouseMatch,
                ConfidenceTier::High,
            ))
        } else {
            None
        }
    }
}

/// Rule d: mother's first name equals the resolved spouse's first name.
#[derive(Debug, Clone, Default)]
pub struct MotherSpouseRule;

impl ChildRule for MotherSpouseRule {
    fn name(&self) -> &'static str {
        "mother_spouse"
    }

    fn evaluate(&self, record: &ChildRecord, ctx: &MatchContext) -> Option<MatchOutcome> {
        let spouse = ctx.spouse.as_ref()?;
        let mother_first = record.mother_first_name.as_deref()?;

        if normalize::eq_normalized(mother_first, &spouse.first_name) {
            Some(child_outcome(
                MatchType::MotherSpouseMatch,
                ConfidenceTier::High,
            ))
        } else {
            None
        }
    }
}

/// Rule e: mother matched against the caller-input spouse name. High when
/// the input carried a family name that matched maiden-or-married, medium
/// when only a first name was given.
#[derive(Debug, Clone, Default)]
pub struct MotherInputRule;

impl ChildRule for MotherInputRule {
    fn name(&self) -> &'static str {
        "mother_asawa_input"
    }

    fn evaluate(&self, record: &ChildRecord, ctx: &MatchContext) -> Option<MatchOutcome> {
        let input = ctx.spouse_input.as_ref()?;
        let mother_first = record.mother_first_name.as_deref()?;

        if !normalize::eq_normalized(mother_first, &input.first_name) {
            return None;
        }

        match input.last_name.as_deref() {
            Some(input_last) => {
                let maiden_hit = record
                    .mother_maiden_name
                    .as_deref()
                    .is_some_and(|m| normalize::eq_normalized(m, input_last));
                let married_hit = record
                    .mother_married_name
                    .as_deref()
                    .is_some_and(|m| normalize::eq_normalized(m, input_last));

                if maiden_hit || married_hit {
                    Some(child_outcome(
                        MatchType::MotherAsawaInput,
                        ConfidenceTier::High,
                    ))
                } else {
                    None
                }
            }
            None => Some(child_outcome(
                MatchType::MotherAsawaInput,
                ConfidenceTier::Medium,
            )),
        }
    }
}

/// Rule f: father matched against the caller-input spouse name, symmetric
/// to rule e.
#[derive(Debug, Clone, Default)]
pub struct FatherInputRule;

impl ChildRule for FatherInputRule {
    fn name(&self) -> &'static str {
        "father_asawa_input"
    }

    fn evaluate(&self, record: &ChildRecord, ctx: &MatchContext) -> Option<MatchOutcome> {
        let input = ctx.spouse_input.as_ref()?;
        let father_first = record.father_first_name.as_deref()?;

        if !normalize::eq_normalized(father_first, &input.first_name) {
            return None;
        }

        match input.last_name.as_deref() {
            Some(input_last) => {
                let last_hit = record
                    .father_last_name
                    .as_deref()
                    .is_some_and(|l| normalize::eq_normalized(l, input_last));

                if last_hit {
                    Some(child_outcome(
                        MatchType::FatherAsawaInput,
                        ConfidenceTier::High,
                    ))
                } else {
                    None
                }
            }
            None => Some(child_outcome(
                MatchType::FatherAsawaInput,
                ConfidenceTier::Medium,
            )),
        }
    }
}

/// The dependent-registry rule table, in priority order.
pub fn child_rules() -> Vec<Box<dyn ChildRule>> {
    vec![
        Box::new(FatherHeadRule),
        Box::new(MotherHeadRule),
        Box::new(FatherSpouseRule),
        Box::new(MotherSpouseRule),
        Box::new(MotherInputRule),
        Box::new(FatherInputRule),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::context::SpouseNameInput;
    use crate::registry::records::{Classification, PersonRecord, RegistrySource};

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

    fn child(id: i64) -> ChildRecord {
        ChildRecord {
            id,
            source: RegistrySource::ChildrenA,
            first_name: "Ana".to_string(),
            middle_name: String::new(),
            last_name: "Santos".to_string(),
            registry_number: format!("C-{}", id),
            classification: Classification::MinorDependent,
            jurisdiction_key: "d1".to_string(),
            father_first_name: None,
            father_last_name: None,
            mother_first_name: None,
            mother_maiden_name: None,
            mother_married_name: None,
        }
    }

    #[test]
    fn test_father_head_match() {
        let ctx = MatchContext::new(head());
        let mut record = child(1);
        record.father_first_name = Some("Pedro".to_string());
        record.father_last_name = Some("Santos".to_string());

        let outcome = FatherHeadRule.evaluate(&record, &ctx).unwrap();
        assert_eq!(outcome.match_type, MatchType::FatherMatch);
        assert_eq!(outcome.tier, ConfidenceTier::High);
        assert_eq!(outcome.label.as_deref(), Some("Child"));
    }

    #[test]
    fn test_father_head_needs_both_fields() {
        let ctx = MatchContext::new(head());
        let mut record = child(1);
        record.father_first_name = Some("Pedro".to_string());
        // Father's family name was never recorded: no match.
        assert!(FatherHeadRule.evaluate(&record, &ctx).is_none());
    }

    #[test]
    fn test_mother_head_uses_maiden_name() {
        let mut head = head();
        head.first_name = "Luz".to_string();
        head.last_name = "Cruz".to_string();
        let ctx = MatchContext::new(head);

        let mut record = child(2);
        record.mother_first_name = Some("Luz".to_string());
        record.mother_maiden_name = Some("Cruz".to_string());
        record.mother_married_name = Some("Santos".to_string());

        let outcome = MotherHeadRule.evaluate(&record, &ctx).unwrap();
        assert_eq!(outcome.match_type, MatchType::MotherMatch);
    }

    #[test]
    fn test_mother_spouse_first_name_only() {
        let mut ctx = MatchContext::new(head());
        let mut spouse = head();
        spouse.id = 2;
        spouse.first_name = "Luz".to_string();
        spouse.last_name = "Cruz".to_string();
        ctx.spouse = Some(spouse);

        let mut record = child(3);
        record.mother_first_name = Some("Luz".to_string());

        let outcome = MotherSpouseRule.evaluate(&record, &ctx).unwrap();
        assert_eq!(outcome.match_type, MatchType::MotherSpouseMatch);
        assert_eq!(outcome.tier, ConfidenceTier::High);
    }

    #[test]
    fn test_mother_input_tier_depends_on_input_last_name() {
        let mut ctx = MatchContext::new(head());
        ctx.spouse_input = SpouseNameInput::parse("Luz");

        let mut record = child(4);
        record.mother_first_name = Some("Luz".to_string());
        record.mother_maiden_name = Some("Cruz".to_string());

        // First name only: medium.
        let outcome = MotherInputRule.evaluate(&record, &ctx).unwrap();
        assert_eq!(outcome.tier, ConfidenceTier::Medium);

        // Full input matching the maiden name: high.
        ctx.spouse_input = SpouseNameInput::parse("Luz Cruz");
        let outcome = MotherInputRule.evaluate(&record, &ctx).unwrap();
        assert_eq!(outcome.tier, ConfidenceTier::High);

        // Full input matching the married name also counts.
        ctx.spouse_input = SpouseNameInput::parse("Luz Reyes");
        record.mother_married_name = Some("Reyes".to_string());
        let outcome = MotherInputRule.evaluate(&record, &ctx).unwrap();
        assert_eq!(outcome.tier, ConfidenceTier::High);

        // Full input matching neither: no match at all.
        ctx.spouse_input = SpouseNameInput::parse("Luz Garcia");
        assert!(MotherInputRule.evaluate(&record, &ctx).is_none());
    }

    #[test]
    fn test_no_rule_fires_on_surname_only() {
        // The record shares the head's surname but carries no parent names:
        // dependents are never matched on surname alone.
        let ctx = MatchContext::new(head());
        let record = child(5);

        for rule in child_rules() {
            assert!(rule.evaluate(&record, &ctx).is_none(), "{}", rule.name());
        }
    }

    #[test]
    fn test_rule_table_order() {
        let names: Vec<_> = child_rules().iter().map(|r| r.name()).collect();
        assert_eq!(
            names,
            vec![
                "father_head",
                "mother_head",
                "father_spouse",
                "mother_spouse",
                "mother_asawa_input",
                "father_asawa_input"
            ]
        );
    }
}
