//! Match engine.
//!
//! Walks the candidate pools, applies the exclusion set and the rule
//! tables, and emits one [`MatchCandidate`] per rule hit in scan order.

use std::collections::HashSet;

use crate::matching::child_rules::{child_rules, ChildRule};
use crate::matching::context::MatchContext;
use crate::matching::normalize;
use crate::matching::rules::{adult_rules, AdultRule};
use crate::registry::reader::CandidatePool;
use crate::registry::records::{ChildRecord, PersonRecord, RegistrySource};
use crate::types::responses::{ConfidenceTier, MatchCandidate};

/// Applies the ordered rule tables to a candidate pool.
pub struct MatchEngine {
    adult_rules: Vec<Box<dyn AdultRule>>,
    child_rules: Vec<Box<dyn ChildRule>>,
}

impl MatchEngine {
    pub fn new() -> Self {
        Self {
            adult_rules: adult_rules(),
            child_rules: child_rules(),
        }
    }

    /// Classifies every candidate in the pool against the context.
    ///
    /// The spouse is resolved before the scan so that rules depending on
    /// the spouse's name see it regardless of pool order.
    pub fn classify(
        &self,
        pool: &CandidatePool,
        ctx: &mut MatchContext,
        exclusion: &HashSet<(RegistrySource, i64)>,
    ) -> Vec<MatchCandidate> {
        self.resolve_spouse(pool, ctx);

        let mut emitted = Vec::new();

        for candidate in &pool.adults {
            if candidate.id == ctx.head.id {
                continue;
            }
            if exclusion.contains(&(RegistrySource::Adults, candidate.id)) {
                continue;
            }

            if let Some(outcome) = self
                .adult_rules
                .iter()
                .find_map(|rule| rule.evaluate(candidate, ctx))
            {
                emitted.push(adult_candidate(candidate, ctx, outcome));
            }
        }

        for record in pool.children_a.iter().chain(pool.children_b.iter()) {
            if exclusion.contains(&(record.source, record.id)) {
                continue;
            }

            if let Some(outcome) = self
                .child_rules
                .iter()
                .find_map(|rule| rule.evaluate(record, ctx))
            {
                // Dependent matches below high confidence are discarded.
                if outcome.tier != ConfidenceTier::High {
                    continue;
                }
                emitted.push(child_candidate(record, ctx, outcome));
            }
        }

        tracing::debug!(
            head_id = ctx.head.id,
            emitted = emitted.len(),
            "candidate classification complete"
        );

        emitted
    }

    /// Resolves the spouse record from the adult pool: union partner first,
    /// then the explicitly selected spouse, then the free-text input match.
    fn resolve_spouse(&self, pool: &CandidatePool, ctx: &mut MatchContext) {
        if ctx.spouse.is_some() {
            return;
        }

        if let Some(partner_id) = ctx.union_partner_id {
            ctx.spouse = pool.adults.iter().find(|p| p.id == partner_id).cloned();
            if ctx.spouse.is_some() {
                return;
            }
        }

        if let Some(selected_id) = ctx.selected_spouse_id {
            ctx.spouse = pool.adults.iter().find(|p| p.id == selected_id).cloned();
            if ctx.spouse.is_some() {
                return;
            }
        }

        if let Some(input) = ctx.spouse_input.clone() {
            if let Some(input_last) = input.last_name.as_deref() {
                ctx.spouse = pool
                    .adults
                    .iter()
                    .find(|p| {
                        p.id != ctx.head.id
                            && normalize::eq_normalized(&p.first_name, &input.first_name)
                            && normalize::eq_normalized(&p.last_name, input_last)
                    })
                    .cloned();
            }
        }
    }
}

impl Default for MatchEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn adult_candidate(
    person: &PersonRecord,
    ctx: &MatchContext,
    outcome: crate::matching::rules::MatchOutcome,
) -> MatchCandidate {
    let mut candidate = MatchCandidate::new(
        person.id,
        RegistrySource::Adults,
        person.full_name(),
        outcome.match_type,
        outcome.tier,
    )
    .with_registry_number(person.registry_number.clone())
    .with_classification(person.classification)
    .with_location(person.location.clone())
    .with_lookup_context(
        ctx.head.last_name.clone(),
        person.last_name.clone(),
        person.middle_name.clone(),
    );

    if let Some(label) = outcome.label {
        candidate = candidate.with_label(label);
    }
    candidate
}

fn child_candidate(
    record: &ChildRecord,
    ctx: &MatchContext,
    outcome: crate::matching::rules::MatchOutcome,
) -> MatchCandidate {
    let mut candidate = MatchCandidate::new(
        record.id,
        record.source,
        record.full_name(),
        outcome.match_type,
        outcome.tier,
    )
    .with_registry_number(record.registry_number.clone())
    .with_classification(record.classification)
    .with_parents(record.father_display_name(), record.mother_display_name())
    .with_lookup_context(
        ctx.head.last_name.clone(),
        record.last_name.clone(),
        record.middle_name.clone(),
    );

    if let Some(label) = outcome.label {
        candidate = candidate.with_label(label);
    }
    candidate
}
