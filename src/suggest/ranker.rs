//! Deduplication and deterministic ordering of suggestions.

use std::collections::HashSet;

use crate::types::responses::{ConfidenceTier, MatchCandidate};

/// Deduplicates and orders the emitted candidates.
///
/// The first occurrence of a (registry source, person id) pair wins; the
/// sort is stable, so candidates tied on priority keep their scan order.
/// Low-tier entries are dropped before ranking and never surface.
pub fn rank(candidates: Vec<MatchCandidate>) -> Vec<MatchCandidate> {
    let mut seen = HashSet::new();
    let mut list: Vec<MatchCandidate> = candidates
        .into_iter()
        .filter(|c| c.confidence_tier != ConfidenceTier::Low)
        .filter(|c| seen.insert(c.identity()))
        .collect();

    list.sort_by_key(sort_key);
    list
}

/// Priority groups 0-3 order on match type alone; the tail group orders
/// on confidence tier.
fn sort_key(candidate: &MatchCandidate) -> (u8, u8) {
    let group = candidate.match_type.priority_group();
    let tier = if group >= 4 {
        candidate.confidence_tier.rank()
    } else {
        0
    };
    (group, tier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::records::RegistrySource;
    use crate::types::responses::MatchType;

    fn candidate(
        id: i64,
        source: RegistrySource,
        match_type: MatchType,
        tier: ConfidenceTier,
    ) -> MatchCandidate {
        MatchCandidate::new(id, source, format!("Person {}", id), match_type, tier)
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let first = candidate(
            1,
            RegistrySource::Adults,
            MatchType::Spouse,
            ConfidenceTier::High,
        );
        let re_emission = candidate(
            1,
            RegistrySource::Adults,
            MatchType::SelectedSpouse,
            ConfidenceTier::High,
        );

        let ranked = rank(vec![first, re_emission]);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].match_type, MatchType::Spouse);
    }

    #[test]
    fn test_same_id_different_registries_are_distinct() {
        let adult = candidate(
            1,
            RegistrySource::Adults,
            MatchType::Spouse,
            ConfidenceTier::High,
        );
        let child = candidate(
            1,
            RegistrySource::ChildrenA,
            MatchType::FatherMatch,
            ConfidenceTier::High,
        );

        assert_eq!(rank(vec![adult, child]).len(), 2);
    }

    #[test]
    fn test_priority_order() {
        let tail = candidate(
            5,
            RegistrySource::Adults,
            MatchType::LastnameSameLocation,
            ConfidenceTier::Medium,
        );
        let child = candidate(
            4,
            RegistrySource::ChildrenB,
            MatchType::MotherMatch,
            ConfidenceTier::High,
        );
        let maiden = candidate(
            3,
            RegistrySource::Adults,
            MatchType::MiddleNameMotherMatch,
            ConfidenceTier::Medium,
        );
        let input = candidate(
            2,
            RegistrySource::Adults,
            MatchType::SpouseInputMatch,
            ConfidenceTier::High,
        );
        let spouse = candidate(
            1,
            RegistrySource::Adults,
            MatchType::Spouse,
            ConfidenceTier::High,
        );

        let ranked = rank(vec![tail, child, maiden, input, spouse]);
        let ids: Vec<i64> = ranked.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_scan_order_breaks_ties() {
        let a = candidate(
            10,
            RegistrySource::ChildrenA,
            MatchType::FatherMatch,
            ConfidenceTier::High,
        );
        let b = candidate(
            11,
            RegistrySource::ChildrenA,
            MatchType::MotherSpouseMatch,
            ConfidenceTier::High,
        );
        let c = candidate(
            12,
            RegistrySource::ChildrenB,
            MatchType::FatherMatch,
            ConfidenceTier::High,
        );

        let ids: Vec<i64> = rank(vec![a, b, c]).iter().map(|x| x.id).collect();
        assert_eq!(ids, vec![10, 11, 12]);
    }

    #[test]
    fn test_low_tier_never_surfaces() {
        let low = candidate(
            1,
            RegistrySource::Adults,
            MatchType::LastnameSameLocation,
            ConfidenceTier::Low,
        );
        assert!(rank(vec![low]).is_empty());
    }

    #[test]
    fn test_tail_group_orders_by_tier() {
        let medium = candidate(
            1,
            RegistrySource::Adults,
            MatchType::LastnameSameLocation,
            ConfidenceTier::Medium,
        );
        let high = candidate(
            2,
            RegistrySource::Adults,
            MatchType::LastnameSameLocation,
            ConfidenceTier::High,
        );

        let ids: Vec<i64> = rank(vec![medium, high]).iter().map(|x| x.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }
}
