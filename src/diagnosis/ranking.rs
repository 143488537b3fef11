use std::cmp::Ordering;

use uuid::Uuid;

use crate::config::MAX_CANDIDATES;
use crate::models::MatchResult;

/// Drop non-matches, order best first, keep at most `MAX_CANDIDATES`.
///
/// Equal percentages are ordered by condition name (case-insensitive), then by
/// condition id, so the output never depends on input order.
pub fn rank(mut results: Vec<MatchResult>) -> Vec<MatchResult> {
    results.retain(|r| r.percentage() > 0);
    results.sort_by(compare_candidates);
    results.truncate(MAX_CANDIDATES);
    results
}

/// The primary diagnosis is the first ranked candidate, if any.
pub fn primary_diagnosis(ranked: &[MatchResult]) -> Option<Uuid> {
    ranked.first().map(MatchResult::condition_id)
}

fn compare_candidates(a: &MatchResult, b: &MatchResult) -> Ordering {
    b.percentage()
        .cmp(&a.percentage())
        .then_with(|| {
            a.condition_name()
                .to_lowercase()
                .cmp(&b.condition_name().to_lowercase())
        })
        .then_with(|| a.condition_id().cmp(&b.condition_id()))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::models::enums::Severity;

    fn result(name: &str, percentage: u8) -> MatchResult {
        MatchResult::new(
            Uuid::new_v4(),
            name.into(),
            Severity::Mild,
            percentage,
            BTreeSet::new(),
        )
    }

    fn names(ranked: &[MatchResult]) -> Vec<&str> {
        ranked.iter().map(|r| r.condition_name()).collect()
    }

    #[test]
    fn zero_matches_are_excluded() {
        let ranked = rank(vec![result("Acne", 0), result("Eczema", 67)]);
        assert_eq!(names(&ranked), vec!["Eczema"]);
    }

    #[test]
    fn sorted_descending_and_capped() {
        let ranked = rank(vec![
            result("A", 10),
            result("B", 90),
            result("C", 50),
            result("D", 70),
            result("E", 20),
            result("F", 60),
            result("G", 30),
        ]);
        assert_eq!(ranked.len(), MAX_CANDIDATES);
        assert_eq!(names(&ranked), vec!["B", "D", "F", "C", "G"]);
        assert!(ranked.windows(2).all(|w| w[0].percentage() >= w[1].percentage()));
    }

    #[test]
    fn ties_break_by_name_regardless_of_input_order() {
        let forward = rank(vec![result("tinea", 40), result("Psoriasis", 40), result("Acne", 40)]);
        let backward = rank(vec![result("Acne", 40), result("Psoriasis", 40), result("tinea", 40)]);
        assert_eq!(names(&forward), vec!["Acne", "Psoriasis", "tinea"]);
        assert_eq!(names(&forward), names(&backward));
    }

    #[test]
    fn same_name_ties_break_by_id() {
        let a = result("Dermatitis", 50);
        let b = result("Dermatitis", 50);
        let expected_first = a.condition_id().min(b.condition_id());
        let ranked = rank(vec![b, a]);
        assert_eq!(ranked[0].condition_id(), expected_first);
    }

    #[test]
    fn empty_ranking_has_no_primary() {
        let ranked = rank(vec![result("Acne", 0)]);
        assert!(ranked.is_empty());
        assert!(primary_diagnosis(&ranked).is_none());
    }

    #[test]
    fn primary_is_top_candidate() {
        let ranked = rank(vec![result("Low", 20), result("High", 80)]);
        assert_eq!(primary_diagnosis(&ranked), Some(ranked[0].condition_id()));
        assert_eq!(ranked[0].condition_name(), "High");
    }
}
