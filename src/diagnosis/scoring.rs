use std::collections::BTreeSet;

use uuid::Uuid;

use crate::models::{Condition, MatchResult};

/// Overlap between a reported set and a condition's symptom set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymptomOverlap {
    pub coincident: BTreeSet<Uuid>,
    /// `round(100 * |intersection| / |union|)`
    pub percentage: u8,
}

impl SymptomOverlap {
    pub fn matched_count(&self) -> usize {
        self.coincident.len()
    }
}

/// Jaccard similarity of the two sets as a rounded percentage.
///
/// Returns `None` when the condition has no symptoms: such a condition is never scored.
pub fn score(reported: &BTreeSet<Uuid>, condition_symptoms: &BTreeSet<Uuid>) -> Option<SymptomOverlap> {
    if condition_symptoms.is_empty() {
        return None;
    }

    let coincident: BTreeSet<Uuid> = reported.intersection(condition_symptoms).copied().collect();
    let union = reported.len() + condition_symptoms.len() - coincident.len();

    Some(SymptomOverlap {
        percentage: rounded_percentage(coincident.len(), union),
        coincident,
    })
}

/// Score one condition. Unmatchable conditions yield `None`.
pub fn score_condition(reported: &BTreeSet<Uuid>, condition: &Condition) -> Option<MatchResult> {
    if !condition.is_matchable() {
        return None;
    }
    let overlap = score(reported, &condition.symptom_ids)?;
    Some(MatchResult::new(
        condition.id,
        condition.name.clone(),
        condition.severity,
        overlap.percentage,
        overlap.coincident,
    ))
}

/// Half-up integer rounding of `100 * part / whole`.
fn rounded_percentage(part: usize, whole: usize) -> u8 {
    if whole == 0 {
        return 0;
    }
    let scaled = (200 * part + whole) / (2 * whole);
    scaled.min(100) as u8
}
