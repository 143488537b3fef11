//! Symptom-overlap matching: per-condition scoring, then ranking.

pub mod ranking;
pub mod scoring;

pub use ranking::*;
pub use scoring::*;

use std::collections::BTreeSet;

use uuid::Uuid;

use crate::models::{Condition, MatchResult};

/// Score every condition against the reported set and return the ranked candidates.
pub fn match_conditions(reported: &BTreeSet<Uuid>, conditions: &[Condition]) -> Vec<MatchResult> {
    let _span = tracing::debug_span!(
        "match_conditions",
        reported = reported.len(),
        conditions = conditions.len()
    )
    .entered();

    let scored: Vec<MatchResult> = conditions
        .iter()
        .filter_map(|condition| score_condition(reported, condition))
        .collect();
    let ranked = rank(scored);

    tracing::debug!(
        candidates = ranked.len(),
        top = ranked.first().map(|r| r.percentage()).unwrap_or(0),
        "Conditions ranked"
    );
    ranked
}
