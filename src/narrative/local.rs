use std::sync::LazyLock;

use regex::Regex;

use super::types::{FallbackReason, NarrativeRequest};
use crate::models::enums::{NarrativeSource, Urgency};
use crate::models::Narrative;

/// Terms that escalate a locally built narrative to high urgency.
static ESCALATION_TERMS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:pain\w*|bleed\w*|blood\w*|pus\w*|purulent|suppurat\w*|dolor\w*|sangr\w*)")
        .unwrap()
});

const LOCAL_RECOMMENDATIONS: &[&str] = &[
    "Keep the affected area clean and dry",
    "Avoid scratching or irritating the area",
    "Apply treatments only as directed by a physician",
    "See a dermatologist if the symptoms persist",
];

const LOCAL_DISCLAIMER: &str = "IMPORTANT: This is a basic automated evaluation. Consult a \
    health professional for an accurate diagnosis and appropriate treatment.";

/// Deterministic narrative built without any external service.
pub fn local_narrative(request: &NarrativeRequest, reason: FallbackReason) -> Narrative {
    let zone = request.zone;
    let explanation = if request.symptom_names.is_empty() {
        format!("Symptoms were reported on the {zone} zone but none could be resolved by name.")
    } else {
        format!(
            "The following symptoms were identified on the {zone} zone: {}.",
            request.symptom_names.join(", ")
        )
    };

    Narrative {
        diagnosis_summary: format!("Preliminary symptom review ({zone})"),
        explanation,
        recommendations: LOCAL_RECOMMENDATIONS.iter().map(|s| s.to_string()).collect(),
        urgency: local_urgency(&request.symptom_names),
        disclaimer: format!("{LOCAL_DISCLAIMER} {}", reason.notice()),
        source: NarrativeSource::Local,
    }
}

/// High when any symptom mentions pain, bleeding or pus; medium otherwise.
pub fn local_urgency(symptom_names: &[String]) -> Urgency {
    if symptom_names.iter().any(|name| ESCALATION_TERMS.is_match(name)) {
        Urgency::High
    } else {
        Urgency::Medium
    }
}
