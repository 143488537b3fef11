//! Delimited analysis block appended to consultation notes.
//!
//! ```text
//! --- AI Analysis ---
//! Diagnosis: ...
//! Explanation: ...
//! Recommendations:
//! 1. ...
//! Urgency: medium
//! Disclaimer: ...
//! --- End Analysis ---
//! ```
//!
//! Locally generated narratives use `--- Clinical Analysis ---` as the
//! opening marker. Every value is kept on one line, and runs of three or
//! more hyphens inside values are shortened to `--` so no value can contain
//! a marker.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::models::enums::{NarrativeSource, Urgency};
use crate::models::Narrative;

pub const REMOTE_MARKER: &str = "--- AI Analysis ---";
pub const LOCAL_MARKER: &str = "--- Clinical Analysis ---";
pub const END_MARKER: &str = "--- End Analysis ---";

const DIAGNOSIS_LABEL: &str = "Diagnosis: ";
const EXPLANATION_LABEL: &str = "Explanation: ";
const RECOMMENDATIONS_LABEL: &str = "Recommendations:";
const URGENCY_LABEL: &str = "Urgency: ";
const DISCLAIMER_LABEL: &str = "Disclaimer: ";

static HYPHEN_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-{3,}").unwrap());

/// Sections recovered from a notes block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisBlock {
    pub local: bool,
    pub diagnosis_summary: String,
    pub explanation: String,
    pub recommendations: Vec<String>,
    pub urgency: Urgency,
    pub disclaimer: String,
}

pub fn marker_for(source: NarrativeSource) -> &'static str {
    match source {
        NarrativeSource::Local => LOCAL_MARKER,
        NarrativeSource::Remote | NarrativeSource::RemoteUnstructured => REMOTE_MARKER,
    }
}

/// Render the narrative as a delimited block.
pub fn format_analysis_block(narrative: &Narrative) -> String {
    let mut block = String::new();
    block.push_str(marker_for(narrative.source));
    block.push('\n');
    block.push_str(&format!("{DIAGNOSIS_LABEL}{}\n", single_line(&narrative.diagnosis_summary)));
    block.push_str(&format!("{EXPLANATION_LABEL}{}\n", single_line(&narrative.explanation)));
    block.push_str(RECOMMENDATIONS_LABEL);
    block.push('\n');
    for (i, rec) in narrative.recommendations.iter().enumerate() {
        block.push_str(&format!("{}. {}\n", i + 1, single_line(rec)));
    }
    block.push_str(&format!("{URGENCY_LABEL}{}\n", narrative.urgency));
    block.push_str(&format!("{DISCLAIMER_LABEL}{}\n", single_line(&narrative.disclaimer)));
    block.push_str(END_MARKER);
    block
}

/// Clinician notes (if any) followed by the analysis block.
pub fn compose_notes(clinician_notes: Option<&str>, narrative: &Narrative) -> String {
    let block = format_analysis_block(narrative);
    match clinician_notes.map(str::trim).filter(|n| !n.is_empty()) {
        Some(notes) => format!("{notes}\n\n{block}"),
        None => block,
    }
}

/// Find and parse the last analysis block in `notes`.
pub fn parse_analysis_block(notes: &str) -> Option<AnalysisBlock> {
    let remote = notes.rfind(REMOTE_MARKER).map(|i| (i, false));
    let local = notes.rfind(LOCAL_MARKER).map(|i| (i, true));
    let (start, is_local) = match (remote, local) {
        (Some(r), Some(l)) => r.max(l),
        (r, l) => r.or(l)?,
    };
    let marker_len = if is_local { LOCAL_MARKER.len() } else { REMOTE_MARKER.len() };
    let body = &notes[start + marker_len..];
    let body = &body[..body.find(END_MARKER)?];

    let mut diagnosis_summary = None;
    let mut explanation = None;
    let mut urgency = None;
    let mut disclaimer = None;
    let mut recommendations = Vec::new();
    let mut in_recommendations = false;

    for line in body.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(v) = line.strip_prefix(DIAGNOSIS_LABEL) {
            diagnosis_summary = Some(v.to_string());
        } else if let Some(v) = line.strip_prefix(EXPLANATION_LABEL) {
            explanation = Some(v.to_string());
        } else if line == RECOMMENDATIONS_LABEL {
            in_recommendations = true;
            continue;
        } else if let Some(v) = line.strip_prefix(URGENCY_LABEL) {
            urgency = v.parse::<Urgency>().ok();
        } else if let Some(v) = line.strip_prefix(DISCLAIMER_LABEL) {
            disclaimer = Some(v.to_string());
        } else if in_recommendations {
            if let Some(item) = numbered_item(line) {
                recommendations.push(item.to_string());
                continue;
            }
        }
        in_recommendations = false;
    }

    Some(AnalysisBlock {
        local: is_local,
        diagnosis_summary: diagnosis_summary?,
        explanation: explanation?,
        recommendations,
        urgency: urgency.unwrap_or(Urgency::Indeterminate),
        disclaimer: disclaimer?,
    })
}

fn numbered_item(line: &str) -> Option<&str> {
    let (number, rest) = line.split_once(". ")?;
    (!number.is_empty() && number.chars().all(|c| c.is_ascii_digit())).then_some(rest)
}

fn single_line(text: &str) -> String {
    let joined = text.split_whitespace().collect::<Vec<_>>().join(" ");
    HYPHEN_RUN.replace_all(&joined, "--").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn narrative(source: NarrativeSource) -> Narrative {
        Narrative {
            diagnosis_summary: "Atopic dermatitis".into(),
            explanation: "Dry,\nitchy skin.".into(),
            recommendations: vec!["Moisturise".into(), "Avoid hot water".into()],
            urgency: Urgency::Medium,
            disclaimer: "Reference only.".into(),
            source,
        }
    }

    #[test]
    fn block_is_delimited_and_labelled() {
        let block = format_analysis_block(&narrative(NarrativeSource::Remote));
        assert!(block.starts_with(REMOTE_MARKER));
        assert!(block.ends_with(END_MARKER));
        assert!(block.contains("Explanation: Dry, itchy skin."));
        assert!(block.contains("2. Avoid hot water"));
        assert!(block.contains("Urgency: medium"));
    }

    #[test]
    fn local_narrative_uses_local_marker() {
        let block = format_analysis_block(&narrative(NarrativeSource::Local));
        assert!(block.starts_with(LOCAL_MARKER));
    }

    #[test]
    fn clinician_notes_come_first() {
        let notes = compose_notes(Some("  Patient reports flare after gardening. "), &narrative(NarrativeSource::Remote));
        assert!(notes.starts_with("Patient reports flare after gardening.\n\n--- AI Analysis ---"));
    }

    #[test]
    fn blank_clinician_notes_are_dropped() {
        let notes = compose_notes(Some("   "), &narrative(NarrativeSource::Remote));
        assert!(notes.starts_with(REMOTE_MARKER));
    }

    #[test]
    fn parse_recovers_sections() {
        let notes = compose_notes(Some("Seen today."), &narrative(NarrativeSource::Local));
        let block = parse_analysis_block(&notes).unwrap();
        assert!(block.local);
        assert_eq!(block.diagnosis_summary, "Atopic dermatitis");
        assert_eq!(block.explanation, "Dry, itchy skin.");
        assert_eq!(block.recommendations, vec!["Moisturise", "Avoid hot water"]);
        assert_eq!(block.urgency, Urgency::Medium);
        assert_eq!(block.disclaimer, "Reference only.");
    }

    #[test]
    fn parse_without_block_is_none() {
        assert!(parse_analysis_block("Just some notes.").is_none());
    }

    #[test]
    fn parse_unterminated_block_is_none() {
        let block = format_analysis_block(&narrative(NarrativeSource::Remote));
        let truncated = block.trim_end_matches(END_MARKER);
        assert!(parse_analysis_block(truncated).is_none());
    }

    #[test]
    fn marker_text_inside_values_keeps_block_parseable() {
        let mut n = narrative(NarrativeSource::Remote);
        n.explanation = "Red skin. --- End Analysis --- more".into();
        n.disclaimer = "Ref only --- AI Analysis --- ok".into();
        n.recommendations = vec!["Avoid ---- Clinical Analysis ---- quotes".into()];
        n.diagnosis_summary = "Eczema --- End Analysis ---".into();

        let notes = compose_notes(Some("Seen today."), &n);
        let block = parse_analysis_block(&notes).unwrap();
        assert!(!block.local);
        assert_eq!(block.explanation, "Red skin. -- End Analysis -- more");
        assert_eq!(block.disclaimer, "Ref only -- AI Analysis -- ok");
        assert_eq!(block.recommendations, vec!["Avoid -- Clinical Analysis -- quotes"]);
        assert_eq!(block.diagnosis_summary, "Eczema -- End Analysis --");
        assert_eq!(block.urgency, Urgency::Medium);
    }

    #[test]
    fn markers_in_clinician_notes_do_not_hide_the_block() {
        let notes = compose_notes(
            Some("Copied from old chart: --- End Analysis --- --- AI Analysis ---"),
            &narrative(NarrativeSource::Local),
        );
        let block = parse_analysis_block(&notes).unwrap();
        assert!(block.local);
        assert_eq!(block.explanation, "Dry, itchy skin.");
    }

    #[test]
    fn short_dashes_are_kept() {
        assert_eq!(single_line("mild -- moderate - severe"), "mild -- moderate - severe");
    }

    #[test]
    fn numbered_items_require_digits() {
        assert_eq!(numbered_item("12. Rest"), Some("Rest"));
        assert_eq!(numbered_item("a. Rest"), None);
        assert_eq!(numbered_item("Rest"), None);
    }
}
