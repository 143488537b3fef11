use serde::Deserialize;

use super::types::parse_urgency_label;
use super::NarrativeError;
use crate::models::enums::{NarrativeSource, Urgency};
use crate::models::Narrative;

/// Longest explanation kept when the response is not valid JSON.
pub const MAX_UNSTRUCTURED_CHARS: usize = 500;

const MAX_RECOMMENDATIONS: usize = 6;

pub const DEFAULT_DIAGNOSIS_SUMMARY: &str = "Possible dermatological condition";

pub const REMOTE_DISCLAIMER: &str = "This information is for reference only. Consult a \
    professional dermatologist for an accurate diagnosis and treatment.";

const UNSTRUCTURED_DISCLAIMER: &str = "This is general guidance. Consult a medical \
    professional for an accurate diagnosis.";

const GENERIC_RECOMMENDATIONS: &[&str] = &[
    "Keep the affected area clean and dry",
    "Avoid scratching or irritating the area",
    "Consult a dermatologist",
];

#[derive(Deserialize)]
struct RawNarrative {
    #[serde(alias = "diagnostico", alias = "diagnosis_summary")]
    diagnosis: Option<String>,
    #[serde(alias = "explicacion")]
    explanation: Option<String>,
    #[serde(alias = "recomendaciones")]
    recommendations: Option<Vec<serde_json::Value>>,
    #[serde(alias = "urgencia")]
    urgency: Option<String>,
    #[serde(alias = "advertencia")]
    disclaimer: Option<String>,
}

/// Parse the model's text into a narrative. Fails when no JSON object with
/// an explanation can be found.
pub fn parse_narrative_response(response: &str) -> Result<Narrative, NarrativeError> {
    let json_str = extract_json(response)
        .ok_or_else(|| NarrativeError::MalformedResponse("No JSON object found".into()))?;

    let raw: RawNarrative = serde_json::from_str(json_str)
        .map_err(|e| NarrativeError::JsonParsing(e.to_string()))?;

    let explanation = non_blank(raw.explanation)
        .ok_or_else(|| NarrativeError::MalformedResponse("Missing explanation".into()))?;

    let mut recommendations: Vec<String> = raw
        .recommendations
        .unwrap_or_default()
        .into_iter()
        .filter_map(|v| match v {
            serde_json::Value::String(s) => non_blank(Some(s)),
            _ => None,
        })
        .take(MAX_RECOMMENDATIONS)
        .collect();
    if recommendations.is_empty() {
        recommendations = generic_recommendations();
    }

    Ok(Narrative {
        diagnosis_summary: non_blank(raw.diagnosis)
            .unwrap_or_else(|| DEFAULT_DIAGNOSIS_SUMMARY.to_string()),
        explanation,
        recommendations,
        urgency: raw
            .urgency
            .as_deref()
            .map(parse_urgency_label)
            .unwrap_or(Urgency::Indeterminate),
        disclaimer: non_blank(raw.disclaimer).unwrap_or_else(|| REMOTE_DISCLAIMER.to_string()),
        source: NarrativeSource::Remote,
    })
}

/// Salvage a narrative from text that is not valid JSON: the leading text
/// becomes the explanation, the rest is generic. `None` for blank text.
pub fn unstructured_narrative(response: &str) -> Option<Narrative> {
    let text = strip_code_fences(response);
    if text.is_empty() {
        return None;
    }

    Some(Narrative {
        diagnosis_summary: DEFAULT_DIAGNOSIS_SUMMARY.to_string(),
        explanation: truncate_chars(text, MAX_UNSTRUCTURED_CHARS),
        recommendations: generic_recommendations(),
        urgency: Urgency::Medium,
        disclaimer: UNSTRUCTURED_DISCLAIMER.to_string(),
        source: NarrativeSource::RemoteUnstructured,
    })
}

/// Remove a surrounding markdown code fence (with optional language tag).
pub fn strip_code_fences(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Skip the language tag line, if any.
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim_end().trim_end_matches("```").trim()
}

/// Locate the JSON object in a response: fenced block first, then the
/// outermost braces.
fn extract_json(response: &str) -> Option<&str> {
    let unfenced = strip_code_fences(response);
    if unfenced.starts_with('{') && unfenced.ends_with('}') {
        return Some(unfenced);
    }

    if let Some(json_start) = response.find("```json") {
        let content = &response[json_start + 7..];
        if let Some(end) = content.find("```") {
            let block = content[..end].trim();
            if !block.is_empty() {
                return Some(block);
            }
        }
    }

    let start = response.find('{')?;
    let end = response.rfind('}')?;
    (end > start).then(|| &response[start..=end])
}

fn generic_recommendations() -> Vec<String> {
    GENERIC_RECOMMENDATIONS.iter().map(|s| s.to_string()).collect()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
