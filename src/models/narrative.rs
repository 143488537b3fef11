use serde::{Deserialize, Serialize};

use super::enums::{NarrativeSource, Urgency};

/// Structured explanation attached to a consultation. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Narrative {
    pub diagnosis_summary: String,
    pub explanation: String,
    pub recommendations: Vec<String>,
    pub urgency: Urgency,
    pub disclaimer: String,
    pub source: NarrativeSource,
}

impl Narrative {
    /// Every field carries content.
    pub fn is_complete(&self) -> bool {
        !self.diagnosis_summary.trim().is_empty()
            && !self.explanation.trim().is_empty()
            && !self.recommendations.is_empty()
            && self.recommendations.iter().all(|r| !r.trim().is_empty())
            && !self.disclaimer.trim().is_empty()
    }
}
