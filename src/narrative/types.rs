use std::time::Duration;

use super::NarrativeError;
use crate::models::enums::{BodyZone, Urgency};
use crate::models::ImageUpload;

/// Everything the narrative backends see about a consultation.
#[derive(Debug, Clone)]
pub struct NarrativeRequest {
    /// Display names, in catalog order.
    pub symptom_names: Vec<String>,
    pub zone: BodyZone,
    pub image: Option<ImageUpload>,
}

impl NarrativeRequest {
    pub fn new(symptom_names: Vec<String>, zone: BodyZone) -> Self {
        Self {
            symptom_names,
            zone,
            image: None,
        }
    }

    pub fn with_image(mut self, image: ImageUpload) -> Self {
        self.image = Some(image);
        self
    }
}

/// Abstraction over a text generation backend (allows mocking).
pub trait GenerativeClient {
    /// Send a prompt, optionally with one inline image, and return the raw text.
    fn generate(&self, prompt: &str, image: Option<&ImageUpload>) -> Result<String, NarrativeError>;

    /// `generate`, giving up after `timeout`. Clients without their own
    /// deadline ignore it.
    fn generate_within(
        &self,
        prompt: &str,
        image: Option<&ImageUpload>,
        timeout: Duration,
    ) -> Result<String, NarrativeError> {
        let _ = timeout;
        self.generate(prompt, image)
    }

    /// Total wall time one narrative may take across retries.
    fn time_budget(&self) -> Option<Duration> {
        None
    }

    /// Model identifier, for logging.
    fn model_name(&self) -> &str;
}

/// Why the local narrative was produced instead of the remote one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    NotConfigured,
    Disabled,
    ServiceBusy,
    ServiceFailed,
}

impl FallbackReason {
    pub fn notice(&self) -> &'static str {
        match self {
            FallbackReason::NotConfigured => "AI analysis is not configured.",
            FallbackReason::Disabled => "AI analysis is disabled.",
            FallbackReason::ServiceBusy => {
                "The AI analysis service was busy or did not answer in time."
            }
            FallbackReason::ServiceFailed => "The AI analysis service could not be used.",
        }
    }
}

impl From<&NarrativeError> for FallbackReason {
    fn from(e: &NarrativeError) -> Self {
        match e {
            NarrativeError::NotConfigured => FallbackReason::NotConfigured,
            NarrativeError::Disabled => FallbackReason::Disabled,
            NarrativeError::ServiceBusy(_)
            | NarrativeError::Timeout(_)
            | NarrativeError::Connection(_) => FallbackReason::ServiceBusy,
            _ => FallbackReason::ServiceFailed,
        }
    }
}

/// Map a free-form urgency label to the closed set. Accepts English and
/// Spanish spellings; anything else is `Indeterminate`.
pub fn parse_urgency_label(label: &str) -> Urgency {
    match label.trim().to_lowercase().as_str() {
        "low" | "bajo" | "baja" => Urgency::Low,
        "medium" | "moderate" | "medio" | "media" | "moderado" => Urgency::Medium,
        "high" | "urgent" | "alto" | "alta" | "urgente" => Urgency::High,
        _ => Urgency::Indeterminate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urgency_labels_map_to_closed_set() {
        assert_eq!(parse_urgency_label("HIGH"), Urgency::High);
        assert_eq!(parse_urgency_label(" medio "), Urgency::Medium);
        assert_eq!(parse_urgency_label("baja"), Urgency::Low);
        assert_eq!(parse_urgency_label("moderate"), Urgency::Medium);
    }

    #[test]
    fn unknown_urgency_is_indeterminate() {
        assert_eq!(parse_urgency_label("critical-ish"), Urgency::Indeterminate);
        assert_eq!(parse_urgency_label(""), Urgency::Indeterminate);
    }

    #[test]
    fn fallback_reason_from_error() {
        assert_eq!(
            FallbackReason::from(&NarrativeError::NotConfigured),
            FallbackReason::NotConfigured
        );
        assert_eq!(
            FallbackReason::from(&NarrativeError::Timeout(30)),
            FallbackReason::ServiceBusy
        );
        assert_eq!(
            FallbackReason::from(&NarrativeError::EmptyResponse),
            FallbackReason::ServiceFailed
        );
    }

    #[test]
    fn every_reason_has_distinct_notice() {
        let notices = [
            FallbackReason::NotConfigured.notice(),
            FallbackReason::Disabled.notice(),
            FallbackReason::ServiceBusy.notice(),
            FallbackReason::ServiceFailed.notice(),
        ];
        for (i, a) in notices.iter().enumerate() {
            for b in &notices[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
