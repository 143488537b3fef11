//! Narrative backend selection.
//!
//! `NarrativeProvider::generate` never fails: the remote backend is tried
//! when configured, and any failure degrades to the local narrative with a
//! disclaimer that says why. A retry shares the client's time budget with
//! the first attempt.

use std::time::Instant;

use super::local::local_narrative;
use super::parser::{parse_narrative_response, unstructured_narrative};
use super::prompt::{build_description_prompt, build_narrative_prompt, build_treatment_prompt};
use super::types::{FallbackReason, GenerativeClient, NarrativeRequest};
use super::{GeminiClient, NarrativeError};
use crate::config::RemoteNarrativeConfig;
use crate::models::enums::Severity;
use crate::models::Narrative;

/// Extra attempts after a transient failure.
const MAX_REMOTE_RETRIES: usize = 1;

/// Remote narrative generation with bounded retry and partial recovery.
pub struct RemoteNarrator {
    client: Box<dyn GenerativeClient + Send + Sync>,
}

impl RemoteNarrator {
    pub fn new(client: Box<dyn GenerativeClient + Send + Sync>) -> Self {
        Self { client }
    }

    fn call_with_retry(
        &self,
        prompt: &str,
        request: Option<&NarrativeRequest>,
    ) -> Result<String, NarrativeError> {
        let image = request.and_then(|r| r.image.as_ref());
        let budget = self.client.time_budget();
        let started = Instant::now();
        let mut attempt = 0;
        loop {
            let result = match budget {
                Some(budget) => {
                    let remaining = budget.saturating_sub(started.elapsed());
                    if remaining.is_zero() {
                        return Err(NarrativeError::Timeout(budget.as_secs()));
                    }
                    self.client.generate_within(prompt, image, remaining)
                }
                None => self.client.generate(prompt, image),
            };
            match result {
                Ok(text) => return Ok(text),
                Err(e) if e.is_transient() && attempt < MAX_REMOTE_RETRIES => {
                    tracing::warn!(
                        model = self.client.model_name(),
                        attempt = attempt + 1,
                        error = %e,
                        "Narrative call failed, retrying"
                    );
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Remote narrative for a consultation. Malformed but non-empty text is
    /// salvaged as an unstructured narrative.
    pub fn generate(&self, request: &NarrativeRequest) -> Result<Narrative, NarrativeError> {
        let prompt = build_narrative_prompt(request);
        let response = self.call_with_retry(&prompt, Some(request))?;

        match parse_narrative_response(&response) {
            Ok(narrative) => Ok(narrative),
            Err(e) => {
                tracing::warn!(error = %e, "Narrative response not structured, using raw text");
                unstructured_narrative(&response).ok_or(e)
            }
        }
    }

    pub fn describe_condition(
        &self,
        condition_name: &str,
        symptom_names: &[String],
    ) -> Result<String, NarrativeError> {
        let prompt = build_description_prompt(condition_name, symptom_names);
        self.call_with_retry(&prompt, None)
    }

    pub fn suggest_treatment(
        &self,
        condition_name: &str,
        severity: Severity,
    ) -> Result<String, NarrativeError> {
        let prompt = build_treatment_prompt(condition_name, severity);
        self.call_with_retry(&prompt, None)
    }
}

/// Which backend produces narratives for this process.
pub enum NarrativeProvider {
    Remote(RemoteNarrator),
    Local(FallbackReason),
}

impl NarrativeProvider {
    /// Remote when enabled with a usable key and the HTTP client builds.
    pub fn from_config(config: &RemoteNarrativeConfig) -> Self {
        match GeminiClient::from_config(config) {
            Ok(client) => {
                tracing::info!(model = %config.model, "Remote narrative enabled");
                NarrativeProvider::Remote(RemoteNarrator::new(Box::new(client)))
            }
            Err(e) => {
                let reason = FallbackReason::from(&e);
                tracing::info!(reason = ?reason, "Using local narrative");
                NarrativeProvider::Local(reason)
            }
        }
    }

    pub fn with_client(client: Box<dyn GenerativeClient + Send + Sync>) -> Self {
        NarrativeProvider::Remote(RemoteNarrator::new(client))
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, NarrativeProvider::Remote(_))
    }

    /// Always returns a complete narrative.
    pub fn generate(&self, request: &NarrativeRequest) -> Narrative {
        let _span = tracing::debug_span!(
            "generate_narrative",
            zone = %request.zone,
            symptoms = request.symptom_names.len(),
            has_image = request.image.is_some()
        )
        .entered();

        match self {
            NarrativeProvider::Remote(remote) => match remote.generate(request) {
                Ok(narrative) => narrative,
                Err(e) => {
                    tracing::warn!(error = %e, "Remote narrative failed, falling back to local");
                    local_narrative(request, FallbackReason::from(&e))
                }
            },
            NarrativeProvider::Local(reason) => local_narrative(request, *reason),
        }
    }

    /// Catalog description for a condition; `None` when unavailable.
    pub fn describe_condition(&self, condition_name: &str, symptom_names: &[String]) -> Option<String> {
        let NarrativeProvider::Remote(remote) = self else {
            return None;
        };
        remote
            .describe_condition(condition_name, symptom_names)
            .map_err(|e| tracing::warn!(error = %e, condition = condition_name, "Description failed"))
            .ok()
    }

    /// General treatment plan for a condition; `None` when unavailable.
    pub fn suggest_treatment(&self, condition_name: &str, severity: Severity) -> Option<String> {
        let NarrativeProvider::Remote(remote) = self else {
            return None;
        };
        remote
            .suggest_treatment(condition_name, severity)
            .map_err(|e| tracing::warn!(error = %e, condition = condition_name, "Treatment suggestion failed"))
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use super::*;
    use crate::models::enums::{BodyZone, NarrativeSource, Urgency};
    use crate::models::ImageUpload;
    use crate::narrative::MockGenerativeClient;

    /// Fails with a fixed error `fail_count` times, then answers.
    struct FlakyClient {
        fail_count: usize,
        calls: Arc<AtomicUsize>,
        error: fn() -> NarrativeError,
        response: String,
    }

    impl GenerativeClient for FlakyClient {
        fn generate(&self, _prompt: &str, _image: Option<&ImageUpload>) -> Result<String, NarrativeError> {
            let count = self.calls.fetch_add(1, Ordering::SeqCst);
            if count < self.fail_count {
                Err((self.error)())
            } else {
                Ok(self.response.clone())
            }
        }

        fn model_name(&self) -> &str {
            "flaky"
        }
    }

    fn flaky(fail_count: usize, error: fn() -> NarrativeError) -> (NarrativeProvider, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let client = FlakyClient {
            fail_count,
            calls: Arc::clone(&calls),
            error,
            response: VALID.to_string(),
        };
        (NarrativeProvider::with_client(Box::new(client)), calls)
    }

    /// Busy on the first call after `delay`, then answers. Records the
    /// timeout each call was given.
    struct SlowBusyClient {
        budget: Duration,
        delay: Duration,
        timeouts: Arc<Mutex<Vec<Duration>>>,
    }

    impl GenerativeClient for SlowBusyClient {
        fn generate(&self, _prompt: &str, _image: Option<&ImageUpload>) -> Result<String, NarrativeError> {
            unreachable!("budgeted clients are called through generate_within")
        }

        fn generate_within(
            &self,
            _prompt: &str,
            _image: Option<&ImageUpload>,
            timeout: Duration,
        ) -> Result<String, NarrativeError> {
            let mut timeouts = self.timeouts.lock().unwrap();
            timeouts.push(timeout);
            if timeouts.len() == 1 {
                std::thread::sleep(self.delay);
                Err(NarrativeError::ServiceBusy(503))
            } else {
                Ok(VALID.to_string())
            }
        }

        fn time_budget(&self) -> Option<Duration> {
            Some(self.budget)
        }

        fn model_name(&self) -> &str {
            "slow"
        }
    }

    fn slow_busy(budget: Duration, delay: Duration) -> (NarrativeProvider, Arc<Mutex<Vec<Duration>>>) {
        let timeouts = Arc::new(Mutex::new(Vec::new()));
        let client = SlowBusyClient {
            budget,
            delay,
            timeouts: Arc::clone(&timeouts),
        };
        (NarrativeProvider::with_client(Box::new(client)), timeouts)
    }

    const VALID: &str = r#"{"diagnosis":"Eczema","explanation":"Itchy red skin.","recommendations":["Moisturise"],"urgency":"low","disclaimer":"See a doctor."}"#;

    fn request() -> NarrativeRequest {
        NarrativeRequest::new(vec!["Redness".into(), "Pain".into()], BodyZone::Legs)
    }

    #[test]
    fn remote_success_is_structured() {
        let provider = NarrativeProvider::with_client(Box::new(MockGenerativeClient::new(VALID)));
        let narrative = provider.generate(&request());
        assert_eq!(narrative.source, NarrativeSource::Remote);
        assert_eq!(narrative.urgency, Urgency::Low);
        assert!(narrative.is_complete());
    }

    #[test]
    fn prose_response_is_salvaged() {
        let provider = NarrativeProvider::with_client(Box::new(MockGenerativeClient::new(
            "This looks like contact dermatitis.",
        )));
        let narrative = provider.generate(&request());
        assert_eq!(narrative.source, NarrativeSource::RemoteUnstructured);
        assert_eq!(narrative.urgency, Urgency::Medium);
        assert_eq!(narrative.explanation, "This looks like contact dermatitis.");
        assert!(narrative.is_complete());
    }

    #[test]
    fn blank_response_falls_back_to_local() {
        let provider = NarrativeProvider::with_client(Box::new(MockGenerativeClient::new("  ")));
        let narrative = provider.generate(&request());
        assert_eq!(narrative.source, NarrativeSource::Local);
        assert!(narrative.is_complete());
        assert!(narrative.disclaimer.ends_with(FallbackReason::ServiceFailed.notice()));
    }

    #[test]
    fn transient_error_is_retried_once() {
        let (provider, calls) = flaky(1, || NarrativeError::ServiceBusy(503));
        let narrative = provider.generate(&request());
        assert_eq!(narrative.source, NarrativeSource::Remote);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn persistent_transient_error_degrades_to_busy_notice() {
        let (provider, calls) = flaky(usize::MAX, || NarrativeError::ServiceBusy(429));
        let narrative = provider.generate(&request());
        assert_eq!(calls.load(Ordering::SeqCst), 1 + MAX_REMOTE_RETRIES);
        assert_eq!(narrative.source, NarrativeSource::Local);
        assert_eq!(narrative.urgency, Urgency::High);
        assert!(narrative.is_complete());
        assert!(narrative.disclaimer.ends_with(FallbackReason::ServiceBusy.notice()));
    }

    #[test]
    fn hard_error_is_not_retried() {
        let (provider, calls) = flaky(usize::MAX, || NarrativeError::Api {
            status: 400,
            body: "bad request".into(),
        });
        let narrative = provider.generate(&request());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(narrative.disclaimer.ends_with(FallbackReason::ServiceFailed.notice()));
    }

    #[test]
    fn timeout_is_not_retried() {
        let (provider, calls) = flaky(usize::MAX, || NarrativeError::Timeout(30));
        provider.generate(&request());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn retry_gets_only_the_remaining_budget() {
        let budget = Duration::from_secs(10);
        let delay = Duration::from_millis(20);
        let (provider, timeouts) = slow_busy(budget, delay);
        let narrative = provider.generate(&request());
        assert_eq!(narrative.source, NarrativeSource::Remote);
        assert!(narrative.is_complete());

        let timeouts = timeouts.lock().unwrap();
        assert_eq!(timeouts.len(), 2);
        assert!(timeouts[0] <= budget);
        assert!(timeouts[1] <= budget - delay);
    }

    #[test]
    fn exhausted_budget_skips_retry() {
        let (provider, timeouts) = slow_busy(Duration::from_millis(10), Duration::from_millis(30));
        let narrative = provider.generate(&request());
        assert_eq!(timeouts.lock().unwrap().len(), 1);
        assert_eq!(narrative.source, NarrativeSource::Local);
        assert!(narrative.is_complete());
        assert!(narrative.disclaimer.ends_with(FallbackReason::ServiceBusy.notice()));
    }

    #[test]
    fn unconfigured_provider_is_local() {
        let provider = NarrativeProvider::from_config(&RemoteNarrativeConfig::default());
        assert!(!provider.is_remote());
        let narrative = provider.generate(&request());
        assert_eq!(narrative.source, NarrativeSource::Local);
        assert!(narrative.is_complete());
        assert!(narrative.disclaimer.ends_with(FallbackReason::NotConfigured.notice()));
    }

    #[test]
    fn disabled_provider_is_local() {
        let config = RemoteNarrativeConfig {
            api_key: Some("key".into()),
            enabled: false,
            ..RemoteNarrativeConfig::default()
        };
        let provider = NarrativeProvider::from_config(&config);
        assert!(matches!(provider, NarrativeProvider::Local(FallbackReason::Disabled)));
    }

    #[test]
    fn configured_provider_is_remote() {
        let config = RemoteNarrativeConfig {
            api_key: Some("key".into()),
            ..RemoteNarrativeConfig::default()
        };
        assert!(NarrativeProvider::from_config(&config).is_remote());
    }

    #[test]
    fn advice_is_none_when_local() {
        let provider = NarrativeProvider::Local(FallbackReason::NotConfigured);
        assert!(provider.describe_condition("Acne", &[]).is_none());
        assert!(provider.suggest_treatment("Acne", Severity::Moderate).is_none());
    }

    #[test]
    fn advice_returns_remote_text() {
        let provider =
            NarrativeProvider::with_client(Box::new(MockGenerativeClient::new("Use emollients.")));
        assert_eq!(
            provider.suggest_treatment("Xerosis", Severity::Mild).as_deref(),
            Some("Use emollients.")
        );
        assert_eq!(
            provider.describe_condition("Xerosis", &["Dryness".into()]).as_deref(),
            Some("Use emollients.")
        );
    }

    #[test]
    fn advice_failure_is_none() {
        let (provider, _) = flaky(usize::MAX, || NarrativeError::EmptyResponse);
        assert!(provider.suggest_treatment("Acne", Severity::Mild).is_none());
    }
}
