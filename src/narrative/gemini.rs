use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};

use super::types::GenerativeClient;
use super::NarrativeError;
use crate::config::RemoteNarrativeConfig;
use crate::models::ImageUpload;

/// Statuses the Gemini API uses for overload and quota exhaustion.
const BUSY_STATUSES: &[u16] = &[429, 500, 503, 504];

/// Longest error body kept in `NarrativeError::Api`.
const MAX_ERROR_BODY: usize = 512;

/// Google Gemini `generateContent` client.
pub struct GeminiClient {
    api_base: String,
    model: String,
    api_key: String,
    client: reqwest::blocking::Client,
    timeout: Duration,
}

impl GeminiClient {
    pub fn new(
        api_base: &str,
        model: &str,
        api_key: &str,
        timeout: Duration,
    ) -> Result<Self, NarrativeError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NarrativeError::HttpClient(e.to_string()))?;

        Ok(Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
            client,
            timeout,
        })
    }

    /// Build from configuration. Fails when remote narrative cannot be used.
    pub fn from_config(config: &RemoteNarrativeConfig) -> Result<Self, NarrativeError> {
        if !config.enabled {
            return Err(NarrativeError::Disabled);
        }
        let api_key = config.api_key.as_deref().ok_or(NarrativeError::NotConfigured)?;
        Self::new(&config.api_base, &config.model, api_key, config.timeout)
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base, self.model
        )
    }

    fn map_send_error(&self, e: reqwest::Error) -> NarrativeError {
        if e.is_timeout() {
            NarrativeError::Timeout(self.timeout.as_secs())
        } else if e.is_connect() {
            NarrativeError::Connection(self.api_base.clone())
        } else {
            NarrativeError::HttpClient(e.to_string())
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text {
        text: &'a str,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData<'a>,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

fn build_request<'a>(prompt: &'a str, image: Option<&'a ImageUpload>) -> GenerateContentRequest<'a> {
    let mut parts = vec![Part::Text { text: prompt }];
    if let Some(image) = image {
        parts.push(Part::InlineData {
            inline_data: InlineData {
                mime_type: &image.mime_type,
                data: BASE64.encode(&image.data),
            },
        });
    }
    GenerateContentRequest {
        contents: vec![Content {
            role: "user",
            parts,
        }],
        generation_config: GenerationConfig { temperature: 0.2 },
    }
}

/// Concatenate the text parts of the first candidate.
fn first_candidate_text(response: GenerateContentResponse) -> Result<String, NarrativeError> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(NarrativeError::EmptyResponse);
    }
    Ok(text)
}

impl GenerativeClient for GeminiClient {
    fn generate(&self, prompt: &str, image: Option<&ImageUpload>) -> Result<String, NarrativeError> {
        self.generate_within(prompt, image, self.timeout)
    }

    fn generate_within(
        &self,
        prompt: &str,
        image: Option<&ImageUpload>,
        timeout: Duration,
    ) -> Result<String, NarrativeError> {
        let body = build_request(prompt, image);

        let response = self
            .client
            .post(self.endpoint())
            .timeout(timeout.min(self.timeout))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            if BUSY_STATUSES.contains(&status) {
                return Err(NarrativeError::ServiceBusy(status));
            }
            let body: String = response
                .text()
                .unwrap_or_default()
                .chars()
                .take(MAX_ERROR_BODY)
                .collect();
            return Err(NarrativeError::Api { status, body });
        }

        let parsed: GenerateContentResponse = response.json().map_err(|e| {
            if e.is_timeout() {
                NarrativeError::Timeout(self.timeout.as_secs())
            } else {
                NarrativeError::ResponseParsing(e.to_string())
            }
        })?;

        first_candidate_text(parsed)
    }

    fn time_budget(&self) -> Option<Duration> {
        Some(self.timeout)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Mock client for testing; answers every prompt with a fixed response.
pub struct MockGenerativeClient {
    response: String,
}

impl MockGenerativeClient {
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
        }
    }
}

impl GenerativeClient for MockGenerativeClient {
    fn generate(&self, _prompt: &str, _image: Option<&ImageUpload>) -> Result<String, NarrativeError> {
        Ok(self.response.clone())
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}
