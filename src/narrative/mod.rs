pub mod gemini;
pub mod local;
pub mod parser;
pub mod prompt;
pub mod provider;
pub mod types;

pub use gemini::*;
pub use local::*;
pub use parser::*;
pub use provider::*;
pub use types::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NarrativeError {
    #[error("Remote narrative is not configured (no API key)")]
    NotConfigured,

    #[error("Remote narrative is disabled")]
    Disabled,

    #[error("Narrative service busy (status {0})")]
    ServiceBusy(u16),

    #[error("Narrative request timed out after {0}s")]
    Timeout(u64),

    #[error("Cannot reach narrative service at {0}")]
    Connection(String),

    #[error("Narrative service returned error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Narrative service returned no text")]
    EmptyResponse,

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Malformed narrative: {0}")]
    MalformedResponse(String),

    #[error("JSON parsing error: {0}")]
    JsonParsing(String),
}

impl NarrativeError {
    /// Momentary failures worth one more attempt.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            NarrativeError::ServiceBusy(_) | NarrativeError::Connection(_)
        )
    }

    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            NarrativeError::MalformedResponse(_) | NarrativeError::JsonParsing(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn busy_and_connection_are_transient() {
        assert!(NarrativeError::ServiceBusy(503).is_transient());
        assert!(NarrativeError::Connection("http://x".into()).is_transient());
        assert!(!NarrativeError::Timeout(30).is_transient());
        assert!(!NarrativeError::Api { status: 400, body: String::new() }.is_transient());
        assert!(!NarrativeError::NotConfigured.is_transient());
    }

    #[test]
    fn parse_errors_are_classified() {
        assert!(NarrativeError::JsonParsing("eof".into()).is_parse_error());
        assert!(!NarrativeError::EmptyResponse.is_parse_error());
    }
}
