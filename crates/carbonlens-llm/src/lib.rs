//! carbonlens Generation Backend Layer
//!
//! Implementations of the `GenerationBackend` trait from `carbonlens-domain`.
//!
//! # Backends
//!
//! - `MockBackend`: Deterministic mock for testing
//! - `OllamaBackend`: Local Ollama API integration
//! - `OpenAiBackend`: OpenAI chat completions API
//!
//! # Examples
//!
//! ```
//! use carbonlens_llm::MockBackend;
//! use carbonlens_domain::traits::{GenerationBackend, GenerationRequest};
//!
//! let backend = MockBackend::new(r#"{"amount": 100}"#);
//! let generation = backend.generate(&GenerationRequest::new("invoice")).unwrap();
//! assert_eq!(generation.text, r#"{"amount": 100}"#);
//! ```

#![warn(missing_docs)]

pub mod ollama;
pub mod openai;

use carbonlens_domain::traits::{Generation, GenerationBackend, GenerationRequest};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

pub use ollama::{OllamaBackend, OllamaConfig};
pub use openai::{OpenAiBackend, OpenAiConfig};

/// Errors that can occur during backend operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    /// Backend could not be reached (connection refused, DNS, liveness failure)
    #[error("Backend unreachable: {0}")]
    Unreachable(String),

    /// Request exceeded its timeout
    #[error("Request timed out after {0}s")]
    Timeout(u64),

    /// Non-success HTTP status or transport error after connecting
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response body
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Backend is missing required configuration (credential, endpoint)
    #[error("Backend not configured: {0}")]
    NotConfigured(String),

    /// Generic error
    #[error("Backend error: {0}")]
    Other(String),
}

impl LlmError {
    /// Map a transport error, distinguishing timeouts and connection failures
    pub(crate) fn from_transport(error: reqwest::Error, timeout_secs: u64) -> Self {
        if error.is_timeout() {
            LlmError::Timeout(timeout_secs)
        } else if error.is_connect() {
            LlmError::Unreachable(error.to_string())
        } else {
            LlmError::Communication(format!("Request failed: {}", error))
        }
    }
}

/// Mock backend for deterministic testing
///
/// Returns pre-configured responses without making any network calls.
/// Responses are selected by the first registered pattern contained in the
/// prompt, falling back to the default response.
///
/// # Examples
///
/// ```
/// use carbonlens_llm::MockBackend;
/// use carbonlens_domain::traits::{GenerationBackend, GenerationRequest};
///
/// let mut backend = MockBackend::default();
/// backend.add_response("diesel", r#"{"fuel_type": "Diesel"}"#);
///
/// let out = backend.generate(&GenerationRequest::new("400 L diesel")).unwrap();
/// assert!(out.text.contains("Diesel"));
/// assert_eq!(backend.call_count(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct MockBackend {
    name: String,
    model: String,
    default_response: String,
    responses: Arc<Mutex<Vec<(String, MockReply)>>>,
    reachable: bool,
    call_count: Arc<Mutex<usize>>,
    probe_count: Arc<Mutex<usize>>,
}

#[derive(Debug, Clone)]
enum MockReply {
    Text(String),
    Fail(LlmError),
}

impl MockBackend {
    /// Create a mock with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            name: "mock".to_string(),
            model: "mock-model".to_string(),
            default_response: response.into(),
            responses: Arc::new(Mutex::new(Vec::new())),
            reachable: true,
            call_count: Arc::new(Mutex::new(0)),
            probe_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Create a mock whose liveness probe always fails
    pub fn unreachable() -> Self {
        Self {
            reachable: false,
            ..Self::default()
        }
    }

    /// Override the backend name used in `model_used` tags
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Override the reported model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Add a response for prompts containing `pattern`
    pub fn add_response(&mut self, pattern: impl Into<String>, response: impl Into<String>) {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((pattern.into(), MockReply::Text(response.into())));
    }

    /// Fail generation for prompts containing `pattern`
    pub fn add_error(&mut self, pattern: impl Into<String>, error: LlmError) {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((pattern.into(), MockReply::Fail(error)));
    }

    /// Number of generate calls so far
    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of probe calls so far
    pub fn probe_count(&self) -> usize {
        *self.probe_count.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reset both counters
    pub fn reset_counts(&self) {
        *self.call_count.lock().unwrap_or_else(PoisonError::into_inner) = 0;
        *self.probe_count.lock().unwrap_or_else(PoisonError::into_inner) = 0;
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

impl GenerationBackend for MockBackend {
    type Error = LlmError;

    fn name(&self) -> &str {
        &self.name
    }

    fn probe(&self) -> Result<Vec<String>, Self::Error> {
        *self.probe_count.lock().unwrap_or_else(PoisonError::into_inner) += 1;

        if !self.reachable {
            return Err(LlmError::Unreachable("mock backend offline".to_string()));
        }
        Ok(vec![self.model.clone()])
    }

    fn generate(&self, request: &GenerationRequest) -> Result<Generation, Self::Error> {
        *self.call_count.lock().unwrap_or_else(PoisonError::into_inner) += 1;

        if !self.reachable {
            return Err(LlmError::Unreachable("mock backend offline".to_string()));
        }

        let responses = self.responses.lock().unwrap_or_else(PoisonError::into_inner);
        let reply = responses
            .iter()
            .find(|(pattern, _)| request.prompt.contains(pattern.as_str()))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| MockReply::Text(self.default_response.clone()));

        match reply {
            MockReply::Text(text) => Ok(Generation {
                text,
                model: self.model.clone(),
            }),
            MockReply::Fail(error) => Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_backend_default() {
        let backend = MockBackend::new("Test response");
        let result = backend.generate(&GenerationRequest::new("any prompt"));
        assert!(result.is_ok());
        assert_eq!(result.unwrap().text, "Test response");
    }

    #[test]
    fn test_mock_backend_pattern_responses() {
        let mut backend = MockBackend::default();
        backend.add_response("hello", "world");
        backend.add_response("foo", "bar");

        let gen = |p: &str| backend.generate(&GenerationRequest::new(p)).unwrap().text;
        assert_eq!(gen("say hello"), "world");
        assert_eq!(gen("foo fighters"), "bar");
        assert_eq!(gen("unknown"), "Default mock response");
    }

    #[test]
    fn test_mock_backend_counts() {
        let backend = MockBackend::new("test");
        assert_eq!(backend.call_count(), 0);

        backend.probe().unwrap();
        backend.generate(&GenerationRequest::new("p1")).unwrap();
        backend.generate(&GenerationRequest::new("p2")).unwrap();
        assert_eq!(backend.call_count(), 2);
        assert_eq!(backend.probe_count(), 1);

        backend.reset_counts();
        assert_eq!(backend.call_count(), 0);
        assert_eq!(backend.probe_count(), 0);
    }

    #[test]
    fn test_mock_backend_error() {
        let mut backend = MockBackend::default();
        backend.add_error("bad prompt", LlmError::Timeout(30));

        let result = backend.generate(&GenerationRequest::new("a bad prompt"));
        assert_eq!(result.unwrap_err(), LlmError::Timeout(30));
    }

    #[test]
    fn test_mock_backend_unreachable() {
        let backend = MockBackend::unreachable();
        assert!(matches!(backend.probe(), Err(LlmError::Unreachable(_))));
        assert!(matches!(
            backend.generate(&GenerationRequest::new("x")),
            Err(LlmError::Unreachable(_))
        ));
    }

    #[test]
    fn test_mock_backend_clone_shares_counts() {
        let backend1 = MockBackend::new("test");
        let backend2 = backend1.clone();

        backend1.generate(&GenerationRequest::new("test")).unwrap();

        assert_eq!(backend1.call_count(), 1);
        assert_eq!(backend2.call_count(), 1);
    }
}
