//! OpenAI Backend Implementation
//!
//! Chat completions against the OpenAI API. Used as the cloud tier when a
//! credential is configured.

use crate::LlmError;
use carbonlens_domain::traits::{Generation, GenerationBackend, GenerationRequest};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Default OpenAI API endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com";

/// Default chat model
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Default request timeout (30 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default completion cap
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

/// Default sampling temperature
pub const DEFAULT_TEMPERATURE: f32 = 0.1;

/// Configuration for the OpenAI backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// API endpoint without the `/v1/...` suffix
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Chat model name
    #[serde(default = "default_model")]
    pub model: String,

    /// Bearer credential; the backend is unconfigured without one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum completion tokens
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            api_key: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

impl OpenAiConfig {
    /// Config carrying a credential, other settings default
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Self::default()
        }
    }

    /// Whether a non-blank credential is present
    pub fn has_credential(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.endpoint.trim().is_empty() {
            return Err("openai endpoint must not be empty".to_string());
        }
        if self.timeout_secs == 0 {
            return Err("openai timeout must be greater than 0".to_string());
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err("temperature must be between 0.0 and 2.0".to_string());
        }
        Ok(())
    }
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

/// OpenAI chat completions backend
pub struct OpenAiBackend {
    config: OpenAiConfig,
    client: reqwest::blocking::Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiBackend {
    /// Create a new OpenAI backend
    ///
    /// A missing credential is not an error here; `probe` reports it.
    pub fn new(config: OpenAiConfig) -> Result<Self, LlmError> {
        config.validate().map_err(LlmError::NotConfigured)?;

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::NotConfigured(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// The configuration in use
    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    fn api_key(&self) -> Result<&str, LlmError> {
        self.config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| LlmError::NotConfigured("OPENAI_API_KEY not set".to_string()))
    }

    fn build_messages<'a>(request: &'a GenerationRequest) -> Vec<ChatMessage<'a>> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system_prompt {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &request.prompt,
        });
        messages
    }
}

impl GenerationBackend for OpenAiBackend {
    type Error = LlmError;

    fn name(&self) -> &str {
        "openai"
    }

    /// Reports readiness from configuration alone; no network call is made.
    fn probe(&self) -> Result<Vec<String>, Self::Error> {
        self.api_key()?;
        Ok(vec![self.config.model.clone()])
    }

    fn generate(&self, request: &GenerationRequest) -> Result<Generation, Self::Error> {
        let api_key = self.api_key()?;
        let url = format!("{}/v1/chat/completions", self.config.endpoint);

        let body = ChatRequest {
            model: &self.config.model,
            messages: Self::build_messages(request),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        debug!("OpenAI request to {} with model {}", url, self.config.model);

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .map_err(|e| LlmError::from_transport(e, self.config.timeout_secs))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            warn!("OpenAI rate limit hit");
            return Err(LlmError::RateLimitExceeded);
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(LlmError::ModelNotAvailable(self.config.model.clone()));
        }
        if !status.is_success() {
            let error_text = response.text().unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LlmError::Communication(format!("HTTP {}: {}", status, error_text)));
        }

        let parsed: ChatResponse = response
            .json()
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LlmError::InvalidResponse("response has no choices".to_string()))?;

        Ok(Generation {
            text,
            model: parsed.model.unwrap_or_else(|| self.config.model.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = OpenAiConfig::default();
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.max_tokens, 1000);
        assert!(!config.has_credential());
    }

    #[test]
    fn test_probe_without_key_is_not_configured() {
        let backend = OpenAiBackend::new(OpenAiConfig::default()).unwrap();
        assert!(matches!(backend.probe(), Err(LlmError::NotConfigured(_))));
    }

    #[test]
    fn test_blank_key_is_not_a_credential() {
        let config = OpenAiConfig::with_api_key("   ");
        assert!(!config.has_credential());
        let backend = OpenAiBackend::new(config).unwrap();
        assert!(matches!(
            backend.generate(&GenerationRequest::new("x")),
            Err(LlmError::NotConfigured(_))
        ));
    }

    #[test]
    fn test_probe_with_key_lists_model() {
        let backend = OpenAiBackend::new(OpenAiConfig::with_api_key("sk-test")).unwrap();
        assert_eq!(backend.probe().unwrap(), vec![DEFAULT_MODEL.to_string()]);
        assert_eq!(backend.name(), "openai");
    }

    #[test]
    fn test_messages_include_system_role() {
        let request = GenerationRequest::new("invoice text").with_system_prompt("expert");
        let messages = OpenAiBackend::build_messages(&request);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].content, "invoice text");
    }

    #[test]
    fn test_invalid_temperature() {
        let mut config = OpenAiConfig::default();
        config.temperature = 3.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unreachable_endpoint() {
        let mut config = OpenAiConfig::with_api_key("sk-test");
        config.endpoint = "http://127.0.0.1:1".to_string();
        config.timeout_secs = 2;
        let backend = OpenAiBackend::new(config).unwrap();

        let result = backend.generate(&GenerationRequest::new("hello"));
        assert!(matches!(result, Err(LlmError::Unreachable(_)) | Err(LlmError::Timeout(_))));
    }
}
