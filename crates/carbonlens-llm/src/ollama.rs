//! Ollama Backend Implementation
//!
//! Integration with Ollama's local generation API. This is the first tier the
//! classifier tries: local models keep invoice text on the machine.
//!
//! # Features
//!
//! - Blocking HTTP communication with bounded timeouts
//! - Liveness probe via `/api/tags`, which also selects the model
//! - Deterministic sampling (temperature 0) and bounded output length
//!
//! # Examples
//!
//! ```no_run
//! use carbonlens_llm::{OllamaBackend, OllamaConfig};
//! use carbonlens_domain::traits::{GenerationBackend, GenerationRequest};
//!
//! let backend = OllamaBackend::new(OllamaConfig::default()).unwrap();
//! let models = backend.probe().unwrap();
//! println!("available: {:?}", models);
//! ```

use crate::LlmError;
use carbonlens_domain::traits::{Generation, GenerationBackend, GenerationRequest};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, info};

/// Default Ollama API endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Model preferred for JSON generation when installed
pub const DEFAULT_MODEL: &str = "llama3.2:latest";

/// Default timeout for generation requests (30 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default timeout for the liveness probe (5 seconds)
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 5;

/// Default cap on generated tokens
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 300;

/// Configuration for the Ollama backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// API endpoint (e.g. "http://localhost:11434")
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Model used when the server has it installed
    #[serde(default = "default_model")]
    pub preferred_model: String,

    /// Generation timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Liveness probe timeout in seconds
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,

    /// Maximum tokens to generate (`num_predict`)
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            preferred_model: default_model(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            probe_timeout_secs: DEFAULT_PROBE_TIMEOUT_SECS,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
        }
    }
}

impl OllamaConfig {
    /// Config for a specific endpoint, other settings default
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.endpoint.trim().is_empty() {
            return Err("ollama endpoint must not be empty".to_string());
        }
        if self.timeout_secs == 0 || self.probe_timeout_secs == 0 {
            return Err("ollama timeouts must be greater than 0".to_string());
        }
        if self.max_output_tokens == 0 {
            return Err("max_output_tokens must be greater than 0".to_string());
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

fn default_probe_timeout() -> u64 {
    DEFAULT_PROBE_TIMEOUT_SECS
}

fn default_max_output_tokens() -> u32 {
    DEFAULT_MAX_OUTPUT_TOKENS
}

/// Ollama API backend for local generation
pub struct OllamaBackend {
    config: OllamaConfig,
    client: reqwest::blocking::Client,
    selected_model: Mutex<Option<String>>,
}

/// Request body for Ollama generate API
#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    top_p: f32,
    num_predict: u32,
    stop: Vec<String>,
}

/// Response from Ollama generate API
#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

/// Response from Ollama tags API
#[derive(Deserialize)]
struct OllamaTagsResponse {
    #[serde(default)]
    models: Vec<OllamaModel>,
}

#[derive(Deserialize)]
struct OllamaModel {
    name: String,
}

impl OllamaBackend {
    /// Create a new Ollama backend
    ///
    /// # Errors
    ///
    /// Returns `NotConfigured` if the configuration is invalid or the HTTP
    /// client cannot be built.
    pub fn new(config: OllamaConfig) -> Result<Self, LlmError> {
        config.validate().map_err(LlmError::NotConfigured)?;

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::NotConfigured(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            client,
            selected_model: Mutex::new(None),
        })
    }

    /// The configuration in use
    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }

    /// Pick the preferred model if installed, otherwise the first listed
    pub fn select_model(&self, available: &[String]) -> Option<String> {
        if available.iter().any(|m| m == &self.config.preferred_model) {
            return Some(self.config.preferred_model.clone());
        }
        available.first().cloned()
    }

    fn current_model(&self) -> String {
        self.selected_model
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .unwrap_or_else(|| self.config.preferred_model.clone())
    }

    fn build_prompt(request: &GenerationRequest) -> String {
        match &request.system_prompt {
            Some(system) => format!("{}\n\n{}", system, request.prompt),
            None => request.prompt.clone(),
        }
    }
}

impl GenerationBackend for OllamaBackend {
    type Error = LlmError;

    fn name(&self) -> &str {
        "ollama"
    }

    fn probe(&self) -> Result<Vec<String>, Self::Error> {
        let url = format!("{}/api/tags", self.config.endpoint);

        let response = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(self.config.probe_timeout_secs))
            .send()
            .map_err(|e| match LlmError::from_transport(e, self.config.probe_timeout_secs) {
                LlmError::Communication(msg) => LlmError::Unreachable(msg),
                other => other,
            })?;

        if !response.status().is_success() {
            return Err(LlmError::Unreachable(format!(
                "Ollama not responding (HTTP {})",
                response.status()
            )));
        }

        let tags: OllamaTagsResponse = response
            .json()
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse tags: {}", e)))?;

        let models: Vec<String> = tags.models.into_iter().map(|m| m.name).collect();
        let selected = self
            .select_model(&models)
            .ok_or_else(|| LlmError::ModelNotAvailable("no models installed in Ollama".to_string()))?;

        info!("Ollama available with {} models, using {}", models.len(), selected);
        *self.selected_model.lock().unwrap_or_else(PoisonError::into_inner) = Some(selected);

        Ok(models)
    }

    fn generate(&self, request: &GenerationRequest) -> Result<Generation, Self::Error> {
        let url = format!("{}/api/generate", self.config.endpoint);
        let model = self.current_model();

        let body = OllamaGenerateRequest {
            model: &model,
            prompt: Self::build_prompt(request),
            stream: false,
            options: OllamaOptions {
                temperature: 0.0,
                top_p: 0.8,
                num_predict: self.config.max_output_tokens,
                stop: Vec::new(),
            },
        };

        debug!("Ollama request to {} with model {}", url, model);

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| LlmError::from_transport(e, self.config.timeout_secs))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(LlmError::ModelNotAvailable(model));
        }
        if !status.is_success() {
            let error_text = response.text().unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LlmError::Communication(format!("HTTP {}: {}", status, error_text)));
        }

        let parsed: OllamaGenerateResponse = response
            .json()
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        debug!("Ollama response length: {} chars", parsed.response.len());

        Ok(Generation {
            text: parsed.response,
            model,
        })
    }
}
