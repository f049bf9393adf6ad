//! Tiered classification orchestrator

use crate::config::ClassifierConfig;
use crate::error::ClassifierError;
use crate::patterns::PatternClassifier;
use crate::prompt::{truncate_chars, PromptBuilder};
use carbonlens_domain::traits::{GenerationBackend, GenerationRequest, TextClassifier};
use carbonlens_domain::{ClassificationResult, ClassificationTier};
use carbonlens_llm::{LlmError, OllamaBackend, OpenAiBackend};
use carbonlens_normalizer::{normalize, NormalizerConfig};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info, warn};

/// A generation backend usable as a model tier
pub type DynBackend = Box<dyn GenerationBackend<Error = LlmError> + Send + Sync>;

/// Where the orchestrator is in its fallback chain
#[derive(Debug)]
enum TierState {
    NotStarted,
    TryingLocal,
    TryingCloud,
    TryingPatterns,
    Done(Box<ClassificationResult>),
}

/// Outcome of one tier attempt, recorded in result metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierAttempt {
    /// Tier tried
    pub tier: ClassificationTier,
    /// Backend name, or `none` when the tier is not configured
    pub backend: String,
    /// `skipped`, `unreachable`, `generation_failed`, `invalid_output` or `succeeded`
    pub outcome: &'static str,
    /// Failure detail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Liveness of one tier, for diagnostics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierAvailability {
    /// Tier
    pub tier: ClassificationTier,
    /// Backend name (`patterns` for the pattern tier)
    pub backend: String,
    /// Whether the tier would be tried and is answering
    pub available: bool,
    /// Models the backend reported
    pub models: Vec<String>,
    /// Why the tier is unavailable
    pub error: Option<String>,
}

/// Classification orchestrator
///
/// Tries the local model, then the cloud model, then pattern matching. Model
/// tiers fail over on any error, including output the normalizer rejects.
/// There are no retries within a tier.
pub struct Classifier {
    config: ClassifierConfig,
    normalizer: NormalizerConfig,
    local: Option<DynBackend>,
    cloud: Option<DynBackend>,
    patterns: PatternClassifier,
}

impl Classifier {
    /// Create a classifier with no model tiers attached
    pub fn new(config: ClassifierConfig) -> Self {
        let normalizer = config.normalizer();
        Self {
            config,
            normalizer,
            local: None,
            cloud: None,
            patterns: PatternClassifier::new(),
        }
    }

    /// Create a classifier with the backends the config describes
    ///
    /// The cloud tier is attached only when its credential is present.
    pub fn from_config(config: ClassifierConfig) -> Result<Self, ClassifierError> {
        config.validate().map_err(ClassifierError::Config)?;

        let local = config.local.clone();
        let cloud = config.cloud.clone();
        let mut classifier = Self::new(config);

        if let Some(local) = local {
            classifier = classifier.with_local(OllamaBackend::new(local)?);
        }
        match cloud {
            Some(cloud) if cloud.has_credential() => {
                classifier = classifier.with_cloud(OpenAiBackend::new(cloud)?);
            }
            Some(_) => info!("cloud tier configured without credential, disabled"),
            None => {}
        }

        Ok(classifier)
    }

    /// Attach the local model tier
    pub fn with_local(
        mut self,
        backend: impl GenerationBackend<Error = LlmError> + Send + Sync + 'static,
    ) -> Self {
        self.local = Some(Box::new(backend));
        self
    }

    /// Attach the cloud model tier
    pub fn with_cloud(
        mut self,
        backend: impl GenerationBackend<Error = LlmError> + Send + Sync + 'static,
    ) -> Self {
        self.cloud = Some(Box::new(backend));
        self
    }

    /// The configuration in use
    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Classify one text; never fails
    pub fn classify(&self, text: &str, supplier_hint: Option<&str>) -> ClassificationResult {
        let text = truncate_chars(text, self.config.max_text_length);
        let request = PromptBuilder::new(text).with_supplier_hint(supplier_hint).build();
        let mut attempts = Vec::new();
        let mut state = TierState::NotStarted;

        loop {
            state = match state {
                TierState::NotStarted => TierState::TryingLocal,
                TierState::TryingLocal => self
                    .try_model(self.local.as_ref(), ClassificationTier::LocalModel, &request, &mut attempts)
                    .map_or(TierState::TryingCloud, |r| TierState::Done(Box::new(r))),
                TierState::TryingCloud => self
                    .try_model(self.cloud.as_ref(), ClassificationTier::CloudModel, &request, &mut attempts)
                    .map_or(TierState::TryingPatterns, |r| TierState::Done(Box::new(r))),
                TierState::TryingPatterns => {
                    if attempts.iter().any(|a: &TierAttempt| a.outcome != "skipped") {
                        warn!("model tiers failed, falling back to pattern matching");
                    }
                    attempts.push(TierAttempt {
                        tier: ClassificationTier::Patterns,
                        backend: "patterns".to_string(),
                        outcome: "succeeded",
                        error: None,
                    });
                    TierState::Done(Box::new(self.patterns.classify(text, supplier_hint)))
                }
                TierState::Done(result) => {
                    return (*result).with_metadata("tier_attempts", json!(attempts));
                }
            };
        }
    }

    /// Classify many texts in order
    ///
    /// `supplier_hints` may be shorter than `texts`; missing hints are `None`.
    pub fn classify_many<S: AsRef<str>>(
        &self,
        texts: &[S],
        supplier_hints: &[Option<&str>],
    ) -> Vec<ClassificationResult> {
        texts
            .iter()
            .enumerate()
            .map(|(i, text)| {
                let hint = supplier_hints.get(i).copied().flatten();
                self.classify(text.as_ref(), hint)
            })
            .collect()
    }

    /// Probe every tier without classifying anything
    pub fn tier_availability(&self) -> Vec<TierAvailability> {
        let mut report = Vec::with_capacity(3);

        for (tier, backend) in [
            (ClassificationTier::LocalModel, &self.local),
            (ClassificationTier::CloudModel, &self.cloud),
        ] {
            report.push(match backend {
                None => TierAvailability {
                    tier,
                    backend: "none".to_string(),
                    available: false,
                    models: Vec::new(),
                    error: Some("not configured".to_string()),
                },
                Some(backend) => match backend.probe() {
                    Ok(models) => TierAvailability {
                        tier,
                        backend: backend.name().to_string(),
                        available: true,
                        models,
                        error: None,
                    },
                    Err(e) => TierAvailability {
                        tier,
                        backend: backend.name().to_string(),
                        available: false,
                        models: Vec::new(),
                        error: Some(e.to_string()),
                    },
                },
            });
        }

        report.push(TierAvailability {
            tier: ClassificationTier::Patterns,
            backend: "patterns".to_string(),
            available: true,
            models: vec![crate::patterns::MODEL_TAG.to_string()],
            error: None,
        });

        report
    }

    fn try_model(
        &self,
        backend: Option<&DynBackend>,
        tier: ClassificationTier,
        request: &GenerationRequest,
        attempts: &mut Vec<TierAttempt>,
    ) -> Option<ClassificationResult> {
        let Some(backend) = backend else {
            attempts.push(TierAttempt {
                tier,
                backend: "none".to_string(),
                outcome: "skipped",
                error: None,
            });
            return None;
        };

        let name = backend.name().to_string();
        let mut fail = |outcome: &'static str, error: String| -> Option<ClassificationResult> {
            warn!("{} tier ({}) {}: {}", tier, name, outcome, error);
            attempts.push(TierAttempt {
                tier,
                backend: name.clone(),
                outcome,
                error: Some(error),
            });
            None
        };

        if let Err(e) = backend.probe() {
            return fail("unreachable", e.to_string());
        }

        debug!("{} tier prompt length: {} chars", tier, request.prompt.len());

        let generation = match backend.generate(request) {
            Ok(generation) => generation,
            Err(e) => return fail("generation_failed", e.to_string()),
        };

        let payload = match normalize(&generation.text, &self.normalizer) {
            Ok(payload) => payload,
            Err(e) => return fail("invalid_output", e.to_string()),
        };

        let model_used = format!("{}:{}", name, generation.model);
        info!(
            "classified via {} with confidence {}",
            model_used, payload.confidence_score
        );

        attempts.push(TierAttempt {
            tier,
            backend: name.clone(),
            outcome: "succeeded",
            error: None,
        });

        Some(
            ClassificationResult::success(
                payload.fields,
                payload.confidence_score,
                payload.needs_human_review,
                model_used,
                tier,
            )
            .with_metadata("extraction_method", json!(name))
            .with_metadata("raw_response", json!(generation.text))
            .with_metadata("repairs", json!(payload.repairs))
            .with_metadata("truncated", json!(payload.truncated))
            .with_metadata("confidence_reported", json!(payload.confidence_reported)),
        )
    }
}

impl TextClassifier for Classifier {
    fn classify(&self, text: &str, supplier_hint: Option<&str>) -> ClassificationResult {
        Classifier::classify(self, text, supplier_hint)
    }
}
