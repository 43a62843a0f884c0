//! Generation: extracted text + options → one model response.
//!
//! This is the only stage with network I/O. It is intentionally thin: the
//! wording lives in [`crate::prompts`], the splitting in
//! [`crate::pipeline::split`].
//!
//! The model is reached through the [`QuizBackend`] trait so the pipeline can
//! run against any edgequake-llm provider ([`LlmBackend`]) or a scripted
//! backend in tests. A backend reports failure through the `Err` arm, never by
//! embedding an error message in the response text.
//!
//! There is exactly one round trip per request: no retry, no streaming, and no
//! timeout beyond the transport's own.

use crate::config::{GenerationOptions, QuizConfig};
use crate::error::QuizError;
use crate::prompts::build_prompt;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Default model when a provider is picked without an explicit model.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4.1-mini";

/// The raw model response plus usage figures.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerationResult {
    /// Response text, expected to contain the sentinel line.
    pub text: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub duration_ms: u64,
}

impl GenerationResult {
    /// A result carrying only text, with zeroed usage.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// A text-generation service reachable with a single prompt.
#[async_trait]
pub trait QuizBackend: Send + Sync {
    /// Send `prompt` and wait for the whole response.
    ///
    /// `Err` carries the service's own error message.
    async fn complete(&self, prompt: &str) -> Result<GenerationResult, String>;
}

/// [`QuizBackend`] over an edgequake-llm provider.
pub struct LlmBackend {
    provider: Arc<dyn LLMProvider>,
    temperature: f32,
    max_tokens: usize,
}

impl LlmBackend {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &QuizConfig) -> Self {
        Self {
            provider,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    fn options(&self) -> CompletionOptions {
        CompletionOptions {
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            ..Default::default()
        }
    }
}

#[async_trait]
impl QuizBackend for LlmBackend {
    async fn complete(&self, prompt: &str) -> Result<GenerationResult, String> {
        let start = Instant::now();
        let messages = vec![ChatMessage::user(prompt)];
        let options = self.options();

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| format!("{e}"))?;

        Ok(GenerationResult {
            text: response.content,
            input_tokens: response.prompt_tokens as u64,
            output_tokens: response.completion_tokens as u64,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}

/// Cut `text` to at most `max_chars` characters, keeping the prefix.
///
/// Always cuts on a char boundary; returns `text` unchanged when it fits.
pub fn truncate_to_budget(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Build the prompt for `text` and run one round trip on `backend`.
pub async fn generate(
    backend: &dyn QuizBackend,
    text: &str,
    options: &GenerationOptions,
    config: &QuizConfig,
) -> Result<GenerationResult, QuizError> {
    let budgeted = truncate_to_budget(text, config.max_input_chars);
    if budgeted.len() < text.len() {
        debug!(
            "Input truncated to {} of {} chars",
            config.max_input_chars,
            text.chars().count()
        );
    }

    let prompt = build_prompt(budgeted, options, config.language);
    info!(
        "Requesting {} {:?} questions ({} prompt chars)",
        options.question_count(),
        options.difficulty(),
        prompt.chars().count()
    );

    let result = backend
        .complete(&prompt)
        .await
        .map_err(|message| QuizError::GenerationFailed { message })?;

    if result.text.trim().is_empty() {
        return Err(QuizError::GenerationFailed {
            message: "the service returned an empty response".into(),
        });
    }

    debug!(
        "Generation: {} input tokens, {} output tokens, {}ms",
        result.input_tokens, result.output_tokens, result.duration_ms
    );
    Ok(result)
}

/// Resolve the generation backend, from most-specific to least-specific.
///
/// 1. **Pre-built backend** (`config.backend`), used as-is.
/// 2. **Pre-built provider** (`config.provider`), wrapped in [`LlmBackend`].
/// 3. **Named provider** (`config.provider_name`) + optional model.
/// 4. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`).
/// 5. **Gemini key** (`GEMINI_API_KEY` or `GOOGLE_API_KEY`) → Gemini.
/// 6. **OpenAI key** (`OPENAI_API_KEY`) → OpenAI.
/// 7. **Full auto-detection** (`ProviderFactory::from_env`).
pub fn resolve_backend(config: &QuizConfig) -> Result<Arc<dyn QuizBackend>, QuizError> {
    if let Some(ref backend) = config.backend {
        return Ok(Arc::clone(backend));
    }

    let provider = resolve_provider(config)?;
    Ok(Arc::new(LlmBackend::new(provider, config)))
}

fn resolve_provider(config: &QuizConfig) -> Result<Arc<dyn LLMProvider>, QuizError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        let model = config
            .model
            .as_deref()
            .unwrap_or_else(|| default_model_for(name));
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    if env_is_set("GEMINI_API_KEY") || env_is_set("GOOGLE_API_KEY") {
        let model = config.model.as_deref().unwrap_or(DEFAULT_GEMINI_MODEL);
        return create_provider("gemini", model);
    }

    if env_is_set("OPENAI_API_KEY") {
        let model = config.model.as_deref().unwrap_or(DEFAULT_OPENAI_MODEL);
        return create_provider("openai", model);
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| QuizError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set GEMINI_API_KEY, OPENAI_API_KEY, or ANTHROPIC_API_KEY.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, QuizError> {
    debug!("Creating provider '{}' with model '{}'", provider_name, model);
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        QuizError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

fn default_model_for(provider_name: &str) -> &'static str {
    match provider_name {
        "openai" | "azure" => DEFAULT_OPENAI_MODEL,
        _ => DEFAULT_GEMINI_MODEL,
    }
}

fn env_is_set(key: &str) -> bool {
    std::env::var(key).map(|v| !v.is_empty()).unwrap_or(false)
}
