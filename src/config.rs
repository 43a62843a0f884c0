//! Configuration types for quiz generation and export.
//!
//! Every knob of a run lives in [`QuizConfig`], built via its
//! [`QuizConfigBuilder`]. Per-request user choices (how many questions, how
//! hard) are kept apart in [`GenerationOptions`], which is validated against
//! the configured bounds once and is immutable afterwards.

use crate::error::QuizError;
use crate::pipeline::generate::QuizBackend;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::sync::Arc;

/// Configuration for one quiz-generation pipeline.
///
/// Built via [`QuizConfig::builder()`] or using [`QuizConfig::default()`].
///
/// # Example
/// ```rust
/// use examenmatic::{Language, QuizConfig};
///
/// let config = QuizConfig::builder()
///     .model("gemini-2.0-flash")
///     .language(Language::Spanish)
///     .max_input_chars(8_000)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct QuizConfig {
    /// LLM model identifier, e.g. "gemini-2.0-flash", "gpt-4.1-mini".
    /// If None, uses the provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "gemini", "openai", "anthropic").
    /// If None along with `provider` and `backend`, the provider is
    /// auto-detected from the environment.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Pre-constructed generation backend. Takes precedence over everything
    /// else; tests use it to script responses.
    pub backend: Option<Arc<dyn QuizBackend>>,

    /// Sampling temperature. Default: 0.7.
    ///
    /// Question writing benefits from some variety; answers are still anchored
    /// to the supplied text by the prompt.
    pub temperature: f32,

    /// Maximum tokens the model may generate. Default: 8192.
    ///
    /// Twenty questions with justified answers run to roughly 3 000 tokens;
    /// the headroom avoids an answer key cut off mid-sentence.
    pub max_tokens: usize,

    /// Character budget for the document text sent to the model. Default: 12 000.
    ///
    /// Longer texts are cut to their prefix before the prompt is built. The cut
    /// is silent towards the user but deterministic and logged at debug level.
    pub max_input_chars: usize,

    /// Minimum extracted characters required to call the model. Default: 50.
    ///
    /// A document at or below this size stops with
    /// [`QuizError::InsufficientContent`] and the model is never called.
    pub min_content_chars: usize,

    /// Smallest question count a request may ask for. Default: 5.
    pub min_questions: u32,

    /// Largest question count a request may ask for. Default: 20.
    pub max_questions: u32,

    /// Language of the prompt, headings and placeholders. Default: English.
    pub language: Language,

    /// Treat a response without the sentinel as an error. Default: false.
    ///
    /// When false the whole response becomes the exam and the answer key is a
    /// placeholder; the result is flagged as [`crate::output::Separation::Missing`].
    pub strict_separation: bool,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Optional progress callback for stage events. Default: None.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            backend: None,
            temperature: 0.7,
            max_tokens: 8192,
            max_input_chars: 12_000,
            min_content_chars: 50,
            min_questions: 5,
            max_questions: 20,
            language: Language::default(),
            strict_separation: false,
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for QuizConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("backend", &self.backend.as_ref().map(|_| "<dyn QuizBackend>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_input_chars", &self.max_input_chars)
            .field("min_content_chars", &self.min_content_chars)
            .field("questions", &self.question_range())
            .field("language", &self.language)
            .field("strict_separation", &self.strict_separation)
            .finish()
    }
}

impl QuizConfig {
    /// Create a new builder for `QuizConfig`.
    pub fn builder() -> QuizConfigBuilder {
        QuizConfigBuilder {
            config: Self::default(),
        }
    }

    /// Allowed question counts, inclusive.
    pub fn question_range(&self) -> RangeInclusive<u32> {
        self.min_questions..=self.max_questions
    }

    /// Build validated [`GenerationOptions`] for this configuration.
    pub fn options(
        &self,
        question_count: u32,
        difficulty: Difficulty,
    ) -> Result<GenerationOptions, QuizError> {
        GenerationOptions::bounded(question_count, difficulty, self.question_range())
    }
}

/// Builder for [`QuizConfig`].
#[derive(Debug)]
pub struct QuizConfigBuilder {
    config: QuizConfig,
}

impl QuizConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn backend(mut self, backend: Arc<dyn QuizBackend>) -> Self {
        self.config.backend = Some(backend);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_input_chars(mut self, n: usize) -> Self {
        self.config.max_input_chars = n;
        self
    }

    pub fn min_content_chars(mut self, n: usize) -> Self {
        self.config.min_content_chars = n;
        self
    }

    pub fn question_range(mut self, min: u32, max: u32) -> Self {
        self.config.min_questions = min;
        self.config.max_questions = max;
        self
    }

    pub fn language(mut self, language: Language) -> Self {
        self.config.language = language;
        self
    }

    pub fn strict_separation(mut self, v: bool) -> Self {
        self.config.strict_separation = v;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<QuizConfig, QuizError> {
        let c = &self.config;
        if c.min_questions == 0 {
            return Err(QuizError::InvalidConfig(
                "Minimum question count must be ≥ 1".into(),
            ));
        }
        if c.min_questions > c.max_questions {
            return Err(QuizError::InvalidConfig(format!(
                "Question range {}–{} is empty",
                c.min_questions, c.max_questions
            )));
        }
        if c.max_input_chars <= c.min_content_chars {
            return Err(QuizError::InvalidConfig(format!(
                "max_input_chars ({}) must exceed min_content_chars ({})",
                c.max_input_chars, c.min_content_chars
            )));
        }
        if c.max_tokens == 0 {
            return Err(QuizError::InvalidConfig("max_tokens must be ≥ 1".into()));
        }
        Ok(self.config)
    }
}

// ── Request options ──────────────────────────────────────────────────────

/// How hard the generated questions should be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Intermediate,
    Hard,
}

impl Difficulty {
    /// The label inserted into the prompt for the given language.
    pub fn label(self, language: Language) -> &'static str {
        match (language, self) {
            (Language::English, Difficulty::Easy) => "easy",
            (Language::English, Difficulty::Intermediate) => "intermediate",
            (Language::English, Difficulty::Hard) => "hard",
            (Language::Spanish, Difficulty::Easy) => "Fácil",
            (Language::Spanish, Difficulty::Intermediate) => "Intermedio",
            (Language::Spanish, Difficulty::Hard) => "Difícil",
        }
    }
}

/// The user's choices for one generation request.
///
/// Only constructible through [`GenerationOptions::bounded`] (or
/// [`QuizConfig::options`]), so a value in hand always has a question count
/// inside the configured range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GenerationOptions {
    question_count: u32,
    difficulty: Difficulty,
}

impl GenerationOptions {
    /// Validate `question_count` against `range` and freeze the options.
    pub fn bounded(
        question_count: u32,
        difficulty: Difficulty,
        range: RangeInclusive<u32>,
    ) -> Result<Self, QuizError> {
        if !range.contains(&question_count) {
            return Err(QuizError::InvalidConfig(format!(
                "Question count must be {}–{}, got {}",
                range.start(),
                range.end(),
                question_count
            )));
        }
        Ok(Self {
            question_count,
            difficulty,
        })
    }

    pub fn question_count(&self) -> u32 {
        self.question_count
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Language used for the prompt, the section headings and the placeholder.
///
/// The sentinel itself is the same in every language so the splitter does
/// not depend on what the model was asked in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    English,
    Spanish,
}

impl Language {
    /// Heading of the first section.
    pub fn exam_heading(self) -> &'static str {
        match self {
            Language::English => "EXAM",
            Language::Spanish => "EXAMEN",
        }
    }

    /// Heading of the second section.
    pub fn answer_key_heading(self) -> &'static str {
        match self {
            Language::English => "ANSWER KEY",
            Language::Spanish => "SOLUCIONARIO",
        }
    }

    /// Answer-key text used when the response could not be split.
    pub fn separation_placeholder(self) -> &'static str {
        match self {
            Language::English => "Error separating answers.",
            Language::Spanish => "Error separando respuestas.",
        }
    }
}

/// Output document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Office Open XML word-processing document.
    Docx,
    /// Portable Document Format.
    Pdf,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 2] = [ExportFormat::Docx, ExportFormat::Pdf];

    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            ExportFormat::Pdf => "application/pdf",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Docx => "docx",
            ExportFormat::Pdf => "pdf",
        }
    }

    /// Deterministic download name: `<base>.<extension>`.
    pub fn file_name(self, base: &str) -> String {
        format!("{}.{}", base, self.extension())
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Docx => f.write_str("DOCX"),
            ExportFormat::Pdf => f.write_str("PDF"),
        }
    }
}
