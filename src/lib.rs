//! # examenmatic
//!
//! Turn a document into a multiple-choice exam with a separate answer key.
//!
//! ## Why this crate?
//!
//! Teachers already have the reading material: lecture notes, a chapter as
//! PDF, a Word handout. This crate pulls the text out of it, asks an LLM for
//! a numbered quiz in one call, and splits the reply at a fixed marker so the
//! questions and the answers land on different pages of the exported file.
//! Students get the first page; the answer key stays behind the page break.
//!
//! ## Pipeline Overview
//!
//! ```text
//! TXT / PDF / DOCX
//!  │
//!  ├─ 1. Guard     passcode check (optional)
//!  ├─ 2. Input     resolve local file or download from URL
//!  ├─ 3. Extract   plain text (CPU-bound, spawn_blocking)
//!  ├─ 4. Check     reject text shorter than 50 characters
//!  ├─ 5. Generate  one prompt → gemini / gpt / claude / …
//!  ├─ 6. Split     exam | ---SOLUCIONARIO--- | answer key
//!  └─ 7. Export    DOCX with page break, PDF with fresh page per section
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use examenmatic::{
//!     export_quiz, prepare_quiz_from_input, Difficulty, ExportFormat, ExportSettings,
//!     OpenAccess, QuizConfig, RequestContext,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from GEMINI_API_KEY / OPENAI_API_KEY / …
//!     let config = QuizConfig::default();
//!     let options = config.options(10, Difficulty::Hard)?;
//!     let ctx = RequestContext::new();
//!
//!     let quiz = prepare_quiz_from_input(&ctx, &OpenAccess, "notes.pdf", &options, &config).await?;
//!     println!("{}", quiz.sections.exam);
//!
//!     let settings = ExportSettings::for_config(&config);
//!     for artifact in export_quiz(&quiz, &ExportFormat::ALL, &settings, &config)? {
//!         std::fs::write(&artifact.file_name, &artifact.bytes)?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `examenmatic` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! examenmatic = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod context;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod quiz;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    Difficulty, ExportFormat, GenerationOptions, Language, QuizConfig, QuizConfigBuilder,
};
pub use context::{AccessGuard, OpenAccess, PasscodeGuard, RequestContext, SessionState};
pub use error::QuizError;
pub use output::{ExportArtifact, QuizOutput, QuizSections, QuizStats, Separation};
pub use pipeline::export::ExportSettings;
pub use pipeline::generate::{GenerationResult, LlmBackend, QuizBackend};
pub use pipeline::input::{DocumentKind, SourceDocument};
pub use progress::{NoopProgressCallback, PipelineProgressCallback, ProgressCallback, Stage};
pub use prompts::SENTINEL;
pub use quiz::{export_quiz, prepare_quiz, prepare_quiz_from_input, prepare_quiz_sync, write_artifact};
