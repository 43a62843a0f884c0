//! Error types for the examenmatic library.
//!
//! Every failure the pipeline can hit is a variant of [`QuizError`]. The
//! pipeline never panics and never retries: each error is returned at the
//! entry point so the host (CLI, web form, test) can show a message and let
//! the user try again.
//!
//! [`QuizError::SeparationFailed`] is special: by default a response without
//! the sentinel degrades to a placeholder answer key and is reported through
//! [`crate::output::Separation::Missing`]. It is only returned as an error when
//! [`crate::config::QuizConfig::strict_separation`] is enabled.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the examenmatic library.
#[derive(Debug, Error)]
pub enum QuizError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    // ── Extraction errors ─────────────────────────────────────────────────
    /// The file extension is not one of `txt`, `pdf`, `docx`.
    #[error("Unsupported file type '{name}': expected a .txt, .pdf or .docx file")]
    UnsupportedFileType { name: String },

    /// The file has a supported type but its content could not be read.
    #[error("Could not read '{name}': {detail}")]
    UnreadableDocument { name: String, detail: String },

    /// Too little text was extracted to build a meaningful quiz.
    #[error("Too little text in '{name}': {chars} characters (need more than {min})")]
    InsufficientContent { name: String, chars: usize, min: usize },

    // ── Generation errors ─────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The generation service returned an error or could not be reached.
    #[error("Quiz generation failed: {message}")]
    GenerationFailed { message: String },

    /// The response did not contain the answer-key sentinel.
    #[error("The response did not contain the '{sentinel}' marker; the answer key could not be separated")]
    SeparationFailed { sentinel: String },

    // ── Access errors ─────────────────────────────────────────────────────
    /// The request was rejected by the configured access guard.
    #[error("Access denied: {reason}")]
    AccessDenied { reason: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// The DOCX or PDF renderer failed to serialise the document.
    #[error("{format} export failed: {detail}")]
    ExportFailed { format: String, detail: String },

    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl QuizError {
    /// `true` for errors caused by the uploaded document rather than by the
    /// service or the environment. Hosts use this to phrase the message as
    /// "please upload another file".
    pub fn is_document_error(&self) -> bool {
        matches!(
            self,
            QuizError::UnsupportedFileType { .. }
                | QuizError::UnreadableDocument { .. }
                | QuizError::InsufficientContent { .. }
        )
    }
}
