//! Result types produced by the pipeline.

use crate::config::ExportFormat;
use serde::{Deserialize, Serialize};

/// Whether the response could be split at the sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Separation {
    /// The sentinel was found; the answer key is the model's own.
    Separated,
    /// No sentinel; the answer key is a placeholder.
    Missing,
}

/// The two halves of a generated quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizSections {
    pub exam: String,
    pub answer_key: String,
    pub separation: Separation,
}

impl QuizSections {
    /// Sections for an already-split quiz.
    pub fn new(exam: impl Into<String>, answer_key: impl Into<String>) -> Self {
        Self {
            exam: exam.into(),
            answer_key: answer_key.into(),
            separation: Separation::Separated,
        }
    }

    pub fn is_separated(&self) -> bool {
        self.separation == Separation::Separated
    }
}

/// Figures collected while preparing one quiz.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuizStats {
    /// Characters extracted from the source document.
    pub extracted_chars: usize,
    /// Characters actually sent after truncation.
    pub sent_chars: usize,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub extract_duration_ms: u64,
    pub generate_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Output of [`crate::quiz::prepare_quiz`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizOutput {
    /// Name of the source document, as uploaded.
    pub source_name: String,
    pub sections: QuizSections,
    pub stats: QuizStats,
}

/// A rendered document, fully materialised in memory.
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub format: ExportFormat,
    /// Deterministic download name, e.g. `Exam_Complete.pdf`.
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

impl ExportArtifact {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
