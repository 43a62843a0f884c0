//! Export: [`QuizSections`] → downloadable [`ExportArtifact`].
//!
//! Both renderers produce a complete in-memory buffer. The answer key always
//! starts on a new page: the Word renderer inserts an explicit page break,
//! the PDF renderer opens a fresh page for each section.

pub mod docx;
pub mod metrics;
pub mod pdf;

use crate::config::{ExportFormat, Language, QuizConfig};
use crate::error::QuizError;
use crate::output::{ExportArtifact, QuizSections};
use tracing::info;

/// Default download name, without extension.
pub const DEFAULT_BASE_NAME: &str = "Exam_Complete";

/// How exported files are named and labelled.
#[derive(Debug, Clone)]
pub struct ExportSettings {
    /// File name without extension. Default: `Exam_Complete`.
    pub base_name: String,
    /// Language of the section headings.
    pub language: Language,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            base_name: DEFAULT_BASE_NAME.to_string(),
            language: Language::default(),
        }
    }
}

impl ExportSettings {
    /// Settings using the configuration's language and the default name.
    pub fn for_config(config: &QuizConfig) -> Self {
        Self {
            language: config.language,
            ..Self::default()
        }
    }

    pub fn base_name(mut self, name: impl Into<String>) -> Self {
        self.base_name = name.into();
        self
    }
}

/// Render `sections` as `format`.
pub fn export(
    sections: &QuizSections,
    format: ExportFormat,
    settings: &ExportSettings,
) -> Result<ExportArtifact, QuizError> {
    let bytes = match format {
        ExportFormat::Docx => docx::render_docx(&docx::document_blocks(sections, settings.language))?,
        ExportFormat::Pdf => pdf::render_pdf(&pdf::PdfLayout::plan(sections, settings.language))?,
    };

    let file_name = format.file_name(&settings.base_name);
    info!("Exported {} ({} bytes)", file_name, bytes.len());

    Ok(ExportArtifact {
        format,
        file_name,
        mime_type: format.mime_type(),
        bytes,
    })
}
