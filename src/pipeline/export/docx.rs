use std::io::Cursor;

use docx_rs::{BreakType, Docx, Paragraph, Run, Style, StyleType};
use serde::Serialize;

use crate::config::Language;
use crate::error::QuizError;
use crate::output::QuizSections;

const TITLE_STYLE: &str = "Title";

/// A block of the Word document, in output order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Block {
    Heading(String),
    Paragraph(String),
    PageBreak,
}

/// Blocks for both sections: heading, one paragraph per non-empty line,
/// page break, heading, one paragraph per non-empty line.
pub fn document_blocks(sections: &QuizSections, language: Language) -> Vec<Block> {
    let mut blocks = vec![Block::Heading(language.exam_heading().to_string())];
    push_lines(&mut blocks, &sections.exam);
    blocks.push(Block::PageBreak);
    blocks.push(Block::Heading(language.answer_key_heading().to_string()));
    push_lines(&mut blocks, &sections.answer_key);
    blocks
}

fn push_lines(blocks: &mut Vec<Block>, text: &str) {
    blocks.extend(
        text.split('\n')
            .filter(|line| !line.trim().is_empty())
            .map(|line| Block::Paragraph(line.trim_end().to_string())),
    );
}

/// Pack `blocks` into a DOCX file.
pub fn render_docx(blocks: &[Block]) -> Result<Vec<u8>, QuizError> {
    let mut docx = Docx::new().add_style(
        Style::new(TITLE_STYLE, StyleType::Paragraph)
            .name("Title")
            .size(28 * 2) // OOXML uses half-points
            .bold(),
    );

    for block in blocks {
        let paragraph = match block {
            Block::Heading(text) => Paragraph::new()
                .style(TITLE_STYLE)
                .add_run(Run::new().add_text(text)),
            Block::Paragraph(text) => Paragraph::new().add_run(Run::new().add_text(text)),
            Block::PageBreak => Paragraph::new().add_run(Run::new().add_break(BreakType::Page)),
        };
        docx = docx.add_paragraph(paragraph);
    }

    let mut buf = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buf)
        .map_err(|e| QuizError::ExportFailed {
            format: "DOCX".into(),
            detail: e.to_string(),
        })?;

    Ok(buf.into_inner())
}
