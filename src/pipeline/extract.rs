//! Text extraction: [`SourceDocument`] → plain `String`.
//!
//! | Kind   | Strategy |
//! |--------|----------|
//! | `Text` | strict UTF-8 decode, leading BOM dropped |
//! | `Pdf`  | per-page text via lopdf, concatenated in page order |
//! | `Docx` | body paragraphs via docx-rs, one `\n` after each |
//!
//! A PDF page whose text cannot be extracted contributes an empty string:
//! scanned pages are common in otherwise readable documents and one of them
//! must not sink the whole upload.

use crate::error::QuizError;
use crate::pipeline::input::{DocumentKind, SourceDocument};
use docx_rs::{DocumentChild, Paragraph, ParagraphChild, Run, RunChild};
use tracing::{debug, warn};

const UTF8_BOM: &str = "\u{feff}";

/// Extract the plain text of `doc`.
pub fn extract_text(doc: &SourceDocument) -> Result<String, QuizError> {
    let text = match doc.kind {
        DocumentKind::Text => extract_plain(doc)?,
        DocumentKind::Pdf => extract_pdf(doc)?,
        DocumentKind::Docx => extract_docx(doc)?,
    };
    debug!(
        "Extracted {} chars from '{}' ({:?}, {} bytes)",
        text.chars().count(),
        doc.name,
        doc.kind,
        doc.bytes.len()
    );
    Ok(text)
}

/// Stop the pipeline when `text` is too short to quiz on.
///
/// Surrounding whitespace does not count. The text must be strictly longer
/// than `min_chars` characters.
pub fn ensure_sufficient(name: &str, text: &str, min_chars: usize) -> Result<(), QuizError> {
    let chars = text.trim().chars().count();
    if chars <= min_chars {
        return Err(QuizError::InsufficientContent {
            name: name.to_string(),
            chars,
            min: min_chars,
        });
    }
    Ok(())
}

fn unreadable(doc: &SourceDocument, detail: impl std::fmt::Display) -> QuizError {
    QuizError::UnreadableDocument {
        name: doc.name.clone(),
        detail: detail.to_string(),
    }
}

fn extract_plain(doc: &SourceDocument) -> Result<String, QuizError> {
    let text = std::str::from_utf8(&doc.bytes)
        .map_err(|e| unreadable(doc, format!("not valid UTF-8: {e}")))?;
    Ok(text.strip_prefix(UTF8_BOM).unwrap_or(text).to_string())
}

fn extract_pdf(doc: &SourceDocument) -> Result<String, QuizError> {
    if !doc.bytes.starts_with(b"%PDF") {
        let magic: Vec<u8> = doc.bytes.iter().take(4).copied().collect();
        return Err(unreadable(doc, format!("not a PDF (first bytes: {magic:?})")));
    }

    let pdf = lopdf::Document::load_mem(&doc.bytes).map_err(|e| unreadable(doc, e))?;
    let pages = pdf.get_pages();
    debug!("PDF '{}' has {} pages", doc.name, pages.len());

    let mut text = String::new();
    for (page_num, _) in pages {
        match pdf.extract_text(&[page_num]) {
            Ok(page_text) => text.push_str(&page_text),
            Err(e) => warn!("Page {} of '{}' has no extractable text: {}", page_num, doc.name, e),
        }
    }
    Ok(text)
}

fn extract_docx(doc: &SourceDocument) -> Result<String, QuizError> {
    if !doc.bytes.starts_with(b"PK") {
        return Err(unreadable(doc, "not a DOCX archive"));
    }

    let docx = docx_rs::read_docx(&doc.bytes).map_err(|e| unreadable(doc, format!("{e:?}")))?;

    let mut text = String::new();
    for child in &docx.document.children {
        if let DocumentChild::Paragraph(p) = child {
            push_paragraph(p, &mut text);
            text.push('\n');
        }
    }
    Ok(text)
}

fn push_paragraph(p: &Paragraph, out: &mut String) {
    for child in &p.children {
        push_paragraph_child(child, out);
    }
}

fn push_paragraph_child(child: &ParagraphChild, out: &mut String) {
    match child {
        ParagraphChild::Run(run) => push_run(run, out),
        ParagraphChild::Hyperlink(link) => {
            for c in &link.children {
                push_paragraph_child(c, out);
            }
        }
        _ => {}
    }
}

fn push_run(run: &Run, out: &mut String) {
    for c in &run.children {
        match c {
            RunChild::Text(t) => out.push_str(&t.text),
            RunChild::Tab(_) => out.push('\t'),
            RunChild::Break(_) => out.push('\n'),
            _ => {}
        }
    }
}
