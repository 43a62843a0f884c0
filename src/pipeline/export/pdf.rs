//! PDF export: pagination plan + lopdf serialisation.
//!
//! Rendering is split in two so the page layout can be tested without parsing
//! PDF bytes:
//!
//! 1. [`PdfLayout::plan`] wraps every input line to the usable width and
//!    assigns each wrapped line to a page and a baseline. Pure and
//!    deterministic.
//! 2. [`render_pdf`] turns the plan into a PDF with one content stream per
//!    page.
//!
//! ## Page geometry (US Letter, points)
//!
//! ```text
//! 792 ┬──────────────────────────────┐
//! 742 │  TITLE (Helvetica-Bold 16)   │  ← also first baseline of a continuation page
//! 712 │  body (Helvetica 12) …       │  ← first baseline below a title
//!     │  … 15 pt per wrapped line,   │
//!     │    +5 pt after each input line│
//!  50 │  ← bottom margin             │
//!   0 └──────────────────────────────┘
//!     50                          562
//! ```

use crate::config::Language;
use crate::error::QuizError;
use crate::output::QuizSections;
use crate::pipeline::export::metrics::{encode_win_ansi, text_width};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use serde::Serialize;
use tracing::debug;

pub const PAGE_WIDTH: i64 = 612;
pub const PAGE_HEIGHT: i64 = 792;
pub const MARGIN: i64 = 50;
pub const TITLE_SIZE: i64 = 16;
pub const BODY_SIZE: i64 = 12;
pub const LINE_HEIGHT: i64 = 15;
pub const PARAGRAPH_GAP: i64 = 5;

const TITLE_BASELINE: i64 = PAGE_HEIGHT - 50;
const BODY_START: i64 = PAGE_HEIGHT - 80;
const CONTINUATION_START: i64 = PAGE_HEIGHT - 50;
const BOTTOM_MARGIN: i64 = 50;

/// Width available to body text.
pub fn usable_width() -> f32 {
    (PAGE_WIDTH - 2 * MARGIN) as f32
}

/// Which half of the quiz a page belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SectionKind {
    Exam,
    AnswerKey,
}

/// One wrapped line with its baseline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlacedLine {
    pub y: i64,
    pub text: String,
}

/// One output page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PdfPage {
    pub section: SectionKind,
    /// Present on the first page of a section only.
    pub title: Option<String>,
    pub lines: Vec<PlacedLine>,
}

/// The full pagination of an export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PdfLayout {
    pub pages: Vec<PdfPage>,
}

impl PdfLayout {
    /// Lay out both sections. The answer key always starts on a fresh page.
    pub fn plan(sections: &QuizSections, language: Language) -> Self {
        let mut p = Paginator::default();
        p.write_section(SectionKind::Exam, language.exam_heading(), &sections.exam);
        p.write_section(
            SectionKind::AnswerKey,
            language.answer_key_heading(),
            &sections.answer_key,
        );
        p.finish();
        PdfLayout { pages: p.pages }
    }

    /// Number of pages belonging to `section`.
    pub fn page_count(&self, section: SectionKind) -> usize {
        self.pages.iter().filter(|p| p.section == section).count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum WriterState {
    #[default]
    WritingSection,
    PageFull,
    Finished,
}

#[derive(Default)]
struct Paginator {
    pages: Vec<PdfPage>,
    y: i64,
    state: WriterState,
}

impl Paginator {
    fn write_section(&mut self, section: SectionKind, title: &str, text: &str) {
        debug_assert_ne!(self.state, WriterState::Finished);
        // Unconditional break: a section never shares a page with the previous one.
        self.pages.push(PdfPage {
            section,
            title: Some(title.to_string()),
            lines: Vec::new(),
        });
        self.y = BODY_START;
        self.state = WriterState::WritingSection;

        for line in text.split('\n') {
            for wrapped in wrap_line(line, BODY_SIZE as f32, usable_width()) {
                self.place(section, wrapped);
            }
            self.y -= PARAGRAPH_GAP;
        }
    }

    fn place(&mut self, section: SectionKind, text: String) {
        if self.y < BOTTOM_MARGIN {
            self.state = WriterState::PageFull;
        }
        if self.state == WriterState::PageFull {
            self.pages.push(PdfPage {
                section,
                title: None,
                lines: Vec::new(),
            });
            self.y = CONTINUATION_START;
            self.state = WriterState::WritingSection;
        }
        if let Some(page) = self.pages.last_mut() {
            page.lines.push(PlacedLine { y: self.y, text });
        }
        self.y -= LINE_HEIGHT;
    }

    fn finish(&mut self) {
        self.state = WriterState::Finished;
    }
}

/// Greedy word wrap of one input line to `max_width` points.
///
/// Runs of whitespace collapse to one space; a blank line yields no output
/// lines. A word wider than `max_width` is split between characters.
pub fn wrap_line(line: &str, size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in line.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if text_width(&candidate, size) <= max_width {
            current = candidate;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if text_width(word, size) <= max_width {
            current = word.to_string();
        } else {
            let mut pieces = split_long_word(word, size, max_width);
            current = pieces.pop().unwrap_or_default();
            lines.extend(pieces);
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn split_long_word(word: &str, size: f32, max_width: f32) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut piece = String::new();
    for c in word.chars() {
        piece.push(c);
        if text_width(&piece, size) > max_width && piece.chars().count() > 1 {
            piece.pop();
            pieces.push(std::mem::take(&mut piece));
            piece.push(c);
        }
    }
    if !piece.is_empty() {
        pieces.push(piece);
    }
    pieces
}

/// Serialise a [`PdfLayout`] to PDF bytes.
pub fn render_pdf(layout: &PdfLayout) -> Result<Vec<u8>, QuizError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let body_font = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let title_font = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => body_font,
            "F2" => title_font,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(layout.pages.len());
    for page in &layout.pages {
        let content = page_content(page)
            .encode()
            .map_err(|e| pdf_error(e.to_string()))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, content));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    let page_count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut buf = Vec::new();
    doc.save_to(&mut buf).map_err(|e| pdf_error(e.to_string()))?;
    debug!("PDF: {} pages, {} bytes", page_count, buf.len());
    Ok(buf)
}

fn page_content(page: &PdfPage) -> Content {
    let mut operations = Vec::new();
    if let Some(ref title) = page.title {
        push_text(&mut operations, "F2", TITLE_SIZE, TITLE_BASELINE, title);
    }
    for line in &page.lines {
        push_text(&mut operations, "F1", BODY_SIZE, line.y, &line.text);
    }
    Content { operations }
}

fn push_text(ops: &mut Vec<Operation>, font: &str, size: i64, y: i64, text: &str) {
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new("Tf", vec![font.into(), size.into()]));
    ops.push(Operation::new("Td", vec![MARGIN.into(), y.into()]));
    ops.push(Operation::new(
        "Tj",
        vec![Object::string_literal(encode_win_ansi(text))],
    ));
    ops.push(Operation::new("ET", vec![]));
}

fn pdf_error(detail: String) -> QuizError {
    QuizError::ExportFailed {
        format: "PDF".into(),
        detail,
    }
}
