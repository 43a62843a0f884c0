//! Pipeline stages for quiz generation.
//!
//! Each submodule implements exactly one transformation step and depends only
//! on the previous step's output.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ generate ──▶ postprocess ──▶ split ──▶ export
//! (path/URL) (text)     (LLM)        (cleanup)       (sentinel) (DOCX/PDF)
//! ```
//!
//! 1. [`input`]       — read a local file or download a URL; derive the kind
//! 2. [`extract`]     — plain text from TXT, PDF or DOCX
//! 3. [`generate`]    — one prompt, one response; the only stage with network I/O
//! 4. [`postprocess`] — normalise the response so the sentinel is findable
//! 5. [`split`]       — exam / answer key at the sentinel
//! 6. [`export`]      — paginated DOCX or PDF

pub mod export;
pub mod extract;
pub mod generate;
pub mod input;
pub mod postprocess;
pub mod split;
