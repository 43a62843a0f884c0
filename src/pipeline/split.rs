//! Sentinel splitting: one response → exam section + answer-key section.

use crate::config::Language;
use crate::output::{QuizSections, Separation};
use crate::prompts::SENTINEL;

/// Split a normalised response at the first occurrence of [`SENTINEL`].
///
/// Text before the sentinel is the exam, text after it the answer key; both
/// are trimmed. A second sentinel, if the model wrote one, stays inside the
/// answer key. Without a sentinel the whole response becomes the exam and the
/// answer key is the language's placeholder, flagged [`Separation::Missing`].
pub fn split_sections(response: &str, language: Language) -> QuizSections {
    match response.split_once(SENTINEL) {
        Some((exam, answer_key)) => QuizSections {
            exam: exam.trim().to_string(),
            answer_key: answer_key.trim().to_string(),
            separation: Separation::Separated,
        },
        None => QuizSections {
            exam: response.trim().to_string(),
            answer_key: language.separation_placeholder().to_string(),
            separation: Separation::Missing,
        },
    }
}
