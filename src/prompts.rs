//! Prompt template for quiz generation.
//!
//! All model-facing wording lives here so a change to the instructions is a
//! one-file edit and tests can inspect the exact text without calling a model.
//!
//! The response contract is: questions first, then a line holding exactly
//! [`SENTINEL`], then the answers with their justification. The splitter in
//! [`crate::pipeline::split`] relies on nothing else.

use crate::config::{GenerationOptions, Language};

/// Literal line separating the exam from the answer key in a response.
pub const SENTINEL: &str = "---SOLUCIONARIO---";

const ENGLISH_TEMPLATE: &str = r#"Act as an expert teacher.
1. Write {count} questions of {level} difficulty about the text below. Do NOT mark the correct answer here.
2. Write this exact line: "{sentinel}"
3. Write the correct answers, each with a short justification.
Text: {text}"#;

const SPANISH_TEMPLATE: &str = r#"Actúa como profesor experto.
1. Crea {count} preguntas de nivel {level} sobre el texto. NO marques la respuesta correcta aquí.
2. Escribe una línea exacta: "{sentinel}"
3. Escribe las respuestas correctas con justificación.
Texto: {text}"#;

/// Build the single instructional request sent to the model.
///
/// `text` must already be truncated to the configured budget; this function
/// inserts it verbatim.
pub fn build_prompt(text: &str, options: &GenerationOptions, language: Language) -> String {
    let template = match language {
        Language::English => ENGLISH_TEMPLATE,
        Language::Spanish => SPANISH_TEMPLATE,
    };
    // `{text}` goes last so braces inside the document cannot be mistaken
    // for placeholders.
    template
        .replace("{count}", &options.question_count().to_string())
        .replace("{level}", options.difficulty().label(language))
        .replace("{sentinel}", SENTINEL)
        .replace("{text}", text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Difficulty;

    fn opts(n: u32, d: Difficulty) -> GenerationOptions {
        GenerationOptions::bounded(n, d, 1..=50).unwrap()
    }

    #[test]
    fn prompt_carries_every_instruction() {
        let p = build_prompt("Photosynthesis converts light.", &opts(7, Difficulty::Hard), Language::English);
        assert!(p.starts_with("Act as an expert teacher."));
        assert!(p.contains("7 questions"));
        assert!(p.contains("hard difficulty"));
        assert!(p.contains("Do NOT mark the correct answer"));
        assert!(p.contains(&format!("\"{SENTINEL}\"")));
        assert!(p.contains("justification"));
        assert!(p.ends_with("Text: Photosynthesis converts light."));
    }

    #[test]
    fn spanish_prompt_uses_spanish_labels() {
        let p = build_prompt("texto", &opts(10, Difficulty::Easy), Language::Spanish);
        assert!(p.contains("Crea 10 preguntas de nivel Fácil"));
        assert!(p.contains(SENTINEL));
    }

    #[test]
    fn placeholders_in_document_text_are_left_alone() {
        let p = build_prompt("use {count} and {level}", &opts(5, Difficulty::Easy), Language::English);
        assert!(p.ends_with("Text: use {count} and {level}"));
    }
}
