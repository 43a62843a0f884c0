//! Integration tests for the whole quiz pipeline.
//!
//! Generation runs against a scripted [`QuizBackend`], so these tests need no
//! network and no API key. One live test at the bottom is gated behind
//! `E2E_ENABLED` and a Gemini or OpenAI key.
//!
//! Run with:
//!   cargo test --test pipeline -- --nocapture

use async_trait::async_trait;
use examenmatic::pipeline::extract::extract_text;
use examenmatic::{
    export_quiz, prepare_quiz, prepare_quiz_from_input, prepare_quiz_sync, write_artifact,
    Difficulty, ExportFormat, ExportSettings, GenerationOptions, GenerationResult, Language,
    OpenAccess, PasscodeGuard, PipelineProgressCallback, QuizBackend, QuizConfig, QuizError,
    RequestContext, Separation, SourceDocument, Stage,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ── Test helpers ─────────────────────────────────────────────────────────────

const NOTES: &str = "Photosynthesis converts light energy into chemical energy. \
It takes place in the chloroplasts of plant cells and releases oxygen as a by-product.";

const REPLY: &str = "1. Where does photosynthesis take place?\n\
a) Mitochondria\nb) Chloroplasts\nc) Nucleus\nd) Ribosome\n\
---SOLUCIONARIO---\n\
1. b) Chloroplasts: the text says it takes place in the chloroplasts.";

/// Backend that returns a fixed reply and counts its calls.
struct Scripted {
    reply: Result<String, String>,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

impl Scripted {
    fn ok(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(reply.to_string()),
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        })
    }

    fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(message.to_string()),
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuizBackend for Scripted {
    async fn complete(&self, prompt: &str) -> Result<GenerationResult, String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
        self.reply.clone().map(|text| GenerationResult {
            text,
            input_tokens: 120,
            output_tokens: 80,
            duration_ms: 1,
        })
    }
}

/// Records every progress event as a short string.
#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<String>>,
}

impl PipelineProgressCallback for Recorder {
    fn on_stage_start(&self, stage: Stage) {
        self.events.lock().unwrap().push(format!("start:{stage}"));
    }
    fn on_stage_complete(&self, stage: Stage, _detail: &str) {
        self.events.lock().unwrap().push(format!("done:{stage}"));
    }
    fn on_stage_error(&self, stage: Stage, _error: &str) {
        self.events.lock().unwrap().push(format!("error:{stage}"));
    }
    fn on_separation_missing(&self) {
        self.events.lock().unwrap().push("separation-missing".into());
    }
}

fn config_with(backend: Arc<Scripted>) -> QuizConfig {
    QuizConfig::builder()
        .backend(backend as Arc<dyn QuizBackend>)
        .build()
        .unwrap()
}

fn options(config: &QuizConfig) -> GenerationOptions {
    config.options(5, Difficulty::Intermediate).unwrap()
}

fn text_doc(text: &str) -> SourceDocument {
    SourceDocument::from_bytes("notes.txt", text.as_bytes().to_vec()).unwrap()
}

// ── Happy path ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn text_document_to_both_formats() {
    let backend = Scripted::ok(REPLY);
    let config = config_with(Arc::clone(&backend));
    let ctx = RequestContext::new();

    let quiz = prepare_quiz(&ctx, &OpenAccess, text_doc(NOTES), &options(&config), &config)
        .await
        .unwrap();

    assert_eq!(backend.calls(), 1);
    assert_eq!(quiz.source_name, "notes.txt");
    assert_eq!(quiz.sections.separation, Separation::Separated);
    assert!(quiz.sections.exam.starts_with("1. Where does photosynthesis"));
    assert!(quiz.sections.exam.ends_with("d) Ribosome"));
    assert!(quiz.sections.answer_key.starts_with("1. b) Chloroplasts"));
    assert_eq!(quiz.stats.extracted_chars, NOTES.chars().count());
    assert_eq!(quiz.stats.sent_chars, NOTES.chars().count());
    assert_eq!(quiz.stats.input_tokens, 120);

    let prompt = backend.last_prompt.lock().unwrap().clone().unwrap();
    assert!(prompt.contains("---SOLUCIONARIO---"));
    assert!(prompt.contains("chloroplasts of plant cells"));

    let artifacts = export_quiz(
        &quiz,
        &ExportFormat::ALL,
        &ExportSettings::for_config(&config),
        &config,
    )
    .unwrap();
    assert_eq!(artifacts.len(), 2);
    assert_eq!(artifacts[0].file_name, "Exam_Complete.docx");
    assert_eq!(artifacts[1].file_name, "Exam_Complete.pdf");
    assert!(artifacts.iter().all(|a| !a.is_empty()));
}

#[tokio::test]
async fn progress_events_follow_stage_order() {
    let recorder = Arc::new(Recorder::default());
    let config = QuizConfig::builder()
        .backend(Scripted::ok(REPLY) as Arc<dyn QuizBackend>)
        .progress_callback(Arc::clone(&recorder) as Arc<dyn PipelineProgressCallback>)
        .build()
        .unwrap();

    let quiz = prepare_quiz(
        &RequestContext::new(),
        &OpenAccess,
        text_doc(NOTES),
        &options(&config),
        &config,
    )
    .await
    .unwrap();
    export_quiz(&quiz, &[ExportFormat::Pdf], &ExportSettings::default(), &config).unwrap();

    let events = recorder.events.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![
            "start:extract",
            "done:extract",
            "start:generate",
            "done:generate",
            "start:export",
            "done:export",
        ]
    );
}

#[tokio::test]
async fn long_documents_are_truncated_before_sending() {
    let backend = Scripted::ok(REPLY);
    let config = QuizConfig::builder()
        .backend(Arc::clone(&backend) as Arc<dyn QuizBackend>)
        .max_input_chars(500)
        .build()
        .unwrap();
    let long = format!("{}END-MARKER", "word ".repeat(200));

    let quiz = prepare_quiz(
        &RequestContext::new(),
        &OpenAccess,
        text_doc(&long),
        &options(&config),
        &config,
    )
    .await
    .unwrap();

    assert_eq!(quiz.stats.sent_chars, 500);
    assert!(quiz.stats.extracted_chars > 500);
    let prompt = backend.last_prompt.lock().unwrap().clone().unwrap();
    assert!(!prompt.contains("END-MARKER"));
}

// ── Failure paths ────────────────────────────────────────────────────────────

#[tokio::test]
async fn near_empty_document_never_reaches_the_model() {
    let backend = Scripted::ok(REPLY);
    let config = config_with(Arc::clone(&backend));

    let err = prepare_quiz(
        &RequestContext::new(),
        &OpenAccess,
        text_doc("   too short   "),
        &options(&config),
        &config,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, QuizError::InsufficientContent { .. }), "{err:?}");
    assert!(err.is_document_error());
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn service_error_surfaces_as_generation_failed() {
    let backend = Scripted::failing("quota exceeded");
    let config = config_with(Arc::clone(&backend));

    let err = prepare_quiz(
        &RequestContext::new(),
        &OpenAccess,
        text_doc(NOTES),
        &options(&config),
        &config,
    )
    .await
    .unwrap_err();

    match err {
        QuizError::GenerationFailed { message } => assert!(message.contains("quota exceeded")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn corrupt_pdf_is_unreadable() {
    let config = config_with(Scripted::ok(REPLY));
    let doc = SourceDocument::from_bytes("broken.pdf", b"not a pdf at all".to_vec()).unwrap();

    let err = prepare_quiz(&RequestContext::new(), &OpenAccess, doc, &options(&config), &config)
        .await
        .unwrap_err();
    assert!(matches!(err, QuizError::UnreadableDocument { .. }), "{err:?}");
}

#[test]
fn unsupported_extension_is_rejected_at_upload() {
    let err = SourceDocument::from_bytes("slides.pptx", vec![1, 2, 3]).unwrap_err();
    assert!(matches!(err, QuizError::UnsupportedFileType { .. }));
}

#[tokio::test]
async fn missing_local_file() {
    let config = config_with(Scripted::ok(REPLY));
    let err = prepare_quiz_from_input(
        &RequestContext::new(),
        &OpenAccess,
        "/definitely/not/here/notes.txt",
        &options(&config),
        &config,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, QuizError::FileNotFound { .. }), "{err:?}");
}

// ── Separation ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_sentinel_degrades_to_placeholder() {
    let recorder = Arc::new(Recorder::default());
    let config = QuizConfig::builder()
        .backend(Scripted::ok("1. Question without answers") as Arc<dyn QuizBackend>)
        .language(Language::Spanish)
        .progress_callback(Arc::clone(&recorder) as Arc<dyn PipelineProgressCallback>)
        .build()
        .unwrap();

    let quiz = prepare_quiz(
        &RequestContext::new(),
        &OpenAccess,
        text_doc(NOTES),
        &options(&config),
        &config,
    )
    .await
    .unwrap();

    assert_eq!(quiz.sections.separation, Separation::Missing);
    assert_eq!(quiz.sections.exam, "1. Question without answers");
    assert_eq!(quiz.sections.answer_key, "Error separando respuestas.");
    assert!(recorder
        .events
        .lock()
        .unwrap()
        .contains(&"separation-missing".to_string()));

    // The degraded result still exports.
    let artifacts =
        export_quiz(&quiz, &ExportFormat::ALL, &ExportSettings::for_config(&config), &config)
            .unwrap();
    assert_eq!(artifacts.len(), 2);
}

#[tokio::test]
async fn strict_separation_turns_missing_sentinel_into_error() {
    let config = QuizConfig::builder()
        .backend(Scripted::ok("1. Question without answers") as Arc<dyn QuizBackend>)
        .strict_separation(true)
        .build()
        .unwrap();

    let err = prepare_quiz(
        &RequestContext::new(),
        &OpenAccess,
        text_doc(NOTES),
        &options(&config),
        &config,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, QuizError::SeparationFailed { .. }), "{err:?}");
}

#[tokio::test]
async fn strict_separation_failure_reaches_the_progress_callback() {
    let recorder = Arc::new(Recorder::default());
    let config = QuizConfig::builder()
        .backend(Scripted::ok("1. Question without answers") as Arc<dyn QuizBackend>)
        .strict_separation(true)
        .progress_callback(Arc::clone(&recorder) as Arc<dyn PipelineProgressCallback>)
        .build()
        .unwrap();

    prepare_quiz(
        &RequestContext::new(),
        &OpenAccess,
        text_doc(NOTES),
        &options(&config),
        &config,
    )
    .await
    .unwrap_err();

    let events = recorder.events.lock().unwrap().clone();
    assert_eq!(
        events,
        vec!["start:extract", "done:extract", "start:generate", "error:generate"]
    );
}

#[tokio::test]
async fn fenced_reply_still_splits() {
    let fenced = format!("```text\n{REPLY}\n```");
    let config = config_with(Scripted::ok(&fenced));

    let quiz = prepare_quiz(
        &RequestContext::new(),
        &OpenAccess,
        text_doc(NOTES),
        &options(&config),
        &config,
    )
    .await
    .unwrap();
    assert!(quiz.sections.is_separated());
    assert!(!quiz.sections.exam.contains("```"));
    assert!(!quiz.sections.answer_key.contains("```"));
}

// ── Access ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn passcode_guard_blocks_before_extraction() {
    let backend = Scripted::ok(REPLY);
    let config = config_with(Arc::clone(&backend));
    let guard = PasscodeGuard::new("aula-3b");
    let mut ctx = RequestContext::new();

    let err = prepare_quiz(&ctx, &guard, text_doc(NOTES), &options(&config), &config)
        .await
        .unwrap_err();
    assert!(matches!(err, QuizError::AccessDenied { .. }));
    assert_eq!(backend.calls(), 0);

    ctx.sign_in("aula-3b");
    let quiz = prepare_quiz(&ctx, &guard, text_doc(NOTES), &options(&config), &config)
        .await
        .unwrap();
    assert!(quiz.sections.is_separated());
}

#[tokio::test]
async fn reset_keeps_session_between_uploads() {
    let config = config_with(Scripted::ok(REPLY));
    let guard = PasscodeGuard::new("aula-3b");
    let mut ctx = RequestContext::new();
    ctx.sign_in("aula-3b");

    prepare_quiz(&ctx, &guard, text_doc(NOTES), &options(&config), &config)
        .await
        .unwrap();
    let key_before = ctx.upload_key();
    ctx.reset();
    assert_ne!(ctx.upload_key(), key_before);

    // Still signed in after the reset.
    prepare_quiz(&ctx, &guard, text_doc(NOTES), &options(&config), &config)
        .await
        .unwrap();
}

// ── Exported files ───────────────────────────────────────────────────────────

#[tokio::test]
async fn exported_pdf_reads_back_as_input() {
    let config = config_with(Scripted::ok(REPLY));
    let quiz = prepare_quiz(
        &RequestContext::new(),
        &OpenAccess,
        text_doc(NOTES),
        &options(&config),
        &config,
    )
    .await
    .unwrap();

    let pdf = export_quiz(&quiz, &[ExportFormat::Pdf], &ExportSettings::default(), &config)
        .unwrap()
        .remove(0);
    let doc = SourceDocument::from_bytes(pdf.file_name.clone(), pdf.bytes).unwrap();
    let text = extract_text(&doc).unwrap();

    assert!(text.contains("EXAM"), "{text}");
    assert!(text.contains("ANSWER KEY"), "{text}");
    assert!(text.contains("Chloroplasts"), "{text}");
}

#[tokio::test]
async fn exported_docx_reads_back_as_input() {
    let config = config_with(Scripted::ok(REPLY));
    let quiz = prepare_quiz(
        &RequestContext::new(),
        &OpenAccess,
        text_doc(NOTES),
        &options(&config),
        &config,
    )
    .await
    .unwrap();

    let docx = export_quiz(&quiz, &[ExportFormat::Docx], &ExportSettings::default(), &config)
        .unwrap()
        .remove(0);
    let doc = SourceDocument::from_bytes(docx.file_name.clone(), docx.bytes).unwrap();
    let text = extract_text(&doc).unwrap();

    let exam_at = text.find("EXAM").unwrap();
    let key_at = text.find("ANSWER KEY").unwrap();
    assert!(exam_at < key_at);
    assert!(text.contains("b) Chloroplasts"));
}

#[tokio::test]
async fn artifacts_are_written_atomically() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("nested/quizzes");
    let config = config_with(Scripted::ok(REPLY));
    let quiz = prepare_quiz(
        &RequestContext::new(),
        &OpenAccess,
        text_doc(NOTES),
        &options(&config),
        &config,
    )
    .await
    .unwrap();

    let settings = ExportSettings::default().base_name("Biology");
    for artifact in export_quiz(&quiz, &ExportFormat::ALL, &settings, &config).unwrap() {
        let path = write_artifact(&artifact, &out).await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), artifact.bytes);
    }

    let mut names: Vec<_> = std::fs::read_dir(&out)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, vec!["Biology.docx", "Biology.pdf"]);
}

#[tokio::test]
async fn local_file_input() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Notes.TXT");
    std::fs::write(&path, NOTES).unwrap();

    let config = config_with(Scripted::ok(REPLY));
    let quiz = prepare_quiz_from_input(
        &RequestContext::new(),
        &OpenAccess,
        path.to_string_lossy(),
        &options(&config),
        &config,
    )
    .await
    .unwrap();
    assert_eq!(quiz.source_name, "Notes.TXT");
}

// ── Sync API ─────────────────────────────────────────────────────────────────

#[test]
fn sync_wrapper_runs_outside_a_runtime() {
    let config = config_with(Scripted::ok(REPLY));
    let quiz = prepare_quiz_sync(
        &RequestContext::new(),
        &OpenAccess,
        text_doc(NOTES),
        &options(&config),
        &config,
    )
    .unwrap();
    assert!(quiz.sections.is_separated());
}

#[test]
fn quiz_output_is_json_serialisable() {
    let config = config_with(Scripted::ok(REPLY));
    let quiz = tokio_test::block_on(prepare_quiz(
        &RequestContext::new(),
        &OpenAccess,
        text_doc(NOTES),
        &options(&config),
        &config,
    ))
    .unwrap();

    let json = serde_json::to_value(&quiz).unwrap();
    assert_eq!(json["source_name"], "notes.txt");
    assert_eq!(json["sections"]["separation"], "separated");
    assert!(json["stats"]["extracted_chars"].as_u64().unwrap() > 50);
}

// ── Live ─────────────────────────────────────────────────────────────────────

/// Calls the real provider. Set `E2E_ENABLED=1` and `GEMINI_API_KEY` (or
/// `OPENAI_API_KEY`) to run.
#[tokio::test]
async fn live_generation() {
    if std::env::var("E2E_ENABLED").is_err() {
        println!("SKIP — set E2E_ENABLED=1 to run live tests");
        return;
    }

    let config = QuizConfig::default();
    let quiz = prepare_quiz(
        &RequestContext::new(),
        &OpenAccess,
        text_doc(NOTES),
        &options(&config),
        &config,
    )
    .await
    .unwrap();

    println!("{}", quiz.sections.exam);
    assert!(!quiz.sections.exam.trim().is_empty());
}
