//! Pipeline entry points.
//!
//! [`prepare_quiz`] runs guard → extract → sufficiency check → generate →
//! split and returns the two sections. [`export_quiz`] renders them; the two
//! steps are separate so a host can show the sections before offering the
//! downloads, and render both formats from one generation.

use crate::config::{ExportFormat, GenerationOptions, QuizConfig};
use crate::context::{AccessGuard, RequestContext};
use crate::error::QuizError;
use crate::output::{ExportArtifact, QuizOutput, QuizStats, Separation};
use crate::pipeline::export::{export, ExportSettings};
use crate::pipeline::generate::{generate, resolve_backend, truncate_to_budget};
use crate::pipeline::input::{resolve_input, SourceDocument};
use crate::pipeline::{extract, postprocess, split};
use crate::progress::Stage;
use crate::prompts::SENTINEL;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

/// Turn an uploaded document into exam and answer-key sections.
///
/// # Errors
/// - [`QuizError::AccessDenied`] when `guard` rejects the request
/// - [`QuizError::UnreadableDocument`] when the file cannot be parsed
/// - [`QuizError::InsufficientContent`] when the text is too short; the
///   model is not called
/// - [`QuizError::GenerationFailed`] when the service errors
/// - [`QuizError::SeparationFailed`] only with `strict_separation`
pub async fn prepare_quiz(
    ctx: &RequestContext,
    guard: &dyn AccessGuard,
    document: SourceDocument,
    options: &GenerationOptions,
    config: &QuizConfig,
) -> Result<QuizOutput, QuizError> {
    let total_start = Instant::now();
    guard.check(ctx)?;
    info!(
        "Preparing quiz from '{}' (upload {})",
        document.name,
        ctx.upload_generation()
    );

    // ── Step 1: Extract ──────────────────────────────────────────────────
    stage_start(config, Stage::Extract);
    let extract_start = Instant::now();
    let name = document.name.clone();
    let extracted = tokio::task::spawn_blocking(move || extract::extract_text(&document))
        .await
        .map_err(|e| QuizError::Internal(format!("Extraction task panicked: {}", e)))
        .and_then(|r| r)
        .and_then(|text| {
            extract::ensure_sufficient(&name, &text, config.min_content_chars)?;
            Ok(text)
        });
    let text = stage_result(config, Stage::Extract, extracted, |t| {
        format!("{} chars", t.chars().count())
    })?;
    let extract_duration_ms = extract_start.elapsed().as_millis() as u64;

    // ── Step 2: Generate ─────────────────────────────────────────────────
    stage_start(config, Stage::Generate);
    let generate_start = Instant::now();
    let generated = match resolve_backend(config) {
        Ok(backend) => generate(backend.as_ref(), &text, options, config).await,
        Err(e) => Err(e),
    };

    // ── Step 3: Split ────────────────────────────────────────────────────
    // A strict-mode split failure is reported as a generate-stage error.
    let separated = generated.and_then(|result| {
        let normalised = postprocess::normalise_response(&result.text);
        let sections = split::split_sections(&normalised, config.language);
        if sections.separation == Separation::Missing && config.strict_separation {
            return Err(QuizError::SeparationFailed {
                sentinel: SENTINEL.to_string(),
            });
        }
        Ok((result, sections))
    });
    let (result, sections) = stage_result(config, Stage::Generate, separated, |(r, _)| {
        format!("{} tokens out", r.output_tokens)
    })?;
    let generate_duration_ms = generate_start.elapsed().as_millis() as u64;

    if sections.separation == Separation::Missing {
        warn!(
            "Response for '{}' has no '{}' marker; answer key replaced by placeholder",
            name, SENTINEL
        );
        if let Some(ref cb) = config.progress_callback {
            cb.on_separation_missing();
        }
    }

    let stats = QuizStats {
        extracted_chars: text.chars().count(),
        sent_chars: truncate_to_budget(&text, config.max_input_chars)
            .chars()
            .count(),
        input_tokens: result.input_tokens,
        output_tokens: result.output_tokens,
        extract_duration_ms,
        generate_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Quiz ready: {} exam chars, {} answer-key chars, {}ms total",
        sections.exam.len(),
        sections.answer_key.len(),
        stats.total_duration_ms
    );

    Ok(QuizOutput {
        source_name: name,
        sections,
        stats,
    })
}

/// Resolve a local path or URL, then run [`prepare_quiz`].
pub async fn prepare_quiz_from_input(
    ctx: &RequestContext,
    guard: &dyn AccessGuard,
    input: impl AsRef<str>,
    options: &GenerationOptions,
    config: &QuizConfig,
) -> Result<QuizOutput, QuizError> {
    let document = resolve_input(input.as_ref(), config.download_timeout_secs).await?;
    prepare_quiz(ctx, guard, document, options, config).await
}

/// Synchronous wrapper around [`prepare_quiz`].
///
/// Creates a temporary tokio runtime internally.
pub fn prepare_quiz_sync(
    ctx: &RequestContext,
    guard: &dyn AccessGuard,
    document: SourceDocument,
    options: &GenerationOptions,
    config: &QuizConfig,
) -> Result<QuizOutput, QuizError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| QuizError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(prepare_quiz(ctx, guard, document, options, config))
}

/// Render the sections of `output` in each of `formats`.
pub fn export_quiz(
    output: &QuizOutput,
    formats: &[ExportFormat],
    settings: &ExportSettings,
    config: &QuizConfig,
) -> Result<Vec<ExportArtifact>, QuizError> {
    stage_start(config, Stage::Export);
    let rendered = formats
        .iter()
        .map(|&format| export(&output.sections, format, settings))
        .collect::<Result<Vec<_>, _>>();
    stage_result(config, Stage::Export, rendered, |artifacts| {
        artifacts
            .iter()
            .map(|a| a.file_name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    })
}

/// Write `artifact` into `dir` under its download name.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn write_artifact(
    artifact: &ExportArtifact,
    dir: impl AsRef<Path>,
) -> Result<PathBuf, QuizError> {
    let dir = dir.as_ref();
    let path = dir.join(&artifact.file_name);
    let write_err = |source| QuizError::OutputWriteFailed {
        path: path.clone(),
        source,
    };

    tokio::fs::create_dir_all(dir).await.map_err(write_err)?;

    let tmp_path = path.with_extension(format!("{}.tmp", artifact.format.extension()));
    tokio::fs::write(&tmp_path, &artifact.bytes)
        .await
        .map_err(write_err)?;
    tokio::fs::rename(&tmp_path, &path)
        .await
        .map_err(write_err)?;

    info!("Wrote {}", path.display());
    Ok(path)
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn stage_start(config: &QuizConfig, stage: Stage) {
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_start(stage);
    }
}

/// Report the outcome of `stage` to the progress callback and pass it on.
fn stage_result<T>(
    config: &QuizConfig,
    stage: Stage,
    result: Result<T, QuizError>,
    detail: impl FnOnce(&T) -> String,
) -> Result<T, QuizError> {
    if let Some(ref cb) = config.progress_callback {
        match &result {
            Ok(value) => cb.on_stage_complete(stage, &detail(value)),
            Err(e) => cb.on_stage_error(stage, &e.to_string()),
        }
    }
    result
}
