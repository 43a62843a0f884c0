//! CLI binary for examenmatic.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `QuizConfig` and writes the exported files.

use anyhow::{Context, Result};
use clap::Parser;
use examenmatic::{
    export_quiz, prepare_quiz_from_input, write_artifact, AccessGuard, Difficulty, ExportFormat,
    ExportSettings, Language, OpenAccess, PasscodeGuard, PipelineProgressCallback,
    ProgressCallback, QuizConfig, RequestContext, Stage,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one spinner whose message follows the current
/// stage, plus a log line per finished stage.
struct CliProgressCallback {
    bar: ProgressBar,
    stage_started: Mutex<Option<Instant>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            stage_started: Mutex::new(None),
        })
    }

    fn elapsed_secs(&self) -> f64 {
        self.stage_started
            .lock()
            .ok()
            .and_then(|mut t| t.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

fn stage_message(stage: Stage) -> &'static str {
    match stage {
        Stage::Extract => "Reading document…",
        Stage::Generate => "Writing questions…",
        Stage::Export => "Rendering files…",
    }
}

impl PipelineProgressCallback for CliProgressCallback {
    fn on_stage_start(&self, stage: Stage) {
        if let Ok(mut t) = self.stage_started.lock() {
            *t = Some(Instant::now());
        }
        self.bar.set_prefix(stage.to_string());
        self.bar.set_message(stage_message(stage));
    }

    fn on_stage_complete(&self, stage: Stage, detail: &str) {
        self.bar.println(format!(
            "  {} {:<9} {}  {}",
            green("✓"),
            stage.to_string(),
            dim(detail),
            dim(&format!("{:.1}s", self.elapsed_secs())),
        ));
    }

    fn on_stage_error(&self, stage: Stage, error: &str) {
        // Truncate very long error messages to keep output tidy.
        let msg = match error.char_indices().nth(79) {
            Some((idx, _)) => format!("{}\u{2026}", &error[..idx]),
            None => error.to_string(),
        };
        self.bar.println(format!(
            "  {} {:<9} {}  {}",
            red("✗"),
            stage.to_string(),
            red(&msg),
            dim(&format!("{:.1}s", self.elapsed_secs())),
        ));
    }

    fn on_separation_missing(&self) {
        self.bar.println(format!(
            "  {} answer key marker missing; the answer key is a placeholder",
            yellow("⚠"),
        ));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Ten intermediate questions, DOCX and PDF in the current directory
  examenmatic notes.pdf

  # Fifteen hard questions, PDF only, into ./out
  examenmatic -n 15 -d hard -f pdf -o out chapter3.docx

  # Spanish prompt and headings
  examenmatic --language es apuntes.txt

  # Download the source document first
  examenmatic https://example.org/handout.pdf --name Handout_Quiz

  # Fail instead of writing a placeholder answer key
  examenmatic --strict-separation notes.txt

  # JSON output (sections + stats) on stdout
  examenmatic --json notes.txt > quiz.json

SUPPORTED INPUTS:
  .txt    UTF-8 plain text
  .pdf    text layer only (scanned pages yield no text)
  .docx   Word body paragraphs

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY            Google Gemini API key (default provider)
  GOOGLE_API_KEY            Alternative name for the Gemini key
  OPENAI_API_KEY            OpenAI API key
  ANTHROPIC_API_KEY         Anthropic API key
  EDGEQUAKE_LLM_PROVIDER    Override provider (gemini, openai, anthropic, ollama)
  EDGEQUAKE_MODEL           Override model ID
  EXAMENMATIC_ACCESS_CODE   Require this passcode before generating
  EXAMENMATIC_PASSCODE      Passcode to present when one is required

SETUP:
  1. Set API key:     export GEMINI_API_KEY=...
  2. Generate:        examenmatic notes.pdf -o quizzes/
"#;

/// Generate a multiple-choice exam and answer key from a document.
#[derive(Parser, Debug)]
#[command(
    name = "examenmatic",
    version,
    about = "Generate a multiple-choice exam and answer key from a document",
    long_about = "Extract the text of a TXT, PDF or DOCX document (local file or URL), ask an \
LLM for a multiple-choice exam, and export the exam and its answer key on separate pages \
as DOCX and/or PDF. Supports Google Gemini, OpenAI, Anthropic, and any provider edgequake-llm \
knows about.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local TXT/PDF/DOCX file path or HTTP/HTTPS URL.
    input: String,

    /// Question difficulty.
    #[arg(short, long, env = "EXAMENMATIC_DIFFICULTY", value_enum, default_value = "intermediate")]
    difficulty: DifficultyArg,

    /// Number of questions (5–20).
    #[arg(short = 'n', long, env = "EXAMENMATIC_QUESTIONS", default_value_t = 10)]
    questions: u32,

    /// Output format.
    #[arg(short, long, env = "EXAMENMATIC_FORMAT", value_enum, default_value = "both")]
    format: FormatArg,

    /// Directory the exported files are written to.
    #[arg(short, long, env = "EXAMENMATIC_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// File name of the exported files, without extension.
    #[arg(long, env = "EXAMENMATIC_NAME", default_value = "Exam_Complete")]
    name: String,

    /// Language of the prompt and section headings.
    #[arg(long, env = "EXAMENMATIC_LANGUAGE", value_enum, default_value = "en")]
    language: LanguageArg,

    /// LLM provider: gemini, openai, anthropic, ollama.
    #[arg(
        long,
        env = "EXAMENMATIC_PROVIDER",
        long_help = "LLM provider. Auto-detected from API key env vars if not set.\n\
          Gemini is preferred when GEMINI_API_KEY or GOOGLE_API_KEY is present."
    )]
    provider: Option<String>,

    /// LLM model ID (e.g. gemini-2.0-flash, gpt-4.1-mini).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// Characters of document text sent to the model.
    #[arg(long, env = "EXAMENMATIC_MAX_INPUT_CHARS", default_value_t = 12_000)]
    max_input_chars: usize,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "EXAMENMATIC_TEMPERATURE", default_value_t = 0.7)]
    temperature: f32,

    /// Fail when the model's reply has no answer-key marker.
    #[arg(long, env = "EXAMENMATIC_STRICT_SEPARATION")]
    strict_separation: bool,

    /// Passcode required before generating. Unset means open access.
    #[arg(long, env = "EXAMENMATIC_ACCESS_CODE", hide_env_values = true)]
    access_code: Option<String>,

    /// Passcode presented for this run.
    #[arg(long, env = "EXAMENMATIC_PASSCODE", hide_env_values = true)]
    passcode: Option<String>,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "EXAMENMATIC_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Print sections and stats as JSON instead of a summary.
    #[arg(long, env = "EXAMENMATIC_JSON")]
    json: bool,

    /// Disable the spinner.
    #[arg(long, env = "EXAMENMATIC_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "EXAMENMATIC_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "EXAMENMATIC_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum DifficultyArg {
    Easy,
    Intermediate,
    Hard,
}

impl From<DifficultyArg> for Difficulty {
    fn from(v: DifficultyArg) -> Self {
        match v {
            DifficultyArg::Easy => Difficulty::Easy,
            DifficultyArg::Intermediate => Difficulty::Intermediate,
            DifficultyArg::Hard => Difficulty::Hard,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Docx,
    Pdf,
    Both,
}

impl FormatArg {
    fn formats(self) -> Vec<ExportFormat> {
        match self {
            FormatArg::Docx => vec![ExportFormat::Docx],
            FormatArg::Pdf => vec![ExportFormat::Pdf],
            FormatArg::Both => ExportFormat::ALL.to_vec(),
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum LanguageArg {
    En,
    Es,
}

impl From<LanguageArg> for Language {
    fn from(v: LanguageArg) -> Self {
        match v {
            LanguageArg::En => Language::English,
            LanguageArg::Es => Language::Spanish,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner replaces INFO-level library logs; verbose mode wins.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let spinner = show_progress.then(CliProgressCallback::new);
    let progress_cb = spinner
        .as_ref()
        .map(|cb| Arc::clone(cb) as Arc<dyn PipelineProgressCallback>);

    let config = build_config(&cli, progress_cb)?;
    let options = config
        .options(cli.questions, cli.difficulty.into())
        .context("Invalid question count")?;

    // ── Access ───────────────────────────────────────────────────────────
    let mut ctx = RequestContext::new();
    if let Some(ref passcode) = cli.passcode {
        ctx.sign_in(passcode.clone());
    }
    let guard: Box<dyn AccessGuard> = match cli.access_code {
        Some(ref expected) => Box::new(PasscodeGuard::new(expected.clone())),
        None => Box::new(OpenAccess),
    };

    // ── Run ──────────────────────────────────────────────────────────────
    let started = Instant::now();
    let result = prepare_quiz_from_input(&ctx, guard.as_ref(), &cli.input, &options, &config).await;
    let quiz = match result {
        Ok(quiz) => quiz,
        Err(e) => {
            if let Some(ref s) = spinner {
                s.finish();
            }
            return Err(e).context("Quiz generation failed");
        }
    };

    let settings = ExportSettings::for_config(&config).base_name(cli.name.clone());
    let artifacts = export_quiz(&quiz, &cli.format.formats(), &settings, &config);
    if let Some(ref s) = spinner {
        s.finish();
    }
    let artifacts = artifacts.context("Export failed")?;

    let mut written = Vec::with_capacity(artifacts.len());
    for artifact in &artifacts {
        let path = write_artifact(artifact, &cli.output_dir)
            .await
            .with_context(|| format!("Failed to write {}", artifact.file_name))?;
        written.push(path);
    }

    // ── Report ───────────────────────────────────────────────────────────
    if cli.json {
        let json = serde_json::to_string_pretty(&quiz).context("Failed to serialise output")?;
        println!("{json}");
    }

    if !cli.quiet {
        if !quiz.sections.is_separated() {
            eprintln!(
                "{} {}",
                yellow("⚠"),
                bold("The answer key could not be separated; check the exam file.")
            );
        }
        for path in &written {
            eprintln!("{}  {}", green("✔"), bold(&path.display().to_string()));
        }
        eprintln!(
            "   {} tokens in  /  {} tokens out  —  {}ms total",
            dim(&quiz.stats.input_tokens.to_string()),
            dim(&quiz.stats.output_tokens.to_string()),
            started.elapsed().as_millis(),
        );
    }

    Ok(())
}

/// Map CLI args to `QuizConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<QuizConfig> {
    let mut builder = QuizConfig::builder()
        .temperature(cli.temperature)
        .max_input_chars(cli.max_input_chars)
        .language(cli.language.into())
        .strict_separation(cli.strict_separation)
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
