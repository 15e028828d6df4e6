//! CLI binary for doc2lesson.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `GenerationConfig`/`GenerationRequest` and prints results.

use anyhow::{bail, Context, Result};
use clap::Parser;
use doc2lesson::{
    generate, generate_to_file, ingest_file, GenerationConfig, GenerationRequest, GenerationStats,
    LessonForm, PromptSource,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Create a new plan from form fields (stdout)
  doc2lesson --lesson "Quadratic functions" --subject Mathematics --grade 10 \
      --notes "Graphing, vertex form, applications"

  # Create a plan seeded with a source document
  doc2lesson chapter3.docx --lesson "Photosynthesis" --subject Biology --grade 11 -o plan.md

  # Digitize an existing plan (PDF pages are read by the model directly)
  doc2lesson old-plan.pdf -o plan.md

  # Several keys, tried in order until one succeeds
  doc2lesson old-plan.pdf --api-keys "AIzaKey1,AIzaKey2,AIzaKey3"

  # JSON output with run stats
  doc2lesson old-plan.docx --json > result.json

KEY FAILOVER:
  Supply one or more keys (newline- or comma-separated). Keys are tried in
  order; rate limits (429), server errors (5xx), permission denials (403)
  and network failures advance to the next key, anything else stops the
  run. The first key returning text wins.

ENVIRONMENT VARIABLES:
  GEMINI_API_KEYS      API key(s), same format as --api-keys
  DOC2LESSON_MODEL     Override the model id
  DOC2LESSON_OUTPUT    Default output path

SETUP:
  1. Get a key:   https://aistudio.google.com/apikey
  2. Export it:   export GEMINI_API_KEYS=AIza...
  3. Generate:    doc2lesson old-plan.docx -o plan.md
"#;

/// Generate standardized lesson-plan Markdown using the Gemini API.
#[derive(Parser, Debug)]
#[command(
    name = "doc2lesson",
    version,
    about = "Generate standardized lesson-plan Markdown using the Gemini API",
    long_about = "Turn a lesson description or an uploaded document (DOCX, PDF, plain text) \
into a standardized lesson-plan Markdown document with digital-competency codes, using the \
Google Gemini API with multi-key failover.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Source document: .docx, .pdf, .txt, or .md.
    ///
    /// Without --lesson the document is digitized as-is; with --lesson it
    /// seeds the content of a newly created plan.
    input: Option<PathBuf>,

    /// Lesson title; switches to "create new plan" mode.
    #[arg(short, long)]
    lesson: Option<String>,

    /// Subject name (create mode).
    #[arg(long, default_value = "Mathematics")]
    subject: String,

    /// Grade level (create mode).
    #[arg(long, default_value = "10")]
    grade: String,

    /// Textbook series (create mode).
    #[arg(long, default_value = "")]
    textbook: String,

    /// Lesson duration (create mode).
    #[arg(long, default_value = "1 period (45 minutes)")]
    duration: String,

    /// Free-form lesson notes (create mode).
    #[arg(long, default_value = "")]
    notes: String,

    /// API key(s), newline- or comma-separated, each starting with 'AIza'.
    #[arg(short = 'k', long, env = "GEMINI_API_KEYS", hide_env_values = true)]
    api_keys: Option<String>,

    /// Read the key blob from a file instead.
    #[arg(long, conflicts_with = "api_keys")]
    keys_file: Option<PathBuf>,

    /// Write Markdown to this file instead of stdout.
    #[arg(short, long, env = "DOC2LESSON_OUTPUT")]
    output: Option<PathBuf>,

    /// Model id (e.g. gemini-2.5-flash, gemini-2.5-pro).
    #[arg(long, env = "DOC2LESSON_MODEL", default_value = doc2lesson::DEFAULT_MODEL)]
    model: String,

    /// Sampling temperature (0.0–2.0).
    #[arg(long, default_value_t = 0.2)]
    temperature: f32,

    /// Max output tokens.
    #[arg(long, default_value_t = 8192)]
    max_tokens: usize,

    /// Delay between failover attempts in milliseconds.
    #[arg(long, default_value_t = 500)]
    retry_delay_ms: u64,

    /// Per-attempt API timeout in seconds.
    #[arg(long, default_value_t = 60)]
    api_timeout: u64,

    /// Endpoint base URL (for proxies and testing).
    #[arg(long, default_value = doc2lesson::DEFAULT_API_BASE_URL, hide = true)]
    base_url: String,

    /// Path to a text file containing a custom system instruction.
    #[arg(long)]
    system_prompt: Option<PathBuf>,

    /// Output structured JSON (markdown + stats) instead of plain Markdown.
    #[arg(long)]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner provides all the feedback an interactive user needs;
    // library logs only show up with --verbose (or RUST_LOG).
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Resolve keys ─────────────────────────────────────────────────────
    let key_blob = match (&cli.api_keys, &cli.keys_file) {
        (Some(blob), _) => blob.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read keys from {}", path.display()))?,
        (None, None) => bail!(
            "No API keys supplied. Use --api-keys, GEMINI_API_KEYS, or --keys-file.\n\
             Get a key at https://aistudio.google.com/apikey"
        ),
    };

    // ── Build config ─────────────────────────────────────────────────────
    let system_prompt = match &cli.system_prompt {
        Some(path) => Some(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read system prompt from {}", path.display()))?,
        ),
        None => None,
    };

    let mut builder = GenerationConfig::builder()
        .model(&cli.model)
        .temperature(cli.temperature)
        .max_output_tokens(cli.max_tokens)
        .retry_delay_ms(cli.retry_delay_ms)
        .api_timeout_secs(cli.api_timeout)
        .api_base_url(&cli.base_url);
    if let Some(prompt) = system_prompt {
        builder = builder.system_prompt(prompt);
    }
    let config = builder.build().context("Invalid configuration")?;

    // ── Ingest the source document, if any ───────────────────────────────
    let attachment = match &cli.input {
        Some(path) => {
            let doc = ingest_file(path)
                .await
                .with_context(|| format!("Failed to ingest {}", path.display()))?;
            if !cli.quiet {
                eprintln!(
                    "{} Ingested {}",
                    green("✓"),
                    bold(doc.display_name())
                );
            }
            Some(doc)
        }
        None => None,
    };

    // ── Build the request ────────────────────────────────────────────────
    let source = match &cli.lesson {
        Some(title) => PromptSource::Create(LessonForm {
            subject: cli.subject.clone(),
            grade: cli.grade.clone(),
            textbook: cli.textbook.clone(),
            duration: cli.duration.clone(),
            title: title.clone(),
            notes: cli.notes.clone(),
        }),
        None => {
            if attachment.is_none() {
                bail!("Nothing to do: pass a source document, or --lesson to create a new plan.");
            }
            PromptSource::Digitize {
                content: String::new(),
            }
        }
    };

    let request = GenerationRequest {
        source,
        attachment,
        key_blob,
    };

    // ── Run generation (spinner while the request is in flight) ──────────
    let spinner = if !cli.quiet && !cli.no_progress && !cli.json {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_message("Generating lesson plan…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Some(bar)
    } else {
        None
    };

    // ── Run generation and emit the result ───────────────────────────────
    let stats = if let (Some(path), false) = (&cli.output, cli.json) {
        let result = generate_to_file(&request, path, &config).await;
        if let Some(bar) = &spinner {
            bar.finish_and_clear();
        }
        let stats = result.unwrap_or_else(|e| fail(&e.to_string()));
        if !cli.quiet {
            eprintln!(
                "{}  {}ms  →  {}",
                green("✔"),
                stats.duration_ms,
                bold(&path.display().to_string()),
            );
        }
        stats
    } else {
        let result = generate(&request, &config).await;
        if let Some(bar) = &spinner {
            bar.finish_and_clear();
        }
        let output = result.unwrap_or_else(|e| fail(&e.to_string()));

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&output).context("Failed to serialise output")?
            );
            return Ok(());
        }

        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(output.markdown.as_bytes())
            .context("Failed to write to stdout")?;
        if !output.markdown.ends_with('\n') {
            handle.write_all(b"\n").ok();
        }
        output.stats
    };

    if !cli.quiet {
        eprintln!("   {}", dim(&summary_line(&stats)));
    }

    Ok(())
}

/// Print the failure and exit non-zero.
fn fail(message: &str) -> ! {
    eprintln!("{} {}", red("✘"), message);
    std::process::exit(1);
}

/// One-line run summary for stderr.
fn summary_line(stats: &GenerationStats) -> String {
    format!(
        "attempt {}/{} keys  ·  {} tokens in / {} tokens out  ·  {}",
        stats.attempts,
        stats.keys_available,
        stats
            .prompt_tokens
            .map_or_else(|| "?".into(), |t| t.to_string()),
        stats
            .output_tokens
            .map_or_else(|| "?".into(), |t| t.to_string()),
        stats.model,
    )
}
