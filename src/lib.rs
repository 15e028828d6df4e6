//! # doc2lesson
//!
//! Generate standardized lesson-plan Markdown from a short description or an
//! uploaded document, using the Google Gemini `generateContent` API.
//!
//! ## Why this crate?
//!
//! Teachers digitizing lesson plans hit two practical walls: source
//! documents arrive as DOCX/PDF files that need careful conversion before a
//! model can use them, and free-tier API keys rate-limit quickly under real
//! use. This crate handles both: document ingestion tuned for lesson-plan
//! tables, and a multi-key failover dispatcher that tries each supplied key
//! in turn until one succeeds.
//!
//! ## Pipeline Overview
//!
//! ```text
//! description / DOCX / PDF / text
//!  │
//!  ├─ 1. Ingest    DOCX → text with pipe tables; PDF → base64 part
//!  ├─ 2. Prompt    standardized-template instructions + competency codes
//!  ├─ 3. Dispatch  try each API key once, in order; classify failures
//!  ├─ 4. Polish    deterministic Markdown cleanup (fences, tables)
//!  └─ 5. Output    lesson-plan Markdown + run stats
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use doc2lesson::{
//!     generate, GenerationConfig, GenerationRequest, LessonForm, PromptSource,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let request = GenerationRequest {
//!         source: PromptSource::Create(LessonForm {
//!             subject: "Mathematics".into(),
//!             grade: "10".into(),
//!             textbook: "Horizons".into(),
//!             duration: "1 period (45 minutes)".into(),
//!             title: "Quadratic functions".into(),
//!             notes: "Graphing, vertex form, real-world examples.".into(),
//!         }),
//!         attachment: None,
//!         key_blob: std::env::var("GEMINI_API_KEYS")?,
//!     };
//!     let output = generate(&request, &GenerationConfig::default()).await?;
//!     println!("{}", output.markdown);
//!     eprintln!("attempts: {}", output.stats.attempts);
//!     Ok(())
//! }
//! ```
//!
//! ## Key Failover
//!
//! Paste several keys (newline- or comma-separated) into the key blob and
//! the dispatcher tries them in order: rate limits, server errors, and
//! permission denials advance to the next key after a short pause, while
//! malformed-request errors stop the run immediately. The first key that
//! returns non-empty text wins and no further keys are touched.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `doc2lesson` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! doc2lesson = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod generate;
pub mod keys;
pub mod output;
pub mod pipeline;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{GenerationConfig, GenerationConfigBuilder, DEFAULT_API_BASE_URL, DEFAULT_MODEL};
pub use error::Doc2LessonError;
pub use generate::{generate, generate_to_file, generate_with, GenerationRequest, PromptSource};
pub use keys::{parse_keys, ApiKey, KEY_PREFIX};
pub use output::{GenerationOutput, GenerationStats};
pub use pipeline::dispatch::{classify, dispatch, DispatchOutcome, FailureClass};
pub use pipeline::gemini::{
    GeminiClient, GenerateRequest, GenerateResponse, MockGenerator, RemoteFailure, TextGenerator,
};
pub use pipeline::ingest::{ingest_file, IngestedDocument};
pub use prompts::LessonForm;
