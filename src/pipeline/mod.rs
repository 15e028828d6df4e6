//! Pipeline stages for lesson-plan generation.
//!
//! Each submodule implements exactly one transformation step. Keeping
//! stages separate makes each independently testable and lets us swap
//! implementations (e.g. a different generation endpoint) without touching
//! the others.
//!
//! ## Data Flow
//!
//! ```text
//! ingest ──▶ payload ──▶ dispatch ──▶ postprocess
//! (file)     (parts)     (key failover  (cleanup)
//!                         over gemini)
//! ```
//!
//! 1. [`ingest`] converts an uploaded file into text or a base64 part
//! 2. [`payload`] models the ordered parts of one generation request
//! 3. [`dispatch`] tries each API key once, in order; the only stage
//!    with network I/O, via [`gemini`]
//! 4. [`postprocess`] applies deterministic cleanup of model output quirks
//!    (fences, duplicated table separators, stray whitespace)

pub mod dispatch;
pub mod docx;
pub mod gemini;
pub mod ingest;
pub mod payload;
pub mod postprocess;
