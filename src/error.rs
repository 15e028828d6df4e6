//! Error types for the doc2lesson library.
//!
//! Two distinct failure families reflect two distinct stages:
//!
//! * Ingest errors ([`Doc2LessonError::UnsupportedFormat`],
//!   [`Doc2LessonError::CorruptFile`]): the input file could not be turned
//!   into a payload at all. Surfaced before any network call is made.
//!
//! * Dispatch errors ([`Doc2LessonError::NoApiKeys`],
//!   [`Doc2LessonError::AllKeysRateLimited`], …): the key failover loop ran
//!   out of options. The message always tells the user what to do next
//!   (wait, add keys, check the model id) rather than just what went wrong.
//!
//! Transient per-attempt failures never reach this enum: the dispatcher
//! absorbs them by advancing to the next key and only synthesizes a final
//! error from the last one seen.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the doc2lesson library.
#[derive(Debug, Error)]
pub enum Doc2LessonError {
    // ── Key errors ────────────────────────────────────────────────────────
    /// No usable API key was found in the supplied blob.
    #[error(
        "No valid API key found. Supply at least one key starting with 'AIza' \
         via --api-keys, the GEMINI_API_KEYS environment variable, or --keys-file."
    )]
    NoApiKeys,

    // ── Dispatch errors ───────────────────────────────────────────────────
    /// Every key was tried and the last failure was a rate limit.
    #[error(
        "All {keys} API key(s) are currently rate-limited (429). \
         Wait a minute and retry, or add more keys."
    )]
    AllKeysRateLimited { keys: usize },

    /// The requested model or endpoint does not exist (HTTP 404).
    #[error("Model '{model}' is not available. Check the --model value and your key's access.")]
    ModelUnavailable { model: String },

    /// The final failure after the key loop, surfaced verbatim.
    #[error("Generation failed: {message}")]
    GenerationFailed { message: String },

    // ── Ingest errors ─────────────────────────────────────────────────────
    /// File extension is not one of the recognized input kinds.
    #[error(
        "Unsupported file format '.{extension}' for '{path}'. \
         Supported: .docx, .pdf, .txt, .md.{hint}"
    )]
    UnsupportedFormat {
        path: PathBuf,
        extension: String,
        hint: String,
    },

    /// The file was recognized but could not be read or decoded.
    #[error("Cannot read '{path}': {detail}")]
    CorruptFile { path: PathBuf, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output Markdown file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Doc2LessonError {
    /// Build an [`UnsupportedFormat`](Self::UnsupportedFormat) error,
    /// attaching a re-save hint for legacy `.doc` files.
    pub(crate) fn unsupported(path: PathBuf, extension: &str) -> Self {
        let hint = if extension.eq_ignore_ascii_case("doc") {
            "\nLegacy .doc is a binary format; re-save the file as .docx.".to_string()
        } else {
            String::new()
        };
        Doc2LessonError::UnsupportedFormat {
            path,
            extension: extension.to_string(),
            hint,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limited_names_key_count() {
        let e = Doc2LessonError::AllKeysRateLimited { keys: 3 };
        let msg = e.to_string();
        assert!(msg.contains('3'), "got: {msg}");
        assert!(msg.contains("rate-limited"), "got: {msg}");
    }

    #[test]
    fn model_unavailable_names_model() {
        let e = Doc2LessonError::ModelUnavailable {
            model: "gemini-2.5-flash".into(),
        };
        assert!(e.to_string().contains("gemini-2.5-flash"));
    }

    #[test]
    fn unsupported_doc_gets_resave_hint() {
        let e = Doc2LessonError::unsupported(PathBuf::from("old.doc"), "doc");
        assert!(e.to_string().contains("re-save"));
    }

    #[test]
    fn unsupported_other_has_no_hint() {
        let e = Doc2LessonError::unsupported(PathBuf::from("deck.pptx"), "pptx");
        assert!(!e.to_string().contains("re-save"));
        assert!(e.to_string().contains(".pptx"));
    }

    #[test]
    fn no_keys_suggests_configuration() {
        let msg = Doc2LessonError::NoApiKeys.to_string();
        assert!(msg.contains("AIza"));
        assert!(msg.contains("--api-keys"));
    }
}
