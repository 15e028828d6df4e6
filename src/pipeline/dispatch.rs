//! Multi-key failover: try each API key once, in order, until one succeeds.
//!
//! ## Failover strategy
//!
//! The dispatcher is a try-in-order combinator over an ordered list of
//! interchangeable keys: one attempt per key, never in parallel, first
//! non-empty success wins. A pluggable classifier splits failures into
//! [`FailureClass::Retryable`] (advance to the next key after a short
//! pause) and [`FailureClass::Terminal`] (stop the whole dispatch).
//!
//! A terminal failure on a non-last key does NOT advance; the loop exits
//! immediately. A malformed request will fail identically on every key, so
//! burning the remaining quota would gain nothing. A per-key permission
//! error is the one case this could misjudge; 403 is therefore classified
//! retryable so a different key still gets its turn.
//!
//! Cancellation is cooperative: dropping the returned future aborts the
//! in-flight attempt; no partial results are committed.

use crate::config::GenerationConfig;
use crate::error::Doc2LessonError;
use crate::keys::ApiKey;
use crate::pipeline::gemini::{GenerateRequest, RemoteFailure, TextGenerator};
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{info, warn};

/// Whether a failed attempt should advance to the next key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// A different key has a reasonable chance of succeeding: rate limit,
    /// server error, permission denial, network failure, empty output.
    Retryable,
    /// Retrying with another key will not help (e.g. malformed request).
    /// Ends the whole dispatch, even with keys left untried.
    Terminal,
}

/// Classify a remote failure by its structured status.
///
/// Works entirely from the HTTP status and transport flags; message text
/// is never inspected.
pub fn classify(failure: &RemoteFailure) -> FailureClass {
    if failure.network {
        return FailureClass::Retryable;
    }
    match failure.status {
        // Quota exhaustion and per-key permission denial: the next key may
        // be on a different quota or project.
        Some(429) | Some(403) => FailureClass::Retryable,
        Some(status) if status >= 500 => FailureClass::Retryable,
        // 400-class (malformed request), 404 (unknown model), and
        // unparseable responses.
        _ => FailureClass::Terminal,
    }
}

/// A successful dispatch: the generated text plus attempt accounting.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    /// The generated text (non-empty by contract).
    pub text: String,
    /// Number of attempts made, including the successful one.
    pub attempts: usize,
    /// Prompt token count from the winning attempt, when reported.
    pub prompt_tokens: Option<u64>,
    /// Output token count from the winning attempt, when reported.
    pub output_tokens: Option<u64>,
}

/// Try each key in order against the generator until one returns non-empty
/// text.
///
/// The key list and request are borrowed and never mutated. Each key gets
/// exactly one attempt, bounded by `config.api_timeout_secs`; between
/// retryable failures the loop pauses `config.retry_delay_ms` before moving
/// on. An empty key list fails with
/// [`Doc2LessonError::NoApiKeys`] without any network call.
pub async fn dispatch(
    generator: &dyn TextGenerator,
    keys: &[ApiKey],
    request: &GenerateRequest,
    config: &GenerationConfig,
) -> Result<DispatchOutcome, Doc2LessonError> {
    if keys.is_empty() {
        return Err(Doc2LessonError::NoApiKeys);
    }

    let total = keys.len();
    let attempt_budget = Duration::from_secs(config.api_timeout_secs);
    let mut last_failure: Option<RemoteFailure> = None;

    for (index, key) in keys.iter().enumerate() {
        info!(
            attempt = index + 1,
            total,
            key = %key.masked(),
            backend = generator.name(),
            "dispatching generation attempt"
        );

        let outcome = match timeout(attempt_budget, generator.generate(key, request)).await {
            Ok(result) => result,
            Err(_) => Err(RemoteFailure::network(format!(
                "attempt timed out after {}s",
                config.api_timeout_secs
            ))),
        };

        let (failure, class) = match outcome {
            Ok(response) if !response.text.trim().is_empty() => {
                info!(
                    attempt = index + 1,
                    chars = response.text.len(),
                    "generation succeeded"
                );
                return Ok(DispatchOutcome {
                    text: response.text,
                    attempts: index + 1,
                    prompt_tokens: response.prompt_tokens,
                    output_tokens: response.output_tokens,
                });
            }
            // Empty output is indistinguishable from a transient failure:
            // give the next key a chance.
            Ok(_) => (
                RemoteFailure::malformed("model returned an empty response"),
                FailureClass::Retryable,
            ),
            Err(f) => {
                let class = classify(&f);
                (f, class)
            }
        };

        warn!(
            attempt = index + 1,
            total,
            key = %key.masked(),
            class = ?class,
            error = %failure,
            "generation attempt failed"
        );

        let is_last = index + 1 == total;
        last_failure = Some(failure);

        match class {
            FailureClass::Retryable if !is_last => {
                sleep(Duration::from_millis(config.retry_delay_ms)).await;
            }
            _ => break,
        }
    }

    Err(synthesize_final_error(last_failure, total, &config.model))
}

/// Turn the last-seen failure into the user-facing error.
fn synthesize_final_error(
    last: Option<RemoteFailure>,
    keys: usize,
    model: &str,
) -> Doc2LessonError {
    match last {
        Some(f) if f.status == Some(429) => Doc2LessonError::AllKeysRateLimited { keys },
        Some(f) if f.status == Some(404) => Doc2LessonError::ModelUnavailable {
            model: model.to_string(),
        },
        Some(f) if !f.message.trim().is_empty() => Doc2LessonError::GenerationFailed {
            message: f.to_string(),
        },
        _ => Doc2LessonError::GenerationFailed {
            message: "Request failed. Check your network connection and API keys.".into(),
        },
    }
}
