//! Remote call interface: the [`TextGenerator`] trait and its two
//! implementations: [`GeminiClient`] for the real `generateContent`
//! endpoint and [`MockGenerator`] for deterministic tests.
//!
//! The trait is the seam the dispatcher is generic over: one attempt per
//! key, no retry logic here. Failures come back as [`RemoteFailure`] with a
//! structured HTTP status wherever the transport produced one, so the
//! dispatcher's classifier never has to pattern-match message text.

use crate::config::GenerationConfig;
use crate::keys::ApiKey;
use crate::pipeline::payload::{Part, RequestPayload};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tracing::debug;

/// A normalized generation request, built once per dispatch and borrowed
/// for every attempt.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    /// Model identifier, e.g. `"gemini-2.5-flash"`.
    pub model: String,
    /// System instruction sent alongside the payload.
    pub system_instruction: String,
    /// The ordered prompt parts.
    pub payload: RequestPayload,
    /// Sampling temperature.
    pub temperature: f32,
    /// Output token cap.
    pub max_output_tokens: usize,
}

impl GenerateRequest {
    /// Assemble a request from a payload and the run configuration.
    pub fn new(payload: RequestPayload, system_instruction: String, config: &GenerationConfig) -> Self {
        Self {
            model: config.model.clone(),
            system_instruction,
            payload,
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
        }
    }
}

/// A successful remote call.
#[derive(Debug, Clone, Default)]
pub struct GenerateResponse {
    /// Generated text; may be empty (the dispatcher treats that as a
    /// retryable failure).
    pub text: String,
    /// Prompt token count, when the provider reported one.
    pub prompt_tokens: Option<u64>,
    /// Output token count, when the provider reported one.
    pub output_tokens: Option<u64>,
}

/// The error signal from one remote attempt.
///
/// `status` carries the HTTP status code when the server answered at all;
/// `network` marks transport-level failures (connect, timeout) that never
/// reached the server. Exactly one of the two is meaningful per failure.
#[derive(Debug, Clone)]
pub struct RemoteFailure {
    /// HTTP status code, when the server produced a response.
    pub status: Option<u16>,
    /// Human-readable detail, from the provider's error body when present.
    pub message: String,
    /// True for connect/timeout failures with no server response.
    pub network: bool,
}

impl RemoteFailure {
    /// A failure that carries an HTTP status from the server.
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
            network: false,
        }
    }

    /// A transport-level failure (connection refused, timeout, DNS).
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
            network: true,
        }
    }

    /// A malformed or unparseable server response.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
            network: false,
        }
    }
}

impl fmt::Display for RemoteFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(code) => write!(f, "HTTP {}: {}", code, self.message),
            None if self.network => write!(f, "network error: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for RemoteFailure {}

/// Abstraction over the text-generation service.
///
/// Implementors perform exactly one outbound call per `generate`
/// invocation; failover and retry policy live entirely in
/// [`dispatch`](crate::pipeline::dispatch).
///
/// Object-safe: designed to be used as `&dyn TextGenerator`.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Execute one generation attempt with the given key.
    async fn generate(
        &self,
        key: &ApiKey,
        request: &GenerateRequest,
    ) -> Result<GenerateResponse, RemoteFailure>;

    /// Human-readable name for diagnostics.
    fn name(&self) -> &'static str;
}

// ── Gemini REST client ───────────────────────────────────────────────────

/// Client for the Gemini `generateContent` REST endpoint.
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
}

impl GeminiClient {
    /// Create a client against the given endpoint base
    /// (see [`crate::config::DEFAULT_API_BASE_URL`]).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Use a pre-built `reqwest::Client` (connection pool sharing).
    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// Build the JSON body for `models/{model}:generateContent`.
    fn build_body(request: &GenerateRequest) -> Value {
        let parts: Vec<Value> = request
            .payload
            .parts()
            .iter()
            .map(|part| match part {
                Part::Text(text) => json!({ "text": text }),
                Part::InlineData { mime_type, data } => json!({
                    "inlineData": { "mimeType": mime_type, "data": data }
                }),
            })
            .collect();

        json!({
            "contents": [{ "role": "user", "parts": parts }],
            "systemInstruction": { "parts": [{ "text": request.system_instruction }] },
            "generationConfig": {
                "temperature": request.temperature,
                "maxOutputTokens": request.max_output_tokens,
            },
        })
    }

    /// Pull the concatenated candidate text out of a response body.
    fn extract_text(body: &Value) -> String {
        body.get("candidates")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("content"))
            .and_then(|c| c.get("parts"))
            .and_then(Value::as_array)
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|p| p.get("text").and_then(Value::as_str))
                    .collect::<String>()
            })
            .unwrap_or_default()
    }

    /// Pull the provider's error message out of an error body, falling back
    /// to the raw text when the body is not the expected JSON shape.
    fn extract_error_message(raw: &str) -> String {
        serde_json::from_str::<Value>(raw)
            .ok()
            .and_then(|v| {
                v.get("error")
                    .and_then(|e| e.get("message"))
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .unwrap_or_else(|| raw.trim().to_string())
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(
        &self,
        key: &ApiKey,
        request: &GenerateRequest,
    ) -> Result<GenerateResponse, RemoteFailure> {
        let base = self.base_url.trim_end_matches('/');
        let url = format!("{}/v1beta/models/{}:generateContent", base, request.model);
        let body = Self::build_body(request);

        // The key travels in a header, never in the URL: request URLs end up
        // in proxy and server logs.
        let resp = self
            .http
            .post(&url)
            .header("x-goog-api-key", key.expose())
            .json(&body)
            .send()
            .await
            .map_err(|e| RemoteFailure::network(e.to_string()))?;

        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            let raw = resp.text().await.unwrap_or_default();
            return Err(RemoteFailure::http(status, Self::extract_error_message(&raw)));
        }

        let json_resp: Value = resp
            .json()
            .await
            .map_err(|e| RemoteFailure::malformed(format!("unparseable response body: {e}")))?;

        let text = Self::extract_text(&json_resp);
        let usage = json_resp.get("usageMetadata");
        let response = GenerateResponse {
            text,
            prompt_tokens: usage
                .and_then(|u| u.get("promptTokenCount"))
                .and_then(Value::as_u64),
            output_tokens: usage
                .and_then(|u| u.get("candidatesTokenCount"))
                .and_then(Value::as_u64),
        };
        debug!(
            chars = response.text.len(),
            prompt_tokens = ?response.prompt_tokens,
            output_tokens = ?response.output_tokens,
            "generateContent succeeded"
        );
        Ok(response)
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

// ── Mock generator ───────────────────────────────────────────────────────

/// A test generator that plays back scripted outcomes in order.
///
/// Each call consumes the next outcome; when the script is exhausted it
/// keeps returning the last one. The call counter lets tests assert the
/// exact number of attempts the dispatcher made.
pub struct MockGenerator {
    script: Mutex<Vec<Result<GenerateResponse, RemoteFailure>>>,
    calls: AtomicUsize,
}

impl MockGenerator {
    /// Create a mock playing back the given outcomes in order.
    pub fn new(script: Vec<Result<GenerateResponse, RemoteFailure>>) -> Self {
        assert!(!script.is_empty(), "MockGenerator requires at least one outcome");
        Self {
            script: Mutex::new(script),
            calls: AtomicUsize::new(0),
        }
    }

    /// A mock that always succeeds with the given text.
    pub fn fixed(text: impl Into<String>) -> Self {
        Self::new(vec![Ok(GenerateResponse {
            text: text.into(),
            ..Default::default()
        })])
    }

    /// Number of `generate` calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn generate(
        &self,
        _key: &ApiKey,
        _request: &GenerateRequest,
    ) -> Result<GenerateResponse, RemoteFailure> {
        let idx = self.calls.fetch_add(1, Ordering::SeqCst);
        let script = self.script.lock().expect("mock script lock");
        script[idx.min(script.len() - 1)].clone()
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
