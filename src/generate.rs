//! Generation entry points: assemble the prompt, run the key-failover
//! dispatch, clean the result.
//!
//! The flow mirrors the pipeline layout:
//!
//! ```text
//! request ──▶ prompt assembly ──▶ dispatch (key failover) ──▶ postprocess
//! (form/file)   (prompts)          (gemini + keys)            (cleanup)
//! ```
//!
//! [`generate`] builds a real [`GeminiClient`] from the config;
//! [`generate_with`] takes any [`TextGenerator`] so callers (and tests) can
//! substitute their own transport.

use crate::config::GenerationConfig;
use crate::error::Doc2LessonError;
use crate::keys::parse_keys;
use crate::output::{GenerationOutput, GenerationStats};
use crate::pipeline::dispatch::dispatch;
use crate::pipeline::gemini::{GeminiClient, GenerateRequest, TextGenerator};
use crate::pipeline::ingest::IngestedDocument;
use crate::pipeline::payload::{Part, RequestPayload};
use crate::pipeline::postprocess;
use crate::prompts::{self, LessonForm};
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// What the user wants generated.
#[derive(Debug, Clone)]
pub enum PromptSource {
    /// Create a brand-new plan from form fields.
    Create(LessonForm),
    /// Re-create an existing plan (pasted or extracted text) with
    /// competency codes added.
    Digitize { content: String },
}

/// One end-to-end generation request.
///
/// Keys travel with the request, not the config: credential state is owned
/// by the caller and lives exactly as long as this value.
#[derive(Clone)]
pub struct GenerationRequest {
    /// The prompt source.
    pub source: PromptSource,
    /// Optional ingested file. Text attachments are appended to the prompt
    /// content; binary attachments are submitted as an inline payload part.
    pub attachment: Option<IngestedDocument>,
    /// Raw key blob as entered by the user (newline- or comma-separated).
    pub key_blob: String,
}

impl std::fmt::Debug for GenerationRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationRequest")
            .field("source", &self.source)
            .field(
                "attachment",
                &self.attachment.as_ref().map(IngestedDocument::display_name),
            )
            .field("key_blob", &"<redacted>")
            .finish()
    }
}

/// Generate a lesson plan via the Gemini endpoint configured in `config`.
pub async fn generate(
    request: &GenerationRequest,
    config: &GenerationConfig,
) -> Result<GenerationOutput, Doc2LessonError> {
    let client = GeminiClient::new(config.api_base_url.clone());
    generate_with(&client, request, config).await
}

/// Generate a lesson plan through the supplied generator.
pub async fn generate_with(
    generator: &dyn TextGenerator,
    request: &GenerationRequest,
    config: &GenerationConfig,
) -> Result<GenerationOutput, Doc2LessonError> {
    let start = Instant::now();

    let keys = parse_keys(&request.key_blob);
    let payload = assemble_payload(request);
    let system_instruction = config
        .system_prompt
        .clone()
        .unwrap_or_else(|| prompts::SYSTEM_INSTRUCTION.to_string());
    let generate_request = GenerateRequest::new(payload, system_instruction, config);

    let outcome = dispatch(generator, &keys, &generate_request, config).await?;
    let markdown = postprocess::clean_markdown(&outcome.text);

    let stats = GenerationStats {
        keys_available: keys.len(),
        attempts: outcome.attempts,
        prompt_tokens: outcome.prompt_tokens,
        output_tokens: outcome.output_tokens,
        duration_ms: start.elapsed().as_millis() as u64,
        model: config.model.clone(),
    };
    info!(
        attempts = stats.attempts,
        duration_ms = stats.duration_ms,
        chars = markdown.len(),
        "generation complete"
    );

    Ok(GenerationOutput { markdown, stats })
}

/// Generate and write the Markdown to a file.
///
/// Uses an atomic write (temp file + rename) so a failed run never leaves a
/// half-written plan behind.
pub async fn generate_to_file(
    request: &GenerationRequest,
    output_path: impl AsRef<Path>,
    config: &GenerationConfig,
) -> Result<GenerationStats, Doc2LessonError> {
    let output = generate(request, config).await?;
    write_markdown(output_path.as_ref(), &output.markdown).await?;
    Ok(output.stats)
}

/// Atomically write markdown to `path`.
pub(crate) async fn write_markdown(path: &Path, markdown: &str) -> Result<(), Doc2LessonError> {
    let wrap_err = |source: std::io::Error| Doc2LessonError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.map_err(wrap_err)?;
        }
    }

    let tmp_path = path.with_extension("md.tmp");
    tokio::fs::write(&tmp_path, markdown).await.map_err(wrap_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(wrap_err)?;
    Ok(())
}

/// Fold the request's attachment into the prompt and build the final
/// payload: binary part first, prompt text second.
fn assemble_payload(request: &GenerationRequest) -> RequestPayload {
    let text_attachment = match &request.attachment {
        Some(IngestedDocument::Text { content, .. }) => Some(content.as_str()),
        _ => None,
    };

    let prompt = match &request.source {
        PromptSource::Create(form) => {
            let mut form = form.clone();
            if let Some(extra) = text_attachment {
                form.notes.push_str(extra);
            }
            prompts::build_create_prompt(&form)
        }
        PromptSource::Digitize { content } => {
            let mut body = content.clone();
            if let Some(extra) = text_attachment {
                body.push_str(extra);
            }
            if body.trim().is_empty() {
                if let Some(IngestedDocument::Binary { display_name, .. }) = &request.attachment {
                    body = format!(
                        "(Uploaded file: {display_name}. Read every page of the attachment.)"
                    );
                }
            }
            prompts::build_digitize_prompt(&body)
        }
    };

    let mut payload = RequestPayload::default();
    if let Some(IngestedDocument::Binary {
        mime_type, data, ..
    }) = &request.attachment
    {
        payload.push(Part::inline_data(mime_type.clone(), data.clone()));
    }
    payload.push(Part::text(prompt));
    payload
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::gemini::{GenerateResponse, MockGenerator};

    fn create_request(key_blob: &str) -> GenerationRequest {
        GenerationRequest {
            source: PromptSource::Create(LessonForm {
                subject: "Biology".into(),
                grade: "10".into(),
                textbook: "Pathways".into(),
                duration: "1 period".into(),
                title: "Cell structure".into(),
                notes: "Focus on organelles.".into(),
            }),
            attachment: None,
            key_blob: key_blob.to_string(),
        }
    }

    #[test]
    fn payload_for_create_is_text_only() {
        let payload = assemble_payload(&create_request("AIzaKey"));
        assert_eq!(payload.parts().len(), 1);
        match &payload.parts()[0] {
            Part::Text(prompt) => {
                assert!(prompt.contains("Cell structure"));
                assert!(prompt.contains("organelles"));
            }
            other => panic!("expected text part, got {other:?}"),
        }
    }

    #[test]
    fn text_attachment_is_appended_to_notes() {
        let mut request = create_request("AIzaKey");
        request.attachment = Some(IngestedDocument::Text {
            content: "\n--- CONTENT FROM FILE (x.docx) ---\nMitochondria table\n".into(),
            display_name: "x.docx".into(),
        });
        let payload = assemble_payload(&request);
        match &payload.parts()[0] {
            Part::Text(prompt) => assert!(prompt.contains("Mitochondria table")),
            other => panic!("expected text part, got {other:?}"),
        }
    }

    #[test]
    fn binary_attachment_leads_the_payload() {
        let request = GenerationRequest {
            source: PromptSource::Digitize { content: String::new() },
            attachment: Some(IngestedDocument::Binary {
                mime_type: "application/pdf".into(),
                data: "QUJD".into(),
                display_name: "plan.pdf".into(),
            }),
            key_blob: "AIzaKey".into(),
        };
        let payload = assemble_payload(&request);
        assert_eq!(payload.parts().len(), 2);
        assert!(payload.parts()[0].is_binary());
        match &payload.parts()[1] {
            // With no pasted text, the prompt still names the upload.
            Part::Text(prompt) => assert!(prompt.contains("plan.pdf"), "got: {prompt}"),
            other => panic!("expected text part, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn generate_with_cleans_output_and_fills_stats() {
        let mock = MockGenerator::new(vec![Ok(GenerateResponse {
            text: "```markdown\n# Plan\n\nBody.\n```".into(),
            prompt_tokens: Some(100),
            output_tokens: Some(500),
        })]);
        let config = GenerationConfig::default();
        let output = generate_with(&mock, &create_request("AIzaOnly"), &config)
            .await
            .unwrap();

        assert!(output.markdown.starts_with("# Plan"), "got: {}", output.markdown);
        assert!(!output.markdown.contains("```"));
        assert_eq!(output.stats.keys_available, 1);
        assert_eq!(output.stats.attempts, 1);
        assert_eq!(output.stats.output_tokens, Some(500));
        assert_eq!(output.stats.model, config.model);
    }

    #[tokio::test]
    async fn generate_with_rejects_empty_key_blob_without_calls() {
        let mock = MockGenerator::fixed("never used");
        let config = GenerationConfig::default();
        let err = generate_with(&mock, &create_request("not-a-key"), &config)
            .await
            .unwrap_err();
        assert!(matches!(err, Doc2LessonError::NoApiKeys));
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn write_markdown_is_atomic_and_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/plans/lesson.md");
        write_markdown(&path, "# Plan\n").await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# Plan\n");
        assert!(!path.with_extension("md.tmp").exists());
    }
}
