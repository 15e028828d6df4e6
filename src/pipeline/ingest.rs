//! Document ingestion: turn an input file into a prompt-ready payload piece.
//!
//! Routing is by extension. Word documents are converted to structured text
//! (tables preserved as pipe rows) because the model handles them better as
//! text than as raw OOXML; PDFs pass through untouched as a base64 inline
//! part so the model reads the pages directly; plain text goes in verbatim.
//! Anything else is refused up front: a garbled binary pasted into the
//! prompt produces garbage output at full token cost.
//!
//! Extracted text is wrapped in begin/end markers naming the source file so
//! the model can tell user-typed notes from uploaded content.

use crate::error::Doc2LessonError;
use crate::pipeline::docx;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::Path;
use tracing::debug;

/// MIME type attached to PDF inline parts.
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// A file converted into submittable form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestedDocument {
    /// Extracted text, markers included, appended to the prompt.
    Text {
        content: String,
        display_name: String,
    },
    /// Opaque binary payload for multimodal submission.
    Binary {
        mime_type: String,
        /// Base64-encoded file contents.
        data: String,
        display_name: String,
    },
}

impl IngestedDocument {
    /// The name of the source file, for status output.
    pub fn display_name(&self) -> &str {
        match self {
            IngestedDocument::Text { display_name, .. } => display_name,
            IngestedDocument::Binary { display_name, .. } => display_name,
        }
    }
}

/// Convert an uploaded file into an [`IngestedDocument`].
///
/// # Errors
/// [`Doc2LessonError::UnsupportedFormat`] for unrecognized extensions,
/// [`Doc2LessonError::CorruptFile`] when a recognized file cannot be read
/// or decoded.
pub async fn ingest_file(path: impl AsRef<Path>) -> Result<IngestedDocument, Doc2LessonError> {
    let path = path.as_ref();
    let display_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "pdf" => ingest_pdf(path, display_name).await,
        "docx" => ingest_docx(path, display_name).await,
        "txt" | "md" | "markdown" | "text" => ingest_plain_text(path, display_name).await,
        _ => Err(Doc2LessonError::unsupported(path.to_path_buf(), &extension)),
    }
}

/// Read a PDF, validate the magic bytes, and base64-encode it.
async fn ingest_pdf(path: &Path, display_name: String) -> Result<IngestedDocument, Doc2LessonError> {
    let bytes = read_bytes(path).await?;

    // Validate the %PDF header before shipping megabytes of garbage to the
    // API: a renamed file fails here with a usable message instead.
    if bytes.len() < 4 || &bytes[..4] != b"%PDF" {
        return Err(Doc2LessonError::CorruptFile {
            path: path.to_path_buf(),
            detail: "not a valid PDF (missing %PDF header)".into(),
        });
    }

    let data = STANDARD.encode(&bytes);
    debug!(file = %display_name, bytes = bytes.len(), b64 = data.len(), "encoded PDF attachment");

    Ok(IngestedDocument::Binary {
        mime_type: PDF_MIME_TYPE.to_string(),
        data,
        display_name,
    })
}

/// Extract DOCX body text with tables as pipe rows.
async fn ingest_docx(
    path: &Path,
    display_name: String,
) -> Result<IngestedDocument, Doc2LessonError> {
    let bytes = read_bytes(path).await?;
    let body = docx::extract_text(&bytes).map_err(|detail| Doc2LessonError::CorruptFile {
        path: path.to_path_buf(),
        detail,
    })?;
    debug!(file = %display_name, chars = body.len(), "extracted DOCX text");

    Ok(IngestedDocument::Text {
        content: wrap_file_content(&display_name, &body),
        display_name,
    })
}

/// Pass plain text through verbatim (markers added).
async fn ingest_plain_text(
    path: &Path,
    display_name: String,
) -> Result<IngestedDocument, Doc2LessonError> {
    let body = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| Doc2LessonError::CorruptFile {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;

    Ok(IngestedDocument::Text {
        content: wrap_file_content(&display_name, &body),
        display_name,
    })
}

async fn read_bytes(path: &Path) -> Result<Vec<u8>, Doc2LessonError> {
    tokio::fs::read(path)
        .await
        .map_err(|e| Doc2LessonError::CorruptFile {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })
}

/// Fence uploaded content so the model can tell it apart from typed notes.
fn wrap_file_content(name: &str, body: &str) -> String {
    format!("\n\n--- CONTENT FROM FILE ({name}) ---\n{body}\n--- END OF FILE CONTENT ---\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(dir: &tempfile::TempDir, name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::File::create(&path)
            .unwrap()
            .write_all(bytes)
            .unwrap();
        path
    }

    fn minimal_docx() -> Vec<u8> {
        use zip::write::SimpleFileOptions;
        let xml = r#"<?xml version="1.0"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
<w:body><w:p><w:r><w:t>Lesson outline</w:t></w:r></w:p></w:body>
</w:document>"#;
        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        writer
            .start_file("word/document.xml", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[tokio::test]
    async fn plain_text_passes_through_with_markers() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(&dir, "notes.txt", b"photosynthesis basics");
        let doc = ingest_file(&path).await.unwrap();
        match doc {
            IngestedDocument::Text { content, display_name } => {
                assert_eq!(display_name, "notes.txt");
                assert!(content.contains("photosynthesis basics"));
                assert!(content.contains("CONTENT FROM FILE (notes.txt)"));
                assert!(content.contains("END OF FILE CONTENT"));
            }
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn pdf_becomes_base64_attachment() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(&dir, "plan.pdf", b"%PDF-1.7 fake body");
        let doc = ingest_file(&path).await.unwrap();
        match doc {
            IngestedDocument::Binary { mime_type, data, display_name } => {
                assert_eq!(mime_type, PDF_MIME_TYPE);
                assert_eq!(display_name, "plan.pdf");
                let decoded = STANDARD.decode(&data).unwrap();
                assert!(decoded.starts_with(b"%PDF"));
            }
            other => panic!("expected binary, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn renamed_non_pdf_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(&dir, "fake.pdf", b"<html>not a pdf</html>");
        let err = ingest_file(&path).await.unwrap_err();
        assert!(matches!(err, Doc2LessonError::CorruptFile { .. }), "got: {err}");
        assert!(err.to_string().contains("%PDF"));
    }

    #[tokio::test]
    async fn docx_is_extracted_to_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(&dir, "lesson.docx", &minimal_docx());
        let doc = ingest_file(&path).await.unwrap();
        match doc {
            IngestedDocument::Text { content, .. } => {
                assert!(content.contains("Lesson outline"), "got: {content}");
            }
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn broken_docx_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(&dir, "broken.docx", b"these are not zip bytes");
        let err = ingest_file(&path).await.unwrap_err();
        assert!(matches!(err, Doc2LessonError::CorruptFile { .. }), "got: {err}");
    }

    #[tokio::test]
    async fn unknown_extension_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(&dir, "slides.pptx", b"whatever");
        let err = ingest_file(&path).await.unwrap_err();
        assert!(matches!(err, Doc2LessonError::UnsupportedFormat { .. }), "got: {err}");
    }

    #[tokio::test]
    async fn legacy_doc_is_unsupported_with_hint() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(&dir, "old.doc", b"\xd0\xcf\x11\xe0");
        let err = ingest_file(&path).await.unwrap_err();
        assert!(err.to_string().contains(".docx"), "got: {err}");
    }

    #[tokio::test]
    async fn missing_file_is_corrupt() {
        let err = ingest_file("/nonexistent/never.txt").await.unwrap_err();
        assert!(matches!(err, Doc2LessonError::CorruptFile { .. }));
    }
}
