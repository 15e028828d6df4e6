//! DOCX text extraction: `word/document.xml` → plain text with pipe tables.
//!
//! A `.docx` file is an OPC zip container holding WordprocessingML. Only
//! two layers matter for prompt building: paragraph text and tables. Tables
//! are emitted as GFM pipe rows because the lesson-plan proceedings table
//! is the part the model must reproduce structurally; feeding it pipe rows
//! keeps row/column alignment intact, where flattened text loses it.
//! Multiple paragraphs inside one cell are joined with `<br>`, the same
//! in-cell line-break convention the generated plan uses.
//!
//! Formatting runs, styles, images, headers and footers are ignored.

use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Cursor, Read};
use zip::ZipArchive;

/// Extract the document body as text, tables rendered as pipe rows.
///
/// Errors are returned as a human-readable detail string; the caller wraps
/// them into [`Doc2LessonError::CorruptFile`](crate::error::Doc2LessonError).
pub(crate) fn extract_text(bytes: &[u8]) -> Result<String, String> {
    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).map_err(|e| format!("not a DOCX archive: {e}"))?;

    let mut document = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|_| "missing word/document.xml (is this really a .docx?)".to_string())?
        .read_to_string(&mut document)
        .map_err(|e| format!("unreadable document.xml: {e}"))?;

    let text = walk_document(&document)?;
    if text.trim().is_empty() {
        return Err("document body contains no text".into());
    }
    Ok(text)
}

/// Stream the WordprocessingML event-by-event, accumulating paragraphs and
/// table rows.
fn walk_document(xml: &str) -> Result<String, String> {
    let mut reader = Reader::from_str(xml);

    let mut out = String::new();
    let mut paragraph = String::new();
    let mut cell = String::new();
    let mut row: Vec<String> = Vec::new();
    let mut table_depth = 0usize;
    let mut header_emitted = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"tbl" => {
                    table_depth += 1;
                    header_emitted = false;
                }
                b"tr" if table_depth > 0 => row.clear(),
                b"tc" if table_depth > 0 => cell.clear(),
                b"br" => {
                    if table_depth > 0 {
                        cell.push_str("<br>");
                    } else {
                        paragraph.push('\n');
                    }
                }
                b"tab" => {
                    if table_depth > 0 {
                        cell.push(' ');
                    } else {
                        paragraph.push('\t');
                    }
                }
                _ => {}
            },
            Ok(Event::Text(t)) => {
                let text = t
                    .unescape()
                    .map_err(|e| format!("invalid XML text content: {e}"))?;
                if table_depth > 0 {
                    cell.push_str(&text);
                } else {
                    paragraph.push_str(&text);
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"p" => {
                    if table_depth > 0 {
                        cell.push_str("<br>");
                    } else {
                        out.push_str(paragraph.trim_end());
                        out.push('\n');
                        paragraph.clear();
                    }
                }
                b"tc" if table_depth > 0 => {
                    let cleaned = cell.trim_end_matches("<br>").trim().to_string();
                    row.push(cleaned);
                }
                b"tr" if table_depth > 0 => {
                    if !row.is_empty() {
                        out.push_str("| ");
                        out.push_str(&row.join(" | "));
                        out.push_str(" |\n");
                        if !header_emitted {
                            out.push('|');
                            for _ in 0..row.len() {
                                out.push_str(" :--- |");
                            }
                            out.push('\n');
                            header_emitted = true;
                        }
                    }
                }
                b"tbl" => {
                    table_depth = table_depth.saturating_sub(1);
                    out.push('\n');
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(format!(
                    "invalid XML at byte {}: {e}",
                    reader.buffer_position()
                ))
            }
            Ok(_) => {}
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    /// Build an in-memory docx holding the given document.xml body.
    fn docx_with_body(body: &str) -> Vec<u8> {
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
<w:body>{body}</w:body>
</w:document>"#
        );
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("word/document.xml", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    fn para(text: &str) -> String {
        format!("<w:p><w:r><w:t>{text}</w:t></w:r></w:p>")
    }

    #[test]
    fn extracts_paragraph_text() {
        let bytes = docx_with_body(&format!("{}{}", para("Objectives"), para("Equipment")));
        let text = extract_text(&bytes).unwrap();
        assert_eq!(text, "Objectives\nEquipment\n");
    }

    #[test]
    fn renders_tables_as_pipe_rows() {
        let body = format!(
            "<w:tbl><w:tr><w:tc>{}</w:tc><w:tc>{}</w:tc></w:tr>\
             <w:tr><w:tc>{}</w:tc><w:tc>{}</w:tc></w:tr></w:tbl>",
            para("Activity"),
            para("Product"),
            para("Warm-up quiz"),
            para("Answers on the board"),
        );
        let bytes = docx_with_body(&body);
        let text = extract_text(&bytes).unwrap();
        assert!(text.contains("| Activity | Product |"), "got: {text}");
        assert!(text.contains("| :--- | :--- |"), "got: {text}");
        assert!(text.contains("| Warm-up quiz | Answers on the board |"));
    }

    #[test]
    fn joins_cell_paragraphs_with_br() {
        let body = format!(
            "<w:tbl><w:tr><w:tc>{}{}</w:tc></w:tr></w:tbl>",
            para("Teacher: asks"),
            para("Students: answer"),
        );
        let bytes = docx_with_body(&body);
        let text = extract_text(&bytes).unwrap();
        assert!(
            text.contains("| Teacher: asks<br>Students: answer |"),
            "got: {text}"
        );
    }

    #[test]
    fn unescapes_entities() {
        let bytes = docx_with_body(&para("Q&amp;A &lt;review&gt;"));
        let text = extract_text(&bytes).unwrap();
        assert!(text.contains("Q&A <review>"));
    }

    #[test]
    fn rejects_non_zip_bytes() {
        let err = extract_text(b"plainly not a zip").unwrap_err();
        assert!(err.contains("not a DOCX archive"), "got: {err}");
    }

    #[test]
    fn rejects_zip_without_document_xml() {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("other.txt", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"hi").unwrap();
        let bytes = writer.finish().unwrap().into_inner();
        let err = extract_text(&bytes).unwrap_err();
        assert!(err.contains("word/document.xml"), "got: {err}");
    }

    #[test]
    fn rejects_empty_body() {
        let bytes = docx_with_body("");
        let err = extract_text(&bytes).unwrap_err();
        assert!(err.contains("no text"), "got: {err}");
    }
}
