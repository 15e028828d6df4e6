//! Request payload model: the ordered parts submitted to the model.
//!
//! A payload is a sequence of parts: prompt text and, optionally, an
//! opaque binary attachment (a PDF the model reads directly). The wire
//! encoding of these parts belongs to the client in
//! [`gemini`](crate::pipeline::gemini); this module stays transport-free so
//! the dispatcher can be tested without touching JSON.

/// One element of a [`RequestPayload`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    /// Plain prompt text.
    Text(String),
    /// An opaque binary attachment, base64-encoded.
    InlineData {
        /// MIME type, e.g. `"application/pdf"`.
        mime_type: String,
        /// Base64-encoded file contents.
        data: String,
    },
}

impl Part {
    /// Shorthand for a text part.
    pub fn text(value: impl Into<String>) -> Self {
        Part::Text(value.into())
    }

    /// Shorthand for a binary attachment part.
    pub fn inline_data(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Part::InlineData {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Whether this part is a binary attachment.
    pub fn is_binary(&self) -> bool {
        matches!(self, Part::InlineData { .. })
    }
}

/// The full, ordered content of one generation request.
///
/// Attachments come before the prompt text so the model reads the source
/// document first. The dispatcher treats the payload as immutable: it is
/// borrowed for every attempt and never cloned or reordered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestPayload {
    parts: Vec<Part>,
}

impl RequestPayload {
    /// A payload holding only prompt text.
    pub fn from_text(prompt: impl Into<String>) -> Self {
        Self {
            parts: vec![Part::text(prompt)],
        }
    }

    /// A payload holding a binary attachment followed by prompt text.
    pub fn with_attachment(
        mime_type: impl Into<String>,
        data: impl Into<String>,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            parts: vec![Part::inline_data(mime_type, data), Part::text(prompt)],
        }
    }

    /// Append a part, preserving insertion order.
    pub fn push(&mut self, part: Part) {
        self.parts.push(part);
    }

    /// The parts in submission order.
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// True when no parts have been added.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Whether any part is a binary attachment.
    pub fn has_attachment(&self) -> bool {
        self.parts.iter().any(Part::is_binary)
    }
}
