//! Output types returned by the generation entry points.

use serde::{Deserialize, Serialize};

/// The result of a generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationOutput {
    /// The cleaned lesson-plan Markdown.
    pub markdown: String,
    /// Accounting for the run.
    pub stats: GenerationStats,
}

/// Run accounting: how many keys were available, how many attempts were
/// spent, and what the winning attempt cost.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationStats {
    /// Valid keys parsed from the supplied blob.
    pub keys_available: usize,
    /// Attempts made, including the successful one.
    pub attempts: usize,
    /// Prompt token count reported by the provider, if any.
    pub prompt_tokens: Option<u64>,
    /// Output token count reported by the provider, if any.
    pub output_tokens: Option<u64>,
    /// Wall-clock duration of the whole run in milliseconds.
    pub duration_ms: u64,
    /// Model that produced the output.
    pub model: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_serialize_to_json() {
        let stats = GenerationStats {
            keys_available: 2,
            attempts: 1,
            prompt_tokens: Some(1200),
            output_tokens: Some(3400),
            duration_ms: 8200,
            model: "gemini-2.5-flash".into(),
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["attempts"], 1);
        assert_eq!(json["output_tokens"], 3400);
        assert_eq!(json["model"], "gemini-2.5-flash");
    }
}
