//! API-key parsing and masking.
//!
//! Users paste one or more Gemini keys into a single text field (or env
//! var); [`parse_keys`] turns that blob into an ordered candidate list for
//! the dispatcher. Order is preserved because the first-listed key is tried
//! first, and duplicates are kept: deduplicating would silently change the
//! failover sequence the user chose.
//!
//! [`ApiKey`] is a newtype so the full secret can never leak through
//! `Debug`/`Display`: both render at most the first eight characters.

use std::fmt;

/// Every Google AI Studio key starts with this literal prefix.
pub const KEY_PREFIX: &str = "AIza";

/// How many leading characters of a key are safe to show in logs.
const MASK_VISIBLE: usize = 8;

/// A single Gemini API key.
///
/// Construct via [`parse_keys`] or [`ApiKey::new`]. The wrapped secret is
/// only reachable through [`ApiKey::expose`], which keeps accidental
/// formatting of the full key out of log output.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap an already-validated key string.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The full secret, for building the outbound request.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// A short non-identifying prefix for diagnostics, e.g. `"AIzaSyAb…"`.
    pub fn masked(&self) -> String {
        let visible: String = self.0.chars().take(MASK_VISIBLE).collect();
        format!("{visible}…")
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ApiKey").field(&self.masked()).finish()
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.masked())
    }
}

/// Extract candidate keys from a raw user-entered blob.
///
/// Splits on newline or comma runs, trims each token, and keeps only
/// non-empty tokens carrying the [`KEY_PREFIX`]. Relative order is
/// preserved and duplicates are not removed. Pure function, no I/O.
pub fn parse_keys(raw: &str) -> Vec<ApiKey> {
    raw.split(['\n', ','])
        .map(str::trim)
        .filter(|t| !t.is_empty() && t.starts_with(KEY_PREFIX))
        .map(ApiKey::new)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_splits_on_newlines_and_commas() {
        let keys = parse_keys("AIzaFoo\nAIzaBar,AIzaBaz");
        let got: Vec<&str> = keys.iter().map(|k| k.expose()).collect();
        assert_eq!(got, vec!["AIzaFoo", "AIzaBar", "AIzaBaz"]);
    }

    #[test]
    fn parse_trims_and_drops_invalid_tokens() {
        let keys = parse_keys("  AIzaFoo \n, bogus\nAIzaBar");
        let got: Vec<&str> = keys.iter().map(|k| k.expose()).collect();
        assert_eq!(got, vec!["AIzaFoo", "AIzaBar"]);
    }

    #[test]
    fn parse_empty_blob_yields_nothing() {
        assert!(parse_keys("").is_empty());
        assert!(parse_keys("  \n , \n").is_empty());
        assert!(parse_keys("sk-wrong-family").is_empty());
    }

    #[test]
    fn parse_preserves_order_and_duplicates() {
        let keys = parse_keys("AIzaB\nAIzaA\nAIzaB");
        let got: Vec<&str> = keys.iter().map(|k| k.expose()).collect();
        assert_eq!(got, vec!["AIzaB", "AIzaA", "AIzaB"]);
    }

    #[test]
    fn parse_is_idempotent() {
        let blob = "AIzaOne, AIzaTwo\nnoise";
        assert_eq!(parse_keys(blob), parse_keys(blob));
    }

    #[test]
    fn debug_and_display_mask_the_secret() {
        let key = ApiKey::new("AIzaSyA1234567890abcdef");
        let debug = format!("{:?}", key);
        let display = format!("{}", key);
        assert!(!debug.contains("1234567890abcdef"), "got: {debug}");
        assert!(debug.contains("AIzaSyA1"), "got: {debug}");
        assert!(!display.contains("abcdef"));
        assert!(display.ends_with('…'));
    }

    #[test]
    fn masked_handles_short_keys() {
        let key = ApiKey::new("AIza");
        assert_eq!(key.masked(), "AIza…");
    }
}
