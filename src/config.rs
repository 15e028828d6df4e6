//! Configuration types for lesson-plan generation.
//!
//! All generation behaviour is controlled through [`GenerationConfig`],
//! built via its [`GenerationConfigBuilder`]. Keys are deliberately *not*
//! part of the config: they travel with each request so no process-wide
//! credential state exists, and a caller can run two dispatches with
//! different key sets against one shared config.

use crate::error::Doc2LessonError;

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Default endpoint base; overridable for tests and regional proxies.
pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Configuration for one generation run.
///
/// Built via [`GenerationConfig::builder()`] or
/// [`GenerationConfig::default()`].
///
/// # Example
/// ```rust
/// use doc2lesson::GenerationConfig;
///
/// let config = GenerationConfig::builder()
///     .model("gemini-2.5-pro")
///     .temperature(0.1)
///     .retry_delay_ms(250)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    /// Model identifier, e.g. "gemini-2.5-flash". Default: [`DEFAULT_MODEL`].
    pub model: String,

    /// Sampling temperature. Default: 0.2.
    ///
    /// Low temperature keeps the model faithful to the source document;
    /// lesson digitization is transcription, not creative writing.
    pub temperature: f32,

    /// Maximum tokens the model may generate. Default: 8192.
    ///
    /// A full lesson plan with a complete proceedings table routinely runs
    /// past 4 000 output tokens; setting this too low truncates the table
    /// mid-row.
    pub max_output_tokens: usize,

    /// Delay between failover attempts in milliseconds. Default: 500.
    ///
    /// One fixed short pause before moving to the next key keeps a burst of
    /// quota failures from hammering the endpoint in a tight loop. This is
    /// not per-key retry backoff: each key is attempted exactly once.
    pub retry_delay_ms: u64,

    /// Per-attempt call timeout in seconds. Default: 60.
    ///
    /// A hung connection would otherwise stall the whole failover loop; a
    /// timed-out attempt is classified as retryable so the next key still
    /// gets its turn.
    pub api_timeout_secs: u64,

    /// Endpoint base URL. Default: [`DEFAULT_API_BASE_URL`].
    pub api_base_url: String,

    /// Custom system instruction. If None, uses the built-in default.
    pub system_prompt: Option<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.2,
            max_output_tokens: 8192,
            retry_delay_ms: 500,
            api_timeout_secs: 60,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            system_prompt: None,
        }
    }
}

impl GenerationConfig {
    /// Create a new builder for `GenerationConfig`.
    pub fn builder() -> GenerationConfigBuilder {
        GenerationConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`GenerationConfig`].
#[derive(Debug)]
pub struct GenerationConfigBuilder {
    config: GenerationConfig,
}

impl GenerationConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_output_tokens(mut self, n: usize) -> Self {
        self.config.max_output_tokens = n;
        self
    }

    pub fn retry_delay_ms(mut self, ms: u64) -> Self {
        self.config.retry_delay_ms = ms;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_base_url = url.into();
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<GenerationConfig, Doc2LessonError> {
        let c = &self.config;
        if c.model.trim().is_empty() {
            return Err(Doc2LessonError::InvalidConfig(
                "Model identifier must not be empty".into(),
            ));
        }
        if c.max_output_tokens == 0 {
            return Err(Doc2LessonError::InvalidConfig(
                "max_output_tokens must be ≥ 1".into(),
            ));
        }
        if c.api_timeout_secs == 0 {
            return Err(Doc2LessonError::InvalidConfig(
                "api_timeout_secs must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_builds() {
        let config = GenerationConfig::builder().build().unwrap();
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.retry_delay_ms, 500);
        assert_eq!(config.api_timeout_secs, 60);
    }

    #[test]
    fn temperature_is_clamped() {
        let config = GenerationConfig::builder().temperature(5.0).build().unwrap();
        assert_eq!(config.temperature, 2.0);
        let config = GenerationConfig::builder().temperature(-1.0).build().unwrap();
        assert_eq!(config.temperature, 0.0);
    }

    #[test]
    fn empty_model_rejected() {
        let err = GenerationConfig::builder().model("  ").build();
        assert!(matches!(err, Err(Doc2LessonError::InvalidConfig(_))));
    }

    #[test]
    fn zero_max_tokens_rejected() {
        let err = GenerationConfig::builder().max_output_tokens(0).build();
        assert!(matches!(err, Err(Doc2LessonError::InvalidConfig(_))));
    }

    #[test]
    fn zero_timeout_rejected() {
        let err = GenerationConfig::builder().api_timeout_secs(0).build();
        assert!(matches!(err, Err(Doc2LessonError::InvalidConfig(_))));
    }
}
