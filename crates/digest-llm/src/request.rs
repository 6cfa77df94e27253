//! Completion request

use serde::{Deserialize, Serialize};

/// Completion budget used when none is set
pub const DEFAULT_MAX_TOKENS: usize = 4096;

/// One prompt for one model
///
/// The prompt is sent as a single user turn; there is no conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Provider-specific model identifier
    pub model: String,

    /// User prompt
    pub prompt: String,

    /// Instructions sent ahead of the prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// Upper bound on generated tokens
    pub max_tokens: usize,

    /// Sampling temperature; the provider default applies when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            system: None,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: None,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set or clear the system prompt
    pub fn maybe_system(mut self, system: Option<String>) -> Self {
        self.system = system;
        self
    }

    /// Set or clear the temperature
    pub fn maybe_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }
}
