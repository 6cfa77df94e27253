//! Language model seam used by the reporter

use crate::config::{LlmConfig, LlmProviderKind};
use crate::error::ConfigError;
use async_trait::async_trait;
use digest_llm::providers::{AnthropicProvider, OpenAIConfig, OpenAIProvider};
use digest_llm::{CompletionRequest, LLMError, LLMProvider};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Turns a prompt into completion text
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, LLMError>;
}

/// [`LanguageModel`] backed by an [`LLMProvider`]
///
/// Sends the prompt as a single user turn and returns the generated text.
pub struct ProviderModel {
    provider: Arc<dyn LLMProvider>,
    model: String,
    max_tokens: usize,
    system_prompt: Option<String>,
    temperature: Option<f32>,
}

impl ProviderModel {
    /// Default completion budget
    pub const DEFAULT_MAX_TOKENS: usize = 4096;

    pub fn new(provider: Arc<dyn LLMProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            max_tokens: Self::DEFAULT_MAX_TOKENS,
            system_prompt: None,
            temperature: None,
        }
    }

    /// Build the provider named in `config`, reading credentials from the environment
    pub fn from_config(config: &LlmConfig) -> Result<Self, ConfigError> {
        let provider: Arc<dyn LLMProvider> = match config.provider {
            LlmProviderKind::Anthropic => {
                let mut provider = AnthropicProvider::from_env(config.timeout_secs)?;
                if let Some(api_base) = &config.api_base {
                    provider = provider.with_api_base(api_base);
                }
                Arc::new(provider)
            }
            LlmProviderKind::OpenAI => {
                let openai = openai_settings(OpenAIConfig::from_env()?, config);
                Arc::new(OpenAIProvider::with_config(openai)?)
            }
        };

        let model_name = config
            .model_name()
            .ok_or_else(|| ConfigError::Invalid("llm.model is not set".to_string()))?;
        let mut model = Self::new(provider, model_name).with_max_tokens(config.max_tokens);
        model.system_prompt.clone_from(&config.system_prompt);
        model.temperature = config.temperature;
        Ok(model)
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Model identifier sent with every request
    pub fn model(&self) -> &str {
        &self.model
    }

    fn request(&self, prompt: &str) -> CompletionRequest {
        CompletionRequest::new(&self.model, prompt)
            .with_max_tokens(self.max_tokens)
            .maybe_system(self.system_prompt.clone())
            .maybe_temperature(self.temperature)
    }
}

/// Apply the `llm` section on top of the environment-derived OpenAI settings
fn openai_settings(base: OpenAIConfig, config: &LlmConfig) -> OpenAIConfig {
    let mut openai = base.with_timeout(config.timeout_secs);
    if let Some(api_base) = &config.api_base {
        openai = openai.with_api_base(api_base);
    }
    for model in config.allowed_models.iter().flatten() {
        openai = openai.allow_model(model);
    }
    openai
}

#[async_trait]
impl LanguageModel for ProviderModel {
    #[instrument(skip(self, prompt), fields(provider = self.provider.name(), model = %self.model))]
    async fn complete(&self, prompt: &str) -> Result<String, LLMError> {
        let completion = self.provider.complete(&self.request(prompt)).await?;

        debug!(
            input_tokens = completion.usage.input_tokens,
            output_tokens = completion.usage.output_tokens,
            stop_reason = ?completion.stop_reason,
            "Completion received"
        );
        if completion.is_truncated() {
            warn!(max_tokens = self.max_tokens, "Completion truncated at max_tokens");
        }

        Ok(completion.text)
    }
}
