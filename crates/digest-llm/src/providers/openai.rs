//! OpenAI chat completions and compatible servers (vLLM, LM Studio, DeepSeek, ...)
//!
//! See: https://platform.openai.com/docs/api-reference/chat
//!
//! # Examples
//!
//! ```no_run
//! use digest_llm::{CompletionRequest, LLMProvider};
//! use digest_llm::providers::{OpenAIConfig, OpenAIProvider};
//!
//! # async fn run() -> digest_llm::Result<()> {
//! // Local servers usually ignore the key
//! let config = OpenAIConfig::new("not-needed")
//!     .with_api_base("http://localhost:1234/v1")
//!     .with_timeout(180);
//! let provider = OpenAIProvider::with_config(config)?;
//!
//! let request = CompletionRequest::new("qwen2.5-7b-instruct", "Summarize today's headlines");
//! let completion = provider.complete(&request).await?;
//! println!("{}", completion.text);
//! # Ok(())
//! # }
//! ```

use crate::{Completion, CompletionRequest, LLMError, LLMProvider, Result, StopReason, TokenUsage};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 120;
const API_KEY_VAR: &str = "OPENAI_API_KEY";
const API_BASE_VAR: &str = "OPENAI_API_BASE";

/// Connection settings for an OpenAI-compatible endpoint
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    pub api_key: String,

    /// Base URL, e.g. "https://api.openai.com/v1"
    pub api_base: String,

    pub timeout_secs: u64,

    /// When set, requests for other models are refused before sending
    pub allowed_models: Option<Vec<String>>,
}

impl OpenAIConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            allowed_models: None,
        }
    }

    /// Key from `OPENAI_API_KEY`, base URL from `OPENAI_API_BASE` when set
    pub fn from_env() -> Result<Self> {
        let mut config = Self::new(LLMError::require_env(API_KEY_VAR)?);
        if let Ok(api_base) = std::env::var(API_BASE_VAR) {
            config.api_base = api_base;
        }
        Ok(config)
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Add a model to the allow-list
    pub fn allow_model(mut self, model: impl Into<String>) -> Self {
        self.allowed_models
            .get_or_insert_with(Vec::new)
            .push(model.into());
        self
    }
}

/// OpenAI-compatible provider
pub struct OpenAIProvider {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIProvider {
    pub fn with_config(config: OpenAIConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    /// Provider configured from `OPENAI_API_KEY` / `OPENAI_API_BASE`
    pub fn from_env() -> Result<Self> {
        Self::with_config(OpenAIConfig::from_env()?)
    }

    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }

    fn check_model(&self, model: &str) -> Result<()> {
        match &self.config.allowed_models {
            Some(allowed) if !allowed.iter().any(|m| m == model) => Err(LLMError::InvalidRequest(
                format!("model '{model}' is not in the allowed list {allowed:?}"),
            )),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    #[instrument(skip(self, request), fields(model = %request.model, api_base = %self.config.api_base))]
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
        self.check_model(&request.model)?;
        debug!("Sending chat completion request");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.api_base))
            .bearer_auth(&self.config.api_key)
            .json(&ChatRequest::from(request))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(LLMError::from_status(status.as_u16(), body, &request.model));
        }

        parse_response(&body)
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

impl<'a> From<&'a CompletionRequest> for ChatRequest<'a> {
    fn from(request: &'a CompletionRequest) -> Self {
        let system = request.system.as_deref().map(|content| ChatMessage {
            role: "system",
            content,
        });
        let user = ChatMessage {
            role: "user",
            content: &request.prompt,
        };

        Self {
            model: &request.model,
            messages: system.into_iter().chain(std::iter::once(user)).collect(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Usage,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Usage {
    prompt_tokens: usize,
    completion_tokens: usize,
}

fn parse_response(body: &str) -> Result<Completion> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| LLMError::UnexpectedResponse(format!("Failed to parse response: {e}")))?;

    // Only one choice is ever requested
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LLMError::UnexpectedResponse("response has no choices".to_string()))?;

    Ok(Completion {
        text: choice.message.content.unwrap_or_default(),
        stop_reason: map_stop_reason(choice.finish_reason.as_deref()),
        usage: TokenUsage {
            input_tokens: response.usage.prompt_tokens,
            output_tokens: response.usage.completion_tokens,
        },
    })
}

fn map_stop_reason(reason: Option<&str>) -> StopReason {
    match reason {
        Some("stop") => StopReason::Finished,
        Some("length") => StopReason::Truncated,
        Some("content_filter") => StopReason::Filtered,
        other => {
            debug!(reason = ?other, "Unrecognized finish reason");
            StopReason::Other
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config() {
        let config = OpenAIConfig::new("test-key")
            .with_api_base("http://localhost:1234/v1")
            .with_timeout(60)
            .allow_model("deepseek-chat")
            .allow_model("qwen2.5-7b-instruct");

        assert_eq!(config.api_base, "http://localhost:1234/v1");
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(
            config.allowed_models,
            Some(vec!["deepseek-chat".to_string(), "qwen2.5-7b-instruct".to_string()])
        );

        let provider = OpenAIProvider::with_config(config).unwrap();
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.config().api_key, "test-key");
    }

    #[test]
    fn test_model_allow_list() {
        let provider =
            OpenAIProvider::with_config(OpenAIConfig::new("k").allow_model("deepseek-chat")).unwrap();
        assert!(provider.check_model("deepseek-chat").is_ok());
        assert!(matches!(
            provider.check_model("gpt-4o"),
            Err(LLMError::InvalidRequest(_))
        ));

        let open = OpenAIProvider::with_config(OpenAIConfig::new("k")).unwrap();
        assert!(open.check_model("anything").is_ok());
    }

    #[test]
    fn test_request_body_puts_system_first() {
        let request = CompletionRequest::new("deepseek-chat", "DATA:[]")
            .with_system("You are a market analyst")
            .with_max_tokens(512)
            .with_temperature(0.5);

        let body = serde_json::to_value(ChatRequest::from(&request)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "model": "deepseek-chat",
                "messages": [
                    {"role": "system", "content": "You are a market analyst"},
                    {"role": "user", "content": "DATA:[]"}
                ],
                "max_tokens": 512,
                "temperature": 0.5
            })
        );

        let body = serde_json::to_value(ChatRequest::from(&CompletionRequest::new("m", "p"))).unwrap();
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
        assert!(body.get("temperature").is_none());
    }

    #[test]
    fn test_response_parsing() {
        let body = r##"{
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "# 报告"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 10, "completion_tokens": 3, "total_tokens": 13}
        }"##;

        let completion = parse_response(body).unwrap();
        assert_eq!(completion.text, "# 报告");
        assert_eq!(completion.stop_reason, StopReason::Finished);
        assert_eq!(completion.usage.input_tokens, 10);
    }

    #[test]
    fn test_response_without_choices() {
        assert!(matches!(
            parse_response(r#"{"choices": []}"#),
            Err(LLMError::UnexpectedResponse(_))
        ));
    }

    #[test]
    fn test_stop_reason_mapping() {
        assert_eq!(map_stop_reason(Some("stop")), StopReason::Finished);
        assert_eq!(map_stop_reason(Some("length")), StopReason::Truncated);
        assert_eq!(map_stop_reason(Some("content_filter")), StopReason::Filtered);
        assert_eq!(map_stop_reason(Some("tool_calls")), StopReason::Other);
        assert_eq!(map_stop_reason(None), StopReason::Other);
    }
}
