//! Configuration for the digest pipeline
//!
//! Loaded once from a JSON file (every section optional) and shared
//! immutably for the life of the process. Credentials are never stored here;
//! the LLM providers read them from the environment.

use crate::error::ConfigError;
use crate::source::DEFAULT_PAGE_SIZE;
use digest_utils::{LogConfig, load_json};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_DATA_DIR: &str = "data/ths_finance";
const DEFAULT_REPORT_DIR: &str = "reports/ths_finance";
const DEFAULT_PROMPT_TEMPLATE: &str = "prompts/ths_finance_prompt.txt";
const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-5-20250929";

/// LLM backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProviderKind {
    /// Anthropic Messages API (`ANTHROPIC_API_KEY`)
    #[default]
    Anthropic,
    /// OpenAI or any compatible endpoint (`OPENAI_API_KEY`, `OPENAI_API_BASE`)
    OpenAI,
}

impl LlmProviderKind {
    /// Model used when `llm.model` is not set; OpenAI-compatible servers have none
    pub fn default_model(self) -> Option<&'static str> {
        match self {
            Self::Anthropic => Some(DEFAULT_ANTHROPIC_MODEL),
            Self::OpenAI => None,
        }
    }
}

/// Language model settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: LlmProviderKind,
    /// Falls back to [`LlmProviderKind::default_model`] when unset
    pub model: Option<String>,
    pub max_tokens: usize,
    pub temperature: Option<f32>,
    pub system_prompt: Option<String>,
    /// Overrides the provider's base URL
    pub api_base: Option<String>,
    pub timeout_secs: u64,
    /// OpenAI only: refuse to send requests for any other model
    pub allowed_models: Option<Vec<String>>,
}

impl LlmConfig {
    /// The configured model, or the provider default
    pub fn model_name(&self) -> Option<&str> {
        self.model.as_deref().or(self.provider.default_model())
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProviderKind::Anthropic,
            model: None,
            max_tokens: 4096,
            temperature: None,
            system_prompt: None,
            api_base: None,
            timeout_secs: 180,
            allowed_models: None,
        }
    }
}

/// Market data source settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub page_size: u32,
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            timeout_secs: 30,
        }
    }
}

/// Publish channel selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    /// Log the delivery only
    #[default]
    Log,
    /// POST the report to `webhook_url`
    Webhook,
}

/// Publish settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    pub channel: ChannelKind,
    pub webhook_url: Option<String>,
    /// Title sent with webhook deliveries; the report date is appended
    pub title: String,
    pub timeout_secs: u64,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            channel: ChannelKind::Log,
            webhook_url: None,
            title: "全球市场日报".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Process-wide configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DigestConfig {
    /// Where dated JSON snapshots are written
    pub data_dir: PathBuf,

    /// Where dated markdown reports are written
    pub report_dir: PathBuf,

    /// Prompt template with a `data` placeholder, read on every report
    pub prompt_template_file: PathBuf,

    pub llm: LlmConfig,
    pub source: SourceConfig,
    pub publish: PublishConfig,
    pub logging: LogConfig,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            report_dir: PathBuf::from(DEFAULT_REPORT_DIR),
            prompt_template_file: PathBuf::from(DEFAULT_PROMPT_TEMPLATE),
            llm: LlmConfig::default(),
            source: SourceConfig::default(),
            publish: PublishConfig::default(),
            logging: LogConfig::default(),
        }
    }
}

impl DigestConfig {
    /// Create a new configuration builder
    pub fn builder() -> DigestConfigBuilder {
        DigestConfigBuilder::default()
    }

    /// Load and validate a JSON configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config: Self = load_json(path.as_ref())?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let model = self.llm.model_name().ok_or_else(|| {
            invalid("llm.model is required when llm.provider is \"openai\"")
        })?;
        if model.trim().is_empty() {
            return Err(invalid("llm.model must not be empty"));
        }
        if let Some(allowed) = &self.llm.allowed_models {
            if self.llm.provider != LlmProviderKind::OpenAI {
                return Err(invalid("llm.allowed_models only applies to the openai provider"));
            }
            if !allowed.iter().any(|m| m == model) {
                return Err(invalid(format!(
                    "llm.model '{model}' is not in llm.allowed_models"
                )));
            }
        }
        if self.llm.max_tokens == 0 {
            return Err(invalid("llm.max_tokens must be greater than 0"));
        }
        if let Some(t) = self.llm.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(invalid("llm.temperature must be between 0.0 and 2.0"));
            }
        }
        if self.source.page_size == 0 {
            return Err(invalid("source.page_size must be greater than 0"));
        }
        if self.llm.timeout_secs == 0
            || self.source.timeout_secs == 0
            || self.publish.timeout_secs == 0
        {
            return Err(invalid("timeout_secs must be greater than 0"));
        }

        if self.publish.channel == ChannelKind::Webhook {
            match self.publish.webhook_url.as_deref() {
                Some(url) if url.starts_with("http://") || url.starts_with("https://") => {}
                Some(url) => {
                    return Err(invalid(format!(
                        "publish.webhook_url must be an http(s) URL, got '{url}'"
                    )));
                }
                None => {
                    return Err(invalid(
                        "publish.webhook_url is required when publish.channel is \"webhook\"",
                    ));
                }
            }
        }

        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(message.into())
}

/// Builder for DigestConfig
#[derive(Debug, Default)]
pub struct DigestConfigBuilder {
    data_dir: Option<PathBuf>,
    report_dir: Option<PathBuf>,
    prompt_template_file: Option<PathBuf>,
    llm: Option<LlmConfig>,
    source: Option<SourceConfig>,
    publish: Option<PublishConfig>,
    logging: Option<LogConfig>,
}

impl DigestConfigBuilder {
    /// Set the snapshot directory
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    /// Set the report directory
    pub fn report_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.report_dir = Some(dir.into());
        self
    }

    /// Set the prompt template file
    pub fn prompt_template_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.prompt_template_file = Some(path.into());
        self
    }

    /// Set the language model settings
    pub fn llm(mut self, llm: LlmConfig) -> Self {
        self.llm = Some(llm);
        self
    }

    /// Set the market data source settings
    pub fn source(mut self, source: SourceConfig) -> Self {
        self.source = Some(source);
        self
    }

    /// Set the publish settings
    pub fn publish(mut self, publish: PublishConfig) -> Self {
        self.publish = Some(publish);
        self
    }

    /// Set the logging settings
    pub fn logging(mut self, logging: LogConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<DigestConfig, ConfigError> {
        let defaults = DigestConfig::default();

        let config = DigestConfig {
            data_dir: self.data_dir.unwrap_or(defaults.data_dir),
            report_dir: self.report_dir.unwrap_or(defaults.report_dir),
            prompt_template_file: self
                .prompt_template_file
                .unwrap_or(defaults.prompt_template_file),
            llm: self.llm.unwrap_or(defaults.llm),
            source: self.source.unwrap_or(defaults.source),
            publish: self.publish.unwrap_or(defaults.publish),
            logging: self.logging.unwrap_or(defaults.logging),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DigestConfig::default();
        assert_eq!(config.data_dir, PathBuf::from("data/ths_finance"));
        assert_eq!(config.report_dir, PathBuf::from("reports/ths_finance"));
        assert_eq!(
            config.prompt_template_file,
            PathBuf::from("prompts/ths_finance_prompt.txt")
        );
        assert_eq!(config.llm.provider, LlmProviderKind::Anthropic);
        assert_eq!(config.llm.model_name(), Some("claude-sonnet-4-5-20250929"));
        assert_eq!(config.source.page_size, 400);
        assert_eq!(config.publish.channel, ChannelKind::Log);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: DigestConfig = serde_json::from_str(
            r#"{
                "data_dir": "/tmp/data",
                "llm": {"provider": "openai", "model": "qwen2.5-7b-instruct"},
                "publish": {"channel": "webhook", "webhook_url": "https://hooks.example.com/x"}
            }"#,
        )
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/data"));
        assert_eq!(config.report_dir, PathBuf::from("reports/ths_finance"));
        assert_eq!(config.llm.provider, LlmProviderKind::OpenAI);
        assert_eq!(config.llm.model_name(), Some("qwen2.5-7b-instruct"));
        assert_eq!(config.llm.max_tokens, 4096);
        assert_eq!(config.publish.channel, ChannelKind::Webhook);
        assert_eq!(config.logging.level, "debug");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = DigestConfig::builder()
            .data_dir("d")
            .report_dir("r")
            .prompt_template_file("t.txt")
            .logging(LogConfig::console_only())
            .build()
            .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("d"));
        assert_eq!(config.report_dir, PathBuf::from("r"));
        assert!(config.logging.file.is_none());
    }

    #[test]
    fn test_validation() {
        let result = DigestConfig::builder()
            .publish(PublishConfig {
                channel: ChannelKind::Webhook,
                ..PublishConfig::default()
            })
            .build();
        assert!(matches!(result, Err(ConfigError::Invalid(msg)) if msg.contains("webhook_url")));

        let result = DigestConfig::builder()
            .publish(PublishConfig {
                channel: ChannelKind::Webhook,
                webhook_url: Some("ftp://example.com".to_string()),
                ..PublishConfig::default()
            })
            .build();
        assert!(matches!(result, Err(ConfigError::Invalid(_))));

        let result = DigestConfig::builder()
            .llm(LlmConfig {
                max_tokens: 0,
                ..LlmConfig::default()
            })
            .build();
        assert!(matches!(result, Err(ConfigError::Invalid(msg)) if msg.contains("max_tokens")));

        let result = DigestConfig::builder()
            .source(SourceConfig {
                page_size: 0,
                ..SourceConfig::default()
            })
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_openai_requires_explicit_model() {
        let config: DigestConfig =
            serde_json::from_str(r#"{"llm": {"provider": "openai"}}"#).unwrap();

        assert_eq!(config.llm.model_name(), None);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid(msg)) if msg.contains("llm.model is required")
        ));
    }

    #[test]
    fn test_allowed_models() {
        let llm = LlmConfig {
            provider: LlmProviderKind::OpenAI,
            model: Some("deepseek-chat".to_string()),
            allowed_models: Some(vec!["deepseek-chat".to_string()]),
            ..LlmConfig::default()
        };
        assert!(DigestConfig::builder().llm(llm.clone()).build().is_ok());

        let result = DigestConfig::builder()
            .llm(LlmConfig {
                model: Some("gpt-4o".to_string()),
                ..llm
            })
            .build();
        assert!(matches!(result, Err(ConfigError::Invalid(msg)) if msg.contains("allowed_models")));

        let result = DigestConfig::builder()
            .llm(LlmConfig {
                allowed_models: Some(vec!["claude-sonnet-4-5-20250929".to_string()]),
                ..LlmConfig::default()
            })
            .build();
        assert!(matches!(result, Err(ConfigError::Invalid(msg)) if msg.contains("openai provider")));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        std::fs::write(&path, r#"{"report_dir": "out"}"#).unwrap();
        let config = DigestConfig::from_file(&path).unwrap();
        assert_eq!(config.report_dir, PathBuf::from("out"));

        std::fs::write(&path, r#"{"llm": {"model": ""}}"#).unwrap();
        assert!(matches!(
            DigestConfig::from_file(&path),
            Err(ConfigError::Invalid(_))
        ));

        assert!(matches!(
            DigestConfig::from_file(dir.path().join("missing.json")),
            Err(ConfigError::File(_))
        ));
    }
}
