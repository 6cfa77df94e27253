//! Error types for the digest pipeline
//!
//! Each component owns one error enum; the pipeline wraps them so the caller
//! can tell which stage failed.

use crate::pipeline::Stage;
use digest_llm::LLMError;
use digest_prompt::PromptError;
use digest_utils::ConfigFileError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Market data provider failures
#[derive(Debug, Error)]
pub enum SourceError {
    /// Network or HTTP client error
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Provider answered with a non-success status
    #[error("Provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Provider answered with a body we cannot interpret
    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    /// Provider is unavailable for any other reason
    #[error("Provider unavailable: {0}")]
    Unavailable(String),
}

/// Publish channel failures
#[derive(Debug, Error)]
pub enum ChannelError {
    /// Network or HTTP client error
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Remote endpoint refused the delivery
    #[error("Delivery rejected with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    /// Delivery failed for any other reason
    #[error("Delivery failed: {0}")]
    Failed(String),
}

/// Errors from [`Fetcher`](crate::Fetcher)
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to fetch market snapshot: {0}")]
    Source(#[from] SourceError),

    #[error("Failed to serialize market snapshot: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write snapshot '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Errors from [`Reporter`](crate::Reporter)
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to read snapshot '{}': {source}", .path.display())]
    ReadSnapshot {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The template file could not be read
    #[error("Failed to load prompt template: {0}")]
    LoadTemplate(#[source] PromptError),

    /// The template is malformed, lacks the `data` placeholder or declares others
    #[error("Failed to render prompt template: {0}")]
    TemplateRender(#[source] PromptError),

    #[error("Language model request failed: {0}")]
    Model(#[from] LLMError),

    #[error("Failed to write report '{}': {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Errors from [`Publisher`](crate::Publisher)
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Failed to read report '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to deliver report: {0}")]
    Delivery(#[from] ChannelError),
}

/// First failure of a pipeline run
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Fetch stage failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Report stage failed: {0}")]
    Report(#[from] ReportError),

    #[error("Publish stage failed: {0}")]
    Publish(#[from] PublishError),
}

impl PipelineError {
    /// The stage that aborted the run
    pub fn stage(&self) -> Stage {
        match self {
            Self::Fetch(_) => Stage::Fetch,
            Self::Report(_) => Stage::Report,
            Self::Publish(_) => Stage::Publish,
        }
    }
}

/// Configuration loading and component construction errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    File(#[from] ConfigFileError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to create language model provider: {0}")]
    Provider(#[from] LLMError),

    #[error("Failed to create HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}
