//! Single-turn text completion over LLM providers
//!
//! The digest needs exactly one thing from a language model: send one prompt,
//! get one piece of text back. This crate models that and nothing more:
//!
//! - [`CompletionRequest`]: model, prompt, optional system prompt and sampling settings
//! - [`Completion`]: the generated text, why generation stopped, token usage
//! - [`LLMProvider`]: the provider seam
//! - [`providers`]: Anthropic and OpenAI-compatible backends (feature gated)
//!
//! # Example
//!
//! ```
//! use digest_llm::CompletionRequest;
//!
//! let request = CompletionRequest::new("claude-sonnet-4-5-20250929", "DATA:[]")
//!     .with_system("你是一名金融分析师")
//!     .with_max_tokens(2048);
//!
//! assert_eq!(request.prompt, "DATA:[]");
//! assert_eq!(request.max_tokens, 2048);
//! ```

pub mod completion;
pub mod error;
pub mod provider;
pub mod request;

pub use completion::{Completion, StopReason, TokenUsage};
pub use error::{LLMError, Result};
pub use provider::LLMProvider;
pub use request::CompletionRequest;

#[cfg(any(feature = "anthropic", feature = "openai"))]
pub mod providers;
