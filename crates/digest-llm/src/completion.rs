//! Completion result

use serde::{Deserialize, Serialize};

/// Why the model stopped generating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Natural end of the answer or a stop sequence
    Finished,

    /// The `max_tokens` budget ran out
    Truncated,

    /// The provider withheld or cut the answer (content filter, refusal)
    Filtered,

    /// Anything the provider reports that we do not recognize
    Other,
}

/// Token accounting reported by the provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: usize,
    pub output_tokens: usize,
}

impl TokenUsage {
    pub fn total(&self) -> usize {
        self.input_tokens + self.output_tokens
    }
}

/// Generated text plus metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    /// All text the model produced, in order
    pub text: String,
    pub stop_reason: StopReason,
    pub usage: TokenUsage,
}

impl Completion {
    /// True when the text ends because the token budget ran out
    pub fn is_truncated(&self) -> bool {
        self.stop_reason == StopReason::Truncated
    }
}
