//! LLM message types and the [`LanguageModel`] capability trait.
//!
//! The [`LanguageModel`] trait uses RPITIT (return-position `impl Trait`
//! in traits) and is intentionally NOT object-safe. Condensers are generic
//! over the handle; the engine never needs a trait object.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::id::{LlmResponseId, ToolCallId};

/// The role of a message participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// A human user.
    User,
    /// An AI assistant.
    Assistant,
    /// A system message.
    System,
}

/// An opaque thinking block attached to an assistant action.
///
/// Certain providers require thinking blocks to accompany subsequent tool
/// calls; redacted blocks carry an opaque blob but count as thinking all
/// the same.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ThinkingBlock {
    /// Extended thinking from reasoning models.
    Thinking {
        /// The thinking text.
        thinking: String,
        /// Cryptographic signature for verification.
        signature: String,
    },
    /// Redacted thinking (not visible to the user).
    RedactedThinking {
        /// Opaque data blob.
        data: String,
    },
}

/// A content block within a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ContentBlock {
    /// Plain text content.
    Text(String),
    /// Extended thinking from reasoning models.
    Thinking {
        /// The thinking text.
        thinking: String,
        /// Cryptographic signature for verification.
        signature: String,
    },
    /// Redacted thinking (not visible to the user).
    RedactedThinking {
        /// Opaque data blob.
        data: String,
    },
    /// A tool invocation request from the assistant.
    ToolUse {
        /// Unique identifier for this tool call.
        id: ToolCallId,
        /// Name of the tool to invoke.
        name: String,
        /// JSON input arguments.
        input: serde_json::Value,
    },
    /// Result of a tool invocation.
    ToolResult {
        /// References the `id` from the corresponding `ToolUse`.
        tool_use_id: ToolCallId,
        /// The result content.
        content: String,
        /// Whether this result represents an error.
        is_error: bool,
    },
}

impl From<ThinkingBlock> for ContentBlock {
    fn from(block: ThinkingBlock) -> Self {
        match block {
            ThinkingBlock::Thinking { thinking, signature } => {
                ContentBlock::Thinking { thinking, signature }
            }
            ThinkingBlock::RedactedThinking { data } => ContentBlock::RedactedThinking { data },
        }
    }
}

/// A message in a conversation, as presented to an LLM provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// The role of the message author.
    pub role: Role,
    /// The content blocks of this message.
    pub content: Vec<ContentBlock>,
}

impl Message {
    /// Create a user message with a single text content block.
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self { role: Role::User, content: vec![ContentBlock::Text(text.into())] }
    }

    /// Create an assistant message with a single text content block.
    #[must_use]
    pub fn assistant(text: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: vec![ContentBlock::Text(text.into())] }
    }

    /// Create a system message with a single text content block.
    #[must_use]
    pub fn system(text: impl Into<String>) -> Self {
        Self { role: Role::System, content: vec![ContentBlock::Text(text.into())] }
    }
}

/// Definition of a tool exposed to the model via the system prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name (unique identifier).
    pub name: String,
    /// Description of what the tool does.
    pub description: String,
    /// JSON Schema for the tool's input parameters.
    pub input_schema: serde_json::Value,
}

/// A completion request to an LLM handle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// The conversation messages.
    pub messages: Vec<Message>,
    /// Optional system prompt.
    pub system: Option<String>,
    /// Maximum tokens to generate.
    pub max_tokens: Option<u32>,
    /// Sampling temperature.
    pub temperature: Option<f32>,
}

/// A completion response from an LLM handle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// Provider-assigned response ID. Recorded on emitted condensations.
    pub id: LlmResponseId,
    /// The response message.
    pub message: Message,
    /// Token usage statistics.
    pub usage: TokenUsage,
}

impl CompletionResponse {
    /// The text of the first `Text` content block, if any.
    #[must_use]
    pub fn first_text(&self) -> Option<&str> {
        self.message.content.iter().find_map(|block| match block {
            ContentBlock::Text(text) => Some(text.as_str()),
            _ => None,
        })
    }
}

/// Token usage statistics for a completion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens in the input/prompt.
    pub input_tokens: u32,
    /// Tokens in the output/completion.
    pub output_tokens: u32,
}

/// LLM capability consumed by the engine.
///
/// Condensers use `complete` for summarization and the token metadata for
/// budget accounting. A handle without a context window or tokenizer is
/// valid; the engine falls back to event-count policies.
///
/// This trait uses RPITIT and is NOT object-safe. That's intentional —
/// `LlmSummarizingCondenser<L: LanguageModel>` is generic.
pub trait LanguageModel: Send + Sync {
    /// The model's context window in tokens, if known.
    fn context_window(&self) -> Option<u32>;

    /// The model's maximum output tokens, if known.
    fn max_output_tokens(&self) -> Option<u32> {
        None
    }

    /// Count the tokens a message list would consume, or `None` when the
    /// handle has no tokenizer.
    fn count_tokens(&self, messages: &[Message]) -> Option<u32>;

    /// Send a completion request. The handle is responsible for its own
    /// timeout; a timed-out call fails with a retryable [`ProviderError`].
    fn complete(
        &self,
        request: CompletionRequest,
    ) -> impl Future<Output = Result<CompletionResponse, ProviderError>> + Send;
}
