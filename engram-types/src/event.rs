//! The conversation event taxonomy.
//!
//! Events form an append-only log. They are created once, never mutated,
//! and only ever hidden from derived views by a [`Condensation`]. The
//! enum is a closed tagged union serialized with a `kind` tag equal to
//! the variant name.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::EventError;
use crate::id::{EventId, LlmResponseId, ToolCallId};
use crate::llm::{ContentBlock, Message, Role, ThinkingBlock, ToolDefinition};

/// Maximum characters of content shown in `Display` previews.
pub const N_CHAR_PREVIEW: usize = 160;

/// A plain conversation turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEvent {
    /// Stable event identity.
    pub id: EventId,
    /// The author of the turn.
    pub role: Role,
    /// The content blocks of the turn.
    pub content: Vec<ContentBlock>,
}

impl MessageEvent {
    /// Create a message event with a single text block.
    #[must_use]
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            id: EventId::fresh(),
            role,
            content: vec![ContentBlock::Text(text.into())],
        }
    }
}

/// The pinned instruction block, including the tool schemas offered to
/// the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemPromptEvent {
    /// Stable event identity.
    pub id: EventId,
    /// The system prompt text.
    pub text: String,
    /// Tool schemas available to the model.
    pub tools: Vec<ToolDefinition>,
}

impl SystemPromptEvent {
    /// Create a system prompt event.
    #[must_use]
    pub fn new(text: impl Into<String>, tools: Vec<ToolDefinition>) -> Self {
        Self { id: EventId::fresh(), text: text.into(), tools }
    }
}

/// A system-role injection from the security analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityPromptEvent {
    /// Stable event identity.
    pub id: EventId,
    /// The security prompt text.
    pub text: String,
}

impl SecurityPromptEvent {
    /// Create a security prompt event.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { id: EventId::fresh(), text: text.into() }
    }
}

/// An agent tool invocation.
///
/// Actions sharing an `llm_response_id` form a batch: one LLM response
/// that emitted several tool calls. Batches are atomic in derived views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionEvent {
    /// Stable event identity.
    pub id: EventId,
    /// The LLM response this action came from.
    pub llm_response_id: LlmResponseId,
    /// Pairs the action with its observation.
    pub tool_call_id: ToolCallId,
    /// Name of the invoked tool.
    pub tool_name: String,
    /// Structured tool arguments, when the tool parsed them.
    pub action: Option<serde_json::Value>,
    /// Thinking blocks that accompanied the response, if any. A non-empty
    /// list starts a tool loop.
    pub thinking_blocks: Vec<ThinkingBlock>,
    /// Free-form assistant text preceding the call.
    pub thought: String,
}

impl ActionEvent {
    /// Create an action event with no thinking blocks or thought text.
    #[must_use]
    pub fn new(
        llm_response_id: impl Into<LlmResponseId>,
        tool_call_id: impl Into<ToolCallId>,
        tool_name: impl Into<String>,
    ) -> Self {
        Self {
            id: EventId::fresh(),
            llm_response_id: llm_response_id.into(),
            tool_call_id: tool_call_id.into(),
            tool_name: tool_name.into(),
            action: None,
            thinking_blocks: Vec::new(),
            thought: String::new(),
        }
    }

    /// Attach thinking blocks.
    #[must_use]
    pub fn with_thinking_blocks(mut self, blocks: Vec<ThinkingBlock>) -> Self {
        self.thinking_blocks = blocks;
        self
    }

    /// Attach structured arguments.
    #[must_use]
    pub fn with_action(mut self, action: serde_json::Value) -> Self {
        self.action = Some(action);
        self
    }

    /// Attach thought text.
    #[must_use]
    pub fn with_thought(mut self, thought: impl Into<String>) -> Self {
        self.thought = thought.into();
        self
    }
}

/// The result of an [`ActionEvent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationEvent {
    /// Stable event identity.
    pub id: EventId,
    /// Pairs the observation with its action.
    pub tool_call_id: ToolCallId,
    /// The action this observation answers.
    pub action_id: EventId,
    /// Tool output content.
    pub content: String,
}

impl ObservationEvent {
    /// Create an observation answering the given action.
    #[must_use]
    pub fn new(action: &ActionEvent, content: impl Into<String>) -> Self {
        Self {
            id: EventId::fresh(),
            tool_call_id: action.tool_call_id.clone(),
            action_id: action.id.clone(),
            content: content.into(),
        }
    }
}

/// A non-tool error surfaced to the LLM.
///
/// When the error answers a specific tool call it carries that
/// `tool_call_id` and satisfies tool-call matching as an observation;
/// without one it is a plain error message kept in views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentErrorEvent {
    /// Stable event identity.
    pub id: EventId,
    /// The tool call this error answers, if any.
    pub tool_call_id: Option<ToolCallId>,
    /// The error message.
    pub message: String,
}

impl AgentErrorEvent {
    /// Create an error event not tied to any tool call.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self { id: EventId::fresh(), tool_call_id: None, message: message.into() }
    }

    /// Create an error event answering a specific tool call.
    #[must_use]
    pub fn for_tool_call(tool_call_id: impl Into<ToolCallId>, message: impl Into<String>) -> Self {
        Self {
            id: EventId::fresh(),
            tool_call_id: Some(tool_call_id.into()),
            message: message.into(),
        }
    }
}

/// A confirmation-mode rejection. Acts as the observation for its action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRejectEvent {
    /// Stable event identity.
    pub id: EventId,
    /// The tool call the user rejected.
    pub tool_call_id: ToolCallId,
    /// Why the user rejected it.
    pub reason: String,
}

impl UserRejectEvent {
    /// Create a rejection answering the given tool call.
    #[must_use]
    pub fn new(tool_call_id: impl Into<ToolCallId>, reason: impl Into<String>) -> Self {
        Self { id: EventId::fresh(), tool_call_id: tool_call_id.into(), reason: reason.into() }
    }
}

/// A marker asking the condenser to run at the next opportunity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CondensationRequestEvent {
    /// Stable event identity.
    pub id: EventId,
}

impl CondensationRequestEvent {
    /// Create a request marker.
    #[must_use]
    pub fn new() -> Self {
        Self { id: EventId::fresh() }
    }
}

impl Default for CondensationRequestEvent {
    fn default() -> Self {
        Self::new()
    }
}

/// A condensation receipt: the recorded decision that a set of prior
/// events is no longer surfaced, optionally replaced by a summary.
///
/// `summary_offset == 0` denotes a hard reset: the summary subsumes all
/// prior content. `forgotten_event_ids` must reference events that
/// strictly precede this condensation in log order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condensation {
    /// Stable event identity.
    pub id: EventId,
    /// Events no longer surfaced in derived views.
    pub forgotten_event_ids: Vec<EventId>,
    /// Replacement summary text, if one was produced.
    pub summary: Option<String>,
    /// Where the summary is inserted into the kept events.
    pub summary_offset: Option<usize>,
    /// The LLM response that produced the summary.
    pub llm_response_id: LlmResponseId,
}

impl Condensation {
    /// Create a condensation receipt.
    #[must_use]
    pub fn new(
        forgotten_event_ids: Vec<EventId>,
        summary: Option<String>,
        summary_offset: Option<usize>,
        llm_response_id: impl Into<LlmResponseId>,
    ) -> Self {
        Self {
            id: EventId::fresh(),
            forgotten_event_ids,
            summary,
            summary_offset,
            llm_response_id: llm_response_id.into(),
        }
    }

    /// Whether this condensation is a hard reset.
    #[must_use]
    pub fn is_hard_reset(&self) -> bool {
        self.summary_offset == Some(0)
    }
}

/// Synthetic summary event. Exists only inside a derived view; never
/// appended to the log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CondensationSummaryEvent {
    /// Identity of this synthetic event, minted at view derivation.
    pub id: EventId,
    /// The summary text.
    pub summary: String,
}

impl CondensationSummaryEvent {
    /// Create a synthetic summary event.
    #[must_use]
    pub fn new(summary: impl Into<String>) -> Self {
        Self { id: EventId::fresh(), summary: summary.into() }
    }
}

/// A conversation event.
///
/// The closed union of everything that can appear in a conversation log,
/// plus the synthetic [`CondensationSummaryEvent`] that views insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Event {
    /// A plain turn.
    Message(MessageEvent),
    /// The pinned instruction block.
    SystemPrompt(SystemPromptEvent),
    /// A system-role security injection.
    SecurityPrompt(SecurityPromptEvent),
    /// An agent tool invocation.
    Action(ActionEvent),
    /// The result of an action.
    Observation(ObservationEvent),
    /// A non-tool error surfaced to the LLM.
    AgentError(AgentErrorEvent),
    /// A confirmation-mode rejection.
    UserReject(UserRejectEvent),
    /// A marker asking for condensation.
    CondensationRequest(CondensationRequestEvent),
    /// A condensation receipt.
    Condensation(Condensation),
    /// A synthetic summary inserted by the view builder.
    CondensationSummary(CondensationSummaryEvent),
}

impl Event {
    /// The event's stable identity.
    #[must_use]
    pub fn id(&self) -> &EventId {
        match self {
            Event::Message(e) => &e.id,
            Event::SystemPrompt(e) => &e.id,
            Event::SecurityPrompt(e) => &e.id,
            Event::Action(e) => &e.id,
            Event::Observation(e) => &e.id,
            Event::AgentError(e) => &e.id,
            Event::UserReject(e) => &e.id,
            Event::CondensationRequest(e) => &e.id,
            Event::Condensation(e) => &e.id,
            Event::CondensationSummary(e) => &e.id,
        }
    }

    /// The variant name, matching the serialized `kind` tag.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Event::Message(_) => "Message",
            Event::SystemPrompt(_) => "SystemPrompt",
            Event::SecurityPrompt(_) => "SecurityPrompt",
            Event::Action(_) => "Action",
            Event::Observation(_) => "Observation",
            Event::AgentError(_) => "AgentError",
            Event::UserReject(_) => "UserReject",
            Event::CondensationRequest(_) => "CondensationRequest",
            Event::Condensation(_) => "Condensation",
            Event::CondensationSummary(_) => "CondensationSummary",
        }
    }

    /// Whether the event can be rendered as an LLM message. False exactly
    /// for the pure markers (`Condensation`, `CondensationRequest`).
    #[must_use]
    pub fn is_llm_convertible(&self) -> bool {
        !matches!(self, Event::Condensation(_) | Event::CondensationRequest(_))
    }

    /// The action payload, if this is an action.
    #[must_use]
    pub fn as_action(&self) -> Option<&ActionEvent> {
        match self {
            Event::Action(e) => Some(e),
            _ => None,
        }
    }

    /// The condensation payload, if this is a condensation.
    #[must_use]
    pub fn as_condensation(&self) -> Option<&Condensation> {
        match self {
            Event::Condensation(e) => Some(e),
            _ => None,
        }
    }

    /// The synthetic summary payload, if this is one.
    #[must_use]
    pub fn as_condensation_summary(&self) -> Option<&CondensationSummaryEvent> {
        match self {
            Event::CondensationSummary(e) => Some(e),
            _ => None,
        }
    }

    /// Whether the event plays the observation role in a tool exchange.
    /// Covers observations, rejections, and agent errors.
    #[must_use]
    pub fn is_observation_like(&self) -> bool {
        matches!(
            self,
            Event::Observation(_) | Event::UserReject(_) | Event::AgentError(_)
        )
    }

    /// The tool call this event observes, if it plays the observation
    /// role. A rejection satisfies the observation requirement; an agent
    /// error does so only when tied to a tool call.
    #[must_use]
    pub fn observation_tool_call_id(&self) -> Option<&ToolCallId> {
        match self {
            Event::Observation(e) => Some(&e.tool_call_id),
            Event::UserReject(e) => Some(&e.tool_call_id),
            Event::AgentError(e) => e.tool_call_id.as_ref(),
            _ => None,
        }
    }

    /// Whether this is an action carrying thinking blocks (redacted ones
    /// included).
    #[must_use]
    pub fn has_thinking(&self) -> bool {
        matches!(self, Event::Action(e) if !e.thinking_blocks.is_empty())
    }

    /// Render the event as an LLM message. `None` for pure markers.
    #[must_use]
    pub fn to_llm_message(&self) -> Option<Message> {
        match self {
            Event::Message(e) => Some(Message { role: e.role, content: e.content.clone() }),
            Event::SystemPrompt(e) => Some(Message::system(e.text.clone())),
            Event::SecurityPrompt(e) => Some(Message::system(e.text.clone())),
            Event::Action(e) => {
                let mut content: Vec<ContentBlock> = e
                    .thinking_blocks
                    .iter()
                    .cloned()
                    .map(ContentBlock::from)
                    .collect();
                if !e.thought.is_empty() {
                    content.push(ContentBlock::Text(e.thought.clone()));
                }
                content.push(ContentBlock::ToolUse {
                    id: e.tool_call_id.clone(),
                    name: e.tool_name.clone(),
                    input: e.action.clone().unwrap_or(serde_json::Value::Null),
                });
                Some(Message { role: Role::Assistant, content })
            }
            Event::Observation(e) => Some(Message {
                role: Role::User,
                content: vec![ContentBlock::ToolResult {
                    tool_use_id: e.tool_call_id.clone(),
                    content: e.content.clone(),
                    is_error: false,
                }],
            }),
            Event::AgentError(e) => match &e.tool_call_id {
                Some(tool_call_id) => Some(Message {
                    role: Role::User,
                    content: vec![ContentBlock::ToolResult {
                        tool_use_id: tool_call_id.clone(),
                        content: e.message.clone(),
                        is_error: true,
                    }],
                }),
                None => Some(Message::user(format!("Agent error: {}", e.message))),
            },
            Event::UserReject(e) => Some(Message {
                role: Role::User,
                content: vec![ContentBlock::ToolResult {
                    tool_use_id: e.tool_call_id.clone(),
                    content: format!("User rejected the action: {}", e.reason),
                    is_error: true,
                }],
            }),
            Event::CondensationSummary(e) => Some(Message::user(e.summary.clone())),
            Event::Condensation(_) | Event::CondensationRequest(_) => None,
        }
    }

    /// Deserialize an event from JSON, refusing malformed input at the
    /// boundary. The in-memory log never contains a malformed event.
    pub fn from_json(json: &str) -> Result<Event, EventError> {
        serde_json::from_str(json).map_err(|err| EventError::Malformed(err.to_string()))
    }
}

/// Truncate content for `Display` previews, respecting char boundaries.
fn preview(text: &str) -> String {
    if text.chars().count() <= N_CHAR_PREVIEW {
        text.to_string()
    } else {
        let head: String = text.chars().take(N_CHAR_PREVIEW).collect();
        format!("{head}...")
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Message(e) => {
                let text = e
                    .content
                    .iter()
                    .filter_map(|block| match block {
                        ContentBlock::Text(text) => Some(text.as_str()),
                        _ => None,
                    })
                    .collect::<Vec<_>>()
                    .join(" ");
                write!(f, "Message ({:?}): {}", e.role, preview(&text))
            }
            Event::SystemPrompt(e) => write!(f, "SystemPrompt: {}", preview(&e.text)),
            Event::SecurityPrompt(e) => write!(f, "SecurityPrompt: {}", preview(&e.text)),
            Event::Action(e) => {
                let args = e
                    .action
                    .as_ref()
                    .map(|value| value.to_string())
                    .unwrap_or_default();
                if e.thought.is_empty() {
                    write!(f, "Action ({}): {}", e.tool_name, preview(&args))
                } else {
                    write!(
                        f,
                        "Action ({}): {}\n  Thought: {}",
                        e.tool_name,
                        preview(&args),
                        preview(&e.thought)
                    )
                }
            }
            Event::Observation(e) => {
                write!(f, "Observation ({}): {}", e.tool_call_id, preview(&e.content))
            }
            Event::AgentError(e) => write!(f, "AgentError: {}", preview(&e.message)),
            Event::UserReject(e) => {
                write!(f, "UserReject ({}): {}", e.tool_call_id, preview(&e.reason))
            }
            Event::CondensationRequest(_) => write!(f, "CondensationRequest"),
            Event::Condensation(e) => {
                write!(f, "Condensation ({} events forgotten)", e.forgotten_event_ids.len())
            }
            Event::CondensationSummary(e) => {
                write!(f, "CondensationSummary: {}", preview(&e.summary))
            }
        }
    }
}

macro_rules! event_from {
    ($variant:ident, $ty:ty) => {
        impl From<$ty> for Event {
            fn from(event: $ty) -> Self {
                Event::$variant(event)
            }
        }
    };
}

event_from!(Message, MessageEvent);
event_from!(SystemPrompt, SystemPromptEvent);
event_from!(SecurityPrompt, SecurityPromptEvent);
event_from!(Action, ActionEvent);
event_from!(Observation, ObservationEvent);
event_from!(AgentError, AgentErrorEvent);
event_from!(UserReject, UserRejectEvent);
event_from!(CondensationRequest, CondensationRequestEvent);
event_from!(Condensation, Condensation);
event_from!(CondensationSummary, CondensationSummaryEvent);
