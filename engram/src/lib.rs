#![deny(missing_docs)]
//! # engram — umbrella crate
//!
//! Single import surface for the conversation-history condensation
//! engine: the event model (`engram-types`), view derivation
//! (`engram-view`), the rolling condenser (`engram-condenser`), and the
//! in-memory log backend (`engram-log-memory`, behind the `log-memory`
//! feature). The `prelude` covers the happy path.
//!
//! The engine holds no mutable global state: a log snapshot goes in,
//! a [`View`] comes out, and a [`engram_types::Condensation`] produced by
//! the condenser is simply appended for the next derivation to consume.

pub use engram_condenser;
#[cfg(feature = "log-memory")]
pub use engram_log_memory;
pub use engram_types;
pub use engram_view;

use engram_types::{CondensationRequestEvent, Event, EventLog, LogError};
use engram_view::{ManipulationIndices, View};

/// Derive the LLM-ready view of an ordered log snapshot.
///
/// Pure and idempotent: condensations hide their forgotten events, the
/// most recent summary is inserted at its offset, and the view properties
/// are enforced to a fixpoint.
#[must_use]
pub fn derive_view(events: &[Event]) -> View {
    View::from_events(events)
}

/// The safe insertion/removal boundaries of a view.
#[must_use]
pub fn manipulation_indices(view: &View) -> &ManipulationIndices {
    &view.manipulation_indices
}

/// Append a condensation-request marker to the log and return it. The
/// next derived view reports `unhandled_condensation_request` until a
/// condensation answers it.
pub fn request_condensation(log: &impl EventLog) -> Result<Event, LogError> {
    let request: Event = CondensationRequestEvent::new().into();
    log.append(request.clone())?;
    Ok(request)
}

/// Happy-path imports for running the condensation engine.
pub mod prelude {
    pub use engram_condenser::LlmSummarizingCondenser;
    #[cfg(feature = "log-memory")]
    pub use engram_log_memory::MemoryEventLog;
    pub use engram_types::{
        ActionEvent, AgentErrorEvent, CompletionRequest, CompletionResponse, Condensation,
        CondensationRequestEvent, CondenserError, Event, EventId, EventLog, LanguageModel,
        LlmResponseId, Message, MessageEvent, ObservationEvent, Role, SystemPromptEvent,
        ThinkingBlock, ToolCallId, UserRejectEvent,
    };
    pub use engram_view::{ManipulationIndices, View};

    pub use crate::{derive_view, manipulation_indices, request_condensation};
}

#[cfg(all(test, feature = "log-memory"))]
mod tests {
    use super::*;
    use engram_log_memory::MemoryEventLog;
    use engram_types::{MessageEvent, Role};

    #[test]
    fn request_condensation_appends_the_marker() {
        let log = MemoryEventLog::new();
        log.append(MessageEvent::new(Role::User, "hi").into()).unwrap();

        let request = request_condensation(&log).unwrap();

        let snapshot = log.snapshot().unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[1].id(), request.id());

        let view = derive_view(&snapshot);
        assert!(view.unhandled_condensation_request);
        assert_eq!(view.len(), 1);
    }
}
