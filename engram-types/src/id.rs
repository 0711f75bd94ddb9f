//! Typed ID wrappers for events, tool calls, and LLM responses.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Typed ID wrappers prevent mixing up event IDs, tool-call IDs, and
/// LLM response IDs. These are just strings underneath — no format
/// requirement beyond uniqueness at mint time.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            /// Create a new typed ID from anything that converts to String.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the inner string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

typed_id!(
    EventId,
    "Stable, globally unique identifier for an event. Assigned at creation, never mutated."
);
typed_id!(
    ToolCallId,
    "Identifier pairing an action with the observation that answers it."
);
typed_id!(
    LlmResponseId,
    "Identifier of the LLM response that produced a batch of actions."
);

impl EventId {
    /// Mint a fresh, globally unique event ID (UUIDv4).
    #[must_use]
    pub fn fresh() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_ids_are_unique() {
        assert_ne!(EventId::fresh(), EventId::fresh());
    }

    #[test]
    fn display_matches_inner_string() {
        let id = ToolCallId::new("call_1");
        assert_eq!(id.to_string(), "call_1");
        assert_eq!(id.as_str(), "call_1");
    }
}
