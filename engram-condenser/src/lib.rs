#![deny(missing_docs)]
//! Rolling condensation for conversation views.
//!
//! [`LlmSummarizingCondenser`] watches a derived view and, when it grows
//! past its token budget or event-count threshold (or a condensation was
//! explicitly requested), produces a [`engram_types::Condensation`]
//! replacing the forgotten middle of the conversation with an LLM-written
//! summary. [`budget`] holds the token accounting that drives the
//! token-aware path.

pub mod budget;
pub mod rolling;

pub use budget::{estimate_tokens, events_to_messages, max_tail_within_budget, token_budget};
pub use rolling::LlmSummarizingCondenser;
