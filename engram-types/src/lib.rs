#![deny(missing_docs)]
//! Core types for conversation-history condensation.
//!
//! The event taxonomy, typed IDs, LLM message types, and the two
//! capability traits the engine consumes: [`LanguageModel`] and
//! [`EventLog`]. The higher layers (view derivation and the rolling
//! condenser) live in `engram-view` and `engram-condenser`.

pub mod error;
pub mod event;
pub mod id;
pub mod llm;
pub mod log;

pub use error::*;
pub use event::*;
pub use id::*;
pub use llm::*;
pub use log::*;
