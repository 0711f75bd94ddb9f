#![deny(missing_docs)]
//! View derivation for conversation logs.
//!
//! [`View::from_events`] turns an append-only log snapshot into a
//! trimmed, LLM-ready projection: condensation events hide forgotten
//! history, a synthetic summary takes their place, and the view
//! properties (tool-call matching, batch atomicity, tool loop
//! atomicity) are enforced to a fixpoint. The surviving safe
//! insertion/removal boundaries are published as
//! [`ManipulationIndices`].

pub mod manipulation_indices;
pub mod properties;
pub mod view;

pub use manipulation_indices::ManipulationIndices;
pub use properties::{BatchAtomicity, ToolCallMatching, ToolLoopAtomicity, ViewProperty};
pub use view::View;
