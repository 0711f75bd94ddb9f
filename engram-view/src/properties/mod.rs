//! Properties enforced on every derived view.
//!
//! Each property is a pure, idempotent check over (current view events,
//! full history). Properties are independently testable and composed only
//! through the view builder's fixpoint loop; no property may depend on
//! another's output. Adding an invariant is: implement [`ViewProperty`],
//! append it to the builder's list; its admissible indices are
//! intersected into the view's.

use std::collections::{HashMap, HashSet};

use engram_types::{Event, EventId, LlmResponseId};

use crate::manipulation_indices::ManipulationIndices;

mod batch_atomicity;
mod tool_call_matching;
mod tool_loop_atomicity;

pub use batch_atomicity::BatchAtomicity;
pub use tool_call_matching::ToolCallMatching;
pub use tool_loop_atomicity::ToolLoopAtomicity;

/// A property every derived view must satisfy.
pub trait ViewProperty {
    /// Short name used in enforcement logs.
    fn name(&self) -> &'static str;

    /// Event IDs that must be dropped from the view to restore the
    /// property. Pure; never fails; an empty set means the property
    /// already holds.
    fn enforce(&self, view_events: &[Event], all_events: &[Event]) -> HashSet<EventId>;

    /// Boundaries in `view_events` at which insertion or removal cannot
    /// violate this property.
    fn manipulation_indices(&self, view_events: &[Event]) -> ManipulationIndices;
}

/// Group action events by `llm_response_id`.
pub(crate) fn batches(events: &[Event]) -> HashMap<LlmResponseId, Vec<EventId>> {
    let mut batches: HashMap<LlmResponseId, Vec<EventId>> = HashMap::new();
    for event in events {
        if let Some(action) = event.as_action() {
            batches
                .entry(action.llm_response_id.clone())
                .or_default()
                .push(action.id.clone());
        }
    }
    batches
}

/// Map event IDs to their positions in `events`.
pub(crate) fn event_index(events: &[Event]) -> HashMap<EventId, usize> {
    events
        .iter()
        .enumerate()
        .map(|(idx, event)| (event.id().clone(), idx))
        .collect()
}

/// Whether the event is tool traffic: an action or anything playing the
/// observation role.
pub(crate) fn is_tool_traffic(event: &Event) -> bool {
    event.as_action().is_some() || event.is_observation_like()
}

/// All boundaries of a view of `len` events except those strictly inside
/// an atomic `[min, max]` range. One may insert or remove before the
/// range or after it, never in the middle.
pub(crate) fn indices_outside_ranges(
    ranges: &[(usize, usize)],
    len: usize,
) -> ManipulationIndices {
    let mut valid: Vec<usize> = (0..=len).collect();
    valid.retain(|&idx| {
        !ranges
            .iter()
            .any(|&(min_idx, max_idx)| idx > min_idx && idx <= max_idx)
    });
    ManipulationIndices::new(valid)
}
