//! Pairing of actions with the observations that answer them.

use std::collections::HashSet;

use engram_types::{Event, EventId, ToolCallId};

use crate::manipulation_indices::ManipulationIndices;
use crate::properties::ViewProperty;

/// Ensures every action in the view has a matching observation and vice
/// versa, keyed by `tool_call_id`.
///
/// LLM APIs reject tool calls without corresponding results. A user
/// rejection satisfies the observation requirement, as does an agent
/// error tied to a tool call.
#[derive(Debug, Default)]
pub struct ToolCallMatching;

fn action_tool_call_ids(events: &[Event]) -> HashSet<&ToolCallId> {
    events
        .iter()
        .filter_map(|event| event.as_action().map(|action| &action.tool_call_id))
        .collect()
}

fn observation_tool_call_ids(events: &[Event]) -> HashSet<&ToolCallId> {
    events
        .iter()
        .filter_map(Event::observation_tool_call_id)
        .collect()
}

impl ViewProperty for ToolCallMatching {
    fn name(&self) -> &'static str {
        "ToolCallMatching"
    }

    fn enforce(&self, view_events: &[Event], _all_events: &[Event]) -> HashSet<EventId> {
        let action_ids = action_tool_call_ids(view_events);
        let observation_ids = observation_tool_call_ids(view_events);

        let mut to_remove = HashSet::new();
        for event in view_events {
            if let Some(action) = event.as_action() {
                if !observation_ids.contains(&action.tool_call_id) {
                    to_remove.insert(event.id().clone());
                }
            } else if let Some(tool_call_id) = event.observation_tool_call_id() {
                if !action_ids.contains(tool_call_id) {
                    to_remove.insert(event.id().clone());
                }
            }
        }
        to_remove
    }

    fn manipulation_indices(&self, view_events: &[Event]) -> ManipulationIndices {
        // Matching is content-level, not positional: every boundary is
        // admissible, orphans are handled by enforce.
        ManipulationIndices::all_boundaries(view_events.len())
    }
}
