//! Atomicity of multi-action batches.

use std::collections::HashSet;

use engram_types::{Event, EventId};

use crate::manipulation_indices::ManipulationIndices;
use crate::properties::{ViewProperty, batches, event_index, indices_outside_ranges};

/// Ensures actions sharing an `llm_response_id` appear together or not at
/// all.
///
/// A single LLM response emitting several tool calls must be replayed
/// whole; splitting it leaves a dangling assistant turn whose tool calls
/// lack observations.
#[derive(Debug, Default)]
pub struct BatchAtomicity;

impl ViewProperty for BatchAtomicity {
    fn name(&self) -> &'static str {
        "BatchAtomicity"
    }

    fn enforce(&self, view_events: &[Event], all_events: &[Event]) -> HashSet<EventId> {
        // Ground truth for batch membership comes from the full history;
        // the view only tells us what survived.
        let all_batches = batches(all_events);
        let view_batches = batches(view_events);

        let mut to_remove = HashSet::new();
        for (llm_response_id, action_ids) in &all_batches {
            let Some(in_view) = view_batches.get(llm_response_id) else {
                continue;
            };
            if !in_view.is_empty() && in_view.len() < action_ids.len() {
                to_remove.extend(in_view.iter().cloned());
            }
        }
        to_remove
    }

    fn manipulation_indices(&self, view_events: &[Event]) -> ManipulationIndices {
        let index = event_index(view_events);

        let mut atomic_ranges: Vec<(usize, usize)> = Vec::new();
        for action_ids in batches(view_events).values() {
            if action_ids.len() > 1 {
                let positions: Vec<usize> = action_ids.iter().map(|id| index[id]).collect();
                let min_idx = *positions.iter().min().expect("batch is non-empty");
                let max_idx = *positions.iter().max().expect("batch is non-empty");
                atomic_ranges.push((min_idx, max_idx));
            }
        }

        indices_outside_ranges(&atomic_ranges, view_events.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engram_types::{ActionEvent, MessageEvent, ObservationEvent, Role};

    /// Two-action batch with observations: A1 A2 O1 O2.
    fn two_action_batch(resp: &str) -> Vec<Event> {
        let a1 = ActionEvent::new(resp, format!("{resp}_call_1"), "bash");
        let a2 = ActionEvent::new(resp, format!("{resp}_call_2"), "grep");
        let o1 = ObservationEvent::new(&a1, "out 1");
        let o2 = ObservationEvent::new(&a2, "out 2");
        vec![a1.into(), a2.into(), o1.into(), o2.into()]
    }

    #[test]
    fn complete_batches_are_untouched() {
        let all = two_action_batch("resp_1");
        assert!(BatchAtomicity.enforce(&all, &all).is_empty());
    }

    #[test]
    fn partial_batch_remainder_is_dropped() {
        let all = two_action_batch("resp_1");
        // View lost the first action; the second must go too.
        let view: Vec<Event> = all[1..].to_vec();
        let removed = BatchAtomicity.enforce(&view, &all);
        assert_eq!(removed, HashSet::from([all[1].id().clone()]));
    }

    #[test]
    fn fully_absent_batches_require_nothing() {
        let all = two_action_batch("resp_1");
        let view: Vec<Event> = all[2..].to_vec(); // observations only
        assert!(BatchAtomicity.enforce(&view, &all).is_empty());
    }

    #[test]
    fn independent_batches_do_not_interfere() {
        let mut all = two_action_batch("resp_1");
        all.extend(two_action_batch("resp_2"));
        // Second batch intact, first batch partial.
        let view: Vec<Event> = all[1..].to_vec();
        let removed = BatchAtomicity.enforce(&view, &all);
        assert_eq!(removed, HashSet::from([all[1].id().clone()]));
    }

    #[test]
    fn no_boundary_inside_a_batch() {
        let all = two_action_batch("resp_1");
        // Batch spans indices 0..=1: boundary 1 is interior.
        let indices = BatchAtomicity.manipulation_indices(&all);
        assert_eq!(indices.iter().collect::<Vec<_>>(), vec![0, 2, 3, 4]);
    }

    #[test]
    fn single_action_batches_do_not_restrict_boundaries() {
        let action = ActionEvent::new("resp_1", "call_1", "bash");
        let observation = ObservationEvent::new(&action, "ok");
        let view: Vec<Event> = vec![
            MessageEvent::new(Role::User, "run it").into(),
            action.into(),
            observation.into(),
        ];
        let indices = BatchAtomicity.manipulation_indices(&view);
        assert_eq!(indices, ManipulationIndices::all_boundaries(3));
    }

    #[test]
    fn interleaved_batch_blocks_its_whole_span() {
        // resp_1 actions at indices 0 and 2, a message between them.
        let a1 = ActionEvent::new("resp_1", "call_1", "bash");
        let a2 = ActionEvent::new("resp_1", "call_2", "grep");
        let view: Vec<Event> = vec![
            a1.into(),
            MessageEvent::new(Role::User, "between").into(),
            a2.into(),
        ];
        let indices = BatchAtomicity.manipulation_indices(&view);
        assert_eq!(indices.iter().collect::<Vec<_>>(), vec![0, 3]);
    }
}
