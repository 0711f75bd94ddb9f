//! Atomicity of tool loops anchored by thinking blocks.

use std::collections::HashSet;

use engram_types::{Event, EventId};

use crate::manipulation_indices::ManipulationIndices;
use crate::properties::{ViewProperty, batches, event_index, indices_outside_ranges, is_tool_traffic};

/// Ensures tool loops remain atomic units.
///
/// Providers that emit thinking blocks require them to stay with the tool
/// calls they precede. A tool loop is an initial batch whose actions carry
/// thinking blocks (redacted ones count), every subsequent batch separated
/// from it only by actions and observations, and any trailing
/// observations. The first event that is neither terminates the loop.
#[derive(Debug, Default)]
pub struct ToolLoopAtomicity;

/// Positional extent of one batch within an event sequence.
struct BatchRange {
    min_idx: usize,
    max_idx: usize,
    has_thinking: bool,
}

/// Batch extents sorted by first position.
fn batch_ranges(events: &[Event]) -> Vec<BatchRange> {
    let index = event_index(events);

    let mut ranges: Vec<BatchRange> = batches(events)
        .values()
        .map(|action_ids| {
            let positions: Vec<usize> = action_ids.iter().map(|id| index[id]).collect();
            let min_idx = *positions.iter().min().expect("batch is non-empty");
            let max_idx = *positions.iter().max().expect("batch is non-empty");
            let has_thinking = positions.iter().any(|&idx| events[idx].has_thinking());
            BatchRange { min_idx, max_idx, has_thinking }
        })
        .collect();

    ranges.sort_by_key(|range| range.min_idx);
    ranges
}

/// Scan forward from the batch at `start` (which must carry thinking) to
/// the full extent of its tool loop. Returns the loop's event-index range
/// and the position in `ranges` after the loop.
fn scan_loop_extent(start: usize, ranges: &[BatchRange], events: &[Event]) -> (usize, usize, usize) {
    debug_assert!(ranges[start].has_thinking);

    let loop_start = ranges[start].min_idx;
    let mut loop_end = ranges[start].max_idx;

    // Absorb consecutive batches separated only by tool traffic.
    let mut next = start + 1;
    while next < ranges.len() {
        let candidate = &ranges[next];
        let gap_is_tool_traffic =
            (loop_end + 1..candidate.min_idx).all(|idx| is_tool_traffic(&events[idx]));
        if !gap_is_tool_traffic {
            break;
        }
        loop_end = candidate.max_idx;
        next += 1;
    }

    // Absorb trailing observations; any other event ends the loop.
    let mut scan = loop_end + 1;
    while scan < events.len() && events[scan].is_observation_like() {
        loop_end = scan;
        scan += 1;
    }

    (loop_start, loop_end, next)
}

/// Event-index ranges of every tool loop in `events`.
fn loop_ranges(events: &[Event]) -> Vec<(usize, usize)> {
    let ranges = batch_ranges(events);

    let mut loops = Vec::new();
    let mut i = 0;
    while i < ranges.len() {
        if ranges[i].has_thinking {
            let (loop_start, loop_end, next) = scan_loop_extent(i, &ranges, events);
            loops.push((loop_start, loop_end));
            i = next;
        } else {
            i += 1;
        }
    }
    loops
}

impl ViewProperty for ToolLoopAtomicity {
    fn name(&self) -> &'static str {
        "ToolLoopAtomicity"
    }

    fn enforce(&self, view_events: &[Event], all_events: &[Event]) -> HashSet<EventId> {
        // Loops are identified over the full history; a loop partially
        // present in the view loses its remaining members.
        let view_ids: HashSet<&EventId> = view_events.iter().map(Event::id).collect();

        let mut to_remove = HashSet::new();
        for (loop_start, loop_end) in loop_ranges(all_events) {
            let member_ids: Vec<&EventId> =
                all_events[loop_start..=loop_end].iter().map(Event::id).collect();
            let in_view: Vec<&EventId> = member_ids
                .iter()
                .copied()
                .filter(|id| view_ids.contains(*id))
                .collect();

            if !in_view.is_empty() && in_view.len() < member_ids.len() {
                to_remove.extend(in_view.into_iter().cloned());
            }
        }
        to_remove
    }

    fn manipulation_indices(&self, view_events: &[Event]) -> ManipulationIndices {
        indices_outside_ranges(&loop_ranges(view_events), view_events.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engram_types::{ActionEvent, MessageEvent, ObservationEvent, Role, ThinkingBlock};

    fn thinking() -> Vec<ThinkingBlock> {
        vec![ThinkingBlock::Thinking { thinking: "plan".into(), signature: "sig".into() }]
    }

    fn redacted() -> Vec<ThinkingBlock> {
        vec![ThinkingBlock::RedactedThinking { data: "blob".into() }]
    }

    /// A1(thinking) O1 A2 O2 M; the loop covers indices 0..=3.
    fn loop_then_message(blocks: Vec<ThinkingBlock>) -> Vec<Event> {
        let a1 = ActionEvent::new("resp_1", "call_1", "bash").with_thinking_blocks(blocks);
        let o1 = ObservationEvent::new(&a1, "out 1");
        let a2 = ActionEvent::new("resp_2", "call_2", "grep");
        let o2 = ObservationEvent::new(&a2, "out 2");
        vec![
            a1.into(),
            o1.into(),
            a2.into(),
            o2.into(),
            MessageEvent::new(Role::User, "done?").into(),
        ]
    }

    #[test]
    fn loop_extends_across_consecutive_batches() {
        let events = loop_then_message(thinking());
        assert_eq!(loop_ranges(&events), vec![(0, 3)]);
    }

    #[test]
    fn redacted_thinking_anchors_a_loop() {
        let events = loop_then_message(redacted());
        assert_eq!(loop_ranges(&events), vec![(0, 3)]);
    }

    #[test]
    fn no_thinking_no_loop() {
        let a1 = ActionEvent::new("resp_1", "call_1", "bash");
        let o1 = ObservationEvent::new(&a1, "out");
        let events: Vec<Event> = vec![a1.into(), o1.into()];
        assert!(loop_ranges(&events).is_empty());
    }

    #[test]
    fn degenerate_loop_covers_its_own_batch_and_observations() {
        let a1 = ActionEvent::new("resp_1", "call_1", "bash").with_thinking_blocks(thinking());
        let o1 = ObservationEvent::new(&a1, "out");
        let events: Vec<Event> = vec![
            a1.into(),
            o1.into(),
            MessageEvent::new(Role::User, "thanks").into(),
        ];
        assert_eq!(loop_ranges(&events), vec![(0, 1)]);
    }

    #[test]
    fn message_in_gap_terminates_the_loop() {
        let a1 = ActionEvent::new("resp_1", "call_1", "bash").with_thinking_blocks(thinking());
        let o1 = ObservationEvent::new(&a1, "out 1");
        let a2 = ActionEvent::new("resp_2", "call_2", "grep");
        let o2 = ObservationEvent::new(&a2, "out 2");
        let events: Vec<Event> = vec![
            a1.into(),
            o1.into(),
            MessageEvent::new(Role::User, "interruption").into(),
            a2.into(),
            o2.into(),
        ];
        assert_eq!(loop_ranges(&events), vec![(0, 1)]);
    }

    #[test]
    fn independent_loops_are_separate() {
        let a1 = ActionEvent::new("resp_1", "call_1", "bash").with_thinking_blocks(thinking());
        let o1 = ObservationEvent::new(&a1, "out 1");
        let a2 = ActionEvent::new("resp_2", "call_2", "grep").with_thinking_blocks(thinking());
        let o2 = ObservationEvent::new(&a2, "out 2");
        let events: Vec<Event> = vec![
            a1.into(),
            o1.into(),
            MessageEvent::new(Role::User, "next").into(),
            a2.into(),
            o2.into(),
        ];
        assert_eq!(loop_ranges(&events), vec![(0, 1), (3, 4)]);
    }

    #[test]
    fn partial_loop_is_fully_dropped_from_the_view() {
        let all = loop_then_message(thinking());
        // View lost the second observation (index 3).
        let view: Vec<Event> = vec![
            all[0].clone(),
            all[1].clone(),
            all[2].clone(),
            all[4].clone(),
        ];
        let removed = ToolLoopAtomicity.enforce(&view, &all);
        let expected: HashSet<EventId> =
            [&all[0], &all[1], &all[2]].iter().map(|e| e.id().clone()).collect();
        assert_eq!(removed, expected);
    }

    #[test]
    fn complete_loop_in_view_is_untouched() {
        let all = loop_then_message(thinking());
        assert!(ToolLoopAtomicity.enforce(&all, &all).is_empty());
    }

    #[test]
    fn fully_absent_loop_requires_nothing() {
        let all = loop_then_message(thinking());
        let view: Vec<Event> = vec![all[4].clone()];
        assert!(ToolLoopAtomicity.enforce(&view, &all).is_empty());
    }

    #[test]
    fn boundaries_exclude_loop_interior() {
        let events = loop_then_message(thinking());
        // Loop spans 0..=3; only 0, 4, and 5 remain admissible.
        let indices = ToolLoopAtomicity.manipulation_indices(&events);
        assert_eq!(indices.iter().collect::<Vec<_>>(), vec![0, 4, 5]);
    }
}
