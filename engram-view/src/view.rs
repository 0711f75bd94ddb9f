//! Derivation of LLM-ready views from conversation logs.

use std::collections::HashSet;
use std::ops::Index;

use engram_types::{Condensation, CondensationSummaryEvent, Event, EventId};

use crate::manipulation_indices::ManipulationIndices;
use crate::properties::{BatchAtomicity, ToolCallMatching, ToolLoopAtomicity, ViewProperty};

/// Safety cap on the property-enforcement fixpoint loop.
const MAX_ENFORCEMENT_ITERATIONS: usize = 10;

/// Linearly ordered view of events, ready to process as LLM input.
///
/// Produced from a log snapshot by applying condensation semantics and
/// enforcing the view properties. Also carries information from the
/// condensation process to aid in deciding whether further condensation
/// is needed. Views are always rederived, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    /// The kept events, in log order, plus at most one synthetic
    /// [`CondensationSummaryEvent`].
    pub events: Vec<Event>,

    /// Whether a condensation request is still unanswered, i.e. closer to
    /// the end of the log than any condensation.
    pub unhandled_condensation_request: bool,

    /// The condensations processed to produce this view, in log order.
    pub condensations: Vec<Condensation>,

    /// Boundaries between atomic units where events can be safely
    /// inserted or forgotten. Always includes `0` and `len(events)`.
    pub manipulation_indices: ManipulationIndices,
}

impl View {
    /// Number of events in the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the view holds no events.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// The most recent condensation, if any.
    #[must_use]
    pub fn most_recent_condensation(&self) -> Option<&Condensation> {
        self.condensations.last()
    }

    /// Index of the synthetic summary event, taken from the most recent
    /// condensation when it carries both a summary and an offset.
    #[must_use]
    pub fn summary_event_index(&self) -> Option<usize> {
        self.most_recent_condensation().and_then(|condensation| {
            match (&condensation.summary, condensation.summary_offset) {
                (Some(_), Some(offset)) => Some(offset),
                _ => None,
            }
        })
    }

    /// The synthetic summary event, when the event at
    /// [`summary_event_index`](Self::summary_event_index) actually is one.
    #[must_use]
    pub fn summary_event(&self) -> Option<&CondensationSummaryEvent> {
        self.summary_event_index()
            .and_then(|index| self.events.get(index))
            .and_then(Event::as_condensation_summary)
    }

    /// The smallest manipulation index greater than (or, when not
    /// `strict`, equal to) `threshold`, falling back to `threshold` when
    /// none exists. Helper for condensation logic choosing safe forget
    /// boundaries.
    #[must_use]
    pub fn find_next_manipulation_index(&self, threshold: usize, strict: bool) -> usize {
        self.manipulation_indices.find_next(threshold, strict)
    }

    /// Derive a view from an ordered log snapshot, respecting the
    /// semantics of any condensation events. Pure and deterministic (up
    /// to the minted identity of the synthetic summary event).
    #[must_use]
    pub fn from_events(events: &[Event]) -> View {
        let mut forgotten: HashSet<EventId> = HashSet::new();
        let mut condensations: Vec<Condensation> = Vec::new();

        for event in events {
            match event {
                Event::Condensation(condensation) => {
                    condensations.push(condensation.clone());
                    forgotten.extend(condensation.forgotten_event_ids.iter().cloned());
                    // The condensation receipt itself never reaches the view.
                    forgotten.insert(condensation.id.clone());
                }
                Event::CondensationRequest(request) => {
                    forgotten.insert(request.id.clone());
                }
                _ => {}
            }
        }

        let mut kept: Vec<Event> = events
            .iter()
            .filter(|event| !forgotten.contains(event.id()) && event.is_llm_convertible())
            .cloned()
            .collect();

        // The relevant summary is in the most recent condensation that
        // carries one.
        let summary = events.iter().rev().find_map(|event| {
            event.as_condensation().and_then(|condensation| {
                match (&condensation.summary, condensation.summary_offset) {
                    (Some(text), Some(offset)) => Some((text.clone(), offset)),
                    _ => None,
                }
            })
        });

        if let Some((text, offset)) = summary {
            let offset = offset.min(kept.len());
            tracing::debug!(offset, "inserting condensation summary");
            kept.insert(offset, CondensationSummaryEvent::new(text).into());
        }

        // An unhandled request is one closer to the end of the log than
        // any condensation.
        let mut unhandled_condensation_request = false;
        for event in events.iter().rev() {
            match event {
                Event::Condensation(_) => break,
                Event::CondensationRequest(_) => {
                    unhandled_condensation_request = true;
                    break;
                }
                _ => {}
            }
        }

        // Properties are checked in order; any removal restarts the list
        // from the first property to handle cascading effects.
        let properties: [&dyn ViewProperty; 3] =
            [&ToolCallMatching, &BatchAtomicity, &ToolLoopAtomicity];

        let mut view_events = kept;
        let mut converged = false;

        for iteration in 1..=MAX_ENFORCEMENT_ITERATIONS {
            let mut removed: HashSet<EventId> = HashSet::new();

            for property in properties {
                let to_remove = property.enforce(&view_events, events);
                if !to_remove.is_empty() {
                    tracing::debug!(
                        iteration,
                        property = property.name(),
                        count = to_remove.len(),
                        "property enforcement removing events"
                    );
                    removed = to_remove;
                    break;
                }
            }

            if removed.is_empty() {
                converged = true;
                break;
            }
            view_events.retain(|event| !removed.contains(event.id()));
        }

        if !converged {
            tracing::warn!(
                max_iterations = MAX_ENFORCEMENT_ITERATIONS,
                "property enforcement reached its iteration cap; returning the view in its last state"
            );
        }

        let manipulation_indices = if view_events.is_empty() {
            ManipulationIndices::new([0])
        } else {
            properties.iter().fold(
                ManipulationIndices::all_boundaries(view_events.len()),
                |indices, property| indices.intersect(&property.manipulation_indices(&view_events)),
            )
        };

        View {
            events: view_events,
            unhandled_condensation_request,
            condensations,
            manipulation_indices,
        }
    }
}

impl Index<usize> for View {
    type Output = Event;

    fn index(&self, index: usize) -> &Event {
        &self.events[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engram_types::{MessageEvent, Role};

    fn message(text: &str) -> Event {
        MessageEvent::new(Role::User, text).into()
    }

    #[test]
    fn empty_log_yields_empty_view() {
        let view = View::from_events(&[]);
        assert!(view.is_empty());
        assert!(!view.unhandled_condensation_request);
        assert!(view.condensations.is_empty());
        assert_eq!(view.manipulation_indices, ManipulationIndices::new([0]));
    }

    #[test]
    fn plain_messages_pass_through() {
        let events = vec![message("a"), message("b")];
        let view = View::from_events(&events);
        assert_eq!(view.events, events);
        assert_eq!(
            view.manipulation_indices,
            ManipulationIndices::all_boundaries(2)
        );
    }

    #[test]
    fn indexing_reaches_events() {
        let events = vec![message("a"), message("b")];
        let view = View::from_events(&events);
        assert_eq!(&view[1], &events[1]);
    }

    #[test]
    fn summary_offset_is_clamped_to_kept_length() {
        let condensation = Condensation::new(vec![], Some("everything".into()), Some(99), "resp");
        let events: Vec<Event> = vec![message("a"), condensation.into()];
        let view = View::from_events(&events);
        assert_eq!(view.len(), 2);
        assert!(view.events[1].as_condensation_summary().is_some());
    }
}
