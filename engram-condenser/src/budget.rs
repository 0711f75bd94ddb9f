//! Token accounting against an LLM handle's context window.
//!
//! Everything here degrades gracefully: a handle without a context window
//! or tokenizer yields `None`, and callers fall back to event-count
//! policies.

use engram_types::{Event, LanguageModel, Message};
use engram_view::View;

/// The token budget for a view: the context window minus the reserved
/// margin, or `None` when the handle does not expose a window.
#[must_use]
pub fn token_budget<L: LanguageModel>(llm: &L, margin_ratio: f32) -> Option<u32> {
    llm.context_window()
        .map(|window| (f64::from(window) * (1.0 - f64::from(margin_ratio))).floor() as u32)
}

/// Render view events as LLM messages. Markers convert to nothing.
#[must_use]
pub fn events_to_messages(events: &[Event]) -> Vec<Message> {
    events.iter().filter_map(Event::to_llm_message).collect()
}

/// Token cost of the events as LLM input, or `None` when the handle has
/// no tokenizer.
#[must_use]
pub fn estimate_tokens<L: LanguageModel>(llm: &L, events: &[Event]) -> Option<u32> {
    llm.count_tokens(&events_to_messages(events))
}

/// The largest tail length `k` such that `view[..keep_first]` followed by
/// `view[len - k..]` costs at most `budget` tokens.
///
/// Cost is monotone in `k`, so a binary search suffices. Returns `0` when
/// even the prefix alone exceeds the budget, and `None` when the handle
/// has no tokenizer (callers fall back to event-count trimming).
#[must_use]
pub fn max_tail_within_budget<L: LanguageModel>(
    llm: &L,
    view: &View,
    keep_first: usize,
    budget: u32,
) -> Option<usize> {
    let len = view.len();
    let keep_first = keep_first.min(len);
    let head = &view.events[..keep_first];

    let cost = |tail: usize| -> Option<u32> {
        let mut candidate: Vec<Event> = head.to_vec();
        candidate.extend_from_slice(&view.events[len - tail..]);
        estimate_tokens(llm, &candidate)
    };

    let mut lo = 0usize;
    let mut hi = len - keep_first;
    while lo < hi {
        let mid = (lo + hi + 1) / 2;
        if cost(mid)? <= budget {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }
    Some(lo)
}
