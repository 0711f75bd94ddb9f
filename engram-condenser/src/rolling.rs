//! The rolling LLM-summarizing condenser.

use engram_types::{
    CompletionRequest, CompletionResponse, Condensation, CondenserError, EventId, LanguageModel,
    Message,
};
use engram_view::View;

use crate::budget::{estimate_tokens, max_tail_within_budget, token_budget};

/// Default trigger threshold on event count.
const DEFAULT_MAX_SIZE: usize = 120;
/// Default always-retained prefix length.
const DEFAULT_KEEP_FIRST: usize = 4;
/// Default headroom reserved under the context window.
const DEFAULT_TOKEN_MARGIN_RATIO: f32 = 0.1;

const SUMMARIZING_PROMPT: &str = "\
You maintain a condensed state summary of a conversation between an agent \
and its environment. Merge the previous summary with the events being \
dropped into a single replacement summary. Preserve the task intent, key \
decisions, file and identifier names, tool results that still matter, and \
every unresolved thread. Write in third person and be information-dense; \
the summary replaces the dropped history entirely.";

/// Build the summarizer prompt from the carried-over summary and the
/// string renderings of the events being dropped.
fn build_prompt(previous_summary: &str, events: &[String]) -> String {
    let mut prompt = String::from(SUMMARIZING_PROMPT);
    prompt.push_str("\n\n## Previous summary\n\n");
    if previous_summary.is_empty() {
        prompt.push_str("(none)\n");
    } else {
        prompt.push_str(previous_summary);
        prompt.push('\n');
    }
    prompt.push_str("\n## Events being dropped\n\n");
    for event in events {
        prompt.push_str(event);
        prompt.push('\n');
    }
    prompt
}

/// Stateless rolling condenser backed by a summarizer LLM.
///
/// Decides when a view needs condensing and produces the next
/// [`Condensation`] for the caller to append. Token-aware when the handle
/// exposes a context window and tokenizer; event-count driven otherwise.
/// When the view is too small to leave both a retained prefix and
/// anything to forget, it emits a hard reset (`summary_offset == 0`
/// covering the whole view) rather than failing, so the conversation can
/// always continue.
pub struct LlmSummarizingCondenser<L: LanguageModel> {
    llm: L,
    max_size: usize,
    keep_first: usize,
    token_margin_ratio: f32,
}

impl<L: LanguageModel> LlmSummarizingCondenser<L> {
    /// Create a condenser with the default configuration.
    #[must_use]
    pub fn new(llm: L) -> Self {
        Self {
            llm,
            max_size: DEFAULT_MAX_SIZE,
            keep_first: DEFAULT_KEEP_FIRST,
            token_margin_ratio: DEFAULT_TOKEN_MARGIN_RATIO,
        }
    }

    /// Create a condenser with an explicit configuration.
    ///
    /// # Errors
    ///
    /// [`CondenserError::InvalidConfig`] when `max_size` is zero, when
    /// `keep_first` does not leave room below `max_size / 2` for a
    /// condensation to shrink the view, or when `token_margin_ratio` is
    /// outside `[0.0, 0.5]`.
    pub fn with_config(
        llm: L,
        max_size: usize,
        keep_first: usize,
        token_margin_ratio: f32,
    ) -> Result<Self, CondenserError> {
        if max_size == 0 {
            return Err(CondenserError::InvalidConfig(
                "max_size must be greater than zero".into(),
            ));
        }
        if keep_first >= max_size / 2 {
            return Err(CondenserError::InvalidConfig(
                "keep_first must be less than max_size / 2 to leave room for condensation".into(),
            ));
        }
        if !(0.0..=0.5).contains(&token_margin_ratio) {
            return Err(CondenserError::InvalidConfig(
                "token_margin_ratio must be within [0.0, 0.5]".into(),
            ));
        }
        Ok(Self { llm, max_size, keep_first, token_margin_ratio })
    }

    /// Whether the view needs condensing: an unanswered request, a blown
    /// token budget, or an event count above `max_size`, checked in that
    /// order.
    #[must_use]
    pub fn should_condense(&self, view: &View) -> bool {
        if view.unhandled_condensation_request {
            return true;
        }

        if let Some(budget) = token_budget(&self.llm, self.token_margin_ratio) {
            if let Some(total) = estimate_tokens(&self.llm, &view.events) {
                return total > budget;
            }
        }

        view.len() > self.max_size
    }

    /// Condense the view if [`should_condense`](Self::should_condense)
    /// says so.
    ///
    /// # Errors
    ///
    /// [`CondenserError::SummarizerUnavailable`] when the summarizer call
    /// fails; nothing is emitted and the trigger condition persists.
    pub async fn maybe_condense(
        &self,
        view: &View,
    ) -> Result<Option<Condensation>, CondenserError> {
        if self.should_condense(view) {
            Ok(Some(self.get_condensation(view).await?))
        } else {
            Ok(None)
        }
    }

    /// Produce the next condensation for the view.
    ///
    /// The first `keep_first` events are always retained; the tail kept is
    /// either the largest suffix that fits the token budget or an
    /// event-count target of `max_size / 2` (`len / 2` when answering a
    /// condensation request). Everything between is summarized and
    /// forgotten, with the summary placed at offset `keep_first`.
    ///
    /// # Errors
    ///
    /// [`CondenserError::SummarizerUnavailable`] when the summarizer call
    /// fails. The log is left unchanged; the caller may retry.
    pub async fn get_condensation(&self, view: &View) -> Result<Condensation, CondenserError> {
        let len = view.len();

        // No valid range: too few events for the prefix to fit while
        // leaving anything to forget. Reset instead of failing.
        if len < self.keep_first + 2 {
            return self.hard_reset(view).await;
        }

        let token_tail = match token_budget(&self.llm, self.token_margin_ratio) {
            Some(budget) => max_tail_within_budget(&self.llm, view, self.keep_first, budget),
            None => None,
        };

        let events_from_tail = token_tail
            .unwrap_or_else(|| {
                let target_size = if view.unhandled_condensation_request {
                    // A requested condensation is sized from the view, not
                    // the configured threshold.
                    len / 2
                } else {
                    self.max_size / 2
                };
                target_size.saturating_sub(self.keep_first).saturating_sub(1)
            })
            .min(len - self.keep_first);

        let forgotten = &view.events[self.keep_first..len - events_from_tail];

        tracing::debug!(
            view_len = len,
            keep_first = self.keep_first,
            events_from_tail,
            forgotten = forgotten.len(),
            "condensing view"
        );

        let previous_summary = view
            .summary_event()
            .map(|summary| summary.summary.clone())
            .unwrap_or_default();
        let event_strings: Vec<String> = forgotten.iter().map(ToString::to_string).collect();

        let response = self.summarize(&previous_summary, &event_strings).await?;

        // Synthetic summary events never exist in the log, so their ids
        // have no place in a condensation receipt.
        let forgotten_event_ids: Vec<EventId> = forgotten
            .iter()
            .filter(|event| event.as_condensation_summary().is_none())
            .map(|event| event.id().clone())
            .collect();

        Ok(Condensation::new(
            forgotten_event_ids,
            response.first_text().map(str::to_owned),
            Some(self.keep_first),
            response.id,
        ))
    }

    /// Summarize the entire view and forget all of it.
    async fn hard_reset(&self, view: &View) -> Result<Condensation, CondenserError> {
        tracing::info!(
            view_len = view.len(),
            keep_first = self.keep_first,
            "no valid condensation range; performing hard reset"
        );

        let previous_summary = view
            .summary_event()
            .map(|summary| summary.summary.clone())
            .unwrap_or_default();
        let event_strings: Vec<String> = view.events.iter().map(ToString::to_string).collect();

        let response = self.summarize(&previous_summary, &event_strings).await?;

        let forgotten_event_ids: Vec<EventId> = view
            .events
            .iter()
            .filter(|event| event.as_condensation_summary().is_none())
            .map(|event| event.id().clone())
            .collect();

        Ok(Condensation::new(
            forgotten_event_ids,
            response.first_text().map(str::to_owned),
            Some(0),
            response.id,
        ))
    }

    /// One summarizer call. A failure or timeout surfaces as
    /// [`CondenserError::SummarizerUnavailable`] with no side effects.
    async fn summarize(
        &self,
        previous_summary: &str,
        events: &[String],
    ) -> Result<CompletionResponse, CondenserError> {
        let prompt = build_prompt(previous_summary, events);
        let request = CompletionRequest {
            messages: vec![Message::user(prompt)],
            system: None,
            max_tokens: self.llm.max_output_tokens(),
            temperature: Some(0.0),
        };
        self.llm
            .complete(request)
            .await
            .map_err(CondenserError::SummarizerUnavailable)
    }
}
