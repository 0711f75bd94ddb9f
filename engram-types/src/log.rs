//! The event-log capability consumed by the engine.

use crate::error::LogError;
use crate::event::Event;

/// An append-only, ordered conversation log.
///
/// The log owns its events. Appending is the sole mutation in the system;
/// callers serialize appends per conversation (a mutex or actor-style
/// inbox suffices). Reads never mutate, so concurrent snapshots are safe.
pub trait EventLog {
    /// Append an event. No out-of-order writes.
    fn append(&self, event: Event) -> Result<(), LogError>;

    /// An ordered snapshot of every event appended so far.
    fn snapshot(&self) -> Result<Vec<Event>, LogError>;
}
