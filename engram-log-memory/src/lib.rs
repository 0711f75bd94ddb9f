#![deny(missing_docs)]
//! In-memory implementation of engram's EventLog trait.
//!
//! Uses a `Vec` behind a `RwLock`. Suitable for testing, prototyping, and
//! single-process use where persistence across restarts is not required.
//! Appends are serialized by the lock; snapshots are cheap clones and
//! never block other readers.

use std::sync::RwLock;

use engram_types::{Event, EventLog, LogError};

/// In-memory append-only event log backed by a `Vec` behind a `RwLock`.
pub struct MemoryEventLog {
    events: RwLock<Vec<Event>>,
}

impl MemoryEventLog {
    /// Create a new empty log.
    #[must_use]
    pub fn new() -> Self {
        Self { events: RwLock::new(Vec::new()) }
    }

    /// Create a log seeded with existing history.
    #[must_use]
    pub fn with_events(events: Vec<Event>) -> Self {
        Self { events: RwLock::new(events) }
    }
}

impl Default for MemoryEventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLog for MemoryEventLog {
    fn append(&self, event: Event) -> Result<(), LogError> {
        let mut events = self
            .events
            .write()
            .map_err(|_| LogError::Other("event log lock poisoned".into()))?;
        events.push(event);
        Ok(())
    }

    fn snapshot(&self) -> Result<Vec<Event>, LogError> {
        let events = self
            .events
            .read()
            .map_err(|_| LogError::Other("event log lock poisoned".into()))?;
        Ok(events.clone())
    }
}
