//! The append-only event log owned by a state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::{Event, EventId, EventType};

/// An ordered sequence of events.
///
/// Only ever grows at the end, or loses a suffix on rollback. Single events
/// may have their content patched in place but never move.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event.
    pub fn push(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Remove and return the last event.
    pub(crate) fn pop(&mut self) -> Option<Event> {
        self.events.pop()
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// All events in order.
    pub fn as_slice(&self) -> &[Event] {
        &self.events
    }

    /// Iterate events in order.
    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    /// The last event.
    pub fn last(&self) -> Option<&Event> {
        self.events.last()
    }

    /// Index of the event with the given ID.
    pub fn position(&self, id: &EventId) -> Option<usize> {
        self.events.iter().position(|e| &e.id == id)
    }

    /// The event with the given ID.
    pub fn get(&self, id: &EventId) -> Option<&Event> {
        self.events.iter().find(|e| &e.id == id)
    }

    /// Mutable access to the event with the given ID.
    pub(crate) fn get_mut(&mut self, id: &EventId) -> Option<&mut Event> {
        self.events.iter_mut().find(|e| &e.id == id)
    }

    /// Keep the first `len` events and drop the rest.
    pub fn truncate(&mut self, len: usize) {
        self.events.truncate(len);
    }

    /// Drop every event.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Events of the given type, in order.
    pub fn by_type(&self, event_type: EventType) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.event_type == event_type)
            .collect()
    }

    /// Events caused by the given actor, in order.
    pub fn by_actor(&self, actor_id: &str) -> Vec<&Event> {
        self.events.iter().filter(|e| e.is_from(actor_id)).collect()
    }

    /// Events strictly after the given instant.
    pub fn events_after(&self, timestamp: DateTime<Utc>) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.timestamp > timestamp)
            .collect()
    }

    /// Length of the longest prefix whose events are all at or before
    /// `timestamp`.
    pub fn prefix_until(&self, timestamp: DateTime<Utc>) -> usize {
        self.events
            .iter()
            .take_while(|e| e.timestamp <= timestamp)
            .count()
    }

    /// Consume the log and return its events.
    pub fn into_vec(self) -> Vec<Event> {
        self.events
    }
}

impl From<Vec<Event>> for EventLog {
    fn from(events: Vec<Event>) -> Self {
        Self { events }
    }
}
