//! The state machine: owner of one session's event log.
//!
//! Every mutation goes through the log. State is never patched in place;
//! after each change the machine replays the log from the configuration
//! and caches the result until the next change.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::config::GameConfig;
use crate::error::{TwError, TwResult};
use crate::event::{Event, EventId, EventType, StateDiff};
use crate::log::EventLog;
use crate::replay::{self, AppliedDiff};
use crate::state::{GameSession, GameState};

/// Event-sourced state for a single game session.
#[derive(Debug, Clone)]
pub struct StateMachine {
    session_id: String,
    config: GameConfig,
    log: EventLog,
    cache: Option<GameState>,
}

impl StateMachine {
    /// Create a machine with an empty log.
    pub fn new(session_id: impl Into<String>, config: GameConfig) -> Self {
        Self {
            session_id: session_id.into(),
            config,
            log: EventLog::new(),
            cache: None,
        }
    }

    /// Rebuild a machine from a saved session.
    ///
    /// Only the session ID, configuration and event history are used; any
    /// stored `current_state` is discarded and derived afresh. Nothing is
    /// appended to the log, but events saved without an ID are given one.
    pub fn restore(session: GameSession) -> TwResult<Self> {
        let mut events = session.event_history;
        for event in events.iter_mut().filter(|e| e.id.is_empty()) {
            event.id = EventId::new();
        }
        let mut machine = Self {
            session_id: session.session_id,
            config: session.config,
            log: EventLog::from(events),
            cache: None,
        };
        let state = machine.derive_state()?;
        machine.cache = Some(state);
        info!(
            session = %machine.session_id,
            events = machine.log.len(),
            "restored session"
        );
        Ok(machine)
    }

    /// The session identifier.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// The configuration the session runs under.
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// The event log.
    pub fn log(&self) -> &EventLog {
        &self.log
    }

    /// All events in log order.
    pub fn events(&self) -> &[Event] {
        self.log.as_slice()
    }

    /// Number of events in the log.
    pub fn len(&self) -> usize {
        self.log.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    // -----------------------------------------------------------------------
    // Recording
    // -----------------------------------------------------------------------

    /// Build an event with a fresh ID, stamped no earlier than the last
    /// event in the log. The event is not appended.
    pub fn create_event(
        &self,
        event_type: EventType,
        actor_id: Option<&str>,
        data: Map<String, Value>,
        state_diffs: Vec<StateDiff>,
    ) -> Event {
        let now = Utc::now();
        let timestamp = self.log.last().map_or(now, |last| last.timestamp.max(now));
        let event = Event::new(event_type)
            .with_data(data)
            .with_diffs(state_diffs)
            .at(timestamp);
        match actor_id {
            Some(actor) => event.with_actor(actor),
            None => event,
        }
    }

    /// Append an event and return the new derived state.
    ///
    /// An event without an ID gets one. If the new log cannot be replayed
    /// the event is dropped again and the error returned.
    pub fn add_event(&mut self, mut event: Event) -> TwResult<&GameState> {
        if event.id.is_empty() {
            event.id = EventId::new();
        }
        debug!(
            id = %event.id,
            event_type = %event.event_type,
            diffs = event.state_diffs.len(),
            "appending event"
        );
        self.log.push(event);
        match self.derive_state() {
            Ok(state) => Ok(self.cache.insert(state)),
            Err(e) => {
                self.log.pop();
                Err(e)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Rewriting history
    // -----------------------------------------------------------------------

    /// Drop every event after the one with the given ID.
    pub fn rollback_to(&mut self, id: &EventId) -> TwResult<&GameState> {
        let index = self
            .log
            .position(id)
            .ok_or_else(|| TwError::EventNotFound(id.clone()))?;
        let dropped = self.log.len() - index - 1;
        self.log.truncate(index + 1);
        info!(to = %id, dropped, "rolled back");
        self.refresh()
    }

    /// Keep the longest prefix of events stamped at or before `timestamp`.
    ///
    /// The first event always survives, even when it is later than
    /// `timestamp`.
    pub fn rollback_to_timestamp(&mut self, timestamp: DateTime<Utc>) -> TwResult<&GameState> {
        let keep = self.log.prefix_until(timestamp).max(self.log.len().min(1));
        let dropped = self.log.len() - keep;
        self.log.truncate(keep);
        info!(to = %timestamp, dropped, "rolled back to timestamp");
        self.refresh()
    }

    /// Replace the payload and/or diffs of an event in place.
    ///
    /// Later events are replayed on top of the edited one, so the change
    /// ripples forward. If the edited log cannot be replayed the old
    /// content is put back and the error returned.
    pub fn edit_event(
        &mut self,
        id: &EventId,
        new_data: Option<Map<String, Value>>,
        new_diffs: Option<Vec<StateDiff>>,
    ) -> TwResult<&GameState> {
        let event = self
            .log
            .get_mut(id)
            .ok_or_else(|| TwError::EventNotFound(id.clone()))?;
        let old_data = new_data.map(|data| std::mem::replace(&mut event.data, data));
        let old_diffs = new_diffs.map(|diffs| std::mem::replace(&mut event.state_diffs, diffs));

        match self.derive_state() {
            Ok(state) => {
                info!(id = %id, "edited event");
                Ok(self.cache.insert(state))
            }
            Err(e) => {
                if let Some(event) = self.log.get_mut(id) {
                    if let Some(data) = old_data {
                        event.data = data;
                    }
                    if let Some(diffs) = old_diffs {
                        event.state_diffs = diffs;
                    }
                }
                Err(e)
            }
        }
    }

    /// Discard the latest message by `actor_id` and everything after it, so
    /// the message can be produced again.
    pub fn redraw_last_message(&mut self, actor_id: &str) -> TwResult<&GameState> {
        let index = self
            .log
            .as_slice()
            .iter()
            .rposition(|e| e.event_type == EventType::Message && e.is_from(actor_id))
            .ok_or_else(|| TwError::MessageNotFound(actor_id.to_string()))?;
        let dropped = self.log.len() - index;
        self.log.truncate(index);
        info!(actor = actor_id, dropped, "redrawing last message");
        self.refresh()
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Look up an event by ID.
    pub fn get_event_by_id(&self, id: &EventId) -> TwResult<&Event> {
        self.log
            .get(id)
            .ok_or_else(|| TwError::EventNotFound(id.clone()))
    }

    /// Events of the given type, in log order.
    pub fn find_events_by_type(&self, event_type: EventType) -> Vec<&Event> {
        self.log.by_type(event_type)
    }

    /// Events caused by the given actor, in log order.
    pub fn find_events_by_actor(&self, actor_id: &str) -> Vec<&Event> {
        self.log.by_actor(actor_id)
    }

    /// Events stamped strictly after `timestamp`.
    pub fn events_after(&self, timestamp: DateTime<Utc>) -> Vec<&Event> {
        self.log.events_after(timestamp)
    }

    /// The state at the end of the log, derived on first use and cached.
    pub fn current_state(&mut self) -> TwResult<&GameState> {
        let state = match self.cache.take() {
            Some(state) => state,
            None => self.derive_state()?,
        };
        Ok(self.cache.insert(state))
    }

    /// Replay the whole log from the configuration, bypassing the cache.
    pub fn derive_state(&self) -> TwResult<GameState> {
        debug!(
            session = %self.session_id,
            events = self.log.len(),
            "deriving state"
        );
        replay::derive_state(&self.session_id, &self.config, self.log.as_slice())
    }

    /// Replay the log and report each applied diff with its previous value.
    pub fn trace(&self) -> TwResult<Vec<AppliedDiff>> {
        replay::trace(&self.session_id, &self.config, self.log.as_slice())
    }

    /// Snapshot the session for saving.
    pub fn session(&self) -> TwResult<GameSession> {
        let current_state = match &self.cache {
            Some(state) => state.clone(),
            None => self.derive_state()?,
        };
        Ok(GameSession {
            session_id: self.session_id.clone(),
            config: self.config.clone(),
            event_history: self.log.as_slice().to_vec(),
            current_state: Some(current_state),
        })
    }

    fn refresh(&mut self) -> TwResult<&GameState> {
        self.cache = None;
        let state = self.derive_state()?;
        Ok(self.cache.insert(state))
    }
}
