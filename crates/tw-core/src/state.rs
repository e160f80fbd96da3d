use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::character::Character;
use crate::config::GameConfig;
use crate::event::Event;

/// A snapshot of the game derived by replaying the event log.
///
/// Never a source of truth: any `GameState` can be rebuilt from the
/// configuration and the events that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    /// Session this state belongs to.
    pub session_id: String,
    /// Global state tree.
    pub state: Map<String, Value>,
    /// Characters keyed by ID.
    pub characters: BTreeMap<String, Character>,
    /// Current turn number.
    pub current_turn: u64,
    /// Current phase of play, if any.
    pub current_phase: Option<String>,
    /// Character whose turn it is, if any.
    pub current_actor: Option<String>,
    /// Payloads of all message events, in log order.
    pub messages: Vec<Map<String, Value>>,
    /// Timestamp of the first replayed event.
    pub created_at: Option<DateTime<Utc>>,
    /// Timestamp of the last replayed event.
    pub updated_at: Option<DateTime<Utc>>,
}

impl GameState {
    /// The state before any event is applied: copies of the configured
    /// initial state and characters.
    pub fn initial(session_id: impl Into<String>, config: &GameConfig) -> Self {
        Self {
            session_id: session_id.into(),
            state: config.initial_state.clone(),
            characters: config.characters.clone(),
            current_turn: 0,
            current_phase: None,
            current_actor: None,
            messages: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }

    /// Look up a character by ID.
    pub fn character(&self, id: &str) -> Option<&Character> {
        self.characters.get(id)
    }

    /// The most recent message, if any.
    pub fn last_message(&self) -> Option<&Map<String, Value>> {
        self.messages.last()
    }
}

/// Everything needed to persist and restore a session: the configuration
/// and the event history, plus the derived state for convenience.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSession {
    /// Session identifier.
    pub session_id: String,
    /// Configuration the session was started with.
    pub config: GameConfig,
    /// The complete event log.
    pub event_history: Vec<Event>,
    /// Derived state at the end of the log; ignored on restore.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_state: Option<GameState>,
}

impl GameSession {
    /// Parse a session from JSON.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize the session as pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
