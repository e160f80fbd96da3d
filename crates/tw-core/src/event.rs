use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::TwError;

/// Unique identifier of an event in a session log.
///
/// An empty ID marks an event whose ID has not been assigned yet; the state
/// machine fills it in on append.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub String);

impl EventId {
    /// Generate a new random event ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// True if no ID has been assigned.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EventId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for EventId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// The kind of an event in the session timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// The session began.
    GameStart,
    /// The session ended.
    GameEnd,
    /// A character's turn began.
    TurnStart,
    /// A character's turn ended.
    TurnEnd,
    /// A character performed an action.
    Action,
    /// Dice were rolled.
    DiceRoll,
    /// Game state was changed directly.
    StateUpdate,
    /// A chat message was posted.
    Message,
    /// A character joined the session.
    CharacterJoin,
    /// A character left the session.
    CharacterLeave,
}

impl EventType {
    /// All event types, in declaration order.
    pub const ALL: [EventType; 10] = [
        Self::GameStart,
        Self::GameEnd,
        Self::TurnStart,
        Self::TurnEnd,
        Self::Action,
        Self::DiceRoll,
        Self::StateUpdate,
        Self::Message,
        Self::CharacterJoin,
        Self::CharacterLeave,
    ];

    /// The snake_case tag used on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GameStart => "game_start",
            Self::GameEnd => "game_end",
            Self::TurnStart => "turn_start",
            Self::TurnEnd => "turn_end",
            Self::Action => "action",
            Self::DiceRoll => "dice_roll",
            Self::StateUpdate => "state_update",
            Self::Message => "message",
            Self::CharacterJoin => "character_join",
            Self::CharacterLeave => "character_leave",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = TwError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == tag)
            .ok_or_else(|| TwError::InvalidEventType(s.to_string()))
    }
}

/// An atomic mutation applied at a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Overwrite the location.
    Set,
    /// Numeric addition; absent counts as 0.
    Add,
    /// Numeric subtraction; absent counts as 0.
    Subtract,
    /// Numeric multiplication; absent counts as 1.
    Multiply,
    /// Push onto a list; absent becomes a one-element list.
    Append,
    /// Remove the first equal element from a list.
    Remove,
    /// Remove the key itself from its parent.
    Delete,
}

impl Operation {
    /// The lowercase tag used on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Set => "set",
            Self::Add => "add",
            Self::Subtract => "subtract",
            Self::Multiply => "multiply",
            Self::Append => "append",
            Self::Remove => "remove",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = TwError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "set" => Ok(Self::Set),
            "add" => Ok(Self::Add),
            "subtract" => Ok(Self::Subtract),
            "multiply" => Ok(Self::Multiply),
            "append" => Ok(Self::Append),
            "remove" => Ok(Self::Remove),
            "delete" => Ok(Self::Delete),
            _ => Err(TwError::InvalidOperation(s.to_string())),
        }
    }
}

/// One path-addressed mutation carried by an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateDiff {
    /// Dot-delimited location, e.g. `characters.player1.state.hp`.
    pub path: String,
    /// What to do at that location.
    pub operation: Operation,
    /// Operand of the operation.
    #[serde(default)]
    pub value: Value,
    /// The value found at `path` before the change, when recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_value: Option<Value>,
}

impl StateDiff {
    /// Create a diff.
    pub fn new(path: impl Into<String>, operation: Operation, value: impl Into<Value>) -> Self {
        Self {
            path: path.into(),
            operation,
            value: value.into(),
            previous_value: None,
        }
    }

    /// Create a diff from an untyped operation tag.
    pub fn parse(
        path: impl Into<String>,
        operation: &str,
        value: impl Into<Value>,
    ) -> Result<Self, TwError> {
        Ok(Self::new(path, operation.parse()?, value))
    }
}

/// A recorded occurrence in the session timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Unique identifier.
    #[serde(default)]
    pub id: EventId,
    /// When the event was created.
    pub timestamp: DateTime<Utc>,
    /// What kind of event this is.
    #[serde(rename = "type")]
    pub event_type: EventType,
    /// The character or entity that caused the event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<String>,
    /// Event-specific payload.
    #[serde(default)]
    pub data: Map<String, Value>,
    /// State changes caused by the event, applied in order.
    #[serde(default)]
    pub state_diffs: Vec<StateDiff>,
    /// Free-form annotations that never affect replay.
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Event {
    /// Create an event of the given type with a fresh ID, stamped now.
    pub fn new(event_type: EventType) -> Self {
        Self {
            id: EventId::new(),
            timestamp: Utc::now(),
            event_type,
            actor_id: None,
            data: Map::new(),
            state_diffs: Vec::new(),
            metadata: Map::new(),
        }
    }

    /// Set the actor.
    pub fn with_actor(mut self, actor_id: impl Into<String>) -> Self {
        self.actor_id = Some(actor_id.into());
        self
    }

    /// Set the payload.
    pub fn with_data(mut self, data: Map<String, Value>) -> Self {
        self.data = data;
        self
    }

    /// Set the state diffs.
    pub fn with_diffs(mut self, diffs: Vec<StateDiff>) -> Self {
        self.state_diffs = diffs;
        self
    }

    /// Set the metadata.
    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Override the timestamp.
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// True if the event was caused by the given actor.
    pub fn is_from(&self, actor_id: &str) -> bool {
        self.actor_id.as_deref() == Some(actor_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn event_type_parse_and_display() {
        for t in EventType::ALL {
            assert_eq!(t.as_str().parse::<EventType>().unwrap(), t);
        }
        assert_eq!("Message".parse::<EventType>().unwrap(), EventType::Message);
        assert!(matches!(
            "teleport".parse::<EventType>(),
            Err(TwError::InvalidEventType(_))
        ));
    }

    #[test]
    fn operation_rejects_unknown_tag() {
        assert_eq!("ADD".parse::<Operation>().unwrap(), Operation::Add);
        let err = StateDiff::parse("hp", "divide", 2).unwrap_err();
        assert!(matches!(err, TwError::InvalidOperation(op) if op == "divide"));
    }

    #[test]
    fn event_serializes_type_tag() {
        let event = Event::new(EventType::DiceRoll).with_actor("player1");
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], json!("dice_roll"));
        assert_eq!(value["actor_id"], json!("player1"));
    }

    #[test]
    fn diff_deserializes_without_previous_value() {
        let diff: StateDiff =
            serde_json::from_value(json!({"path": "counter", "operation": "add", "value": 3}))
                .unwrap();
        assert_eq!(diff.operation, Operation::Add);
        assert!(diff.previous_value.is_none());
    }

    #[test]
    fn diff_rejects_unknown_operation_on_the_wire() {
        let result: Result<StateDiff, _> =
            serde_json::from_value(json!({"path": "counter", "operation": "pow", "value": 3}));
        assert!(result.is_err());
    }

    #[test]
    fn fresh_ids_are_unique() {
        let a = Event::new(EventType::Action);
        let b = Event::new(EventType::Action);
        assert_ne!(a.id, b.id);
        assert!(!a.id.is_empty());
        assert!(EventId::default().is_empty());
    }
}
