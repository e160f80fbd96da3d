use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{TwError, TwResult};
use crate::event::StateDiff;
use crate::path;

/// The role a character plays at the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharacterType {
    /// A player character.
    Player,
    /// A non-player character.
    Npc,
    /// The game master.
    Gm,
}

impl fmt::Display for CharacterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Player => write!(f, "player"),
            Self::Npc => write!(f, "npc"),
            Self::Gm => write!(f, "gm"),
        }
    }
}

/// Who is at the controls of a character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlType {
    /// A human at the table.
    Human,
    /// An AI agent.
    Ai,
}

impl fmt::Display for ControlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Human => write!(f, "human"),
            Self::Ai => write!(f, "ai"),
        }
    }
}

/// A participant in the session.
///
/// `attributes` and `state` are open-ended so any rule system can store its
/// own stats; diffs addressed at `characters.<id>.<path>` land here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    /// Unique character identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Player, NPC, or GM.
    #[serde(rename = "type")]
    pub character_type: CharacterType,
    /// Human or AI control.
    pub control: ControlType,
    /// Rule-system stats and skills.
    #[serde(default)]
    pub attributes: Map<String, Value>,
    /// Mutable condition such as hit points or sanity.
    #[serde(default)]
    pub state: Map<String, Value>,
    /// Items carried.
    #[serde(default)]
    pub inventory: Vec<String>,
    /// Short description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Backstory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    /// Agent settings for AI-controlled characters, carried opaquely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_config: Option<Value>,
    /// Free-form annotations.
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Character {
    /// Create a character with empty attributes and state.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        character_type: CharacterType,
        control: ControlType,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            character_type,
            control,
            attributes: Map::new(),
            state: Map::new(),
            inventory: Vec::new(),
            description: None,
            background: None,
            ai_config: None,
            metadata: Map::new(),
        }
    }

    /// Set an entry in the character's state.
    pub fn with_state(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.state.insert(key.into(), value.into());
        self
    }

    /// Set an attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// True if an AI agent controls this character.
    pub fn is_ai(&self) -> bool {
        self.control == ControlType::Ai
    }

    /// Apply a diff at `local_path` (relative to the record) to a copy of
    /// this character and return the copy with the previous value.
    ///
    /// The record is round-tripped through its JSON form, so a diff can
    /// reach any field, and a diff that breaks the record's shape fails
    /// instead of producing a half-valid character.
    pub fn patched(
        &self,
        local_path: &str,
        diff: &StateDiff,
    ) -> TwResult<(Character, Option<Value>)> {
        let invalid = |reason: String| TwError::InvalidCharacter {
            id: self.id.clone(),
            reason,
        };
        let mut record = match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            Ok(_) => return Err(invalid("record is not an object".to_string())),
            Err(e) => return Err(invalid(e.to_string())),
        };
        let previous = path::apply(&mut record, local_path, diff.operation, &diff.value)?;
        let updated: Character =
            serde_json::from_value(Value::Object(record)).map_err(|e| invalid(e.to_string()))?;
        Ok((updated, previous))
    }
}
