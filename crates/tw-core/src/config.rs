//! Game configuration: the static half of a session.
//!
//! A [`GameConfig`] names the rule system, declares the starting characters
//! and the initial state tree, and carries the settings used by the agent
//! and workflow layers. It is loaded from YAML or JSON and never changes
//! during a session; everything dynamic is derived from the event log.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::character::Character;

/// Errors that can occur when loading or validating a configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read or write the configuration file.
    #[error("failed to access config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse JSON content.
    #[error("failed to parse config JSON: {source}")]
    Json {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML error.
        source: serde_yml::Error,
    },

    /// The file extension is neither YAML nor JSON.
    #[error("unsupported config format: {0}")]
    UnsupportedFormat(String),

    /// The configuration parsed but is not usable.
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Serialization format of a configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// YAML (`.yaml` / `.yml`).
    Yaml,
    /// JSON (`.json`).
    Json,
}

impl ConfigFormat {
    /// Pick the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Ok(Self::Yaml),
            Some("json") => Ok(Self::Json),
            Some(other) => Err(ConfigError::UnsupportedFormat(format!(".{other}"))),
            None => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Static configuration of a game session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Campaign name.
    pub name: String,
    /// Rule system tag, e.g. `coc7e` or `dnd5e`.
    pub rule_system: String,
    /// Campaign description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Starting characters keyed by ID.
    #[serde(default)]
    pub characters: BTreeMap<String, Character>,
    /// Initial global state tree.
    #[serde(default)]
    pub initial_state: Map<String, Value>,
    /// Model and prompt settings for the agent layer.
    #[serde(default)]
    pub llm_config: Map<String, Value>,
    /// Turn order and phase settings.
    #[serde(default)]
    pub workflow: Map<String, Value>,
    /// Auto-progression settings.
    #[serde(default)]
    pub auto_progression: Map<String, Value>,
    /// Named hook scripts.
    #[serde(default)]
    pub scripts: BTreeMap<String, String>,
    /// Tool definitions exposed to agents.
    #[serde(default)]
    pub tools: Vec<Value>,
    /// Connection profiles for multiple model providers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_profiles: Option<Vec<Value>>,
}

impl GameConfig {
    /// Create a configuration with no characters and an empty state tree.
    pub fn new(name: impl Into<String>, rule_system: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rule_system: rule_system.into(),
            description: None,
            characters: BTreeMap::new(),
            initial_state: Map::new(),
            llm_config: Map::new(),
            workflow: Map::new(),
            auto_progression: Map::new(),
            scripts: BTreeMap::new(),
            tools: Vec::new(),
            llm_profiles: None,
        }
    }

    /// Add a starting character, keyed by its ID.
    pub fn with_character(mut self, character: Character) -> Self {
        self.characters.insert(character.id.clone(), character);
        self
    }

    /// Set a key in the initial state tree.
    pub fn with_state(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.initial_state.insert(key.into(), value.into());
        self
    }

    /// Load and validate a configuration file, choosing the format by extension.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let format = ConfigFormat::from_path(path)?;
        let contents = std::fs::read_to_string(path)?;
        match format {
            ConfigFormat::Yaml => Self::from_yaml_str(&contents),
            ConfigFormat::Json => Self::from_json_str(&contents),
        }
    }

    /// Parse and validate a YAML configuration.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the configuration, choosing the format by extension.
    pub fn to_path(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = match ConfigFormat::from_path(path)? {
            ConfigFormat::Yaml => serde_yml::to_string(self)?,
            ConfigFormat::Json => serde_json::to_string_pretty(self)?,
        };
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Check invariants that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Invalid("name must not be empty".to_string()));
        }
        for (key, character) in &self.characters {
            if character.id != *key {
                return Err(ConfigError::Invalid(format!(
                    "character \"{key}\" declares id \"{}\"",
                    character.id
                )));
            }
        }
        Ok(())
    }
}
