//! Session registry for hosts that run several tables at once.

use std::collections::BTreeMap;

use crate::engine::GameEngine;
use crate::error::{EngineError, EngineResult};

/// Where a host keeps its running sessions, keyed by session ID.
///
/// The store owns each engine outright; callers borrow one at a time.
pub trait SessionStore {
    /// Borrow a session.
    fn get(&self, session_id: &str) -> Option<&GameEngine>;

    /// Borrow a session mutably.
    fn get_mut(&mut self, session_id: &str) -> Option<&mut GameEngine>;

    /// Register a session under its own ID, returning any session it replaced.
    fn insert(&mut self, engine: GameEngine) -> Option<GameEngine>;

    /// Remove a session.
    fn remove(&mut self, session_id: &str) -> Option<GameEngine>;

    /// IDs of all registered sessions.
    fn ids(&self) -> Vec<String>;

    /// Borrow a session or fail with [`EngineError::SessionNotFound`].
    fn require(&self, session_id: &str) -> EngineResult<&GameEngine> {
        self.get(session_id)
            .ok_or_else(|| EngineError::SessionNotFound(session_id.to_string()))
    }

    /// Borrow a session mutably or fail with [`EngineError::SessionNotFound`].
    fn require_mut(&mut self, session_id: &str) -> EngineResult<&mut GameEngine> {
        self.get_mut(session_id)
            .ok_or_else(|| EngineError::SessionNotFound(session_id.to_string()))
    }
}

/// A [`SessionStore`] that lives for as long as the process.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: BTreeMap<String, GameEngine>,
}

impl InMemorySessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no session is registered.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, session_id: &str) -> Option<&GameEngine> {
        self.sessions.get(session_id)
    }

    fn get_mut(&mut self, session_id: &str) -> Option<&mut GameEngine> {
        self.sessions.get_mut(session_id)
    }

    fn insert(&mut self, engine: GameEngine) -> Option<GameEngine> {
        self.sessions.insert(engine.session_id().to_string(), engine)
    }

    fn remove(&mut self, session_id: &str) -> Option<GameEngine> {
        self.sessions.remove(session_id)
    }

    fn ids(&self) -> Vec<String> {
        self.sessions.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use tw_core::GameConfig;

    fn engine(id: &str) -> GameEngine {
        GameEngine::new(
            GameConfig::new("Test", "generic"),
            EngineConfig::default().with_seed(1).with_session_id(id),
        )
        .unwrap()
    }

    #[test]
    fn insert_and_lookup() {
        let mut store = InMemorySessionStore::new();
        assert!(store.insert(engine("b")).is_none());
        assert!(store.insert(engine("a")).is_none());
        assert_eq!(store.ids(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(store.require("a").unwrap().session_id(), "a");
    }

    #[test]
    fn insert_replaces_same_id() {
        let mut store = InMemorySessionStore::new();
        store.insert(engine("a"));
        assert!(store.insert(engine("a")).is_some());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn missing_session() {
        let mut store = InMemorySessionStore::new();
        assert!(matches!(
            store.require_mut("ghost"),
            Err(EngineError::SessionNotFound(id)) if id == "ghost"
        ));
    }

    #[test]
    fn mutate_through_store() {
        let mut store = InMemorySessionStore::new();
        store.insert(engine("a"));
        store
            .require_mut("a")
            .unwrap()
            .end_turn("player1")
            .unwrap();
        assert_eq!(store.get("a").unwrap().events().len(), 2);
        assert!(store.remove("a").is_some());
        assert!(store.is_empty());
    }
}
