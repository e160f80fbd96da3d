//! Configuration for a game engine.

/// Runtime settings for a [`GameEngine`](crate::GameEngine).
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    /// RNG seed for reproducible dice. Seeded from the OS when `None`.
    pub seed: Option<u64>,
    /// Session identifier. A fresh UUID is used when `None`.
    pub session_id: Option<String>,
}

impl EngineConfig {
    /// Set the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the session ID.
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }
}
