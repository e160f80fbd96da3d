pub mod check;
pub mod history;
pub mod play;
pub mod replay;

use std::fs;
use std::path::Path;

use tw_core::{GameConfig, GameSession};

/// Load and validate a configuration file.
fn load_config(path: &Path) -> Result<GameConfig, String> {
    GameConfig::from_path(path).map_err(|e| format!("{}: {e}", path.display()))
}

/// Read a saved session file.
fn load_session(path: &Path) -> Result<GameSession, String> {
    let contents =
        fs::read_to_string(path).map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    GameSession::from_json_str(&contents).map_err(|e| format!("{}: {e}", path.display()))
}

/// Write a session file as pretty-printed JSON.
fn save_session(path: &Path, session: &GameSession) -> Result<(), String> {
    let json = session.to_json_string().map_err(|e| e.to_string())?;
    fs::write(path, json).map_err(|e| format!("cannot write {}: {e}", path.display()))
}

/// Shorten text to at most `max` characters for table cells.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let cut: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}
