//! Replay: fold an event log over the configured initial state.
//!
//! Replay is pure. It never reads the clock, draws random numbers or
//! touches I/O, and it starts from fresh copies of the configuration on
//! every call, so the same log always yields the same [`GameState`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::config::GameConfig;
use crate::error::{TwError, TwResult};
use crate::event::{Event, EventId, EventType, Operation, StateDiff};
use crate::path;
use crate::state::GameState;

const CHARACTER_TABLE: &str = "characters";
const CHARACTER_PREFIX: &str = "characters.";

/// One diff as it was applied during replay, with the value it replaced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedDiff {
    /// Event the diff belongs to.
    pub event_id: EventId,
    /// Path the diff addressed.
    pub path: String,
    /// Operation applied.
    pub operation: Operation,
    /// Value at the path before the diff; `None` if absent or skipped.
    pub previous_value: Option<Value>,
}

/// Derive the state at the end of `events`.
pub fn derive_state(session_id: &str, config: &GameConfig, events: &[Event]) -> TwResult<GameState> {
    let mut state = GameState::initial(session_id, config);
    for event in events {
        apply_event(&mut state, event)?;
    }
    Ok(state)
}

/// Replay `events` and report every applied diff with its previous value.
pub fn trace(session_id: &str, config: &GameConfig, events: &[Event]) -> TwResult<Vec<AppliedDiff>> {
    let mut state = GameState::initial(session_id, config);
    let mut applied = Vec::new();
    for event in events {
        let previous = apply_event(&mut state, event)?;
        applied.extend(
            event
                .state_diffs
                .iter()
                .zip(previous)
                .map(|(diff, previous_value)| AppliedDiff {
                    event_id: event.id.clone(),
                    path: diff.path.clone(),
                    operation: diff.operation,
                    previous_value,
                }),
        );
    }
    Ok(applied)
}

/// Fold one event into `state`, returning the previous value for each of
/// its diffs in order.
pub fn apply_event(state: &mut GameState, event: &Event) -> TwResult<Vec<Option<Value>>> {
    let previous = event
        .state_diffs
        .iter()
        .map(|diff| apply_diff(state, diff))
        .collect::<TwResult<Vec<_>>>()?;

    match event.event_type {
        EventType::Message => state.messages.push(event.data.clone()),
        EventType::TurnStart => {
            if let Some(turn) = event.data.get("turn_number").and_then(Value::as_u64) {
                state.current_turn = turn;
            }
            if let Some(actor) = event.data.get("actor_id").and_then(Value::as_str) {
                state.current_actor = Some(actor.to_string());
            }
            if let Some(phase) = event.data.get("phase").and_then(Value::as_str) {
                state.current_phase = Some(phase.to_string());
            }
        }
        _ => {}
    }

    state.created_at.get_or_insert(event.timestamp);
    state.updated_at = Some(event.timestamp);
    Ok(previous)
}

/// Apply one diff, routing `characters.<id>.<field>` paths to the character
/// record and everything else to the global state tree.
pub fn apply_diff(state: &mut GameState, diff: &StateDiff) -> TwResult<Option<Value>> {
    let Some(rest) = diff.path.strip_prefix(CHARACTER_PREFIX) else {
        if diff.path == CHARACTER_TABLE {
            return Err(TwError::invalid_path(
                &diff.path,
                "the character table cannot be replaced wholesale",
            ));
        }
        return path::apply_diff(&mut state.state, diff);
    };
    let Some((character_id, local_path)) = rest.split_once('.') else {
        return Err(TwError::invalid_path(
            &diff.path,
            "a character path needs a field after the character id",
        ));
    };
    if character_id.is_empty() {
        return Err(TwError::invalid_path(&diff.path, "character id is empty"));
    }

    let Some(character) = state.characters.get(character_id) else {
        warn!(
            path = %diff.path,
            character = character_id,
            "diff targets unknown character, skipping"
        );
        return Ok(None);
    };
    let (updated, previous) = character.patched(local_path, diff)?;
    state.characters.insert(character_id.to_string(), updated);
    Ok(previous)
}
