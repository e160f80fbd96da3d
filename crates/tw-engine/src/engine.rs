//! Game engine: the recording surface over a session's state machine.
//!
//! Every method that changes the game appends exactly one event and
//! returns the state derived from the new log. Dice are rolled here, at
//! record time, and the outcome is stored in the event so replay never
//! needs the RNG.

use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::{Map, Value, json};
use tracing::{debug, info};

use tw_core::{
    Event, EventId, EventType, GameConfig, GameSession, GameState, Operation, StateDiff,
    StateMachine,
};

use crate::config::EngineConfig;
use crate::dice::{DiceResult, DiceRoll};
use crate::error::EngineResult;

/// A running game session.
#[derive(Debug)]
pub struct GameEngine {
    machine: StateMachine,
    rng: StdRng,
}

fn rng_for(config: &EngineConfig) -> StdRng {
    match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

impl GameEngine {
    /// Start a new session and record its `game_start` event.
    pub fn new(config: GameConfig, engine_config: EngineConfig) -> EngineResult<Self> {
        let session_id = engine_config
            .session_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let data = object(json!({ "config_name": config.name }));
        info!(session = %session_id, config = %config.name, "starting session");

        let mut engine = Self {
            machine: StateMachine::new(session_id, config),
            rng: rng_for(&engine_config),
        };
        engine.record(EventType::GameStart, None, data, Vec::new())?;
        Ok(engine)
    }

    /// Resume a saved session. Nothing is recorded.
    pub fn restore(session: GameSession, engine_config: EngineConfig) -> EngineResult<Self> {
        Ok(Self {
            machine: StateMachine::restore(session)?,
            rng: rng_for(&engine_config),
        })
    }

    /// The session identifier.
    pub fn session_id(&self) -> &str {
        self.machine.session_id()
    }

    /// The session configuration.
    pub fn config(&self) -> &GameConfig {
        self.machine.config()
    }

    /// The underlying state machine.
    pub fn machine(&self) -> &StateMachine {
        &self.machine
    }

    /// The current derived state.
    pub fn state(&mut self) -> EngineResult<&GameState> {
        Ok(self.machine.current_state()?)
    }

    /// Snapshot the session for saving.
    pub fn session(&self) -> EngineResult<GameSession> {
        Ok(self.machine.session()?)
    }

    fn record(
        &mut self,
        event_type: EventType,
        actor_id: Option<&str>,
        data: Map<String, Value>,
        state_diffs: Vec<StateDiff>,
    ) -> EngineResult<&GameState> {
        let event = self
            .machine
            .create_event(event_type, actor_id, data, state_diffs);
        Ok(self.machine.add_event(event)?)
    }

    // -----------------------------------------------------------------------
    // Recording
    // -----------------------------------------------------------------------

    /// Record an action. `action_type` is stored in the payload unless the
    /// payload already names one.
    pub fn perform_action(
        &mut self,
        actor_id: &str,
        action_type: &str,
        mut data: Map<String, Value>,
        state_diffs: Vec<StateDiff>,
    ) -> EngineResult<&GameState> {
        data.entry("action_type")
            .or_insert_with(|| Value::String(action_type.to_string()));
        self.record(EventType::Action, Some(actor_id), data, state_diffs)
    }

    /// Roll dice and record the request and the outcome.
    pub fn roll_dice(&mut self, request: &DiceRoll) -> EngineResult<(DiceResult, &GameState)> {
        let result = request.roll(&mut self.rng)?;
        debug!(notation = %request.notation, result = result.final_result, "rolled dice");
        let data = object(json!({ "roll": request, "result": result }));
        let state = self.record(
            EventType::DiceRoll,
            request.character_id.as_deref(),
            data,
            Vec::new(),
        )?;
        Ok((result, state))
    }

    /// Apply a single diff, recorded as a `state_update` event.
    pub fn update_state(
        &mut self,
        actor_id: Option<&str>,
        path: &str,
        operation: Operation,
        value: Value,
    ) -> EngineResult<&GameState> {
        let data = object(json!({
            "path": path,
            "operation": operation,
            "value": value,
        }));
        let diff = StateDiff::new(path, operation, value);
        self.record(EventType::StateUpdate, actor_id, data, vec![diff])
    }

    /// Post a message to the table.
    pub fn add_message(
        &mut self,
        sender_id: &str,
        content: &str,
        message_type: &str,
        metadata: Map<String, Value>,
    ) -> EngineResult<&GameState> {
        let data = object(json!({
            "sender_id": sender_id,
            "content": content,
            "type": message_type,
            "timestamp": Utc::now().to_rfc3339(),
            "metadata": metadata,
        }));
        self.record(EventType::Message, Some(sender_id), data, Vec::new())
    }

    /// Start a turn for `actor_id`. Without an explicit number the turn
    /// after the current one is started.
    pub fn start_turn(
        &mut self,
        actor_id: &str,
        turn_number: Option<u64>,
    ) -> EngineResult<&GameState> {
        let turn_number = match turn_number {
            Some(n) => n,
            None => self.machine.current_state()?.current_turn + 1,
        };
        let data = object(json!({ "turn_number": turn_number, "actor_id": actor_id }));
        self.record(EventType::TurnStart, Some(actor_id), data, Vec::new())
    }

    /// End `actor_id`'s turn.
    pub fn end_turn(&mut self, actor_id: &str) -> EngineResult<&GameState> {
        let data = object(json!({ "actor_id": actor_id }));
        self.record(EventType::TurnEnd, Some(actor_id), data, Vec::new())
    }

    /// Record the end of the game.
    pub fn end_game(&mut self, reason: Option<&str>) -> EngineResult<&GameState> {
        let data = match reason {
            Some(reason) => object(json!({ "reason": reason })),
            None => Map::new(),
        };
        info!(session = %self.session_id(), "game ended");
        self.record(EventType::GameEnd, None, data, Vec::new())
    }

    // -----------------------------------------------------------------------
    // History
    // -----------------------------------------------------------------------

    /// Drop every event after `id`.
    pub fn rollback_to(&mut self, id: &EventId) -> EngineResult<&GameState> {
        Ok(self.machine.rollback_to(id)?)
    }

    /// Drop every event stamped after `timestamp`.
    pub fn rollback_to_timestamp(&mut self, timestamp: DateTime<Utc>) -> EngineResult<&GameState> {
        Ok(self.machine.rollback_to_timestamp(timestamp)?)
    }

    /// Rewrite an event's payload and/or diffs.
    pub fn edit_event(
        &mut self,
        id: &EventId,
        new_data: Option<Map<String, Value>>,
        new_diffs: Option<Vec<StateDiff>>,
    ) -> EngineResult<&GameState> {
        Ok(self.machine.edit_event(id, new_data, new_diffs)?)
    }

    /// Discard `actor_id`'s latest message and everything after it.
    pub fn redraw_last_message(&mut self, actor_id: &str) -> EngineResult<&GameState> {
        Ok(self.machine.redraw_last_message(actor_id)?)
    }

    /// Look up an event by ID.
    pub fn get_event_by_id(&self, id: &EventId) -> EngineResult<&Event> {
        Ok(self.machine.get_event_by_id(id)?)
    }

    /// Events of the given type.
    pub fn find_events_by_type(&self, event_type: EventType) -> Vec<&Event> {
        self.machine.find_events_by_type(event_type)
    }

    /// Events caused by the given actor.
    pub fn find_events_by_actor(&self, actor_id: &str) -> Vec<&Event> {
        self.machine.find_events_by_actor(actor_id)
    }

    /// The full event history.
    pub fn events(&self) -> &[Event] {
        self.machine.events()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::Difficulty;
    use tw_core::{Character, CharacterType, ControlType};

    fn config() -> GameConfig {
        GameConfig::new("Haunting", "coc7e")
            .with_state("clues", json!([]))
            .with_character(
                Character::new("player1", "Hero", CharacterType::Player, ControlType::Human)
                    .with_state("hp", 12),
            )
    }

    fn engine() -> GameEngine {
        GameEngine::new(config(), EngineConfig::default().with_seed(42)).unwrap()
    }

    #[test]
    fn new_records_game_start() {
        let e = engine();
        assert_eq!(e.events().len(), 1);
        assert_eq!(e.events()[0].event_type, EventType::GameStart);
        assert_eq!(e.events()[0].data["config_name"], json!("Haunting"));
    }

    #[test]
    fn session_id_from_config() {
        let e = GameEngine::new(config(), EngineConfig::default().with_session_id("t1")).unwrap();
        assert_eq!(e.session_id(), "t1");
    }

    #[test]
    fn action_keeps_explicit_type() {
        let mut e = engine();
        let data = object(json!({ "action_type": "sneak", "target": "door" }));
        e.perform_action("player1", "move", data, vec![]).unwrap();
        let action = &e.find_events_by_type(EventType::Action)[0];
        assert_eq!(action.data["action_type"], json!("sneak"));
        assert_eq!(action.actor_id.as_deref(), Some("player1"));
    }

    #[test]
    fn update_state_records_diff() {
        let mut e = engine();
        let state = e
            .update_state(
                Some("gm"),
                "characters.player1.state.hp",
                Operation::Subtract,
                json!(3),
            )
            .unwrap();
        assert_eq!(state.characters["player1"].state["hp"], json!(9));
        let event = e.events().last().unwrap();
        assert_eq!(event.data["operation"], json!("subtract"));
        assert_eq!(event.state_diffs.len(), 1);
    }

    #[test]
    fn messages_and_turns() {
        let mut e = engine();
        e.add_message("gm", "Night falls.", "text", Map::new()).unwrap();
        e.start_turn("player1", None).unwrap();
        let state = e.start_turn("player1", None).unwrap();
        assert_eq!(state.current_turn, 2);
        let state = e.start_turn("gm", Some(10)).unwrap();
        assert_eq!(state.current_turn, 10);
        assert_eq!(state.current_actor.as_deref(), Some("gm"));
        assert_eq!(state.messages[0]["type"], json!("text"));
        e.end_turn("gm").unwrap();
        assert_eq!(e.find_events_by_type(EventType::TurnEnd).len(), 1);
    }

    #[test]
    fn roll_is_recorded() {
        let mut e = engine();
        let request = DiceRoll::new("1d100").by("player1").against(50, Difficulty::Regular);
        let (result, _) = e.roll_dice(&request).unwrap();
        let event = e.events().last().unwrap();
        assert_eq!(event.event_type, EventType::DiceRoll);
        assert_eq!(event.actor_id.as_deref(), Some("player1"));
        assert_eq!(event.data["result"]["final_result"], json!(result.final_result));
        assert_eq!(event.data["roll"]["notation"], json!("1d100"));
        assert!(result.success.is_some());
    }

    #[test]
    fn seeded_engines_roll_alike() {
        let request = DiceRoll::new("3d6");
        let (a, _) = engine().roll_dice(&request).unwrap();
        let (b, _) = engine().roll_dice(&request).unwrap();
        assert_eq!(a.rolls, b.rolls);
    }

    #[test]
    fn bad_notation_records_nothing() {
        let mut e = engine();
        assert!(e.roll_dice(&DiceRoll::new("lots")).is_err());
        assert_eq!(e.events().len(), 1);
    }

    #[test]
    fn redraw_and_restore() {
        let mut e = engine();
        e.add_message("gm", "First draft.", "text", Map::new()).unwrap();
        let state = e.redraw_last_message("gm").unwrap();
        assert!(state.messages.is_empty());
        e.add_message("gm", "Second draft.", "text", Map::new()).unwrap();
        e.end_game(Some("done")).unwrap();

        let session = e.session().unwrap();
        let mut restored = GameEngine::restore(session, EngineConfig::default()).unwrap();
        assert_eq!(restored.events().len(), 3);
        assert_eq!(
            restored.state().unwrap().messages[0]["content"],
            json!("Second draft.")
        );
    }

    #[test]
    fn rollback_before_start_keeps_game_start() {
        let mut e = engine();
        e.add_message("gm", "Too early.", "text", Map::new()).unwrap();
        let start = e.events()[0].timestamp;
        let state = e
            .rollback_to_timestamp(start - chrono::Duration::seconds(10))
            .unwrap();
        assert!(state.messages.is_empty());
        assert_eq!(e.events().len(), 1);
        assert_eq!(e.events()[0].event_type, EventType::GameStart);
    }
}
