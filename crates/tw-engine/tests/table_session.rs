//! A full table session driven through the engine's public surface.

use serde_json::{Map, json};
use tw_core::{
    Character, CharacterType, ControlType, EventType, GameConfig, GameSession, Operation,
    StateDiff,
};
use tw_engine::{
    DiceRoll, Difficulty, EngineConfig, EngineError, GameEngine, InMemorySessionStore,
    SessionStore,
};

fn haunting() -> GameConfig {
    GameConfig::new("The Haunting", "coc7e")
        .with_state("clues", json!([]))
        .with_character(
            Character::new("player1", "Thomas", CharacterType::Player, ControlType::Human)
                .with_state("hp", 11)
                .with_state("sanity", 55)
                .with_attribute("spot_hidden", 60),
        )
        .with_character(Character::new(
            "gm",
            "Keeper",
            CharacterType::Gm,
            ControlType::Ai,
        ))
}

fn seeded() -> EngineConfig {
    EngineConfig::default().with_seed(2024).with_session_id("haunting")
}

#[test]
fn investigation_round() {
    let mut engine = GameEngine::new(haunting(), seeded()).unwrap();
    engine
        .add_message("gm", "The Corbitt house looms ahead.", "narration", Map::new())
        .unwrap();
    engine.start_turn("player1", None).unwrap();
    let (result, _) = engine
        .roll_dice(
            &DiceRoll::new("1d100")
                .by("player1")
                .with_reason("Spot Hidden")
                .against(60, Difficulty::Regular),
        )
        .unwrap();
    assert!((1..=100).contains(&result.final_result));

    engine
        .update_state(Some("gm"), "clues", Operation::Append, json!("diary"))
        .unwrap();
    engine
        .perform_action(
            "player1",
            "read",
            Map::new(),
            vec![StateDiff::new(
                "characters.player1.state.sanity",
                Operation::Subtract,
                3,
            )],
        )
        .unwrap();
    let state = engine.end_turn("player1").unwrap();

    assert_eq!(state.current_turn, 1);
    assert_eq!(state.state["clues"], json!(["diary"]));
    assert_eq!(state.characters["player1"].state["sanity"], json!(52));
    assert_eq!(state.messages.len(), 1);
    assert_eq!(engine.events().len(), 7);
    assert_eq!(engine.find_events_by_actor("player1").len(), 4);
}

#[test]
fn retcon_and_resume() {
    let mut engine = GameEngine::new(haunting(), seeded()).unwrap();
    engine
        .update_state(None, "characters.player1.state.hp", Operation::Subtract, json!(5))
        .unwrap();
    let wound = engine.events().last().unwrap().id.clone();
    engine
        .update_state(None, "characters.player1.state.hp", Operation::Add, json!(1))
        .unwrap();

    let state = engine
        .edit_event(
            &wound,
            None,
            Some(vec![StateDiff::new(
                "characters.player1.state.hp",
                Operation::Subtract,
                2,
            )]),
        )
        .unwrap();
    assert_eq!(state.characters["player1"].state["hp"], json!(10));

    let json = engine.session().unwrap().to_json_string().unwrap();
    let session = GameSession::from_json_str(&json).unwrap();
    let mut resumed = GameEngine::restore(session, EngineConfig::default()).unwrap();
    assert_eq!(resumed.session_id(), "haunting");
    assert_eq!(resumed.events().len(), 3);
    assert_eq!(
        resumed.state().unwrap().characters["player1"].state["hp"],
        json!(10)
    );
    assert_eq!(resumed.find_events_by_type(EventType::GameStart).len(), 1);
}

#[test]
fn rollback_through_console() {
    let mut engine = GameEngine::new(haunting(), seeded()).unwrap();
    let start = engine.events()[0].id.clone();
    engine.process("say gm Something scratches at the door.").unwrap();
    engine.process("update clues append \"scratches\"").unwrap();
    engine.process(&format!("rollback {start}")).unwrap();
    let state = engine.state().unwrap();
    assert!(state.messages.is_empty());
    assert_eq!(state.state["clues"], json!([]));
}

#[test]
fn store_holds_many_tables() {
    let mut store = InMemorySessionStore::new();
    for id in ["table-a", "table-b"] {
        let engine = GameEngine::new(
            haunting(),
            EngineConfig::default().with_seed(1).with_session_id(id),
        )
        .unwrap();
        store.insert(engine);
    }
    store
        .require_mut("table-b")
        .unwrap()
        .add_message("gm", "Only at table B.", "text", Map::new())
        .unwrap();

    assert_eq!(store.require("table-a").unwrap().events().len(), 1);
    assert_eq!(store.require("table-b").unwrap().events().len(), 2);
    assert!(matches!(
        store.require("table-c"),
        Err(EngineError::SessionNotFound(_))
    ));
}
