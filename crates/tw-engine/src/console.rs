//! Line-oriented command console over a [`GameEngine`].
//!
//! Each input line is one command; the reply is plain text ready to print.
//! Saving and quitting are left to the host, which owns the terminal and
//! the file system.

use serde_json::{Map, Value};

use tw_core::path::get_path;
use tw_core::{EventId, GameState, Operation};

use crate::dice::{DiceRoll, Difficulty};
use crate::engine::GameEngine;
use crate::error::{EngineError, EngineResult};

const DEFAULT_HISTORY: usize = 10;

const HELP: &str = "\
Commands:
  say <actor> <text>            post a message
  act <actor> <action> [json]   record an action with an optional JSON payload
  update <path> <op> <value>    change state (ops: set add subtract multiply append remove delete)
  roll <dice> [target [hard|extreme]]
                                roll dice, optionally as a percentile check
  turn <actor> [number]         start a turn
  end                           end the current turn
  end game [reason]             end the game
  state [path]                  show state, or the value at a path
  history [count]               list recent events
  rollback <event-id>           drop every event after the given one
  redraw <actor>                discard the actor's last message and what followed
  help                          show this help
  quit                          leave the session";

/// Parse a value argument as JSON, falling back to a plain string.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn usage(text: &str) -> EngineError {
    EngineError::InvalidCommand(format!("usage: {text}"))
}

fn split_word(input: &str) -> (&str, &str) {
    match input.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (input, ""),
    }
}

impl GameEngine {
    /// Run one console command and return the text to show.
    pub fn process(&mut self, input: &str) -> EngineResult<String> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(String::new());
        }
        let (command, rest) = split_word(trimmed);

        match command.to_lowercase().as_str() {
            "say" => self.do_say(rest),
            "act" => self.do_act(rest),
            "update" => self.do_update(rest),
            "roll" => self.do_roll(rest),
            "turn" => self.do_turn(rest),
            "end" => self.do_end(rest),
            "state" => self.do_state(rest),
            "history" => self.do_history(rest),
            "rollback" => self.do_rollback(rest),
            "redraw" => self.do_redraw(rest),
            "help" => Ok(HELP.to_string()),
            "quit" | "q" => Ok("Goodbye!".to_string()),
            other => Err(EngineError::UnknownCommand(other.to_string())),
        }
    }

    fn do_say(&mut self, rest: &str) -> EngineResult<String> {
        let (actor, text) = split_word(rest);
        if actor.is_empty() || text.is_empty() {
            return Err(usage("say <actor> <text>"));
        }
        let state = self.add_message(actor, text, "text", Map::new())?;
        Ok(format!("[{}] {actor}: {text}", state.messages.len()))
    }

    fn do_act(&mut self, rest: &str) -> EngineResult<String> {
        let (actor, rest) = split_word(rest);
        let (action, payload) = split_word(rest);
        if actor.is_empty() || action.is_empty() {
            return Err(usage("act <actor> <action> [json]"));
        }
        let data = match payload {
            "" => Map::new(),
            raw => match serde_json::from_str::<Value>(raw)? {
                Value::Object(map) => map,
                _ => return Err(usage("act <actor> <action> [json object]")),
            },
        };
        self.perform_action(actor, action, data, Vec::new())?;
        Ok(format!("{actor} performs {action}."))
    }

    fn do_update(&mut self, rest: &str) -> EngineResult<String> {
        let (path, rest) = split_word(rest);
        let (operation, raw) = split_word(rest);
        if path.is_empty() || operation.is_empty() {
            return Err(usage("update <path> <op> <value>"));
        }
        let operation: Operation = operation.parse()?;
        if raw.is_empty() && operation != Operation::Delete {
            return Err(usage("update <path> <op> <value>"));
        }
        let value = if raw.is_empty() {
            Value::Null
        } else {
            parse_value(raw)
        };
        let state = self.update_state(None, path, operation, value)?;
        let now = state_value(state, path)?;
        Ok(match now {
            Some(value) => format!("{path} = {value}"),
            None => format!("{path} removed"),
        })
    }

    fn do_roll(&mut self, rest: &str) -> EngineResult<String> {
        let mut words = rest.split_whitespace();
        let Some(notation) = words.next() else {
            return Err(usage("roll <dice> [target [hard|extreme]]"));
        };
        let mut request = DiceRoll::new(notation);
        if let Some(target) = words.next() {
            let target: i64 = target
                .parse()
                .map_err(|_| usage("roll <dice> [target [hard|extreme]]"))?;
            let difficulty = match words.next() {
                Some(word) => word.parse()?,
                None => Difficulty::Regular,
            };
            request = request.against(target, difficulty);
        }
        if let Some(actor) = self.state()?.current_actor.clone() {
            request = request.by(actor);
        }
        let (result, _) = self.roll_dice(&request)?;
        Ok(result.to_string())
    }

    fn do_turn(&mut self, rest: &str) -> EngineResult<String> {
        let (actor, number) = split_word(rest);
        if actor.is_empty() {
            return Err(usage("turn <actor> [number]"));
        }
        let number = match number {
            "" => None,
            raw => Some(
                raw.parse::<u64>()
                    .map_err(|_| usage("turn <actor> [number]"))?,
            ),
        };
        let state = self.start_turn(actor, number)?;
        Ok(format!("--- Turn {} ({actor}) ---", state.current_turn))
    }

    fn do_end(&mut self, rest: &str) -> EngineResult<String> {
        let (what, reason) = split_word(rest);
        match what.to_lowercase().as_str() {
            "game" => {
                let reason = (!reason.is_empty()).then_some(reason);
                self.end_game(reason)?;
                Ok("The game has ended.".to_string())
            }
            "" | "turn" => {
                let Some(actor) = self.state()?.current_actor.clone() else {
                    return Err(EngineError::InvalidCommand(
                        "no turn in progress".to_string(),
                    ));
                };
                self.end_turn(&actor)?;
                Ok(format!("{actor} ends the turn."))
            }
            _ => Err(usage("end [turn] | end game [reason]")),
        }
    }

    fn do_state(&mut self, path: &str) -> EngineResult<String> {
        let state = self.state()?;
        if path.is_empty() {
            return Ok(serde_json::to_string_pretty(state)?);
        }
        Ok(match state_value(state, path)? {
            Some(value) => serde_json::to_string_pretty(&value)?,
            None => format!("{path} is not set"),
        })
    }

    fn do_history(&mut self, rest: &str) -> EngineResult<String> {
        let count = match rest {
            "" => DEFAULT_HISTORY,
            raw => raw.parse().map_err(|_| usage("history [count]"))?,
        };
        let events = self.events();
        let start = events.len().saturating_sub(count);
        let lines: Vec<String> = events[start..]
            .iter()
            .enumerate()
            .map(|(offset, event)| {
                format!(
                    "{:>4}  {}  {:<15} {}",
                    start + offset,
                    event.id,
                    event.event_type.as_str(),
                    event.actor_id.as_deref().unwrap_or("-"),
                )
            })
            .collect();
        Ok(format!(
            "Events ({} total, showing last {}):\n{}",
            events.len(),
            lines.len(),
            lines.join("\n")
        ))
    }

    fn do_rollback(&mut self, rest: &str) -> EngineResult<String> {
        if rest.is_empty() {
            return Err(usage("rollback <event-id>"));
        }
        self.rollback_to(&EventId::from(rest))?;
        Ok(format!(
            "Rolled back to {rest}; {} events remain.",
            self.events().len()
        ))
    }

    fn do_redraw(&mut self, actor: &str) -> EngineResult<String> {
        if actor.is_empty() {
            return Err(usage("redraw <actor>"));
        }
        self.redraw_last_message(actor)?;
        Ok(format!(
            "Discarded {actor}'s last message; {} events remain.",
            self.events().len()
        ))
    }
}

/// Read a diff-style path from a derived state: `characters.<id>.<field>`
/// reaches into character records, anything else into the global tree.
fn state_value(state: &GameState, path: &str) -> EngineResult<Option<Value>> {
    let mut root = state.state.clone();
    root.insert(
        "characters".to_string(),
        serde_json::to_value(&state.characters)?,
    );
    Ok(get_path(&root, path)?.cloned())
}
