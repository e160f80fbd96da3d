use std::path::Path;

use comfy_table::{ContentArrangement, Table};
use serde_json::Value;

use tw_core::{Event, EventType};

pub fn run(path: &Path, event_type: Option<&str>, actor: Option<&str>) -> Result<(), String> {
    let session = super::load_session(path)?;
    let event_type = event_type
        .map(str::parse::<EventType>)
        .transpose()
        .map_err(|e| e.to_string())?;

    let events: Vec<(usize, &Event)> = session
        .event_history
        .iter()
        .enumerate()
        .filter(|(_, e)| event_type.is_none_or(|t| e.event_type == t))
        .filter(|(_, e)| actor.is_none_or(|a| e.is_from(a)))
        .collect();

    if events.is_empty() {
        println!("  No events found.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["#", "Time", "Type", "Actor", "Summary"]);
    for (index, event) in &events {
        table.add_row(vec![
            index.to_string(),
            event.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            event.event_type.to_string(),
            event.actor_id.clone().unwrap_or_else(|| "-".to_string()),
            super::truncate(&summary(event), 60),
        ]);
    }

    println!("{table}");
    println!();
    println!(
        "  {} of {} events",
        events.len(),
        session.event_history.len()
    );
    Ok(())
}

fn text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

/// One-line description of an event for the history table.
fn summary(event: &Event) -> String {
    let data = &event.data;
    match event.event_type {
        EventType::Message => text(data.get("content")),
        EventType::DiceRoll => {
            let result = data.get("result");
            format!(
                "{} = {}",
                text(result.and_then(|r| r.get("notation"))),
                text(result.and_then(|r| r.get("final_result")))
            )
        }
        EventType::TurnStart => format!("turn {}", text(data.get("turn_number"))),
        EventType::Action => text(data.get("action_type")),
        EventType::GameStart => text(data.get("config_name")),
        _ if !event.state_diffs.is_empty() => event
            .state_diffs
            .iter()
            .map(|d| format!("{} {} {}", d.path, d.operation, d.value))
            .collect::<Vec<_>>()
            .join("; "),
        _ => String::new(),
    }
}
