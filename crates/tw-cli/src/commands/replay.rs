use std::path::Path;

use chrono::{DateTime, Utc};
use comfy_table::{ContentArrangement, Table};

use tw_core::{EventId, StateMachine};

pub fn run(path: &Path, to: Option<&str>, at: Option<&str>, trace: bool) -> Result<(), String> {
    let session = super::load_session(path)?;
    let mut machine = StateMachine::restore(session).map_err(|e| e.to_string())?;

    if let Some(id) = to {
        machine
            .rollback_to(&EventId::from(id))
            .map_err(|e| e.to_string())?;
    }
    if let Some(at) = at {
        let cutoff = DateTime::parse_from_rfc3339(at)
            .map_err(|e| format!("invalid timestamp '{at}': {e}"))?
            .with_timezone(&Utc);
        machine
            .rollback_to_timestamp(cutoff)
            .map_err(|e| e.to_string())?;
    }

    if trace {
        return print_trace(&machine);
    }

    let state = machine.current_state().map_err(|e| e.to_string())?;
    let json = serde_json::to_string_pretty(state).map_err(|e| e.to_string())?;
    println!("{json}");
    Ok(())
}

fn print_trace(machine: &StateMachine) -> Result<(), String> {
    let applied = machine.trace().map_err(|e| e.to_string())?;
    if applied.is_empty() {
        println!("  No state changes.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Event", "Path", "Operation", "Previous"]);
    for diff in &applied {
        let previous = diff
            .previous_value
            .as_ref()
            .map_or_else(|| "-".to_string(), |v| super::truncate(&v.to_string(), 40));
        table.add_row(vec![
            super::truncate(diff.event_id.as_str(), 12),
            diff.path.clone(),
            diff.operation.to_string(),
            previous,
        ]);
    }

    println!("{table}");
    println!();
    println!("  {} changes over {} events", applied.len(), machine.len());
    Ok(())
}
