use std::path::Path;

use comfy_table::{ContentArrangement, Table};
use tw_core::derive_state;

pub fn run(path: &Path) -> Result<(), String> {
    let config = super::load_config(path)?;
    derive_state("check", &config, &[]).map_err(|e| e.to_string())?;

    println!("  All checks passed for '{}' ({}).", config.name, config.rule_system);
    println!(
        "  {} characters, {} initial state keys",
        config.characters.len(),
        config.initial_state.len()
    );

    if !config.characters.is_empty() {
        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec!["ID", "Name", "Type", "Control"]);
        for character in config.characters.values() {
            table.add_row(vec![
                character.id.clone(),
                character.name.clone(),
                character.character_type.to_string(),
                character.control.to_string(),
            ]);
        }
        println!();
        println!("{table}");
    }

    Ok(())
}
