use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use colored::Colorize;
use tracing::debug;

use tw_engine::{EngineConfig, GameEngine};

fn engine_config(seed: Option<u64>) -> EngineConfig {
    match seed {
        Some(seed) => EngineConfig::default().with_seed(seed),
        None => EngineConfig::default(),
    }
}

pub fn run(config_path: &Path, seed: Option<u64>, save: Option<&Path>) -> Result<(), String> {
    let config = super::load_config(config_path)?;
    let engine = GameEngine::new(config, engine_config(seed))
        .map_err(|e| format!("failed to start session: {e}"))?;

    println!("  {} {}", "Starting".bold(), engine.config().name);
    repl(engine, save.map(Path::to_path_buf))
}

pub fn resume(session_path: &Path, seed: Option<u64>) -> Result<(), String> {
    let session = super::load_session(session_path)?;
    let engine = GameEngine::restore(session, engine_config(seed))
        .map_err(|e| format!("failed to restore session: {e}"))?;

    println!(
        "  {} {} ({} events)",
        "Resuming".bold(),
        engine.config().name,
        engine.events().len()
    );
    repl(engine, Some(session_path.to_path_buf()))
}

fn save(engine: &GameEngine, path: &Path) -> Result<(), String> {
    let session = engine.session().map_err(|e| e.to_string())?;
    super::save_session(path, &session)?;
    debug!(path = %path.display(), events = session.event_history.len(), "saved session");
    Ok(())
}

fn repl(mut engine: GameEngine, save_path: Option<PathBuf>) -> Result<(), String> {
    println!("  Session: {}", engine.session_id());
    println!("  Type 'help' for commands, 'quit' to exit.\n");

    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let mut line = String::new();

    loop {
        print!("> ");
        io::stdout().flush().map_err(|e| e.to_string())?;

        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) => break, // EOF
            Err(e) => return Err(e.to_string()),
            _ => {}
        }

        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let (command, rest) = input.split_once(' ').unwrap_or((input, ""));
        if command.eq_ignore_ascii_case("save") {
            let target = match rest.trim() {
                "" => save_path.clone(),
                path => Some(PathBuf::from(path)),
            };
            match target {
                Some(path) => match save(&engine, &path) {
                    Ok(()) => println!("Saved to {}.\n", path.display()),
                    Err(e) => println!("{}\n", e.yellow()),
                },
                None => println!("{}\n", "usage: save <file>".yellow()),
            }
            continue;
        }

        match engine.process(input) {
            Ok(output) => {
                if !output.is_empty() {
                    println!("{output}\n");
                }
                if input.eq_ignore_ascii_case("quit") || input.eq_ignore_ascii_case("q") {
                    break;
                }
            }
            Err(e) => {
                println!("{}\n", e.to_string().yellow());
            }
        }
    }

    if let Some(path) = &save_path {
        save(&engine, path)?;
        println!("  Session saved to {}.", path.display());
    }
    Ok(())
}
