//! CLI frontend for Taleweaver sessions.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "tw",
    about = "Taleweaver: tabletop sessions recorded as replayable event logs",
    version,
    propagate_version = true
)]
struct Cli {
    /// Log debug output to stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a game configuration (.yaml, .yml or .json)
    Check {
        /// Configuration file
        config: PathBuf,
    },

    /// Start an interactive session from a configuration
    Play {
        /// Configuration file
        config: PathBuf,

        /// RNG seed for reproducible dice
        #[arg(short, long)]
        seed: Option<u64>,

        /// Session file written by `save` and on exit
        #[arg(long)]
        save: Option<PathBuf>,
    },

    /// Continue an interactive session from a saved session file
    Resume {
        /// Saved session (.json); saved back on exit
        session: PathBuf,

        /// RNG seed for reproducible dice
        #[arg(short, long)]
        seed: Option<u64>,
    },

    /// Print the state derived from a saved session
    Replay {
        /// Saved session (.json)
        session: PathBuf,

        /// Replay up to and including this event ID
        #[arg(long, conflicts_with = "at")]
        to: Option<String>,

        /// Replay events stamped at or before this RFC 3339 time
        #[arg(long)]
        at: Option<String>,

        /// List every applied diff with the value it replaced
        #[arg(long)]
        trace: bool,
    },

    /// List the events of a saved session
    History {
        /// Saved session (.json)
        session: PathBuf,

        /// Only events of this type (e.g. message, dice_roll)
        #[arg(short = 't', long = "type")]
        event_type: Option<String>,

        /// Only events caused by this actor
        #[arg(short, long)]
        actor: Option<String>,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Check { config } => commands::check::run(&config),
        Commands::Play { config, seed, save } => {
            commands::play::run(&config, seed, save.as_deref())
        }
        Commands::Resume { session, seed } => commands::play::resume(&session, seed),
        Commands::Replay {
            session,
            to,
            at,
            trace,
        } => commands::replay::run(&session, to.as_deref(), at.as_deref(), trace),
        Commands::History {
            session,
            event_type,
            actor,
        } => commands::history::run(&session, event_type.as_deref(), actor.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
