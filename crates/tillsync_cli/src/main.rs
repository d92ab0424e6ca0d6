//! TillSync CLI
//!
//! Maintenance tools for TillSync store files.
//!
//! # Commands
//!
//! - `inspect` - Display store statistics and watermarks
//! - `outbox` - List pending outbox entries
//! - `config` - Read or write configuration keys
//! - `compact` - Rewrite the journal to reclaim space

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// TillSync command-line maintenance tools.
#[derive(Parser)]
#[command(name = "tillsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the store file
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display store statistics and watermarks
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// List pending outbox entries
    Outbox {
        /// Maximum number of entries to show
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Read or write configuration keys
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Rewrite the journal to reclaim space
    Compact {
        /// Dry run - report reclaimable space without rewriting
        #[arg(short, long)]
        dry_run: bool,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print one key, or all keys when none is given
    Get {
        /// Configuration key
        key: Option<String>,
    },

    /// Set a key to a JSON value (bare words are stored as strings)
    Set {
        /// Configuration key
        key: String,
        /// Value to store
        value: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Inspect { format } => {
            let path = cli.path.ok_or("Store path required for inspect")?;
            commands::inspect::run(&path, &format)?;
        }
        Commands::Outbox { limit, format } => {
            let path = cli.path.ok_or("Store path required for outbox")?;
            commands::outbox::run(&path, limit, &format)?;
        }
        Commands::Config { action } => {
            let path = cli.path.ok_or("Store path required for config")?;
            match action {
                ConfigAction::Get { key } => commands::config::get(&path, key.as_deref())?,
                ConfigAction::Set { key, value } => commands::config::set(&path, &key, &value)?,
            }
        }
        Commands::Compact { dry_run } => {
            let path = cli.path.ok_or("Store path required for compact")?;
            commands::compact::run(&path, dry_run)?;
        }
        Commands::Version => {
            println!("TillSync CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
