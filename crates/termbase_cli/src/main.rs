//! Termbase CLI
//!
//! Command-line tools for running dictionary passes outside a host.
//!
//! # Commands
//!
//! - `reconcile` - Run one pass against file-backed stores
//! - `inspect` - Summarize a source backup file
//! - `version` - Show version information

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Termbase command-line dictionary tools.
#[derive(Parser)]
#[command(name = "termbase")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Mount directory; the dictionary path defaults to `<path>/dict`
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
    /// Run one reconciliation pass
    Reconcile {
        /// Dictionary configuration (JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Directory holding one sub-directory per store
        #[arg(short, long)]
        store_dir: Option<PathBuf>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Summarize a source backup file
    Inspect {
        /// Backup file to read
        file: PathBuf,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Reconcile {
            config,
            store_dir,
            format,
        } => {
            let mount = cli.path.unwrap_or_else(|| PathBuf::from("."));
            let store_dir = store_dir.unwrap_or_else(|| mount.join("stores"));
            commands::reconcile::run(&config, &mount, &store_dir, &format)?;
        }
        Commands::Inspect { file, format } => {
            commands::inspect::run(&file, &format)?;
        }
        Commands::Version => {
            println!("Termbase CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("Termbase Core v{}", termbase_core::VERSION);
        }
    }

    Ok(())
}
