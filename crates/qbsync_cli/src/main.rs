//! qbsync CLI
//!
//! Tools for qBittorrent `sync/maindata` payloads, offline and live.
//!
//! # Commands
//!
//! - `decode` - Decode one payload and summarize the delta
//! - `replay` - Merge a sequence of payloads and print the resulting snapshot
//! - `watch` - Log in to a live WebUI and follow its changes

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// qBittorrent sync payload tools.
#[derive(Parser)]
#[command(name = "qbsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a single maindata payload
    Decode {
        /// Payload file (JSON)
        file: PathBuf,

        /// Revision the payload was requested with
        #[arg(short, long, default_value = "0")]
        rid: u64,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Replay payloads in order and print the merged snapshot
    Replay {
        /// Payload files, first one requested with rid 0
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Log in to a WebUI and print a status line per update
    Watch {
        /// WebUI address, e.g. http://localhost:8080
        #[arg(short, long)]
        url: String,

        /// WebUI user name
        #[arg(long, default_value = "admin")]
        username: String,

        /// WebUI password
        #[arg(long, default_value = "")]
        password: String,

        /// Stop after this many updates
        #[arg(short = 'n', long)]
        polls: Option<u64>,

        /// Delay between polls in milliseconds
        #[arg(short, long)]
        interval: Option<u64>,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Decode { file, rid, format } => {
            commands::decode::run(&file, rid, &format)?;
        }
        Commands::Replay { files, format } => {
            commands::replay::run(&files, &format)?;
        }
        Commands::Watch {
            url,
            username,
            password,
            polls,
            interval,
        } => {
            commands::watch::run(&url, &username, &password, polls, interval)?;
        }
        Commands::Version => {
            println!("qbsync CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
