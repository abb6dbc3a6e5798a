//! Strongbox CLI
//!
//! Runs wallet operations from the command line and prints their result
//! envelopes as JSON on stdout. Logs go to stderr.
//!
//! # Commands
//!
//! - `provision` - Create an empty wallet, replacing any existing one
//! - `insert` - Insert or replace one entry
//! - `list` - List every entry
//! - `import` - Bulk-import entries from a JSON batch
//! - `categories` - Count entries per category

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use strongbox_core::{Config, Wallet};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Strongbox encrypted credential wallet.
#[derive(Parser)]
#[command(name = "strongbox")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the wallet file
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Wallet key
    #[arg(global = true, short, long, env = "STRONGBOX_KEY", hide_env_values = true)]
    key: Option<String>,

    /// Skip fsync after each insert
    #[arg(global = true, long)]
    no_sync: bool,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Create an empty wallet, replacing any existing one
    Provision,

    /// Insert or replace one entry
    Insert {
        /// Entry name
        name: String,

        /// Entry value
        value: String,

        /// Category (defaults to "general")
        #[arg(short, long)]
        category: Option<String>,

        /// Tag as KEY=VALUE (repeatable)
        #[arg(short, long = "tag", value_parser = commands::parse_tag)]
        tags: Vec<(String, String)>,
    },

    /// List every entry
    List,

    /// Bulk-import entries from a JSON batch
    Import {
        /// Batch file, or "-" for stdin
        #[arg(default_value = "-")]
        file: PathBuf,
    },

    /// Count entries per category
    Categories,
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let path = cli.path.ok_or("Wallet path required (--path)")?;
    let key = cli.key.ok_or("Wallet key required (--key or STRONGBOX_KEY)")?;

    let wallet = Wallet::at(path).with_config(Config::new().sync_on_commit(!cli.no_sync));
    debug!(wallet = %wallet.location().display(), "running command");
    let (success, envelope) = commands::run(&wallet, &key, cli.command);

    println!("{envelope}");
    Ok(if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
